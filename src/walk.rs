use crate::fs::DirStream;
use crate::{Config, Entry, EntryStore, FileType, Reporter};

/// Textual join, no normalisation; a root of `/` simply yields `//name`,
/// exactly what the directory stream handed us glued to the parent.
#[inline]
fn join(parent: &[u8], child: &[u8]) -> Box<[u8]> {
    let mut path = Vec::with_capacity(parent.len() + 1 + child.len());
    path.extend_from_slice(parent);
    path.push(b'/');
    path.extend_from_slice(child);
    path.into()
}

/**
 Enumerates every non-skipped object reachable from `root`, appending a
 record for each non-directory child and descending into directory
 children. Returns true iff at least one child arrived typed `DT_UNKNOWN`
 (the signal for the repair sweep).

 The walk is iterative over an explicit stack of pending directory paths,
 so tree depth costs heap, not call stack, and only one directory
 descriptor is ever open at a time. Children are taken in stream order;
 the later sorts exist to obliterate that order anyway.

 A root that cannot be opened or stat'd is reported and contributes
 nothing; failures below it drop the offending child and carry on.
*/
pub fn walk(root: &[u8], config: &Config, store: &mut EntryStore, reporter: &mut Reporter) -> bool {
    let mut found_unknown = false;
    let mut pending: Vec<Box<[u8]>> = vec![root.into()];

    while let Some(dir) = pending.pop() {
        let (mut stream, st) = match DirStream::open(&dir) {
            Ok(opened) => opened,
            Err(e) => {
                reporter.report(&dir, &e);
                continue;
            }
        };
        let dev = st.st_dev;

        while let Some(child) = stream.next_entry() {
            if config.should_skip(&child.name) {
                continue;
            }
            let path = join(&dir, &child.name);
            let kind = FileType::from_dtype(child.d_type);
            if kind == FileType::Directory {
                pending.push(path);
                continue;
            }
            if kind == FileType::Unknown {
                found_unknown = true;
                reporter.notice(&path, "DT_UNKNOWN");
            }
            store.push(Entry::new(path, child.ino, dev, kind));
        }
        // stream drops here, releasing the directory descriptor before the
        // next directory is opened
    }

    found_unknown
}
