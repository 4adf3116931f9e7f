use crate::{Config, EntryId, EntryStore, FileType, Reporter, fs, walk};

/**
 Repair sweep for filesystems that return `DT_UNKNOWN` directory entries.

 Each round sorts the order list by inode so the stat sequence touches the
 inode table in on-disk order, then classifies every still-unknown entry in
 the window of records not yet swept. A repaired directory is handed back
 to the walker (same skip set), which may append more entries; the loop
 runs until a sweep adds nothing. Termination: every round either grows the
 store or resolves in place and stops.

 Entries whose stat fails are reported and stay `Unknown`; they surface in
 print mode with a zero disk hint and are never mapped.
*/
pub fn resolve_unknown(
    config: &Config,
    store: &mut EntryStore,
    order: &mut Vec<EntryId>,
    reporter: &mut Reporter,
) {
    reporter.warn_dt_type();

    let mut start = 0;
    loop {
        let end = store.len();
        debug_assert_eq!(order.len(), end, "order list out of sync with store");
        order.sort_unstable_by_key(|id| store.get(*id).ino);

        for idx in start..end {
            let id = order[idx];
            if store.get(id).kind != FileType::Unknown {
                continue;
            }
            let path = store.get(id).path.clone();
            let st = match fs::stat(&path) {
                Ok(st) => st,
                Err(e) => {
                    reporter.report(&path, &e);
                    continue;
                }
            };
            let kind = FileType::from_mode(st.st_mode);
            {
                let entry = store.get_mut(id);
                entry.kind = kind;
                entry.ino = st.st_ino;
            }
            if kind == FileType::Directory {
                // the subtree was invisible behind the unknown entry
                let _ = walk(&path, config, store, reporter);
            }
        }

        if store.len() == end {
            break;
        }
        order.extend((end..store.len()).map(EntryId));
        start = end;
    }
}
