//! Append-only stores for entries and extents.
//!
//! Records are never moved or dropped once pushed: identity is a plain
//! index handle (`EntryId`), and every pass-local ordering lives in its
//! own sorted id list. That keeps Extent→Entry and slot→Entry references
//! valid across the inode sort, the disk sort and store growth, without a
//! raw pointer in sight.

use crate::fdpool::SlotId;
use crate::filetype::FileType;

/// Stable handle to an [`Entry`]; survives every sort and append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(pub(crate) usize);

/// One filesystem object discovered during traversal. Directories are
/// traversed, not stored; everything else lands here.
#[derive(Debug)]
pub struct Entry {
    /// Full path, built textually as `parent + "/" + child`.
    pub path: Box<[u8]>,
    /// Inode from the directory entry, or from stat once repaired.
    pub ino: u64,
    /// Device of the containing directory at discovery time.
    pub dev: u64,
    pub kind: FileType,
    /// Physical start of the first extent; 0 when unknown. Print-mode sort key.
    pub disk_hint: u64,
    /// Extents registered against this entry; the readahead pass counts
    /// this down to know when to release the cached descriptor.
    pub extent_count: u32,
    /// Pool slot currently holding a descriptor for this entry, if any.
    pub fd_slot: Option<SlotId>,
}

impl Entry {
    #[must_use]
    pub fn new(path: Box<[u8]>, ino: u64, dev: u64, kind: FileType) -> Self {
        Self {
            path,
            ino,
            dev,
            kind,
            disk_hint: 0,
            extent_count: 0,
            fd_slot: None,
        }
    }
}

/// Store growth is the one fallible allocation the pipeline refuses to
/// limp past: print the classic line and exit with the ENOMEM status.
fn oom() -> ! {
    eprintln!("Out of memory");
    std::process::exit(libc::ENOMEM)
}

#[derive(Debug, Default)]
pub struct EntryStore {
    entries: Vec<Entry>,
}

impl EntryStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: Entry) -> EntryId {
        if self.entries.try_reserve(1).is_err() {
            oom();
        }
        let id = EntryId(self.entries.len());
        self.entries.push(entry);
        id
    }

    #[must_use]
    #[inline]
    pub fn get(&self, id: EntryId) -> &Entry {
        &self.entries[id.0]
    }

    #[must_use]
    #[inline]
    pub fn get_mut(&mut self, id: EntryId) -> &mut Entry {
        &mut self.entries[id.0]
    }

    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All handles in append order; collect and sort per pass.
    pub fn ids(&self) -> impl Iterator<Item = EntryId> + use<> {
        (0..self.entries.len()).map(EntryId)
    }
}

/// A contiguous physical region of one file.
#[derive(Debug, Clone, Copy)]
pub struct Extent {
    /// Physical start on the block device; 0 sorts unknown locations to the front.
    pub disk: u64,
    /// Logical offset within the file.
    pub offset: u64,
    pub length: u64,
    pub entry: EntryId,
}

#[derive(Debug, Default)]
pub struct ExtentStore {
    extents: Vec<Extent>,
}

impl ExtentStore {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            extents: Vec::new(),
        }
    }

    pub fn push(&mut self, extent: Extent) {
        if self.extents.try_reserve(1).is_err() {
            oom();
        }
        self.extents.push(extent);
    }

    /// Disk-ascending order for the readahead pass. Equal keys (including
    /// the 0 sentinel) may land in any order.
    pub fn sort_by_disk(&mut self) {
        self.extents.sort_unstable_by_key(|x| x.disk);
    }

    #[must_use]
    #[inline]
    pub fn get(&self, idx: usize) -> Extent {
        self.extents[idx]
    }

    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.extents.len()
    }

    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extent> {
        self.extents.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &[u8], ino: u64) -> Entry {
        Entry::new(path.to_vec().into(), ino, 1, FileType::RegularFile)
    }

    #[test]
    fn handles_stay_valid_across_growth() {
        let mut store = EntryStore::new();
        let first = store.push(entry(b"/t/a", 10));
        // push enough to force several reallocations of the backing vec
        for i in 0..1000 {
            store.push(entry(format!("/t/f{i}").as_bytes(), 100 + i));
        }
        assert_eq!(&*store.get(first).path, b"/t/a");
        assert_eq!(store.get(first).ino, 10);
        assert_eq!(store.len(), 1001);
    }

    #[test]
    fn extent_backrefs_survive_entry_reordering() {
        let mut store = EntryStore::new();
        let a = store.push(entry(b"/t/a", 30));
        let b = store.push(entry(b"/t/b", 10));

        let mut extents = ExtentStore::new();
        extents.push(Extent { disk: 500, offset: 0, length: 4096, entry: a });
        extents.push(Extent { disk: 100, offset: 0, length: 4096, entry: b });

        // an inode sort reorders the id list, never the backing storage
        let mut order: Vec<EntryId> = store.ids().collect();
        order.sort_unstable_by_key(|id| store.get(*id).ino);
        assert_eq!(order, vec![b, a]);

        extents.sort_by_disk();
        let resolved: Vec<&[u8]> = extents.iter().map(|x| &*store.get(x.entry).path).collect();
        assert_eq!(resolved, vec![b"/t/b".as_slice(), b"/t/a".as_slice()]);
    }
}
