//! Bounded LRU cache of read-only descriptors for the readahead pass.
//!
//! Extents of different files interleave in disk order, so the same file
//! surfaces at non-consecutive steps; the pool amortises the open/close
//! churn while staying under the process descriptor ceiling.

use crate::fs::{self, FileDes};
use crate::{EntryId, EntryStore, Result};

/// Stable handle to a pool slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub(crate) usize);

/// List terminator for the intrusive LRU links.
const NONE: usize = usize::MAX;

/// Fallback ceiling when RLIMIT_NOFILE cannot be read (it practically
/// cannot fail, but the pool must not be built on a garbage limit).
const DEFAULT_NOFILE: u64 = 1024;

#[derive(Debug)]
struct Slot {
    fd: Option<FileDes>,
    entry: Option<EntryId>,
    prev: usize,
    next: usize,
}

/**
 The pool keeps every allocated slot on one intrusive doubly-linked list:
 most-recently-used at the head, eviction victims at the tail. Unbound
 slots are parked at the tail so the next acquisition reuses them without
 closing anything.

 Slot↔entry bindings are kept in lock-step under every operation: a slot
 points at its entry iff that entry's `fd_slot` points back, and at most
 one slot is ever bound to an entry.
*/
#[derive(Debug)]
pub struct FdPool {
    slots: Vec<Slot>,
    head: usize,
    tail: usize,
    max_slots: usize,
    open: usize,
}

impl FdPool {
    /// Sizes the pool at 90% of the soft open-file limit, reserving the
    /// rest for incidental use elsewhere in the process.
    #[must_use]
    pub fn new() -> Self {
        let limit = fs::nofile_soft_limit().unwrap_or(DEFAULT_NOFILE);
        Self::with_limit((limit - limit / 10) as usize)
    }

    #[must_use]
    pub fn with_limit(max_slots: usize) -> Self {
        let max_slots = max_slots.max(1);
        Self {
            slots: Vec::with_capacity(max_slots),
            head: NONE,
            tail: NONE,
            max_slots,
            open: 0,
        }
    }

    /**
     Hands out a slot holding an open descriptor for `entry`.

     A cached slot just moves to the MRU end. Otherwise a slot is found
     (fresh while under the ceiling, else the LRU tail is evicted), the
     file is opened and the slot bound. On open failure the slot stays
     free at the tail and the error is returned for the caller's
     diagnostic line.
    */
    pub fn get(&mut self, id: EntryId, store: &mut EntryStore) -> Result<SlotId> {
        if let Some(sid) = store.get(id).fd_slot {
            debug_assert_eq!(self.slots[sid.0].entry, Some(id), "slot binding out of sync");
            self.unlink(sid.0);
            self.push_front(sid.0);
            return Ok(sid);
        }

        let idx = if self.slots.len() < self.max_slots {
            self.slots.push(Slot {
                fd: None,
                entry: None,
                prev: NONE,
                next: NONE,
            });
            self.slots.len() - 1
        } else {
            let victim = self.tail;
            debug_assert_ne!(victim, NONE, "ceiling reached with an empty LRU list");
            self.unlink(victim);
            if let Some(old) = self.slots[victim].entry.take() {
                store.get_mut(old).fd_slot = None;
                if self.slots[victim].fd.take().is_some() {
                    self.open -= 1;
                }
            }
            victim
        };

        let path = store.get(id).path.clone();
        match FileDes::open_file(&path) {
            Ok(fd) => {
                self.slots[idx].fd = Some(fd);
                self.slots[idx].entry = Some(id);
                self.open += 1;
                store.get_mut(id).fd_slot = Some(SlotId(idx));
                self.push_front(idx);
                Ok(SlotId(idx))
            }
            Err(e) => {
                // free slot becomes the preferred next victim
                self.push_back(idx);
                Err(e)
            }
        }
    }

    /// Closes the descriptor, breaks the binding both ways and parks the
    /// slot at the tail as the next victim.
    pub fn release(&mut self, sid: SlotId, store: &mut EntryStore) {
        let slot = &mut self.slots[sid.0];
        if let Some(id) = slot.entry.take() {
            store.get_mut(id).fd_slot = None;
        }
        if slot.fd.take().is_some() {
            self.open -= 1;
        }
        self.unlink(sid.0);
        self.push_back(sid.0);
    }

    #[must_use]
    pub fn descriptor(&self, sid: SlotId) -> Option<&FileDes> {
        self.slots[sid.0].fd.as_ref()
    }

    /// Live open descriptors held right now; never exceeds the ceiling.
    #[must_use]
    pub const fn open_descriptors(&self) -> usize {
        self.open
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.max_slots
    }

    fn unlink(&mut self, i: usize) {
        let (prev, next) = (self.slots[i].prev, self.slots[i].next);
        if prev != NONE {
            self.slots[prev].next = next;
        } else if self.head == i {
            self.head = next;
        }
        if next != NONE {
            self.slots[next].prev = prev;
        } else if self.tail == i {
            self.tail = prev;
        }
        self.slots[i].prev = NONE;
        self.slots[i].next = NONE;
    }

    fn push_front(&mut self, i: usize) {
        self.slots[i].prev = NONE;
        self.slots[i].next = self.head;
        if self.head != NONE {
            self.slots[self.head].prev = i;
        }
        self.head = i;
        if self.tail == NONE {
            self.tail = i;
        }
    }

    fn push_back(&mut self, i: usize) {
        self.slots[i].next = NONE;
        self.slots[i].prev = self.tail;
        if self.tail != NONE {
            self.slots[self.tail].next = i;
        }
        self.tail = i;
        if self.head == NONE {
            self.head = i;
        }
    }

    /// Walks the list from the head; every allocated slot must appear
    /// exactly once. Used by the accounting tests.
    #[cfg(test)]
    fn lru_list_len(&self) -> usize {
        let mut n = 0;
        let mut i = self.head;
        while i != NONE {
            n += 1;
            assert!(n <= self.slots.len(), "cycle in LRU list");
            i = self.slots[i].next;
        }
        n
    }
}

impl Default for FdPool {
    fn default() -> Self {
        Self::new()
    }
}
