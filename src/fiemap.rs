//! Extent mapping: FIEMAP with a FIBMAP fallback, and a size-derived hint
//! when neither is available without privilege.
//!
//! The libc crate does not carry `struct fiemap`, so the request layout is
//! declared here to match `linux/fiemap.h` exactly; the ioctl numbers come
//! from `linux/fs.h`.

use crate::fs::FileDes;
use crate::{Config, EntryId, EntryStore, Extent, ExtentStore, Reporter, Result};
use crate::{FastwalkError, FileType};

/// Extents requested per FIEMAP call; files with more are represented by
/// their first hundred, which is plenty to schedule readahead well.
pub const FIEMAP_MAX_EXTENTS: usize = 100;

// _IOWR('f', 11, struct fiemap) with the 32-byte fixed header
const FS_IOC_FIEMAP: libc::c_ulong = 0xC020_660B;
// _IO(0x00, 1): logical block in, physical block out, root only on most filesystems
const FIBMAP: libc::c_ulong = 1;

/// Kernel could not determine the physical location of this extent.
const FIEMAP_EXTENT_UNKNOWN: u32 = 0x0000_0002;

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct FiemapExtent {
    fe_logical: u64,
    fe_physical: u64,
    fe_length: u64,
    fe_reserved64: [u64; 2],
    fe_flags: u32,
    fe_reserved: [u32; 3],
}

#[repr(C)]
struct FiemapRequest {
    fm_start: u64,
    fm_length: u64,
    fm_flags: u32,
    fm_mapped_extents: u32,
    fm_extent_count: u32,
    fm_reserved: u32,
    fm_extents: [FiemapExtent; FIEMAP_MAX_EXTENTS],
}

/// Asks for the extents covering `[0, size)`.
fn fiemap(fd: &FileDes, size: u64) -> Result<Vec<FiemapExtent>> {
    // SAFETY: all-zero is a valid FiemapRequest (plain integers throughout)
    let mut req: FiemapRequest = unsafe { core::mem::zeroed() };
    req.fm_length = size;
    req.fm_extent_count = FIEMAP_MAX_EXTENTS as u32;

    // SAFETY: fd is open and req is a properly sized, writable fiemap buffer
    if unsafe { libc::ioctl(fd.raw(), FS_IOC_FIEMAP, &raw mut req) } < 0 {
        return Err(FastwalkError::last_os_error());
    }
    let mapped = (req.fm_mapped_extents as usize).min(FIEMAP_MAX_EXTENTS);
    Ok(req.fm_extents[..mapped].to_vec())
}

/// Physical block number of logical block 0.
fn fibmap_block0(fd: &FileDes) -> Result<u64> {
    let mut block: libc::c_int = 0;
    // SAFETY: FIBMAP reads and writes a single c_int
    if unsafe { libc::ioctl(fd.raw(), FIBMAP, &raw mut block) } < 0 {
        return Err(FastwalkError::last_os_error());
    }
    Ok(block as u64)
}

fn register(
    store: &mut EntryStore,
    extents: &mut ExtentStore,
    id: EntryId,
    disk: u64,
    offset: u64,
    length: u64,
) {
    let entry = store.get_mut(id);
    if entry.extent_count == 0 {
        entry.disk_hint = disk;
    }
    entry.extent_count += 1;
    extents.push(Extent {
        disk,
        offset,
        length,
        entry: id,
    });
}

/**
 Resolves one regular file's physical placement, registering extents and
 setting the entry's disk hint. Called once per regular entry, in inode
 order, after walking and type repair are complete.

 The cascade:
 1. FIEMAP over `[0, size)`. Print mode keeps only the first extent (the
    hint is all that pass needs); readahead mode keeps them all. An extent
    the kernel flags as location-unknown registers with disk 0 and sorts
    to the front.
 2. FIBMAP on logical block 0 when FIEMAP fails. One synthetic extent
    spanning the whole file.
 3. FIBMAP refused with EPERM: one synthetic extent whose disk equals the
    file size, so small files still cluster near each other.

 Anything else is reported and leaves the entry with no extents, which the
 scheduler treats as nothing to read.
*/
pub fn map_extents(
    id: EntryId,
    config: &Config,
    store: &mut EntryStore,
    extents: &mut ExtentStore,
    reporter: &mut Reporter,
) {
    debug_assert!(store.get(id).kind == FileType::RegularFile);
    let path = store.get(id).path.clone();

    let fd = match FileDes::open_file(&path) {
        Ok(fd) => fd,
        Err(e) => {
            reporter.report(&path, &e);
            return;
        }
    };
    let st = match fd.fstat() {
        Ok(st) => st,
        Err(e) => {
            reporter.report(&path, &e);
            return;
        }
    };
    let size = st.st_size as u64;
    if size == 0 {
        // no data, nothing to locate or read ahead
        return;
    }

    match fiemap(&fd, size) {
        Ok(mapped) => {
            let keep = if config.readahead {
                mapped.len()
            } else {
                mapped.len().min(1)
            };
            for fe in &mapped[..keep] {
                let disk = if fe.fe_flags & FIEMAP_EXTENT_UNKNOWN != 0 {
                    reporter.warn_unknown_extent(&path);
                    0
                } else {
                    fe.fe_physical
                };
                register(store, extents, id, disk, fe.fe_logical, fe.fe_length);
            }
        }
        // the filesystem has no FIEMAP; any failure lands us on FIBMAP
        Err(_) => match fibmap_block0(&fd) {
            Ok(block) => register(store, extents, id, block, 0, size),
            Err(e) if e.raw_os_error() == Some(libc::EPERM) => {
                reporter.warn_fibmap_eperm(&path);
                register(store, extents, id, size, 0, size);
            }
            Err(e) => reporter.report(&path, &e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::{offset_of, size_of};
    use std::os::unix::ffi::OsStrExt as _;

    // layout must match linux/fiemap.h bit for bit or the ioctl corrupts memory
    #[test]
    fn request_layout_matches_the_kernel_abi() {
        assert_eq!(size_of::<FiemapExtent>(), 56);
        assert_eq!(offset_of!(FiemapExtent, fe_flags), 40);
        assert_eq!(offset_of!(FiemapRequest, fm_extents), 32);
        assert_eq!(
            size_of::<FiemapRequest>(),
            32 + FIEMAP_MAX_EXTENTS * size_of::<FiemapExtent>()
        );
        // the ioctl number encodes the 32-byte header size
        assert_eq!((FS_IOC_FIEMAP >> 16) & 0x3FFF, 32);
    }

    fn map_one(path: &std::path::Path, readahead: bool) -> (EntryStore, ExtentStore, Reporter) {
        let mut store = EntryStore::new();
        let id = store.push(crate::Entry::new(
            path.as_os_str().as_bytes().to_vec().into(),
            0,
            0,
            FileType::RegularFile,
        ));
        let mut extents = ExtentStore::new();
        let mut reporter = Reporter::new();
        let cfg = Config::new(std::iter::empty::<&[u8]>(), readahead);
        map_extents(id, &cfg, &mut store, &mut extents, &mut reporter);
        (store, extents, reporter)
    }

    /// The cascade must end in one of its three documented outcomes on any
    /// filesystem the tests run on: extents registered, or a reported
    /// failure with none.
    #[test]
    fn cascade_terminates_with_extents_or_a_report() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("data");
        std::fs::write(&file, vec![7u8; 8192]).unwrap();

        let (store, extents, reporter) = map_one(&file, true);
        let entry = store.get(store.ids().next().unwrap());
        if entry.extent_count > 0 {
            assert_eq!(entry.extent_count as usize, extents.len());
            // the hint is the first registered extent's disk address
            assert_eq!(entry.disk_hint, extents.iter().next().unwrap().disk);
            for x in extents.iter() {
                assert!(x.length > 0);
            }
        } else {
            assert!(extents.is_empty());
            assert!(reporter.had_error() || entry.extent_count == 0);
        }
    }

    #[test]
    fn print_mode_registers_at_most_one_extent() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("data");
        std::fs::write(&file, vec![1u8; 64 * 1024]).unwrap();

        let (store, extents, _) = map_one(&file, false);
        let entry = store.get(store.ids().next().unwrap());
        assert!(entry.extent_count <= 1);
        assert_eq!(entry.extent_count as usize, extents.len());
    }

    #[test]
    fn empty_files_register_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("empty");
        std::fs::write(&file, b"").unwrap();

        let (store, extents, reporter) = map_one(&file, true);
        let entry = store.get(store.ids().next().unwrap());
        assert_eq!(entry.extent_count, 0);
        assert_eq!(entry.disk_hint, 0);
        assert!(extents.is_empty());
        assert!(!reporter.had_error());
    }

    #[test]
    fn unopenable_file_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let (store, extents, reporter) = map_one(&tmp.path().join("missing"), false);
        assert!(reporter.had_error());
        assert!(extents.is_empty());
        assert_eq!(store.get(store.ids().next().unwrap()).extent_count, 0);
    }
}
