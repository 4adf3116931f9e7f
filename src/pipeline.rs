//! The pass ordering that makes every stage's access pattern monotonic in
//! the kernel's likely on-disk layout: walk, inode sort, unknown repair,
//! extent mapping in inode order, then a disk-order print or readahead.

use crate::{
    Config, EntryId, EntryStore, ExtentStore, FdPool, FileType, Reporter, map_extents, printer,
    resolve_unknown, walk,
};
use std::io::Write;

/// All run-wide state threaded through the passes: the two stores, the
/// configuration and the diagnostic channel. Nothing lives in globals, so
/// each pass stays testable on its own.
#[derive(Debug)]
pub struct RunContext {
    pub config: Config,
    pub entries: EntryStore,
    pub extents: ExtentStore,
    pub reporter: Reporter,
}

impl RunContext {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            entries: EntryStore::new(),
            extents: ExtentStore::new(),
            reporter: Reporter::new(),
        }
    }
}

/**
 Runs the whole pipeline over `roots`, writing print-mode output to `out`.

 Phases, strictly in order:
 1. walk every root, accumulating the unknown-type flag;
 2. sort by inode so the following metadata passes touch the inode table
    sequentially;
 3. repair `DT_UNKNOWN` entries if any showed up;
 4. map extents for every regular file, still in inode order;
 5. print in disk-hint order, or readahead every extent in disk order
    through the descriptor pool.

 The per-path error state accumulates in `ctx.reporter`; the returned
 `io::Result` only covers the output stream itself.
*/
pub fn run<W: Write>(
    ctx: &mut RunContext,
    roots: &[Box<[u8]>],
    out: &mut W,
) -> std::io::Result<()> {
    let mut found_unknown = false;
    for root in roots {
        found_unknown |= walk(root, &ctx.config, &mut ctx.entries, &mut ctx.reporter);
    }

    let mut order: Vec<EntryId> = ctx.entries.ids().collect();
    order.sort_unstable_by_key(|id| ctx.entries.get(*id).ino);

    if found_unknown {
        resolve_unknown(&ctx.config, &mut ctx.entries, &mut order, &mut ctx.reporter);
    }

    for idx in 0..order.len() {
        let id = order[idx];
        if ctx.entries.get(id).kind.is_regular() {
            map_extents(
                id,
                &ctx.config,
                &mut ctx.entries,
                &mut ctx.extents,
                &mut ctx.reporter,
            );
        }
    }

    if ctx.config.readahead {
        readahead_pass(ctx, &mut FdPool::new());
        Ok(())
    } else {
        order.sort_unstable_by_key(|id| ctx.entries.get(*id).disk_hint);
        // repaired directories are traversed, never emitted
        printer::write_paths(
            out,
            order
                .iter()
                .map(|id| ctx.entries.get(*id))
                .filter(|e| e.kind != FileType::Directory),
        )
    }
}

/// Issues one readahead per extent, disk-ascending. The descriptor for a
/// file is cached across the non-consecutive steps its extents occupy and
/// released once its last extent has been scheduled.
fn readahead_pass(ctx: &mut RunContext, pool: &mut FdPool) {
    ctx.extents.sort_by_disk();

    for i in 0..ctx.extents.len() {
        let extent = ctx.extents.get(i);
        let id = extent.entry;
        match pool.get(id, &mut ctx.entries) {
            Ok(sid) => {
                if let Some(fd) = pool.descriptor(sid) {
                    if let Err(e) = fd.readahead(extent.offset, extent.length) {
                        let path = ctx.entries.get(id).path.clone();
                        ctx.reporter.report(&path, &e);
                    }
                }
            }
            Err(e) => {
                let path = ctx.entries.get(id).path.clone();
                ctx.reporter.report(&path, &e);
            }
        }

        // count down even when no descriptor was available, so the slot
        // release point stays defined for files with skipped extents
        let remaining = {
            let entry = ctx.entries.get_mut(id);
            entry.extent_count = entry.extent_count.saturating_sub(1);
            entry.extent_count
        };
        if remaining == 0 {
            if let Some(sid) = ctx.entries.get(id).fd_slot {
                pool.release(sid, &mut ctx.entries);
            }
        }
    }
}
