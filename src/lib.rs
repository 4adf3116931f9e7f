#![allow(clippy::inline_always)]

//! Walk directory trees and emit the contained regular files in the order
//! their data sits on disk, so a consumer reading them back-to-back pays
//! minimal seek cost. Alternatively issue kernel readahead over every file
//! extent in disk order.
//!
//! The pipeline is three strictly phased passes: enumerate, map extents,
//! then print or readahead over the sorted result. Everything is
//! single-threaded; ordering, not concurrency, is the performance lever.

#[cfg(not(any(target_os = "linux", target_os = "android")))]
compile_error!("fastwalk relies on FIEMAP/FIBMAP and readahead, which are Linux-only");

mod config;
pub use config::Config;
mod error;
pub use error::{FastwalkError, Reporter, Result};
pub mod filetype;
pub use filetype::FileType;
pub mod fs;
mod store;
pub use store::{Entry, EntryId, EntryStore, Extent, ExtentStore};
mod walk;
pub use walk::walk;
mod resolve;
pub use resolve::resolve_unknown;
mod fiemap;
pub use fiemap::map_extents;
mod fdpool;
pub use fdpool::{FdPool, SlotId};
mod pipeline;
pub use pipeline::{RunContext, run};
mod printer;

//this allocator is more efficient than jemalloc through my testing
#[cfg(feature = "mimalloc")]
#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;
