//! Thin RAII wrappers over the libc surface the pipeline needs: descriptor
//! ownership, directory streams, stat, readahead and the descriptor rlimit.
//!
//! Paths are byte strings end to end; they only become C strings here, at
//! the syscall boundary, via a stack buffer.

use crate::{FastwalkError, Result};
use core::ffi::CStr;
use core::mem::MaybeUninit;
use core::ptr::NonNull;
use std::mem::ManuallyDrop;

pub const LOCAL_PATH_MAX: usize = libc::PATH_MAX as usize;

/// Runs `f` with a NUL-terminated copy of `path` on the stack.
#[inline]
fn with_cstr<F, R>(path: &[u8], f: F) -> Result<R>
where
    F: FnOnce(*const libc::c_char) -> R,
{
    if path.len() >= LOCAL_PATH_MAX {
        return Err(FastwalkError::PathTooLong);
    }
    let mut buf = [0u8; LOCAL_PATH_MAX + 1];
    buf[..path.len()].copy_from_slice(path);
    // buf is zero-initialised, so the terminator is already in place
    Ok(f(buf.as_ptr().cast::<libc::c_char>()))
}

/// A safe abstraction around file descriptors for internal IO.
/// Closes on drop; hand the raw fd away with [`into_raw`](Self::into_raw)
/// when something else (a `DIR` stream) takes over ownership.
#[derive(Debug)]
#[repr(transparent)]
pub struct FileDes(pub(crate) i32);

impl FileDes {
    /// Opens a file read-only for stat/FIEMAP/readahead use.
    pub fn open_file(path: &[u8]) -> Result<Self> {
        const FLAGS: i32 = libc::O_RDONLY | libc::O_CLOEXEC;
        // SAFETY: the pointer is NUL terminated by `with_cstr`
        let fd = with_cstr(path, |ptr| unsafe { libc::open(ptr, FLAGS) })?;
        if fd < 0 {
            return Err(FastwalkError::last_os_error());
        }
        Ok(Self(fd))
    }

    /// Opens a directory for enumeration; fails on non-directories.
    pub fn open_dir(path: &[u8]) -> Result<Self> {
        const FLAGS: i32 = libc::O_RDONLY | libc::O_DIRECTORY | libc::O_CLOEXEC;
        // SAFETY: as above
        let fd = with_cstr(path, |ptr| unsafe { libc::open(ptr, FLAGS) })?;
        if fd < 0 {
            return Err(FastwalkError::last_os_error());
        }
        Ok(Self(fd))
    }

    pub fn fstat(&self) -> Result<libc::stat> {
        let mut stat_buf = MaybeUninit::<libc::stat>::uninit();
        // SAFETY: fd is open and the buffer is sized for a full stat
        if unsafe { libc::fstat(self.0, stat_buf.as_mut_ptr()) } < 0 {
            return Err(FastwalkError::last_os_error());
        }
        // SAFETY: fstat returned 0, so the kernel filled the buffer
        Ok(unsafe { stat_buf.assume_init() })
    }

    /// Hints the kernel to pull `[offset, offset+count)` into the page cache.
    pub fn readahead(&self, offset: u64, count: u64) -> Result<()> {
        /* SAFETY:
         - the descriptor is valid and owned by this struct
         - readahead only reads, it cannot corrupt anything
        */
        let res = unsafe { libc::readahead(self.0, offset as libc::off64_t, count as usize) };
        if res < 0 {
            return Err(FastwalkError::last_os_error());
        }
        Ok(())
    }

    #[must_use]
    #[inline]
    pub const fn raw(&self) -> i32 {
        self.0
    }

    /// Releases ownership without closing.
    #[must_use]
    fn into_raw(self) -> i32 {
        ManuallyDrop::new(self).0
    }
}

impl Drop for FileDes {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: only closed here; errors on close are not actionable
        unsafe { libc::close(self.0) };
    }
}

/// One decoded `dirent64`, copied out of the stream buffer.
#[derive(Debug)]
pub struct Dirent {
    pub ino: u64,
    pub d_type: u8,
    pub name: Vec<u8>,
}

/**
 POSIX directory stream over `fdopendir`/`readdir64`.

 Opening captures the directory's `stat` so the caller has the device id
 every child inherits. The underlying descriptor belongs to the `DIR`
 after `fdopendir` and is released by `closedir` on drop, on every exit
 path.
*/
#[derive(Debug)]
pub struct DirStream {
    dir: NonNull<libc::DIR>,
}

impl DirStream {
    pub fn open(path: &[u8]) -> Result<(Self, libc::stat)> {
        let fd = FileDes::open_dir(path)?;
        let st = fd.fstat()?;
        let raw = fd.into_raw();
        // SAFETY: raw is a live directory descriptor we just gave up ownership of
        let dir = unsafe { libc::fdopendir(raw) };
        let Some(dir) = NonNull::new(dir) else {
            let err = FastwalkError::last_os_error();
            // fdopendir did not adopt the fd, so it is still ours to close
            // SAFETY: raw is still open
            unsafe { libc::close(raw) };
            return Err(err);
        };
        Ok((Self { dir }, st))
    }

    /// Next entry in stream order, `.`/`..` included (the skip set handles
    /// those). `None` at end of directory or on a read error, following
    /// `readdir` semantics.
    pub fn next_entry(&mut self) -> Option<Dirent> {
        // SAFETY: `self.dir` is a valid stream for the lifetime of self
        let drnt = unsafe { libc::readdir64(self.dir.as_ptr()) };
        let drnt = NonNull::new(drnt)?;
        // SAFETY: readdir64 returned a live dirent64 whose d_name is NUL terminated
        let (ino, d_type, name) = unsafe {
            let d = drnt.as_ref();
            let name = CStr::from_ptr(d.d_name.as_ptr()).to_bytes().to_vec();
            (d.d_ino, d.d_type, name)
        };
        Some(Dirent { ino, d_type, name })
    }
}

impl Drop for DirStream {
    #[inline]
    fn drop(&mut self) {
        // SAFETY: closedir releases the stream and its descriptor exactly once
        unsafe { libc::closedir(self.dir.as_ptr()) };
    }
}

/// `stat` by path, following symlinks — the repair sweep wants the type of
/// whatever the name ultimately resolves to.
pub fn stat(path: &[u8]) -> Result<libc::stat> {
    let mut stat_buf = MaybeUninit::<libc::stat>::uninit();
    // SAFETY: NUL-terminated path, properly sized buffer
    let res = with_cstr(path, |ptr| unsafe { libc::stat(ptr, stat_buf.as_mut_ptr()) })?;
    if res < 0 {
        return Err(FastwalkError::last_os_error());
    }
    // SAFETY: stat returned 0
    Ok(unsafe { stat_buf.assume_init() })
}

/// The soft `RLIMIT_NOFILE` ceiling for this process.
pub fn nofile_soft_limit() -> Result<u64> {
    let mut lim = MaybeUninit::<libc::rlimit>::uninit();
    // SAFETY: RLIMIT_NOFILE is a valid resource and the buffer is sized
    if unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, lim.as_mut_ptr()) } < 0 {
        return Err(FastwalkError::last_os_error());
    }
    // SAFETY: getrlimit returned 0
    Ok(unsafe { lim.assume_init() }.rlim_cur)
}
