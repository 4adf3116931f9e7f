use std::fmt;
use std::io;

pub type Result<T> = core::result::Result<T, FastwalkError>;

#[derive(Debug)]
pub enum FastwalkError {
    /// A syscall failed; carries the OS error for the diagnostic line.
    Os(io::Error),
    /// The path cannot be handed to the kernel (longer than `PATH_MAX`).
    PathTooLong,
}

impl FastwalkError {
    /// Captures `errno` right after a failed libc call.
    #[inline]
    pub fn last_os_error() -> Self {
        Self::Os(io::Error::last_os_error())
    }

    /// The raw errno, when this wraps an OS error.
    #[must_use]
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Os(e) => e.raw_os_error(),
            Self::PathTooLong => None,
        }
    }
}

impl fmt::Display for FastwalkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Os(e) => write!(f, "{e}"),
            Self::PathTooLong => write!(f, "path exceeds PATH_MAX"),
        }
    }
}

impl core::error::Error for FastwalkError {}

impl From<io::Error> for FastwalkError {
    fn from(e: io::Error) -> Self {
        Self::Os(e)
    }
}

/**
 Per-path diagnostic channel.

 Every fallible step either succeeds or is dropped after one line of
 `path: reason` on stderr; the reporter latches the single "any error
 happened" bit that decides the process exit status. The two layout
 warnings and the dt_type warning fire at most once per run and do not
 count as errors (matching the exit-status contract).
*/
#[derive(Debug, Default)]
pub struct Reporter {
    had_error: bool,
    warned_dt_type: bool,
    warned_unknown_extent: bool,
    warned_fibmap_eperm: bool,
}

impl Reporter {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            had_error: false,
            warned_dt_type: false,
            warned_unknown_extent: false,
            warned_fibmap_eperm: false,
        }
    }

    /// One `path: reason` line; sets the error bit.
    pub fn report(&mut self, path: &[u8], reason: &FastwalkError) {
        self.had_error = true;
        eprintln!("{}: {reason}", String::from_utf8_lossy(path));
    }

    /// One `path: note` line that does not count as an error (DT_UNKNOWN notices).
    pub fn notice(&mut self, path: &[u8], note: &str) {
        eprintln!("{}: {note}", String::from_utf8_lossy(path));
    }

    /// Fired once when the first DT_UNKNOWN child forces the repair sweep.
    pub fn warn_dt_type(&mut self) {
        if !self.warned_dt_type {
            self.warned_dt_type = true;
            eprintln!("Warning: file system does not support dt_type");
        }
    }

    /// Fired once for the first extent the kernel flags as location-unknown.
    pub fn warn_unknown_extent(&mut self, path: &[u8]) {
        if !self.warned_unknown_extent {
            self.warned_unknown_extent = true;
            eprintln!("{}: Disk location unknown", String::from_utf8_lossy(path));
        }
    }

    /// Fired once when FIBMAP is refused for lack of privilege.
    pub fn warn_fibmap_eperm(&mut self, path: &[u8]) {
        if !self.warned_fibmap_eperm {
            self.warned_fibmap_eperm = true;
            eprintln!(
                "{}: No FIEMAP and no root: no disk data sorting",
                String::from_utf8_lossy(path)
            );
        }
    }

    #[must_use]
    pub const fn had_error(&self) -> bool {
        self.had_error
    }
}
