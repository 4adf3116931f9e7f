use libc::{
    DT_DIR, DT_LNK, DT_REG, DT_UNKNOWN, S_IFDIR, S_IFLNK, S_IFMT, S_IFREG, mode_t,
};

/// Classification of a directory child as the walker cares about it.
///
/// Anything that is neither walkable nor mappable (sockets, fifos,
/// devices) collapses into `Other`; it still reaches the print pass but
/// never the extent mapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    RegularFile,
    Directory,
    Symlink,
    Other,
    /// The filesystem declined to advertise a type (`DT_UNKNOWN`); a later
    /// stat sweep repairs these.
    Unknown,
}

impl FileType {
    /// Converts a `dirent64::d_type` to a `FileType`.
    /// On some ESOTERIC linux filesystems every entry comes back
    /// `DT_UNKNOWN`; callers must be prepared to repair via stat.
    #[must_use]
    #[inline(always)]
    pub const fn from_dtype(d_type: u8) -> Self {
        match d_type {
            DT_DIR => Self::Directory,
            DT_REG => Self::RegularFile,
            DT_LNK => Self::Symlink,
            DT_UNKNOWN => Self::Unknown,
            _ => Self::Other,
        }
    }

    /// The stat fallback, from `st_mode` bits.
    #[must_use]
    #[inline(always)]
    pub const fn from_mode(mode: mode_t) -> Self {
        match mode & S_IFMT {
            S_IFREG => Self::RegularFile,
            S_IFDIR => Self::Directory,
            S_IFLNK => Self::Symlink,
            _ => Self::Other,
        }
    }

    #[must_use]
    #[inline(always)]
    pub const fn is_regular(self) -> bool {
        matches!(self, Self::RegularFile)
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegularFile => write!(f, "Regular file"),
            Self::Directory => write!(f, "Directory"),
            Self::Symlink => write!(f, "Symlink"),
            Self::Other => write!(f, "Other"),
            Self::Unknown => write!(f, "Unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_round_trip() {
        assert_eq!(FileType::from_dtype(libc::DT_REG), FileType::RegularFile);
        assert_eq!(FileType::from_dtype(libc::DT_DIR), FileType::Directory);
        assert_eq!(FileType::from_dtype(libc::DT_LNK), FileType::Symlink);
        assert_eq!(FileType::from_dtype(libc::DT_UNKNOWN), FileType::Unknown);
        assert_eq!(FileType::from_dtype(libc::DT_SOCK), FileType::Other);
        assert_eq!(FileType::from_dtype(libc::DT_FIFO), FileType::Other);
    }

    #[test]
    fn mode_never_yields_unknown() {
        for mode in [S_IFREG, S_IFDIR, S_IFLNK, libc::S_IFSOCK, libc::S_IFCHR, 0] {
            assert_ne!(FileType::from_mode(mode), FileType::Unknown);
        }
    }
}
