/// Run configuration: the skip set and the output mode.
///
/// The skip set holds simple names (final path components, never full
/// paths); `.` and `..` are always members so the walker cannot loop.
#[derive(Clone, Debug)]
pub struct Config {
    skip: Vec<Box<[u8]>>,
    pub readahead: bool,
}

impl Config {
    #[must_use]
    pub fn new<I, S>(skip_names: I, readahead: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut skip: Vec<Box<[u8]>> = vec![b".".to_vec().into(), b"..".to_vec().into()];
        skip.extend(skip_names.into_iter().map(|s| s.as_ref().to_vec().into()));
        Self { skip, readahead }
    }

    /// Exact match on the final path component, like the C library would
    /// `strcmp` its way down a short argv-sized list. The list never grows
    /// past the command line, so a linear scan beats any hashing.
    #[inline]
    #[must_use]
    pub fn should_skip(&self, name: &[u8]) -> bool {
        self.skip.iter().any(|s| &**s == name)
    }
}
