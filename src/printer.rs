use crate::Entry;
use std::io::Write;

const NEWLINE: &[u8] = b"\n";

/// Byte-exact emission: one path per line, no quoting, no escaping, no
/// trailer. Paths never round-trip through UTF-8.
pub fn write_paths<'a, W, I>(writer: &mut W, entries: I) -> std::io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = &'a Entry>,
{
    for entry in entries {
        writer.write_all(&entry.path)?;
        writer.write_all(NEWLINE)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileType;

    #[test]
    fn emits_raw_bytes_one_per_line() {
        let entries = [
            Entry::new(b"/t/b".to_vec().into(), 1, 1, FileType::RegularFile),
            Entry::new(b"/t/weird\xFFname".to_vec().into(), 2, 1, FileType::RegularFile),
        ];
        let mut out = Vec::new();
        write_paths(&mut out, entries.iter()).unwrap();
        assert_eq!(out, b"/t/b\n/t/weird\xFFname\n".to_vec());
    }
}
