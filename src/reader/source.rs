//! Input sources for the tokenizer.

use std::io::BufRead;

use crate::reader::Result;

/// Something the tokenizer can pull characters from.
pub trait Source {
    /// Append at most `max` characters to `into`,
    /// and return how many characters were appended.
    ///
    /// Returning zero signals the end of the input.
    fn pull(&mut self, into: &mut String, max: usize) -> Result<usize>;
}

impl<S: Source + ?Sized> Source for &mut S {
    fn pull(&mut self, into: &mut String, max: usize) -> Result<usize> {
        (**self).pull(into, max)
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn pull(&mut self, into: &mut String, max: usize) -> Result<usize> {
        (**self).pull(into, max)
    }
}

/// A source over an iterator of characters, e.g. `"text".chars()`.
pub struct CharSource<I> {
    chars: I,
}

impl<I> CharSource<I>
where
    I: Iterator<Item = char>,
{
    pub fn new(chars: I) -> Self {
        CharSource { chars }
    }
}

impl<'a> From<&'a str> for CharSource<std::str::Chars<'a>> {
    fn from(value: &'a str) -> Self {
        CharSource::new(value.chars())
    }
}

impl<I> Source for CharSource<I>
where
    I: Iterator<Item = char>,
{
    fn pull(&mut self, into: &mut String, max: usize) -> Result<usize> {
        let before = into.len();
        into.extend(self.chars.by_ref().take(max));
        Ok(into[before..].chars().count())
    }
}

/// A source over buffered byte input, e.g. a file or stdin.
///
/// Input is decoded as UTF-8 a line at a time; invalid UTF-8 is an I/O error.
pub struct ReadSource<R> {
    reader: R,
    // Decoded characters not yet handed out.
    line: String,
    offset: usize,
}

impl<R: BufRead> ReadSource<R> {
    pub fn new(reader: R) -> Self {
        ReadSource {
            reader,
            line: String::new(),
            offset: 0,
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> Source for ReadSource<R> {
    fn pull(&mut self, into: &mut String, max: usize) -> Result<usize> {
        let mut pulled = 0;
        while pulled < max {
            if self.offset == self.line.len() {
                self.line.clear();
                self.offset = 0;
                if self.reader.read_line(&mut self.line)? == 0 {
                    break;
                }
            }
            let rest = &self.line[self.offset..];
            let taken = rest
                .char_indices()
                .nth(max - pulled)
                .map(|(end, _)| end)
                .unwrap_or(rest.len());
            let chunk = &rest[..taken];
            pulled += chunk.chars().count();
            into.push_str(chunk);
            self.offset += taken;
        }
        tracing::trace!("pulled {pulled} characters from reader");
        Ok(pulled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::Error;

    #[test]
    fn char_source_respects_max() -> Result<()> {
        let mut source = CharSource::from("héllo");
        let mut buf = String::new();
        assert_eq!(source.pull(&mut buf, 2)?, 2);
        assert_eq!(buf, "hé");
        assert_eq!(source.pull(&mut buf, 10)?, 3);
        assert_eq!(buf, "héllo");
        assert_eq!(source.pull(&mut buf, 10)?, 0);
        Ok(())
    }

    #[test]
    fn read_source_crosses_lines() -> Result<()> {
        let mut source = ReadSource::new("ab\ncd\nef".as_bytes());
        let mut buf = String::new();
        assert_eq!(source.pull(&mut buf, 4)?, 4);
        assert_eq!(buf, "ab\nc");
        assert_eq!(source.pull(&mut buf, 100)?, 4);
        assert_eq!(buf, "ab\ncd\nef");
        assert_eq!(source.pull(&mut buf, 100)?, 0);
        Ok(())
    }

    #[test]
    fn read_source_rejects_invalid_utf8() {
        let bytes: &[u8] = &[b'a', 0xff, b'\n'];
        let mut source = ReadSource::new(bytes);
        let mut buf = String::new();
        match source.pull(&mut buf, 10) {
            Err(Error::Io(_)) => (),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn borrowed_sources_pull() -> Result<()> {
        let mut inner = CharSource::from("xyz");
        let source: &mut dyn Source = &mut inner;
        let mut buf = String::new();
        assert_eq!(source.pull(&mut buf, 2)?, 2);
        assert_eq!(buf, "xy");
        Ok(())
    }
}
