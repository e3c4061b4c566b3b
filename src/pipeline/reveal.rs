//! Character-by-character reveal of a reply.

use std::iter::FusedIterator;
use std::str::CharIndices;

/// Display prefixes of `text`, each one `char` longer than the last, ending
/// with the full text.
///
/// ```
/// use resonance_oracle::pipeline::Reveal;
///
/// let frames: Vec<&str> = Reveal::new("Ja.").collect();
/// assert_eq!(frames, ["J", "Ja", "Ja."]);
/// ```
///
/// A `Reveal` runs once; build a new one to start over.
#[derive(Debug, Clone)]
pub struct Reveal<'a> {
    text: &'a str,
    chars: CharIndices<'a>,
}

impl<'a> Reveal<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            chars: text.char_indices(),
        }
    }
}

impl<'a> Iterator for Reveal<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let (start, c) = self.chars.next()?;
        Some(&self.text[..start + c.len_utf8()])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chars.size_hint()
    }
}

impl FusedIterator for Reveal<'_> {}
