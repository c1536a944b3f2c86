//! # Word Boundaries
//!
//! An incremental UAX#14 boundary iterator over a UTF-16 paragraph buffer,
//! built on `unicode-linebreak`. The breaker walks boundaries one at a time
//! while style runs stream in, asking for the surrounding word when a
//! boundary closes and for a badness signal when scoring it.
//!
//! Breaks inside email addresses and bare URLs read badly, so boundaries
//! falling strictly inside a chunk that looks like one are reported with
//! maximum badness rather than suppressed outright; the breaker still uses
//! them when nothing better fits.

use unicode_linebreak::linebreaks;

use crate::hyphen::Locale;

/// Returned by [`WordBreaker::next`] once the final boundary has been passed.
pub const DONE: usize = usize::MAX;

/// Incremental word-boundary iterator over a UTF-16 buffer.
pub struct WordBreaker {
    locale: Locale,
    text: Vec<u16>,
    boundaries: Vec<usize>,
    bad_chunks: Vec<(usize, usize)>,
    scan: usize,
    last: usize,
    current: usize,
}

impl Default for WordBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl WordBreaker {
    pub fn new() -> Self {
        Self {
            locale: Locale::root(),
            text: Vec::new(),
            boundaries: Vec::new(),
            bad_chunks: Vec::new(),
            scan: 0,
            last: 0,
            current: 0,
        }
    }

    /// Sets the locale used for boundary tailoring. The UAX#14 defaults apply
    /// for every locale today; the value is kept so hosts can round-trip it.
    pub fn set_locale(&mut self, locale: &Locale) {
        self.locale = locale.clone();
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// Installs a new paragraph and computes its boundaries. The iterator is
    /// positioned before the first boundary; call [`WordBreaker::next`] once
    /// to reach it.
    pub fn set_text(&mut self, text: &[u16]) {
        self.text.clear();
        self.text.extend_from_slice(text);
        self.boundaries.clear();
        self.bad_chunks.clear();
        self.scan = 0;
        self.last = 0;
        self.current = 0;

        // Decode to UTF-8 for the UAX#14 scan, keeping a byte -> code unit
        // map. Unpaired surrogates decode to U+FFFD, which occupies one code
        // unit either way, so the map stays exact.
        let mut decoded = String::with_capacity(text.len());
        let mut unit_offsets: Vec<(usize, usize)> = Vec::with_capacity(text.len() + 1);
        let mut unit = 0usize;
        for r in char::decode_utf16(text.iter().copied()) {
            let ch = r.unwrap_or(char::REPLACEMENT_CHARACTER);
            unit_offsets.push((decoded.len(), unit));
            decoded.push(ch);
            unit += ch.len_utf16();
        }
        unit_offsets.push((decoded.len(), unit));

        for (byte, _opportunity) in linebreaks(&decoded) {
            let offset = match unit_offsets.binary_search_by_key(&byte, |&(b, _)| b) {
                Ok(i) => unit_offsets[i].1,
                Err(i) => unit_offsets[i - 1].1,
            };
            if offset > 0 && self.boundaries.last() != Some(&offset) {
                self.boundaries.push(offset);
            }
        }
        if !text.is_empty() && self.boundaries.last() != Some(&text.len()) {
            self.boundaries.push(text.len());
        }

        self.find_bad_chunks();
    }

    /// Flags whitespace-delimited chunks that look like email addresses or
    /// URLs; boundaries strictly inside one get maximum badness.
    fn find_bad_chunks(&mut self) {
        let mut chunk = String::new();
        let mut chunk_start = 0usize;
        let mut unit = 0usize;
        for r in char::decode_utf16(self.text.iter().copied()) {
            let ch = r.unwrap_or(char::REPLACEMENT_CHARACTER);
            if ch.is_whitespace() {
                if chunk.contains('@') || chunk.contains("://") {
                    self.bad_chunks.push((chunk_start, unit));
                }
                chunk.clear();
            } else {
                if chunk.is_empty() {
                    chunk_start = unit;
                }
                chunk.push(ch);
            }
            unit += ch.len_utf16();
        }
        if chunk.contains('@') || chunk.contains("://") {
            self.bad_chunks.push((chunk_start, unit));
        }
    }

    /// Advances past the current boundary, returning the next one or [`DONE`].
    pub fn next(&mut self) -> usize {
        self.last = self.current.min(self.text.len());
        self.current = if self.scan < self.boundaries.len() {
            let boundary = self.boundaries[self.scan];
            self.scan += 1;
            boundary
        } else {
            DONE
        };
        self.current
    }

    /// The boundary the iterator is currently parked on.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Start of the word preceding the current boundary, leading whitespace
    /// stripped.
    pub fn word_start(&self) -> usize {
        let end = self.current.min(self.text.len());
        let mut result = self.last;
        while result < end && is_breaker_space(self.text[result]) {
            result += 1;
        }
        result
    }

    /// End of the word preceding the current boundary, trailing whitespace
    /// stripped.
    pub fn word_end(&self) -> usize {
        let mut result = self.current.min(self.text.len());
        while result > self.last && is_breaker_space(self.text[result - 1]) {
            result -= 1;
        }
        result
    }

    /// Badness of breaking at the current boundary, in `[0, 1]`.
    pub fn break_badness(&self) -> f32 {
        let current = self.current.min(self.text.len());
        for &(start, end) in &self.bad_chunks {
            if current > start && current < end {
                return 1.0;
            }
        }
        0.0
    }

    /// Releases the paragraph buffers.
    pub fn finish(&mut self) {
        self.text.clear();
        self.boundaries.clear();
        self.bad_chunks.clear();
        self.scan = 0;
        self.last = 0;
        self.current = 0;
    }
}

// White_Space code units in the BMP; surrogate halves never match.
fn is_breaker_space(c: u16) -> bool {
    matches!(c,
        0x0009..=0x000D
        | 0x0020
        | 0x0085
        | 0x00A0
        | 0x1680
        | 0x2000..=0x200A
        | 0x2028
        | 0x2029
        | 0x202F
        | 0x205F
        | 0x3000)
}
