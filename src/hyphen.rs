//! # Hyphenation
//!
//! Knuth-Liang pattern hyphenation via `hypher`, wrapped in the vocabulary
//! the breaker scores with: one [`HyphenationType`] per code unit describing
//! what a break at that position does to the glyphs on either side.
//!
//! Words the pattern dictionary cannot serve — anything carrying a soft
//! hyphen, a hard hyphen, or a Catalan middle dot — go through a punctuation
//! fallback instead: those characters are themselves break opportunities,
//! and some locales attach special edits to them (Polish repeats the hyphen
//! on the next line, Catalan "l·l" breaks as "l-" / "l").

use serde::{Deserialize, Serialize};

pub(crate) const CHAR_NBSP: u16 = 0x00A0;
const CHAR_SOFT_HYPHEN: u16 = 0x00AD;
const CHAR_MIDDLE_DOT: u16 = 0x00B7;
const CHAR_HYPHEN_MINUS: u16 = 0x002D;
const CHAR_HYPHEN: u16 = 0x2010;

/// What breaking at a position does to the two resulting fragments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HyphenationType {
    /// Do not break.
    #[default]
    DontBreak,
    /// Break and insert a normal hyphen at the end of the line.
    BreakAndInsertHyphen,
    /// Break and insert an Armenian hyphen (U+058A).
    BreakAndInsertArmenianHyphen,
    /// Break and insert a Canadian Syllabics hyphen (U+1400).
    BreakAndInsertUcasHyphen,
    /// Break without inserting anything; a hyphen is already present, or the
    /// script does not use one.
    BreakAndDontInsertHyphen,
    /// Break and replace the last code unit with a hyphen (Catalan "l·l").
    BreakAndReplaceWithHyphen,
    /// Break and repeat the hyphen at the start of the next line (Polish,
    /// Slovenian).
    BreakAndInsertHyphenAtNextLine,
    /// Break with a ZWJ and hyphen on the first line and a ZWJ on the next,
    /// preserving joining behavior in Arabic-script text.
    BreakAndInsertHyphenAndZwj,
}

/// Packed glyph-edit codes stored in the low byte of a line's flags word.
///
/// Bits 0-2 describe the edit at the end of a line, bits 3-4 the edit at the
/// start of the following line. A line's flags byte is the OR of its own
/// end-of-line edit and the next-line edit of the break that opened it.
pub struct HyphenEdit;

impl HyphenEdit {
    pub const NO_EDIT: u32 = 0x00;

    pub const INSERT_HYPHEN_AT_END: u32 = 0x01;
    pub const INSERT_ARMENIAN_HYPHEN_AT_END: u32 = 0x02;
    pub const INSERT_UCAS_HYPHEN_AT_END: u32 = 0x03;
    pub const INSERT_ZWJ_AND_HYPHEN_AT_END: u32 = 0x04;
    pub const REPLACE_WITH_HYPHEN_AT_END: u32 = 0x05;
    pub const BREAK_AT_END: u32 = 0x06;

    pub const INSERT_HYPHEN_AT_START: u32 = 0x01 << 3;
    pub const INSERT_ZWJ_AT_START: u32 = 0x02 << 3;
    pub const BREAK_AT_START: u32 = 0x03 << 3;

    /// Mask of the end-of-line edit bits.
    pub const MASK_END: u32 = 0x07;
    /// Mask of the start-of-next-line edit bits.
    pub const MASK_START: u32 = 0x18;

    /// The edit applied to the line that ends at a break of this type.
    pub fn for_this_line(ty: HyphenationType) -> u32 {
        match ty {
            HyphenationType::DontBreak => Self::NO_EDIT,
            HyphenationType::BreakAndInsertHyphen => Self::INSERT_HYPHEN_AT_END,
            HyphenationType::BreakAndInsertArmenianHyphen => Self::INSERT_ARMENIAN_HYPHEN_AT_END,
            HyphenationType::BreakAndInsertUcasHyphen => Self::INSERT_UCAS_HYPHEN_AT_END,
            HyphenationType::BreakAndInsertHyphenAndZwj => Self::INSERT_ZWJ_AND_HYPHEN_AT_END,
            HyphenationType::BreakAndReplaceWithHyphen => Self::REPLACE_WITH_HYPHEN_AT_END,
            _ => Self::BREAK_AT_END,
        }
    }

    /// The edit applied to the line that starts at a break of this type.
    pub fn for_next_line(ty: HyphenationType) -> u32 {
        match ty {
            HyphenationType::DontBreak => Self::NO_EDIT,
            HyphenationType::BreakAndInsertHyphenAtNextLine => Self::INSERT_HYPHEN_AT_START,
            HyphenationType::BreakAndInsertHyphenAndZwj => Self::INSERT_ZWJ_AT_START,
            _ => Self::BREAK_AT_START,
        }
    }
}

/// A BCP-47-shaped locale tag, pre-validated.
///
/// The breaker only ever needs two things from a locale: whether the tag was
/// well-formed at all (bogus tags degrade to the root locale) and the primary
/// language subtag, which selects the hyphenation pattern set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    tag: String,
}

impl Locale {
    /// The root locale: no language, no hyphenation patterns.
    pub fn root() -> Self {
        Self { tag: String::new() }
    }

    /// Parses a tag, returning `None` for bogus input. Subtags may be split
    /// on `-` or `_`; the primary subtag must be a 2-3 letter language code.
    pub fn parse(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        let mut subtags = tag.split(['-', '_']);
        let primary = subtags.next()?;
        if !(2..=3).contains(&primary.len()) || !primary.bytes().all(|b| b.is_ascii_alphabetic()) {
            return None;
        }
        for subtag in subtags {
            if subtag.is_empty()
                || subtag.len() > 8
                || !subtag.bytes().all(|b| b.is_ascii_alphanumeric())
            {
                return None;
            }
        }
        Some(Self {
            tag: tag.to_string(),
        })
    }

    pub fn is_root(&self) -> bool {
        self.tag.is_empty()
    }

    /// The primary language subtag, lowercased. Empty for the root locale.
    pub fn language(&self) -> String {
        self.tag
            .split(['-', '_'])
            .next()
            .unwrap_or("")
            .to_ascii_lowercase()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// Per-word hyphenation collaborator.
///
/// Clears `out` and pushes exactly one [`HyphenationType`] per code unit of
/// `word`. Position 0 is never a break.
pub trait Hyphenator {
    fn hyphenate(&self, out: &mut Vec<HyphenationType>, word: &[u16], locale: &Locale);
}

/// Pattern-backed hyphenator with the punctuation fallback path.
#[derive(Debug, Clone, Copy)]
pub struct PatternHyphenator {
    min_prefix: usize,
    min_suffix: usize,
}

impl Default for PatternHyphenator {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternHyphenator {
    pub fn new() -> Self {
        Self {
            min_prefix: 2,
            min_suffix: 3,
        }
    }

    fn hyphenate_without_patterns(
        &self,
        out: &mut [HyphenationType],
        word: &[u16],
        locale: &Locale,
    ) {
        let len = word.len();
        let language = locale.language();
        for i in 1..len {
            let prev = word[i - 1];
            if i > 1 && is_line_breaking_hyphen(prev) {
                // Break after a hard hyphen. Polish and Slovenian repeat it at
                // the start of the next line when Latin text follows.
                if (prev == CHAR_HYPHEN_MINUS || prev == CHAR_HYPHEN)
                    && matches!(language.as_str(), "pl" | "sl")
                    && is_latin(word[i])
                {
                    out[i] = HyphenationType::BreakAndInsertHyphenAtNextLine;
                } else {
                    out[i] = HyphenationType::BreakAndDontInsertHyphen;
                }
            } else if i > 1 && prev == CHAR_SOFT_HYPHEN {
                // A soft hyphen starting the word gives no useful break.
                out[i] = type_for_code_unit(word[i]);
            } else if i >= 2
                && prev == CHAR_MIDDLE_DOT
                && self.min_prefix < i
                && i + self.min_suffix <= len
                && ((word[i - 2] == u16::from(b'l') && word[i] == u16::from(b'l'))
                    || (word[i - 2] == u16::from(b'L') && word[i] == u16::from(b'L')))
                && language == "ca"
            {
                // Catalan "l·l" breaks as "l-" on the first line, "l" on the next.
                out[i] = HyphenationType::BreakAndReplaceWithHyphen;
            }
        }
    }
}

impl Hyphenator for PatternHyphenator {
    fn hyphenate(&self, out: &mut Vec<HyphenationType>, word: &[u16], locale: &Locale) {
        out.clear();
        out.resize(word.len(), HyphenationType::DontBreak);
        if word.len() < self.min_prefix + self.min_suffix {
            return;
        }

        // The pattern dictionaries never contain hyphens, soft hyphens, or
        // middle dots; words carrying one take the punctuation path.
        if word
            .iter()
            .any(|&c| c == CHAR_SOFT_HYPHEN || c == CHAR_MIDDLE_DOT || is_line_breaking_hyphen(c))
        {
            self.hyphenate_without_patterns(out, word, locale);
            return;
        }

        let Some(lang) = pattern_lang(locale) else {
            return;
        };
        let decoded: String = char::decode_utf16(word.iter().copied())
            .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
        let syllables: Vec<&str> = hypher::hyphenate(&decoded, lang).collect();
        if syllables.len() < 2 {
            return;
        }

        let mut offset = 0usize;
        for syllable in &syllables[..syllables.len() - 1] {
            offset += syllable.chars().map(char::len_utf16).sum::<usize>();
            if offset < word.len() {
                out[offset] = type_for_code_unit(word[offset]);
            }
        }
    }
}

/// Characters after which line breaks are allowed, but which keep the word
/// out of the pattern dictionary: a curated set of hyphen-like punctuation.
fn is_line_breaking_hyphen(c: u16) -> bool {
    matches!(
        c,
        0x002D  // HYPHEN-MINUS
        | 0x058A  // ARMENIAN HYPHEN
        | 0x05BE  // HEBREW PUNCTUATION MAQAF
        | 0x1400  // CANADIAN SYLLABICS HYPHEN
        | 0x2010  // HYPHEN
        | 0x2013  // EN DASH
        | 0x2027  // HYPHENATION POINT
        | 0x2E17  // DOUBLE OBLIQUE HYPHEN
        | 0x2E40 // DOUBLE HYPHEN
    )
}

fn is_latin(c: u16) -> bool {
    matches!(c, 0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F)
}

/// Which break type a script wants at a pattern or soft-hyphen position.
fn type_for_code_unit(c: u16) -> HyphenationType {
    match c {
        0x0530..=0x058F => HyphenationType::BreakAndInsertArmenianHyphen,
        0x1400..=0x167F => HyphenationType::BreakAndInsertUcasHyphen,
        // Tamil through Malayalam: these scripts break without a hyphen.
        0x0B80..=0x0D7F => HyphenationType::BreakAndDontInsertHyphen,
        0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF => {
            HyphenationType::BreakAndInsertHyphenAndZwj
        }
        _ => HyphenationType::BreakAndInsertHyphen,
    }
}

/// Map a locale to a `hypher` pattern set. Unsupported languages return
/// `None`, which disables pattern hyphenation for the word.
fn pattern_lang(locale: &Locale) -> Option<hypher::Lang> {
    match locale.language().as_str() {
        "af" => Some(hypher::Lang::Afrikaans),
        "sq" => Some(hypher::Lang::Albanian),
        "be" => Some(hypher::Lang::Belarusian),
        "bg" => Some(hypher::Lang::Bulgarian),
        "ca" => Some(hypher::Lang::Catalan),
        "hr" => Some(hypher::Lang::Croatian),
        "cs" => Some(hypher::Lang::Czech),
        "da" => Some(hypher::Lang::Danish),
        "nl" => Some(hypher::Lang::Dutch),
        "en" => Some(hypher::Lang::English),
        "et" => Some(hypher::Lang::Estonian),
        "fi" => Some(hypher::Lang::Finnish),
        "fr" => Some(hypher::Lang::French),
        "ka" => Some(hypher::Lang::Georgian),
        "de" => Some(hypher::Lang::German),
        "el" => Some(hypher::Lang::Greek),
        "hu" => Some(hypher::Lang::Hungarian),
        "is" => Some(hypher::Lang::Icelandic),
        "it" => Some(hypher::Lang::Italian),
        "ku" => Some(hypher::Lang::Kurmanji),
        "la" => Some(hypher::Lang::Latin),
        "lt" => Some(hypher::Lang::Lithuanian),
        "mn" => Some(hypher::Lang::Mongolian),
        "nb" | "nn" | "no" => Some(hypher::Lang::Norwegian),
        "pl" => Some(hypher::Lang::Polish),
        "pt" => Some(hypher::Lang::Portuguese),
        "ru" => Some(hypher::Lang::Russian),
        "sr" => Some(hypher::Lang::Serbian),
        "sk" => Some(hypher::Lang::Slovak),
        "sl" => Some(hypher::Lang::Slovenian),
        "es" => Some(hypher::Lang::Spanish),
        "sv" => Some(hypher::Lang::Swedish),
        "tr" => Some(hypher::Lang::Turkish),
        "tk" => Some(hypher::Lang::Turkmen),
        "uk" => Some(hypher::Lang::Ukrainian),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn breaks_of(out: &[HyphenationType]) -> Vec<usize> {
        out.iter()
            .enumerate()
            .filter(|(_, t)| **t != HyphenationType::DontBreak)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_locale_parse() {
        assert!(Locale::parse("en").is_some());
        assert!(Locale::parse("en-US").is_some());
        assert!(Locale::parse("de_DE").is_some());
        assert!(Locale::parse("").is_none());
        assert!(Locale::parse("x").is_none());
        assert!(Locale::parse("123").is_none());
        assert!(Locale::parse("en-").is_none());
        assert_eq!(Locale::parse("FR-ca").unwrap().language(), "fr");
    }

    #[test]
    fn test_pattern_breaks_english() {
        let hyphenator = PatternHyphenator::new();
        let locale = Locale::parse("en-US").unwrap();
        let mut out = Vec::new();
        hyphenator.hyphenate(&mut out, &utf16("hyphenation"), &locale);
        assert_eq!(out.len(), 11);
        // hy-phen-ation
        assert_eq!(out[2], HyphenationType::BreakAndInsertHyphen);
        assert_eq!(out[6], HyphenationType::BreakAndInsertHyphen);
        assert_eq!(out[1], HyphenationType::DontBreak);
        assert_eq!(out[0], HyphenationType::DontBreak);
    }

    #[test]
    fn test_unsupported_language_gives_no_breaks() {
        let hyphenator = PatternHyphenator::new();
        let locale = Locale::parse("zz").unwrap();
        let mut out = Vec::new();
        hyphenator.hyphenate(&mut out, &utf16("hyphenation"), &locale);
        assert!(breaks_of(&out).is_empty());
    }

    #[test]
    fn test_short_words_are_left_alone() {
        let hyphenator = PatternHyphenator::new();
        let locale = Locale::parse("en").unwrap();
        let mut out = Vec::new();
        hyphenator.hyphenate(&mut out, &utf16("ion"), &locale);
        assert_eq!(out.len(), 3);
        assert!(breaks_of(&out).is_empty());
    }

    #[test]
    fn test_soft_hyphen_break() {
        let hyphenator = PatternHyphenator::new();
        let locale = Locale::parse("en").unwrap();
        let mut out = Vec::new();
        hyphenator.hyphenate(&mut out, &utf16("ex\u{00AD}ample"), &locale);
        assert_eq!(breaks_of(&out), vec![3]);
        assert_eq!(out[3], HyphenationType::BreakAndInsertHyphen);
    }

    #[test]
    fn test_hard_hyphen_breaks_without_inserting() {
        let hyphenator = PatternHyphenator::new();
        let locale = Locale::parse("en").unwrap();
        let mut out = Vec::new();
        hyphenator.hyphenate(&mut out, &utf16("e-mail"), &locale);
        assert_eq!(breaks_of(&out), vec![2]);
        assert_eq!(out[2], HyphenationType::BreakAndDontInsertHyphen);
    }

    #[test]
    fn test_polish_repeats_the_hyphen() {
        let hyphenator = PatternHyphenator::new();
        let locale = Locale::parse("pl").unwrap();
        let mut out = Vec::new();
        hyphenator.hyphenate(&mut out, &utf16("czerwono-niebieska"), &locale);
        assert_eq!(out[9], HyphenationType::BreakAndInsertHyphenAtNextLine);
    }

    #[test]
    fn test_catalan_middle_dot() {
        let hyphenator = PatternHyphenator::new();
        let locale = Locale::parse("ca").unwrap();
        let mut out = Vec::new();
        hyphenator.hyphenate(&mut out, &utf16("col\u{00B7}lecci\u{00F3}"), &locale);
        assert_eq!(out[4], HyphenationType::BreakAndReplaceWithHyphen);
    }

    #[test]
    fn test_edit_codes() {
        assert_eq!(
            HyphenEdit::for_this_line(HyphenationType::BreakAndInsertHyphen),
            HyphenEdit::INSERT_HYPHEN_AT_END
        );
        assert_eq!(
            HyphenEdit::for_this_line(HyphenationType::BreakAndDontInsertHyphen),
            HyphenEdit::BREAK_AT_END
        );
        assert_eq!(
            HyphenEdit::for_next_line(HyphenationType::BreakAndInsertHyphen),
            HyphenEdit::BREAK_AT_START
        );
        assert_eq!(
            HyphenEdit::for_next_line(HyphenationType::BreakAndInsertHyphenAtNextLine),
            HyphenEdit::INSERT_HYPHEN_AT_START
        );
        assert_eq!(HyphenEdit::for_this_line(HyphenationType::DontBreak), HyphenEdit::NO_EDIT);
    }
}
