//! # Line Breaker
//!
//! The incremental paragraph state machine. The host installs a UTF-16
//! buffer, streams style runs (and replacement spans) through
//! [`LineBreaker::add_style_run`], and finally asks for breaks. Each run
//! advances the paragraph width, consults the word breaker, optionally
//! hyphenates every closed word, and appends break candidates.
//!
//! The greedy decider runs inline as candidates arrive: a line is committed
//! the moment the next candidate would overflow it. The optimal deciders
//! (`HighQuality`, `Balanced`) instead score all candidates at the end; they
//! live in [`optimal`].
//!
//! One instance holds all mutable state and must not be shared across
//! threads; concurrent paragraphs need independent instances. `finish()`
//! clears the paragraph and releases large buffers.

mod optimal;

use std::sync::Arc;

use log::trace;

use crate::hyphen::{HyphenEdit, HyphenationType, Hyphenator, Locale, CHAR_NBSP};
use crate::shaping::{Extent, Paint, Shaper};
use crate::style::{BreakStrategy, FixedTabStops, HyphenationFrequency, LineWidths, TabStops};
use crate::word_break::WordBreaker;

const CHAR_TAB: u16 = 0x0009;

// Large scores in a hierarchy; a desperate break beats an overfull line, and
// both dwarf any achievable width score.
pub(crate) const SCORE_INFTY: f32 = f32::MAX;
pub(crate) const SCORE_OVERFULL: f32 = 1e12;
pub(crate) const SCORE_DESPERATE: f32 = 1e10;

// Multiplier for the hyphen penalty of a break that opens the last line.
pub(crate) const LAST_LINE_PENALTY_MULTIPLIER: f32 = 4.0;
// Penalty assigned to each line break, to prefer fewer lines.
const LINE_PENALTY_MULTIPLIER: f32 = 2.0;
// Penalty for shrinking spaces in justified text.
pub(crate) const SHRINK_PENALTY_MULTIPLIER: f32 = 4.0;
// Maximum fraction of a space a justifier may take back.
pub(crate) const SHRINKABILITY: f32 = 1.0 / 3.0;

// Very long words trigger quadratic behavior in hyphenation, so words past
// this length get no hyphenation opportunities at all; desperate breaks still
// apply if they overflow.
const LONGEST_HYPHENATED_WORD: usize = 45;

// Buffer capacity is retained across paragraphs up to this many code units.
const MAX_TEXT_BUF_RETAIN: usize = 32678;

/// Bit position of the tab flag in a line's flags word. The low byte holds
/// the line's [`HyphenEdit`] code.
pub const TAB_SHIFT: u32 = 29;

pub(crate) type ParaWidth = f64;

/// A potential break position with its scoring metadata.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Candidate {
    /// Code-unit offset at which the line would break.
    pub offset: usize,
    /// Paragraph width up to the break, trailing line-end spaces included.
    pub pre_break: ParaWidth,
    /// Paragraph width up to the break, trailing line-end spaces excluded.
    pub post_break: ParaWidth,
    pub pre_space_count: usize,
    pub post_space_count: usize,
    /// Maximum extent over the code units since the previous candidate.
    pub extent: Extent,
    pub penalty: f32,
    pub hyphen_type: HyphenationType,
    /// Minimum cumulative cost ending here; written by the optimal decider.
    pub score: f32,
    /// Preceding candidate on the minimum-cost path.
    pub prev: usize,
}

/// A shaped style run: the shaper plus its scalar paint parameters.
pub struct StyleRun<'a> {
    pub shaper: &'a dyn Shaper,
    pub paint: Paint,
}

/// The paragraph line-breaking engine.
pub struct LineBreaker {
    word_breaker: WordBreaker,
    locale: Locale,
    hyphenator: Option<Arc<dyn Hyphenator>>,

    text: Vec<u16>,
    char_widths: Vec<f32>,
    char_extents: Vec<Extent>,
    hyph_buf: Vec<HyphenationType>,

    candidates: Vec<Candidate>,

    breaks: Vec<usize>,
    widths: Vec<f32>,
    ascents: Vec<f32>,
    descents: Vec<f32>,
    flags: Vec<u32>,

    strategy: BreakStrategy,
    hyphenation_frequency: HyphenationFrequency,
    justified: bool,
    line_penalty: f32,
    line_widths: Option<Box<dyn LineWidths>>,
    tab_stops: Option<Box<dyn TabStops>>,

    width: ParaWidth,
    space_count: usize,
    last_break: usize,
    best_break: usize,
    best_score: f32,
    pre_break: ParaWidth,
    last_hyphenation: u32,
    first_tab_index: usize,
}

impl Default for LineBreaker {
    fn default() -> Self {
        Self::new()
    }
}

impl LineBreaker {
    pub fn new() -> Self {
        Self {
            word_breaker: WordBreaker::new(),
            locale: Locale::root(),
            hyphenator: None,
            text: Vec::new(),
            char_widths: Vec::new(),
            char_extents: Vec::new(),
            hyph_buf: Vec::new(),
            candidates: Vec::new(),
            breaks: Vec::new(),
            widths: Vec::new(),
            ascents: Vec::new(),
            descents: Vec::new(),
            flags: Vec::new(),
            strategy: BreakStrategy::Greedy,
            hyphenation_frequency: HyphenationFrequency::Normal,
            justified: false,
            line_penalty: 0.0,
            line_widths: None,
            tab_stops: None,
            width: 0.0,
            space_count: 0,
            last_break: 0,
            best_break: 0,
            best_score: SCORE_INFTY,
            pre_break: 0.0,
            last_hyphenation: HyphenEdit::NO_EDIT,
            first_tab_index: usize::MAX,
        }
    }

    /// Adopts the first locale in the comma-separated list that parses as
    /// non-bogus, together with the hyphenator at the same index (the last
    /// hyphenator serves the tail of the list). If none parses, the root
    /// locale is used with no hyphenator.
    pub fn set_locales(&mut self, locales: &str, hyphenators: &[Arc<dyn Hyphenator>]) {
        let mut adopted = None;
        for (i, tag) in locales.split(',').enumerate() {
            if let Some(locale) = Locale::parse(tag) {
                let hyphenator = if hyphenators.is_empty() {
                    None
                } else {
                    Some(hyphenators[i.min(hyphenators.len() - 1)].clone())
                };
                adopted = Some((locale, hyphenator));
                break;
            }
        }
        let (locale, hyphenator) = adopted.unwrap_or((Locale::root(), None));
        self.locale = locale;
        self.hyphenator = hyphenator;
        self.word_breaker.set_locale(&self.locale);
    }

    /// Resizes the paragraph buffers; the host writes code units (and, for
    /// replacement spans, widths) into them before calling [`Self::set_text`].
    pub fn resize(&mut self, size: usize) {
        self.text.resize(size, 0);
        self.char_widths.resize(size, 0.0);
        self.char_extents.resize(size, Extent::default());
    }

    pub fn size(&self) -> usize {
        self.text.len()
    }

    pub fn text(&self) -> &[u16] {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut [u16] {
        &mut self.text
    }

    pub fn char_widths_mut(&mut self) -> &mut [f32] {
        &mut self.char_widths
    }

    pub fn char_extents_mut(&mut self) -> &mut [Extent] {
        &mut self.char_extents
    }

    /// Primes the word breaker on the installed buffer and resets all
    /// per-paragraph breaking state.
    pub fn set_text(&mut self) {
        self.word_breaker.set_text(&self.text);
        // Take the initial boundary here because add_style_run may never run.
        self.word_breaker.next();

        self.candidates.clear();
        self.candidates.push(Candidate::default());

        self.breaks.clear();
        self.widths.clear();
        self.ascents.clear();
        self.descents.clear();
        self.flags.clear();
        self.last_break = 0;
        self.best_break = 0;
        self.best_score = SCORE_INFTY;
        self.pre_break = 0.0;
        self.last_hyphenation = HyphenEdit::NO_EDIT;
        self.first_tab_index = usize::MAX;
        self.space_count = 0;
    }

    pub fn set_strategy(&mut self, strategy: BreakStrategy) {
        self.strategy = strategy;
    }

    pub fn set_hyphenation_frequency(&mut self, frequency: HyphenationFrequency) {
        self.hyphenation_frequency = frequency;
    }

    pub fn set_justified(&mut self, justified: bool) {
        self.justified = justified;
    }

    pub fn set_line_widths(&mut self, line_widths: Box<dyn LineWidths>) {
        self.line_widths = Some(line_widths);
    }

    /// Installs the classic ruler: explicit stops, then multiples of
    /// `tab_width`.
    pub fn set_tab_stops(&mut self, stops: &[f32], tab_width: f32) {
        self.tab_stops = Some(Box::new(FixedTabStops::new(stops, tab_width)));
    }

    pub fn set_tab_resolver(&mut self, resolver: Box<dyn TabStops>) {
        self.tab_stops = Some(resolver);
    }

    pub fn breaks(&self) -> &[usize] {
        &self.breaks
    }

    pub fn widths(&self) -> &[f32] {
        &self.widths
    }

    pub fn ascents(&self) -> &[f32] {
        &self.ascents
    }

    pub fn descents(&self) -> &[f32] {
        &self.descents
    }

    pub fn flags(&self) -> &[u32] {
        &self.flags
    }

    /// Fills the hyphenation buffer for `text[start..end)`. A word here is
    /// any maximal run of non-NBSP code units; NBSP positions themselves
    /// never break.
    fn hyphenate(&mut self, start: usize, end: usize) {
        self.hyph_buf.clear();
        self.hyph_buf.reserve(end - start);

        let mut in_word = false;
        let mut word_start = start;
        for i in start..=end {
            if i == end || self.text[i] == CHAR_NBSP {
                if in_word {
                    let word_len = i - word_start;
                    if word_len <= LONGEST_HYPHENATED_WORD {
                        if let Some(hyphenator) = &self.hyphenator {
                            let mut word_types = Vec::with_capacity(word_len);
                            hyphenator.hyphenate(
                                &mut word_types,
                                &self.text[word_start..i],
                                &self.locale,
                            );
                            self.hyph_buf.extend_from_slice(&word_types);
                        } else {
                            self.hyph_buf
                                .extend(std::iter::repeat(HyphenationType::DontBreak).take(word_len));
                        }
                    } else {
                        // Too long to hyphenate efficiently.
                        self.hyph_buf
                            .extend(std::iter::repeat(HyphenationType::DontBreak).take(word_len));
                    }
                    in_word = false;
                }
                if i < end {
                    self.hyph_buf.push(HyphenationType::DontBreak);
                }
            } else if !in_word {
                in_word = true;
                word_start = i;
            }
        }
    }

    /// Processes one maximal range of uniform style and direction.
    ///
    /// With a run installed, the shaper fills per-code-unit advances and
    /// extents for the range and the measured width is returned. With `None`
    /// (replacement spans), the advances are assumed pre-populated.
    ///
    /// The range must satisfy `start <= end <= size()`; anything else is a
    /// programming error.
    pub fn add_style_run(
        &mut self,
        run: Option<&StyleRun<'_>>,
        start: usize,
        end: usize,
        is_rtl: bool,
    ) -> f32 {
        assert!(
            start <= end && end <= self.text.len(),
            "style run {}..{} outside the paragraph of {} code units",
            start,
            end,
            self.text.len()
        );

        let mut width = 0.0f32;
        let mut hyphen_penalty = 0.0f32;
        if let Some(run) = run {
            width = run.shaper.measure(
                &self.text,
                start,
                end,
                is_rtl,
                &run.paint,
                HyphenEdit::NO_EDIT,
                Some(&mut self.char_widths[start..end]),
                Some(&mut self.char_extents[start..end]),
            );

            // A heuristic that performs well in practice.
            hyphen_penalty = 0.5 * run.paint.size * run.paint.scale_x * self.line_width_at(0);
            if self.hyphenation_frequency == HyphenationFrequency::Normal {
                hyphen_penalty *= 4.0;
            }
            if self.justified {
                // Aggressive hyphenation, so "normal" justified reads like
                // "full" ragged-right.
                hyphen_penalty *= 0.25;
            } else {
                // Line penalty is zero for justified text.
                self.line_penalty = self
                    .line_penalty
                    .max(hyphen_penalty * LINE_PENALTY_MULTIPLIER);
            }
        }

        let mut current = self.word_breaker.current();
        let mut after_word = start;
        let mut last_break = start;
        let mut last_break_width = self.width;
        let mut post_break = self.width;
        let mut post_space_count = self.space_count;
        let mut extent = Extent::default();

        for i in start..end {
            let c = self.text[i];
            if c == CHAR_TAB {
                let into_line = (self.width - self.pre_break) as f32;
                self.width = self.pre_break + self.next_tab(into_line) as ParaWidth;
                if self.first_tab_index == usize::MAX {
                    self.first_tab_index = i;
                }
                // Fall back to greedy; the other strategies cannot reason
                // about a width that depends on earlier break decisions.
                self.strategy = BreakStrategy::Greedy;
            } else {
                if is_word_space(c) {
                    self.space_count += 1;
                }
                self.width += self.char_widths[i] as ParaWidth;
                extent.extend_by(&self.char_extents[i]);
                if !is_line_end_space(c) {
                    post_break = self.width;
                    post_space_count = self.space_count;
                    after_word = i + 1;
                }
            }

            if i + 1 == current {
                // The word [word_start, word_end) just closed.
                let word_start = self.word_breaker.word_start();
                let word_end = self.word_breaker.word_end();
                if let Some(run) = run {
                    if self.hyphenator.is_some()
                        && self.hyphenation_frequency != HyphenationFrequency::None
                        && word_start >= start
                        && word_end > word_start
                    {
                        self.hyphenate(word_start, word_end);
                        for j in word_start..word_end {
                            let hyph = self.hyph_buf[j - word_start];
                            if hyph != HyphenationType::DontBreak {
                                // Measure both fragments under their edits.
                                let first_part = run.shaper.measure(
                                    &self.text,
                                    last_break,
                                    j,
                                    is_rtl,
                                    &run.paint,
                                    HyphenEdit::for_this_line(hyph),
                                    None,
                                    None,
                                );
                                let hyph_post_break =
                                    last_break_width + first_part as ParaWidth;
                                let second_part = run.shaper.measure(
                                    &self.text,
                                    j,
                                    after_word,
                                    is_rtl,
                                    &run.paint,
                                    HyphenEdit::for_next_line(hyph),
                                    None,
                                    None,
                                );
                                let hyph_pre_break = post_break - second_part as ParaWidth;
                                self.add_word_break(
                                    j,
                                    hyph_pre_break,
                                    hyph_post_break,
                                    post_space_count,
                                    post_space_count,
                                    extent,
                                    hyphen_penalty,
                                    hyph,
                                );
                                extent.reset();
                            }
                        }
                    }
                }

                // Skip the boundary candidate on a zero-width code unit
                // inside a replacement span.
                if run.is_some() || current == end || self.char_widths[current] > 0.0 {
                    let penalty = hyphen_penalty * self.word_breaker.break_badness();
                    self.add_word_break(
                        current,
                        self.width,
                        post_break,
                        self.space_count,
                        post_space_count,
                        extent,
                        penalty,
                        HyphenationType::DontBreak,
                    );
                    extent.reset();
                }

                last_break = current;
                last_break_width = self.width;
                current = self.word_breaker.next();
            }
        }

        width
    }

    /// Installs a replacement span: full width on the first code unit, zero
    /// on the rest, no extents.
    pub fn add_replacement(&mut self, start: usize, end: usize, width: f32) {
        assert!(
            start < end && end <= self.text.len(),
            "replacement {}..{} outside the paragraph of {} code units",
            start,
            end,
            self.text.len()
        );
        self.char_widths[start] = width;
        for w in &mut self.char_widths[start + 1..end] {
            *w = 0.0;
        }
        for extent in &mut self.char_extents[start..end] {
            extent.reset();
        }
        self.add_style_run(None, start, end, false);
    }

    /// Adds a word-boundary (or hyphenated) candidate, synthesizing desperate
    /// candidates first when the run since the previous candidate is too wide
    /// for one line.
    #[allow(clippy::too_many_arguments)]
    fn add_word_break(
        &mut self,
        offset: usize,
        pre_break: ParaWidth,
        post_break: ParaWidth,
        pre_space_count: usize,
        post_space_count: usize,
        extent: Extent,
        penalty: f32,
        hyphen_type: HyphenationType,
    ) {
        let mut width = self.candidates.last().unwrap().pre_break;
        if post_break - width > self.current_line_width() as ParaWidth {
            // These breaks are based on the shaping of the unbroken text;
            // they are imprecise under kerning, ligatures, and joining.
            let mut i = self.candidates.last().unwrap().offset;
            width += self.char_widths[i] as ParaWidth;
            i += 1;
            while i < offset {
                let w = self.char_widths[i];
                if w > 0.0 {
                    trace!("desperate candidate at {}: width {:.1}", i, width);
                    self.add_candidate(Candidate {
                        offset: i,
                        pre_break: width,
                        post_break: width,
                        // Trailing spaces are excluded on both sides.
                        pre_space_count: post_space_count,
                        post_space_count,
                        extent: self.char_extents[i],
                        penalty: SCORE_DESPERATE,
                        hyphen_type: HyphenationType::BreakAndDontInsertHyphen,
                        score: 0.0,
                        prev: 0,
                    });
                    width += w as ParaWidth;
                }
                i += 1;
            }
        }

        self.add_candidate(Candidate {
            offset,
            pre_break,
            post_break,
            pre_space_count,
            post_space_count,
            extent,
            penalty,
            hyphen_type,
            score: 0.0,
            prev: 0,
        });
    }

    /// Appends a candidate and runs the greedy decider over it.
    fn add_candidate(&mut self, cand: Candidate) {
        let cand_index = self.candidates.len();
        self.candidates.push(cand);
        trace!(
            "candidate {}: offset={} {:.1}:{:.1}",
            cand_index,
            cand.offset,
            cand.post_break,
            cand.pre_break
        );

        if cand.post_break - self.pre_break > self.current_line_width() as ParaWidth {
            // This candidate would overflow the line; break at the best
            // candidate seen since the last committed break.
            if self.best_break == self.last_break {
                // Nothing good since the last break. Break here.
                self.best_break = cand_index;
            }
            self.push_greedy_break();
        }

        while self.last_break != cand_index
            && cand.post_break - self.pre_break > self.current_line_width() as ParaWidth
        {
            // The remainder still overflows. The second-best break since the
            // last one was not kept, so rescan for it. The cand_index guard
            // stops a single unbreakable candidate from looping forever.
            for i in self.last_break + 1..cand_index {
                let penalty = self.candidates[i].penalty;
                if penalty <= self.best_score {
                    self.best_break = i;
                    self.best_score = penalty;
                }
            }
            if self.best_break == self.last_break {
                self.best_break = cand_index;
            }
            self.push_greedy_break();
        }

        if cand.penalty <= self.best_score {
            self.best_break = cand_index;
            self.best_score = cand.penalty;
        }
    }

    fn push_greedy_break(&mut self) {
        let best = self.candidates[self.best_break];
        let extent = self.compute_max_extent(self.last_break + 1, self.best_break);
        let edit = self.last_hyphenation | HyphenEdit::for_this_line(best.hyphen_type);
        self.push_break(best.offset, (best.post_break - self.pre_break) as f32, extent, edit);
        self.best_score = SCORE_INFTY;
        self.last_break = self.best_break;
        self.pre_break = best.pre_break;
        self.last_hyphenation = HyphenEdit::for_next_line(best.hyphen_type);
    }

    /// Maximum extent over candidates `start..=end`.
    pub(crate) fn compute_max_extent(&self, start: usize, end: usize) -> Extent {
        let mut result = self.candidates[end].extent;
        for j in start..end {
            result.extend_by(&self.candidates[j].extent);
        }
        result
    }

    fn push_break(&mut self, offset: usize, width: f32, extent: Extent, hyphen_edit: u32) {
        trace!("break: {} {:.1}", offset, width);
        self.breaks.push(offset);
        self.widths.push(width);
        self.ascents.push(extent.ascent);
        self.descents.push(extent.descent);
        let mut flags = ((self.first_tab_index < offset) as u32) << TAB_SHIFT;
        flags |= hyphen_edit;
        self.flags.push(flags);
        self.first_tab_index = usize::MAX;
    }

    /// Width of a space in the paragraph, or zero if there is none. With
    /// mixed fonts this is only guaranteed to pick one of them.
    pub(crate) fn space_width(&self) -> f32 {
        for (i, &c) in self.text.iter().enumerate() {
            if is_word_space(c) {
                return self.char_widths[i];
            }
        }
        0.0
    }

    pub(crate) fn line_width_at(&self, line: usize) -> f32 {
        match &self.line_widths {
            Some(widths) => widths.line_width(line),
            // No oracle installed: lines are unconstrained.
            None => f32::MAX,
        }
    }

    fn current_line_width(&self) -> f32 {
        self.line_width_at(self.breaks.len())
    }

    fn next_tab(&self, width_into_line: f32) -> f32 {
        match &self.tab_stops {
            Some(stops) => stops.next_tab(width_into_line),
            None => width_into_line,
        }
    }

    /// Decides the paragraph's breaks, returning the number of lines. The
    /// results are read from [`Self::breaks`], [`Self::widths`],
    /// [`Self::ascents`], [`Self::descents`], and [`Self::flags`].
    pub fn compute_breaks(&mut self) -> usize {
        if self.strategy == BreakStrategy::Greedy {
            self.compute_breaks_greedy();
        } else {
            self.compute_breaks_optimal();
        }
        self.breaks.len()
    }

    fn compute_breaks_greedy(&mut self) {
        // Every break but the last was already committed by add_candidate.
        let n_cand = self.candidates.len();
        if n_cand == 1 || self.last_break != n_cand - 1 {
            let last = self.candidates[n_cand - 1];
            let extent = self.compute_max_extent(self.last_break + 1, n_cand - 1);
            self.push_break(
                last.offset,
                (last.post_break - self.pre_break) as f32,
                extent,
                self.last_hyphenation,
            );
        }
    }

    /// Clears per-paragraph state. Buffer capacity is retained for the next
    /// paragraph unless the text exceeded the retention limit.
    pub fn finish(&mut self) {
        self.word_breaker.finish();
        self.width = 0.0;
        self.candidates.clear();
        self.breaks.clear();
        self.widths.clear();
        self.ascents.clear();
        self.descents.clear();
        self.flags.clear();
        if self.text.len() > MAX_TEXT_BUF_RETAIN {
            self.text.clear();
            self.text.shrink_to_fit();
            self.char_widths.clear();
            self.char_widths.shrink_to_fit();
            self.char_extents.clear();
            self.char_extents.shrink_to_fit();
            self.hyph_buf.clear();
            self.hyph_buf.shrink_to_fit();
            self.candidates.shrink_to_fit();
            self.breaks.shrink_to_fit();
            self.widths.shrink_to_fit();
            self.ascents.shrink_to_fit();
            self.descents.shrink_to_fit();
            self.flags.shrink_to_fit();
        }
        self.strategy = BreakStrategy::Greedy;
        self.hyphenation_frequency = HyphenationFrequency::Normal;
        self.line_penalty = 0.0;
        self.justified = false;
        self.line_widths = None;
    }
}

// The set [[:General_Category=Space_Separator:]-[:Line_Break=Glue:]] plus
// '\n': spaces that disappear at the end of a line. All are in the BMP.
fn is_line_end_space(c: u16) -> bool {
    c == 0x000A
        || c == 0x0020
        || c == 0x1680
        || ((0x2000..=0x200A).contains(&c) && c != 0x2007)
        || c == 0x205F
        || c == 0x3000
}

// Spaces that participate in justification shrinkability. NBSP and other
// glue spaces are excluded.
fn is_word_space(c: u16) -> bool {
    c == 0x0020
        || c == 0x1680
        || ((0x2000..=0x200A).contains(&c) && c != 0x2007)
        || c == 0x205F
        || c == 0x3000
}
