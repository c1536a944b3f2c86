//! Integration tests for the line-breaking pipeline.
//!
//! These exercise the full path: install a paragraph, stream style runs,
//! compute breaks, and check the output arrays. A fixed-advance shaper keeps
//! the geometry exact so break positions and widths can be asserted.

use std::sync::Arc;

use cesure::{
    BreakStrategy, Extent, HyphenEdit, HyphenationType, Hyphenator, LineBreaker, Locale, Paint,
    RectLineWidths, Shaper, StyleRun, TAB_SHIFT,
};

// ─── Helpers ────────────────────────────────────────────────────

const ASCENT: f32 = -8.0;
const DESCENT: f32 = 3.0;

/// Every code unit advances the same amount; hyphen glyphs too.
struct FixedAdvanceShaper {
    advance: f32,
}

impl Shaper for FixedAdvanceShaper {
    fn measure(
        &self,
        _text: &[u16],
        start: usize,
        end: usize,
        _is_rtl: bool,
        _paint: &Paint,
        edit: u32,
        advances: Option<&mut [f32]>,
        extents: Option<&mut [Extent]>,
    ) -> f32 {
        if let Some(advances) = advances {
            for advance in advances.iter_mut() {
                *advance = self.advance;
            }
        }
        if let Some(extents) = extents {
            for extent in extents.iter_mut() {
                *extent = Extent {
                    ascent: ASCENT,
                    descent: DESCENT,
                    line_gap: 0.0,
                };
            }
        }
        let mut total = self.advance * (end - start) as f32;
        match edit & HyphenEdit::MASK_END {
            HyphenEdit::NO_EDIT
            | HyphenEdit::BREAK_AT_END
            | HyphenEdit::REPLACE_WITH_HYPHEN_AT_END => {}
            _ => total += self.advance,
        }
        if edit & HyphenEdit::MASK_START == HyphenEdit::INSERT_HYPHEN_AT_START {
            total += self.advance;
        }
        total
    }
}

/// Marks a single position in every word as a hyphenation opportunity.
struct PositionHyphenator {
    position: usize,
}

impl Hyphenator for PositionHyphenator {
    fn hyphenate(&self, out: &mut Vec<HyphenationType>, word: &[u16], _locale: &Locale) {
        out.clear();
        out.resize(word.len(), HyphenationType::DontBreak);
        if self.position > 0 && self.position < word.len() {
            out[self.position] = HyphenationType::BreakAndInsertHyphen;
        }
    }
}

fn install(breaker: &mut LineBreaker, text: &str) -> usize {
    let units: Vec<u16> = text.encode_utf16().collect();
    breaker.resize(units.len());
    breaker.text_mut().copy_from_slice(&units);
    breaker.set_text();
    units.len()
}

fn assert_break_invariants(breaker: &LineBreaker, size: usize) {
    let breaks = breaker.breaks();
    assert!(!breaks.is_empty(), "a paragraph produces at least one line");
    for pair in breaks.windows(2) {
        assert!(pair[0] < pair[1], "breaks must be strictly increasing: {breaks:?}");
    }
    assert_eq!(*breaks.last().unwrap(), size, "the last break ends the paragraph");
    assert_eq!(breaker.widths().len(), breaks.len());
    assert_eq!(breaker.ascents().len(), breaks.len());
    assert_eq!(breaker.descents().len(), breaks.len());
    assert_eq!(breaker.flags().len(), breaks.len());
}

// ─── Greedy ─────────────────────────────────────────────────────

#[test]
fn test_single_word_fits() {
    let shaper = FixedAdvanceShaper { advance: 10.0 };
    let mut breaker = LineBreaker::new();
    breaker.set_line_widths(Box::new(RectLineWidths::new(100.0)));
    let size = install(&mut breaker, "hello");
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };
    breaker.add_style_run(Some(&run), 0, size, false);
    let lines = breaker.compute_breaks();
    assert_eq!(lines, 1);
    assert_eq!(breaker.breaks(), &[5]);
    assert_eq!(breaker.widths(), &[50.0]);
    assert_eq!(breaker.ascents(), &[ASCENT]);
    assert_eq!(breaker.descents(), &[DESCENT]);
    assert_break_invariants(&breaker, size);
}

#[test]
fn test_greedy_two_lines_trims_trailing_space() {
    let shaper = FixedAdvanceShaper { advance: 10.0 };
    let mut breaker = LineBreaker::new();
    breaker.set_line_widths(Box::new(RectLineWidths::new(70.0)));
    let size = install(&mut breaker, "aaa bbb ccc");
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };
    breaker.add_style_run(Some(&run), 0, size, false);
    let lines = breaker.compute_breaks();
    assert_eq!(lines, 2);
    assert_eq!(breaker.breaks(), &[8, 11]);
    // The space after "bbb" is a trailing line-end space: part of the
    // paragraph advance, not of the visible line.
    assert_eq!(breaker.widths(), &[70.0, 30.0]);
    let visible: f32 = breaker.widths().iter().sum();
    assert_eq!(visible, 11.0 * 10.0 - 10.0, "total advance minus one trimmed space");
    assert_break_invariants(&breaker, size);
}

#[test]
fn test_desperate_breaks_in_unbreakable_text() {
    let shaper = FixedAdvanceShaper { advance: 20.0 };
    let mut breaker = LineBreaker::new();
    breaker.set_line_widths(Box::new(RectLineWidths::new(50.0)));
    let size = install(&mut breaker, "abcdefghij");
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };
    breaker.add_style_run(Some(&run), 0, size, false);
    breaker.compute_breaks();
    assert_eq!(breaker.breaks(), &[2, 4, 6, 8, 10]);
    for &width in breaker.widths() {
        assert!(width <= 50.0, "desperate lines still fit: {width}");
    }
    assert_break_invariants(&breaker, size);
}

#[test]
fn test_multi_run_matches_single_run() {
    let shaper = FixedAdvanceShaper { advance: 10.0 };
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };

    let mut split = LineBreaker::new();
    split.set_line_widths(Box::new(RectLineWidths::new(60.0)));
    let size = install(&mut split, "aaa bbb ccc");
    split.add_style_run(Some(&run), 0, 4, false);
    split.add_style_run(Some(&run), 4, size, false);
    split.compute_breaks();

    let mut whole = LineBreaker::new();
    whole.set_line_widths(Box::new(RectLineWidths::new(60.0)));
    install(&mut whole, "aaa bbb ccc");
    whole.add_style_run(Some(&run), 0, size, false);
    whole.compute_breaks();

    assert_eq!(split.breaks(), whole.breaks());
    assert_eq!(split.widths(), whole.widths());
    assert_eq!(split.flags(), whole.flags());
}

// ─── Hyphenation ────────────────────────────────────────────────

#[test]
fn test_hyphenated_break_carries_edits() {
    let shaper = FixedAdvanceShaper { advance: 10.0 };
    let mut breaker = LineBreaker::new();
    let hyphenators: Vec<Arc<dyn Hyphenator>> =
        vec![Arc::new(PositionHyphenator { position: 3 })];
    breaker.set_locales("en-US", &hyphenators);
    breaker.set_line_widths(Box::new(RectLineWidths::new(80.0)));
    breaker.set_strategy(BreakStrategy::HighQuality);
    let size = install(&mut breaker, "hyphenation");
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };
    breaker.add_style_run(Some(&run), 0, size, false);
    let lines = breaker.compute_breaks();
    assert_eq!(lines, 2);
    assert_eq!(breaker.breaks(), &[3, 11]);
    // Line 0 gains the hyphen glyph's advance.
    assert_eq!(breaker.widths(), &[40.0, 80.0]);
    assert_eq!(
        breaker.flags()[0] & HyphenEdit::MASK_END,
        HyphenEdit::INSERT_HYPHEN_AT_END,
        "line 0 ends in an inserted hyphen"
    );
    assert_eq!(
        breaker.flags()[1] & HyphenEdit::MASK_START,
        HyphenEdit::BREAK_AT_START,
        "line 1 starts at the hyphenated break"
    );
    assert_break_invariants(&breaker, size);
}

#[test]
fn test_nbsp_is_never_broken() {
    let shaper = FixedAdvanceShaper { advance: 10.0 };
    let mut breaker = LineBreaker::new();
    breaker.set_line_widths(Box::new(RectLineWidths::new(200.0)));
    let size = install(&mut breaker, "a\u{00A0}b c");
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };
    breaker.add_style_run(Some(&run), 0, size, false);
    let lines = breaker.compute_breaks();
    assert_eq!(lines, 1, "the whole paragraph fits on one line");
    assert_eq!(breaker.breaks(), &[5]);
    assert_break_invariants(&breaker, size);
}

// ─── Tabs ───────────────────────────────────────────────────────

#[test]
fn test_tab_snaps_width_and_forces_greedy() {
    let shaper = FixedAdvanceShaper { advance: 10.0 };
    let mut breaker = LineBreaker::new();
    breaker.set_line_widths(Box::new(RectLineWidths::new(100.0)));
    breaker.set_tab_stops(&[], 40.0);
    breaker.set_strategy(BreakStrategy::HighQuality);
    let size = install(&mut breaker, "ab\tcd");
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };
    breaker.add_style_run(Some(&run), 0, size, false);
    let lines = breaker.compute_breaks();
    assert_eq!(lines, 1);
    // "ab" is 20 wide, the tab lands on 40, "cd" takes it to 60.
    assert_eq!(breaker.widths(), &[60.0]);
    assert_ne!(
        breaker.flags()[0] & (1 << TAB_SHIFT),
        0,
        "the line containing the tab carries the tab flag"
    );
    assert_break_invariants(&breaker, size);
}

// ─── Replacement spans ──────────────────────────────────────────

#[test]
fn test_replacement_span_is_never_broken() {
    let mut breaker = LineBreaker::new();
    breaker.set_line_widths(Box::new(RectLineWidths::new(50.0)));
    let size = install(&mut breaker, "ab cd");
    breaker.add_replacement(0, size, 120.0);
    let lines = breaker.compute_breaks();
    assert_eq!(lines, 1, "a replacement wider than the line still yields one line");
    assert_eq!(breaker.breaks(), &[5]);
    assert_eq!(breaker.widths(), &[120.0]);
    assert_break_invariants(&breaker, size);
}

#[test]
fn test_replacement_followed_by_text_breaks_after_it() {
    let shaper = FixedAdvanceShaper { advance: 10.0 };
    let mut breaker = LineBreaker::new();
    breaker.set_line_widths(Box::new(RectLineWidths::new(50.0)));
    let size = install(&mut breaker, "ab cdef");
    breaker.add_replacement(0, 3, 40.0);
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };
    breaker.add_style_run(Some(&run), 3, size, false);
    breaker.compute_breaks();
    assert_eq!(breaker.breaks(), &[3, 7], "the word after the replacement moves down");
    assert_break_invariants(&breaker, size);
}

// ─── Optimal strategies ─────────────────────────────────────────

/// Brute-force reference for the optimal decider: enumerate every break
/// subset and score it with the same cost model.
fn brute_force_best(
    boundaries: &[usize],
    pre: &[f64],
    post: &[f64],
    width: f32,
    line_penalty: f32,
) -> Vec<usize> {
    const OVERFULL: f64 = 1e12;
    let interior = boundaries.len() - 1;
    let mut best_cost = f64::INFINITY;
    let mut best_path = Vec::new();
    for mask in 0..(1u32 << interior) {
        let mut path = Vec::new();
        for bit in 0..interior {
            if mask & (1 << bit) != 0 {
                path.push(bit);
            }
        }
        path.push(interior);

        let mut cost = 0.0f64;
        let mut prev_pre = 0.0f64;
        for (k, &b) in path.iter().enumerate() {
            let last = k == path.len() - 1;
            let delta = prev_pre - (post[b] - width as f64);
            if delta < 0.0 {
                cost += OVERFULL;
            } else if !last {
                cost += delta * delta;
            }
            cost += line_penalty as f64;
            prev_pre = pre[b];
        }
        if cost < best_cost {
            best_cost = cost;
            best_path = path.iter().map(|&b| boundaries[b]).collect();
        }
    }
    best_path
}

#[test]
fn test_high_quality_matches_brute_force() {
    let shaper = FixedAdvanceShaper { advance: 10.0 };
    let mut breaker = LineBreaker::new();
    breaker.set_line_widths(Box::new(RectLineWidths::new(50.0)));
    breaker.set_strategy(BreakStrategy::HighQuality);
    let size = install(&mut breaker, "aa bb cc dd");
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };
    breaker.add_style_run(Some(&run), 0, size, false);
    breaker.compute_breaks();

    // Boundary geometry for "aa bb cc dd" at 10 units per code unit.
    let boundaries = [3usize, 6, 9, 11];
    let pre = [30.0, 60.0, 90.0, 110.0];
    let post = [20.0, 50.0, 80.0, 110.0];
    // hyphen penalty = 0.5 * 10 * 50, quadrupled for Normal frequency;
    // line penalty is twice that.
    let line_penalty = 2000.0;
    let expected = brute_force_best(&boundaries, &pre, &post, 50.0, line_penalty);

    assert_eq!(breaker.breaks(), expected.as_slice());
    assert_eq!(breaker.breaks(), &[6, 11]);
    assert_break_invariants(&breaker, size);
}

#[test]
fn test_balanced_evens_out_the_last_line() {
    let shaper = FixedAdvanceShaper { advance: 10.0 };
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };

    let mut high_quality = LineBreaker::new();
    high_quality.set_line_widths(Box::new(RectLineWidths::new(100.0)));
    high_quality.set_strategy(BreakStrategy::HighQuality);
    let size = install(&mut high_quality, "aaaa aaaa aa");
    high_quality.add_style_run(Some(&run), 0, size, false);
    high_quality.compute_breaks();
    assert_eq!(high_quality.breaks(), &[10, 12], "high quality fills the first line");

    let mut balanced = LineBreaker::new();
    balanced.set_line_widths(Box::new(RectLineWidths::new(100.0)));
    balanced.set_strategy(BreakStrategy::Balanced);
    install(&mut balanced, "aaaa aaaa aa");
    balanced.add_style_run(Some(&run), 0, size, false);
    balanced.compute_breaks();
    assert_eq!(balanced.breaks(), &[5, 12], "balanced levels the two lines");
    assert_break_invariants(&balanced, size);
}

#[test]
fn test_justified_text_may_shrink_spaces() {
    let shaper = FixedAdvanceShaper { advance: 10.0 };
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };

    let mut justified = LineBreaker::new();
    justified.set_line_widths(Box::new(RectLineWidths::new(48.0)));
    justified.set_strategy(BreakStrategy::HighQuality);
    justified.set_justified(true);
    let size = install(&mut justified, "aa bb cc dd ee");
    justified.add_style_run(Some(&run), 0, size, false);
    let justified_lines = justified.compute_breaks();
    assert_eq!(justified.breaks(), &[6, 12, 14], "slightly-over lines shrink into place");
    assert_break_invariants(&justified, size);

    let mut ragged = LineBreaker::new();
    ragged.set_line_widths(Box::new(RectLineWidths::new(48.0)));
    ragged.set_strategy(BreakStrategy::HighQuality);
    install(&mut ragged, "aa bb cc dd ee");
    ragged.add_style_run(Some(&run), 0, size, false);
    let ragged_lines = ragged.compute_breaks();
    assert!(
        ragged_lines > justified_lines,
        "without shrinkability the same paragraph needs more lines ({ragged_lines} vs {justified_lines})"
    );
    assert_break_invariants(&ragged, size);
}

// ─── Lifecycle ──────────────────────────────────────────────────

#[test]
fn test_finish_resets_to_a_fresh_instance() {
    let shaper = FixedAdvanceShaper { advance: 10.0 };
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };

    let mut reused = LineBreaker::new();
    reused.set_line_widths(Box::new(RectLineWidths::new(70.0)));
    let size = install(&mut reused, "aaa bbb ccc");
    reused.add_style_run(Some(&run), 0, size, false);
    reused.compute_breaks();
    reused.finish();

    // Same paragraph again on the reused instance. finish() dropped the
    // width oracle, so it is installed anew.
    reused.set_line_widths(Box::new(RectLineWidths::new(70.0)));
    install(&mut reused, "aaa bbb ccc");
    reused.add_style_run(Some(&run), 0, size, false);
    reused.compute_breaks();

    let mut fresh = LineBreaker::new();
    fresh.set_line_widths(Box::new(RectLineWidths::new(70.0)));
    install(&mut fresh, "aaa bbb ccc");
    fresh.add_style_run(Some(&run), 0, size, false);
    fresh.compute_breaks();

    assert_eq!(reused.breaks(), fresh.breaks());
    assert_eq!(reused.widths(), fresh.widths());
    assert_eq!(reused.ascents(), fresh.ascents());
    assert_eq!(reused.descents(), fresh.descents());
    assert_eq!(reused.flags(), fresh.flags());
}

#[test]
fn test_rerunning_the_same_strategy_is_stable() {
    let shaper = FixedAdvanceShaper { advance: 10.0 };
    let run = StyleRun {
        shaper: &shaper,
        paint: Paint::new(10.0),
    };
    let mut first = LineBreaker::new();
    first.set_line_widths(Box::new(RectLineWidths::new(50.0)));
    let size = install(&mut first, "aa bb cc dd");
    first.add_style_run(Some(&run), 0, size, false);
    first.compute_breaks();

    let mut second = LineBreaker::new();
    second.set_line_widths(Box::new(RectLineWidths::new(50.0)));
    install(&mut second, "aa bb cc dd");
    second.add_style_run(Some(&run), 0, size, false);
    second.compute_breaks();

    assert_eq!(first.breaks(), second.breaks());
    assert_eq!(first.widths(), second.widths());
}

#[test]
fn test_empty_paragraph_yields_one_empty_line() {
    let mut breaker = LineBreaker::new();
    breaker.set_line_widths(Box::new(RectLineWidths::new(50.0)));
    install(&mut breaker, "");
    let lines = breaker.compute_breaks();
    assert_eq!(lines, 1);
    assert_eq!(breaker.breaks(), &[0]);
    assert_eq!(breaker.widths(), &[0.0]);
}
