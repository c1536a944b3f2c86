//! Dynamic-programming break optimization.
//!
//! Scores every candidate as a line end against every plausible line start,
//! keeping the minimum cumulative cost and its predecessor link. Two
//! optimizations keep the scan near-linear in practice: an active window
//! (once a start candidate yields an overfull line, every earlier one does
//! too) and a running lower bound that skips starts which cannot beat the
//! best score found so far. The lower bound assumes width scores grow
//! monotonically while the delta stays non-negative, so it is re-derived
//! whenever the target line width changes mid-scan.

use log::trace;

use crate::hyphen::HyphenEdit;
use crate::style::BreakStrategy;

use super::{
    LineBreaker, ParaWidth, LAST_LINE_PENALTY_MULTIPLIER, SCORE_INFTY, SCORE_OVERFULL,
    SHRINKABILITY, SHRINK_PENALTY_MULTIPLIER,
};

impl LineBreaker {
    pub(crate) fn compute_breaks_optimal(&mut self) {
        let n_cand = self.candidates.len();
        let mut active = 0usize;
        let max_shrink = if self.justified {
            SHRINKABILITY * self.space_width()
        } else {
            0.0
        };
        let mut line_numbers: Vec<usize> = Vec::with_capacity(n_cand);
        line_numbers.push(0);

        // "i" iterates over candidates for the end of a line.
        for i in 1..n_cand {
            let at_end = i == n_cand - 1;
            let mut best = SCORE_INFTY;
            let mut best_prev = 0usize;

            let mut line_number_last = line_numbers[active];
            let mut width = self.line_width_at(line_number_last);
            let mut left_edge = self.candidates[i].post_break - width as ParaWidth;
            let mut best_hope = 0.0f32;

            // "j" iterates over candidates for the start of the line.
            for j in active..i {
                let line_number = line_numbers[j];
                if line_number != line_number_last {
                    let width_new = self.line_width_at(line_number);
                    if width_new != width {
                        left_edge = self.candidates[i].post_break - width_new as ParaWidth;
                        best_hope = 0.0;
                        width = width_new;
                    }
                    line_number_last = line_number;
                }
                let j_score = self.candidates[j].score;
                if j_score + best_hope >= best {
                    continue;
                }
                let delta = self.candidates[j].pre_break - left_edge;

                let mut width_score = 0.0f32;
                let mut additional_penalty = 0.0f32;
                if (at_end || !self.justified) && delta < 0.0 {
                    width_score = SCORE_OVERFULL;
                } else if at_end && self.strategy != BreakStrategy::Balanced {
                    // Hyphens just before the last line read especially badly.
                    additional_penalty =
                        LAST_LINE_PENALTY_MULTIPLIER * self.candidates[j].penalty;
                } else {
                    width_score = (delta * delta) as f32;
                    if delta < 0.0 {
                        let shrinkable = max_shrink as ParaWidth
                            * (self.candidates[i].post_space_count as ParaWidth
                                - self.candidates[j].pre_space_count as ParaWidth);
                        if -delta < shrinkable {
                            width_score *= SHRINK_PENALTY_MULTIPLIER;
                        } else {
                            width_score = SCORE_OVERFULL;
                        }
                    }
                }

                if delta < 0.0 {
                    active = j + 1;
                } else {
                    best_hope = width_score;
                }

                let score = j_score + width_score + additional_penalty;
                if score <= best {
                    best = score;
                    best_prev = j;
                }
            }
            self.candidates[i].score = best + self.candidates[i].penalty + self.line_penalty;
            self.candidates[i].prev = best_prev;
            line_numbers.push(line_numbers[best_prev] + 1);
            trace!(
                "optimal {}: score={:.1} prev={}",
                i,
                self.candidates[i].score,
                best_prev
            );
        }

        self.finish_breaks_optimal();
    }

    /// Walks the `prev` links backward from the final candidate, then
    /// reverses every output array into reading order.
    fn finish_breaks_optimal(&mut self) {
        self.breaks.clear();
        self.widths.clear();
        self.ascents.clear();
        self.descents.clear();
        self.flags.clear();

        let mut i = self.candidates.len() - 1;
        while i > 0 {
            let prev = self.candidates[i].prev;
            self.breaks.push(self.candidates[i].offset);
            self.widths
                .push((self.candidates[i].post_break - self.candidates[prev].pre_break) as f32);
            let extent = self.compute_max_extent(prev + 1, i);
            self.ascents.push(extent.ascent);
            self.descents.push(extent.descent);
            let mut flags = HyphenEdit::for_this_line(self.candidates[i].hyphen_type);
            if prev > 0 {
                flags |= HyphenEdit::for_next_line(self.candidates[prev].hyphen_type);
            }
            self.flags.push(flags);
            i = prev;
        }
        self.breaks.reverse();
        self.widths.reverse();
        self.ascents.reverse();
        self.descents.reverse();
        self.flags.reverse();
    }
}
