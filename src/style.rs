//! # Breaking Configuration
//!
//! The host-facing knobs of the breaker, plus its two per-line geometry
//! collaborators: a width oracle consulted by line index, and a tab-stop
//! resolver consulted with the width already laid down on the line.
//!
//! Both collaborators are trait seams. The concrete types here cover the
//! common cases (rectangular frames, first-line indents, classic tab rulers);
//! hosts with exotic frame shapes install their own implementations.

use serde::{Deserialize, Serialize};

/// Which decider chooses the final break sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakStrategy {
    /// Commit each line as soon as the next candidate would overflow it.
    #[default]
    Greedy,
    /// Minimize the total width cost over the whole paragraph.
    HighQuality,
    /// Like `HighQuality`, but the last line participates in width scoring,
    /// evening out the paragraph tail.
    Balanced,
}

/// How eagerly words are hyphenated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HyphenationFrequency {
    /// Never consult the hyphenator.
    None,
    /// Conservative hyphenation; the hyphen penalty is quadrupled.
    #[default]
    Normal,
    /// Hyphenate wherever the patterns allow.
    Full,
}

/// Per-line width oracle. Line indices are zero-based.
pub trait LineWidths {
    fn line_width(&self, line: usize) -> f32;
}

/// A single width for every line: the common rectangular frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectLineWidths {
    pub width: f32,
}

impl RectLineWidths {
    pub fn new(width: f32) -> Self {
        Self { width }
    }
}

impl LineWidths for RectLineWidths {
    fn line_width(&self, _line: usize) -> f32 {
        self.width
    }
}

/// One width for the first `first_count` lines and another for the rest,
/// covering first-line indents and text wrapped around a leading figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndentedLineWidths {
    pub first: f32,
    pub first_count: usize,
    pub rest: f32,
}

impl IndentedLineWidths {
    pub fn new(first: f32, first_count: usize, rest: f32) -> Self {
        Self {
            first,
            first_count,
            rest,
        }
    }
}

impl LineWidths for IndentedLineWidths {
    fn line_width(&self, line: usize) -> f32 {
        if line < self.first_count {
            self.first
        } else {
            self.rest
        }
    }
}

/// Resolves where a tab lands on the current line.
pub trait TabStops {
    /// Given the width already laid down on the line, returns the width into
    /// the line at which the character after the tab starts.
    fn next_tab(&self, width_into_line: f32) -> f32;
}

/// Explicit stop positions first, then multiples of a default tab width.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedTabStops {
    pub stops: Vec<f32>,
    pub tab_width: f32,
}

impl FixedTabStops {
    pub fn new(stops: &[f32], tab_width: f32) -> Self {
        Self {
            stops: stops.to_vec(),
            tab_width,
        }
    }
}

impl TabStops for FixedTabStops {
    fn next_tab(&self, width_into_line: f32) -> f32 {
        for &stop in &self.stops {
            if stop > width_into_line {
                return stop;
            }
        }
        if self.tab_width <= 0.0 {
            // No default ruler: the tab advances nothing.
            return width_into_line;
        }
        (width_into_line / self.tab_width).floor() * self.tab_width + self.tab_width
    }
}
