//! # Cesure
//!
//! A paragraph line-breaking engine. Given already-shaped text — per-code-unit
//! advances and vertical extents over a UTF-16 buffer — it decides where the
//! paragraph breaks into lines: at word boundaries when they fit, at
//! hyphenation opportunities when they score better, and mid-word as a last
//! resort so every paragraph yields at least one line.
//!
//! ## Architecture
//!
//! ```text
//!  host text + style runs
//!        ↓
//!   [shaping]     — per-code-unit advances and extents (rustybuzz)
//!        ↓
//!   [word_break]  — UAX#14 boundaries (unicode-linebreak)
//!   [hyphen]      — hyphenation opportunities (hypher)
//!        ↓
//!   [breaker]     — candidate generation, greedy or optimal decision
//!        ↓
//!  break offsets + line widths + extents + flags
//! ```
//!
//! The breaker itself never does I/O and never blocks; fonts, locales, and
//! frame geometry all arrive through collaborator traits ([`Shaper`],
//! [`Hyphenator`], [`LineWidths`], [`TabStops`]).
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cesure::{
//!     BreakStrategy, FaceShaper, Hyphenator, LineBreaker, Paint, PatternHyphenator,
//!     RectLineWidths, StyleRun,
//! };
//!
//! let shaper = FaceShaper::new(std::fs::read("font.ttf").unwrap()).unwrap();
//! let mut breaker = LineBreaker::new();
//! let hyphenators: Vec<Arc<dyn Hyphenator>> = vec![Arc::new(PatternHyphenator::new())];
//! breaker.set_locales("en-US", &hyphenators);
//! breaker.set_line_widths(Box::new(RectLineWidths::new(240.0)));
//! breaker.set_strategy(BreakStrategy::HighQuality);
//!
//! let text: Vec<u16> = "An example paragraph.".encode_utf16().collect();
//! breaker.resize(text.len());
//! breaker.text_mut().copy_from_slice(&text);
//! breaker.set_text();
//! let run = StyleRun { shaper: &shaper, paint: Paint::new(14.0) };
//! breaker.add_style_run(Some(&run), 0, text.len(), false);
//! let lines = breaker.compute_breaks();
//! for line in 0..lines {
//!     println!("{} @ {}", breaker.breaks()[line], breaker.widths()[line]);
//! }
//! breaker.finish();
//! ```

pub mod breaker;
pub mod hyphen;
pub mod shaping;
pub mod style;
pub mod word_break;

pub use breaker::{LineBreaker, StyleRun, TAB_SHIFT};
pub use hyphen::{HyphenEdit, HyphenationType, Hyphenator, Locale, PatternHyphenator};
pub use shaping::{Extent, FaceMetrics, FaceShaper, Paint, Shaper};
pub use style::{
    BreakStrategy, FixedTabStops, HyphenationFrequency, IndentedLineWidths, LineWidths,
    RectLineWidths, TabStops,
};
pub use word_break::WordBreaker;
