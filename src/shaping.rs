//! # Shaping Collaborators
//!
//! The breaker never talks to a font directly; it asks a [`Shaper`] for
//! per-code-unit advances and vertical extents, and for the re-measured width
//! of word fragments when a hyphen edit is applied.
//!
//! [`FaceShaper`] is the real implementation: rustybuzz performs OpenType
//! shaping (GSUB/GPOS), and cluster advances are distributed back onto code
//! units — the first unit of a ligature cluster carries the full advance,
//! the rest carry zero. Face-wide vertical metrics come from ttf-parser.

use crate::hyphen::HyphenEdit;

/// Vertical extents of a shaped code unit, in layout units.
///
/// `ascent` is negative (distance above the baseline), `descent` positive.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Extent {
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
}

impl Extent {
    pub fn reset(&mut self) {
        *self = Extent::default();
    }

    /// Widens this extent to cover `other`.
    pub fn extend_by(&mut self, other: &Extent) {
        self.ascent = self.ascent.min(other.ascent);
        self.descent = self.descent.max(other.descent);
        self.line_gap = self.line_gap.max(other.line_gap);
    }
}

/// Scalar shaping parameters for one style run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    /// Em size in layout units.
    pub size: f32,
    /// Horizontal scale applied on top of the size.
    pub scale_x: f32,
}

impl Paint {
    pub fn new(size: f32) -> Self {
        Self { size, scale_x: 1.0 }
    }
}

/// Produces per-code-unit advances and vertical extents for a run.
pub trait Shaper {
    /// Measures `text[start..end)`, returning the total advance.
    ///
    /// `edit` is a [`HyphenEdit`] code describing glyphs added to or removed
    /// from the fragment by a hyphenated break. When `advances` or `extents`
    /// are provided they must each hold `end - start` slots, filled per code
    /// unit of the range.
    #[allow(clippy::too_many_arguments)]
    fn measure(
        &self,
        text: &[u16],
        start: usize,
        end: usize,
        is_rtl: bool,
        paint: &Paint,
        edit: u32,
        advances: Option<&mut [f32]>,
        extents: Option<&mut [Extent]>,
    ) -> f32;
}

/// Face-wide vertical metrics parsed with ttf-parser.
#[derive(Debug, Clone, Copy)]
pub struct FaceMetrics {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    hyphen_advance: u16,
}

impl FaceMetrics {
    pub fn parse(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let hyphen_advance = ['\u{2010}', '-']
            .iter()
            .find_map(|&ch| {
                face.glyph_index(ch)
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
            })
            .unwrap_or(face.units_per_em() / 3);
        Some(Self {
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
            hyphen_advance,
        })
    }

    /// The face extent at the given em size; ascent comes out negative.
    pub fn extent(&self, size: f32) -> Extent {
        let scale = size / self.units_per_em as f32;
        Extent {
            ascent: -(self.ascender as f32) * scale,
            descent: -(self.descender as f32) * scale,
            line_gap: self.line_gap as f32 * scale,
        }
    }
}

/// OpenType shaper over a single face.
pub struct FaceShaper {
    data: Vec<u8>,
    metrics: FaceMetrics,
}

impl FaceShaper {
    /// Parses the face eagerly so `measure` cannot fail later. Returns `None`
    /// if the data is not a usable font.
    pub fn new(data: Vec<u8>) -> Option<Self> {
        let metrics = FaceMetrics::parse(&data)?;
        Some(Self { data, metrics })
    }

    pub fn metrics(&self) -> &FaceMetrics {
        &self.metrics
    }
}

impl Shaper for FaceShaper {
    fn measure(
        &self,
        text: &[u16],
        start: usize,
        end: usize,
        is_rtl: bool,
        paint: &Paint,
        edit: u32,
        advances: Option<&mut [f32]>,
        extents: Option<&mut [Extent]>,
    ) -> f32 {
        let n = end - start;
        let Some(face) = rustybuzz::Face::from_slice(&self.data, 0) else {
            // The data was validated at construction.
            return 0.0;
        };

        let mut buffer = rustybuzz::UnicodeBuffer::new();
        let mut unit = 0usize;
        for r in char::decode_utf16(text[start..end].iter().copied()) {
            let ch = r.unwrap_or(char::REPLACEMENT_CHARACTER);
            buffer.add(ch, unit as u32);
            unit += ch.len_utf16();
        }
        if is_rtl {
            buffer.set_direction(rustybuzz::Direction::RightToLeft);
        }
        let output = rustybuzz::shape(&face, &[], buffer);

        let x_scale = paint.size * paint.scale_x / self.metrics.units_per_em as f32;
        let mut per_unit = vec![0.0f32; n];
        for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
            let cluster = info.cluster as usize;
            if cluster < n {
                per_unit[cluster] += pos.x_advance as f32 * x_scale;
            }
        }
        let mut total: f32 = per_unit.iter().sum();

        let hyphen = self.metrics.hyphen_advance as f32 * x_scale;
        match edit & HyphenEdit::MASK_END {
            HyphenEdit::INSERT_HYPHEN_AT_END
            | HyphenEdit::INSERT_ARMENIAN_HYPHEN_AT_END
            | HyphenEdit::INSERT_UCAS_HYPHEN_AT_END
            | HyphenEdit::INSERT_ZWJ_AND_HYPHEN_AT_END => total += hyphen,
            HyphenEdit::REPLACE_WITH_HYPHEN_AT_END => {
                if let Some(last) = per_unit.iter().rev().find(|advance| **advance > 0.0) {
                    total -= last;
                }
                total += hyphen;
            }
            _ => {}
        }
        if edit & HyphenEdit::MASK_START == HyphenEdit::INSERT_HYPHEN_AT_START {
            total += hyphen;
        }

        if let Some(advances) = advances {
            advances.copy_from_slice(&per_unit);
        }
        if let Some(extents) = extents {
            let extent = self.metrics.extent(paint.size);
            for slot in extents.iter_mut() {
                *slot = extent;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_font_data() {
        assert!(FaceShaper::new(vec![0, 1, 2, 3]).is_none());
        assert!(FaceMetrics::parse(&[]).is_none());
    }

    #[test]
    fn test_extent_extend_by() {
        let mut extent = Extent {
            ascent: -8.0,
            descent: 2.0,
            line_gap: 0.0,
        };
        extent.extend_by(&Extent {
            ascent: -10.0,
            descent: 1.0,
            line_gap: 3.0,
        });
        assert_eq!(extent.ascent, -10.0);
        assert_eq!(extent.descent, 2.0);
        assert_eq!(extent.line_gap, 3.0);
    }

    #[test]
    fn test_extent_reset() {
        let mut extent = Extent {
            ascent: -8.0,
            descent: 2.0,
            line_gap: 1.0,
        };
        extent.reset();
        assert_eq!(extent, Extent::default());
    }

    #[test]
    fn test_paint_defaults_scale() {
        let paint = Paint::new(12.0);
        assert_eq!(paint.scale_x, 1.0);
    }
}
