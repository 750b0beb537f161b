//! The [glyf](https://learn.microsoft.com/en-us/typography/opentype/spec/glyf) table.

mod simple;

pub use simple::{Contour, CurvePoint, MalformedPath, SimpleGlyph, SimpleGlyphFlags};

use crate::fields::{align_len, size_of, Encodable, Fields, FontTable};
use crate::font::TopLevelTable;
use crate::types::Tag;
use crate::validate::{Validate, ValidationCtx};

/// A glyph bounding box, in font units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Bbox {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl Bbox {
    pub fn union(self, other: Bbox) -> Bbox {
        Bbox {
            x_min: self.x_min.min(other.x_min),
            y_min: self.y_min.min(other.y_min),
            x_max: self.x_max.max(other.x_max),
            y_max: self.y_max.max(other.y_max),
        }
    }
}

/// The glyph data table: glyph descriptions in glyph-id order, each padded
/// to a two-byte boundary so that short loca offsets stay even.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyf {
    pub glyphs: Vec<SimpleGlyph>,
}

impl Glyf {
    pub fn new() -> Self {
        Glyf::default()
    }

    pub fn push(&mut self, glyph: SimpleGlyph) {
        self.glyphs.push(glyph);
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Byte offsets of each glyph plus the final end offset, as loca wants
    /// them.
    pub fn offsets(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.glyphs.len() + 1);
        let mut pos = 0u32;
        out.push(pos);
        for glyph in &self.glyphs {
            pos += align_len(size_of(glyph, 0), 2) as u32;
            out.push(pos);
        }
        out
    }

    /// Union of the bounding boxes of all non-empty glyphs.
    pub fn bbox(&self) -> Option<Bbox> {
        self.glyphs
            .iter()
            .filter(|glyph| glyph.contour_count() != 0)
            .map(SimpleGlyph::bbox)
            .reduce(Bbox::union)
    }
}

impl TopLevelTable for Glyf {
    const TAG: Tag = Tag::new(b"glyf");
}

impl Encodable for Glyf {
    fn build_fields() -> Fields<Self> {
        Fields::new().dyn_array(
            "glyphs",
            |t: &Glyf| {
                t.glyphs
                    .iter()
                    .map(|glyph| glyph as &dyn FontTable)
                    .collect()
            },
            2,
        )
    }
}

impl Validate for Glyf {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.check_count("glyphs", self.glyphs.len());
        ctx.in_field("glyphs", |ctx| {
            for glyph in &self.glyphs {
                glyph.validate_impl(ctx);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(shift: i16) -> SimpleGlyph {
        let points = vec![
            CurvePoint::new(shift, 0, true),
            CurvePoint::new(shift, 10, true),
            CurvePoint::new(shift + 10, 10, true),
            CurvePoint::new(shift + 10, 0, true),
        ];
        SimpleGlyph::new(vec![Contour::from(points)], Vec::new())
    }

    #[test]
    fn offsets_are_2_aligned_prefix_sums() {
        let mut glyf = Glyf::new();
        glyf.push(square(0));
        glyf.push(square(100));
        let offsets = glyf.offsets();
        assert_eq!(offsets.len(), 3);
        assert_eq!(offsets[0], 0);
        assert!(offsets.iter().all(|off| off % 2 == 0));
        assert_eq!(offsets[2] - offsets[1], offsets[1] - offsets[0]);
    }

    #[test]
    fn bbox_union() {
        let mut glyf = Glyf::new();
        assert_eq!(glyf.bbox(), None);
        glyf.push(square(0));
        glyf.push(square(100));
        assert_eq!(
            glyf.bbox(),
            Some(Bbox {
                x_min: 0,
                y_min: 0,
                x_max: 110,
                y_max: 10
            })
        );
    }

    #[test]
    fn empty_glyphs_do_not_pollute_the_bbox() {
        let mut glyf = Glyf::new();
        glyf.push(SimpleGlyph::new(Vec::new(), Vec::new()));
        glyf.push(square(50));
        assert_eq!(glyf.bbox().unwrap().x_min, 50);
    }
}
