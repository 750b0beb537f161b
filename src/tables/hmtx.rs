//! The [hmtx](https://learn.microsoft.com/en-us/typography/opentype/spec/hmtx) table.

use std::borrow::Cow;

use crate::fields::{Encodable, Fields};
use crate::font::TopLevelTable;
use crate::types::Tag;
use crate::validate::{Validate, ValidationCtx};

/// An advance width and a side bearing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LongMetric {
    pub advance: u16,
    pub side_bearing: i16,
}

/// The horizontal metrics: one [`LongMetric`] per glyph, in glyph order.
///
/// Trailing glyphs that all share the last advance may instead store a bare
/// side bearing; `hhea.numberOfHMetrics` records where the split is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hmtx {
    pub h_metrics: Vec<LongMetric>,
    pub left_side_bearings: Vec<i16>,
}

impl LongMetric {
    pub fn new(advance: u16, side_bearing: i16) -> Self {
        LongMetric {
            advance,
            side_bearing,
        }
    }
}

impl Hmtx {
    pub fn new(h_metrics: Vec<LongMetric>) -> Self {
        Hmtx {
            h_metrics,
            left_side_bearings: Vec::new(),
        }
    }

    /// Total number of glyphs covered.
    pub fn len(&self) -> usize {
        self.h_metrics.len() + self.left_side_bearings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.h_metrics.is_empty() && self.left_side_bearings.is_empty()
    }
}

impl TopLevelTable for Hmtx {
    const TAG: Tag = Tag::new(b"hmtx");
}

impl Encodable for LongMetric {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("advance", |t: &LongMetric| t.advance)
            .int16("side_bearing", |t: &LongMetric| t.side_bearing)
    }
}

impl Encodable for Hmtx {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .record_array("h_metrics", |t: &Hmtx| Cow::from(&t.h_metrics))
            .int16_array("left_side_bearings", |t: &Hmtx| {
                Cow::from(&t.left_side_bearings)
            })
    }
}

impl Validate for LongMetric {
    fn validate_impl(&self, _ctx: &mut ValidationCtx) {}
}

impl Validate for Hmtx {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.check_count("h_metrics", self.h_metrics.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::dump_table;

    #[test]
    fn metrics_then_bearings() {
        let mut hmtx = Hmtx {
            h_metrics: vec![
                LongMetric {
                    advance: 500,
                    side_bearing: 20,
                },
                LongMetric {
                    advance: 600,
                    side_bearing: -10,
                },
            ],
            left_side_bearings: vec![15],
        };
        let bytes = dump_table(&mut hmtx).unwrap();
        assert_eq!(
            bytes,
            [1, 244, 0, 20, 2, 88, 255, 246, 0, 15]
        );
        assert_eq!(hmtx.len(), 3);
    }
}
