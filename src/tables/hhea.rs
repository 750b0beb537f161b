//! The [hhea](https://learn.microsoft.com/en-us/typography/opentype/spec/hhea) table.

use crate::fields::{Encodable, Fields};
use crate::font::TopLevelTable;
use crate::types::Tag;
use crate::validate::no_validation;

/// The horizontal header.
///
/// `ascender`, `descender` and `line_gap` are caller-set; the remaining
/// aggregates are derived from glyph data and metrics during the font-level
/// fixup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hhea {
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub number_of_h_metrics: u16,
}

impl Hhea {
    pub fn new(ascender: i16, descender: i16, line_gap: i16) -> Self {
        Hhea {
            ascender,
            descender,
            line_gap,
            caret_slope_rise: 1,
            ..Default::default()
        }
    }
}

impl TopLevelTable for Hhea {
    const TAG: Tag = Tag::new(b"hhea");
}

impl Encodable for Hhea {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("major_version", |_| 1)
            .uint16("minor_version", |_| 0)
            .int16("ascender", |t: &Hhea| t.ascender)
            .int16("descender", |t: &Hhea| t.descender)
            .int16("line_gap", |t: &Hhea| t.line_gap)
            .uint16("advance_width_max", |t: &Hhea| t.advance_width_max)
            .int16("min_left_side_bearing", |t: &Hhea| t.min_left_side_bearing)
            .int16("min_right_side_bearing", |t: &Hhea| t.min_right_side_bearing)
            .int16("x_max_extent", |t: &Hhea| t.x_max_extent)
            .int16("caret_slope_rise", |t: &Hhea| t.caret_slope_rise)
            .int16("caret_slope_run", |t: &Hhea| t.caret_slope_run)
            .int16("caret_offset", |t: &Hhea| t.caret_offset)
            .int16("reserved1", |_| 0)
            .int16("reserved2", |_| 0)
            .int16("reserved3", |_| 0)
            .int16("reserved4", |_| 0)
            .int16("metric_data_format", |_| 0)
            .uint16("number_of_h_metrics", |t: &Hhea| t.number_of_h_metrics)
    }
}

no_validation!(Hhea);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::dump_table;

    #[test]
    fn smoke_test() {
        let mut hhea = Hhea::new(800, -200, 90);
        hhea.number_of_h_metrics = 3;
        let bytes = dump_table(&mut hhea).unwrap();
        assert_eq!(bytes.len(), 36);
        assert_eq!(&bytes[4..6], &800i16.to_be_bytes());
        assert_eq!(&bytes[6..8], &(-200i16).to_be_bytes());
        assert_eq!(&bytes[34..36], &[0, 3]);
    }
}
