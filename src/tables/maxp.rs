//! The [maxp](https://learn.microsoft.com/en-us/typography/opentype/spec/maxp) table.

use crate::fields::{Encodable, Fields};
use crate::font::TopLevelTable;
use crate::types::{Tag, Version16Dot16};
use crate::validate::no_validation;

/// Version 1.0 maximum profile. All glyph maxima are derived during the
/// font-level fixup; the zone and component fields keep their defaults for
/// unhinted, composite-free fonts.
#[derive(Debug, Clone, PartialEq)]
pub struct Maxp {
    pub num_glyphs: u16,
    pub max_points: u16,
    pub max_contours: u16,
    pub max_zones: u16,
    pub max_size_of_instructions: u16,
    pub max_component_depth: u16,
}

impl Default for Maxp {
    fn default() -> Self {
        Maxp {
            num_glyphs: 0,
            max_points: 0,
            max_contours: 0,
            max_zones: 2,
            max_size_of_instructions: 0,
            max_component_depth: 1,
        }
    }
}

impl TopLevelTable for Maxp {
    const TAG: Tag = Tag::new(b"maxp");
}

impl Encodable for Maxp {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .version("version", |_| Version16Dot16::VERSION_1_0)
            .uint16("num_glyphs", |t: &Maxp| t.num_glyphs)
            .uint16("max_points", |t: &Maxp| t.max_points)
            .uint16("max_contours", |t: &Maxp| t.max_contours)
            .uint16("max_composite_points", |_| 0)
            .uint16("max_composite_contours", |_| 0)
            .uint16("max_zones", |t: &Maxp| t.max_zones)
            .uint16("max_twilight_points", |_| 0)
            .uint16("max_storage", |_| 0)
            .uint16("max_function_defs", |_| 0)
            .uint16("max_instruction_defs", |_| 0)
            .uint16("max_stack_elements", |_| 0)
            .uint16("max_size_of_instructions", |t: &Maxp| {
                t.max_size_of_instructions
            })
            .uint16("max_component_elements", |_| 0)
            .uint16("max_component_depth", |t: &Maxp| t.max_component_depth)
    }
}

no_validation!(Maxp);
