//! The [post](https://learn.microsoft.com/en-us/typography/opentype/spec/post) table.

use crate::fields::{Encodable, Fields};
use crate::font::TopLevelTable;
use crate::types::{Fixed, Tag, Version16Dot16};
use crate::validate::no_validation;

/// Version 3.0 PostScript table: metrics only, no glyph names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Post {
    pub italic_angle: Fixed,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub is_fixed_pitch: u32,
}

impl TopLevelTable for Post {
    const TAG: Tag = Tag::new(b"post");
}

impl Encodable for Post {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .version("version", |_| Version16Dot16::VERSION_3_0)
            .fixed("italic_angle", |t: &Post| t.italic_angle)
            .int16("underline_position", |t: &Post| t.underline_position)
            .int16("underline_thickness", |t: &Post| t.underline_thickness)
            .uint32("is_fixed_pitch", |t: &Post| t.is_fixed_pitch)
            .uint32("min_mem_type42", |_| 0)
            .uint32("max_mem_type42", |_| 0)
            .uint32("min_mem_type1", |_| 0)
            .uint32("max_mem_type1", |_| 0)
    }
}

no_validation!(Post);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::dump_table;

    #[test]
    fn smoke_test() {
        let mut post = Post {
            italic_angle: Fixed::from_f64(-11.5),
            underline_position: -100,
            underline_thickness: 50,
            is_fixed_pitch: 0,
        };
        let bytes = dump_table(&mut post).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(&bytes[..4], &0x0003_0000u32.to_be_bytes());
        assert_eq!(&bytes[4..8], &Fixed::from_f64(-11.5).to_be_bytes());
        assert_eq!(&bytes[8..10], &(-100i16).to_be_bytes());
    }
}
