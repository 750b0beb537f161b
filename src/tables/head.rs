//! The [head](https://learn.microsoft.com/en-us/typography/opentype/spec/head) table.

use crate::fields::{Encodable, Fields};
use crate::font::TopLevelTable;
use crate::types::{Fixed, LongDateTime, Tag};
use crate::validate::no_validation;

/// The font header.
///
/// The bounding box and `index_to_loc_format` are derived from the glyphs
/// during the font-level fixup; `checksum_adjustment` is patched in at the
/// very end of assembly and should be left at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Head {
    pub font_revision: Fixed,
    pub checksum_adjustment: u32,
    /// Bit 0: baseline at y=0; bit 1: left sidebearing point at x=0.
    pub flags: u16,
    pub units_per_em: u16,
    pub created: LongDateTime,
    pub modified: LongDateTime,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: u16,
    pub lowest_rec_ppem: u16,
    pub index_to_loc_format: i16,
}

const MAGIC_NUMBER: u32 = 0x5F0F_3CF5;

impl Default for Head {
    fn default() -> Self {
        Head {
            font_revision: Fixed::ZERO,
            checksum_adjustment: 0,
            flags: 0x2,
            units_per_em: 0,
            created: LongDateTime::default(),
            modified: LongDateTime::default(),
            x_min: 0,
            y_min: 0,
            x_max: 0,
            y_max: 0,
            mac_style: 0,
            lowest_rec_ppem: 0,
            index_to_loc_format: 0,
        }
    }
}

impl TopLevelTable for Head {
    const TAG: Tag = Tag::new(b"head");
}

impl Encodable for Head {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("major_version", |_| 1)
            .uint16("minor_version", |_| 0)
            .fixed("font_revision", |t: &Head| t.font_revision)
            .uint32("checksum_adjustment", |t: &Head| t.checksum_adjustment)
            .uint32("magic_number", |_| MAGIC_NUMBER)
            .uint16("flags", |t: &Head| t.flags)
            .uint16("units_per_em", |t: &Head| t.units_per_em)
            .datetime("created", |t: &Head| t.created)
            .datetime("modified", |t: &Head| t.modified)
            .int16("x_min", |t: &Head| t.x_min)
            .int16("y_min", |t: &Head| t.y_min)
            .int16("x_max", |t: &Head| t.x_max)
            .int16("y_max", |t: &Head| t.y_max)
            .uint16("mac_style", |t: &Head| t.mac_style)
            .uint16("lowest_rec_ppem", |t: &Head| t.lowest_rec_ppem)
            .int16("font_direction_hint", |_| 2)
            .int16("index_to_loc_format", |t: &Head| t.index_to_loc_format)
            .int16("glyph_data_format", |_| 0)
    }
}

no_validation!(Head);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{dump_table, offset_of, size_of};

    #[test]
    fn fixed_size_table() {
        let mut head = Head::default();
        let bytes = dump_table(&mut head).unwrap();
        assert_eq!(bytes.len(), 54);
        assert_eq!(bytes.len(), size_of(&head, 0));
    }

    #[test]
    fn magic_and_defaults() {
        let mut head = Head {
            units_per_em: 1000,
            ..Default::default()
        };
        let bytes = dump_table(&mut head).unwrap();
        assert_eq!(&bytes[12..16], &MAGIC_NUMBER.to_be_bytes());
        assert_eq!(&bytes[16..18], &[0, 2]); // flags
        assert_eq!(&bytes[18..20], &1000u16.to_be_bytes());
        assert_eq!(&bytes[50..52], &2i16.to_be_bytes()); // font direction hint
    }

    #[test]
    fn checksum_adjustment_sits_at_offset_8() {
        assert_eq!(offset_of(&Head::default(), "checksum_adjustment"), 8);
    }
}
