//! The [OS/2](https://learn.microsoft.com/en-us/typography/opentype/spec/os2) table.

use std::borrow::Cow;

use crate::fields::{Encodable, Fields};
use crate::font::TopLevelTable;
use crate::types::Tag;
use crate::validate::no_validation;

/// Version 4 OS/2 and Windows metrics.
///
/// `x_avg_char_width`, the char index range and the typo/win metrics are
/// derived during the font-level fixup; everything else is caller-set.
#[derive(Debug, Clone, PartialEq)]
pub struct Os2 {
    pub x_avg_char_width: i16,
    pub us_weight_class: u16,
    pub us_width_class: u16,
    pub fs_type: u16,
    pub y_subscript_x_size: i16,
    pub y_subscript_y_size: i16,
    pub y_subscript_x_offset: i16,
    pub y_subscript_y_offset: i16,
    pub y_superscript_x_size: i16,
    pub y_superscript_y_size: i16,
    pub y_superscript_x_offset: i16,
    pub y_superscript_y_offset: i16,
    pub y_strikeout_size: i16,
    pub y_strikeout_position: i16,
    pub s_family_class: i16,
    pub panose: [u8; 10],
    pub ul_unicode_range_1: u32,
    pub ul_unicode_range_2: u32,
    pub ul_unicode_range_3: u32,
    pub ul_unicode_range_4: u32,
    pub ach_vend_id: Tag,
    pub fs_selection: u16,
    pub us_first_char_index: u16,
    pub us_last_char_index: u16,
    pub s_typo_ascender: i16,
    pub s_typo_descender: i16,
    pub s_typo_line_gap: i16,
    pub us_win_ascent: u16,
    pub us_win_descent: u16,
    pub ul_code_page_range_1: u32,
    pub ul_code_page_range_2: u32,
    pub sx_height: i16,
    pub s_cap_height: i16,
    pub us_default_char: u16,
    pub us_break_char: u16,
    pub us_max_context: u16,
}

impl Default for Os2 {
    fn default() -> Self {
        Os2 {
            x_avg_char_width: 0,
            us_weight_class: 400,
            us_width_class: 5,
            fs_type: 0,
            y_subscript_x_size: 0,
            y_subscript_y_size: 0,
            y_subscript_x_offset: 0,
            y_subscript_y_offset: 0,
            y_superscript_x_size: 0,
            y_superscript_y_size: 0,
            y_superscript_x_offset: 0,
            y_superscript_y_offset: 0,
            y_strikeout_size: 0,
            y_strikeout_position: 0,
            s_family_class: 0,
            panose: [0; 10],
            ul_unicode_range_1: 0,
            ul_unicode_range_2: 0,
            ul_unicode_range_3: 0,
            ul_unicode_range_4: 0,
            ach_vend_id: Tag::new(b"XXXX"),
            fs_selection: 0,
            us_first_char_index: 0,
            us_last_char_index: 0,
            s_typo_ascender: 0,
            s_typo_descender: 0,
            s_typo_line_gap: 0,
            us_win_ascent: 0,
            us_win_descent: 0,
            ul_code_page_range_1: 0,
            ul_code_page_range_2: 0,
            sx_height: 0,
            s_cap_height: 0,
            us_default_char: 0,
            us_break_char: 0x20,
            us_max_context: 0,
        }
    }
}

impl TopLevelTable for Os2 {
    const TAG: Tag = Tag::new(b"OS/2");
}

impl Encodable for Os2 {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("version", |_| 4)
            .int16("x_avg_char_width", |t: &Os2| t.x_avg_char_width)
            .uint16("us_weight_class", |t: &Os2| t.us_weight_class)
            .uint16("us_width_class", |t: &Os2| t.us_width_class)
            .uint16("fs_type", |t: &Os2| t.fs_type)
            .int16("y_subscript_x_size", |t: &Os2| t.y_subscript_x_size)
            .int16("y_subscript_y_size", |t: &Os2| t.y_subscript_y_size)
            .int16("y_subscript_x_offset", |t: &Os2| t.y_subscript_x_offset)
            .int16("y_subscript_y_offset", |t: &Os2| t.y_subscript_y_offset)
            .int16("y_superscript_x_size", |t: &Os2| t.y_superscript_x_size)
            .int16("y_superscript_y_size", |t: &Os2| t.y_superscript_y_size)
            .int16("y_superscript_x_offset", |t: &Os2| t.y_superscript_x_offset)
            .int16("y_superscript_y_offset", |t: &Os2| t.y_superscript_y_offset)
            .int16("y_strikeout_size", |t: &Os2| t.y_strikeout_size)
            .int16("y_strikeout_position", |t: &Os2| t.y_strikeout_position)
            .int16("s_family_class", |t: &Os2| t.s_family_class)
            .bytes("panose", |t: &Os2| Cow::from(&t.panose[..]))
            .uint32("ul_unicode_range_1", |t: &Os2| t.ul_unicode_range_1)
            .uint32("ul_unicode_range_2", |t: &Os2| t.ul_unicode_range_2)
            .uint32("ul_unicode_range_3", |t: &Os2| t.ul_unicode_range_3)
            .uint32("ul_unicode_range_4", |t: &Os2| t.ul_unicode_range_4)
            .tag("ach_vend_id", |t: &Os2| t.ach_vend_id)
            .uint16("fs_selection", |t: &Os2| t.fs_selection)
            .uint16("us_first_char_index", |t: &Os2| t.us_first_char_index)
            .uint16("us_last_char_index", |t: &Os2| t.us_last_char_index)
            .int16("s_typo_ascender", |t: &Os2| t.s_typo_ascender)
            .int16("s_typo_descender", |t: &Os2| t.s_typo_descender)
            .int16("s_typo_line_gap", |t: &Os2| t.s_typo_line_gap)
            .uint16("us_win_ascent", |t: &Os2| t.us_win_ascent)
            .uint16("us_win_descent", |t: &Os2| t.us_win_descent)
            .uint32("ul_code_page_range_1", |t: &Os2| t.ul_code_page_range_1)
            .uint32("ul_code_page_range_2", |t: &Os2| t.ul_code_page_range_2)
            .int16("sx_height", |t: &Os2| t.sx_height)
            .int16("s_cap_height", |t: &Os2| t.s_cap_height)
            .uint16("us_default_char", |t: &Os2| t.us_default_char)
            .uint16("us_break_char", |t: &Os2| t.us_break_char)
            .uint16("us_max_context", |t: &Os2| t.us_max_context)
    }
}

no_validation!(Os2);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{dump_table, offset_of};

    #[test]
    fn version_4_length() {
        let mut os2 = Os2::default();
        let bytes = dump_table(&mut os2).unwrap();
        assert_eq!(bytes.len(), 96);
        assert_eq!(&bytes[..2], &[0, 4]);
    }

    #[test]
    fn vendor_id_placement() {
        let os2 = Os2::default();
        assert_eq!(offset_of(&os2, "ach_vend_id"), 58);
        let mut os2 = os2;
        let bytes = dump_table(&mut os2).unwrap();
        assert_eq!(&bytes[58..62], b"XXXX");
    }
}
