//! The [loca](https://learn.microsoft.com/en-us/typography/opentype/spec/loca) table.

use std::borrow::Cow;

use crate::fields::{Encodable, Fields};
use crate::font::TopLevelTable;
use crate::types::Tag;
use crate::validate::{Validate, ValidationCtx};

/// Whether offsets are stored halved in 16 bits, or raw in 32.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocaFormat {
    #[default]
    Short = 0,
    Long = 1,
}

/// Glyph offsets into the glyf table: one entry per glyph plus a final
/// end offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Loca {
    offsets: Vec<u32>,
    format: LocaFormat,
}

impl Loca {
    /// Build from raw byte offsets, picking the most compact format.
    pub fn new(offsets: Vec<u32>) -> Self {
        let format = if offsets.iter().any(|off| *off >= 0xFFFF * 2 || off % 2 != 0) {
            LocaFormat::Long
        } else {
            LocaFormat::Short
        };
        Loca { offsets, format }
    }

    pub fn format(&self) -> LocaFormat {
        self.format
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }
}

impl TopLevelTable for Loca {
    const TAG: Tag = Tag::new(b"loca");
}

impl Encodable for Loca {
    fn build_fields() -> Fields<Self> {
        // exactly one of these two arrays is ever populated
        Fields::new()
            .uint16_array("short_offsets", |t: &Loca| match t.format {
                LocaFormat::Short => {
                    Cow::from(t.offsets.iter().map(|off| (off >> 1) as u16).collect::<Vec<_>>())
                }
                LocaFormat::Long => Cow::from(&[] as &[u16]),
            })
            .uint32_array("long_offsets", |t: &Loca| match t.format {
                LocaFormat::Short => Cow::from(&[] as &[u32]),
                LocaFormat::Long => Cow::from(&t.offsets),
            })
    }
}

impl Validate for Loca {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if self.offsets.windows(2).any(|pair| pair[0] > pair[1]) {
            ctx.in_field("offsets", |ctx| ctx.report("offsets must not decrease"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::dump_table;

    #[test]
    fn short_offsets_are_halved() {
        let mut loca = Loca::new(vec![0, 12, 12, 40]);
        assert_eq!(loca.format(), LocaFormat::Short);
        let bytes = dump_table(&mut loca).unwrap();
        assert_eq!(bytes, [0, 0, 0, 6, 0, 6, 0, 20]);
    }

    #[test]
    fn large_offsets_go_long() {
        let mut loca = Loca::new(vec![0, 0x2_0000]);
        assert_eq!(loca.format(), LocaFormat::Long);
        let bytes = dump_table(&mut loca).unwrap();
        assert_eq!(bytes, [0, 0, 0, 0, 0, 2, 0, 0]);
    }

    #[test]
    fn odd_offsets_go_long() {
        assert_eq!(Loca::new(vec![0, 7]).format(), LocaFormat::Long);
    }

    #[test]
    fn decreasing_offsets_are_rejected() {
        let mut loca = Loca::new(vec![8, 4]);
        assert!(dump_table(&mut loca).is_err());
    }
}
