//! Shared plumbing for offset-addressed layout tables.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::fields::{Encodable, Fields, FontTable};
use crate::types::Tag;
use crate::validate::{no_validation, Validate, ValidationCtx};

/// Lays out variable-size subtables after a fixed-size header.
///
/// The offset array itself sits inside the header, so the first subtable
/// starts at `header_len + 2 * items.len()`; each later offset is the
/// previous one plus the size of the subtable before it.
pub(crate) fn subtable_offsets<'a>(
    header_len: usize,
    items: impl Iterator<Item = &'a dyn FontTable>,
) -> Vec<u16> {
    let items: Vec<_> = items.collect();
    let mut offset = header_len + 2 * items.len();
    let mut offsets = Vec::with_capacity(items.len());
    for item in items {
        offsets.push(offset as u16);
        offset += item.dyn_size();
    }
    offsets
}

/// A tag plus the offset to its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TagRecord {
    pub tag: Tag,
    pub offset: u16,
}

impl Encodable for TagRecord {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .tag("tag", |t: &TagRecord| t.tag)
            .uint16("offset", |t: &TagRecord| t.offset)
    }
}

no_validation!(TagRecord);

/// A tag-keyed list of subtables.
///
/// Records always serialize in tag order no matter how the list was
/// populated; offsets are measured from the start of this table, whose
/// header occupies `base` bytes before the count word.
#[derive(Debug, Clone, PartialEq)]
pub struct TagRecordList<T> {
    base: usize,
    items: BTreeMap<Tag, T>,
}

impl<T> TagRecordList<T> {
    pub(crate) fn new(base: usize) -> Self {
        TagRecordList {
            base,
            items: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, tag: Tag, item: T) -> Option<T> {
        self.items.insert(tag, item)
    }

    pub fn get(&self, tag: Tag) -> Option<&T> {
        self.items.get(&tag)
    }

    pub fn get_mut(&mut self, tag: Tag) -> Option<&mut T> {
        self.items.get_mut(&tag)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Tag, &T)> {
        self.items.iter()
    }
}

impl<T: FontTable> TagRecordList<T> {
    pub(crate) fn records(&self) -> Vec<TagRecord> {
        let mut offset = self.base + 2 + 6 * self.items.len();
        self.items
            .iter()
            .map(|(tag, item)| {
                let record = TagRecord {
                    tag: *tag,
                    offset: offset as u16,
                };
                offset += item.dyn_size();
                record
            })
            .collect()
    }

    /// The offset a payload under `tag` serializes at, if present.
    pub(crate) fn offset_of(&self, tag: Tag) -> Option<u16> {
        self.records()
            .into_iter()
            .find(|record| record.tag == tag)
            .map(|record| record.offset)
    }
}

impl<T: FontTable> Encodable for TagRecordList<T> {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("count", |t: &TagRecordList<T>| t.items.len() as u16)
            .record_array("records", |t: &TagRecordList<T>| Cow::Owned(t.records()))
            .dyn_array(
                "items",
                |t: &TagRecordList<T>| {
                    t.items.values().map(|item| item as &dyn FontTable).collect()
                },
                0,
            )
    }
}

impl<T: FontTable> Validate for TagRecordList<T> {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.check_count("records", self.items.len());
        ctx.in_field("items", |ctx| {
            for item in self.items.values() {
                item.dyn_validate(ctx);
            }
        });
    }
}

/// A sorted set of glyph ids a lookup subtable applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Coverage {
    Format1(CoverageFormat1),
    Format2(CoverageFormat2),
}

impl Coverage {
    /// Builds coverage over `glyphs`, choosing the range form when it is
    /// strictly smaller than listing every glyph.
    pub fn new(mut glyphs: Vec<u16>) -> Coverage {
        glyphs.sort_unstable();
        glyphs.dedup();
        let mut ranges: Vec<RangeRecord> = Vec::new();
        for (index, gid) in glyphs.iter().enumerate() {
            match ranges.last_mut() {
                Some(range) if range.end_glyph_id + 1 == *gid => range.end_glyph_id = *gid,
                _ => ranges.push(RangeRecord {
                    start_glyph_id: *gid,
                    end_glyph_id: *gid,
                    start_coverage_index: index as u16,
                }),
            }
        }
        // each range costs three words against one per listed glyph
        if 3 * ranges.len() < glyphs.len() {
            Coverage::Format2(CoverageFormat2 {
                range_records: ranges,
            })
        } else {
            Coverage::Format1(CoverageFormat1 { glyph_array: glyphs })
        }
    }

    pub(crate) fn as_dyn(&self) -> &dyn FontTable {
        match self {
            Coverage::Format1(table) => table,
            Coverage::Format2(table) => table,
        }
    }

    pub(crate) fn size(&self) -> usize {
        self.as_dyn().dyn_size()
    }

    /// The number of covered glyphs.
    pub fn len(&self) -> usize {
        match self {
            Coverage::Format1(table) => table.glyph_array.len(),
            Coverage::Format2(table) => table
                .range_records
                .iter()
                .map(|range| usize::from(range.end_glyph_id - range.start_glyph_id) + 1)
                .sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageFormat1 {
    pub glyph_array: Vec<u16>,
}

impl Encodable for CoverageFormat1 {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("coverage_format", |_| 1)
            .uint16("glyph_count", |t: &CoverageFormat1| t.glyph_array.len() as u16)
            .uint16_array("glyph_array", |t: &CoverageFormat1| {
                Cow::from(&t.glyph_array)
            })
    }
}

no_validation!(CoverageFormat1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeRecord {
    pub start_glyph_id: u16,
    pub end_glyph_id: u16,
    pub start_coverage_index: u16,
}

impl Encodable for RangeRecord {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("start_glyph_id", |t: &RangeRecord| t.start_glyph_id)
            .uint16("end_glyph_id", |t: &RangeRecord| t.end_glyph_id)
            .uint16("start_coverage_index", |t: &RangeRecord| {
                t.start_coverage_index
            })
    }
}

no_validation!(RangeRecord);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageFormat2 {
    pub range_records: Vec<RangeRecord>,
}

impl Encodable for CoverageFormat2 {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("coverage_format", |_| 2)
            .uint16("range_count", |t: &CoverageFormat2| {
                t.range_records.len() as u16
            })
            .record_array("range_records", |t: &CoverageFormat2| {
                Cow::from(&t.range_records)
            })
    }
}

no_validation!(CoverageFormat2);

/// Assigns glyph ids to classes; unlisted glyphs are class 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassDef {
    Format1(ClassDefFormat1),
    Format2(ClassDefFormat2),
}

impl ClassDef {
    pub(crate) fn as_dyn(&self) -> &dyn FontTable {
        match self {
            ClassDef::Format1(table) => table,
            ClassDef::Format2(table) => table,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDefFormat1 {
    pub start_glyph_id: u16,
    pub class_value_array: Vec<u16>,
}

impl Encodable for ClassDefFormat1 {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("class_format", |_| 1)
            .uint16("start_glyph_id", |t: &ClassDefFormat1| t.start_glyph_id)
            .uint16("glyph_count", |t: &ClassDefFormat1| {
                t.class_value_array.len() as u16
            })
            .uint16_array("class_value_array", |t: &ClassDefFormat1| {
                Cow::from(&t.class_value_array)
            })
    }
}

no_validation!(ClassDefFormat1);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassRangeRecord {
    pub start_glyph_id: u16,
    pub end_glyph_id: u16,
    pub class: u16,
}

impl Encodable for ClassRangeRecord {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("start_glyph_id", |t: &ClassRangeRecord| t.start_glyph_id)
            .uint16("end_glyph_id", |t: &ClassRangeRecord| t.end_glyph_id)
            .uint16("class", |t: &ClassRangeRecord| t.class)
    }
}

no_validation!(ClassRangeRecord);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassDefFormat2 {
    pub class_range_records: Vec<ClassRangeRecord>,
}

impl Encodable for ClassDefFormat2 {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("class_format", |_| 2)
            .uint16("class_range_count", |t: &ClassDefFormat2| {
                t.class_range_records.len() as u16
            })
            .record_array("class_range_records", |t: &ClassDefFormat2| {
                Cow::from(&t.class_range_records)
            })
    }
}

no_validation!(ClassDefFormat2);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fields::{dump_table, size_of};

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Blob(Vec<u8>);

    impl Encodable for Blob {
        fn build_fields() -> Fields<Self> {
            Fields::new().bytes("data", |t: &Blob| Cow::from(&t.0))
        }
    }

    no_validation!(Blob);

    #[test]
    fn offsets_start_past_the_offset_array() {
        let items: Vec<Box<dyn FontTable>> =
            vec![Box::new(Blob(vec![0; 6])), Box::new(Blob(vec![0; 3]))];
        let offsets = subtable_offsets(4, items.iter().map(|item| item.as_ref()));
        // header 4 + two offset words, then the 6-byte first item
        assert_eq!(offsets, [8, 14]);
        assert!(subtable_offsets(2, std::iter::empty()).is_empty());
    }

    #[test]
    fn records_serialize_in_tag_order() {
        let mut list = TagRecordList::new(0);
        list.insert(Tag::new(b"liga"), Blob(vec![1, 2]));
        list.insert(Tag::new(b"aalt"), Blob(vec![3]));
        let records = list.records();
        assert_eq!(records[0].tag, "aalt");
        assert_eq!(records[1].tag, "liga");
        // count word + two 6-byte records, then the 1-byte aalt payload
        assert_eq!(records[0].offset, 14);
        assert_eq!(records[1].offset, 15);

        let bytes = dump_table(&mut list).unwrap();
        assert_eq!(bytes.len(), size_of(&list, 0));
        assert_eq!(&bytes[0..2], &2u16.to_be_bytes());
        assert_eq!(&bytes[2..6], b"aalt");
        assert_eq!(&bytes[8..12], b"liga");
        assert_eq!(&bytes[14..], &[3, 1, 2]);
    }

    #[test]
    fn coverage_prefers_the_smaller_format() {
        // one long run: a single range beats listing 200 glyphs
        let run: Vec<u16> = (100..300).collect();
        match Coverage::new(run) {
            Coverage::Format2(table) => {
                assert_eq!(
                    table.range_records,
                    [RangeRecord {
                        start_glyph_id: 100,
                        end_glyph_id: 299,
                        start_coverage_index: 0
                    }]
                );
            }
            other => panic!("expected format 2, got {other:?}"),
        }
        // scattered glyphs: every range holds one glyph, format 1 is smaller
        let scattered = Coverage::new(vec![10, 20, 30]);
        assert!(matches!(scattered, Coverage::Format1(_)));
        assert_eq!(scattered.len(), 3);
    }

    #[test]
    fn coverage_indices_restart_per_range() {
        let coverage = Coverage::new((1..=10).chain(50..=59).chain(90..=99).collect());
        let Coverage::Format2(table) = coverage else {
            panic!("expected format 2");
        };
        assert_eq!(table.range_records[1].start_coverage_index, 10);
        assert_eq!(table.range_records[2].start_coverage_index, 20);
    }

    #[test]
    fn class_def_wire_layout() {
        let mut table = ClassDefFormat2 {
            class_range_records: vec![ClassRangeRecord {
                start_glyph_id: 4,
                end_glyph_id: 9,
                class: 1,
            }],
        };
        let bytes = dump_table(&mut table).unwrap();
        assert_eq!(bytes, [0, 2, 0, 1, 0, 4, 0, 9, 0, 1]);

        let mut table = ClassDefFormat1 {
            start_glyph_id: 4,
            class_value_array: vec![1, 1, 2],
        };
        let bytes = dump_table(&mut table).unwrap();
        assert_eq!(bytes, [0, 1, 0, 4, 0, 3, 0, 1, 0, 1, 0, 2]);
        assert_eq!(ClassDef::Format1(table).as_dyn().dyn_size(), 12);
    }

    #[test]
    fn a_nonzero_base_shifts_every_offset() {
        let mut list = TagRecordList::new(2);
        list.insert(Tag::new(b"dflt"), Blob(vec![9]));
        assert_eq!(list.offset_of(Tag::new(b"dflt")), Some(10));
        assert_eq!(list.offset_of(Tag::new(b"none")), None);
    }
}
