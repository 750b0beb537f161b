//! The sfnt container: table directory and font assembly.

use std::borrow::Cow;

use indexmap::IndexMap;

use crate::codec::Buffer;
use crate::error::Error;
use crate::fields::{encode_value, Encodable, Fields, FontTable};
use crate::types::Tag;
use crate::util::{checksum, SearchRange};
use crate::validate::{no_validation, Validate, ValidationCtx};

/// The sfnt version for fonts with TrueType outlines.
pub const TT_SFNT_VERSION: u32 = 0x0001_0000;

const HEAD: Tag = Tag::new(b"head");
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// A table that sits at the root of a font, identified by a tag.
pub trait TopLevelTable {
    const TAG: Tag;
}

/// A record in the table directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

impl Encodable for TableRecord {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .tag("tag", |t: &TableRecord| t.tag)
            .uint32("checksum", |t: &TableRecord| t.checksum)
            .uint32("offset", |t: &TableRecord| t.offset)
            .uint32("length", |t: &TableRecord| t.length)
    }
}

/// The directory header: sfnt version, search assists and table records.
#[derive(Debug, Clone, Default)]
pub struct TableDirectory {
    pub sfnt_version: u32,
    pub records: Vec<TableRecord>,
}

impl TableDirectory {
    fn search_range(&self) -> SearchRange {
        SearchRange::compute(self.records.len(), 16)
    }
}

impl Encodable for TableDirectory {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint32("sfnt_version", |t: &TableDirectory| t.sfnt_version)
            .uint16("num_tables", |t: &TableDirectory| t.records.len() as u16)
            .uint16("search_range", |t: &TableDirectory| {
                t.search_range().search_range
            })
            .uint16("entry_selector", |t: &TableDirectory| {
                t.search_range().entry_selector
            })
            .uint16("range_shift", |t: &TableDirectory| {
                t.search_range().range_shift
            })
            .record_array("records", |t: &TableDirectory| Cow::from(&t.records))
    }
}

no_validation!(TableRecord);

impl Validate for TableDirectory {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.check_count("records", self.records.len());
    }
}

/// An in-progress font: a registration-ordered collection of tables.
///
/// Tables appear in the serialized font in the order they were registered;
/// re-registering a tag replaces the table without moving it.
#[derive(Default)]
pub struct Font {
    sfnt_version: u32,
    tables: IndexMap<Tag, Box<dyn FontTable>>,
}

impl Font {
    pub fn new() -> Self {
        Font {
            sfnt_version: TT_SFNT_VERSION,
            tables: IndexMap::new(),
        }
    }

    /// Register `table` under its own tag.
    pub fn insert<T: FontTable + TopLevelTable>(&mut self, table: T) {
        self.tables.insert(T::TAG, Box::new(table));
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    pub fn get<T: FontTable + TopLevelTable>(&self) -> Option<&T> {
        self.tables.get(&T::TAG)?.as_any().downcast_ref()
    }

    pub fn get_mut<T: FontTable + TopLevelTable>(&mut self) -> Option<&mut T> {
        self.tables.get_mut(&T::TAG)?.as_any_mut().downcast_mut()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Fixup, validate and serialize the whole font.
    pub fn build(&mut self) -> Result<Vec<u8>, Error> {
        for table in self.tables.values_mut() {
            table.dyn_fixup();
        }
        let mut ctx = ValidationCtx::new();
        for (tag, table) in &self.tables {
            ctx.in_table(*tag, |ctx| table.dyn_validate(ctx));
        }
        ctx.finish()?;

        // directory header plus one record per table
        let mut offset = (12 + self.tables.len() * 16) as u32;
        let mut records = Vec::with_capacity(self.tables.len());
        let mut bodies = Vec::with_capacity(self.tables.len());
        for (tag, table) in &self.tables {
            let mut body = Buffer::with_capacity(table.dyn_size());
            table.dyn_encode(&mut body)?;
            let body = body.into_inner();
            log::trace!("table '{tag}': {} bytes at offset {offset}", body.len());
            records.push(TableRecord {
                tag: *tag,
                checksum: checksum(&body),
                offset,
                length: body.len() as u32,
            });
            offset += round4(body.len()) as u32;
            bodies.push(body);
        }

        let directory = TableDirectory {
            sfnt_version: self.sfnt_version,
            records,
        };
        let mut out = Buffer::with_capacity(offset as usize);
        encode_value(&directory, &mut out)?;
        for body in &bodies {
            out.put_bytes(body);
            out.pad_to_align(4);
        }
        let mut bytes = out.into_inner();
        patch_checksum_adjustment(&mut bytes, &directory.records);
        Ok(bytes)
    }
}

/// Set head.checkSumAdjustment so the whole file sums to the magic value.
///
/// The head record's own checksum was computed while the field held zero,
/// which is what consumers expect.
fn patch_checksum_adjustment(bytes: &mut [u8], records: &[TableRecord]) {
    let Some(head) = records.iter().find(|record| record.tag == HEAD) else {
        return;
    };
    let adjustment = CHECKSUM_MAGIC.wrapping_sub(checksum(bytes));
    let pos = head.offset as usize + 8;
    bytes[pos..pos + 4].copy_from_slice(&adjustment.to_be_bytes());
}

fn round4(len: usize) -> usize {
    (len + 3) & !3
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fields::size_of;

    /// An opaque blob of test bytes.
    struct Blob(Vec<u8>);

    impl Encodable for Blob {
        fn build_fields() -> Fields<Self> {
            Fields::new().bytes("data", |t: &Blob| Cow::from(&t.0))
        }
    }

    no_validation!(Blob);

    struct Tagged<const N: u8>(Blob);

    impl<const N: u8> Encodable for Tagged<N> {
        fn build_fields() -> Fields<Self> {
            Fields::inherit::<Blob>(|t: &Tagged<N>| &t.0)
        }
    }

    impl<const N: u8> Validate for Tagged<N> {
        fn validate_impl(&self, _ctx: &mut ValidationCtx) {}
    }

    impl TopLevelTable for Tagged<0> {
        const TAG: Tag = Tag::new(b"aaaa");
    }

    impl TopLevelTable for Tagged<1> {
        const TAG: Tag = Tag::new(b"bbbb");
    }

    impl TopLevelTable for Tagged<2> {
        const TAG: Tag = Tag::new(b"cccc");
    }

    fn sample_font() -> Font {
        let mut font = Font::new();
        font.insert(Tagged::<0>(Blob(vec![1, 2, 3, 4, 5])));
        font.insert(Tagged::<1>(Blob(vec![0, 0, 0, 9])));
        font.insert(Tagged::<2>(Blob(vec![7; 2])));
        font
    }

    fn read_u32(bytes: &[u8], at: usize) -> u32 {
        u32::from_be_bytes(bytes[at..at + 4].try_into().unwrap())
    }

    fn read_u16(bytes: &[u8], at: usize) -> u16 {
        u16::from_be_bytes(bytes[at..at + 2].try_into().unwrap())
    }

    #[test]
    fn directory_layout() {
        let bytes = sample_font().build().unwrap();
        assert_eq!(read_u32(&bytes, 0), TT_SFNT_VERSION);
        assert_eq!(read_u16(&bytes, 4), 3);
        // 16 * 2^floor(log2(3)) etc.
        assert_eq!(read_u16(&bytes, 6), 32);
        assert_eq!(read_u16(&bytes, 8), 1);
        assert_eq!(read_u16(&bytes, 10), 16);
    }

    #[test]
    fn offsets_are_aligned_and_lengths_are_not() {
        let bytes = sample_font().build().unwrap();
        let first = (12 + 3 * 16) as u32;
        let mut expected_offset = first;
        for i in 0..3 {
            let base = 12 + i * 16;
            let offset = read_u32(&bytes, base + 8);
            let length = read_u32(&bytes, base + 12);
            assert_eq!(offset % 4, 0);
            assert_eq!(offset, expected_offset);
            expected_offset += (length + 3) & !3;
        }
        // lengths record the unpadded sizes
        assert_eq!(read_u32(&bytes, 12 + 12), 5);
        assert_eq!(read_u32(&bytes, 12 + 16 + 12), 4);
        assert_eq!(read_u32(&bytes, 12 + 32 + 12), 2);
        // padding between bodies is zero, total is padded out
        let first = first as usize;
        assert_eq!(&bytes[first + 5..first + 8], &[0, 0, 0]);
        assert_eq!(bytes.len(), first + 8 + 4 + 4);
    }

    #[test]
    fn record_checksums() {
        let bytes = sample_font().build().unwrap();
        assert_eq!(read_u32(&bytes, 12 + 4), checksum(&[1, 2, 3, 4, 5]));
        assert_eq!(read_u32(&bytes, 12 + 16 + 4), 9);
    }

    #[test]
    fn registration_order_is_preserved_and_reinsert_replaces() {
        let mut font = sample_font();
        // re-registering 'aaaa' must not move it
        font.insert(Tagged::<0>(Blob(vec![0xFF; 3])));
        let bytes = font.build().unwrap();
        assert_eq!(Tag::from_be_bytes(bytes[12..16].try_into().unwrap()), "aaaa");
        assert_eq!(read_u32(&bytes, 12 + 12), 3);
        assert_eq!(Tag::from_be_bytes(bytes[28..32].try_into().unwrap()), "bbbb");
    }

    #[test]
    fn empty_font_has_empty_directory() {
        let bytes = Font::new().build().unwrap();
        assert_eq!(bytes.len(), 12);
        assert_eq!(read_u16(&bytes, 4), 0);
        assert_eq!(read_u16(&bytes, 6), 0);
        assert_eq!(read_u16(&bytes, 8), 0);
        assert_eq!(read_u16(&bytes, 10), 0);
    }

    #[test]
    fn directory_encodes_its_own_size() {
        let directory = TableDirectory {
            sfnt_version: TT_SFNT_VERSION,
            records: vec![TableRecord {
                tag: Tag::new(b"glyf"),
                checksum: 0,
                offset: 28,
                length: 10,
            }],
        };
        let mut buf = Buffer::new();
        encode_value(&directory, &mut buf).unwrap();
        assert_eq!(buf.len(), size_of(&directory, 0));
        assert_eq!(buf.len(), 12 + 16);
    }

    #[test]
    fn typed_access() {
        let mut font = sample_font();
        assert!(font.get::<Tagged<0>>().is_some());
        font.get_mut::<Tagged<1>>().unwrap().0 .0.push(1);
        assert_eq!(font.get::<Tagged<1>>().unwrap().0 .0.len(), 5);
        assert!(font.contains(Tag::new(b"cccc")));
    }
}
