//! The cmap table: character code to glyph index mappings.

use std::borrow::Cow;
use std::fmt;

use crate::fields::{size_of, Encodable, Fields, FontTable};
use crate::font::TopLevelTable;
use crate::types::Tag;
use crate::util::SearchRange;
use crate::validate::{no_validation, Validate, ValidationCtx};

pub const UNICODE_PLATFORM: u16 = 0;
pub const WINDOWS_PLATFORM: u16 = 3;
pub const UNICODE_BMP_ENCODING: u16 = 3;
pub const WINDOWS_BMP_ENCODING: u16 = 1;

/// The leading format word shared by the 16-bit subtable formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubtableHeader {
    pub format: u16,
}

impl Encodable for SubtableHeader {
    fn build_fields() -> Fields<Self> {
        Fields::new().uint16("format", |t: &SubtableHeader| t.format)
    }
}

no_validation!(SubtableHeader);

/// A mapping that cannot be expressed in a cmap subtable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmapError {
    /// One character code mapped to two distinct glyph ids.
    Conflict { code: u32, gid1: u16, gid2: u16 },
    /// The code collides with the format's sentinel value.
    CodeOutOfRange { code: u32 },
    /// No mappings were supplied.
    MappingsEmpty,
}

impl fmt::Display for CmapError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CmapError::Conflict { code, gid1, gid2 } => write!(
                f,
                "cannot map U+{code:04X} to two different glyph ids: {gid1} and {gid2}"
            ),
            CmapError::CodeOutOfRange { code } => {
                write!(f, "character code U+{code:04X} is not encodable")
            }
            CmapError::MappingsEmpty => f.write_str("no character mappings supplied"),
        }
    }
}

impl std::error::Error for CmapError {}

fn check_mappings<C: Copy + Ord + Into<u32>>(
    mappings: &[(C, u16)],
) -> Result<Vec<(C, u16)>, CmapError> {
    let mut mappings = mappings.to_vec();
    mappings.sort();
    mappings.dedup();
    if let Some((code, gid1, gid2)) =
        mappings
            .iter()
            .zip(mappings.iter().skip(1))
            .find_map(|((c1, g1), (c2, g2))| {
                (c1 == c2 && g1 != g2).then(|| ((*c1).into(), *g1.min(g2), *g1.max(g2)))
            })
    {
        return Err(CmapError::Conflict { code, gid1, gid2 });
    }
    if mappings.is_empty() {
        return Err(CmapError::MappingsEmpty);
    }
    Ok(mappings)
}

/// Format 0: a byte-indexed array for legacy single-byte encodings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmapFormat0 {
    header: SubtableHeader,
    pub language: u16,
    pub glyph_id_array: [u8; 256],
}

impl CmapFormat0 {
    pub fn new() -> Self {
        CmapFormat0 {
            header: SubtableHeader { format: 0 },
            language: 0,
            glyph_id_array: [0; 256],
        }
    }
}

impl Default for CmapFormat0 {
    fn default() -> Self {
        Self::new()
    }
}

impl Encodable for CmapFormat0 {
    fn build_fields() -> Fields<Self> {
        Fields::inherit::<SubtableHeader>(|t: &CmapFormat0| &t.header)
            .uint16("length", |t: &CmapFormat0| size_of(t, 0) as u16)
            .uint16("language", |t: &CmapFormat0| t.language)
            .bytes("glyph_id_array", |t: &CmapFormat0| {
                Cow::from(&t.glyph_id_array[..])
            })
    }
}

no_validation!(CmapFormat0);

/// Format 4: segmented mapping of the Basic Multilingual Plane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmapFormat4 {
    header: SubtableHeader,
    pub language: u16,
    end_code: Vec<u16>,
    start_code: Vec<u16>,
    id_delta: Vec<i16>,
    id_range_offsets: Vec<u16>,
    glyph_id_array: Vec<i16>,
}

impl CmapFormat4 {
    /// Compress `mappings` of (character code, glyph id) into segments.
    ///
    /// Adjacent codes share a segment; a segment whose glyph ids also run
    /// consecutively is stored as a single delta, anything else spills per-code
    /// entries into the trailing glyph id array.
    pub fn from_mappings(mappings: &[(u16, u16)]) -> Result<CmapFormat4, CmapError> {
        let mappings = check_mappings(mappings)?;
        if let Some((code, _)) = mappings.iter().find(|(code, _)| *code == 0xFFFF) {
            return Err(CmapError::CodeOutOfRange { code: (*code).into() });
        }

        let mut segments: Vec<(u16, u16, Vec<u16>)> = Vec::new();
        for (code, gid) in mappings {
            match segments.last_mut() {
                Some((_, end, gids)) if *end + 1 == code => {
                    *end = code;
                    gids.push(gid);
                }
                _ => segments.push((code, code, vec![gid])),
            }
        }

        let seg_count = segments.len() + 1;
        let mut table = CmapFormat4 {
            header: SubtableHeader { format: 4 },
            ..Default::default()
        };
        for (seg_index, (start, end, gids)) in segments.into_iter().enumerate() {
            table.start_code.push(start);
            table.end_code.push(end);
            let sequential = gids.windows(2).all(|pair| pair[1] == pair[0] + 1);
            if sequential {
                let delta = (i32::from(gids[0]) - i32::from(start)).rem_euclid(0x1_0000);
                table.id_delta.push(delta as u16 as i16);
                table.id_range_offsets.push(0);
            } else {
                table.id_delta.push(0);
                table
                    .id_range_offsets
                    .push(2 * (seg_count - seg_index + table.glyph_id_array.len()) as u16);
                table.glyph_id_array.extend(
                    gids.iter()
                        .map(|gid| (i32::from(*gid) - i32::from(start)) as i16),
                );
            }
        }
        table.start_code.push(0xFFFF);
        table.end_code.push(0xFFFF);
        table.id_delta.push(1);
        table.id_range_offsets.push(0);
        Ok(table)
    }

    fn seg_count(&self) -> u16 {
        self.end_code.len() as u16
    }

    /// The mapped code range, sentinel excluded.
    pub fn code_range(&self) -> Option<(u32, u32)> {
        let real_segments = self.seg_count().checked_sub(1)? as usize;
        if real_segments == 0 {
            return None;
        }
        Some((
            self.start_code[0].into(),
            self.end_code[real_segments - 1].into(),
        ))
    }
}

impl Encodable for CmapFormat4 {
    fn build_fields() -> Fields<Self> {
        Fields::inherit::<SubtableHeader>(|t: &CmapFormat4| &t.header)
            .uint16("length", |t: &CmapFormat4| size_of(t, 0) as u16)
            .uint16("language", |t: &CmapFormat4| t.language)
            .uint16("seg_count_x2", |t: &CmapFormat4| t.seg_count() * 2)
            .uint16("search_range", |t: &CmapFormat4| {
                SearchRange::compute(t.seg_count() as usize, 2).search_range
            })
            .uint16("entry_selector", |t: &CmapFormat4| {
                SearchRange::compute(t.seg_count() as usize, 2).entry_selector
            })
            .uint16("range_shift", |t: &CmapFormat4| {
                SearchRange::compute(t.seg_count() as usize, 2).range_shift
            })
            .uint16_array("end_code", |t: &CmapFormat4| Cow::from(&t.end_code))
            .uint16("reserved_pad", |_| 0)
            .uint16_array("start_code", |t: &CmapFormat4| Cow::from(&t.start_code))
            .int16_array("id_delta", |t: &CmapFormat4| Cow::from(&t.id_delta))
            .uint16_array("id_range_offsets", |t: &CmapFormat4| {
                Cow::from(&t.id_range_offsets)
            })
            .int16_array("glyph_id_array", |t: &CmapFormat4| {
                Cow::from(&t.glyph_id_array)
            })
    }
}

impl Validate for CmapFormat4 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if self.end_code.len() != self.start_code.len()
            || self.end_code.len() != self.id_delta.len()
            || self.end_code.len() != self.id_range_offsets.len()
        {
            ctx.report("segment arrays disagree on segment count");
        }
        if self.end_code.last() != Some(&0xFFFF) {
            ctx.report("missing the terminal 0xFFFF segment");
        }
    }
}

/// Format 6: trimmed dense mapping of one contiguous code range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmapFormat6 {
    header: SubtableHeader,
    pub language: u16,
    pub first_code: u16,
    pub glyph_id_array: Vec<u16>,
}

impl CmapFormat6 {
    pub fn new(first_code: u16, glyph_ids: Vec<u16>) -> Self {
        CmapFormat6 {
            header: SubtableHeader { format: 6 },
            language: 0,
            first_code,
            glyph_id_array: glyph_ids,
        }
    }
}

impl Encodable for CmapFormat6 {
    fn build_fields() -> Fields<Self> {
        Fields::inherit::<SubtableHeader>(|t: &CmapFormat6| &t.header)
            .uint16("length", |t: &CmapFormat6| size_of(t, 0) as u16)
            .uint16("language", |t: &CmapFormat6| t.language)
            .uint16("first_code", |t: &CmapFormat6| t.first_code)
            .uint16("entry_count", |t: &CmapFormat6| t.glyph_id_array.len() as u16)
            .uint16_array("glyph_id_array", |t: &CmapFormat6| {
                Cow::from(&t.glyph_id_array)
            })
    }
}

impl Validate for CmapFormat6 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_field("glyph_id_array", |ctx| {
            ctx.check_count("entries", self.glyph_id_array.len())
        });
    }
}

/// One contiguous run of codes mapping to consecutive glyph ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequentialMapGroup {
    pub start_char_code: u32,
    pub end_char_code: u32,
    pub start_glyph_id: u32,
}

impl Encodable for SequentialMapGroup {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint32("start_char_code", |t: &SequentialMapGroup| t.start_char_code)
            .uint32("end_char_code", |t: &SequentialMapGroup| t.end_char_code)
            .uint32("start_glyph_id", |t: &SequentialMapGroup| t.start_glyph_id)
    }
}

no_validation!(SequentialMapGroup);

/// Format 12: segmented coverage of the full Unicode repertoire.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmapFormat12 {
    pub language: u32,
    groups: Vec<SequentialMapGroup>,
}

impl CmapFormat12 {
    pub fn from_mappings(mappings: &[(u32, u16)]) -> Result<CmapFormat12, CmapError> {
        let mappings = check_mappings(mappings)?;
        let mut groups: Vec<SequentialMapGroup> = Vec::new();
        for (code, gid) in mappings {
            match groups.last_mut() {
                Some(group)
                    if group.end_char_code + 1 == code
                        && group.start_glyph_id
                            + (code - group.start_char_code)
                            == u32::from(gid) =>
                {
                    group.end_char_code = code;
                }
                _ => groups.push(SequentialMapGroup {
                    start_char_code: code,
                    end_char_code: code,
                    start_glyph_id: gid.into(),
                }),
            }
        }
        Ok(CmapFormat12 { language: 0, groups })
    }

    pub fn groups(&self) -> &[SequentialMapGroup] {
        &self.groups
    }

    pub fn code_range(&self) -> Option<(u32, u32)> {
        let first = self.groups.first()?;
        let last = self.groups.last()?;
        Some((first.start_char_code, last.end_char_code))
    }
}

impl Encodable for CmapFormat12 {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("format", |_| 12)
            .uint16("reserved", |_| 0)
            .uint32("length", |t: &CmapFormat12| size_of(t, 0) as u32)
            .uint32("language", |t: &CmapFormat12| t.language)
            .uint32("num_groups", |t: &CmapFormat12| t.groups.len() as u32)
            .record_array("groups", |t: &CmapFormat12| Cow::from(&t.groups))
    }
}

no_validation!(CmapFormat12);

/// Any of the supported subtable formats.
#[derive(Debug, Clone, PartialEq)]
pub enum CmapSubtable {
    Format0(CmapFormat0),
    Format4(CmapFormat4),
    Format6(CmapFormat6),
    Format12(CmapFormat12),
}

impl CmapSubtable {
    fn as_dyn(&self) -> &dyn FontTable {
        match self {
            CmapSubtable::Format0(table) => table,
            CmapSubtable::Format4(table) => table,
            CmapSubtable::Format6(table) => table,
            CmapSubtable::Format12(table) => table,
        }
    }

    fn size(&self) -> usize {
        self.as_dyn().dyn_size()
    }

    fn code_range(&self) -> Option<(u32, u32)> {
        match self {
            CmapSubtable::Format0(table) => {
                let mapped: Vec<_> = table
                    .glyph_id_array
                    .iter()
                    .enumerate()
                    .filter(|(_, gid)| **gid != 0)
                    .map(|(code, _)| code as u32)
                    .collect();
                Some((*mapped.first()?, *mapped.last()?))
            }
            CmapSubtable::Format4(table) => table.code_range(),
            CmapSubtable::Format6(table) => {
                let len = table.glyph_id_array.len() as u32;
                (len > 0).then(|| {
                    let first = u32::from(table.first_code);
                    (first, first + len - 1)
                })
            }
            CmapSubtable::Format12(table) => table.code_range(),
        }
    }
}

impl From<CmapFormat4> for CmapSubtable {
    fn from(src: CmapFormat4) -> Self {
        CmapSubtable::Format4(src)
    }
}

impl From<CmapFormat12> for CmapSubtable {
    fn from(src: CmapFormat12) -> Self {
        CmapSubtable::Format12(src)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecordSpec {
    platform_id: u16,
    encoding_id: u16,
    subtable: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct EncodingRecord {
    platform_id: u16,
    encoding_id: u16,
    subtable_offset: u32,
}

impl Encodable for EncodingRecord {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("platform_id", |t: &EncodingRecord| t.platform_id)
            .uint16("encoding_id", |t: &EncodingRecord| t.encoding_id)
            .uint32("subtable_offset", |t: &EncodingRecord| t.subtable_offset)
    }
}

no_validation!(EncodingRecord);

/// The top-level cmap table.
///
/// Encoding records may share a subtable; the subtable is written once and
/// every record pointing at it gets the same offset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cmap {
    records: Vec<RecordSpec>,
    subtables: Vec<CmapSubtable>,
}

impl TopLevelTable for Cmap {
    const TAG: Tag = Tag::new(b"cmap");
}

impl Cmap {
    /// A cmap expected to work in most modern environments: one format 4
    /// subtable shared by the Unicode and Windows BMP encoding records.
    pub fn from_mappings(mappings: &[(u16, u16)]) -> Result<Cmap, CmapError> {
        let bmp = CmapFormat4::from_mappings(mappings)?;
        let mut cmap = Cmap::default();
        let index = cmap.add_subtable(UNICODE_PLATFORM, UNICODE_BMP_ENCODING, bmp.into());
        cmap.add_record(WINDOWS_PLATFORM, WINDOWS_BMP_ENCODING, index);
        Ok(cmap)
    }

    /// Adds a subtable with its encoding record, returning the subtable's
    /// index for use with [`add_record`](Self::add_record).
    pub fn add_subtable(
        &mut self,
        platform_id: u16,
        encoding_id: u16,
        subtable: CmapSubtable,
    ) -> usize {
        let index = self.subtables.len();
        self.subtables.push(subtable);
        self.add_record(platform_id, encoding_id, index);
        index
    }

    /// Points an additional encoding record at an existing subtable.
    pub fn add_record(&mut self, platform_id: u16, encoding_id: u16, subtable: usize) {
        debug_assert!(subtable < self.subtables.len());
        self.records.push(RecordSpec {
            platform_id,
            encoding_id,
            subtable,
        });
    }

    /// The span of mapped character codes across all subtables.
    pub fn code_range(&self) -> Option<(u32, u32)> {
        self.subtables
            .iter()
            .filter_map(CmapSubtable::code_range)
            .reduce(|(lo1, hi1), (lo2, hi2)| (lo1.min(lo2), hi1.max(hi2)))
    }

    fn encoding_records(&self) -> Vec<EncodingRecord> {
        let base = 4 + 8 * self.records.len() as u32;
        let mut starts = Vec::with_capacity(self.subtables.len());
        let mut offset = base;
        for subtable in &self.subtables {
            starts.push(offset);
            offset += subtable.size() as u32;
        }
        self.records
            .iter()
            .map(|record| EncodingRecord {
                platform_id: record.platform_id,
                encoding_id: record.encoding_id,
                subtable_offset: starts[record.subtable],
            })
            .collect()
    }
}

impl Encodable for Cmap {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("version", |_| 0)
            .uint16("num_tables", |t: &Cmap| t.records.len() as u16)
            .record_array("encoding_records", |t: &Cmap| {
                Cow::Owned(t.encoding_records())
            })
            .dyn_array(
                "subtables",
                |t: &Cmap| t.subtables.iter().map(CmapSubtable::as_dyn).collect(),
                0,
            )
    }
}

impl Validate for Cmap {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if self.records.is_empty() {
            ctx.report("cmap has no encoding records");
        }
        ctx.in_field("subtables", |ctx| {
            for subtable in &self.subtables {
                subtable.as_dyn().dyn_validate(ctx);
            }
        });
    }
}
