//! The name table: localized strings over a shared storage pool.

use std::borrow::Cow;

use crate::fields::{offset_of, Encodable, Fields};
use crate::font::TopLevelTable;
use crate::types::Tag;
use crate::validate::{no_validation, Validate, ValidationCtx};

pub const UNICODE_PLATFORM: u16 = 0;
pub const MACINTOSH_PLATFORM: u16 = 1;
pub const WINDOWS_PLATFORM: u16 = 3;

pub const MAC_ROMAN_ENCODING: u16 = 0;
pub const WINDOWS_UNICODE_BMP_ENCODING: u16 = 1;
pub const WINDOWS_ENGLISH_US: u16 = 0x0409;

/// Well-known name ids.
pub mod name_id {
    pub const COPYRIGHT: u16 = 0;
    pub const FAMILY: u16 = 1;
    pub const SUBFAMILY: u16 = 2;
    pub const UNIQUE_ID: u16 = 3;
    pub const FULL_NAME: u16 = 4;
    pub const VERSION: u16 = 5;
    pub const POSTSCRIPT_NAME: u16 = 6;
    pub const TYPOGRAPHIC_FAMILY: u16 = 16;
    pub const TYPOGRAPHIC_SUBFAMILY: u16 = 17;
}

/// One string to store, before layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameEntry {
    pub platform_id: u16,
    pub encoding_id: u16,
    pub language_id: u16,
    pub name_id: u16,
    pub string: String,
}

impl NameEntry {
    pub fn mac_roman(name_id: u16, string: impl Into<String>) -> Self {
        NameEntry {
            platform_id: MACINTOSH_PLATFORM,
            encoding_id: MAC_ROMAN_ENCODING,
            language_id: 0,
            name_id,
            string: string.into(),
        }
    }

    pub fn windows(name_id: u16, string: impl Into<String>) -> Self {
        NameEntry {
            platform_id: WINDOWS_PLATFORM,
            encoding_id: WINDOWS_UNICODE_BMP_ENCODING,
            language_id: WINDOWS_ENGLISH_US,
            name_id,
            string: string.into(),
        }
    }

    fn sort_key(&self) -> (u16, u16, u16, u16) {
        (
            self.platform_id,
            self.encoding_id,
            self.language_id,
            self.name_id,
        )
    }

    fn payload(&self) -> Vec<u8> {
        if self.platform_id == MACINTOSH_PLATFORM {
            self.string.bytes().collect()
        } else {
            self.string
                .encode_utf16()
                .flat_map(u16::to_be_bytes)
                .collect()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct NameRecord {
    platform_id: u16,
    encoding_id: u16,
    language_id: u16,
    name_id: u16,
    length: u16,
    string_offset: u16,
}

impl Encodable for NameRecord {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("platform_id", |t: &NameRecord| t.platform_id)
            .uint16("encoding_id", |t: &NameRecord| t.encoding_id)
            .uint16("language_id", |t: &NameRecord| t.language_id)
            .uint16("name_id", |t: &NameRecord| t.name_id)
            .uint16("length", |t: &NameRecord| t.length)
            .uint16("string_offset", |t: &NameRecord| t.string_offset)
    }
}

no_validation!(NameRecord);

/// Finds `payload` in `storage` stepping by `stride`, appending when absent.
fn find_or_append(storage: &mut Vec<u8>, payload: &[u8], stride: usize) -> usize {
    if payload.is_empty() {
        return 0;
    }
    let found = storage
        .windows(payload.len())
        .enumerate()
        .step_by(stride)
        .find(|(_, window)| *window == payload)
        .map(|(pos, _)| pos);
    match found {
        Some(pos) => pos,
        None => {
            let pos = storage.len();
            storage.extend_from_slice(payload);
            pos
        }
    }
}

/// Version 0 name table.
///
/// Construction lays out the storage pool: Macintosh strings first as raw
/// bytes, everything else after as UTF-16BE. Longer strings are pooled
/// first so shorter ones can reuse a substring of storage already written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Name {
    records: Vec<NameRecord>,
    storage: Vec<u8>,
}

impl TopLevelTable for Name {
    const TAG: Tag = Tag::new(b"name");
}

impl Name {
    pub fn new(mut entries: Vec<NameEntry>) -> Name {
        entries.sort_by_key(NameEntry::sort_key);
        let payloads: Vec<Vec<u8>> = entries.iter().map(NameEntry::payload).collect();

        let mut order: Vec<usize> = (0..entries.len()).collect();
        order.sort_by_key(|index| std::cmp::Reverse(payloads[*index].len()));

        let mut mac_pool = Vec::new();
        let mut wide_pool = Vec::new();
        let mut offsets = vec![0usize; entries.len()];
        for index in order {
            let entry = &entries[index];
            offsets[index] = if entry.platform_id == MACINTOSH_PLATFORM {
                find_or_append(&mut mac_pool, &payloads[index], 1)
            } else {
                find_or_append(&mut wide_pool, &payloads[index], 2)
            };
        }

        let records = entries
            .iter()
            .zip(&payloads)
            .zip(&offsets)
            .map(|((entry, payload), offset)| {
                let offset = if entry.platform_id == MACINTOSH_PLATFORM {
                    *offset
                } else {
                    mac_pool.len() + *offset
                };
                NameRecord {
                    platform_id: entry.platform_id,
                    encoding_id: entry.encoding_id,
                    language_id: entry.language_id,
                    name_id: entry.name_id,
                    length: payload.len() as u16,
                    string_offset: offset as u16,
                }
            })
            .collect();

        let mut storage = mac_pool;
        storage.extend_from_slice(&wide_pool);
        Name { records, storage }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Encodable for Name {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("version", |_| 0)
            .uint16("count", |t: &Name| t.records.len() as u16)
            .uint16("storage_offset", |t: &Name| offset_of(t, "storage") as u16)
            .record_array("name_records", |t: &Name| Cow::from(&t.records))
            .bytes("storage", |t: &Name| Cow::from(&t.storage))
    }
}

impl Validate for Name {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.check_count("name_records", self.records.len());
        let sorted = self.records.windows(2).all(|pair| {
            let key = |r: &NameRecord| (r.platform_id, r.encoding_id, r.language_id, r.name_id);
            key(&pair[0]) <= key(&pair[1])
        });
        if !sorted {
            ctx.report("name records out of sort order");
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fields::dump_table;

    #[test]
    fn records_sort_on_platform_then_ids() {
        let mut name = Name::new(vec![
            NameEntry::windows(name_id::FAMILY, "Test"),
            NameEntry::mac_roman(name_id::SUBFAMILY, "Regular"),
            NameEntry::mac_roman(name_id::FAMILY, "Test"),
        ]);
        let ids: Vec<_> = name
            .records
            .iter()
            .map(|r| (r.platform_id, r.name_id))
            .collect();
        assert_eq!(ids, [(1, 1), (1, 2), (3, 1)]);

        let bytes = dump_table(&mut name).unwrap();
        // storage starts right after the header and three 12-byte records
        assert_eq!(&bytes[4..6], &42u16.to_be_bytes());
        assert_eq!(bytes.len(), 42 + name.storage.len());
    }

    #[test]
    fn mac_strings_precede_utf16_storage() {
        let name = Name::new(vec![
            NameEntry::mac_roman(name_id::FAMILY, "Ab"),
            NameEntry::windows(name_id::FAMILY, "Ab"),
        ]);
        let mac = &name.records[0];
        let win = &name.records[1];
        assert_eq!((mac.string_offset, mac.length), (0, 2));
        assert_eq!((win.string_offset, win.length), (2, 4));
        assert_eq!(name.storage, [b'A', b'b', 0, b'A', 0, b'b']);
    }

    #[test]
    fn identical_strings_share_storage() {
        let name = Name::new(vec![
            NameEntry::windows(name_id::FAMILY, "Test"),
            NameEntry::windows(name_id::TYPOGRAPHIC_FAMILY, "Test"),
        ]);
        assert_eq!(
            name.records[0].string_offset,
            name.records[1].string_offset
        );
        assert_eq!(name.storage.len(), 8);
    }

    #[test]
    fn substrings_reuse_longer_strings() {
        let name = Name::new(vec![
            NameEntry::windows(name_id::FULL_NAME, "Test Regular"),
            NameEntry::windows(name_id::FAMILY, "Test"),
            NameEntry::windows(name_id::SUBFAMILY, "Regular"),
        ]);
        // "Test Regular" is pooled first; the others index into it
        assert_eq!(name.storage.len(), 24);
        let family = &name.records[0];
        let sub = &name.records[1];
        let full = &name.records[2];
        assert_eq!(family.string_offset, 0);
        assert_eq!(full.string_offset, 0);
        assert_eq!(sub.string_offset, 2 * 5);
        assert_eq!(sub.length, 14);
    }

    #[test]
    fn utf16_reuse_only_matches_aligned_positions() {
        // the second string's byte pattern appears at an odd offset only
        let name = Name::new(vec![
            NameEntry::windows(name_id::FAMILY, "\u{4142}\u{4142}"),
            NameEntry::windows(name_id::SUBFAMILY, "\u{4241}"),
        ]);
        // storage: 41 42 41 42 | 42 41 — no aligned match for 42 41
        assert_eq!(name.storage.len(), 6);
        assert_eq!(name.records[1].string_offset, 4);
    }
}
