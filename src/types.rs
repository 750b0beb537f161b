//! Scalar types with dedicated big-endian representations.

use std::fmt;

/// An OpenType tag: four bytes, each in the printable ascii range (0x20..=0x7e).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag([u8; 4]);

impl Tag {
    /// Construct a `Tag` from raw bytes.
    ///
    /// Panics if the input is not a valid tag; use [`Tag::new_checked`] for a
    /// fallible constructor.
    pub const fn new(src: &[u8; 4]) -> Tag {
        match Tag::new_checked(src) {
            Ok(tag) => tag,
            Err(_) => panic!("invalid tag bytes"),
        }
    }

    /// Attempt to create a `Tag` from raw bytes.
    ///
    /// The slice must be one to four bytes long, and all bytes must be in the
    /// printable ascii range. Shorter slices are padded with spaces, which is
    /// how tags like `b"CFF "` are normally spelled.
    pub const fn new_checked(src: &[u8]) -> Result<Tag, InvalidTag> {
        if src.is_empty() || src.len() > 4 {
            return Err(InvalidTag::InvalidLength(src.len()));
        }
        let mut raw = [0x20; 4];
        let mut i = 0;
        while i < src.len() {
            if src[i] < 0x20 || src[i] > 0x7e {
                return Err(InvalidTag::InvalidByte { pos: i, byte: src[i] });
            }
            raw[i] = src[i];
            i += 1;
        }
        Ok(Tag(raw))
    }

    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0
    }

    pub const fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Tag(bytes)
    }

    /// The tag as a string, with trailing spaces trimmed.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.0)
            .unwrap_or_default()
            .trim_end_matches(' ')
    }
}

/// A malformed [`Tag`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidTag {
    InvalidLength(usize),
    InvalidByte { pos: usize, byte: u8 },
}

impl fmt::Display for InvalidTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            InvalidTag::InvalidByte { pos, byte } => {
                write!(f, "invalid byte 0x{byte:02X} at index {pos}")
            }
            InvalidTag::InvalidLength(len) => write!(f, "invalid length ({len})"),
        }
    }
}

impl std::error::Error for InvalidTag {}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tag(\"{self}\")")
    }
}

impl PartialEq<&str> for Tag {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// A 16.16 signed fixed-point number.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed(i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(0x10000);

    /// Construct from the raw scaled integer representation.
    pub const fn from_bits(bits: i32) -> Fixed {
        Fixed(bits)
    }

    pub const fn to_bits(self) -> i32 {
        self.0
    }

    /// The nearest representable value, saturating at the type's bounds.
    pub fn from_f64(value: f64) -> Fixed {
        Fixed((value * 65536.0).round() as i32)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / 65536.0
    }

    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for Fixed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Fixed({})", self.to_f64())
    }
}

/// Seconds since 1904-01-01 00:00:00 UTC, as used by the `head` table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LongDateTime(i64);

impl LongDateTime {
    pub const fn new(secs: i64) -> Self {
        LongDateTime(secs)
    }

    pub const fn as_secs(self) -> i64 {
        self.0
    }

    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

/// A packed 16.16 version number, used by `maxp` and `post`.
///
/// Unlike [`Fixed`], minor versions are stored in the high nibble of the low
/// word, so version 0.5 is `0x00005000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version16Dot16(u32);

impl Version16Dot16 {
    pub const VERSION_1_0: Version16Dot16 = Version16Dot16::new(1, 0);
    pub const VERSION_2_0: Version16Dot16 = Version16Dot16::new(2, 0);
    pub const VERSION_3_0: Version16Dot16 = Version16Dot16::new(3, 0);

    /// `minor` must be in the range 0..=9.
    pub const fn new(major: u16, minor: u16) -> Self {
        Version16Dot16(((major as u32) << 16) | ((minor as u32) << 12))
    }

    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0.to_be_bytes()
    }
}
