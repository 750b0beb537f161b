//! Building binary font files.
//!
//! This crate assembles TrueType/OpenType fonts from scratch: tables are
//! plain Rust structs whose wire layout is described by a per-type field
//! registry, and a [`Font`] collects registered tables into a valid sfnt
//! binary with its directory, checksums, and padding.
//!
//! For the common case, [`TrueTypeFont`] pre-registers the tables every
//! TrueType font needs and derives the cross-table aggregates (bounding
//! boxes, metric maxima, loca offsets) for you:
//!
//! ```
//! use fontsmith::tables::glyf::SimpleGlyph;
//! use fontsmith::tables::hmtx::LongMetric;
//! use fontsmith::{FontInfo, TrueTypeFont};
//!
//! let mut font = TrueTypeFont::new(FontInfo {
//!     units_per_em: 1000,
//!     ascender: 800,
//!     descender: -200,
//!     family_name: "Example".into(),
//!     unique_id: "Example 1.0".into(),
//!     version: "Version 1.0".into(),
//!     ..Default::default()
//! });
//! font.add_glyph(SimpleGlyph::default(), LongMetric::new(600, 0));
//! let bytes = font.build().unwrap();
//! assert_eq!(&bytes[0..4], &0x0001_0000u32.to_be_bytes());
//! ```

#![deny(rustdoc::broken_intra_doc_links)]

mod codec;
mod error;
pub mod fields;
mod font;
pub mod tables;
mod truetype;
pub mod types;
pub mod util;
mod validate;

pub use codec::Buffer;
pub use error::{EncodeError, Error};
pub use fields::{dump_table, encode_value, fields_of, offset_of, size_of, Encodable, Fields, FontTable};
pub use font::{Font, TableDirectory, TableRecord, TopLevelTable, TT_SFNT_VERSION};
pub use truetype::{FontInfo, TrueTypeFont};
pub use types::{Fixed, LongDateTime, Tag, Version16Dot16};
pub use validate::{validate, Validate, ValidationCtx, ValidationError, ValidationReport};
