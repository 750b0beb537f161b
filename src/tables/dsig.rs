//! The [DSIG](https://learn.microsoft.com/en-us/typography/opentype/spec/dsig) table.

use std::borrow::Cow;

use crate::fields::{size_of, Encodable, Fields, FontTable};
use crate::font::TopLevelTable;
use crate::types::Tag;
use crate::validate::{no_validation, Validate, ValidationCtx};

/// A digital signature table. The empty default is the usual placeholder
/// emitted to mark a font as unsigned-but-DSIG-aware.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dsig {
    pub flags: u16,
    pub signatures: Vec<SignatureBlock>,
}

/// A format 1 signature block (a PKCS#7 packet).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureBlock {
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
struct SignatureRecord {
    length: u32,
    offset: u32,
}

impl Dsig {
    fn records(&self) -> Vec<SignatureRecord> {
        let mut offset = (8 + 12 * self.signatures.len()) as u32;
        self.signatures
            .iter()
            .map(|block| {
                let length = size_of(block, 0) as u32;
                let record = SignatureRecord { length, offset };
                offset += length;
                record
            })
            .collect()
    }
}

impl TopLevelTable for Dsig {
    const TAG: Tag = Tag::new(b"DSIG");
}

impl Encodable for SignatureRecord {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint32("format", |_| 1)
            .uint32("length", |t: &SignatureRecord| t.length)
            .uint32("offset", |t: &SignatureRecord| t.offset)
    }
}

impl Encodable for SignatureBlock {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("reserved1", |_| 0)
            .uint16("reserved2", |_| 0)
            .uint32("signature_length", |t: &SignatureBlock| {
                t.signature.len() as u32
            })
            .bytes("signature", |t: &SignatureBlock| Cow::from(&t.signature))
    }
}

impl Encodable for Dsig {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint32("version", |_| 1)
            .uint16("num_signatures", |t: &Dsig| t.signatures.len() as u16)
            .uint16("flags", |t: &Dsig| t.flags)
            .record_array("signature_records", |t: &Dsig| Cow::from(t.records()))
            .dyn_array(
                "signature_blocks",
                |t: &Dsig| {
                    t.signatures
                        .iter()
                        .map(|block| block as &dyn FontTable)
                        .collect()
                },
                0,
            )
    }
}

no_validation!(SignatureRecord, SignatureBlock);

impl Validate for Dsig {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.check_count("signatures", self.signatures.len());
    }
}
