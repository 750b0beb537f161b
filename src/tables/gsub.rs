//! The GSUB table: glyph substitution lookups and the script/feature
//! lists that select them.

use std::borrow::Cow;

use bitflags::bitflags;

use super::layout::{subtable_offsets, Coverage, TagRecord, TagRecordList};
use crate::fields::{offset_of, size_of, Encodable, Fields, FontTable};
use crate::font::TopLevelTable;
use crate::types::{Tag, Version16Dot16};
use crate::validate::{no_validation, Validate, ValidationCtx};

const DEFAULT_LANG_SYS: Tag = Tag::new(b"dflt");

/// The GSUB header plus its three lists.
#[derive(Debug, Clone, PartialEq)]
pub struct Gsub {
    pub scripts: TagRecordList<Script>,
    pub features: FeatureList,
    pub lookups: LookupList,
}

impl TopLevelTable for Gsub {
    const TAG: Tag = Tag::new(b"GSUB");
}

impl Default for Gsub {
    fn default() -> Self {
        Gsub {
            scripts: TagRecordList::new(0),
            features: FeatureList::default(),
            lookups: LookupList::default(),
        }
    }
}

impl Gsub {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Encodable for Gsub {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .version("version", |_| Version16Dot16::VERSION_1_0)
            .offset16("script_list_offset", |t: &Gsub| offset_of(t, "script_list"))
            .offset16("feature_list_offset", |t: &Gsub| {
                offset_of(t, "feature_list")
            })
            .offset16("lookup_list_offset", |t: &Gsub| offset_of(t, "lookup_list"))
            .table("script_list", |t: &Gsub| &t.scripts)
            .table("feature_list", |t: &Gsub| &t.features)
            .table("lookup_list", |t: &Gsub| &t.lookups)
    }
}

impl Validate for Gsub {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_field("script_list", |ctx| self.scripts.validate_impl(ctx));
        ctx.in_field("feature_list", |ctx| self.features.validate_impl(ctx));
        ctx.in_field("lookup_list", |ctx| self.lookups.validate_impl(ctx));
    }
}

/// A script's language systems, keyed by language tag.
///
/// The `dflt` entry, when present, is also referenced by the default
/// language-system offset in the script header.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub lang_sys: TagRecordList<LangSys>,
}

impl Script {
    pub fn new() -> Self {
        // the default-lang-sys offset precedes the record count
        Script {
            lang_sys: TagRecordList::new(2),
        }
    }
}

impl Default for Script {
    fn default() -> Self {
        Self::new()
    }
}

impl Encodable for Script {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .offset16("default_lang_sys_offset", |t: &Script| {
                t.lang_sys
                    .offset_of(DEFAULT_LANG_SYS)
                    .map(usize::from)
                    .unwrap_or_default()
            })
            .table("lang_sys_list", |t: &Script| &t.lang_sys)
    }
}

impl Validate for Script {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        self.lang_sys.validate_impl(ctx);
    }
}

/// The feature indices active for one language system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LangSys {
    /// 0xFFFF when the language system has no required feature.
    pub required_feature_index: u16,
    pub feature_indices: Vec<u16>,
}

impl LangSys {
    pub fn new(feature_indices: Vec<u16>) -> Self {
        LangSys {
            required_feature_index: 0xFFFF,
            feature_indices,
        }
    }
}

impl Default for LangSys {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Encodable for LangSys {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("lookup_order_offset", |_| 0)
            .uint16("required_feature_index", |t: &LangSys| {
                t.required_feature_index
            })
            .uint16("feature_index_count", |t: &LangSys| {
                t.feature_indices.len() as u16
            })
            .uint16_array("feature_indices", |t: &LangSys| {
                Cow::from(&t.feature_indices)
            })
    }
}

impl Validate for LangSys {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_field("feature_indices", |ctx| {
            ctx.check_count("entries", self.feature_indices.len())
        });
    }
}

/// The lookups one feature activates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Feature {
    pub lookup_indices: Vec<u16>,
}

impl Feature {
    pub fn new(lookup_indices: Vec<u16>) -> Self {
        Feature { lookup_indices }
    }
}

impl Encodable for Feature {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("feature_params_offset", |_| 0)
            .uint16("lookup_index_count", |t: &Feature| {
                t.lookup_indices.len() as u16
            })
            .uint16_array("lookup_list_indices", |t: &Feature| {
                Cow::from(&t.lookup_indices)
            })
    }
}

no_validation!(Feature);

/// Features keyed by tag, serialized in tag order.
///
/// Feature indices used by [`LangSys`] refer to that serialized order, so
/// [`add`](Self::add) keeps entries sorted and returns the index the new
/// feature landed at. Adding tags out of order shifts the indices of
/// features sorting after the new tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureList {
    entries: Vec<(Tag, Feature)>,
}

impl FeatureList {
    pub fn add(&mut self, tag: Tag, feature: Feature) -> u16 {
        let index = self.entries.partition_point(|(existing, _)| *existing <= tag);
        self.entries.insert(index, (tag, feature));
        index as u16
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn records(&self) -> Vec<TagRecord> {
        let mut offset = 2 + 6 * self.entries.len();
        self.entries
            .iter()
            .map(|(tag, feature)| {
                let record = TagRecord {
                    tag: *tag,
                    offset: offset as u16,
                };
                offset += size_of(feature, 0);
                record
            })
            .collect()
    }
}

impl Encodable for FeatureList {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("feature_count", |t: &FeatureList| t.entries.len() as u16)
            .record_array("feature_records", |t: &FeatureList| Cow::Owned(t.records()))
            .dyn_array(
                "features",
                |t: &FeatureList| {
                    t.entries
                        .iter()
                        .map(|(_, feature)| feature as &dyn FontTable)
                        .collect()
                },
                0,
            )
    }
}

impl Validate for FeatureList {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.check_count("feature_records", self.entries.len());
    }
}

bitflags! {
    /// Lookup qualifiers.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct LookupFlag: u16 {
        const RIGHT_TO_LEFT = 0x0001;
        const IGNORE_BASE_GLYPHS = 0x0002;
        const IGNORE_LIGATURES = 0x0004;
        const IGNORE_MARKS = 0x0008;
        const USE_MARK_FILTERING_SET = 0x0010;
        const MARK_ATTACHMENT_TYPE_MASK = 0xFF00;
    }
}

/// The ordered lookup array; lookup indices are positions in it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupList {
    lookups: Vec<Lookup>,
}

impl LookupList {
    pub fn add(&mut self, lookup: Lookup) -> u16 {
        self.lookups.push(lookup);
        (self.lookups.len() - 1) as u16
    }

    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }
}

impl Encodable for LookupList {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("lookup_count", |t: &LookupList| t.lookups.len() as u16)
            .uint16_array("lookup_offsets", |t: &LookupList| {
                Cow::Owned(subtable_offsets(
                    2,
                    t.lookups.iter().map(|lookup| lookup as &dyn FontTable),
                ))
            })
            .dyn_array(
                "lookups",
                |t: &LookupList| {
                    t.lookups.iter().map(|lookup| lookup as &dyn FontTable).collect()
                },
                0,
            )
    }
}

impl Validate for LookupList {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        ctx.in_field("lookups", |ctx| {
            for lookup in &self.lookups {
                lookup.validate_impl(ctx);
            }
        });
    }
}

/// One lookup: a run of subtables sharing a substitution type.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub lookup_flag: LookupFlag,
    /// Only meaningful when `USE_MARK_FILTERING_SET` is set.
    pub mark_filtering_set: u16,
    subtables: Vec<GsubSubtable>,
}

impl Lookup {
    pub fn new(subtables: Vec<GsubSubtable>) -> Self {
        Lookup {
            lookup_flag: LookupFlag::empty(),
            mark_filtering_set: 0,
            subtables,
        }
    }

    fn lookup_type(&self) -> u16 {
        self.subtables
            .first()
            .map(GsubSubtable::lookup_type)
            .unwrap_or_default()
    }
}

impl Encodable for Lookup {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("lookup_type", |t: &Lookup| t.lookup_type())
            .uint16("lookup_flag", |t: &Lookup| t.lookup_flag.bits())
            .uint16("subtable_count", |t: &Lookup| t.subtables.len() as u16)
            .uint16_array("subtable_offsets", |t: &Lookup| {
                Cow::Owned(subtable_offsets(
                    8,
                    t.subtables.iter().map(GsubSubtable::as_dyn),
                ))
            })
            .uint16("mark_filtering_set", |t: &Lookup| t.mark_filtering_set)
            .dyn_array(
                "subtables",
                |t: &Lookup| t.subtables.iter().map(GsubSubtable::as_dyn).collect(),
                0,
            )
    }
}

impl Validate for Lookup {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if self.subtables.is_empty() {
            ctx.report("lookup has no subtables");
        }
        if self
            .subtables
            .iter()
            .any(|subtable| subtable.lookup_type() != self.lookup_type())
        {
            ctx.report("lookup mixes subtables of different substitution types");
        }
        ctx.in_field("subtables", |ctx| {
            for subtable in &self.subtables {
                subtable.as_dyn().dyn_validate(ctx);
            }
        });
    }
}

/// Any of the supported substitution subtable formats.
#[derive(Debug, Clone, PartialEq)]
pub enum GsubSubtable {
    SingleFormat1(SingleSubstFormat1),
    SingleFormat2(SingleSubstFormat2),
    Multiple(MultipleSubst),
    Alternate(AlternateSubst),
    Ligature(LigatureSubst),
}

impl GsubSubtable {
    fn lookup_type(&self) -> u16 {
        match self {
            GsubSubtable::SingleFormat1(_) | GsubSubtable::SingleFormat2(_) => 1,
            GsubSubtable::Multiple(_) => 2,
            GsubSubtable::Alternate(_) => 3,
            GsubSubtable::Ligature(_) => 4,
        }
    }

    fn as_dyn(&self) -> &dyn FontTable {
        match self {
            GsubSubtable::SingleFormat1(table) => table,
            GsubSubtable::SingleFormat2(table) => table,
            GsubSubtable::Multiple(table) => table,
            GsubSubtable::Alternate(table) => table,
            GsubSubtable::Ligature(table) => table,
        }
    }
}

/// Single substitution by a constant glyph-id delta.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleSubstFormat1 {
    pub coverage: Coverage,
    pub delta_glyph_id: i16,
}

impl Encodable for SingleSubstFormat1 {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("subst_format", |_| 1)
            .offset16("coverage_offset", |_| 6)
            .int16("delta_glyph_id", |t: &SingleSubstFormat1| t.delta_glyph_id)
            .table("coverage", |t: &SingleSubstFormat1| t.coverage.as_dyn())
    }
}

no_validation!(SingleSubstFormat1);

/// Single substitution with one replacement per covered glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleSubstFormat2 {
    pub coverage: Coverage,
    pub substitute_glyph_ids: Vec<u16>,
}

impl Encodable for SingleSubstFormat2 {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("subst_format", |_| 2)
            .offset16("coverage_offset", |t: &SingleSubstFormat2| {
                6 + 2 * t.substitute_glyph_ids.len()
            })
            .uint16("glyph_count", |t: &SingleSubstFormat2| {
                t.substitute_glyph_ids.len() as u16
            })
            .uint16_array("substitute_glyph_ids", |t: &SingleSubstFormat2| {
                Cow::from(&t.substitute_glyph_ids)
            })
            .table("coverage", |t: &SingleSubstFormat2| t.coverage.as_dyn())
    }
}

impl Validate for SingleSubstFormat2 {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if self.substitute_glyph_ids.len() != self.coverage.len() {
            ctx.report("substitute count disagrees with coverage glyph count");
        }
    }
}

/// The replacement glyphs for one covered glyph in a multiple substitution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    pub substitute_glyph_ids: Vec<u16>,
}

impl Encodable for Sequence {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("glyph_count", |t: &Sequence| {
                t.substitute_glyph_ids.len() as u16
            })
            .uint16_array("substitute_glyph_ids", |t: &Sequence| {
                Cow::from(&t.substitute_glyph_ids)
            })
    }
}

no_validation!(Sequence);

/// One-to-many substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct MultipleSubst {
    pub coverage: Coverage,
    pub sequences: Vec<Sequence>,
}

impl Encodable for MultipleSubst {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("subst_format", |_| 1)
            .offset16("coverage_offset", |t: &MultipleSubst| {
                6 + 2 * t.sequences.len()
            })
            .uint16("sequence_count", |t: &MultipleSubst| t.sequences.len() as u16)
            .uint16_array("sequence_offsets", |t: &MultipleSubst| {
                Cow::Owned(subtable_offsets(
                    6 + t.coverage.size(),
                    t.sequences.iter().map(|seq| seq as &dyn FontTable),
                ))
            })
            .table("coverage", |t: &MultipleSubst| t.coverage.as_dyn())
            .dyn_array(
                "sequences",
                |t: &MultipleSubst| {
                    t.sequences.iter().map(|seq| seq as &dyn FontTable).collect()
                },
                0,
            )
    }
}

impl Validate for MultipleSubst {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if self.sequences.len() != self.coverage.len() {
            ctx.report("sequence count disagrees with coverage glyph count");
        }
    }
}

/// The alternate glyphs for one covered glyph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlternateSet {
    pub alternate_glyph_ids: Vec<u16>,
}

impl Encodable for AlternateSet {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("glyph_count", |t: &AlternateSet| {
                t.alternate_glyph_ids.len() as u16
            })
            .uint16_array("alternate_glyph_ids", |t: &AlternateSet| {
                Cow::from(&t.alternate_glyph_ids)
            })
    }
}

no_validation!(AlternateSet);

/// One-from-many substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct AlternateSubst {
    pub coverage: Coverage,
    pub alternate_sets: Vec<AlternateSet>,
}

impl Encodable for AlternateSubst {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("subst_format", |_| 1)
            .offset16("coverage_offset", |t: &AlternateSubst| {
                6 + 2 * t.alternate_sets.len()
            })
            .uint16("alternate_set_count", |t: &AlternateSubst| {
                t.alternate_sets.len() as u16
            })
            .uint16_array("alternate_set_offsets", |t: &AlternateSubst| {
                Cow::Owned(subtable_offsets(
                    6 + t.coverage.size(),
                    t.alternate_sets.iter().map(|set| set as &dyn FontTable),
                ))
            })
            .table("coverage", |t: &AlternateSubst| t.coverage.as_dyn())
            .dyn_array(
                "alternate_sets",
                |t: &AlternateSubst| {
                    t.alternate_sets
                        .iter()
                        .map(|set| set as &dyn FontTable)
                        .collect()
                },
                0,
            )
    }
}

impl Validate for AlternateSubst {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if self.alternate_sets.len() != self.coverage.len() {
            ctx.report("alternate set count disagrees with coverage glyph count");
        }
    }
}

/// One ligature: the result glyph plus the components after the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ligature {
    pub ligature_glyph: u16,
    /// Components from the second onward; the first is implied by coverage.
    pub component_glyph_ids: Vec<u16>,
}

impl Encodable for Ligature {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("ligature_glyph", |t: &Ligature| t.ligature_glyph)
            .uint16("component_count", |t: &Ligature| {
                t.component_glyph_ids.len() as u16 + 1
            })
            .uint16_array("component_glyph_ids", |t: &Ligature| {
                Cow::from(&t.component_glyph_ids)
            })
    }
}

no_validation!(Ligature);

/// All ligatures starting with the same first component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LigatureSet {
    pub ligatures: Vec<Ligature>,
}

impl Encodable for LigatureSet {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("ligature_count", |t: &LigatureSet| t.ligatures.len() as u16)
            .uint16_array("ligature_offsets", |t: &LigatureSet| {
                Cow::Owned(subtable_offsets(
                    2,
                    t.ligatures.iter().map(|lig| lig as &dyn FontTable),
                ))
            })
            .dyn_array(
                "ligatures",
                |t: &LigatureSet| {
                    t.ligatures.iter().map(|lig| lig as &dyn FontTable).collect()
                },
                0,
            )
    }
}

no_validation!(LigatureSet);

/// Many-to-one substitution: ligature sets indexed by coverage order.
#[derive(Debug, Clone, PartialEq)]
pub struct LigatureSubst {
    pub coverage: Coverage,
    pub ligature_sets: Vec<LigatureSet>,
}

impl Encodable for LigatureSubst {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .uint16("subst_format", |_| 1)
            .offset16("coverage_offset", |t: &LigatureSubst| {
                6 + 2 * t.ligature_sets.len()
            })
            .uint16("ligature_set_count", |t: &LigatureSubst| {
                t.ligature_sets.len() as u16
            })
            .uint16_array("ligature_set_offsets", |t: &LigatureSubst| {
                Cow::Owned(subtable_offsets(
                    6 + t.coverage.size(),
                    t.ligature_sets.iter().map(|set| set as &dyn FontTable),
                ))
            })
            .table("coverage", |t: &LigatureSubst| t.coverage.as_dyn())
            .dyn_array(
                "ligature_sets",
                |t: &LigatureSubst| {
                    t.ligature_sets
                        .iter()
                        .map(|set| set as &dyn FontTable)
                        .collect()
                },
                0,
            )
    }
}

impl Validate for LigatureSubst {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if self.ligature_sets.len() != self.coverage.len() {
            ctx.report("ligature set count disagrees with coverage glyph count");
        }
    }
}
