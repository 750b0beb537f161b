//! A convenience builder for complete TrueType fonts.
//!
//! [`TrueTypeFont`] owns a [`Font`] pre-registered with the tables every
//! TrueType font carries and runs the font-level fixup that derives the
//! cross-table aggregates (bounding boxes, metric maxima, loca offsets)
//! before assembly.

use crate::error::Error;
use crate::font::{Font, TopLevelTable};
use crate::tables::cmap::Cmap;
use crate::tables::dsig::Dsig;
use crate::tables::glyf::{Glyf, SimpleGlyph};
use crate::tables::gsub::Gsub;
use crate::tables::head::Head;
use crate::tables::hhea::Hhea;
use crate::tables::hmtx::{Hmtx, LongMetric};
use crate::tables::loca::Loca;
use crate::tables::maxp::Maxp;
use crate::tables::name::{name_id, Name, NameEntry};
use crate::tables::os2::Os2;
use crate::tables::post::Post;
use crate::validate::ValidationCtx;

/// The identifying strings and core dimensions of a new font.
///
/// Optional fields fall back to conventional derivations: subfamily
/// "Regular", full name "Family Subfamily", PostScript name
/// "Family-Subfamily" with spaces replaced by underscores.
#[derive(Debug, Clone, Default)]
pub struct FontInfo {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub family_name: String,
    pub subfamily_name: Option<String>,
    pub unique_id: String,
    pub full_name: Option<String>,
    /// Conventionally of the form "Version 1.0".
    pub version: String,
    pub postscript_name: Option<String>,
    /// Additional name records beyond the standard thirteen.
    pub extra_names: Vec<NameEntry>,
}

impl FontInfo {
    fn name_table(&self) -> Name {
        let subfamily = self
            .subfamily_name
            .clone()
            .unwrap_or_else(|| "Regular".to_string());
        let full_name = self
            .full_name
            .clone()
            .unwrap_or_else(|| format!("{} {subfamily}", self.family_name));
        let postscript_name = self
            .postscript_name
            .clone()
            .unwrap_or_else(|| format!("{}-{subfamily}", self.family_name).replace(' ', "_"));

        let mut entries = vec![
            NameEntry::mac_roman(name_id::FAMILY, &self.family_name),
            NameEntry::mac_roman(name_id::SUBFAMILY, &subfamily),
            NameEntry::mac_roman(name_id::FULL_NAME, &full_name),
            NameEntry::mac_roman(name_id::VERSION, &self.version),
            NameEntry::mac_roman(name_id::POSTSCRIPT_NAME, &postscript_name),
            NameEntry::windows(name_id::FAMILY, &self.family_name),
            NameEntry::windows(name_id::SUBFAMILY, &subfamily),
            NameEntry::windows(name_id::UNIQUE_ID, &self.unique_id),
            NameEntry::windows(name_id::FULL_NAME, &full_name),
            NameEntry::windows(name_id::VERSION, &self.version),
            NameEntry::windows(name_id::POSTSCRIPT_NAME, &postscript_name),
            NameEntry::windows(name_id::TYPOGRAPHIC_FAMILY, &self.family_name),
            NameEntry::windows(name_id::TYPOGRAPHIC_SUBFAMILY, &subfamily),
        ];
        entries.extend(self.extra_names.iter().cloned());
        Name::new(entries)
    }
}

/// A TrueType font under construction.
pub struct TrueTypeFont {
    font: Font,
}

impl TrueTypeFont {
    pub fn new(info: FontInfo) -> TrueTypeFont {
        let mut font = Font::new();
        let head = Head {
            units_per_em: info.units_per_em,
            ..Default::default()
        };
        font.insert(head);
        font.insert(Hhea::new(info.ascender, info.descender, info.line_gap));
        font.insert(Hmtx::new(Vec::new()));
        font.insert(Os2::default());
        font.insert(info.name_table());
        font.insert(Maxp::default());
        font.insert(Loca::new(Vec::new()));
        font.insert(Glyf::new());
        font.insert(Post::default());
        font.insert(Dsig::default());
        TrueTypeFont { font }
    }

    /// Appends a glyph and its horizontal metrics, returning the new
    /// glyph's zero-based index.
    ///
    /// The glyph and metric lists stay index-aligned; [`build`](Self::build)
    /// refuses to assemble a font where their lengths have diverged.
    pub fn add_glyph(&mut self, glyph: SimpleGlyph, metrics: LongMetric) -> u16 {
        let glyf = self.glyf_mut();
        glyf.push(glyph);
        let index = glyf.len() - 1;
        self.hmtx_mut().h_metrics.push(metrics);
        index as u16
    }

    pub fn set_cmap(&mut self, cmap: Cmap) {
        self.font.insert(cmap);
    }

    pub fn set_gsub(&mut self, gsub: Gsub) {
        self.font.insert(gsub);
    }

    pub fn cmap(&self) -> Option<&Cmap> {
        self.font.get::<Cmap>()
    }

    pub fn head_mut(&mut self) -> &mut Head {
        self.font.get_mut().expect("head registered in new()")
    }

    pub fn hhea_mut(&mut self) -> &mut Hhea {
        self.font.get_mut().expect("hhea registered in new()")
    }

    pub fn hmtx_mut(&mut self) -> &mut Hmtx {
        self.font.get_mut().expect("hmtx registered in new()")
    }

    pub fn os2_mut(&mut self) -> &mut Os2 {
        self.font.get_mut().expect("OS/2 registered in new()")
    }

    pub fn post_mut(&mut self) -> &mut Post {
        self.font.get_mut().expect("post registered in new()")
    }

    pub fn dsig_mut(&mut self) -> &mut Dsig {
        self.font.get_mut().expect("DSIG registered in new()")
    }

    pub fn glyf(&self) -> &Glyf {
        self.font.get().expect("glyf registered in new()")
    }

    fn glyf_mut(&mut self) -> &mut Glyf {
        self.font.get_mut().expect("glyf registered in new()")
    }

    fn hmtx(&self) -> &Hmtx {
        self.font.get().expect("hmtx registered in new()")
    }

    /// Runs the font-level fixup, then assembles the sfnt binary.
    pub fn build(&mut self) -> Result<Vec<u8>, Error> {
        self.fixup()?;
        self.font.build()
    }

    /// Derives every cross-table aggregate from the populated content.
    fn fixup(&mut self) -> Result<(), Error> {
        struct GlyphFacts {
            x_min: i16,
            x_max: i16,
            points: usize,
            contours: usize,
            instructions: usize,
        }

        let glyf = self.glyf();
        let bbox = glyf.bbox().unwrap_or_default();
        let loca = Loca::new(glyf.offsets());
        let facts: Vec<GlyphFacts> = glyf
            .glyphs
            .iter()
            .map(|glyph| GlyphFacts {
                x_min: glyph.bbox().x_min,
                x_max: glyph.bbox().x_max,
                points: glyph.point_count(),
                contours: glyph.contour_count(),
                instructions: glyph.instructions().len(),
            })
            .collect();
        let metrics = self.hmtx().h_metrics.clone();

        if facts.len() != metrics.len() {
            let mut ctx = ValidationCtx::new();
            ctx.in_table(Glyf::TAG, |ctx| {
                ctx.report(format!(
                    "{} glyphs but {} hmtx metrics; the lists must stay index-aligned",
                    facts.len(),
                    metrics.len()
                ))
            });
            ctx.finish().map_err(Error::from)?;
        }

        let head = self.head_mut();
        head.x_min = bbox.x_min;
        head.y_min = bbox.y_min;
        head.x_max = bbox.x_max;
        head.y_max = bbox.y_max;
        head.index_to_loc_format = loca.format() as i16;

        let maxp = self.font.get_mut::<Maxp>().expect("maxp registered in new()");
        maxp.num_glyphs = facts.len() as u16;
        maxp.max_points = facts.iter().map(|g| g.points).max().unwrap_or(0) as u16;
        maxp.max_contours = facts.iter().map(|g| g.contours).max().unwrap_or(0) as u16;
        maxp.max_size_of_instructions =
            facts.iter().map(|g| g.instructions).max().unwrap_or(0) as u16;

        // side bearings only exist for glyphs with outlines
        let outlined = || {
            facts
                .iter()
                .zip(&metrics)
                .filter(|(glyph, _)| glyph.contours > 0)
        };
        let hhea = self.hhea_mut();
        hhea.number_of_h_metrics = metrics.len() as u16;
        hhea.advance_width_max = metrics.iter().map(|m| m.advance).max().unwrap_or(0);
        hhea.min_left_side_bearing = outlined()
            .map(|(_, m)| m.side_bearing)
            .min()
            .unwrap_or(0);
        hhea.min_right_side_bearing = outlined()
            .map(|(glyph, m)| {
                let width = i32::from(glyph.x_max) - i32::from(glyph.x_min);
                i32::from(m.advance) - i32::from(m.side_bearing) - width
            })
            .min()
            .unwrap_or(0) as i16;
        hhea.x_max_extent = outlined()
            .map(|(glyph, m)| {
                i32::from(m.side_bearing) + i32::from(glyph.x_max) - i32::from(glyph.x_min)
            })
            .max()
            .unwrap_or(0) as i16;
        let (ascender, descender, line_gap) = (hhea.ascender, hhea.descender, hhea.line_gap);

        let code_range = self.font.get::<Cmap>().and_then(Cmap::code_range);
        let nonzero: Vec<u16> = metrics
            .iter()
            .map(|m| m.advance)
            .filter(|advance| *advance != 0)
            .collect();
        let os2 = self.os2_mut();
        if !nonzero.is_empty() {
            let sum: u32 = nonzero.iter().copied().map(u32::from).sum();
            os2.x_avg_char_width = (sum / nonzero.len() as u32) as i16;
        }
        if let Some((first, last)) = code_range {
            os2.us_first_char_index = first.min(0xFFFF) as u16;
            os2.us_last_char_index = last.min(0xFFFF) as u16;
        }
        os2.s_typo_ascender = ascender;
        os2.s_typo_descender = descender;
        os2.s_typo_line_gap = line_gap;
        os2.us_win_ascent = ascender.max(0) as u16;
        os2.us_win_descent = descender.unsigned_abs();

        *self.font.get_mut::<Loca>().expect("loca registered in new()") = loca;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::tables::glyf::{Contour, CurvePoint};
    use crate::types::Tag;

    fn box_glyph(size: i16) -> SimpleGlyph {
        SimpleGlyph::new(
            vec![Contour::from(vec![
                CurvePoint::on_curve(0, 0),
                CurvePoint::on_curve(0, size),
                CurvePoint::on_curve(size, size),
                CurvePoint::on_curve(size, 0),
            ])],
            Vec::new(),
        )
    }

    fn test_font() -> TrueTypeFont {
        TrueTypeFont::new(FontInfo {
            units_per_em: 1000,
            ascender: 800,
            descender: -200,
            line_gap: 90,
            family_name: "Boxes".into(),
            unique_id: "Boxes 1.0 test".into(),
            version: "Version 1.0".into(),
            ..Default::default()
        })
    }

    #[test]
    fn adds_glyphs_with_aligned_metrics() {
        let mut font = test_font();
        let notdef = font.add_glyph(SimpleGlyph::default(), LongMetric::new(600, 0));
        let square = font.add_glyph(box_glyph(700), LongMetric::new(800, 50));
        assert_eq!((notdef, square), (0, 1));
        assert_eq!(font.glyf().len(), 2);
    }

    #[test]
    fn fixup_derives_the_aggregates() {
        let mut font = test_font();
        font.add_glyph(SimpleGlyph::default(), LongMetric::new(600, 0));
        font.add_glyph(box_glyph(700), LongMetric::new(800, 50));
        font.add_glyph(box_glyph(300), LongMetric::new(400, 20));
        font.set_cmap(Cmap::from_mappings(&[(65, 1), (66, 2)]).unwrap());
        font.fixup().unwrap();

        let head = font.head_mut();
        assert_eq!(
            (head.x_min, head.y_min, head.x_max, head.y_max),
            (0, 0, 700, 700)
        );
        assert_eq!(head.index_to_loc_format, 0);

        let maxp = font.font.get::<Maxp>().unwrap();
        assert_eq!(maxp.num_glyphs, 3);
        assert_eq!(maxp.max_points, 4);
        assert_eq!(maxp.max_contours, 1);

        let hhea = font.hhea_mut();
        assert_eq!(hhea.number_of_h_metrics, 3);
        assert_eq!(hhea.advance_width_max, 800);
        assert_eq!(hhea.min_left_side_bearing, 20);
        // 800 - 50 - 700 = 50, 400 - 20 - 300 = 80
        assert_eq!(hhea.min_right_side_bearing, 50);
        assert_eq!(hhea.x_max_extent, 750);

        let os2 = font.os2_mut();
        assert_eq!(os2.x_avg_char_width, 600);
        assert_eq!((os2.us_first_char_index, os2.us_last_char_index), (65, 66));
        assert_eq!(os2.s_typo_ascender, 800);
        assert_eq!(os2.s_typo_descender, -200);
        assert_eq!(os2.s_typo_line_gap, 90);
        assert_eq!((os2.us_win_ascent, os2.us_win_descent), (800, 200));
    }

    #[test]
    fn mismatched_metrics_abort_the_build() {
        let mut font = test_font();
        font.glyf_mut().push(SimpleGlyph::default());
        let err = font.build().unwrap_err();
        assert!(err.to_string().contains("index-aligned"), "{err}");
    }

    #[test]
    fn builds_a_complete_font() {
        let mut font = test_font();
        font.add_glyph(SimpleGlyph::default(), LongMetric::new(600, 0));
        font.add_glyph(box_glyph(700), LongMetric::new(800, 50));
        let bytes = font.build().unwrap();
        assert_eq!(&bytes[0..4], &0x0001_0000u32.to_be_bytes());
        // records follow registration order: head first, DSIG last
        assert_eq!(&bytes[4..6], &10u16.to_be_bytes());
        assert_eq!(&bytes[12..16], b"head");
        assert_eq!(&bytes[12 + 16..16 + 16], b"hhea");
        assert_eq!(&bytes[12 + 9 * 16..16 + 9 * 16], b"DSIG");
    }

    #[test]
    fn registration_order_is_fixed() {
        let font = test_font();
        assert_eq!(font.font.len(), 10);
        assert!(font.font.contains(Tag::new(b"head")));
        assert!(font.font.contains(Tag::new(b"DSIG")));
    }
}
