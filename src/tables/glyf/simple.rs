//! Simple (non-composite) glyph descriptions.

use std::borrow::Cow;
use std::fmt;

use bitflags::bitflags;

use super::Bbox;
use crate::fields::{Encodable, Fields};
use crate::validate::{no_validation, Validate, ValidationCtx};

bitflags! {
    /// The per-point flags of a simple glyph.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SimpleGlyphFlags: u8 {
        const ON_CURVE_POINT = 0x01;
        const X_SHORT_VECTOR = 0x02;
        const Y_SHORT_VECTOR = 0x04;
        const REPEAT_FLAG = 0x08;
        const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR = 0x10;
        const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR = 0x20;
    }
}

/// A point in a glyph outline, in font units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurvePoint {
    pub x: i16,
    pub y: i16,
    pub on_curve: bool,
}

impl CurvePoint {
    pub fn new(x: i16, y: i16, on_curve: bool) -> Self {
        CurvePoint { x, y, on_curve }
    }

    pub fn on_curve(x: i16, y: i16) -> Self {
        CurvePoint::new(x, y, true)
    }

    pub fn off_curve(x: i16, y: i16) -> Self {
        CurvePoint::new(x, y, false)
    }
}

/// An ordered closed sequence of points.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contour(Vec<CurvePoint>);

impl Contour {
    pub fn iter(&self) -> impl Iterator<Item = &CurvePoint> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<CurvePoint>> for Contour {
    fn from(src: Vec<CurvePoint>) -> Self {
        Contour(src)
    }
}

/// The fixed-size header shared by all glyph descriptions.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GlyphHeader {
    pub number_of_contours: i16,
    pub bbox: Bbox,
}

impl Encodable for GlyphHeader {
    fn build_fields() -> Fields<Self> {
        Fields::new()
            .int16("number_of_contours", |t: &GlyphHeader| t.number_of_contours)
            .int16("x_min", |t: &GlyphHeader| t.bbox.x_min)
            .int16("y_min", |t: &GlyphHeader| t.bbox.y_min)
            .int16("x_max", |t: &GlyphHeader| t.bbox.x_max)
            .int16("y_max", |t: &GlyphHeader| t.bbox.y_max)
    }
}

no_validation!(GlyphHeader);

/// A simple glyph, with its flag and coordinate streams already packed.
///
/// Construction does the compression: deltas run from a point at (0, 0)
/// straight through all contours, each axis independently picks the
/// zero/short/long form, and runs of identical flag bytes collapse behind
/// the repeat flag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimpleGlyph {
    header: GlyphHeader,
    end_pts_of_contours: Vec<u16>,
    instructions: Vec<u8>,
    flags: Vec<u8>,
    x_coordinates: Vec<u8>,
    y_coordinates: Vec<u8>,
    point_count: usize,
}

#[derive(Clone, Copy, PartialEq)]
enum CoordDelta {
    Skip,
    Short(u8),
    Long(i16),
}

fn flag_and_delta(
    value: i16,
    short_flag: SimpleGlyphFlags,
    same_or_pos: SimpleGlyphFlags,
) -> (SimpleGlyphFlags, CoordDelta) {
    const SHORT_MAX: i16 = 255;
    const SHORT_MIN: i16 = -255;
    match value {
        0 => (same_or_pos, CoordDelta::Skip),
        SHORT_MIN..=SHORT_MAX => {
            let flag = if value > 0 {
                short_flag | same_or_pos
            } else {
                short_flag
            };
            (flag, CoordDelta::Short(value.unsigned_abs() as u8))
        }
        _ => (SimpleGlyphFlags::empty(), CoordDelta::Long(value)),
    }
}

fn push_delta(stream: &mut Vec<u8>, delta: CoordDelta) {
    match delta {
        CoordDelta::Skip => (),
        CoordDelta::Short(value) => stream.push(value),
        CoordDelta::Long(value) => stream.extend_from_slice(&value.to_be_bytes()),
    }
}

/// Collapse runs of identical flags. A run of n > 2 points becomes one
/// repeat-flagged byte plus a count byte; a pair costs two bytes either
/// way so it is left uncompressed.
fn package_flags(flags: &[SimpleGlyphFlags]) -> Vec<u8> {
    // a flag byte plus a count byte can cover at most 256 points
    const MAX_RUN: usize = 256;
    let mut out = Vec::with_capacity(flags.len());
    let flush = |out: &mut Vec<u8>, flag: SimpleGlyphFlags, count: usize| match count {
        1 => out.push(flag.bits()),
        2 => {
            out.push(flag.bits());
            out.push(flag.bits());
        }
        n => {
            out.push((flag | SimpleGlyphFlags::REPEAT_FLAG).bits());
            out.push((n - 1) as u8);
        }
    };
    let mut iter = flags.iter().copied();
    let Some(mut current) = iter.next() else {
        return out;
    };
    let mut count = 1;
    for flag in iter {
        if flag == current && count < MAX_RUN {
            count += 1;
        } else {
            flush(&mut out, current, count);
            current = flag;
            count = 1;
        }
    }
    flush(&mut out, current, count);
    out
}

impl SimpleGlyph {
    /// Pack `contours` into wire form. Empty contours are dropped.
    pub fn new(contours: Vec<Contour>, instructions: Vec<u8>) -> SimpleGlyph {
        let contours: Vec<_> = contours.into_iter().filter(|c| !c.is_empty()).collect();
        let mut end_pts_of_contours = Vec::with_capacity(contours.len());
        let mut flags = Vec::new();
        let mut x_coordinates = Vec::new();
        let mut y_coordinates = Vec::new();
        let mut bbox: Option<Bbox> = None;
        let mut last = CurvePoint::on_curve(0, 0);
        let mut point_count = 0usize;
        for contour in &contours {
            point_count += contour.len();
            end_pts_of_contours.push((point_count - 1) as u16);
            for point in contour.iter() {
                let point_box = Bbox {
                    x_min: point.x,
                    y_min: point.y,
                    x_max: point.x,
                    y_max: point.y,
                };
                bbox = Some(bbox.map_or(point_box, |old| old.union(point_box)));
                let (x_flag, x_delta) = flag_and_delta(
                    point.x - last.x,
                    SimpleGlyphFlags::X_SHORT_VECTOR,
                    SimpleGlyphFlags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR,
                );
                let (y_flag, y_delta) = flag_and_delta(
                    point.y - last.y,
                    SimpleGlyphFlags::Y_SHORT_VECTOR,
                    SimpleGlyphFlags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR,
                );
                let mut flag = x_flag | y_flag;
                if point.on_curve {
                    flag |= SimpleGlyphFlags::ON_CURVE_POINT;
                }
                flags.push(flag);
                push_delta(&mut x_coordinates, x_delta);
                push_delta(&mut y_coordinates, y_delta);
                last = *point;
            }
        }
        SimpleGlyph {
            header: GlyphHeader {
                number_of_contours: contours.len() as i16,
                bbox: bbox.unwrap_or_default(),
            },
            end_pts_of_contours,
            instructions,
            flags: package_flags(&flags),
            x_coordinates,
            y_coordinates,
            point_count,
        }
    }

    /// Build from a path of lines and quadratics, one contour per subpath.
    ///
    /// Coordinates are rounded to the nearest font unit. Cubic segments are
    /// not representable in TrueType outlines and are rejected.
    #[cfg(feature = "kurbo")]
    pub fn from_bezpath(path: &kurbo::BezPath) -> Result<SimpleGlyph, MalformedPath> {
        fn round_pt(point: kurbo::Point, on_curve: bool) -> CurvePoint {
            CurvePoint::new(
                point.x.round() as i16,
                point.y.round() as i16,
                on_curve,
            )
        }
        // a closed contour does not repeat its start point
        fn finish(mut points: Vec<CurvePoint>) -> Option<Contour> {
            if points.len() > 1 && points.last() == points.first() {
                points.pop();
            }
            (!points.is_empty()).then(|| Contour::from(points))
        }

        let mut contours = Vec::new();
        let mut current: Option<Vec<CurvePoint>> = None;
        for element in path.elements() {
            match element {
                kurbo::PathEl::MoveTo(point) => {
                    if let Some(done) = current.take().and_then(finish) {
                        contours.push(done);
                    }
                    current = Some(vec![round_pt(*point, true)]);
                }
                kurbo::PathEl::LineTo(point) => current
                    .as_mut()
                    .ok_or(MalformedPath::MissingMove)?
                    .push(round_pt(*point, true)),
                kurbo::PathEl::QuadTo(control, end) => {
                    let contour = current.as_mut().ok_or(MalformedPath::MissingMove)?;
                    contour.push(round_pt(*control, false));
                    contour.push(round_pt(*end, true));
                }
                kurbo::PathEl::CurveTo(..) => return Err(MalformedPath::HasCubic),
                kurbo::PathEl::ClosePath => {
                    if let Some(done) = current.take().and_then(finish) {
                        contours.push(done);
                    }
                }
            }
        }
        if let Some(done) = current.take().and_then(finish) {
            contours.push(done);
        }
        Ok(SimpleGlyph::new(contours, Vec::new()))
    }

    pub fn bbox(&self) -> Bbox {
        self.header.bbox
    }

    pub fn contour_count(&self) -> usize {
        self.end_pts_of_contours.len()
    }

    pub fn point_count(&self) -> usize {
        self.point_count
    }

    pub fn instructions(&self) -> &[u8] {
        &self.instructions
    }
}

impl Encodable for SimpleGlyph {
    fn build_fields() -> Fields<Self> {
        Fields::inherit::<GlyphHeader>(|t: &SimpleGlyph| &t.header)
            .uint16_array("end_pts_of_contours", |t: &SimpleGlyph| {
                Cow::from(&t.end_pts_of_contours)
            })
            .uint16("instruction_length", |t: &SimpleGlyph| {
                t.instructions.len() as u16
            })
            .bytes("instructions", |t: &SimpleGlyph| Cow::from(&t.instructions))
            .bytes("flags", |t: &SimpleGlyph| Cow::from(&t.flags))
            .bytes("x_coordinates", |t: &SimpleGlyph| {
                Cow::from(&t.x_coordinates)
            })
            .bytes("y_coordinates", |t: &SimpleGlyph| {
                Cow::from(&t.y_coordinates)
            })
    }
}

impl Validate for SimpleGlyph {
    fn validate_impl(&self, ctx: &mut ValidationCtx) {
        if self.point_count > u16::MAX as usize {
            ctx.in_field("end_pts_of_contours", |ctx| {
                ctx.report("too many points for one glyph")
            });
        }
        if self.instructions.len() > u16::MAX as usize {
            ctx.in_field("instructions", |ctx| {
                ctx.report("instructions exceed u16::MAX bytes")
            });
        }
    }
}

/// A path that cannot be converted to a glyph outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedPath {
    /// TrueType outlines are quadratic; cubics must be converted first.
    HasCubic,
    /// A drawing command appeared before any `MoveTo`.
    MissingMove,
}

impl fmt::Display for MalformedPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MalformedPath::HasCubic => f.write_str("path contains cubic segments"),
            MalformedPath::MissingMove => f.write_str("path is missing an initial move"),
        }
    }
}

impl std::error::Error for MalformedPath {}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fields::{dump_table, size_of};

    /// Minimal decoder for round-trip checks.
    fn decode(bytes: &[u8]) -> Vec<Vec<CurvePoint>> {
        fn read_i16(bytes: &[u8], at: usize) -> i16 {
            i16::from_be_bytes([bytes[at], bytes[at + 1]])
        }
        let n_contours = read_i16(bytes, 0) as usize;
        let mut pos = 10;
        let mut end_pts = Vec::new();
        for _ in 0..n_contours {
            end_pts.push(u16::from_be_bytes([bytes[pos], bytes[pos + 1]]));
            pos += 2;
        }
        let n_points = end_pts.last().map_or(0, |last| *last as usize + 1);
        let instruction_len = u16::from_be_bytes([bytes[pos], bytes[pos + 1]]) as usize;
        pos += 2 + instruction_len;

        let mut flags = Vec::new();
        while flags.len() < n_points {
            let flag = SimpleGlyphFlags::from_bits_truncate(bytes[pos]);
            pos += 1;
            flags.push(flag);
            if flag.contains(SimpleGlyphFlags::REPEAT_FLAG) {
                let repeat = bytes[pos];
                pos += 1;
                for _ in 0..repeat {
                    flags.push(flag);
                }
            }
        }
        assert_eq!(flags.len(), n_points, "flag stream over-ran the point count");

        let mut read_axis = |short: SimpleGlyphFlags, same_or_pos: SimpleGlyphFlags| {
            let mut values = Vec::new();
            let mut value = 0i16;
            for flag in &flags {
                if flag.contains(short) {
                    let mag = bytes[pos] as i16;
                    pos += 1;
                    value += if flag.contains(same_or_pos) { mag } else { -mag };
                } else if !flag.contains(same_or_pos) {
                    value += read_i16(bytes, pos);
                    pos += 2;
                }
                values.push(value);
            }
            values
        };
        let xs = read_axis(
            SimpleGlyphFlags::X_SHORT_VECTOR,
            SimpleGlyphFlags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR,
        );
        let ys = read_axis(
            SimpleGlyphFlags::Y_SHORT_VECTOR,
            SimpleGlyphFlags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR,
        );

        let mut contours = Vec::new();
        let mut start = 0usize;
        for end in end_pts {
            let end = end as usize;
            let contour = (start..=end)
                .map(|i| {
                    CurvePoint::new(xs[i], ys[i], flags[i].contains(SimpleGlyphFlags::ON_CURVE_POINT))
                })
                .collect();
            contours.push(contour);
            start = end + 1;
        }
        contours
    }

    fn square() -> Vec<CurvePoint> {
        vec![
            CurvePoint::on_curve(0, 0),
            CurvePoint::on_curve(0, 10),
            CurvePoint::on_curve(10, 10),
            CurvePoint::on_curve(10, 0),
        ]
    }

    #[test]
    fn square_round_trip() {
        let mut glyph = SimpleGlyph::new(vec![Contour::from(square())], Vec::new());
        let bytes = dump_table(&mut glyph).unwrap();
        assert_eq!(bytes.len(), size_of(&glyph, 0));
        assert_eq!(decode(&bytes), vec![square()]);
        assert_eq!(
            glyph.bbox(),
            Bbox {
                x_min: 0,
                y_min: 0,
                x_max: 10,
                y_max: 10
            }
        );
    }

    #[test]
    fn first_point_deltas_run_from_origin() {
        let glyph = SimpleGlyph::new(
            vec![Contour::from(vec![
                CurvePoint::on_curve(300, -5),
                CurvePoint::on_curve(300, 25),
            ])],
            Vec::new(),
        );
        // x: long 300 then same; y: short -5 then short +30
        assert_eq!(glyph.x_coordinates, [1, 44]);
        assert_eq!(glyph.y_coordinates, [5, 30]);
        let mut glyph = glyph;
        let bytes = dump_table(&mut glyph).unwrap();
        assert_eq!(
            decode(&bytes)[0],
            [CurvePoint::on_curve(300, -5), CurvePoint::on_curve(300, 25)]
        );
    }

    #[test]
    fn three_identical_deltas_make_two_flag_bytes() {
        let points = vec![
            CurvePoint::on_curve(5, 5),
            CurvePoint::on_curve(10, 10),
            CurvePoint::on_curve(15, 15),
        ];
        let glyph = SimpleGlyph::new(vec![Contour::from(points.clone())], Vec::new());
        let expected = (SimpleGlyphFlags::ON_CURVE_POINT
            | SimpleGlyphFlags::X_SHORT_VECTOR
            | SimpleGlyphFlags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR
            | SimpleGlyphFlags::Y_SHORT_VECTOR
            | SimpleGlyphFlags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR)
            .bits();
        assert_eq!(
            glyph.flags,
            [expected | SimpleGlyphFlags::REPEAT_FLAG.bits(), 2]
        );
        // every point still carries its own coordinate bytes
        assert_eq!(glyph.x_coordinates, [5, 5, 5]);
        let mut glyph = glyph;
        assert_eq!(decode(&dump_table(&mut glyph).unwrap())[0], points);
    }

    #[test]
    fn a_pair_of_identical_flags_is_left_alone() {
        let glyph = SimpleGlyph::new(
            vec![Contour::from(vec![
                CurvePoint::on_curve(5, 5),
                CurvePoint::on_curve(10, 10),
            ])],
            Vec::new(),
        );
        assert_eq!(glyph.flags.len(), 2);
        assert_eq!(glyph.flags[0], glyph.flags[1]);
    }

    #[test]
    fn long_runs_restart_the_count_byte() {
        let points: Vec<_> = (0..300)
            .map(|i| CurvePoint::on_curve(i as i16 + 1, 0))
            .collect();
        let glyph = SimpleGlyph::new(vec![Contour::from(points.clone())], Vec::new());
        // 256 points in the first run, 44 in the second
        assert_eq!(glyph.flags.len(), 4);
        assert_eq!(glyph.flags[1], 255);
        assert_eq!(glyph.flags[3], 43);
        let mut glyph = glyph;
        assert_eq!(decode(&dump_table(&mut glyph).unwrap())[0], points);
    }

    #[test]
    fn off_curve_and_multiple_contours_round_trip() {
        let first = vec![
            CurvePoint::on_curve(0, 0),
            CurvePoint::off_curve(50, 300),
            CurvePoint::on_curve(100, 0),
        ];
        let second = vec![
            CurvePoint::on_curve(20, 20),
            CurvePoint::on_curve(20, 700),
            CurvePoint::on_curve(80, 20),
        ];
        let mut glyph = SimpleGlyph::new(
            vec![Contour::from(first.clone()), Contour::from(second.clone())],
            vec![0xFD, 0x01],
        );
        assert_eq!(glyph.end_pts_of_contours, [2, 5]);
        let bytes = dump_table(&mut glyph).unwrap();
        assert_eq!(decode(&bytes), vec![first, second]);
        assert_eq!(glyph.instructions(), [0xFD, 0x01]);
    }

    #[test]
    fn empty_glyph_is_a_bare_header() {
        let mut glyph = SimpleGlyph::new(Vec::new(), Vec::new());
        let bytes = dump_table(&mut glyph).unwrap();
        // header plus the zero instruction length
        assert_eq!(bytes.len(), 12);
        assert!(bytes.iter().all(|byte| *byte == 0));
    }

    #[cfg(feature = "kurbo")]
    #[test]
    fn bezpath_conversion() {
        let mut path = kurbo::BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((0.0, 10.2));
        path.quad_to((5.0, 15.0), (10.0, 9.8));
        path.line_to((0.0, 0.0));
        path.close_path();
        let glyph = SimpleGlyph::from_bezpath(&path).unwrap();
        assert_eq!(glyph.contour_count(), 1);
        // the closing point collapses into the start point
        assert_eq!(glyph.point_count(), 4);
        assert_eq!(glyph.bbox().y_max, 15);
    }

    #[cfg(feature = "kurbo")]
    #[test]
    fn cubics_are_rejected() {
        let mut path = kurbo::BezPath::new();
        path.move_to((0.0, 0.0));
        path.curve_to((1.0, 1.0), (2.0, 2.0), (3.0, 0.0));
        assert_eq!(
            SimpleGlyph::from_bezpath(&path),
            Err(MalformedPath::HasCubic)
        );
    }
}
