//! Pitch geometry for the tactical board: coordinate clamping, formation
//! templates and canvas conversions.
//!
//! Positions are stored as percentages so boards render the same on any
//! canvas size. The own goal sits at `y = 100`.

use thiserror::Error;

use crate::models::tactics::{Drawing, Marker};

pub const MIN_COORD: f64 = 5.0;
pub const MAX_COORD: f64 = 95.0;

const GOALKEEPER: (f64, f64) = (50.0, 90.0);
const DEFENCE_Y: f64 = 75.0;
const ATTACK_Y: f64 = 20.0;
const LINE_MIN_X: f64 = 15.0;
const LINE_MAX_X: f64 = 85.0;

#[derive(Debug, Error, PartialEq)]
pub enum PitchError {
    #[error("Invalid formation shape '{0}': {1}")]
    InvalidShape(String, &'static str),
    #[error("Canvas dimensions must be positive and finite")]
    InvalidCanvas,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn new(width: f64, height: f64) -> Result<Self, PitchError> {
        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(PitchError::InvalidCanvas);
        }
        Ok(Self { width, height })
    }
}

/// Keeps a coordinate inside the playable band. Non-finite values land on the centre line.
pub fn clamp_coord(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_COORD, MAX_COORD)
    } else {
        50.0
    }
}

pub fn clamp_markers(markers: &mut [Marker]) {
    for marker in markers {
        marker.x = clamp_coord(marker.x);
        marker.y = clamp_coord(marker.y);
    }
}

pub fn clamp_drawings(drawings: &mut [Drawing]) {
    for point in drawings.iter_mut().flat_map(|d| d.points.iter_mut()) {
        point[0] = clamp_coord(point[0]);
        point[1] = clamp_coord(point[1]);
    }
}

/// Parses a shape such as `"4-3-3"` into outfield line sizes, defence first.
pub fn parse_shape(shape: &str) -> Result<Vec<usize>, PitchError> {
    let invalid = |reason| PitchError::InvalidShape(shape.to_string(), reason);

    let lines = shape
        .trim()
        .split('-')
        .map(|part| part.trim().parse::<usize>().map_err(|_| invalid("lines must be numbers")))
        .collect::<Result<Vec<_>, _>>()?;

    if !(2..=5).contains(&lines.len()) {
        return Err(invalid("expected 2 to 5 lines"));
    }
    if lines.iter().any(|&n| !(1..=6).contains(&n)) {
        return Err(invalid("each line needs 1 to 6 players"));
    }
    let outfield: usize = lines.iter().sum();
    if !(6..=10).contains(&outfield) {
        return Err(invalid("expected 6 to 10 outfield players"));
    }

    Ok(lines)
}

fn spread(count: usize, min: f64, max: f64, index: usize) -> f64 {
    if count <= 1 {
        (min + max) / 2.0
    } else {
        min + (max - min) * index as f64 / (count - 1) as f64
    }
}

fn line_role(line: usize, total: usize) -> (&'static str, char) {
    if line == 0 {
        ("defender", 'D')
    } else if line + 1 == total {
        ("forward", 'F')
    } else {
        ("midfielder", 'M')
    }
}

/// Default marker layout for a shape, goalkeeper first.
pub fn layout_for_shape(shape: &str) -> Result<Vec<Marker>, PitchError> {
    let lines = parse_shape(shape)?;
    let mut markers = Vec::with_capacity(lines.iter().sum::<usize>() + 1);

    markers.push(Marker {
        label: "GK".to_string(),
        role: Some("goalkeeper".to_string()),
        player_id: None,
        x: GOALKEEPER.0,
        y: GOALKEEPER.1,
    });

    let mut counters = std::collections::HashMap::new();
    for (line, &count) in lines.iter().enumerate() {
        let y = spread(lines.len(), DEFENCE_Y, ATTACK_Y, line);
        let (role, prefix) = line_role(line, lines.len());
        for slot in 0..count {
            let n = counters.entry(prefix).or_insert(0);
            *n += 1;
            markers.push(Marker {
                label: format!("{prefix}{n}"),
                role: Some(role.to_string()),
                player_id: None,
                x: clamp_coord(spread(count, LINE_MIN_X, LINE_MAX_X, slot)),
                y: clamp_coord(y),
            });
        }
    }

    Ok(markers)
}

pub fn percent_to_pixels(point: Point, canvas: Canvas) -> Point {
    Point {
        x: point.x / 100.0 * canvas.width,
        y: point.y / 100.0 * canvas.height,
    }
}

pub fn pixels_to_percent(point: Point, canvas: Canvas) -> Point {
    Point {
        x: point.x / canvas.width * 100.0,
        y: point.y / canvas.height * 100.0,
    }
}

/// Linear rescale of a pixel position between two canvas sizes.
pub fn rescale(point: Point, from: Canvas, to: Canvas) -> Point {
    Point {
        x: point.x * to.width / from.width,
        y: point.y * to.height / from.height,
    }
}

/// Flips markers to the opposite half, e.g. to show the away side. The
/// result is clamped, so unclamped input still lands on the pitch.
pub fn mirror(markers: &[Marker]) -> Vec<Marker> {
    let mut flipped: Vec<Marker> = markers
        .iter()
        .map(|m| Marker {
            x: 100.0 - m.x,
            y: 100.0 - m.y,
            ..m.clone()
        })
        .collect();
    clamp_markers(&mut flipped);
    flipped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tactics::DrawingKind;

    fn canvas(w: f64, h: f64) -> Canvas {
        Canvas::new(w, h).unwrap()
    }

    #[test]
    fn test_clamp_coord() {
        assert_eq!(clamp_coord(-20.0), MIN_COORD);
        assert_eq!(clamp_coord(120.0), MAX_COORD);
        assert_eq!(clamp_coord(42.0), 42.0);
        assert_eq!(clamp_coord(f64::NAN), 50.0);
    }

    #[test]
    fn test_parse_shape() {
        assert_eq!(parse_shape("4-3-3").unwrap(), vec![4, 3, 3]);
        assert_eq!(parse_shape(" 4-2-3-1 ").unwrap(), vec![4, 2, 3, 1]);
        assert_eq!(parse_shape("2-3-1").unwrap(), vec![2, 3, 1]);
        assert!(parse_shape("4-4-2-x").is_err());
        assert!(parse_shape("10").is_err());
        assert!(parse_shape("4-4-4").is_err());
        assert!(parse_shape("7-1-1").is_err());
        assert!(parse_shape("1-1-1-1-1-1").is_err());
    }

    #[test]
    fn test_layout_for_433() {
        let markers = layout_for_shape("4-3-3").unwrap();
        assert_eq!(markers.len(), 11);
        assert_eq!(markers[0].label, "GK");
        assert_eq!((markers[0].x, markers[0].y), (50.0, 90.0));

        let defenders: Vec<_> = markers.iter().filter(|m| m.label.starts_with('D')).collect();
        assert_eq!(defenders.len(), 4);
        assert!(defenders.iter().all(|m| m.y == DEFENCE_Y));
        assert_eq!(defenders[0].x, LINE_MIN_X);
        assert_eq!(defenders[3].x, LINE_MAX_X);

        let forwards: Vec<_> = markers.iter().filter(|m| m.label.starts_with('F')).collect();
        assert!(forwards.iter().all(|m| m.y == ATTACK_Y));
        assert!(markers
            .iter()
            .all(|m| (MIN_COORD..=MAX_COORD).contains(&m.x) && (MIN_COORD..=MAX_COORD).contains(&m.y)));
    }

    #[test]
    fn test_single_player_line_is_centred() {
        let markers = layout_for_shape("4-2-3-1").unwrap();
        let striker = markers.iter().find(|m| m.label == "F1").unwrap();
        assert_eq!(striker.x, 50.0);
        let midfielders = markers.iter().filter(|m| m.label.starts_with('M')).count();
        assert_eq!(midfielders, 5);
    }

    #[test]
    fn test_pixel_conversions() {
        let c = canvas(800.0, 600.0);
        let px = percent_to_pixels(Point { x: 50.0, y: 25.0 }, c);
        assert_eq!(px, Point { x: 400.0, y: 150.0 });
        assert_eq!(pixels_to_percent(px, c), Point { x: 50.0, y: 25.0 });
    }

    #[test]
    fn test_rescale_between_canvases() {
        let from = canvas(800.0, 600.0);
        let to = canvas(400.0, 900.0);
        let scaled = rescale(Point { x: 200.0, y: 300.0 }, from, to);
        assert_eq!(scaled, Point { x: 100.0, y: 450.0 });
    }

    #[test]
    fn test_zero_canvas_rejected() {
        assert_eq!(Canvas::new(0.0, 600.0), Err(PitchError::InvalidCanvas));
        assert_eq!(Canvas::new(800.0, f64::NAN), Err(PitchError::InvalidCanvas));
    }

    #[test]
    fn test_mirror() {
        let markers = layout_for_shape("4-4-2").unwrap();
        let away = mirror(&markers);
        assert_eq!((away[0].x, away[0].y), (50.0, 10.0));
        assert_eq!(away[1].label, markers[1].label);
        assert_eq!(away[1].x, 100.0 - markers[1].x);
    }

    #[test]
    fn test_mirror_clamps_off_pitch_input() {
        let mut markers = layout_for_shape("4-3-3").unwrap();
        markers[0].x = 120.0;
        markers[0].y = -40.0;
        markers[1].x = f64::NAN;

        let away = mirror(&markers);
        assert_eq!((away[0].x, away[0].y), (MIN_COORD, MAX_COORD));
        assert_eq!(away[1].x, 50.0);
        assert!(away
            .iter()
            .all(|m| (MIN_COORD..=MAX_COORD).contains(&m.x) && (MIN_COORD..=MAX_COORD).contains(&m.y)));
    }

    #[test]
    fn test_clamp_drawings() {
        let mut drawings = vec![Drawing {
            kind: DrawingKind::Arrow,
            points: vec![[0.0, 50.0], [101.0, 2.0]],
            color: None,
        }];
        clamp_drawings(&mut drawings);
        assert_eq!(drawings[0].points, vec![[5.0, 50.0], [95.0, 5.0]]);
    }
}
