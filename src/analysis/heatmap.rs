//! Pitch heatmaps: kernel density on a coarse grid, colour ramp and SVG output.

use serde::Serialize;
use thiserror::Error;

use crate::models::gps::{GpsSample, PitchBounds};

pub const KERNEL_RADIUS: f64 = 1.5;

#[derive(Debug, Error, PartialEq)]
pub enum HeatmapError {
    #[error("Heatmap grid needs at least one row and one column")]
    EmptyGrid,
    #[error("Pitch bounds must have min < max for both latitude and longitude")]
    InvalidBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub fn css(&self) -> String {
        format!("rgba({},{},{},{:.2})", self.r, self.g, self.b, self.a)
    }
}

/// Fixed colour ramp from cold to hot.
const STOPS: [(f64, (f64, f64, f64, f64)); 5] = [
    (0.0, (0.0, 0.0, 255.0, 0.0)),
    (0.25, (0.0, 0.0, 255.0, 0.6)),
    (0.5, (0.0, 255.0, 0.0, 0.7)),
    (0.75, (255.0, 255.0, 0.0, 0.8)),
    (1.0, (255.0, 0.0, 0.0, 0.9)),
];

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

pub fn color_for(intensity: f64) -> Rgba {
    let v = if intensity.is_finite() { intensity.clamp(0.0, 1.0) } else { 0.0 };

    let mut lower = STOPS[0];
    let mut upper = STOPS[STOPS.len() - 1];
    for window in STOPS.windows(2) {
        if v >= window[0].0 && v <= window[1].0 {
            lower = window[0];
            upper = window[1];
            break;
        }
    }

    let span = upper.0 - lower.0;
    let t = if span > 0.0 { (v - lower.0) / span } else { 0.0 };
    let (c0, c1) = (lower.1, upper.1);
    Rgba {
        r: lerp(c0.0, c1.0, t).round() as u8,
        g: lerp(c0.1, c1.1, t).round() as u8,
        b: lerp(c0.2, c1.2, t).round() as u8,
        a: (lerp(c0.3, c1.3, t) * 100.0).round() / 100.0,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub cols: usize,
    pub rows: usize,
    /// Row-major intensities in [0, 1].
    pub intensities: Vec<Vec<f64>>,
    pub points: usize,
}

impl Heatmap {
    pub fn get(&self, col: usize, row: usize) -> f64 {
        self.intensities
            .get(row)
            .and_then(|r| r.get(col))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Builds a heatmap from points in normalised pitch coordinates.
/// Points outside [0, 1] are ignored.
pub fn heatmap(points: &[(f64, f64)], cols: usize, rows: usize) -> Result<Heatmap, HeatmapError> {
    if cols == 0 || rows == 0 {
        return Err(HeatmapError::EmptyGrid);
    }

    let mut grid = vec![vec![0.0_f64; cols]; rows];
    let reach = KERNEL_RADIUS.ceil() as isize;
    let mut used = 0;

    for &(x, y) in points {
        if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
            continue;
        }
        used += 1;

        let px = x * cols as f64;
        let py = y * rows as f64;
        let (home_c, home_r) = (px.floor() as isize, py.floor() as isize);

        for r in (home_r - reach)..=(home_r + reach) {
            for c in (home_c - reach)..=(home_c + reach) {
                if r < 0 || c < 0 || r >= rows as isize || c >= cols as isize {
                    continue;
                }
                let dx = c as f64 + 0.5 - px;
                let dy = r as f64 + 0.5 - py;
                let d = (dx * dx + dy * dy).sqrt();
                if d < KERNEL_RADIUS {
                    grid[r as usize][c as usize] += 1.0 - d / KERNEL_RADIUS;
                }
            }
        }
    }

    let max = grid.iter().flatten().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for v in grid.iter_mut().flatten() {
            *v = (*v / max * 1000.0).round() / 1000.0;
        }
    }

    Ok(Heatmap {
        cols,
        rows,
        intensities: grid,
        points: used,
    })
}

/// Projects GPS samples into normalised pitch coordinates. North is the top
/// of the grid. Samples outside the bounds are dropped.
pub fn project(samples: &[GpsSample], bounds: PitchBounds) -> Result<Vec<(f64, f64)>, HeatmapError> {
    let lat_span = bounds.max_lat - bounds.min_lat;
    let lon_span = bounds.max_lon - bounds.min_lon;
    if !(lat_span.is_finite() && lon_span.is_finite()) || lat_span <= 0.0 || lon_span <= 0.0 {
        return Err(HeatmapError::InvalidBounds);
    }

    Ok(samples
        .iter()
        .filter(|s| {
            (bounds.min_lat..=bounds.max_lat).contains(&s.lat)
                && (bounds.min_lon..=bounds.max_lon).contains(&s.lon)
        })
        .map(|s| {
            (
                (s.lon - bounds.min_lon) / lon_span,
                (bounds.max_lat - s.lat) / lat_span,
            )
        })
        .collect())
}

/// Renders the heatmap over a simple pitch outline.
pub fn render_svg(map: &Heatmap, width: u32, height: u32) -> String {
    let (w, h) = (width as f64, height as f64);
    let cell_w = w / map.cols as f64;
    let cell_h = h / map.rows as f64;

    let mut svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"##
    );
    svg.push_str(&format!(
        r##"<rect x="0" y="0" width="{width}" height="{height}" fill="#2e7d32"/>"##
    ));

    for (row, values) in map.intensities.iter().enumerate() {
        for (col, &value) in values.iter().enumerate() {
            if value <= 0.0 {
                continue;
            }
            let color = color_for(value);
            svg.push_str(&format!(
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                col as f64 * cell_w,
                row as f64 * cell_h,
                cell_w,
                cell_h,
                color.css()
            ));
        }
    }

    let line = r##"stroke="#ffffff" stroke-width="2" fill="none""##;
    svg.push_str(&format!(
        r#"<rect x="1" y="1" width="{:.1}" height="{:.1}" {line}/>"#,
        w - 2.0,
        h - 2.0
    ));
    svg.push_str(&format!(
        r#"<line x1="{:.1}" y1="0" x2="{:.1}" y2="{height}" {line}/>"#,
        w / 2.0,
        w / 2.0
    ));
    svg.push_str(&format!(
        r#"<circle cx="{:.1}" cy="{:.1}" r="{:.1}" {line}/>"#,
        w / 2.0,
        h / 2.0,
        h.min(w) * 0.135
    ));
    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_stops() {
        assert_eq!(color_for(0.0), Rgba { r: 0, g: 0, b: 255, a: 0.0 });
        assert_eq!(color_for(0.5), Rgba { r: 0, g: 255, b: 0, a: 0.7 });
        assert_eq!(color_for(1.0), Rgba { r: 255, g: 0, b: 0, a: 0.9 });
    }

    #[test]
    fn test_color_interpolates_between_stops() {
        let c = color_for(0.625);
        assert_eq!((c.r, c.g, c.b), (128, 255, 0));
        assert_eq!(c.a, 0.75);
    }

    #[test]
    fn test_color_clamps_out_of_range() {
        assert_eq!(color_for(-1.0), color_for(0.0));
        assert_eq!(color_for(3.0), color_for(1.0));
        assert_eq!(color_for(f64::NAN), color_for(0.0));
    }

    #[test]
    fn test_heatmap_peak_normalised() {
        let map = heatmap(&[(0.5, 0.5), (0.5, 0.5), (0.1, 0.1)], 10, 10).unwrap();
        assert_eq!(map.points, 3);
        let peak = map.intensities.iter().flatten().copied().fold(0.0, f64::max);
        assert_eq!(peak, 1.0);
        assert!(map.get(5, 5) > map.get(1, 1));
        assert!(map.intensities.iter().flatten().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_heatmap_kernel_falloff() {
        let map = heatmap(&[(0.55, 0.55)], 10, 10).unwrap();
        // Point sits at the centre of cell (5, 5).
        assert_eq!(map.get(5, 5), 1.0);
        assert!(map.get(6, 5) > 0.0 && map.get(6, 5) < 1.0);
        assert_eq!(map.get(7, 5), 0.0);
        assert_eq!(map.get(0, 0), 0.0);
    }

    #[test]
    fn test_heatmap_ignores_points_off_pitch() {
        let map = heatmap(&[(1.5, 0.2), (-0.1, 0.4)], 4, 4).unwrap();
        assert_eq!(map.points, 0);
        assert!(map.intensities.iter().flatten().all(|v| *v == 0.0));
    }

    #[test]
    fn test_empty_grid_rejected() {
        assert_eq!(heatmap(&[], 0, 5), Err(HeatmapError::EmptyGrid));
    }

    #[test]
    fn test_project_samples() {
        let bounds = PitchBounds {
            min_lat: 51.0,
            min_lon: -1.0,
            max_lat: 52.0,
            max_lon: 1.0,
        };
        let samples = [
            GpsSample { t: 0.0, lat: 52.0, lon: -1.0 },
            GpsSample { t: 1.0, lat: 51.5, lon: 0.0 },
            GpsSample { t: 2.0, lat: 53.0, lon: 0.0 },
        ];
        let points = project(&samples, bounds).unwrap();
        assert_eq!(points, vec![(0.0, 0.0), (0.5, 0.5)]);
    }

    #[test]
    fn test_project_rejects_inverted_bounds() {
        let bounds = PitchBounds {
            min_lat: 52.0,
            min_lon: -1.0,
            max_lat: 51.0,
            max_lon: 1.0,
        };
        assert_eq!(project(&[], bounds), Err(HeatmapError::InvalidBounds));
    }

    #[test]
    fn test_render_svg() {
        let map = heatmap(&[(0.5, 0.5)], 4, 3).unwrap();
        let svg = render_svg(&map, 400, 300);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("rgba(255,0,0,0.90)"));
    }
}
