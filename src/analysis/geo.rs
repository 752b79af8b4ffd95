//! Distance and intensity statistics over a GPS track.

use serde::Serialize;

use crate::models::gps::GpsSample;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Segments faster than this are GPS noise.
pub const MAX_PLAUSIBLE_KMH: f64 = 45.0;
pub const HIGH_INTENSITY_KMH: f64 = 19.8;
pub const SPRINT_KMH: f64 = 25.2;
pub const MIN_SPRINT_SECONDS: f64 = 1.0;

/// Great-circle distance in metres.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SessionStats {
    pub total_distance_m: f64,
    pub max_speed_kmh: f64,
    pub sprint_count: u32,
    pub high_intensity_distance_m: f64,
    pub duration_seconds: f64,
}

fn close_sprint(run: &mut f64, stats: &mut SessionStats) {
    if *run >= MIN_SPRINT_SECONDS {
        stats.sprint_count += 1;
    }
    *run = 0.0;
}

pub fn session_stats(samples: &[GpsSample]) -> SessionStats {
    let mut sorted: Vec<&GpsSample> = samples
        .iter()
        .filter(|s| s.t.is_finite() && s.lat.is_finite() && s.lon.is_finite())
        .collect();
    sorted.sort_by(|a, b| a.t.total_cmp(&b.t));

    let mut stats = SessionStats::default();
    if let (Some(first), Some(last)) = (sorted.first(), sorted.last()) {
        stats.duration_seconds = last.t - first.t;
    }

    let mut sprint_seconds = 0.0;

    for pair in sorted.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let dt = b.t - a.t;
        if dt <= 0.0 {
            continue;
        }

        let distance = haversine_m(a.lat, a.lon, b.lat, b.lon);
        let speed_kmh = distance / dt * 3.6;
        if speed_kmh > MAX_PLAUSIBLE_KMH {
            close_sprint(&mut sprint_seconds, &mut stats);
            continue;
        }

        stats.total_distance_m += distance;
        stats.max_speed_kmh = stats.max_speed_kmh.max(speed_kmh);
        if speed_kmh >= HIGH_INTENSITY_KMH {
            stats.high_intensity_distance_m += distance;
        }
        if speed_kmh >= SPRINT_KMH {
            sprint_seconds += dt;
        } else {
            close_sprint(&mut sprint_seconds, &mut stats);
        }
    }
    close_sprint(&mut sprint_seconds, &mut stats);

    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Metres per degree of latitude on the model sphere.
    const M_PER_DEG: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

    fn sample(t: f64, north_m: f64) -> GpsSample {
        GpsSample {
            t,
            lat: 51.5 + north_m / M_PER_DEG,
            lon: -0.12,
        }
    }

    #[test]
    fn test_haversine_known_distance() {
        // One degree of latitude along a meridian.
        let d = haversine_m(0.0, 0.0, 1.0, 0.0);
        assert!((d - M_PER_DEG).abs() < 1e-6);
        assert_eq!(haversine_m(51.5, -0.12, 51.5, -0.12), 0.0);
    }

    #[test]
    fn test_haversine_london_paris() {
        let d = haversine_m(51.5074, -0.1278, 48.8566, 2.3522);
        assert!((d - 343_500.0).abs() < 1_500.0, "got {d}");
    }

    #[test]
    fn test_session_stats_walking() {
        // 2 m/s = 7.2 km/h for 10 seconds.
        let samples: Vec<_> = (0..=10).map(|i| sample(i as f64, i as f64 * 2.0)).collect();
        let stats = session_stats(&samples);
        assert!((stats.total_distance_m - 20.0).abs() < 0.01);
        assert!((stats.max_speed_kmh - 7.2).abs() < 0.01);
        assert_eq!(stats.sprint_count, 0);
        assert_eq!(stats.high_intensity_distance_m, 0.0);
        assert_eq!(stats.duration_seconds, 10.0);
    }

    #[test]
    fn test_unsorted_samples_and_duplicates() {
        let samples = vec![sample(2.0, 4.0), sample(0.0, 0.0), sample(1.0, 2.0), sample(1.0, 2.0)];
        let stats = session_stats(&samples);
        assert!((stats.total_distance_m - 4.0).abs() < 0.01);
    }

    #[test]
    fn test_noise_segments_discarded() {
        // Second segment jumps 100 m in one second (360 km/h).
        let samples = vec![sample(0.0, 0.0), sample(1.0, 2.0), sample(2.0, 102.0), sample(3.0, 104.0)];
        let stats = session_stats(&samples);
        assert!((stats.total_distance_m - 4.0).abs() < 0.01);
        assert!(stats.max_speed_kmh < MAX_PLAUSIBLE_KMH);
    }

    #[test]
    fn test_sprint_detection() {
        // 8 m/s = 28.8 km/h for two seconds, then a jog, then a 0.5 s burst.
        let samples = vec![
            sample(0.0, 0.0),
            sample(1.0, 8.0),
            sample(2.0, 16.0),
            sample(3.0, 18.0),
            sample(3.5, 22.0),
            sample(4.5, 24.0),
        ];
        let stats = session_stats(&samples);
        assert_eq!(stats.sprint_count, 1);
        assert!((stats.high_intensity_distance_m - 20.0).abs() < 0.01);
        assert!((stats.max_speed_kmh - 28.8).abs() < 0.01);
    }

    #[test]
    fn test_empty_and_single_sample() {
        assert_eq!(session_stats(&[]), SessionStats::default());
        let stats = session_stats(&[sample(0.0, 0.0)]);
        assert_eq!(stats.total_distance_m, 0.0);
    }
}
