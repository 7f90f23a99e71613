//! Shared fixtures: synthetic scans of known maps.

#![allow(dead_code)]

use std::f64::consts::TAU;

use scanpoly::math::Point2;
use scanpoly::operations::intersect::{HitPolicy, IntersectOptions, IntersectRaysWithMap};
use scanpoly::{Element, LineMap, Pose2, RangeInterval, Scan};
use tracing_subscriber::EnvFilter;

/// Routes library events to the test output. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Axis-aligned square room centred on the origin.
pub fn square_room(half: f64) -> LineMap {
    LineMap::from(Element::Polygon(vec![
        Point2::new(-half, -half),
        Point2::new(half, -half),
        Point2::new(half, half),
        Point2::new(-half, half),
    ]))
}

/// L-shaped room with its inner corner at `(2, 2)`.
pub fn l_room() -> LineMap {
    LineMap::from(Element::Polygon(vec![
        Point2::new(-3.0, -3.0),
        Point2::new(6.0, -3.0),
        Point2::new(6.0, 2.0),
        Point2::new(2.0, 2.0),
        Point2::new(2.0, 6.0),
        Point2::new(-3.0, 6.0),
    ]))
}

/// `n` evenly spaced azimuths over a full turn, starting at zero.
pub fn full_turn(n: u32) -> Vec<f64> {
    (0..n).map(|k| f64::from(k) * TAU / f64::from(n)).collect()
}

/// Small deterministic radial noise for ray `k`.
pub fn wobble(k: usize, amplitude: f64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let x = k as f64;
    amplitude * (x * 7.3).sin() * (x * 1.9).cos()
}

/// Scans `map` from `pose`: each radius is the distance to the nearest
/// wall, or `+∞` where the ray escapes.
pub fn synthetic_scan(map: &LineMap, pose: Pose2, azimuth: Vec<f64>, max_range: f64) -> Scan {
    let n = azimuth.len();
    let probe = Scan::new(azimuth.clone(), vec![0.0; n], pose, RangeInterval::unbounded())
        .expect("probe scan");
    let hits = IntersectRaysWithMap::new(&probe, map)
        .with_options(IntersectOptions {
            hit_policy: HitPolicy::Nearest,
            ..IntersectOptions::default()
        })
        .execute()
        .expect("intersection");
    Scan::new(
        azimuth,
        hits.distance,
        pose,
        RangeInterval::new(0.0, max_range).expect("range"),
    )
    .expect("scan")
}

/// Same scan with `noise(k)` added to every finite radius.
pub fn with_noise(scan: &Scan, noise: impl Fn(usize) -> f64) -> Scan {
    let radii = scan
        .radii()
        .iter()
        .enumerate()
        .map(|(k, r)| if r.is_finite() { r + noise(k) } else { *r })
        .collect();
    scan.with_radii(radii).expect("radii")
}
