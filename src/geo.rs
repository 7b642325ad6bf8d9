//! Great-circle distance on a spherical earth.
//!
//! Coordinates come in as degrees. Clustering compares central angles in
//! radians, so the threshold is exposed both in kilometres and radians.

use std::f64::consts::PI;

/// Mean earth radius in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Two locations closer than this belong to the same cluster.
pub const DEFAULT_THRESHOLD_KM: f64 = 1000.0;

pub fn km_to_radians(km: f64) -> f64 {
    km / EARTH_RADIUS_KM
}

/// `DEFAULT_THRESHOLD_KM` as a central angle.
pub fn default_threshold_radians() -> f64 {
    km_to_radians(DEFAULT_THRESHOLD_KM)
}

/// Central angle in radians between two (lat, lon) points given in degrees.
pub fn haversine_radians(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let d_phi = phi2 - phi1;
    let d_lambda = (lon2 - lon1).to_radians();
    let h = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push h slightly outside [0, 1].
    2.0 * h.sqrt().clamp(-1.0, 1.0).asin()
}

pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    EARTH_RADIUS_KM * haversine_radians(lat1, lon1, lat2, lon2)
}

/// Position on the unit sphere. Euclidean distance between two of these is
/// the chord length, which grows monotonically with the central angle.
pub fn unit_vector(lat: f64, lon: f64) -> [f64; 3] {
    let (phi, lambda) = (lat.to_radians(), lon.to_radians());
    [phi.cos() * lambda.cos(), phi.cos() * lambda.sin(), phi.sin()]
}

/// Chord length on the unit sphere subtending `angle` radians.
pub fn chord_length(angle: f64) -> f64 {
    2.0 * (angle.clamp(0.0, PI) / 2.0).sin()
}
