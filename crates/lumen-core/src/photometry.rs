//! Photometric calculations on the common model.
//!
//! - [`estimate_luminous_flux`]: integrate intensity over the measured solid angle
//! - [`downward_flux_fraction`]: lower-hemisphere share of a Type C distribution
//! - [`compare_symmetry`]: left/right comparison across the horizontal midpoint

use crate::{PhotometricMeasurements, PhotometryType};
use serde::Serialize;
use std::f64::consts::PI;

/// Relative difference above which two intensities count as different.
pub const SYMMETRY_TOLERANCE: f64 = 0.1;

/// Estimate the total luminous flux in lumens.
///
/// Type C grids use band integration over gamma with the azimuthal mean of
/// each row, so symmetric coverage (a quarter or half plane) stands in for the
/// full circle. Types A and B integrate `I cos V` over both axes with the
/// trapezoidal rule. Returns `None` when the grid is too small or not
/// rectangular.
pub fn estimate_luminous_flux(photometry: &PhotometricMeasurements) -> Option<f64> {
    if !photometry.is_rectangular() || photometry.vertical_angles.len() < 2 {
        return None;
    }
    let raw = match photometry.photometry_type {
        PhotometryType::C => integrate_type_c(photometry),
        PhotometryType::A | PhotometryType::B => integrate_planar(photometry)?,
    };
    Some(raw * photometry.candela_multiplier)
}

fn integrate_type_c(photometry: &PhotometricMeasurements) -> f64 {
    type_c_bands(photometry).iter().map(|(_, flux)| flux).sum()
}

/// Share of the Type C flux emitted below the horizontal plane (gamma <= 90°).
///
/// Returns `None` for other photometry types, grids with fewer than two
/// vertical angles, or a zero total.
pub fn downward_flux_fraction(photometry: &PhotometricMeasurements) -> Option<f64> {
    if photometry.photometry_type != PhotometryType::C
        || !photometry.is_rectangular()
        || photometry.vertical_angles.len() < 2
    {
        return None;
    }
    let bands = type_c_bands(photometry);
    let total: f64 = bands.iter().map(|(_, flux)| flux).sum();
    if total <= 0.0 {
        return None;
    }
    let down: f64 = bands
        .iter()
        .filter(|(upper_gamma, _)| *upper_gamma <= 90.0 + 1e-9)
        .map(|(_, flux)| flux)
        .sum();
    Some(down / total)
}

/// Flux of each gamma band as `(upper gamma, raw flux)`, before the multiplier.
fn type_c_bands(photometry: &PhotometricMeasurements) -> Vec<(f64, f64)> {
    let means: Vec<f64> = photometry
        .candela_values
        .iter()
        .map(|row| {
            if row.is_empty() {
                0.0
            } else {
                row.iter().sum::<f64>() / row.len() as f64
            }
        })
        .collect();

    let gammas = &photometry.vertical_angles;
    gammas
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let band = pair[0].to_radians().cos() - pair[1].to_radians().cos();
            (pair[1], 2.0 * PI * 0.5 * (means[i] + means[i + 1]) * band)
        })
        .collect()
}

fn integrate_planar(photometry: &PhotometricMeasurements) -> Option<f64> {
    let v_angles = &photometry.vertical_angles;
    let h_angles = &photometry.horizontal_angles;
    if h_angles.len() < 2 {
        return None;
    }

    // Inner integral over V for each horizontal column, then trapezoid over H.
    let column_integrals: Vec<f64> = (0..h_angles.len())
        .map(|h| {
            let mut acc = 0.0;
            for v in 0..v_angles.len() - 1 {
                let (v0, v1) = (v_angles[v].to_radians(), v_angles[v + 1].to_radians());
                let f0 = photometry.candela_values[v][h] * v0.cos();
                let f1 = photometry.candela_values[v + 1][h] * v1.cos();
                acc += 0.5 * (f0 + f1) * (v1 - v0);
            }
            acc
        })
        .collect();

    let mut total = 0.0;
    for h in 0..h_angles.len() - 1 {
        let dh = (h_angles[h + 1] - h_angles[h]).to_radians();
        total += 0.5 * (column_integrals[h] + column_integrals[h + 1]) * dh;
    }
    Some(total)
}

/// Outcome of a left/right symmetry comparison.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SymmetryComparison {
    pub compared: usize,
    pub differing: usize,
}

impl SymmetryComparison {
    /// Fraction of compared pairs that differ; 0 when nothing was compared.
    pub fn mismatch_ratio(&self) -> f64 {
        if self.compared == 0 {
            0.0
        } else {
            self.differing as f64 / self.compared as f64
        }
    }
}

/// Compare column `j` with column `n - 1 - j` on every row.
///
/// Pairs where both values are zero are skipped. Returns `None` with fewer
/// than 3 horizontal angles or a ragged grid.
pub fn compare_symmetry(photometry: &PhotometricMeasurements) -> Option<SymmetryComparison> {
    let n = photometry.horizontal_angles.len();
    if n < 3 || !photometry.is_rectangular() {
        return None;
    }

    let mut result = SymmetryComparison {
        compared: 0,
        differing: 0,
    };
    for row in &photometry.candela_values {
        for j in 0..n / 2 {
            let (a, b) = (row[j], row[n - 1 - j]);
            let max = a.max(b);
            if max <= 0.0 {
                continue;
            }
            result.compared += 1;
            if (a - b).abs() / max > SYMMETRY_TOLERANCE {
                result.differing += 1;
            }
        }
    }
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(photometry_type: PhotometryType, v: Vec<f64>, h: Vec<f64>) -> PhotometricMeasurements {
        let values = vec![vec![1.0; h.len()]; v.len()];
        PhotometricMeasurements {
            photometry_type,
            vertical_angles: v,
            horizontal_angles: h,
            candela_values: values,
            ..Default::default()
        }
    }

    #[test]
    fn test_isotropic_type_c_is_four_pi() {
        let v: Vec<f64> = (0..=36).map(|i| i as f64 * 5.0).collect();
        let photometry = uniform(PhotometryType::C, v, vec![0.0, 90.0, 180.0]);
        let flux = estimate_luminous_flux(&photometry).unwrap();
        assert!((flux - 4.0 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_multiplier_scales_estimate() {
        let v: Vec<f64> = (0..=18).map(|i| i as f64 * 5.0).collect();
        let mut photometry = uniform(PhotometryType::C, v, vec![0.0]);
        photometry.candela_multiplier = 100.0;
        let flux = estimate_luminous_flux(&photometry).unwrap();
        // Lower hemisphere of a 100 cd isotropic source.
        assert!((flux - 200.0 * PI).abs() < 1e-6);
    }

    #[test]
    fn test_planar_integration_hemisphere() {
        let v: Vec<f64> = (-18..=18).map(|i| i as f64 * 5.0).collect();
        let h: Vec<f64> = (-18..=18).map(|i| i as f64 * 5.0).collect();
        let photometry = uniform(PhotometryType::B, v, h);
        let flux = estimate_luminous_flux(&photometry).unwrap();
        // Integral of cos V over V in [-90, 90] and H in [-90, 90] is 2 * pi.
        assert!((flux - 2.0 * PI).abs() < 0.01);
    }

    #[test]
    fn test_downward_fraction_of_isotropic_source() {
        let v: Vec<f64> = (0..=36).map(|i| i as f64 * 5.0).collect();
        let photometry = uniform(PhotometryType::C, v, vec![0.0]);
        let dff = downward_flux_fraction(&photometry).unwrap();
        assert!((dff - 0.5).abs() < 1e-9);

        let down_only = PhotometricMeasurements {
            vertical_angles: vec![0.0, 90.0, 180.0],
            horizontal_angles: vec![0.0],
            candela_values: vec![vec![10.0], vec![0.0], vec![0.0]],
            ..Default::default()
        };
        assert_eq!(downward_flux_fraction(&down_only), Some(1.0));
    }

    #[test]
    fn test_estimate_needs_two_rows() {
        let photometry = uniform(PhotometryType::C, vec![0.0], vec![0.0]);
        assert!(estimate_luminous_flux(&photometry).is_none());
    }

    #[test]
    fn test_symmetric_grid_has_no_mismatch() {
        let photometry = PhotometricMeasurements {
            vertical_angles: vec![0.0, 90.0],
            horizontal_angles: vec![0.0, 90.0, 180.0],
            candela_values: vec![vec![10.0, 7.0, 10.0], vec![0.0, 0.0, 0.0]],
            ..Default::default()
        };
        let cmp = compare_symmetry(&photometry).unwrap();
        assert_eq!(cmp.compared, 1);
        assert_eq!(cmp.differing, 0);
        assert_eq!(cmp.mismatch_ratio(), 0.0);
    }

    #[test]
    fn test_asymmetric_grid_is_flagged() {
        let photometry = PhotometricMeasurements {
            vertical_angles: vec![0.0, 45.0],
            horizontal_angles: vec![0.0, 90.0, 180.0, 270.0],
            candela_values: vec![vec![10.0, 10.0, 5.0, 10.0], vec![10.0, 2.0, 10.0, 10.5]],
            ..Default::default()
        };
        let cmp = compare_symmetry(&photometry).unwrap();
        assert_eq!(cmp.compared, 4);
        // (10, 5) on row 0 and (2, 10) on row 1.
        assert_eq!(cmp.differing, 2);
        assert!((cmp.mismatch_ratio() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_symmetry_requires_three_columns() {
        let photometry = uniform(PhotometryType::C, vec![0.0, 90.0], vec![0.0, 180.0]);
        assert!(compare_symmetry(&photometry).is_none());
    }
}
