//! Angular grid helpers: nearest-neighbour resampling and symmetry coverage.
//!
//! The resampler is deliberately plain nearest-neighbour. Gamma distance is
//! the absolute difference; C-plane distance takes the shorter way round the
//! circle, so 350° is 10° from 0°. When two source samples are equally near,
//! the first one in source order wins.

use lumen_core::{Degrees, LumenError, LumenResult};

/// Index of the source angle nearest to `target` (first wins on ties).
pub fn nearest_index(source: &[f64], target: f64) -> Option<usize> {
    nearest_by(source, |angle| (angle - target).abs())
}

/// Index of the source azimuth nearest to `target`, with 360° wraparound.
pub fn nearest_azimuth_index(source: &[f64], target: f64) -> Option<usize> {
    let target = Degrees(target).normalized();
    nearest_by(source, |angle| Degrees(angle).normalized().azimuth_distance(target))
}

fn nearest_by(source: &[f64], distance: impl Fn(f64) -> f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, angle) in source.iter().enumerate() {
        let d = distance(*angle);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((i, d)),
        }
    }
    best.map(|(i, _)| i)
}

/// Resample a gamma-major grid onto new gamma and C-plane angles.
///
/// `src_grid[g][c]` must have `src_gamma.len()` rows of `src_c.len()` values.
pub fn resample(
    src_gamma: &[f64],
    src_c: &[f64],
    src_grid: &[Vec<f64>],
    dst_gamma: &[f64],
    dst_c: &[f64],
) -> LumenResult<Vec<Vec<f64>>> {
    if src_gamma.is_empty() || src_c.is_empty() {
        return Err(LumenError::conversion(
            "grid.empty",
            "cannot resample an empty grid",
        ));
    }
    if src_grid.len() != src_gamma.len() || src_grid.iter().any(|row| row.len() != src_c.len()) {
        return Err(LumenError::conversion(
            "grid.shape",
            "source grid does not match its angle arrays",
        )
        .with_context("gamma", src_gamma.len())
        .with_context("c_planes", src_c.len()));
    }

    // Nearest lookups depend only on the axis, so resolve them once per axis.
    let rows: Vec<usize> = dst_gamma
        .iter()
        .filter_map(|g| nearest_index(src_gamma, *g))
        .collect();
    let cols: Vec<usize> = dst_c
        .iter()
        .filter_map(|c| nearest_azimuth_index(src_c, *c))
        .collect();

    Ok(rows
        .iter()
        .map(|&r| cols.iter().map(|&c| src_grid[r][c]).collect())
        .collect())
}

// ============================================================================
// Horizontal coverage
// ============================================================================

/// Which part of the C-plane circle a grid covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    /// A single plane stands for every azimuth
    Rotational,
    /// C0-C90, mirrored about both C0-C180 and C90-C270
    Quarter,
    /// C0-C180, mirrored about the C0-C180 plane
    Half,
    /// C90-C270, mirrored about the C90-C270 plane
    HalfC90,
    /// Everything else: no symmetry implied
    Full,
}

impl Coverage {
    /// EULUMDAT symmetry indicator for this coverage.
    pub fn ldt_symmetry(self) -> i32 {
        match self {
            Coverage::Full => 0,
            Coverage::Rotational => 1,
            Coverage::Half => 2,
            Coverage::HalfC90 => 3,
            Coverage::Quarter => 4,
        }
    }
}

const ANGLE_EPSILON: f64 = 1e-6;

fn same_angle(a: f64, b: f64) -> bool {
    (a - b).abs() < ANGLE_EPSILON
}

/// Classify the horizontal angles of a Type C grid.
pub fn classify_coverage(angles: &[f64]) -> Coverage {
    match angles {
        [] | [_] => Coverage::Rotational,
        [first, .., last] if same_angle(*first, 0.0) && same_angle(*last, 90.0) => {
            Coverage::Quarter
        }
        [first, .., last] if same_angle(*first, 0.0) && same_angle(*last, 180.0) => Coverage::Half,
        [first, .., last] if same_angle(*first, 90.0) && same_angle(*last, 270.0) => {
            Coverage::HalfC90
        }
        _ => Coverage::Full,
    }
}

/// Column indices of `angles` after dropping a trailing 360° that repeats 0°.
pub fn without_closing_plane(angles: &[f64]) -> &[f64] {
    match angles {
        [first, .., last] if same_angle(*first, 0.0) && same_angle(*last, 360.0) => {
            &angles[..angles.len() - 1]
        }
        _ => angles,
    }
}

/// Reconstruct the complete C-plane list implied by a symmetric subset.
///
/// The result is sorted, in `[0, 360)` and free of duplicates.
pub fn mirrored_angles(angles: &[f64], coverage: Coverage) -> Vec<f64> {
    let mut full: Vec<f64> = Vec::with_capacity(angles.len() * 4);
    for &a in angles {
        match coverage {
            Coverage::Rotational | Coverage::Full => full.push(a),
            Coverage::Quarter => full.extend([a, 180.0 - a, 180.0 + a, 360.0 - a]),
            Coverage::Half => full.extend([a, 360.0 - a]),
            Coverage::HalfC90 => full.extend([a, 180.0 - a]),
        }
    }
    normalize_angle_set(full)
}

fn normalize_angle_set(angles: Vec<f64>) -> Vec<f64> {
    let mut out: Vec<f64> = angles
        .into_iter()
        .map(|a| Degrees(a).normalized().value())
        .map(|a| if same_angle(a, 360.0) { 0.0 } else { a })
        .collect();
    out.sort_by(f64::total_cmp);
    out.dedup_by(|a, b| same_angle(*a, *b));
    out
}

/// Expand a symmetric grid to the whole circle so azimuth lookups never fall
/// into an unmeasured region.
///
/// Returns the full C-plane list and a gamma-major grid with one column per
/// angle. Rotational and full grids are returned unchanged.
pub fn expand_to_full_circle(angles: &[f64], grid: &[Vec<f64>]) -> (Vec<f64>, Vec<Vec<f64>>) {
    let coverage = classify_coverage(angles);
    if matches!(coverage, Coverage::Rotational | Coverage::Full) {
        return (angles.to_vec(), grid.to_vec());
    }

    let full = mirrored_angles(angles, coverage);
    // Each mirrored angle reads the source column whose angle maps onto it.
    let sources: Vec<usize> = full
        .iter()
        .map(|&target| source_column(angles, coverage, target))
        .collect();
    let expanded = grid
        .iter()
        .map(|row| sources.iter().map(|&c| row[c]).collect())
        .collect();
    (full, expanded)
}

fn source_column(angles: &[f64], coverage: Coverage, target: f64) -> usize {
    let folded = match coverage {
        Coverage::Quarter => {
            let t = if target > 180.0 { 360.0 - target } else { target };
            if t > 90.0 {
                180.0 - t
            } else {
                t
            }
        }
        Coverage::Half => {
            if target > 180.0 {
                360.0 - target
            } else {
                target
            }
        }
        Coverage::HalfC90 => {
            if target < 90.0 {
                180.0 - target
            } else if target > 270.0 {
                540.0 - target
            } else {
                target
            }
        }
        Coverage::Rotational | Coverage::Full => target,
    };
    nearest_index(angles, folded).unwrap_or(0)
}

/// Spacing when `angles` is uniformly spaced, else `None`.
pub fn uniform_spacing(angles: &[f64]) -> Option<f64> {
    let step = angles.get(1)? - angles.first()?;
    if step <= 0.0 {
        return None;
    }
    angles
        .windows(2)
        .all(|pair| ((pair[1] - pair[0]) - step).abs() < ANGLE_EPSILON)
        .then_some(step)
}
