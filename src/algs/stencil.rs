//! Second-order leapfrog update for the 1-D wave equation.

use std::ops::Range;

/// Courant-like coefficient; fixed at a value that keeps the scheme stable.
pub const WAVE_COEFFICIENT: f64 = 0.15;

/// Next value of one point from its previous value and the three current
/// values centred on it.
#[inline]
pub fn next_value(previous: f64, left: f64, current: f64, right: f64) -> f64 {
    2.0 * current - previous + WAVE_COEFFICIENT * (left - 2.0 * current + right)
}

/// Apply [`next_value`] at index `i`. `current[i-1]` and `current[i+1]` must
/// be valid for this timestep.
#[inline]
pub fn update_point(previous: &[f64], current: &[f64], i: usize) -> f64 {
    next_value(previous[i], current[i - 1], current[i], current[i + 1])
}

/// Fill `next[range]`.
pub fn update_range(previous: &[f64], current: &[f64], next: &mut [f64], range: Range<usize>) {
    for i in range {
        next[i] = update_point(previous, current, i);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_field_stays_flat() {
        assert_eq!(next_value(3.0, 3.0, 3.0, 3.0), 3.0);
    }

    #[test]
    fn curvature_pulls_towards_neighbours() {
        // 4 + 0.15 * (3 - 8 + 0)
        assert!((next_value(4.0, 3.0, 4.0, 0.0) - 3.25).abs() < 1e-12);
    }

    #[test]
    fn update_range_leaves_other_points_alone() {
        let prev = [0.0, 1.0, 2.0, 3.0, 0.0];
        let cur = prev;
        let mut next = [9.0; 5];
        update_range(&prev, &cur, &mut next, 1..3);
        assert_eq!(next[0], 9.0);
        assert_eq!(next[3], 9.0);
        assert_eq!(next[4], 9.0);
        assert!((next[1] - 1.0).abs() < 1e-12);
        assert!((next[2] - 2.0).abs() < 1e-12);
    }
}
