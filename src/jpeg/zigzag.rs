// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Zigzag scan order mapping between JPEG coefficient order and natural order.

/// Maps zigzag index (0–63) to natural row-major index (0–63).
///
/// Built by walking the anti-diagonals of the 8×8 block: even diagonals run
/// bottom-left to top-right, odd diagonals top-right to bottom-left.
pub const ZIGZAG_TO_NATURAL: [usize; 64] = walk_diagonals();

/// Maps natural row-major index (0–63) to zigzag index (0–63).
///
/// Inverse of [`ZIGZAG_TO_NATURAL`].
pub const NATURAL_TO_ZIGZAG: [usize; 64] = {
    let mut table = [0usize; 64];
    let mut i = 0;
    while i < 64 {
        table[ZIGZAG_TO_NATURAL[i]] = i;
        i += 1;
    }
    table
};

const fn walk_diagonals() -> [usize; 64] {
    let mut table = [0usize; 64];
    let mut k = 0;
    let mut diag = 0;
    while diag < 15 {
        let first_row = if diag > 7 { diag - 7 } else { 0 };
        let last_row = if diag < 7 { diag } else { 7 };
        let mut step = 0;
        while step <= last_row - first_row {
            let row = if diag % 2 == 0 {
                last_row - step
            } else {
                first_row + step
            };
            table[k] = row * 8 + (diag - row);
            k += 1;
            step += 1;
        }
        diag += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    // ITU-T T.81 Figure A.6.
    const REFERENCE: [usize; 64] = [
         0,  1,  8, 16,  9,  2,  3, 10,
        17, 24, 32, 25, 18, 11,  4,  5,
        12, 19, 26, 33, 40, 48, 41, 34,
        27, 20, 13,  6,  7, 14, 21, 28,
        35, 42, 49, 56, 57, 50, 43, 36,
        29, 22, 15, 23, 30, 37, 44, 51,
        58, 59, 52, 45, 38, 31, 39, 46,
        53, 60, 61, 54, 47, 55, 62, 63,
    ];

    #[test]
    fn matches_reference_order() {
        assert_eq!(ZIGZAG_TO_NATURAL, REFERENCE);
    }

    #[test]
    fn round_trip() {
        for i in 0..64 {
            assert_eq!(NATURAL_TO_ZIGZAG[ZIGZAG_TO_NATURAL[i]], i);
            assert_eq!(ZIGZAG_TO_NATURAL[NATURAL_TO_ZIGZAG[i]], i);
        }
    }

    #[test]
    fn all_indices_covered() {
        let mut seen = [false; 64];
        for &idx in &ZIGZAG_TO_NATURAL {
            assert!(!seen[idx], "duplicate natural index {idx}");
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn consecutive_positions_are_neighbours() {
        // Each zigzag step moves to an adjacent cell (including diagonally).
        for k in 1..64 {
            let (a, b) = (ZIGZAG_TO_NATURAL[k - 1], ZIGZAG_TO_NATURAL[k]);
            let dr = (a / 8) as i32 - (b / 8) as i32;
            let dc = (a % 8) as i32 - (b % 8) as i32;
            assert!(dr.abs() <= 1 && dc.abs() <= 1, "step {k}: {a} -> {b}");
        }
    }
}
