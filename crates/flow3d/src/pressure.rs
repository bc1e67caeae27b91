//! Pressure projection for 3D incompressible flow.
//!
//! Divergence, the Poisson solve and the gradient correction. The solve uses
//! successive over-relaxation with the wall-copy (zero-gradient) condition:
//!
//! `p <- (1 - omega) * p + omega / 8 * (sum of 6 neighbors - s)`
//!
//! Two sweep orders are provided. [`solve_pressure_sor`] is the canonical
//! in-place lexicographic sweep; later cells read values updated earlier in
//! the same sweep, so it is strictly sequential and its ordering is part of
//! the numerical result. [`solve_pressure_red_black`] colours cells by the
//! parity of `x + y + z`; a colour pass only reads the other colour, so each
//! pass can run in parallel. It converges differently from the lexicographic
//! sweep and does not reproduce its values.

use serde::{Deserialize, Serialize};

use crate::grid::{Field3, Grid3D};

/// Sweep ordering used by the pressure solve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureScheme {
    /// In-place lexicographic SOR (x outermost, z innermost). Sequential.
    #[default]
    Sor,
    /// Red-black coloured SOR. Each colour pass may run in parallel.
    RedBlack,
}

/// Compute the divergence of the velocity field divided by `dt` into the
/// grid's divergence field, for every interior cell.
///
/// `s = (outflow faces - inflow faces) / dt`
pub fn compute_divergence(grid: &mut Grid3D, dt: f64, parallel: bool) {
    let upper = grid.interior_upper();
    let vx = &grid.vx;
    let vy = &grid.vy;
    let vz = &grid.vz;

    grid.divergence.update_interior(upper, parallel, |x, y, z, _| {
        let outflow = vx[[x + 1, y, z]] + vy[[x, y + 1, z]] + vz[[x, y, z + 1]];
        let inflow = vx[[x, y, z]] + vy[[x, y, z]] + vz[[x, y, z]];
        (outflow - inflow) / dt
    });
}

/// Relaxed update of cell `(x, y, z)` reading neighbors from `p`.
#[inline]
fn relax(p: &Field3, s: &Field3, x: usize, y: usize, z: usize, omega: f64) -> f64 {
    let neighbors = p[[x - 1, y, z]]
        + p[[x + 1, y, z]]
        + p[[x, y - 1, z]]
        + p[[x, y + 1, z]]
        + p[[x, y, z - 1]]
        + p[[x, y, z + 1]];
    (1.0 - omega) * p[[x, y, z]] + omega / 8.0 * (neighbors - s[[x, y, z]])
}

/// Copy an interior cell's pressure into each wall ghost it borders.
#[inline]
fn copy_wall_ghosts(p: &mut Field3, [w, h, d]: [usize; 3], x: usize, y: usize, z: usize) {
    let here = p[[x, y, z]];
    if x == 1 {
        p[[x - 1, y, z]] = here;
    }
    if x == w - 2 {
        p[[x + 1, y, z]] = here;
    }
    if y == 1 {
        p[[x, y - 1, z]] = here;
    }
    if y == h - 2 {
        p[[x, y + 1, z]] = here;
    }
    if z == 1 {
        p[[x, y, z - 1]] = here;
    }
    if z == d - 2 {
        p[[x, y, z + 1]] = here;
    }
}

/// Solve the pressure Poisson equation with in-place lexicographic SOR.
///
/// Runs exactly `iterations` sweeps with no residual check and returns the
/// number of sweeps performed. The ghosts are refreshed once more after the
/// last sweep so the correction sees a zero gradient across every wall.
pub fn solve_pressure_sor(grid: &mut Grid3D, omega: f64, iterations: usize) -> usize {
    let dims = grid.dims();
    let [w, h, d] = dims;
    let p = &mut grid.pressure;
    let s = &grid.divergence;

    let mut sweeps = 0;
    for _ in 0..iterations {
        for x in 1..w - 1 {
            for y in 1..h - 1 {
                for z in 1..d - 1 {
                    copy_wall_ghosts(p, dims, x, y, z);
                    let next = relax(p, s, x, y, z, omega);
                    p[[x, y, z]] = next;
                }
            }
        }
        sweeps += 1;
    }
    refresh_wall_ghosts(p, dims);
    sweeps
}

/// Copy every wall-adjacent interior pressure into its ghost cell(s).
fn refresh_wall_ghosts(p: &mut Field3, [w, h, d]: [usize; 3]) {
    for z in 1..d - 1 {
        for y in 1..h - 1 {
            p[[0, y, z]] = p[[1, y, z]];
            p[[w - 1, y, z]] = p[[w - 2, y, z]];
        }
    }
    for z in 1..d - 1 {
        for x in 1..w - 1 {
            p[[x, 0, z]] = p[[x, 1, z]];
            p[[x, h - 1, z]] = p[[x, h - 2, z]];
        }
    }
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            p[[x, y, 0]] = p[[x, y, 1]];
            p[[x, y, d - 1]] = p[[x, y, d - 2]];
        }
    }
}

/// Solve the pressure Poisson equation with red-black SOR.
///
/// Each sweep refreshes the wall ghosts and relaxes the even cells, then
/// does the same for the odd cells. A pass reads a snapshot taken right
/// before it; the cells of the colour being written only read the other
/// colour, so the snapshot holds the same values the in-place pass would see.
/// Returns the number of sweeps performed.
pub fn solve_pressure_red_black(
    grid: &mut Grid3D,
    omega: f64,
    iterations: usize,
    parallel: bool,
) -> usize {
    let dims = grid.dims();
    let upper = grid.interior_upper();

    let mut sweeps = 0;
    for _ in 0..iterations {
        for color in 0..2 {
            refresh_wall_ghosts(&mut grid.pressure, dims);
            grid.pressure_after.copy_from(&grid.pressure);

            let snapshot = &grid.pressure_after;
            let s = &grid.divergence;
            grid.pressure.update_interior(upper, parallel, |x, y, z, current| {
                if (x + y + z) % 2 == color {
                    relax(snapshot, s, x, y, z, omega)
                } else {
                    current
                }
            });
        }
        sweeps += 1;
    }
    refresh_wall_ghosts(&mut grid.pressure, dims);
    sweeps
}

/// Run the pressure solve with the configured scheme.
pub fn solve_pressure(
    grid: &mut Grid3D,
    scheme: PressureScheme,
    omega: f64,
    iterations: usize,
    parallel: bool,
) -> usize {
    match scheme {
        PressureScheme::Sor => solve_pressure_sor(grid, omega, iterations),
        PressureScheme::RedBlack => solve_pressure_red_black(grid, omega, iterations, parallel),
    }
}

/// Subtract the backward pressure difference (times `dt`) from every interior
/// velocity face. Writes straight into the velocity fields: each face only
/// reads pressure.
pub fn apply_pressure_gradient(grid: &mut Grid3D, dt: f64, parallel: bool) {
    let upper = grid.interior_upper();
    let p = &grid.pressure;

    grid.vx.update_interior(upper, parallel, |x, y, z, v| {
        v - (p[[x, y, z]] - p[[x - 1, y, z]]) * dt
    });
    grid.vy.update_interior(upper, parallel, |x, y, z, v| {
        v - (p[[x, y, z]] - p[[x, y - 1, z]]) * dt
    });
    grid.vz.update_interior(upper, parallel, |x, y, z, v| {
        v - (p[[x, y, z]] - p[[x, y, z - 1]]) * dt
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divergence_zero_velocity() {
        let mut grid = Grid3D::new(4, 4, 4);
        compute_divergence(&mut grid, 0.1, false);
        assert_eq!(grid.divergence().max_abs(), 0.0);
    }

    #[test]
    fn test_divergence_outflow_is_positive() {
        let mut grid = Grid3D::new(5, 5, 5);
        grid.vz_mut()[[2, 2, 3]] = 1.0;

        compute_divergence(&mut grid, 0.5, false);

        assert!((grid.divergence()[[2, 2, 2]] - 2.0).abs() < 1e-12);
        // The cell on the other side of the face sees it as inflow
        assert!((grid.divergence()[[2, 2, 3]] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sor_runs_requested_sweeps() {
        let mut grid = Grid3D::new(5, 5, 5);
        grid.divergence[[2, 2, 2]] = 1.0;
        assert_eq!(solve_pressure_sor(&mut grid, 1.8, 10), 10);
        assert_eq!(solve_pressure_sor(&mut grid, 1.8, 3), 3);
    }

    #[test]
    fn test_sor_copies_walls_before_relaxing() {
        let mut grid = Grid3D::new(3, 3, 3);
        grid.pressure[[1, 1, 1]] = 2.0;

        solve_pressure_sor(&mut grid, 1.0, 1);

        // A 3-wide axis has both walls next to the single interior cell, so
        // all six neighbors held 2.0 when it relaxed: 1/8 * 12 = 1.5
        assert!((grid.pressure()[[1, 1, 1]] - 1.5).abs() < 1e-12);
        // Final refresh leaves the ghosts level with the relaxed cell
        for ghost in [[0, 1, 1], [2, 1, 1], [1, 0, 1], [1, 2, 1], [1, 1, 0], [1, 1, 2]] {
            assert_eq!(grid.pressure()[ghost], grid.pressure()[[1, 1, 1]]);
        }
    }

    #[test]
    fn test_sor_updates_in_place() {
        let mut grid = Grid3D::new(4, 3, 3);
        grid.divergence[[1, 1, 1]] = -8.0;

        solve_pressure_sor(&mut grid, 1.0, 1);

        assert!((grid.pressure()[[1, 1, 1]] - 1.0).abs() < 1e-12);
        // Sees the value written to (1,1,1) earlier in the same sweep
        assert!((grid.pressure()[[2, 1, 1]] - 0.125).abs() < 1e-12);
    }

    #[test]
    fn test_outflow_source_gives_low_pressure() {
        let mut grid = Grid3D::new(6, 6, 6);
        grid.divergence[[3, 3, 3]] = 4.0;

        solve_pressure_sor(&mut grid, 1.0, 10);

        assert!(grid.pressure()[[3, 3, 3]] < 0.0);
    }

    #[test]
    fn test_red_black_parallel_matches_sequential() {
        let mut a = Grid3D::new(7, 6, 5);
        a.divergence[[2, 2, 2]] = 3.0;
        a.divergence[[4, 3, 2]] = -1.5;
        a.divergence[[5, 4, 3]] = 0.7;
        let mut b = a.clone();

        let sweeps_a = solve_pressure_red_black(&mut a, 1.8, 10, false);
        let sweeps_b = solve_pressure_red_black(&mut b, 1.8, 10, true);

        assert_eq!(sweeps_a, 10);
        assert_eq!(sweeps_b, 10);
        assert_eq!(a.pressure(), b.pressure());
    }

    #[test]
    fn test_red_black_first_pass_only_touches_even_cells() {
        let mut grid = Grid3D::new(5, 5, 5);
        grid.divergence.fill(-8.0);

        solve_pressure_red_black(&mut grid, 1.0, 1, false);

        // Even cell relaxed from zeros, odd cell then sees its updated neighbors
        assert!((grid.pressure()[[2, 2, 2]] - 1.0).abs() < 1e-12);
        assert!(grid.pressure()[[2, 2, 1]] > 1.0);
    }

    #[test]
    fn test_projection_keeps_wall_faces_zero() {
        let mut grid = Grid3D::new(6, 6, 6);
        grid.vx_mut()[[3, 2, 2]] = 1.0;
        grid.vy_mut()[[2, 3, 3]] = -0.5;
        compute_divergence(&mut grid, 0.1, false);

        for scheme in [PressureScheme::Sor, PressureScheme::RedBlack] {
            let mut g = grid.clone();
            solve_pressure(&mut g, scheme, 1.8, 10, false);
            apply_pressure_gradient(&mut g, 0.1, false);

            for a in 1..5 {
                for b in 1..5 {
                    assert_eq!(g.vx()[[1, a, b]], 0.0, "{:?}", scheme);
                    assert_eq!(g.vy()[[a, 1, b]], 0.0, "{:?}", scheme);
                    assert_eq!(g.vz()[[a, b, 1]], 0.0, "{:?}", scheme);
                }
            }
        }
    }

    #[test]
    fn test_gradient_correction() {
        let mut grid = Grid3D::new(5, 5, 5);
        for z in 0..5 {
            for y in 0..5 {
                for x in 0..5 {
                    grid.pressure[[x, y, z]] = x as f64;
                }
            }
        }

        apply_pressure_gradient(&mut grid, 0.25, false);

        assert!((grid.vx()[[2, 2, 2]] + 0.25).abs() < 1e-12);
        assert_eq!(grid.vy()[[2, 2, 2]], 0.0);
        assert_eq!(grid.vz()[[2, 2, 2]], 0.0);
        // Faces outside the interior range are not corrected
        assert_eq!(grid.vx()[[4, 2, 2]], 0.0);
    }
}
