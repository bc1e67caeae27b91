//! Velocity self-advection with a first-order donor-cell (upwind) scheme.
//!
//! Each component is transported by the velocity interpolated onto its own
//! face: its own value along its axis and the four-face average of each of
//! the other two components. The upwind side is chosen independently per
//! axis. All reads come from the committed fields; writes go to the staging
//! buffers, which are committed together once every component is done.

use glam::DVec3;

use crate::grid::{Field3, Grid3D};

/// Difference against the neighbor the flow is coming from.
#[inline]
fn upwind(speed: f64, center: f64, back: f64, forward: f64) -> f64 {
    if speed >= 0.0 {
        center - back
    } else {
        forward - center
    }
}

/// Upwind update of `field` at `(x, y, z)` for convecting velocity `vel`.
#[inline]
fn transport(field: &Field3, [x, y, z]: [usize; 3], vel: DVec3, dt: f64) -> f64 {
    let c = field[[x, y, z]];
    let dx = upwind(vel.x, c, field[[x - 1, y, z]], field[[x + 1, y, z]]);
    let dy = upwind(vel.y, c, field[[x, y - 1, z]], field[[x, y + 1, z]]);
    let dz = upwind(vel.z, c, field[[x, y, z - 1]], field[[x, y, z + 1]]);
    c - vel.x * dx * dt - vel.y * dy * dt - vel.z * dz * dt
}

/// Convecting velocity at the x-face `(x, y, z)`.
#[inline]
fn velocity_at_x_face(vx: &Field3, vy: &Field3, vz: &Field3, x: usize, y: usize, z: usize) -> DVec3 {
    DVec3::new(
        vx[[x, y, z]],
        0.25 * (vy[[x - 1, y, z]] + vy[[x, y, z]] + vy[[x - 1, y + 1, z]] + vy[[x, y + 1, z]]),
        0.25 * (vz[[x - 1, y, z]] + vz[[x, y, z]] + vz[[x - 1, y, z + 1]] + vz[[x, y, z + 1]]),
    )
}

/// Convecting velocity at the y-face `(x, y, z)`.
#[inline]
fn velocity_at_y_face(vx: &Field3, vy: &Field3, vz: &Field3, x: usize, y: usize, z: usize) -> DVec3 {
    DVec3::new(
        0.25 * (vx[[x, y - 1, z]] + vx[[x + 1, y - 1, z]] + vx[[x, y, z]] + vx[[x + 1, y, z]]),
        vy[[x, y, z]],
        0.25 * (vz[[x, y - 1, z]] + vz[[x, y - 1, z + 1]] + vz[[x, y, z]] + vz[[x, y, z + 1]]),
    )
}

/// Convecting velocity at the z-face `(x, y, z)`.
#[inline]
fn velocity_at_z_face(vx: &Field3, vy: &Field3, vz: &Field3, x: usize, y: usize, z: usize) -> DVec3 {
    DVec3::new(
        0.25 * (vx[[x, y, z - 1]] + vx[[x + 1, y, z - 1]] + vx[[x, y, z]] + vx[[x + 1, y, z]]),
        0.25 * (vy[[x, y, z - 1]] + vy[[x, y + 1, z - 1]] + vy[[x, y, z]] + vy[[x, y + 1, z]]),
        vz[[x, y, z]],
    )
}

/// Advect the velocity field by itself for one time step.
///
/// Only interior cells are updated; the one-cell edge layer keeps its
/// committed value and is left to the boundary stage.
pub fn advect_velocity(grid: &mut Grid3D, dt: f64, parallel: bool) {
    grid.seed_velocity_staging();
    let upper = grid.interior_upper();

    let vx = &grid.vx;
    let vy = &grid.vy;
    let vz = &grid.vz;

    grid.vx_after.update_interior(upper, parallel, |x, y, z, _| {
        let vel = velocity_at_x_face(vx, vy, vz, x, y, z);
        transport(vx, [x, y, z], vel, dt)
    });
    grid.vy_after.update_interior(upper, parallel, |x, y, z, _| {
        let vel = velocity_at_y_face(vx, vy, vz, x, y, z);
        transport(vy, [x, y, z], vel, dt)
    });
    grid.vz_after.update_interior(upper, parallel, |x, y, z, _| {
        let vel = velocity_at_z_face(vx, vy, vz, x, y, z);
        transport(vz, [x, y, z], vel, dt)
    });

    grid.commit_velocity_staging();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upwind_picks_side() {
        assert_eq!(upwind(1.0, 3.0, 1.0, 10.0), 2.0);
        assert_eq!(upwind(0.0, 3.0, 1.0, 10.0), 2.0);
        assert_eq!(upwind(-1.0, 3.0, 1.0, 10.0), 7.0);
    }

    #[test]
    fn test_uniform_flow_is_unchanged() {
        let mut grid = Grid3D::new(6, 6, 6);
        grid.vx_mut().fill(0.7);
        grid.vy_mut().fill(-0.3);
        grid.vz_mut().fill(0.2);

        advect_velocity(&mut grid, 0.1, false);

        for &v in grid.vx().as_slice() {
            assert!((v - 0.7).abs() < 1e-12);
        }
        for &v in grid.vy().as_slice() {
            assert!((v + 0.3).abs() < 1e-12);
        }
    }

    #[test]
    fn test_positive_flow_takes_backward_difference() {
        let mut grid = Grid3D::new(6, 6, 6);
        grid.vx_mut().fill(1.0);
        grid.vx_mut()[[2, 2, 2]] = 2.0;

        advect_velocity(&mut grid, 0.1, false);

        // Downstream of the bump: 1 - 1 * (1 - 2) * 0.1
        assert!((grid.vx()[[3, 2, 2]] - 1.1).abs() < 1e-12);
        // Upstream neighbor only sees its own backward difference
        assert!((grid.vx()[[1, 2, 2]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_negative_flow_takes_forward_difference() {
        let mut grid = Grid3D::new(6, 6, 6);
        grid.vx_mut().fill(-1.0);
        grid.vx_mut()[[2, 2, 2]] = -2.0;

        advect_velocity(&mut grid, 0.1, false);

        // Upstream in index order is now downstream in the flow
        assert!((grid.vx()[[1, 2, 2]] + 1.1).abs() < 1e-12);
        assert!((grid.vx()[[3, 2, 2]] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_axes_choose_upwind_independently() {
        let mut grid = Grid3D::new(6, 6, 6);
        // vy carries vx along +y while vx itself is negative
        grid.vx_mut().fill(-1.0);
        grid.vy_mut().fill(1.0);
        grid.vx_mut()[[2, 2, 2]] = -2.0;

        advect_velocity(&mut grid, 0.1, false);

        // x: u < 0 at (2,3,2) -> forward difference vx[3,3,2] - vx[2,3,2] = 0
        // y: v >= 0 -> backward difference vx[2,3,2] - vx[2,2,2] = 1
        let expected = -1.0 - 1.0 * 1.0 * 0.1;
        assert!((grid.vx()[[2, 3, 2]] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_edge_layer_untouched() {
        let mut grid = Grid3D::new(5, 5, 5);
        grid.vx_mut()[[0, 2, 2]] = 7.0;
        grid.vz_mut()[[2, 2, 5]] = -3.0;
        grid.vy_mut()[[2, 4, 2]] = 1.5;

        advect_velocity(&mut grid, 0.2, false);

        assert_eq!(grid.vx()[[0, 2, 2]], 7.0);
        assert_eq!(grid.vz()[[2, 2, 5]], -3.0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mut a = Grid3D::new(7, 6, 5);
        for (n, v) in [0.3, -0.8, 0.5, 1.2, -0.1].iter().enumerate() {
            a.vx_mut()[[n + 1, 2, 2]] = *v;
            a.vy_mut()[[2, n % 4 + 1, 3]] = -*v;
            a.vz_mut()[[3, 3, n % 3 + 1]] = *v * 0.5;
        }
        let mut b = a.clone();

        advect_velocity(&mut a, 0.1, false);
        advect_velocity(&mut b, 0.1, true);

        assert_eq!(a.vx(), b.vx());
        assert_eq!(a.vy(), b.vy());
        assert_eq!(a.vz(), b.vz());
    }
}
