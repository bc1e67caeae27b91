//! Explicit viscous term scaled by the inverse Reynolds number.
//!
//! The update subtracts `dt / Re` times the plain sum of the six axis
//! neighbors. There is no `-6 * center` term, so this is not a discrete
//! Laplacian; at the large Reynolds numbers the solver runs with it acts as a
//! weak damping of the neighborhood mean.

use crate::grid::{Field3, Grid3D};

#[inline]
fn neighbor_sum(field: &Field3, x: usize, y: usize, z: usize) -> f64 {
    field[[x + 1, y, z]]
        + field[[x, y + 1, z]]
        + field[[x, y, z + 1]]
        + field[[x - 1, y, z]]
        + field[[x, y - 1, z]]
        + field[[x, y, z - 1]]
}

/// Apply one explicit viscosity step to all interior cells of every
/// component, staging the writes and committing after the full sweep.
pub fn diffuse_velocity(grid: &mut Grid3D, dt: f64, re: f64, parallel: bool) {
    grid.seed_velocity_staging();
    let upper = grid.interior_upper();
    let nu = 1.0 / re;

    let vx = &grid.vx;
    let vy = &grid.vy;
    let vz = &grid.vz;

    grid.vx_after.update_interior(upper, parallel, |x, y, z, _| {
        vx[[x, y, z]] - nu * neighbor_sum(vx, x, y, z) * dt
    });
    grid.vy_after.update_interior(upper, parallel, |x, y, z, _| {
        vy[[x, y, z]] - nu * neighbor_sum(vy, x, y, z) * dt
    });
    grid.vz_after.update_interior(upper, parallel, |x, y, z, _| {
        vz[[x, y, z]] - nu * neighbor_sum(vz, x, y, z) * dt
    });

    grid.commit_velocity_staging();
}
