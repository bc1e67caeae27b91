//! Point forcing: overwrite the velocity triplet of a single cell.

use glam::DVec3;

use crate::grid::Grid3D;

/// Clamp a grid-space position to an interior cell index on every axis.
///
/// The position is floored, then limited to `1..=extent-2`. Non-finite
/// coordinates land on the lowest interior index.
pub fn clamp_to_interior(grid: &Grid3D, position: DVec3) -> [usize; 3] {
    let dims = grid.dims();
    let coords = position.to_array();

    let mut cell = [1usize; 3];
    for axis in 0..3 {
        let floored = coords[axis].floor().max(1.0) as usize;
        cell[axis] = floored.min(dims[axis] - 2);
    }
    cell
}

/// Overwrite (not add to) the velocity triplet at the clamped cell for
/// `position` with `force`. Returns the cell that was written.
pub fn inject_force(grid: &mut Grid3D, position: DVec3, force: DVec3) -> [usize; 3] {
    let cell = clamp_to_interior(grid, position);
    grid.vx[cell] = force.x;
    grid.vy[cell] = force.y;
    grid.vz[cell] = force.z;

    log::debug!(
        "Injected force ({:.3}, {:.3}, {:.3}) at cell {:?}",
        force.x,
        force.y,
        force.z,
        cell
    );
    cell
}
