//! 3D MAC (Marker-and-Cell) staggered grid for the velocity/pressure solve.

use std::ops::{Index, IndexMut};

use glam::DVec3;
use rayon::prelude::*;

/// Dense scalar array over a 3D box, stored x-fastest.
///
/// The shape is fixed at construction: only element access and whole-field
/// copies are exposed, never the backing `Vec`.
#[derive(Clone, Debug, PartialEq)]
pub struct Field3 {
    nx: usize,
    ny: usize,
    nz: usize,
    data: Vec<f64>,
}

impl Field3 {
    /// Create a zero-filled field of the given shape.
    pub fn zeros(nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            nx,
            ny,
            nz,
            data: vec![0.0; nx * ny * nz],
        }
    }

    /// Shape as `[nx, ny, nz]`.
    #[inline]
    pub fn shape(&self) -> [usize; 3] {
        [self.nx, self.ny, self.nz]
    }

    /// Flat offset of `(i, j, k)`.
    #[inline]
    pub fn offset(&self, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < self.nx && j < self.ny && k < self.nz);
        k * self.nx * self.ny + j * self.nx + i
    }

    /// Read-only view of the flat data.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the field holds no values.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Set every value to `value`.
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Overwrite this field with another of the same shape.
    pub fn copy_from(&mut self, other: &Field3) {
        debug_assert_eq!(self.shape(), other.shape());
        self.data.copy_from_slice(&other.data);
    }

    /// Largest absolute value in the field.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |m, v| m.max(v.abs()))
    }

    /// Rewrite every cell with `1 <= i < upper[0]`, `1 <= j < upper[1]`,
    /// `1 <= k < upper[2]` as `f(i, j, k, current)`.
    ///
    /// Cells are independent, so with `parallel` the z-planes are handed out
    /// to rayon and the result is identical to the sequential sweep. `f` must
    /// not read this field.
    pub(crate) fn update_interior<F>(&mut self, upper: [usize; 3], parallel: bool, f: F)
    where
        F: Fn(usize, usize, usize, f64) -> f64 + Sync,
    {
        let nx = self.nx;
        let plane = self.nx * self.ny;

        if parallel {
            self.data
                .par_chunks_mut(plane)
                .enumerate()
                .for_each(|(k, slab)| update_slab(k, slab, nx, upper, &f));
        } else {
            self.data
                .chunks_mut(plane)
                .enumerate()
                .for_each(|(k, slab)| update_slab(k, slab, nx, upper, &f));
        }
    }
}

fn update_slab<F>(k: usize, slab: &mut [f64], nx: usize, upper: [usize; 3], f: &F)
where
    F: Fn(usize, usize, usize, f64) -> f64,
{
    if k == 0 || k >= upper[2] {
        return;
    }
    for j in 1..upper[1] {
        for i in 1..upper[0] {
            let idx = j * nx + i;
            slab[idx] = f(i, j, k, slab[idx]);
        }
    }
}

impl Index<[usize; 3]> for Field3 {
    type Output = f64;

    #[inline]
    fn index(&self, [i, j, k]: [usize; 3]) -> &f64 {
        &self.data[self.offset(i, j, k)]
    }
}

impl IndexMut<[usize; 3]> for Field3 {
    #[inline]
    fn index_mut(&mut self, [i, j, k]: [usize; 3]) -> &mut f64 {
        let idx = self.offset(i, j, k);
        &mut self.data[idx]
    }
}

/// 3D MAC grid with staggered velocities.
///
/// Velocity components are stored on cell faces:
/// - `vx` on YZ faces, shape `(width+1, height, depth)`
/// - `vy` on XZ faces, shape `(width, height+1, depth)`
/// - `vz` on XY faces, shape `(width, height, depth+1)`
///
/// Divergence and pressure are stored at cell centers. Every velocity field
/// has a staging twin with the same shape so that a stage can read only
/// committed values while it writes the next ones.
#[derive(Clone, Debug)]
pub struct Grid3D {
    width: usize,
    height: usize,
    depth: usize,

    pub(crate) vx: Field3,
    pub(crate) vy: Field3,
    pub(crate) vz: Field3,

    pub(crate) vx_after: Field3,
    pub(crate) vy_after: Field3,
    pub(crate) vz_after: Field3,

    /// Divergence at cell centers (right-hand side of the Poisson solve)
    pub(crate) divergence: Field3,
    /// Pressure at cell centers
    pub(crate) pressure: Field3,
    /// Snapshot buffer used by the red-black pressure passes
    pub(crate) pressure_after: Field3,
}

impl Grid3D {
    /// Create a zeroed grid of `width x height x depth` cells.
    ///
    /// Every axis needs at least one interior layer, so each extent must be
    /// at least 3.
    pub fn new(width: usize, height: usize, depth: usize) -> Self {
        assert!(
            width >= 3 && height >= 3 && depth >= 3,
            "grid extents must be >= 3, got {}x{}x{}",
            width,
            height,
            depth
        );

        Self {
            width,
            height,
            depth,
            vx: Field3::zeros(width + 1, height, depth),
            vy: Field3::zeros(width, height + 1, depth),
            vz: Field3::zeros(width, height, depth + 1),
            vx_after: Field3::zeros(width + 1, height, depth),
            vy_after: Field3::zeros(width, height + 1, depth),
            vz_after: Field3::zeros(width, height, depth + 1),
            divergence: Field3::zeros(width, height, depth),
            pressure: Field3::zeros(width, height, depth),
            pressure_after: Field3::zeros(width, height, depth),
        }
    }

    /// Number of cells in X.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of cells in Y.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells in Z.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Cell counts as `[width, height, depth]`.
    #[inline]
    pub fn dims(&self) -> [usize; 3] {
        [self.width, self.height, self.depth]
    }

    /// Exclusive upper bound of the interior cell range on each axis.
    /// The inclusive lower bound is always 1.
    #[inline]
    pub fn interior_upper(&self) -> [usize; 3] {
        [self.width - 1, self.height - 1, self.depth - 1]
    }

    /// True when `(i, j, k)` lies on the outer one-cell shell.
    #[inline]
    pub fn is_shell_cell(&self, i: usize, j: usize, k: usize) -> bool {
        i == 0
            || j == 0
            || k == 0
            || i == self.width - 1
            || j == self.height - 1
            || k == self.depth - 1
    }

    // ========== Field accessors ==========

    pub fn vx(&self) -> &Field3 {
        &self.vx
    }

    pub fn vx_mut(&mut self) -> &mut Field3 {
        &mut self.vx
    }

    pub fn vy(&self) -> &Field3 {
        &self.vy
    }

    pub fn vy_mut(&mut self) -> &mut Field3 {
        &mut self.vy
    }

    pub fn vz(&self) -> &Field3 {
        &self.vz
    }

    pub fn vz_mut(&mut self) -> &mut Field3 {
        &mut self.vz
    }

    pub fn divergence(&self) -> &Field3 {
        &self.divergence
    }

    pub fn pressure(&self) -> &Field3 {
        &self.pressure
    }

    pub fn pressure_mut(&mut self) -> &mut Field3 {
        &mut self.pressure
    }

    /// The `(vx, vy, vz)` triplet stored at index `(i, j, k)` of each
    /// component field. This is the triplet the force injector overwrites.
    pub fn velocity_triplet(&self, i: usize, j: usize, k: usize) -> DVec3 {
        DVec3::new(self.vx[[i, j, k]], self.vy[[i, j, k]], self.vz[[i, j, k]])
    }

    // ========== Staging ==========

    /// Copy the committed velocities into the staging buffers, so cells a
    /// stage does not visit keep their committed values after the swap.
    pub(crate) fn seed_velocity_staging(&mut self) {
        self.vx_after.copy_from(&self.vx);
        self.vy_after.copy_from(&self.vy);
        self.vz_after.copy_from(&self.vz);
    }

    /// Commit all three staging buffers at once.
    pub(crate) fn commit_velocity_staging(&mut self) {
        std::mem::swap(&mut self.vx, &mut self.vx_after);
        std::mem::swap(&mut self.vy, &mut self.vy_after);
        std::mem::swap(&mut self.vz, &mut self.vz_after);
    }

    // ========== Coordinate helpers ==========

    /// Half of the grid extent on each axis.
    pub fn half_extent(&self) -> DVec3 {
        DVec3::new(
            self.width as f64 * 0.5,
            self.height as f64 * 0.5,
            self.depth as f64 * 0.5,
        )
    }

    /// Convert a centred world position (origin at the middle of the box)
    /// to grid index space.
    #[inline]
    pub fn world_to_grid(&self, world: DVec3) -> DVec3 {
        world + self.half_extent()
    }

    /// Convert a grid-space position to the centred world frame.
    #[inline]
    pub fn grid_to_world(&self, pos: DVec3) -> DVec3 {
        pos - self.half_extent()
    }
}
