//! Massless tracer particles advected through the velocity field.

use glam::DVec3;
use rand::Rng;
use serde::Serialize;

use crate::grid::{Field3, Grid3D};
use crate::serde_utils::serialize_dvec3;

/// Distance tracers keep from the domain faces, in cells.
pub const TRACER_MARGIN: f64 = 1.1;

/// A single tracer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tracer {
    /// Grid-space position
    pub position: DVec3,
    /// Magnitude of the last displacement
    pub speed: f64,
}

impl Tracer {
    /// Create a stationary tracer at the given position.
    pub fn at(position: DVec3) -> Self {
        Self {
            position,
            speed: 0.0,
        }
    }
}

/// Per-tracer snapshot handed to the presentation layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TracerSample {
    /// Grid-space position
    #[serde(serialize_with = "serialize_dvec3")]
    pub position: DVec3,
    /// Position in the centred world frame
    #[serde(serialize_with = "serialize_dvec3")]
    pub world_position: DVec3,
    /// Magnitude of the last displacement
    pub speed: f64,
    /// Proxy scale, `min_size + speed * size_mul`
    pub scale: f64,
}

/// True when `position` is inside `[TRACER_MARGIN, extent - TRACER_MARGIN)`
/// on every axis.
pub fn in_tracer_domain(position: DVec3, dims: [usize; 3]) -> bool {
    position
        .to_array()
        .iter()
        .zip(dims)
        .all(|(&c, extent)| (TRACER_MARGIN..extent as f64 - TRACER_MARGIN).contains(&c))
}

/// Uniformly random position inside the tracer domain.
pub fn random_interior_position<R: Rng>(rng: &mut R, dims: [usize; 3]) -> DVec3 {
    let mut axis = |extent: usize| rng.gen_range(TRACER_MARGIN..extent as f64 - TRACER_MARGIN);
    let x = axis(dims[0]);
    let y = axis(dims[1]);
    let z = axis(dims[2]);
    DVec3::new(x, y, z)
}

/// Fixed-size, ordered tracer collection with a cyclic reseed cursor.
#[derive(Clone, Debug)]
pub struct Tracers {
    list: Vec<Tracer>,
    cursor: usize,
}

impl Tracers {
    /// Seed `count` tracers at random interior positions.
    pub fn seeded<R: Rng>(count: usize, dims: [usize; 3], rng: &mut R) -> Self {
        let list = (0..count)
            .map(|_| Tracer::at(random_interior_position(rng, dims)))
            .collect();
        Self { list, cursor: 0 }
    }

    /// Build a collection from explicit tracers.
    pub fn from_tracers(list: Vec<Tracer>) -> Self {
        Self { list, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn as_slice(&self) -> &[Tracer] {
        &self.list
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tracer> {
        self.list.iter()
    }

    /// Index the next call to [`Tracers::reseed_next`] will reset.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Move the tracer under the cursor to a fresh random position and
    /// advance the cursor. Returns the index that was reset.
    pub fn reseed_next<R: Rng>(&mut self, dims: [usize; 3], rng: &mut R) -> usize {
        let idx = self.cursor;
        if let Some(tracer) = self.list.get_mut(idx) {
            tracer.position = random_interior_position(rng, dims);
        }
        if !self.list.is_empty() {
            self.cursor = (self.cursor + 1) % self.list.len();
        }
        idx
    }
}

#[inline]
fn trilinear(field: &Field3, lo: [usize; 3], hi: [usize; 3], t: DVec3) -> f64 {
    let [i0, j0, k0] = lo;
    let [i1, j1, k1] = hi;
    let (sx, sy, sz) = (t.x, t.y, t.z);

    let near = (field[[i0, j0, k0]] * (1.0 - sx) + field[[i1, j0, k0]] * sx) * (1.0 - sy)
        + (field[[i0, j1, k0]] * (1.0 - sx) + field[[i1, j1, k0]] * sx) * sy;
    let far = (field[[i0, j0, k1]] * (1.0 - sx) + field[[i1, j0, k1]] * sx) * (1.0 - sy)
        + (field[[i0, j1, k1]] * (1.0 - sx) + field[[i1, j1, k1]] * sx) * sy;
    near * (1.0 - sz) + far * sz
}

/// Clamp a position into `[0, extent - TRACER_MARGIN]` on every axis.
fn clamp_to_sampling_box(grid: &Grid3D, position: DVec3) -> DVec3 {
    let [w, h, d] = grid.dims();
    let max = DVec3::new(w as f64, h as f64, d as f64) - DVec3::splat(TRACER_MARGIN);
    position.clamp(DVec3::ZERO, max)
}

/// Trilinear velocity at a grid-space position.
///
/// All three components are interpolated over the same eight `(i, j, k)`
/// indices: the floor of the position and the next index per axis, wrapped
/// by the cell count. The position is first clamped to the sampling box.
pub fn sample_velocity(grid: &Grid3D, position: DVec3) -> DVec3 {
    let [w, h, d] = grid.dims();
    let pos = clamp_to_sampling_box(grid, position);
    let base = pos.floor();
    let frac = pos - base;

    let lo = [base.x as usize, base.y as usize, base.z as usize];
    let hi = [(lo[0] + 1) % w, (lo[1] + 1) % h, (lo[2] + 1) % d];

    DVec3::new(
        trilinear(grid.vx(), lo, hi, frac),
        trilinear(grid.vy(), lo, hi, frac),
        trilinear(grid.vz(), lo, hi, frac),
    )
}

/// Move every tracer one forward-Euler step through the velocity field.
///
/// A tracer whose new position leaves the tracer domain is respawned at a
/// random interior position instead of being clamped. Its speed is the
/// length of the attempted displacement either way. Returns the number of
/// respawned tracers.
pub fn advect_tracers<R: Rng>(
    tracers: &mut Tracers,
    grid: &Grid3D,
    dt: f64,
    rng: &mut R,
) -> usize {
    let dims = grid.dims();
    let mut respawned = 0;

    for tracer in &mut tracers.list {
        let start = clamp_to_sampling_box(grid, tracer.position);
        let displacement = sample_velocity(grid, start) * dt;
        let moved = start + displacement;

        if in_tracer_domain(moved, dims) {
            tracer.position = moved;
        } else {
            tracer.position = random_interior_position(rng, dims);
            respawned += 1;
        }
        tracer.speed = displacement.length();
    }

    respawned
}
