//! Read-only field statistics for logging and tests.

use crate::grid::Grid3D;

/// Summary of the current grid state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldStats {
    /// Largest |div v| over interior cells (not divided by dt)
    pub max_divergence: f64,
    /// Largest absolute face velocity over all three components
    pub max_speed: f64,
    /// Half the sum of squared face velocities
    pub kinetic_energy: f64,
    /// Largest |p|
    pub max_pressure: f64,
    /// False once any velocity or pressure value is NaN or infinite
    pub finite: bool,
}

impl FieldStats {
    /// Measure the grid. Recomputes divergence from the velocity faces
    /// instead of reading the stored divergence field.
    pub fn measure(grid: &Grid3D) -> Self {
        let [w, h, d] = grid.dims();
        let (vx, vy, vz) = (grid.vx(), grid.vy(), grid.vz());

        let mut max_divergence = 0.0f64;
        for z in 1..d - 1 {
            for y in 1..h - 1 {
                for x in 1..w - 1 {
                    let div = (vx[[x + 1, y, z]] - vx[[x, y, z]])
                        + (vy[[x, y + 1, z]] - vy[[x, y, z]])
                        + (vz[[x, y, z + 1]] - vz[[x, y, z]]);
                    max_divergence = max_divergence.max(div.abs());
                }
            }
        }

        let faces = || {
            vx.as_slice()
                .iter()
                .chain(vy.as_slice())
                .chain(vz.as_slice())
        };
        let kinetic_energy = 0.5 * faces().map(|v| v * v).sum::<f64>();
        let max_speed = faces().fold(0.0f64, |m, v| m.max(v.abs()));
        let finite = faces()
            .chain(grid.pressure().as_slice())
            .all(|v| v.is_finite());

        Self {
            max_divergence,
            max_speed,
            kinetic_energy,
            max_pressure: grid.pressure().max_abs(),
            finite,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_grid() {
        let grid = Grid3D::new(4, 4, 4);
        let stats = FieldStats::measure(&grid);
        assert_eq!(stats.max_divergence, 0.0);
        assert_eq!(stats.kinetic_energy, 0.0);
        assert!(stats.finite);
    }

    #[test]
    fn test_single_face() {
        let mut grid = Grid3D::new(5, 5, 5);
        grid.vx_mut()[[2, 2, 2]] = -2.0;

        let stats = FieldStats::measure(&grid);

        assert_eq!(stats.max_divergence, 2.0);
        assert_eq!(stats.max_speed, 2.0);
        assert_eq!(stats.kinetic_energy, 2.0);
    }

    #[test]
    fn test_flags_non_finite() {
        let mut grid = Grid3D::new(4, 4, 4);
        grid.pressure_mut()[[1, 1, 1]] = f64::NAN;
        assert!(!FieldStats::measure(&grid).finite);
    }
}
