//! No-slip wall condition on the domain shell.

use crate::grid::Grid3D;

/// Enforce boundary conditions: zero velocity on and next to every wall.
///
/// For each cell on the outer shell, both faces of that cell are zeroed for
/// every component, so the normal component on the first inward face of each
/// wall is cleared along with the wall face itself.
pub fn enforce_boundary_conditions(grid: &mut Grid3D) {
    let [width, height, depth] = grid.dims();

    for z in 0..depth {
        for y in 0..height {
            for x in 0..width {
                if !grid.is_shell_cell(x, y, z) {
                    continue;
                }
                grid.vx[[x, y, z]] = 0.0;
                grid.vx[[x + 1, y, z]] = 0.0;
                grid.vy[[x, y, z]] = 0.0;
                grid.vy[[x, y + 1, z]] = 0.0;
                grid.vz[[x, y, z]] = 0.0;
                grid.vz[[x, y, z + 1]] = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_conditions() {
        let mut grid = Grid3D::new(5, 5, 5);
        grid.vx_mut().fill(1.0);
        grid.vy_mut().fill(1.0);
        grid.vz_mut().fill(1.0);

        enforce_boundary_conditions(&mut grid);

        // Wall faces and the first inward face along each axis are zero
        for k in 0..5 {
            for j in 0..5 {
                for i in [0, 1, 4, 5] {
                    assert_eq!(grid.vx()[[i, j, k]], 0.0);
                    assert_eq!(grid.vy()[[j, i, k]], 0.0);
                    assert_eq!(grid.vz()[[j, k, i]], 0.0);
                }
            }
        }

        // Faces bordering only interior cells survive
        assert_eq!(grid.vx()[[2, 2, 2]], 1.0);
        assert_eq!(grid.vy()[[2, 3, 2]], 1.0);
        assert_eq!(grid.vz()[[2, 2, 3]], 1.0);
    }

    #[test]
    fn test_tangential_faces_on_shell_rows_are_cleared() {
        let mut grid = Grid3D::new(6, 6, 6);
        grid.vx_mut().fill(1.0);

        enforce_boundary_conditions(&mut grid);

        // x-faces on the y=0 row belong to shell cells
        assert_eq!(grid.vx()[[3, 0, 3]], 0.0);
        // x-faces in the interior column are kept
        assert_eq!(grid.vx()[[3, 2, 3]], 1.0);
    }
}
