//! Writing an imported sub-volume into the grid
//!
//! Two strategies share one post-condition: every non-background voxel ends
//! with `solid = stored + base`, its rigidity flags set, and the component ids
//! of the Yee edges and faces it owns equal to `stored + base`. Background
//! voxels (`-1`) and background component ids are never written, so cells
//! outside the imported object keep their existing material.
//!
//! - [`ArrayCopyCompositor`] copies the exported rigidity and component-id
//!   volumes directly. Chosen when the dataset carries them.
//! - [`VoxelCompositor`] rebuilds those arrays one voxel at a time from the
//!   material ids alone.

use crate::geometry::dataset::{AuxiliaryVolumes, ImportedGeometry};
use crate::grid::{GridState, RIGID_E_COMPONENTS, RIGID_H_COMPONENTS};

/// Which compositing strategy ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositePath {
    /// Auxiliary volumes copied from the dataset
    ArrayCopy,
    /// Voxels rebuilt from material ids only
    VoxelOnly,
}

/// Writes an imported sub-volume into the grid at an offset.
///
/// Callers must have checked that `offset + geometry.shape()` fits the grid.
pub trait Compositor {
    /// Composite `geometry` at `offset`, re-basing material ids by `base`
    fn composite(&self, grid: &mut GridState, geometry: &ImportedGeometry, offset: [usize; 3], base: u32);

    /// Strategy identifier for logging
    fn path(&self) -> CompositePath;
}

/// Pick the array-copy path when auxiliary volumes are present
pub fn select_compositor(geometry: &ImportedGeometry) -> Box<dyn Compositor + '_> {
    match &geometry.auxiliary {
        Some(aux) => Box::new(ArrayCopyCompositor { aux }),
        None => Box::new(VoxelCompositor { averaging: false }),
    }
}

#[inline]
fn rebase(stored: i32, base: u32) -> Option<u32> {
    u32::try_from(stored).ok().map(|s| base + s)
}

/// Direct copy of exported rigidity and component-id volumes
#[derive(Debug, Clone, Copy)]
pub struct ArrayCopyCompositor<'a> {
    aux: &'a AuxiliaryVolumes,
}

impl<'a> ArrayCopyCompositor<'a> {
    pub fn new(aux: &'a AuxiliaryVolumes) -> Self {
        Self { aux }
    }
}

impl Compositor for ArrayCopyCompositor<'_> {
    fn composite(&self, grid: &mut GridState, geometry: &ImportedGeometry, offset: [usize; 3], base: u32) {
        let [si, sj, sk] = geometry.shape();
        let [xs, ys, zs] = offset;
        for i in 0..si {
            for j in 0..sj {
                for k in 0..sk {
                    let Some(num_id) = rebase(geometry.material_ids.get(i, j, k), base) else {
                        continue;
                    };
                    let (x, y, z) = (xs + i, ys + j, zs + k);
                    grid.solid.set(x, y, z, num_id);
                    for c in 0..RIGID_E_COMPONENTS {
                        grid.rigid_e.set(c, x, y, z, self.aux.rigid_e.get(c, i, j, k));
                    }
                    for c in 0..RIGID_H_COMPONENTS {
                        grid.rigid_h.set(c, x, y, z, self.aux.rigid_h.get(c, i, j, k));
                    }
                }
            }
        }
        grid.id.copy_from(&self.aux.id, offset, |v| rebase(v, base));
    }

    fn path(&self) -> CompositePath {
        CompositePath::ArrayCopy
    }
}

/// Per-voxel construction from material ids
#[derive(Debug, Clone, Copy, Default)]
pub struct VoxelCompositor {
    /// Build voxels for dielectric averaging (no rigid flags, no component ids)
    pub averaging: bool,
}

impl VoxelCompositor {
    /// Build one voxel with the same material on every component
    pub fn build_voxel(&self, grid: &mut GridState, i: usize, j: usize, k: usize, num_id: u32) {
        grid.solid.set(i, j, k, num_id);
        let flag = i8::from(!self.averaging);
        for c in 0..RIGID_E_COMPONENTS {
            grid.rigid_e.set(c, i, j, k, flag);
        }
        for c in 0..RIGID_H_COMPONENTS {
            grid.rigid_h.set(c, i, j, k, flag);
        }
        if self.averaging {
            return;
        }

        let id = &mut grid.id;
        // Ex, Ey, Ez on the four edges parallel to each axis
        for (c, edges) in [
            (0, [(0, 0, 0), (0, 1, 0), (0, 1, 1), (0, 0, 1)]),
            (1, [(0, 0, 0), (1, 0, 0), (1, 0, 1), (0, 0, 1)]),
            (2, [(0, 0, 0), (1, 0, 0), (1, 1, 0), (0, 1, 0)]),
        ] {
            for (di, dj, dk) in edges {
                id.set(c, i + di, j + dj, k + dk, num_id);
            }
        }
        // Hx, Hy, Hz on the two faces normal to each axis
        for (c, faces) in [
            (3, [(0, 0, 0), (1, 0, 0)]),
            (4, [(0, 0, 0), (0, 1, 0)]),
            (5, [(0, 0, 0), (0, 0, 1)]),
        ] {
            for (di, dj, dk) in faces {
                id.set(c, i + di, j + dj, k + dk, num_id);
            }
        }
    }
}

impl Compositor for VoxelCompositor {
    fn composite(&self, grid: &mut GridState, geometry: &ImportedGeometry, offset: [usize; 3], base: u32) {
        let [si, sj, sk] = geometry.shape();
        let [xs, ys, zs] = offset;
        for i in 0..si {
            for j in 0..sj {
                for k in 0..sk {
                    if let Some(num_id) = rebase(geometry.material_ids.get(i, j, k), base) {
                        self.build_voxel(grid, xs + i, ys + j, zs + k, num_id);
                    }
                }
            }
        }
    }

    fn path(&self) -> CompositePath {
        CompositePath::VoxelOnly
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::{ComponentArray, VoxelArray};
    use crate::geometry::dataset::BACKGROUND_ID;
    use crate::grid::FREE_SPACE_NUM_ID;

    fn geometry(shape: [usize; 3], ids: Vec<i32>) -> ImportedGeometry {
        ImportedGeometry {
            material_ids: VoxelArray::from_vec(shape, ids).unwrap(),
            auxiliary: None,
        }
    }

    #[test]
    fn test_voxel_path_builds_edges_and_skips_background() {
        let mut grid = GridState::new([6, 6, 6], [0.01; 3], 1e-12);
        let geo = geometry([2, 1, 1], vec![0, BACKGROUND_ID]);
        let compositor = select_compositor(&geo);
        assert_eq!(compositor.path(), CompositePath::VoxelOnly);
        compositor.composite(&mut grid, &geo, [2, 3, 4], 2);

        assert_eq!(grid.solid.get(2, 3, 4), 2);
        assert_eq!(grid.solid.get(3, 3, 4), FREE_SPACE_NUM_ID);
        assert_eq!(grid.rigid_e.get(11, 2, 3, 4), 1);
        assert_eq!(grid.rigid_h.get(5, 3, 3, 4), 0);
        // Ex edge at (i, j+1, k+1) and Hz face at (i, j, k+1)
        assert_eq!(grid.id.get(0, 2, 4, 5), 2);
        assert_eq!(grid.id.get(5, 2, 3, 5), 2);
        // Hx face at (i+1, j, k) belongs to the built voxel too
        assert_eq!(grid.id.get(3, 3, 3, 4), 2);
        // Ex edges of the background voxel are untouched
        assert_eq!(grid.id.get(0, 3, 4, 5), FREE_SPACE_NUM_ID);
    }

    #[test]
    fn test_array_copy_keeps_background_ids() {
        let mut grid = GridState::new([4, 4, 4], [0.01; 3], 1e-12);
        grid.rigid_e.set(0, 1, 1, 1, 1);
        let mut id = ComponentArray::filled(6, [3, 2, 2], BACKGROUND_ID);
        id.set(0, 0, 0, 0, 0);
        let aux = AuxiliaryVolumes {
            rigid_e: ComponentArray::filled(RIGID_E_COMPONENTS, [2, 1, 1], 1),
            rigid_h: ComponentArray::filled(RIGID_H_COMPONENTS, [2, 1, 1], 1),
            id,
        };
        let geo = ImportedGeometry {
            material_ids: VoxelArray::from_vec([2, 1, 1], vec![0, BACKGROUND_ID]).unwrap(),
            auxiliary: Some(aux),
        };
        let compositor = select_compositor(&geo);
        assert_eq!(compositor.path(), CompositePath::ArrayCopy);
        compositor.composite(&mut grid, &geo, [0, 1, 1], 3);

        assert_eq!(grid.solid.get(0, 1, 1), 3);
        assert_eq!(grid.rigid_e.get(4, 0, 1, 1), 1);
        // Background cell keeps its own flags and material
        assert_eq!(grid.solid.get(1, 1, 1), FREE_SPACE_NUM_ID);
        assert_eq!(grid.rigid_e.get(0, 1, 1, 1), 1);
        assert_eq!(grid.rigid_h.get(0, 1, 1, 1), 0);
        assert_eq!(grid.id.get(0, 0, 1, 1), 3);
        assert_eq!(grid.id.get(0, 1, 1, 1), FREE_SPACE_NUM_ID);
        assert_eq!(grid.id.get(3, 2, 2, 2), FREE_SPACE_NUM_ID);
    }

    #[test]
    fn test_averaging_voxel_clears_rigid_flags() {
        let mut grid = GridState::new([2, 2, 2], [0.01; 3], 1e-12);
        grid.rigid_e.set(0, 0, 0, 0, 1);
        VoxelCompositor { averaging: true }.build_voxel(&mut grid, 0, 0, 0, 4);
        assert_eq!(grid.solid.get(0, 0, 0), 4);
        assert_eq!(grid.rigid_e.get(0, 0, 0, 0), 0);
        assert_eq!(grid.id.get(0, 0, 0, 0), FREE_SPACE_NUM_ID);
    }
}
