//! Catalog module - block templates and live block instances
//!
//! Templates are declared as ragged `[z][y][x]` slices no larger than the voxel cube;
//! missing indices count as empty. Instancing copies a template into an owned
//! [`Voxels`] cube, so a live block never shares shape state with its template.

use crate::rng::SimpleRng;
use crate::types::{Voxels, EMPTY_VOXELS, START_X, START_Y, START_Z, VOXEL_LENGTH};

/// Template shape, indexed `[z][y][x]`
pub type TemplateShape = &'static [&'static [&'static [u8]]];

/// Immutable catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTemplate {
    pub name: &'static str,
    /// RGB color (`0xRRGGBB`)
    pub color: u32,
    pub shape: TemplateShape,
}

/// Built-in templates (index = catalog id)
pub const STANDARD_TEMPLATES: [BlockTemplate; 8] = [
    BlockTemplate {
        name: "i",
        color: 0x00bcd4,
        shape: &[&[&[1, 1, 1, 1]]],
    },
    BlockTemplate {
        name: "o",
        color: 0xffeb3b,
        shape: &[&[&[1, 1]], &[&[1, 1]]],
    },
    BlockTemplate {
        name: "t",
        color: 0x9c27b0,
        shape: &[&[&[1, 1, 1]], &[&[0, 1, 0]]],
    },
    BlockTemplate {
        name: "l",
        color: 0xff9800,
        shape: &[&[&[1, 1, 1]], &[&[0, 0, 1]]],
    },
    BlockTemplate {
        name: "s",
        color: 0x4caf50,
        shape: &[&[&[1, 1, 0]], &[&[0, 1, 1]]],
    },
    BlockTemplate {
        name: "branch",
        color: 0x2196f3,
        shape: &[&[&[1, 1], &[1, 0]], &[&[1, 0]]],
    },
    BlockTemplate {
        name: "screw-right",
        color: 0xf44336,
        shape: &[&[&[1, 1]], &[&[0, 1], &[0, 1]]],
    },
    BlockTemplate {
        name: "screw-left",
        color: 0xe91e63,
        shape: &[&[&[1, 1]], &[&[1, 0], &[1, 0]]],
    },
];

/// Live, positioned copy of a template
///
/// `x`, `y`, `z` locate the origin of the voxel cube in well coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockInstance {
    pub id: u8,
    pub color: u32,
    pub shape: Voxels,
    pub x: i8,
    pub y: i8,
    pub z: i8,
}

impl BlockInstance {
    /// Same block with its origin reset to the spawn position
    pub fn at_spawn(self) -> Self {
        Self {
            x: START_X,
            y: START_Y,
            z: START_Z,
            ..self
        }
    }

    /// Same block shifted by `(dx, dy, dz)`
    pub fn moved(self, dx: i8, dy: i8, dz: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            z: self.z + dz,
            ..self
        }
    }

    /// Same block with a replaced shape, position unchanged
    pub fn with_shape(self, shape: Voxels) -> Self {
        Self { shape, ..self }
    }

    /// Cube-local coordinates `(x, y, z)` of every set voxel
    pub fn voxels(&self) -> impl Iterator<Item = (i8, i8, i8)> + '_ {
        set_voxels(&self.shape)
    }

    /// Well coordinates `(x, y, z)` of every set voxel
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8, i8)> + '_ {
        self.voxels()
            .map(move |(x, y, z)| (self.x + x, self.y + y, self.z + z))
    }

    pub fn voxel_count(&self) -> usize {
        self.voxels().count()
    }
}

/// Iterate the set voxels of a cube as `(x, y, z)`
pub fn set_voxels(shape: &Voxels) -> impl Iterator<Item = (i8, i8, i8)> + '_ {
    shape.iter().enumerate().flat_map(|(z, plane)| {
        plane.iter().enumerate().flat_map(move |(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, v)| **v != 0)
                .map(move |(x, _)| (x as i8, y as i8, z as i8))
        })
    })
}

/// Fixed, ordered list of templates with their expanded cubes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    templates: Vec<BlockTemplate>,
    cubes: Vec<Voxels>,
}

impl Catalog {
    /// Build a catalog, expanding every template into a voxel cube
    ///
    /// # Panics
    ///
    /// On an empty list, more than 255 templates, a template larger than
    /// `VOXEL_LENGTH` on any axis, a value other than 0/1, or a template
    /// with no voxel set. A malformed shape would corrupt every collision
    /// result, so it is rejected at load time.
    pub fn new(templates: Vec<BlockTemplate>) -> Self {
        assert!(!templates.is_empty(), "block catalog is empty");
        assert!(templates.len() < u8::MAX as usize, "block catalog too large");
        let cubes = templates.iter().map(expand_template).collect();
        Self { templates, cubes }
    }

    /// The built-in eight-block catalog
    pub fn standard() -> Self {
        Self::new(STANDARD_TEMPLATES.to_vec())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    pub fn template(&self, id: u8) -> Option<&BlockTemplate> {
        self.templates.get(id as usize)
    }

    /// Create an instance of template `id` at the spawn origin
    ///
    /// Returns None if `id` is not in the catalog.
    pub fn instance(&self, id: u8) -> Option<BlockInstance> {
        let template = self.templates.get(id as usize)?;
        Some(BlockInstance {
            id,
            color: template.color,
            shape: self.cubes[id as usize],
            x: START_X,
            y: START_Y,
            z: START_Z,
        })
    }

    /// Pick a template uniformly at random and instance it at the spawn origin
    pub fn draw(&self, rng: &mut SimpleRng) -> BlockInstance {
        let index = rng.next_range(self.templates.len() as u32) as usize;
        BlockInstance {
            id: index as u8,
            color: self.templates[index].color,
            shape: self.cubes[index],
            x: START_X,
            y: START_Y,
            z: START_Z,
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn expand_template(template: &BlockTemplate) -> Voxels {
    let name = template.name;
    assert!(
        template.shape.len() <= VOXEL_LENGTH,
        "template {name}: depth exceeds voxel cube"
    );

    let mut cube = EMPTY_VOXELS;
    for z in 0..VOXEL_LENGTH {
        let plane = template.shape.get(z).copied().unwrap_or(&[]);
        assert!(
            plane.len() <= VOXEL_LENGTH,
            "template {name}: height exceeds voxel cube"
        );
        for y in 0..VOXEL_LENGTH {
            let row = plane.get(y).copied().unwrap_or(&[]);
            assert!(
                row.len() <= VOXEL_LENGTH,
                "template {name}: width exceeds voxel cube"
            );
            for x in 0..VOXEL_LENGTH {
                let v = row.get(x).copied().unwrap_or(0);
                assert!(v <= 1, "template {name}: voxel value {v} is not 0 or 1");
                cube[z][y][x] = v;
            }
        }
    }

    assert!(
        set_voxels(&cube).next().is_some(),
        "template {name}: no voxel set"
    );
    cube
}
