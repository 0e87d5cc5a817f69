//! Catalog, rotation and collision tests

use tetricus::core::rotation::rotate_xz;
use tetricus::core::{drop_distance, rotate, validate, Board, Catalog, STANDARD_TEMPLATES};
use tetricus::types::{Plane, COLS, LOGICAL_ROWS, START_X, START_Y, START_Z};

fn voxels(shape: &tetricus::types::Voxels) -> Vec<(i8, i8, i8)> {
    let mut out = tetricus::core::catalog::set_voxels(shape).collect::<Vec<_>>();
    out.sort();
    out
}

#[test]
fn test_standard_catalog() {
    let catalog = Catalog::standard();
    assert_eq!(catalog.len(), STANDARD_TEMPLATES.len());

    for id in 0..catalog.len() as u8 {
        let block = catalog.instance(id).unwrap();
        assert_eq!(block.id, id);
        assert_eq!((block.x, block.y, block.z), (START_X, START_Y, START_Z));
        assert_eq!(block.voxel_count(), 4, "{}", STANDARD_TEMPLATES[id as usize].name);
    }
    assert!(catalog.instance(catalog.len() as u8).is_none());
}

#[test]
fn test_every_block_spawns_on_empty_board() {
    let catalog = Catalog::standard();
    let board = Board::new();
    for id in 0..catalog.len() as u8 {
        let block = catalog.instance(id).unwrap();
        assert!(validate(&board, &block, 0, 0, 0));
        assert!(drop_distance(&board, &block) > 0);
    }
}

#[test]
fn test_bar_turns_from_x_to_z() {
    let bar = Catalog::standard().instance(0).unwrap();
    assert_eq!(voxels(&bar.shape), vec![(0, 0, 0), (1, 0, 0), (2, 0, 0), (3, 0, 0)]);

    let turned = rotate_xz(&bar.shape, true);
    assert_eq!(voxels(&turned), vec![(3, 0, 0), (3, 0, 1), (3, 0, 2), (3, 0, 3)]);
    assert_eq!(rotate(&turned, Plane::Xz, false), bar.shape);
}

#[test]
fn test_every_plane_round_trips_every_block() {
    let catalog = Catalog::standard();
    for id in 0..catalog.len() as u8 {
        let shape = catalog.instance(id).unwrap().shape;
        for plane in Plane::ALL {
            let mut turned = shape;
            for _ in 0..4 {
                turned = rotate(&turned, plane, true);
                assert_eq!(voxels(&turned).len(), 4);
            }
            assert_eq!(turned, shape, "{plane:?} four turns of block {id}");
        }
    }
}

#[test]
fn test_rotation_out_of_the_well_is_illegal() {
    let board = Board::new();
    // Near the +z wall the bar only fits lying along x.
    let bar = Catalog::standard()
        .instance(0)
        .unwrap()
        .moved(0, 0, COLS as i8 - 3 - START_Z);
    assert!(validate(&board, &bar, 0, 0, 0));

    for sign in [true, false] {
        let turned = bar.with_shape(rotate(&bar.shape, Plane::Xz, sign));
        assert!(!validate(&board, &turned, 0, 0, 0));
        assert!(validate(&board, &turned, 0, 0, -1));
    }
}

#[test]
fn test_validate_walls_floor_and_stack() {
    let mut board = Board::new();
    let bar = Catalog::standard().instance(0).unwrap();

    assert!(!validate(&board, &bar, -2, 0, 0));
    assert!(!validate(&board, &bar, 2, 0, 0));
    assert!(!validate(&board, &bar, 0, 0, -2));
    assert!(!validate(&board, &bar, 0, 0, COLS as i8));
    assert!(!validate(&board, &bar, 0, LOGICAL_ROWS as i8, 0));
    assert!(validate(&board, &bar, 0, -3, 0));

    assert_eq!(drop_distance(&board, &bar), LOGICAL_ROWS as i8 - 1);
    board.set(START_X + 3, 12, START_Z, 1);
    assert_eq!(drop_distance(&board, &bar), 11);
}
