//! Board tests - well storage, freezing and dual-axis line clears

use tetricus::core::line_clear::{collapse, detect};
use tetricus::core::{Board, Catalog, Progress};
use tetricus::types::{COLS, LOGICAL_ROWS};

fn fill_z_row(board: &mut Board, y: i8, z: i8) {
    for x in 0..COLS as i8 {
        board.set(x, y, z, 1);
    }
}

fn fill_x_row(board: &mut Board, y: i8, x: i8) {
    for z in 0..COLS as i8 {
        board.set(x, y, z, 1);
    }
}

#[test]
fn test_board_new_empty() {
    let board = Board::new();
    assert_eq!(board.width(), COLS);
    assert_eq!(board.depth(), COLS);
    assert_eq!(board.height(), LOGICAL_ROWS);

    for z in 0..COLS as i8 {
        for y in 0..LOGICAL_ROWS as i8 {
            for x in 0..COLS as i8 {
                assert_eq!(board.get(x, y, z), Some(0), "cell ({x}, {y}, {z})");
            }
        }
    }
    assert_eq!(board.occupied_count(), 0);
}

#[test]
fn test_board_get_out_of_bounds() {
    let board = Board::new();

    assert_eq!(board.get(-1, 0, 0), None);
    assert_eq!(board.get(0, -1, 0), None);
    assert_eq!(board.get(0, 0, -1), None);

    assert_eq!(board.get(COLS as i8, 0, 0), None);
    assert_eq!(board.get(0, LOGICAL_ROWS as i8, 0), None);
    assert_eq!(board.get(0, 0, COLS as i8), None);
}

#[test]
fn test_board_set_and_get() {
    let mut board = Board::new();

    assert!(board.set(5, 10, 3, 4));
    assert_eq!(board.get(5, 10, 3), Some(4));
    assert!(board.is_occupied(5, 10, 3));

    assert!(board.set(5, 10, 3, 0));
    assert!(!board.is_occupied(5, 10, 3));

    assert!(!board.set(0, LOGICAL_ROWS as i8, 0, 1));
    assert!(!board.set(COLS as i8, 0, 0, 1));
}

#[test]
fn test_freeze_writes_id_plus_one_and_skips_spawn_buffer() {
    let catalog = Catalog::standard();
    let mut board = Board::new();

    let t = catalog.instance(2).unwrap().moved(0, 5, 0);
    assert_eq!(board.freeze(&t), t.voxel_count());
    for (x, y, z) in t.cells() {
        assert_eq!(board.get(x, y, z), Some(3));
    }

    // One row of the bar sticks out above the well.
    let bar = catalog.instance(0).unwrap().moved(0, -1, 2);
    let mut board = Board::new();
    assert_eq!(board.freeze(&bar), 0);
    assert_eq!(board.occupied_count(), 0);
}

#[test]
fn test_single_z_row_clear_shifts_only_its_slice() {
    let mut board = Board::new();

    // Markers above the row in the same slice, row 9 left empty.
    for y in 0..9i8 {
        board.set(1, y, 2, (y + 1) as u8);
    }
    // A marker in a neighbouring slice that must not move.
    board.set(1, 5, 3, 9);
    fill_z_row(&mut board, 10, 2);

    let rows = detect(&board);
    assert_eq!(rows.line_count(), 1);
    let level = rows.level(10).unwrap();
    assert_eq!(level.z_rows.as_slice(), &[2]);
    assert!(level.x_rows.is_empty());

    let mut progress = Progress::new();
    let lines = collapse(&mut board, &rows);
    assert_eq!(lines, 1);
    let result = progress.record_clear(lines);
    assert_eq!(result.points, 1);
    assert_eq!(progress.sum_of_clear_lines(), 1);

    for x in 0..COLS as i8 {
        assert!(!board.is_occupied(x, 10, 2), "row y=10 should be empty");
    }
    for y in 0..9i8 {
        assert_eq!(board.get(1, y + 1, 2), Some((y + 1) as u8));
    }
    assert_eq!(board.get(1, 0, 2), Some(0));
    assert_eq!(board.get(1, 5, 3), Some(9));
    assert!(detect(&board).is_empty());
}

#[test]
fn test_crossing_rows_count_on_both_axes() {
    let mut board = Board::new();
    fill_z_row(&mut board, 16, 0);
    fill_x_row(&mut board, 16, 0);

    let rows = detect(&board);
    assert_eq!(rows.line_count(), 2);

    let lines = collapse(&mut board, &rows);
    assert_eq!(lines, 2);
    assert_eq!(board.occupied_count(), 0);
}

#[test]
fn test_clears_on_several_levels_collapse_together() {
    let mut board = Board::new();
    fill_z_row(&mut board, 17, 4);
    fill_z_row(&mut board, 15, 4);
    board.set(2, 14, 4, 7);
    board.set(2, 16, 4, 8);

    let rows = detect(&board);
    assert_eq!(rows.levels().len(), 2);
    // Bottom level first.
    assert_eq!(rows.levels()[0].y, 17);
    assert_eq!(collapse(&mut board, &rows), 2);

    assert_eq!(board.get(2, 17, 4), Some(8));
    assert_eq!(board.get(2, 16, 4), Some(7));
    assert_eq!(board.occupied_count(), 2);
}

#[test]
fn test_rotated_layout_quarter_turns() {
    let mut board = Board::new();
    board.set(0, 5, 0, 1);

    let turned = board.rotated_layout(1);
    assert_eq!(turned.get(COLS as i8 - 1, 5, 0), Some(1));
    assert_eq!(turned.occupied_count(), 1);

    assert_eq!(board.rotated_layout(4), board);
    assert_eq!(board.rotated_layout(2), turned.rotated_layout(1));
}
