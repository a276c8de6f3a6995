use achot::grid::{CellRef, Direction, Grid};
use achot::row::{Field, ReportRow, calculate_itog};

fn labelled(labels: &[&str]) -> Grid {
    Grid::from_rows(labels.iter().map(|l| ReportRow::with_label(l)).collect())
}

fn labels(grid: &Grid) -> Vec<String> {
    grid.rows().iter().map(|r| r.sabablar.clone()).collect()
}

#[test]
fn new_grid_has_one_empty_row() {
    let grid = Grid::new();
    assert_eq!(grid.len(), 1);
    assert!(!grid.rows()[0].is_active());
    assert!(Grid::from_rows(Vec::new()).len() == 1);
}

#[test]
fn label_edits_are_verbatim() {
    let mut grid = Grid::new();
    assert!(grid.edit_cell(0, Field::Sabablar, "  Un, 2 qop "));
    assert_eq!(grid.rows()[0].sabablar, "  Un, 2 qop ");
}

#[test]
fn numeric_edits_strip_grouping() {
    let mut grid = Grid::new();
    assert!(grid.edit_cell(0, Field::Tovar, "1.500"));
    assert_eq!(grid.rows()[0].text(Field::Tovar), "1500");
    assert!(grid.edit_cell(0, Field::Tovar, ""));
    assert!(!grid.rows()[0].tovar.is_set());
}

#[test]
fn invalid_numeric_edits_are_ignored() {
    let mut grid = Grid::new();
    grid.edit_cell(0, Field::Ok, "200");
    assert!(!grid.edit_cell(0, Field::Ok, "2a0"));
    assert!(!grid.edit_cell(0, Field::Ok, "-5"));
    assert_eq!(grid.rows()[0].value(Field::Ok), 200);
    assert!(!grid.edit_cell(3, Field::Ok, "1"));
}

#[test]
fn totals_follow_edits() {
    let mut grid = Grid::new();
    grid.edit_cell(0, Field::Tovar, "1000");
    grid.edit_cell(0, Field::Ok, "200");
    grid.edit_cell(0, Field::Pul, "200");
    assert_eq!(grid.totals().itog, 600);
    grid.append_rows(1);
    grid.edit_cell(1, Field::Tovar, "400");
    assert_eq!(grid.totals().itog, 1000);
    assert_eq!(grid.totals().tovar, 1400);
}

#[test]
fn commit_and_advance_walks_fields_then_rows() {
    let mut grid = labelled(&["a", "b"]);
    assert_eq!(
        grid.navigate(0, Field::Sabablar, Direction::CommitAndAdvance),
        CellRef::new(0, Field::Tovar)
    );
    assert_eq!(
        grid.navigate(0, Field::KilikOzi, Direction::CommitAndAdvance),
        CellRef::new(1, Field::Sabablar)
    );
    assert_eq!(grid.len(), 2);
    assert_eq!(grid.focus(), Some(CellRef::new(1, Field::Sabablar)));
}

#[test]
fn commit_and_advance_on_last_cell_appends_a_row() {
    let mut grid = labelled(&["a", "b"]);
    let target = grid.navigate(1, Field::KilikOzi, Direction::CommitAndAdvance);
    assert_eq!(grid.len(), 3);
    assert_eq!(target, CellRef::new(2, Field::Sabablar));
    assert!(!grid.rows()[2].is_active());
}

#[test]
fn other_directions_never_grow_the_grid() {
    let mut grid = labelled(&["a", "b"]);
    assert_eq!(
        grid.navigate(1, Field::KilikOzi, Direction::NextField),
        CellRef::new(1, Field::KilikOzi)
    );
    assert_eq!(
        grid.navigate(1, Field::Ok, Direction::RowBelow),
        CellRef::new(1, Field::Ok)
    );
    assert_eq!(
        grid.navigate(0, Field::Ok, Direction::RowAbove),
        CellRef::new(0, Field::Ok)
    );
    assert_eq!(
        grid.navigate(1, Field::Sabablar, Direction::PrevField),
        CellRef::new(0, Field::KilikOzi)
    );
    assert_eq!(grid.len(), 2);
}

#[test]
fn append_adds_exactly_n_rows() {
    let mut grid = Grid::new();
    grid.edit_cell(0, Field::Sabablar, "Un");
    grid.edit_cell(0, Field::Tovar, "700");
    let before = grid.rows()[0].clone();
    assert_eq!(grid.append_rows(5), 5);
    assert_eq!(grid.rows()[0], before);
    assert_eq!(grid.len(), 6);
    assert_eq!(grid.append_rows(0), 0);
    assert_eq!(grid.len(), 6);
}

#[test]
fn deleting_the_sole_row_leaves_an_empty_one() {
    let mut grid = labelled(&["only"]);
    assert!(grid.delete_row(0));
    assert_eq!(grid.len(), 1);
    assert!(!grid.rows()[0].is_active());
}

#[test]
fn delete_row_reindexes_selection() {
    let mut grid = labelled(&["a", "b", "c", "d"]);
    grid.toggle_row(1);
    grid.toggle_row(3);
    assert!(grid.delete_row(0));
    assert_eq!(labels(&grid), vec!["b", "c", "d"]);
    assert_eq!(grid.selection().iter().copied().collect::<Vec<_>>(), vec![0, 2]);
    assert!(!grid.delete_row(10));
}

#[test]
fn delete_selected_removes_rows_and_clears_selection() {
    let mut grid = labelled(&["a", "b", "c", "d"]);
    grid.toggle_row(0);
    grid.toggle_row(2);
    assert_eq!(grid.delete_selected(), 2);
    assert_eq!(labels(&grid), vec!["b", "d"]);
    assert!(grid.selection().is_empty());
}

#[test]
fn delete_selected_everything_keeps_one_row() {
    let mut grid = labelled(&["a", "b"]);
    grid.toggle_all();
    assert_eq!(grid.delete_selected(), 2);
    assert_eq!(grid.len(), 1);
    assert!(!grid.rows()[0].is_active());
}

#[test]
fn toggles() {
    let mut grid = labelled(&["a", "b", "c"]);
    grid.toggle_row(1);
    grid.toggle_row(1);
    assert!(grid.selection().is_empty());
    grid.toggle_row(7);
    assert!(grid.selection().is_empty());

    grid.toggle_row(0);
    grid.toggle_all();
    assert_eq!(grid.selection().len(), 3);
    grid.toggle_all();
    assert!(grid.selection().is_empty());
}

#[test]
fn replace_rows_resets_selection_and_focus() {
    let mut grid = labelled(&["a", "b"]);
    grid.toggle_row(1);
    grid.set_focus(CellRef::new(1, Field::Ok));
    grid.replace_rows(vec![ReportRow::with_label("x")]);
    assert_eq!(labels(&grid), vec!["x"]);
    assert!(grid.selection().is_empty());
    assert_eq!(grid.focus(), None);
}

#[test]
fn totals_of_the_largest_accepted_amounts_stay_finite() {
    let mut grid = Grid::new();
    let max = i64::MAX.to_string();
    assert!(grid.edit_cell(0, Field::Tovar, &max));
    grid.append_rows(1);
    assert!(grid.edit_cell(1, Field::Tovar, &max));
    assert!(grid.edit_cell(1, Field::Ok, &max));
    assert!(grid.edit_cell(1, Field::Pul, &max));
    assert!(!grid.edit_cell(1, Field::Pul, "9223372036854775808"));

    let totals = grid.totals();
    assert_eq!(totals.tovar, i64::MAX);
    assert_eq!(totals.ok, i64::MAX);
    assert_eq!(calculate_itog(&grid.rows()[1]), 0);
    assert_eq!(totals.itog, i64::MAX);
}
