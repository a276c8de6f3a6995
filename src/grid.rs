use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::marquee::{Marquee, Point, Press, RowLayout, Viewport};
use crate::row::{Amount, Field, ReportRow, Totals};

/// Position of the focused input.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct CellRef {
    pub row: usize,
    pub field: Field,
}

impl CellRef {
    pub fn new(row: usize, field: Field) -> Self {
        CellRef { row, field }
    }
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    NextField,
    PrevField,
    RowBelow,
    RowAbove,
    /// Enter: next field, wrapping to the next row and growing the grid at the end.
    CommitAndAdvance,
}

/// Ordered rows of the report being edited, plus selection and focus.
///
/// Always holds at least one row.
#[derive(Clone, Debug)]
pub struct Grid {
    rows: Vec<ReportRow>,
    selection: BTreeSet<usize>,
    focus: Option<CellRef>,
    marquee: Marquee,
}

impl Default for Grid {
    fn default() -> Self {
        Grid::new()
    }
}

impl Grid {
    pub fn new() -> Self {
        Grid {
            rows: vec![ReportRow::empty()],
            selection: BTreeSet::new(),
            focus: None,
            marquee: Marquee::Idle,
        }
    }

    pub fn from_rows(rows: Vec<ReportRow>) -> Self {
        let mut grid = Grid::new();
        grid.replace_rows(rows);
        grid
    }

    pub fn rows(&self) -> &[ReportRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn selection(&self) -> &BTreeSet<usize> {
        &self.selection
    }

    pub fn focus(&self) -> Option<CellRef> {
        self.focus
    }

    pub fn set_focus(&mut self, cell: CellRef) {
        if cell.row < self.rows.len() {
            self.focus = Some(cell);
        }
    }

    pub fn totals(&self) -> Totals {
        Totals::compute(&self.rows)
    }

    /// Swap in a whole new row set (load, new report, draft restore).
    pub fn replace_rows(&mut self, rows: Vec<ReportRow>) {
        self.rows = if rows.is_empty() {
            vec![ReportRow::empty()]
        } else {
            rows
        };
        self.selection.clear();
        self.focus = None;
        self.marquee = Marquee::Idle;
    }

    /// Apply a keystroke's worth of input to one cell.
    ///
    /// Returns false when the edit was rejected (bad row index, or a numeric
    /// field receiving something that is not a non-negative integer); the row
    /// is left as it was.
    pub fn edit_cell(&mut self, row: usize, field: Field, raw: &str) -> bool {
        let Some(target) = self.rows.get_mut(row) else {
            return false;
        };
        match target.amount_mut(field) {
            None => {
                target.sabablar = raw.to_string();
                true
            }
            Some(slot) => match Amount::parse(raw) {
                Some(amount) => {
                    *slot = amount;
                    true
                }
                None => false,
            },
        }
    }

    /// Move focus from `(row, field)`. Only commit-and-advance past the last
    /// cell changes the rows, by appending one empty row.
    pub fn navigate(&mut self, row: usize, field: Field, direction: Direction) -> CellRef {
        let last_row = self.rows.len() - 1;
        let row = row.min(last_row);

        let target = match direction {
            Direction::NextField => match field.next() {
                Some(next) => CellRef::new(row, next),
                None if row < last_row => CellRef::new(row + 1, Field::first()),
                None => CellRef::new(row, field),
            },
            Direction::PrevField => match field.prev() {
                Some(prev) => CellRef::new(row, prev),
                None if row > 0 => CellRef::new(row - 1, Field::last()),
                None => CellRef::new(row, field),
            },
            Direction::RowBelow => CellRef::new((row + 1).min(last_row), field),
            Direction::RowAbove => CellRef::new(row.saturating_sub(1), field),
            Direction::CommitAndAdvance => match field.next() {
                Some(next) => CellRef::new(row, next),
                None => {
                    if row == last_row {
                        self.rows.push(ReportRow::empty());
                    }
                    CellRef::new(row + 1, Field::first())
                }
            },
        };
        self.focus = Some(target);
        target
    }

    /// Append `count` empty rows; zero is a no-op.
    pub fn append_rows(&mut self, count: usize) -> usize {
        self.rows
            .extend(std::iter::repeat_with(ReportRow::empty).take(count));
        count
    }

    pub fn delete_row(&mut self, index: usize) -> bool {
        if index >= self.rows.len() {
            return false;
        }
        if self.rows.len() == 1 {
            self.rows[0] = ReportRow::empty();
        } else {
            self.rows.remove(index);
        }
        // indices after the removed row shift down by one
        self.selection = self
            .selection
            .iter()
            .filter(|i| **i != index)
            .map(|i| if *i > index { i - 1 } else { *i })
            .collect();
        self.clamp_focus();
        true
    }

    /// Delete every selected row and clear the selection. Returns the number
    /// of rows removed.
    pub fn delete_selected(&mut self) -> usize {
        let selected = std::mem::take(&mut self.selection);
        let before = self.rows.len();
        let mut index = 0;
        self.rows.retain(|_| {
            let keep = !selected.contains(&index);
            index += 1;
            keep
        });
        let removed = before - self.rows.len();
        if self.rows.is_empty() {
            self.rows.push(ReportRow::empty());
        }
        self.clamp_focus();
        removed
    }

    pub fn toggle_row(&mut self, index: usize) {
        if index >= self.rows.len() {
            return;
        }
        if !self.selection.remove(&index) {
            self.selection.insert(index);
        }
    }

    /// Select every row, or clear when every row is already selected.
    pub fn toggle_all(&mut self) {
        if self.selection.len() == self.rows.len() {
            self.selection.clear();
        } else {
            self.selection = (0..self.rows.len()).collect();
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn is_dragging(&self) -> bool {
        self.marquee.is_dragging()
    }

    /// Pointer pressed inside the grid body. Returns whether a marquee drag
    /// started.
    pub fn pointer_down(&mut self, press: &Press, viewport: &Viewport, layout: &impl RowLayout) -> bool {
        if !self.marquee.press(press, viewport, &self.selection) {
            return false;
        }
        self.apply_marquee(viewport, layout);
        true
    }

    /// Pointer moved anywhere on the page.
    pub fn pointer_move(&mut self, at: Point, viewport: &Viewport, layout: &impl RowLayout) {
        if let Some(selected) = self.marquee.pointer_moved(at, viewport, layout) {
            self.select_swept(selected);
        }
    }

    /// Pointer released anywhere on the page; the selection stays.
    pub fn pointer_up(&mut self) -> bool {
        self.marquee.release()
    }

    /// One auto-scroll timer tick. Scrolls `viewport` when the pointer is near
    /// an edge during a drag and returns the applied delta.
    pub fn auto_scroll_tick(&mut self, viewport: &mut Viewport, layout: &impl RowLayout) -> f64 {
        let delta = self.marquee.scroll_delta(viewport);
        if delta != 0.0 {
            viewport.scroll_top = (viewport.scroll_top + delta).clamp(0.0, viewport.max_scroll);
            self.apply_marquee(viewport, layout);
        }
        delta
    }

    fn apply_marquee(&mut self, viewport: &Viewport, layout: &impl RowLayout) {
        if let Some(selected) = self.marquee.selection(viewport, layout) {
            self.select_swept(selected);
        }
    }

    /// The layout may report more rows than the grid holds.
    fn select_swept(&mut self, mut selected: BTreeSet<usize>) {
        let len = self.rows.len();
        selected.retain(|&i| i < len);
        self.selection = selected;
    }

    fn clamp_focus(&mut self) {
        if let Some(cell) = self.focus {
            if cell.row >= self.rows.len() {
                self.focus = Some(CellRef::new(self.rows.len() - 1, cell.field));
            }
        }
    }
}
