//! Keyboard drag-and-drop over the rendered board.
//!
//! A picked-up card node travels through the columns as the user moves it;
//! dropping reports where it landed as a [`CardMoved`]. Only the view tree
//! is touched here, the snapshot is left alone.

use crate::model::{Column, TaskId};
use crate::view::BoardArea;

/// "Card `task_id` now sits at `index` in `column`."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardMoved {
    pub task_id: TaskId,
    pub column: Column,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    pub task_id: TaskId,
    origin: (usize, usize),
    current: (usize, usize),
}

impl DragState {
    pub fn pick(area: &BoardArea, task_id: TaskId) -> Option<Self> {
        let at = area.locate(task_id)?;
        Some(Self {
            task_id,
            origin: at,
            current: at,
        })
    }

    /// Current `(column index, card index)` of the dragged card.
    pub fn position(&self) -> (usize, usize) {
        self.current
    }

    /// Moves the card to a neighbouring column, keeping its row where possible.
    pub fn shift_column(&mut self, area: &mut BoardArea, delta: isize) {
        let columns = area.columns_mut();
        if columns.is_empty() {
            return;
        }
        let (ci, i) = self.current;
        let target = (ci as isize + delta).clamp(0, columns.len() as isize - 1) as usize;
        if target == ci {
            return;
        }
        let card = columns[ci].cards.remove(i);
        let index = i.min(columns[target].cards.len());
        columns[target].cards.insert(index, card);
        self.current = (target, index);
    }

    /// Moves the card past its next visible neighbour up or down.
    pub fn shift_row(&mut self, area: &mut BoardArea, delta: isize) {
        let (ci, i) = self.current;
        let Some(column) = area.columns_mut().get_mut(ci) else {
            return;
        };
        let neighbour = if delta < 0 {
            (0..i).rev().find(|&j| !column.cards[j].hidden)
        } else {
            (i + 1..column.cards.len()).find(|&j| !column.cards[j].hidden)
        };
        if let Some(j) = neighbour {
            let card = column.cards.remove(i);
            column.cards.insert(j, card);
            self.current = (ci, j);
        }
    }

    pub fn drop(self, area: &BoardArea) -> Option<CardMoved> {
        let (ci, index) = self.current;
        let column = area.columns().get(ci)?.column;
        Some(CardMoved {
            task_id: self.task_id,
            column,
            index,
        })
    }

    /// Puts the card back where it was picked up.
    pub fn cancel(self, area: &mut BoardArea) {
        let (ci, i) = self.current;
        let columns = area.columns_mut();
        if ci >= columns.len() || i >= columns[ci].cards.len() {
            return;
        }
        let card = columns[ci].cards.remove(i);
        let (oc, oi) = self.origin;
        let index = oi.min(columns[oc].cards.len());
        columns[oc].cards.insert(index, card);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BoardSnapshot, Project, Task};

    fn area() -> BoardArea {
        let task = |id, column| Task {
            id,
            title: format!("t{id}"),
            description: None,
            column,
            position: None,
            assigned_user: None,
            tags: vec![],
        };
        BoardArea::build(&BoardSnapshot {
            project: Project {
                id: 1,
                code: "P".into(),
                name: None,
            },
            tasks: vec![
                task(1, Column::ToDo),
                task(2, Column::ToDo),
                task(3, Column::InProgress),
            ],
        })
    }

    fn ids(area: &BoardArea, ci: usize) -> Vec<TaskId> {
        area.columns()[ci].cards.iter().map(|c| c.task_id).collect()
    }

    #[test]
    fn drop_into_other_column_reports_index() {
        let mut area = area();
        let mut drag = DragState::pick(&area, 2).unwrap();
        drag.shift_column(&mut area, 1);
        assert_eq!(ids(&area, 1), vec![3, 2]);
        assert_eq!(
            drag.drop(&area),
            Some(CardMoved {
                task_id: 2,
                column: Column::InProgress,
                index: 1
            })
        );
    }

    #[test]
    fn shift_row_skips_hidden_cards() {
        let mut area = area();
        let mut hidden = area.columns()[0].cards[0].clone();
        hidden.task_id = 9;
        hidden.hidden = true;
        let mut shown = area.columns()[0].cards[1].clone();
        shown.task_id = 8;
        area.columns_mut()[1].cards.extend([hidden, shown]);

        let mut drag = DragState::pick(&area, 3).unwrap();
        drag.shift_row(&mut area, 1);
        assert_eq!(ids(&area, 1), vec![9, 8, 3]);
        assert_eq!(drag.position(), (1, 2));
    }

    #[test]
    fn cancel_restores_origin() {
        let mut area = area();
        let mut drag = DragState::pick(&area, 1).unwrap();
        drag.shift_column(&mut area, 2);
        drag.shift_column(&mut area, -1);
        drag.cancel(&mut area);
        assert_eq!(ids(&area, 0), vec![1, 2]);
        assert_eq!(ids(&area, 1), vec![3]);
        assert!(area.columns()[2].cards.is_empty());
    }

    #[test]
    fn edges_are_clamped() {
        let mut area = area();
        let mut drag = DragState::pick(&area, 1).unwrap();
        drag.shift_column(&mut area, -1);
        drag.shift_row(&mut area, -1);
        assert_eq!(drag.position(), (0, 0));
    }
}
