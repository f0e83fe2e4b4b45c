//! The rendered board: what the terminal draws.
//!
//! Nodes are built from a snapshot by [`BoardArea::build`] and afterwards
//! only patched in place (card removal, title text, visibility, drag moves)
//! until the next full render.

use crate::detail::{collect_tags, collect_users};
use crate::filter::ActiveFilters;
use crate::model::{BoardSnapshot, Column, Tag, TagId, Task, TaskId, User, UserId};

pub const LOAD_ERROR: &str = "Error al cargar el tablero. Verifique el código del proyecto.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPill {
    pub id: TagId,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Avatar {
    pub initial: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardNode {
    pub task_id: TaskId,
    pub title: String,
    pub tags: Vec<TagPill>,
    pub avatar: Option<Avatar>,
    pub assigned_user: Option<UserId>,
    pub hidden: bool,
}

impl CardNode {
    pub fn from_task(task: &Task) -> Self {
        let avatar = task.assigned_user.as_ref().and_then(|user| {
            user.initial().map(|initial| Avatar {
                initial,
                username: user.username.clone(),
            })
        });
        Self {
            task_id: task.id,
            title: task.title.clone(),
            tags: task
                .tags
                .iter()
                .map(|t| TagPill {
                    id: t.id,
                    name: t.name.clone(),
                    color: t.color.clone(),
                })
                .collect(),
            avatar,
            assigned_user: task.assigned_user_id(),
            hidden: false,
        }
    }

    pub fn tag_ids(&self) -> Vec<TagId> {
        self.tags.iter().map(|t| t.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNode {
    pub column: Column,
    pub cards: Vec<CardNode>,
}

impl ColumnNode {
    /// Visible cards together with their index in `cards`.
    pub fn visible(&self) -> impl Iterator<Item = (usize, &CardNode)> {
        self.cards.iter().enumerate().filter(|(_, c)| !c.hidden)
    }

    pub fn visible_count(&self) -> usize {
        self.cards.iter().filter(|c| !c.hidden).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BoardArea {
    #[default]
    Empty,
    Error(String),
    Columns(Vec<ColumnNode>),
}

impl BoardArea {
    /// One column node per fixed column, cards in API order.
    pub fn build(snapshot: &BoardSnapshot) -> Self {
        let columns = Column::ALL
            .iter()
            .map(|&column| ColumnNode {
                column,
                cards: snapshot.tasks_in(column).map(CardNode::from_task).collect(),
            })
            .collect();
        BoardArea::Columns(columns)
    }

    pub fn columns(&self) -> &[ColumnNode] {
        match self {
            BoardArea::Columns(columns) => columns,
            _ => &[],
        }
    }

    pub fn columns_mut(&mut self) -> &mut [ColumnNode] {
        match self {
            BoardArea::Columns(columns) => columns,
            _ => &mut [],
        }
    }

    /// `(column index, card index)` of a card.
    pub fn locate(&self, task_id: TaskId) -> Option<(usize, usize)> {
        self.columns().iter().enumerate().find_map(|(ci, col)| {
            col.cards
                .iter()
                .position(|c| c.task_id == task_id)
                .map(|i| (ci, i))
        })
    }

    pub fn card(&self, task_id: TaskId) -> Option<&CardNode> {
        self.columns()
            .iter()
            .flat_map(|c| c.cards.iter())
            .find(|c| c.task_id == task_id)
    }

    pub fn card_mut(&mut self, task_id: TaskId) -> Option<&mut CardNode> {
        self.columns_mut()
            .iter_mut()
            .flat_map(|c| c.cards.iter_mut())
            .find(|c| c.task_id == task_id)
    }

    pub fn remove_card(&mut self, task_id: TaskId) -> bool {
        match self.locate(task_id) {
            Some((ci, i)) => {
                self.columns_mut()[ci].cards.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn apply_filters(&mut self, filters: &ActiveFilters) {
        for card in self.columns_mut().iter_mut().flat_map(|c| c.cards.iter_mut()) {
            card.hidden = !filters.admits(card.assigned_user, &card.tag_ids());
        }
    }

    pub fn card_count(&self) -> usize {
        self.columns().iter().map(|c| c.cards.len()).sum()
    }
}

/// Filter choices offered above the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterBar {
    pub users: Vec<User>,
    pub tags: Vec<Tag>,
}

impl FilterBar {
    pub fn from_snapshot(snapshot: &BoardSnapshot) -> Self {
        Self {
            users: collect_users(snapshot),
            tags: collect_tags(snapshot),
        }
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        self.users.iter().map(|u| u.id).collect()
    }

    pub fn tag_ids(&self) -> Vec<TagId> {
        self.tags.iter().map(|t| t.id).collect()
    }
}
