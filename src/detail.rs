//! Task detail view and the user/tag lists shared with the filter bar.
//!
//! There is no endpoint listing a project's users or tags, so both lists are
//! gathered from the tasks of the current snapshot.

use crate::model::{BoardSnapshot, Tag, TagId, Task, TaskId, User, UserId};
use std::collections::HashSet;

pub const NO_DESCRIPTION: &str = "Sin descripción.";

/// Users assigned anywhere on the board, one entry per username.
pub fn collect_users(snapshot: &BoardSnapshot) -> Vec<User> {
    let mut seen = HashSet::new();
    snapshot
        .tasks
        .iter()
        .filter_map(|t| t.assigned_user.as_ref())
        .filter(|u| seen.insert(u.username.clone()))
        .cloned()
        .collect()
}

/// Tags used anywhere on the board, one entry per tag id.
pub fn collect_tags(snapshot: &BoardSnapshot) -> Vec<Tag> {
    let mut seen = HashSet::new();
    snapshot
        .tasks
        .iter()
        .flat_map(|t| t.tags.iter())
        .filter(|tag| seen.insert(tag.id))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailSection {
    Users,
    Tags,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChoice {
    pub user: User,
    pub assigned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagChoice {
    pub tag: Tag,
    pub assigned: bool,
}

/// What selecting the highlighted row of the detail view refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailPick {
    User(UserId),
    Tag(TagId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetail {
    pub task_id: TaskId,
    pub title: String,
    pub description: String,
    pub users: Vec<UserChoice>,
    pub tags: Vec<TagChoice>,
    pub section: DetailSection,
    pub cursor: usize,
}

impl TaskDetail {
    pub fn from_snapshot(snapshot: &BoardSnapshot, task_id: TaskId) -> Option<Self> {
        let task = snapshot.task(task_id)?;
        let users = collect_users(snapshot)
            .into_iter()
            .map(|user| UserChoice {
                assigned: task.assigned_user_id() == Some(user.id),
                user,
            })
            .collect();
        let tags = collect_tags(snapshot)
            .into_iter()
            .map(|tag| TagChoice {
                assigned: task.has_tag(tag.id),
                tag,
            })
            .collect();
        Some(Self {
            task_id,
            title: task.title.clone(),
            description: description_or_placeholder(task),
            users,
            tags,
            section: DetailSection::Users,
            cursor: 0,
        })
    }

    fn section_len(&self) -> usize {
        match self.section {
            DetailSection::Users => self.users.len(),
            DetailSection::Tags => self.tags.len(),
        }
    }

    pub fn switch_section(&mut self) {
        self.section = match self.section {
            DetailSection::Users => DetailSection::Tags,
            DetailSection::Tags => DetailSection::Users,
        };
        self.cursor = 0;
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let len = self.section_len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        self.cursor = (self.cursor as isize + delta).clamp(0, len as isize - 1) as usize;
    }

    pub fn selected(&self) -> Option<DetailPick> {
        match self.section {
            DetailSection::Users => self
                .users
                .get(self.cursor)
                .map(|c| DetailPick::User(c.user.id)),
            DetailSection::Tags => self.tags.get(self.cursor).map(|c| DetailPick::Tag(c.tag.id)),
        }
    }

    /// Keeps the highlighted row across a reopen after reload.
    pub fn restore_position(&mut self, section: DetailSection, cursor: usize) {
        self.section = section;
        self.cursor = cursor;
        let len = self.section_len();
        if self.cursor >= len {
            self.cursor = len.saturating_sub(1);
        }
    }
}

fn description_or_placeholder(task: &Task) -> String {
    match task.description.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => NO_DESCRIPTION.to_string(),
    }
}
