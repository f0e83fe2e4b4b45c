use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub type TaskId = u64;
pub type UserId = u64;
pub type TagId = u64;
pub type ProjectId = u64;

/// One of the three fixed board columns.
///
/// The serialized names are the ones the board API stores, so they go over
/// the wire untouched.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    #[serde(rename = "Por Hacer")]
    ToDo,
    #[serde(rename = "En Progreso")]
    InProgress,
    #[serde(rename = "Hecho")]
    Done,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::ToDo, Column::InProgress, Column::Done];

    pub fn name(self) -> &'static str {
        match self {
            Column::ToDo => "Por Hacer",
            Column::InProgress => "En Progreso",
            Column::Done => "Hecho",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Column::ToDo => 0,
            Column::InProgress => 1,
            Column::Done => 2,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

impl User {
    /// Avatar letter: first character of the username, upper-cased.
    pub fn initial(&self) -> Option<String> {
        self.username
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub column: Column,
    #[serde(default)]
    pub position: Option<i64>,
    #[serde(default)]
    pub assigned_user: Option<User>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl Task {
    pub fn has_tag(&self, tag_id: TagId) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    pub fn assigned_user_id(&self) -> Option<UserId> {
        self.assigned_user.as_ref().map(|u| u.id)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// The full `{project, tasks}` payload held between reloads.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub project: Project,
    pub tasks: Vec<Task>,
}

impl BoardSnapshot {
    /// Drops repeated tag ids inside each task, keeping the first occurrence.
    pub fn normalized(mut self) -> Self {
        for task in &mut self.tasks {
            let mut seen = HashSet::new();
            task.tags.retain(|tag| seen.insert(tag.id));
        }
        self
    }

    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks of one column, in the order the API returned them.
    pub fn tasks_in(&self, column: Column) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(move |t| t.column == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_api_payload() {
        let raw = r##"{
            "project": {"id": 1, "code": "FAB-01", "name": "Mi Primer Proyecto Kanban"},
            "tasks": [
                {"id": 2, "title": "Diseñar el esquema", "description": "Definir tablas",
                 "column": "En Progreso", "position": 0,
                 "assigned_user": {"id": 2, "username": "viernes"},
                 "tags": [{"id": 2, "name": "feature", "color": "#0366d6"}]},
                {"id": 3, "title": "Crear la API", "description": null,
                 "column": "En Progreso", "position": 1, "assigned_user": null, "tags": []}
            ]
        }"##;
        let snapshot: BoardSnapshot = serde_json::from_str(raw).unwrap();
        assert_eq!(snapshot.project.code, "FAB-01");
        assert_eq!(snapshot.tasks[0].column, Column::InProgress);
        assert_eq!(snapshot.tasks[0].assigned_user_id(), Some(2));
        assert!(snapshot.tasks[1].assigned_user.is_none());
        assert!(snapshot.tasks[1].description.is_none());
    }

    #[test]
    fn rejects_unknown_column() {
        let raw = r#"{"id": 1, "title": "x", "column": "Backlog", "tags": []}"#;
        assert!(serde_json::from_str::<Task>(raw).is_err());
    }

    #[test]
    fn normalized_drops_duplicate_tags() {
        let tag = Tag {
            id: 7,
            name: "bug".into(),
            color: "#d73a4a".into(),
        };
        let snapshot = BoardSnapshot {
            project: Project {
                id: 1,
                code: "P".into(),
                name: None,
            },
            tasks: vec![Task {
                id: 1,
                title: "t".into(),
                description: None,
                column: Column::ToDo,
                position: None,
                assigned_user: None,
                tags: vec![tag.clone(), tag.clone()],
            }],
        }
        .normalized();
        assert_eq!(snapshot.tasks[0].tags, vec![tag]);
    }

    #[test]
    fn user_initial_is_uppercase() {
        let user = User {
            id: 1,
            username: "fabricio".into(),
        };
        assert_eq!(user.initial().as_deref(), Some("F"));
        let empty = User {
            id: 2,
            username: String::new(),
        };
        assert_eq!(empty.initial(), None);
    }
}
