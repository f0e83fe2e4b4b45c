//! Plain-text views of a board for the non-interactive subcommands.

use crate::api::BoardApi;
use crate::config::Commands;
use crate::detail::{collect_tags, collect_users};
use crate::error::AppError;
use crate::model::{BoardSnapshot, Column};
use std::fmt::Write;

pub fn list_tasks(snapshot: &BoardSnapshot) -> String {
    let mut out = String::new();
    for column in Column::ALL {
        let _ = writeln!(out, "{column}:");
        for task in snapshot.tasks_in(column) {
            let tags: Vec<&str> = task.tags.iter().map(|t| t.name.as_str()).collect();
            let _ = write!(out, "- [{}] {}", task.id, task.title);
            if !tags.is_empty() {
                let _ = write!(out, " ({})", tags.join(", "));
            }
            if let Some(user) = &task.assigned_user {
                let _ = write!(out, " @{}", user.username);
            }
            out.push('\n');
        }
    }
    out
}

pub fn list_tags(snapshot: &BoardSnapshot) -> String {
    collect_tags(snapshot)
        .iter()
        .map(|t| format!("{}\t{}\t{}\n", t.id, t.name, t.color))
        .collect()
}

pub fn list_users(snapshot: &BoardSnapshot) -> String {
    collect_users(snapshot)
        .iter()
        .map(|u| format!("{}\t{}\n", u.id, u.username))
        .collect()
}

pub fn stats(snapshot: &BoardSnapshot) -> String {
    Column::ALL
        .iter()
        .map(|&c| format!("{}: {}\n", c, snapshot.tasks_in(c).count()))
        .collect()
}

/// Fetches the board once and renders the requested report.
pub async fn run<A: BoardApi>(
    api: &A,
    project_code: &str,
    command: Commands,
) -> Result<String, AppError> {
    let snapshot = api.fetch_board(project_code).await?;
    Ok(match command {
        Commands::List | Commands::Board => list_tasks(&snapshot),
        Commands::Tags => list_tags(&snapshot),
        Commands::Users => list_users(&snapshot),
        Commands::Stats => stats(&snapshot),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Project, Tag, Task, User};

    fn snapshot() -> BoardSnapshot {
        let feature = Tag {
            id: 2,
            name: "feature".into(),
            color: "#0366d6".into(),
        };
        let task = |id, title: &str, column, user: Option<&str>, tags: Vec<Tag>| Task {
            id,
            title: title.into(),
            description: None,
            column,
            position: None,
            assigned_user: user.map(|name| User {
                id: id * 10,
                username: name.into(),
            }),
            tags,
        };
        BoardSnapshot {
            project: Project {
                id: 1,
                code: "FAB-01".into(),
                name: None,
            },
            tasks: vec![
                task(1, "Configurar", Column::ToDo, Some("fabricio"), vec![]),
                task(2, "Diseñar", Column::InProgress, None, vec![feature.clone()]),
                task(3, "API", Column::InProgress, None, vec![feature]),
            ],
        }
    }

    #[test]
    fn list_groups_by_column() {
        let out = list_tasks(&snapshot());
        assert_eq!(
            out,
            "Por Hacer:\n- [1] Configurar @fabricio\nEn Progreso:\n- [2] Diseñar (feature)\n- [3] API (feature)\nHecho:\n"
        );
    }

    #[test]
    fn tags_are_listed_once() {
        assert_eq!(list_tags(&snapshot()), "2\tfeature\t#0366d6\n");
        assert_eq!(list_users(&snapshot()), "10\tfabricio\n");
    }

    #[test]
    fn stats_count_every_column() {
        assert_eq!(stats(&snapshot()), "Por Hacer: 1\nEn Progreso: 2\nHecho: 0\n");
    }
}
