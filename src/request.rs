//! Network work queued by [`BoardView`](crate::board::BoardView) and the
//! results it gets back.
//!
//! The view never awaits the API itself. Each action pushes a [`Request`];
//! the event loop runs it with [`execute`] on a spawned task and hands the
//! [`Outcome`] back to the view, so input keeps flowing while a call is out.

use crate::api::{BoardApi, NewTask, TaskUpdate};
use crate::drag::CardMoved;
use crate::error::ApiError;
use crate::model::{BoardSnapshot, Column, TagId, TaskId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Fetch the whole board; `reopen` names a detail view to rebuild afterwards.
    Load { reopen: Option<TaskId> },
    Move(CardMoved),
    Retitle { task_id: TaskId, title: String },
    Create { column: Column, title: String },
    Delete(TaskId),
    Assign { task_id: TaskId, user: Option<UserId> },
    Tag { task_id: TaskId, tag_id: TagId, remove: bool },
}

#[derive(Debug)]
pub enum Outcome {
    Loaded {
        reopen: Option<TaskId>,
        result: Result<BoardSnapshot, ApiError>,
    },
    Moved {
        moved: CardMoved,
        result: Result<(), ApiError>,
    },
    Retitled {
        task_id: TaskId,
        result: Result<(), ApiError>,
    },
    Created {
        column: Column,
        title: String,
        result: Result<(), ApiError>,
    },
    Deleted {
        task_id: TaskId,
        result: Result<(), ApiError>,
    },
    DetailChanged {
        task_id: TaskId,
        result: Result<(), ApiError>,
    },
}

/// Performs one request against the API.
pub async fn execute<A>(api: &A, project_code: &str, request: Request) -> Outcome
where
    A: BoardApi + ?Sized,
{
    match request {
        Request::Load { reopen } => Outcome::Loaded {
            reopen,
            result: api.fetch_board(project_code).await,
        },
        Request::Move(moved) => {
            let update = TaskUpdate::moved(moved.column, moved.index);
            Outcome::Moved {
                moved,
                result: api.update_task(moved.task_id, &update).await,
            }
        }
        Request::Retitle { task_id, title } => Outcome::Retitled {
            task_id,
            result: api.update_task(task_id, &TaskUpdate::title(title)).await,
        },
        Request::Create { column, title } => {
            let result = create(api, project_code, column, &title).await;
            Outcome::Created {
                column,
                title,
                result,
            }
        }
        Request::Delete(task_id) => Outcome::Deleted {
            task_id,
            result: api.delete_task(task_id).await,
        },
        Request::Assign { task_id, user } => Outcome::DetailChanged {
            task_id,
            result: api.update_task(task_id, &TaskUpdate::assign(user)).await,
        },
        Request::Tag {
            task_id,
            tag_id,
            remove,
        } => {
            let result = if remove {
                api.remove_tag(task_id, tag_id).await
            } else {
                api.add_tag(task_id, tag_id).await
            };
            Outcome::DetailChanged { task_id, result }
        }
    }
}

// The project id is looked up fresh rather than taken from the held snapshot.
async fn create<A>(api: &A, project_code: &str, column: Column, title: &str) -> Result<(), ApiError>
where
    A: BoardApi + ?Sized,
{
    let project_id = api.fetch_board(project_code).await?.project.id;
    let task = NewTask {
        title: title.to_string(),
        project_id,
        column,
    };
    api.create_task(&task).await
}
