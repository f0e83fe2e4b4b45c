//! `BoardView`: the held snapshot, the rendered board and every user action.
//!
//! The API is authoritative. Actions queue a [`Request`] and return at once;
//! the answer comes back through [`BoardView::apply`]. Most mutations are
//! followed by a full reload; only deletion patches the rendered board
//! directly, and a title edit updates the visible text before the server
//! answers. A failed call is logged and raised as a [`Notice`].

use crate::api::BoardApi;
use crate::detail::{DetailPick, TaskDetail};
use crate::drag::{CardMoved, DragState};
use crate::error::ApiError;
use crate::filter::{cycle, ActiveFilters};
use crate::model::{BoardSnapshot, Column, TagId, TaskId, UserId};
use crate::request::{Outcome, Request};
use crate::view::{BoardArea, FilterBar, LOAD_ERROR};
use chrono::{DateTime, Local};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Blocking message that has to be dismissed before anything else happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub raised_at: DateTime<Local>,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            raised_at: Local::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleEdit {
    pub task_id: TaskId,
    pub original: String,
    pub buffer: String,
}

/// The "add card" form of one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composer {
    pub column: Column,
    pub buffer: String,
    /// A create request for this form is out.
    pub sending: bool,
}

pub struct BoardView<A> {
    api: Arc<A>,
    project_code: String,
    pub snapshot: Option<BoardSnapshot>,
    pub area: BoardArea,
    pub filter_bar: FilterBar,
    pub filters: ActiveFilters,
    pub detail: Option<TaskDetail>,
    /// An assignment or tag change is out; the detail waits for its reload.
    pub detail_syncing: bool,
    pub pending_delete: Option<TaskId>,
    pub title_edit: Option<TitleEdit>,
    pub composer: Option<Composer>,
    pub drag: Option<DragState>,
    pub notice: Option<Notice>,
    pub synced_at: Option<DateTime<Local>>,
    outbox: Vec<Request>,
    in_flight: usize,
}

impl<A: BoardApi> BoardView<A> {
    pub fn new(api: A, project_code: impl Into<String>) -> Self {
        Self {
            api: Arc::new(api),
            project_code: project_code.into(),
            snapshot: None,
            area: BoardArea::Empty,
            filter_bar: FilterBar::default(),
            filters: ActiveFilters::default(),
            detail: None,
            detail_syncing: false,
            pending_delete: None,
            title_edit: None,
            composer: None,
            drag: None,
            notice: None,
            synced_at: None,
            outbox: Vec::new(),
            in_flight: 0,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Handle for tasks that run requests off the input path.
    pub fn shared_api(&self) -> Arc<A> {
        Arc::clone(&self.api)
    }

    pub fn project_code(&self) -> &str {
        &self.project_code
    }

    pub fn project_title(&self) -> String {
        match &self.snapshot {
            Some(s) => s.project.name.clone().unwrap_or_else(|| s.project.code.clone()),
            None => self.project_code.clone(),
        }
    }

    // --- request plumbing ---

    fn send(&mut self, request: Request) {
        self.outbox.push(request);
    }

    /// Hands over the queued requests; each one is owed an [`apply`](Self::apply).
    pub fn take_requests(&mut self) -> Vec<Request> {
        let requests = std::mem::take(&mut self.outbox);
        self.in_flight += requests.len();
        requests
    }

    /// Whether any request is queued or unanswered.
    pub fn is_syncing(&self) -> bool {
        self.in_flight > 0 || !self.outbox.is_empty()
    }

    /// Runs queued requests inline until none are left.
    #[cfg(test)]
    pub(crate) async fn settle(&mut self) {
        loop {
            let requests = self.take_requests();
            if requests.is_empty() {
                return;
            }
            for request in requests {
                let outcome =
                    crate::request::execute(&*self.api, &self.project_code, request).await;
                self.apply(outcome);
            }
        }
    }

    /// Folds the answer to an earlier request into the view.
    pub fn apply(&mut self, outcome: Outcome) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match outcome {
            Outcome::Loaded { reopen, result } => self.on_loaded(reopen, result),
            Outcome::Moved { moved, result } => match result {
                Ok(()) => info!(
                    task = moved.task_id,
                    column = %moved.column,
                    position = moved.index,
                    "task moved"
                ),
                Err(err) => self.fail(
                    "No se pudo mover la tarea. Por favor, refresca la página.",
                    &err,
                ),
            },
            Outcome::Retitled { task_id, result } => match result {
                Ok(()) => info!(task = task_id, "title updated"),
                Err(err) => self.fail("No se pudo actualizar el título.", &err),
            },
            Outcome::Created {
                column,
                title,
                result,
            } => match result {
                Ok(()) => {
                    info!(column = %column, title = %title, "task created");
                    self.composer = None;
                    self.reload();
                }
                Err(err) => {
                    if let Some(composer) = self.composer.as_mut() {
                        composer.sending = false;
                    }
                    self.fail("No se pudo crear la tarea.", &err);
                }
            },
            Outcome::Deleted { task_id, result } => match result {
                Ok(()) => {
                    self.area.remove_card(task_id);
                    info!(task = task_id, "task deleted");
                }
                Err(err) => self.fail("No se pudo eliminar la tarea.", &err),
            },
            Outcome::DetailChanged { task_id, result } => match result {
                Ok(()) => {
                    info!(task = task_id, "task detail changed");
                    self.send(Request::Load {
                        reopen: Some(task_id),
                    });
                }
                Err(err) => {
                    self.detail_syncing = false;
                    self.fail("No se pudo actualizar la tarea.", &err);
                }
            },
        }
    }

    fn on_loaded(&mut self, reopen: Option<TaskId>, result: Result<BoardSnapshot, ApiError>) {
        if reopen.is_some() {
            self.detail_syncing = false;
        }
        match result {
            Ok(snapshot) => {
                info!(
                    project = %self.project_code,
                    tasks = snapshot.tasks.len(),
                    "board loaded"
                );
                self.snapshot = Some(snapshot);
                self.render();
                self.synced_at = Some(Local::now());
                if let Some(task_id) = reopen.or(self.detail.as_ref().map(|d| d.task_id)) {
                    self.reopen_detail(task_id);
                }
            }
            Err(err) => {
                warn!(project = %self.project_code, error = %err, "failed to load board");
                // Nothing shown from the old snapshot may stay on screen.
                self.area = BoardArea::Error(LOAD_ERROR.to_string());
                self.detail = None;
                self.pending_delete = None;
                self.title_edit = None;
                self.composer = None;
                self.drag = None;
            }
        }
    }

    fn reopen_detail(&mut self, task_id: TaskId) {
        let position = self
            .detail
            .as_ref()
            .filter(|d| d.task_id == task_id)
            .map(|d| (d.section, d.cursor));
        self.open_detail(task_id);
        if let (Some(detail), Some((section, cursor))) = (self.detail.as_mut(), position) {
            detail.restore_position(section, cursor);
        }
    }

    /// Queues a fetch of the whole board.
    pub fn reload(&mut self) {
        self.send(Request::Load { reopen: None });
    }

    /// Rebuilds the board and filter bar from the held snapshot.
    pub fn render(&mut self) {
        let Some(snapshot) = &self.snapshot else {
            return;
        };
        self.area = BoardArea::build(snapshot);
        self.filter_bar = FilterBar::from_snapshot(snapshot);
        self.title_edit = None;
        self.composer = None;
        self.drag = None;
        self.area.apply_filters(&self.filters);
    }

    fn fail(&mut self, message: &str, err: &ApiError) {
        error!(error = %err, "{message}");
        self.notice = Some(Notice::new(message));
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // --- drag reorder ---

    pub fn begin_drag(&mut self, task_id: TaskId) -> bool {
        self.drag = DragState::pick(&self.area, task_id);
        self.drag.is_some()
    }

    pub fn drag_by(&mut self, columns: isize, rows: isize) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        if columns != 0 {
            drag.shift_column(&mut self.area, columns);
        }
        if rows != 0 {
            drag.shift_row(&mut self.area, rows);
        }
    }

    pub fn cancel_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            drag.cancel(&mut self.area);
        }
    }

    pub fn drop_drag(&mut self) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if let Some(moved) = drag.drop(&self.area) {
            self.on_card_moved(moved);
        }
    }

    /// Persists a drop. The snapshot is not reordered; the next reload resyncs.
    pub fn on_card_moved(&mut self, moved: CardMoved) {
        self.send(Request::Move(moved));
    }

    // --- inline title edit ---

    pub fn begin_title_edit(&mut self, task_id: TaskId) {
        if let Some(card) = self.area.card(task_id) {
            self.title_edit = Some(TitleEdit {
                task_id,
                original: card.title.clone(),
                buffer: card.title.clone(),
            });
        }
    }

    /// Saves a changed, non-empty title. The card shows the new text
    /// whether or not the server accepts it.
    pub fn commit_title_edit(&mut self) {
        let Some(edit) = self.title_edit.take() else {
            return;
        };
        let title = edit.buffer.trim();
        if title.is_empty() || title == edit.original {
            return;
        }
        let title = title.to_string();
        if let Some(card) = self.area.card_mut(edit.task_id) {
            card.title = title.clone();
        }
        self.send(Request::Retitle {
            task_id: edit.task_id,
            title,
        });
    }

    // --- card creation ---

    pub fn open_composer(&mut self, column: Column) {
        if !self.area.columns().is_empty() {
            self.composer = Some(Composer {
                column,
                buffer: String::new(),
                sending: false,
            });
        }
    }

    pub fn cancel_composer(&mut self) {
        self.composer = None;
    }

    pub fn submit_composer(&mut self) {
        let Some(composer) = self.composer.as_mut() else {
            return;
        };
        let title = composer.buffer.trim().to_string();
        if title.is_empty() || composer.sending {
            return;
        }
        composer.sending = true;
        let column = composer.column;
        self.send(Request::Create { column, title });
    }

    // --- deletion ---

    pub fn request_delete(&mut self, task_id: TaskId) {
        if self.area.card(task_id).is_some() {
            self.pending_delete = Some(task_id);
        }
    }

    pub fn confirm_delete(&mut self, confirmed: bool) {
        let Some(task_id) = self.pending_delete.take() else {
            return;
        };
        if confirmed {
            self.send(Request::Delete(task_id));
        }
    }

    // --- detail view ---

    pub fn open_detail(&mut self, task_id: TaskId) {
        self.detail = self
            .snapshot
            .as_ref()
            .and_then(|s| TaskDetail::from_snapshot(s, task_id));
    }

    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn activate_detail_selection(&mut self) {
        match self.detail.as_ref().and_then(TaskDetail::selected) {
            Some(DetailPick::User(id)) => self.toggle_user(id),
            Some(DetailPick::Tag(id)) => self.toggle_tag(id),
            None => {}
        }
    }

    /// Task whose detail may be changed now. Marks shown while a change is
    /// out are not current yet, so a second toggle waits for the reload.
    fn detail_target(&self) -> Option<TaskId> {
        if self.detail_syncing {
            return None;
        }
        self.detail.as_ref().map(|d| d.task_id)
    }

    /// Assigns `user_id` to the open task, or clears it if already assigned.
    pub fn toggle_user(&mut self, user_id: UserId) {
        let Some(task_id) = self.detail_target() else {
            return;
        };
        let current = self
            .snapshot
            .as_ref()
            .and_then(|s| s.task(task_id))
            .and_then(|t| t.assigned_user_id());
        let user = if current == Some(user_id) {
            None
        } else {
            Some(user_id)
        };
        self.detail_syncing = true;
        self.send(Request::Assign { task_id, user });
    }

    pub fn toggle_tag(&mut self, tag_id: TagId) {
        let Some(task_id) = self.detail_target() else {
            return;
        };
        let remove = self
            .snapshot
            .as_ref()
            .and_then(|s| s.task(task_id))
            .is_some_and(|t| t.has_tag(tag_id));
        self.detail_syncing = true;
        self.send(Request::Tag {
            task_id,
            tag_id,
            remove,
        });
    }

    // --- filtering ---

    pub fn set_user_filter(&mut self, user: Option<UserId>) {
        self.filters.user = user;
        self.area.apply_filters(&self.filters);
    }

    pub fn set_tag_filter(&mut self, tag: Option<TagId>) {
        self.filters.tag = tag;
        self.area.apply_filters(&self.filters);
    }

    pub fn cycle_user_filter(&mut self) {
        let next = cycle(self.filters.user, &self.filter_bar.user_ids());
        self.set_user_filter(next);
    }

    pub fn cycle_tag_filter(&mut self) {
        let next = cycle(self.filters.tag, &self.filter_bar.tag_ids());
        self.set_tag_filter(next);
    }

    /// "Show all".
    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.area.apply_filters(&self.filters);
    }
}
