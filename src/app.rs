use crate::api::BoardApi;
use crate::board::BoardView;
use crate::model::{Column, TaskId};
use crate::request::{execute, Outcome};
use crate::ui::{self, CardPart, HitMap};
use crate::view::BoardArea;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::{backend::Backend, Terminal};
use std::io;
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

/// How long the input thread waits before checking whether the loop is gone.
const INPUT_POLL: Duration = Duration::from_millis(200);

/// Focused column and row; the row counts visible cards only.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub column: usize,
    pub row: usize,
}

impl Cursor {
    pub fn selected_task(&self, area: &BoardArea) -> Option<TaskId> {
        area.columns()
            .get(self.column)?
            .visible()
            .nth(self.row)
            .map(|(_, card)| card.task_id)
    }

    pub fn column(&self) -> Option<Column> {
        Column::ALL.get(self.column).copied()
    }

    pub fn clamp(&mut self, area: &BoardArea) {
        let visible = area
            .columns()
            .get(self.column)
            .map_or(0, |c| c.visible_count());
        self.row = self.row.min(visible.saturating_sub(1));
    }

    pub fn move_by(&mut self, area: &BoardArea, columns: isize, rows: isize) {
        let last_column = Column::ALL.len() as isize - 1;
        self.column = (self.column as isize + columns).clamp(0, last_column) as usize;
        self.row = (self.row as isize + rows).max(0) as usize;
        self.clamp(area);
    }

    pub fn focus(&mut self, area: &BoardArea, task_id: TaskId) {
        if let Some((ci, index)) = area.locate(task_id) {
            self.column = ci;
            self.row = area.columns()[ci]
                .cards
                .iter()
                .take(index)
                .filter(|c| !c.hidden)
                .count();
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<A> {
    pub view: BoardView<A>,
    pub cursor: Cursor,
    hits: HitMap,
}

impl<A: BoardApi> App<A> {
    pub fn new(view: BoardView<A>) -> Self {
        Self {
            view,
            cursor: Cursor::default(),
            hits: HitMap::default(),
        }
    }

    fn selected(&self) -> Option<TaskId> {
        self.cursor.selected_task(&self.view.area)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        let view = &mut self.view;

        if view.notice.is_some() {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                view.dismiss_notice();
            }
            return Flow::Continue;
        }

        if view.pending_delete.is_some() {
            match key.code {
                KeyCode::Char('s') | KeyCode::Char('y') => view.confirm_delete(true),
                KeyCode::Char('n') | KeyCode::Esc => view.confirm_delete(false),
                _ => {}
            }
            self.cursor.clamp(&self.view.area);
            return Flow::Continue;
        }

        if let Some(detail) = view.detail.as_mut() {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => detail.move_cursor(-1),
                KeyCode::Down | KeyCode::Char('j') => detail.move_cursor(1),
                KeyCode::Tab | KeyCode::BackTab => detail.switch_section(),
                KeyCode::Enter | KeyCode::Char(' ') => view.activate_detail_selection(),
                KeyCode::Esc | KeyCode::Char('q') => view.close_detail(),
                _ => {}
            }
            self.cursor.clamp(&self.view.area);
            return Flow::Continue;
        }

        if let Some(edit) = view.title_edit.as_mut() {
            match key.code {
                KeyCode::Char(c) => edit.buffer.push(c),
                KeyCode::Backspace => {
                    edit.buffer.pop();
                }
                // Esc leaves the input, which saves like a blur does.
                KeyCode::Enter | KeyCode::Esc => view.commit_title_edit(),
                _ => {}
            }
            return Flow::Continue;
        }

        if let Some(composer) = view.composer.as_mut() {
            match key.code {
                KeyCode::Char(c) => composer.buffer.push(c),
                KeyCode::Backspace => {
                    composer.buffer.pop();
                }
                KeyCode::Enter => view.submit_composer(),
                KeyCode::Esc => view.cancel_composer(),
                _ => {}
            }
            self.cursor.clamp(&self.view.area);
            return Flow::Continue;
        }

        if let Some(drag) = view.drag {
            match key.code {
                KeyCode::Left | KeyCode::Char('h') => view.drag_by(-1, 0),
                KeyCode::Right | KeyCode::Char('l') => view.drag_by(1, 0),
                KeyCode::Up | KeyCode::Char('k') => view.drag_by(0, -1),
                KeyCode::Down | KeyCode::Char('j') => view.drag_by(0, 1),
                KeyCode::Enter | KeyCode::Char('m') => view.drop_drag(),
                KeyCode::Esc => view.cancel_drag(),
                _ => {}
            }
            self.cursor.focus(&self.view.area, drag.task_id);
            return Flow::Continue;
        }

        match key.code {
            KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Left | KeyCode::Char('h') => self.cursor.move_by(&self.view.area, -1, 0),
            KeyCode::Right | KeyCode::Char('l') => self.cursor.move_by(&self.view.area, 1, 0),
            KeyCode::Up | KeyCode::Char('k') => self.cursor.move_by(&self.view.area, 0, -1),
            KeyCode::Down | KeyCode::Char('j') => self.cursor.move_by(&self.view.area, 0, 1),
            KeyCode::Enter => {
                if let Some(id) = self.selected() {
                    self.view.open_detail(id);
                }
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.selected() {
                    self.view.begin_title_edit(id);
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected() {
                    self.view.request_delete(id);
                }
            }
            KeyCode::Char('m') => {
                if let Some(id) = self.selected() {
                    self.view.begin_drag(id);
                }
            }
            KeyCode::Char('a') => {
                if let Some(column) = self.cursor.column() {
                    self.view.open_composer(column);
                }
            }
            KeyCode::Char('u') => self.view.cycle_user_filter(),
            KeyCode::Char('t') => self.view.cycle_tag_filter(),
            KeyCode::Char('c') => self.view.clear_filters(),
            KeyCode::Char('r') => self.view.reload(),
            _ => {}
        }
        self.cursor.clamp(&self.view.area);
        Flow::Continue
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
            return;
        }
        let view = &mut self.view;
        if view.notice.is_some() || view.pending_delete.is_some() || view.detail.is_some() {
            return;
        }
        let target = self.hits.card_at(mouse.column, mouse.row);

        if let Some(edit) = &view.title_edit {
            let same_title = target == Some((edit.task_id, CardPart::Title));
            if same_title {
                return;
            }
            view.commit_title_edit();
        }
        if view.drag.is_some() {
            return;
        }

        if let Some((task_id, part)) = target {
            self.cursor.focus(&self.view.area, task_id);
            match part {
                CardPart::Delete => self.view.request_delete(task_id),
                CardPart::Title => self.view.begin_title_edit(task_id),
                CardPart::Body => self.view.open_detail(task_id),
            }
        } else if let Some(column) = self.hits.add_button_at(mouse.column, mouse.row) {
            self.cursor.column = column.index();
            self.cursor.clamp(&self.view.area);
            self.view.open_composer(column);
        }
    }

    /// Folds a finished request into the view and keeps the cursor on a card.
    pub fn apply(&mut self, outcome: Outcome) {
        self.view.apply(outcome);
        self.cursor.clamp(&self.view.area);
    }
}

/// Starts every request the view has queued. Answers arrive on `done`.
fn dispatch<A: BoardApi + 'static>(view: &mut BoardView<A>, done: &UnboundedSender<Outcome>) {
    for request in view.take_requests() {
        debug!(?request, "dispatching request");
        let api = view.shared_api();
        let project_code = view.project_code().to_string();
        let done = done.clone();
        tokio::spawn(async move {
            let outcome = execute(&*api, &project_code, request).await;
            // The loop is gone once the receiver drops; the answer has no reader.
            let _ = done.send(outcome);
        });
    }
}

/// Reads terminal events on a plain thread so the loop can wait on them
/// alongside request answers.
fn spawn_input_reader() -> UnboundedReceiver<io::Result<Event>> {
    let (tx, rx) = mpsc::unbounded_channel();
    thread::spawn(move || loop {
        match event::poll(INPUT_POLL) {
            Ok(true) => {
                if tx.send(event::read()).is_err() {
                    break;
                }
            }
            Ok(false) => {
                if tx.is_closed() {
                    break;
                }
            }
            Err(err) => {
                let _ = tx.send(Err(err));
                break;
            }
        }
    });
    rx
}

pub async fn run_app<B: Backend, A: BoardApi + 'static>(
    terminal: &mut Terminal<B>,
    app: &mut App<A>,
) -> io::Result<()> {
    let (done, mut outcomes) = mpsc::unbounded_channel();
    let mut events = spawn_input_reader();
    app.view.reload();
    loop {
        dispatch(&mut app.view, &done);
        terminal.draw(|f| {
            app.hits = ui::draw(f, &app.view, &app.cursor);
        })?;

        tokio::select! {
            Some(outcome) = outcomes.recv() => app.apply(outcome),
            event = events.recv() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key) == Flow::Quit {
                        return Ok(());
                    }
                }
                Some(Ok(Event::Mouse(mouse))) => app.handle_mouse(mouse),
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err),
                None => return Ok(()),
            },
        }
    }
}
