use crate::api::BoardApi;
use crate::app::Cursor;
use crate::board::BoardView;
use crate::detail::{DetailSection, TaskDetail};
use crate::model::{Column, TaskId};
use crate::view::{BoardArea, CardNode, ColumnNode};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

/// Rows taken by one card: title, tags and avatar, spacer.
pub const CARD_HEIGHT: u16 = 3;
const ADD_CARD: &str = "+ Añadir tarjeta";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardPart {
    Delete,
    Title,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardHit {
    pub task_id: TaskId,
    pub area: Rect,
}

impl CardHit {
    pub fn part_at(&self, x: u16, y: u16) -> Option<CardPart> {
        let a = self.area;
        if x < a.x || x >= a.x + a.width || y < a.y || y >= a.y + a.height {
            return None;
        }
        if y == a.y {
            if x < a.x + 2 {
                Some(CardPart::Delete)
            } else {
                Some(CardPart::Title)
            }
        } else {
            Some(CardPart::Body)
        }
    }
}

/// Screen regions of the last frame, used to resolve mouse clicks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HitMap {
    pub cards: Vec<CardHit>,
    pub add_buttons: Vec<(Column, Rect)>,
}

impl HitMap {
    pub fn card_at(&self, x: u16, y: u16) -> Option<(TaskId, CardPart)> {
        self.cards
            .iter()
            .find_map(|hit| hit.part_at(x, y).map(|part| (hit.task_id, part)))
    }

    pub fn add_button_at(&self, x: u16, y: u16) -> Option<Column> {
        self.add_buttons
            .iter()
            .find(|(_, r)| x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height)
            .map(|(c, _)| *c)
    }
}

pub fn draw<A: BoardApi>(f: &mut Frame, view: &BoardView<A>, cursor: &Cursor) -> HitMap {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_header(f, view, chunks[0]);
    draw_filter_bar(f, view, chunks[1]);
    let hits = match &view.area {
        BoardArea::Columns(columns) => draw_columns(f, view, columns, cursor, chunks[2]),
        BoardArea::Error(message) => {
            let p = Paragraph::new(message.as_str())
                .style(Style::default().fg(Color::Red))
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL));
            f.render_widget(p, chunks[2]);
            HitMap::default()
        }
        BoardArea::Empty => {
            let p = Paragraph::new("Cargando tablero...").alignment(Alignment::Center);
            f.render_widget(p, chunks[2]);
            HitMap::default()
        }
    };
    draw_footer(f, view, chunks[3]);

    if let Some(detail) = &view.detail {
        draw_detail(f, detail);
    }
    if view.pending_delete.is_some() {
        draw_popup(
            f,
            "Confirmar",
            "¿Estás seguro de que quieres eliminar esta tarea? (s/n)",
            Color::Yellow,
        );
    }
    if let Some(notice) = &view.notice {
        let text = format!(
            "{}\n\n[{}]  Enter para continuar",
            notice.message,
            notice.raised_at.format("%H:%M:%S")
        );
        draw_popup(f, "Error", &text, Color::Red);
    }
    hits
}

fn draw_header<A: BoardApi>(f: &mut Frame, view: &BoardView<A>, area: Rect) {
    let mut spans = vec![
        Span::styled(
            view.project_title(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  [{}]", view.project_code())),
    ];
    if view.is_syncing() {
        spans.push(Span::styled("  sincronizando...", Style::default().fg(Color::Yellow)));
    } else if let Some(at) = view.synced_at {
        spans.push(Span::styled(
            format!("  sincronizado {}", at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_filter_bar<A: BoardApi>(f: &mut Frame, view: &BoardView<A>, area: Rect) {
    let active = Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let pick = |on: bool| if on { active } else { Style::default() };

    let mut spans = vec![Span::raw("Usuario: ")];
    spans.push(Span::styled("todos", pick(view.filters.user.is_none())));
    for user in &view.filter_bar.users {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            user.username.clone(),
            pick(view.filters.user == Some(user.id)),
        ));
    }
    spans.push(Span::raw("   Etiqueta: "));
    spans.push(Span::styled("todas", pick(view.filters.tag.is_none())));
    for tag in &view.filter_bar.tags {
        spans.push(Span::raw(" "));
        let style = if view.filters.tag == Some(tag.id) {
            active
        } else {
            Style::default().fg(tag_color(&tag.color))
        };
        spans.push(Span::styled(tag.name.clone(), style));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_columns<A: BoardApi>(
    f: &mut Frame,
    view: &BoardView<A>,
    columns: &[ColumnNode],
    cursor: &Cursor,
    area: Rect,
) -> HitMap {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(area);

    let mut hits = HitMap::default();
    for (i, column) in columns.iter().enumerate() {
        let focused = cursor.column == i;
        let block = Block::default()
            .title(format!("{} ({})", column.column, column.visible_count()))
            .borders(Borders::ALL)
            .border_style(if focused {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            });
        let inner = block.inner(chunks[i]);
        f.render_widget(block, chunks[i]);
        if inner.height == 0 {
            continue;
        }

        // Last row holds the "add card" affordance or the open form.
        let cards_height = inner.height.saturating_sub(1);
        let capacity = (cards_height / CARD_HEIGHT).max(1) as usize;
        let selected_row = if focused { Some(cursor.row) } else { None };
        let skip = selected_row
            .filter(|&r| r >= capacity)
            .map_or(0, |r| r + 1 - capacity);

        for (slot, (row, card)) in column
            .visible()
            .enumerate()
            .skip(skip)
            .take(capacity)
            .map(|(row, (_, card))| (row, card))
            .enumerate()
        {
            let y = inner.y + slot as u16 * CARD_HEIGHT;
            if y + CARD_HEIGHT > inner.y + cards_height {
                break;
            }
            let rect = Rect::new(inner.x, y, inner.width, CARD_HEIGHT);
            let selected = selected_row == Some(row);
            draw_card(f, view, card, selected, rect);
            hits.cards.push(CardHit {
                task_id: card.task_id,
                area: rect,
            });
        }

        let footer = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);
        match &view.composer {
            Some(composer) if composer.column == column.column => {
                let mut spans = vec![
                    Span::styled("> ", Style::default().fg(Color::Green)),
                    Span::raw(composer.buffer.clone()),
                ];
                if composer.sending {
                    spans.push(Span::styled(" (guardando)", Style::default().fg(Color::Yellow)));
                }
                let line = Line::from(spans);
                f.render_widget(Paragraph::new(line), footer);
                let x = footer.x + 2 + composer.buffer.chars().count() as u16;
                let x = x.min(footer.x + footer.width.saturating_sub(1));
                f.set_cursor_position((x, footer.y));
            }
            _ => {
                f.render_widget(
                    Paragraph::new(ADD_CARD).style(Style::default().fg(Color::DarkGray)),
                    footer,
                );
                hits.add_buttons.push((column.column, footer));
            }
        }
    }
    hits
}

fn draw_card<A: BoardApi>(
    f: &mut Frame,
    view: &BoardView<A>,
    card: &CardNode,
    selected: bool,
    area: Rect,
) {
    let dragging = view.drag.is_some_and(|d| d.task_id == card.task_id);
    let editing = view
        .title_edit
        .as_ref()
        .filter(|e| e.task_id == card.task_id);

    let mut title_style = Style::default().fg(Color::White);
    if selected {
        title_style = title_style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
    }
    if dragging {
        title_style = title_style.fg(Color::Yellow);
    }

    let title_line = match editing {
        Some(edit) => Line::from(vec![
            Span::styled("× ", Style::default().fg(Color::Red)),
            Span::styled(
                edit.buffer.clone(),
                Style::default().add_modifier(Modifier::UNDERLINED),
            ),
        ]),
        None => Line::from(vec![
            Span::styled("× ", Style::default().fg(Color::Red)),
            Span::styled(card.title.clone(), title_style),
        ]),
    };

    let mut footer = vec![Span::raw("  ")];
    for tag in &card.tags {
        footer.push(Span::styled(
            format!(" {} ", tag.name),
            Style::default().fg(Color::Black).bg(tag_color(&tag.color)),
        ));
        footer.push(Span::raw(" "));
    }
    if let Some(avatar) = &card.avatar {
        footer.push(Span::styled(
            format!("({})", avatar.initial),
            Style::default().fg(Color::Magenta),
        ));
    }

    let text = Text::from(vec![title_line, Line::from(footer)]);
    f.render_widget(Paragraph::new(text), area);

    if let Some(edit) = editing {
        let x = area.x + 2 + edit.buffer.chars().count() as u16;
        f.set_cursor_position((x.min(area.x + area.width.saturating_sub(1)), area.y));
    }
}

fn draw_detail(f: &mut Frame, detail: &TaskDetail) {
    let area = centered_rect(60, 70, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(detail.title.clone())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(4),
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(detail.description.as_str()).wrap(Wrap { trim: true }),
        chunks[0],
    );

    let marker = |on: bool| if on { "[x] " } else { "[ ] " };
    let highlight = |section: DetailSection, i: usize| {
        if detail.section == section && detail.cursor == i {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default()
        }
    };

    let users: Vec<ListItem> = detail
        .users
        .iter()
        .enumerate()
        .map(|(i, c)| {
            ListItem::new(format!("{}{}", marker(c.assigned), c.user.username))
                .style(highlight(DetailSection::Users, i))
        })
        .collect();
    f.render_widget(
        List::new(users).block(section_block(
            "Asignar usuario",
            detail.section == DetailSection::Users,
        )),
        chunks[1],
    );

    let tags: Vec<ListItem> = detail
        .tags
        .iter()
        .enumerate()
        .map(|(i, c)| {
            ListItem::new(Line::from(vec![
                Span::raw(marker(c.assigned)),
                Span::styled(c.tag.name.clone(), Style::default().fg(tag_color(&c.tag.color))),
            ]))
            .style(highlight(DetailSection::Tags, i))
        })
        .collect();
    f.render_widget(
        List::new(tags).block(section_block(
            "Etiquetas",
            detail.section == DetailSection::Tags,
        )),
        chunks[2],
    );
}

fn section_block(title: &str, focused: bool) -> Block<'_> {
    Block::default()
        .title(title)
        .borders(Borders::TOP)
        .border_style(if focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        })
}

fn draw_popup(f: &mut Frame, title: &str, message: &str, color: Color) {
    let area = centered_rect(50, 25, f.area());
    f.render_widget(Clear, area);
    let p = Paragraph::new(message)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
    f.render_widget(p, area);
}

fn draw_footer<A: BoardApi>(f: &mut Frame, view: &BoardView<A>, area: Rect) {
    let hints = if view.notice.is_some() {
        "Enter/Esc cerrar"
    } else if view.pending_delete.is_some() {
        "s confirmar · n cancelar"
    } else if view.detail.is_some() {
        "↑↓ mover · Tab usuarios/etiquetas · Enter alternar · Esc cerrar"
    } else if view.drag.is_some() {
        "←→↑↓ mover tarjeta · Enter soltar · Esc cancelar"
    } else if view.title_edit.is_some() || view.composer.is_some() {
        "Enter guardar · Esc salir"
    } else {
        "←→↑↓ mover · Enter detalle · e título · a añadir · d eliminar · m arrastrar · u/t filtrar · c todo · r recargar · q salir"
    };
    f.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

/// Tag colours arrive as `#rrggbb`; anything else falls back to gray.
pub fn tag_color(raw: &str) -> Color {
    raw.parse::<Color>().unwrap_or(Color::Gray)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{NewTask, TaskUpdate};
    use crate::error::ApiError;
    use crate::model::{BoardSnapshot, Project, TagId, Task, User};
    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, Terminal};

    struct OfflineApi;

    fn offline() -> ApiError {
        ApiError::Status {
            method: "GET",
            url: "http://offline".into(),
            status: 503,
        }
    }

    #[async_trait]
    impl BoardApi for OfflineApi {
        async fn fetch_board(&self, _code: &str) -> Result<BoardSnapshot, ApiError> {
            Err(offline())
        }
        async fn update_task(&self, _id: TaskId, _update: &TaskUpdate) -> Result<(), ApiError> {
            Err(offline())
        }
        async fn delete_task(&self, _id: TaskId) -> Result<(), ApiError> {
            Err(offline())
        }
        async fn create_task(&self, _task: &NewTask) -> Result<(), ApiError> {
            Err(offline())
        }
        async fn add_tag(&self, _task: TaskId, _tag: TagId) -> Result<(), ApiError> {
            Err(offline())
        }
        async fn remove_tag(&self, _task: TaskId, _tag: TagId) -> Result<(), ApiError> {
            Err(offline())
        }
    }

    fn rendered_view() -> BoardView<OfflineApi> {
        let task = |id, column| Task {
            id,
            title: format!("Tarea {id}"),
            description: None,
            column,
            position: None,
            assigned_user: Some(User {
                id: 1,
                username: "fabricio".into(),
            }),
            tags: vec![],
        };
        let mut view = BoardView::new(OfflineApi, "FAB-01");
        view.snapshot = Some(BoardSnapshot {
            project: Project {
                id: 1,
                code: "FAB-01".into(),
                name: Some("Mi Primer Proyecto Kanban".into()),
            },
            tasks: vec![task(1, Column::ToDo), task(2, Column::ToDo), task(3, Column::Done)],
        });
        view.render();
        view
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn draws_columns_and_records_card_regions() {
        let view = rendered_view();
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        let mut hits = HitMap::default();
        terminal
            .draw(|f| hits = draw(f, &view, &Cursor::default()))
            .unwrap();

        let text = screen(&terminal);
        assert!(text.contains("Por Hacer (2)"));
        assert!(text.contains("En Progreso (0)"));
        assert!(text.contains("Tarea 3"));
        assert_eq!(hits.cards.len(), 3);
        assert_eq!(hits.add_buttons.len(), 3);
        let first = hits.cards[0];
        assert_eq!(
            hits.card_at(first.area.x + 4, first.area.y),
            Some((1, CardPart::Title))
        );
    }

    #[tokio::test]
    async fn failed_load_draws_error_only() {
        let mut view = rendered_view();
        view.reload();
        view.settle().await;
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        let mut hits = HitMap::default();
        terminal
            .draw(|f| hits = draw(f, &view, &Cursor::default()))
            .unwrap();

        let text = screen(&terminal);
        assert!(text.contains("Error al cargar el tablero"));
        assert!(!text.contains("Tarea 1"));
        assert!(hits.cards.is_empty());
    }

    #[test]
    fn queued_request_shows_sync_marker() {
        let mut view = rendered_view();
        view.begin_title_edit(1);
        view.title_edit.as_mut().unwrap().buffer = "Tarea renombrada".into();
        view.commit_title_edit();
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal
            .draw(|f| {
                draw(f, &view, &Cursor::default());
            })
            .unwrap();

        let text = screen(&terminal);
        assert!(text.contains("sincronizando..."));
        assert!(text.contains("Tarea renombrada"));
    }

    #[test]
    fn card_regions_resolve() {
        let hit = CardHit {
            task_id: 5,
            area: Rect::new(10, 4, 20, CARD_HEIGHT),
        };
        assert_eq!(hit.part_at(10, 4), Some(CardPart::Delete));
        assert_eq!(hit.part_at(15, 4), Some(CardPart::Title));
        assert_eq!(hit.part_at(15, 5), Some(CardPart::Body));
        assert_eq!(hit.part_at(9, 4), None);
        assert_eq!(hit.part_at(15, 7), None);
    }

    #[test]
    fn hex_colors_parse() {
        assert_eq!(tag_color("#d73a4a"), Color::Rgb(0xd7, 0x3a, 0x4a));
        assert_eq!(tag_color("not a colour"), Color::Gray);
    }

    #[test]
    fn add_button_lookup() {
        let map = HitMap {
            cards: vec![],
            add_buttons: vec![(Column::Done, Rect::new(0, 9, 10, 1))],
        };
        assert_eq!(map.add_button_at(3, 9), Some(Column::Done));
        assert_eq!(map.add_button_at(3, 8), None);
    }
}
