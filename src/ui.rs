use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;

use crate::app::{App, Command, FormField, Modal, TaskForm};
use crate::storage::KeyValueStore;
use crate::view::{BoardView, ColumnView};

const SIDEBAR_WIDTH: u16 = 26;

#[derive(Debug, Clone, Copy)]
struct Palette {
    fg: Color,
    bg: Color,
    accent: Color,
    muted: Color,
}

impl Palette {
    fn for_view(view: &BoardView) -> Self {
        if view.light_theme {
            Self {
                fg: Color::Black,
                bg: Color::White,
                accent: Color::Blue,
                muted: Color::DarkGray,
            }
        } else {
            Self {
                fg: Color::White,
                bg: Color::Reset,
                accent: Color::Cyan,
                muted: Color::Gray,
            }
        }
    }

    fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }
}

pub fn run_app<B: Backend, S: KeyValueStore>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    while !app.should_quit() {
        let view = app.view();
        terminal.draw(|f| draw(f, &view))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(command) = command_for_key(key, &app.state().modal) {
                app.dispatch(command);
            }
        }
    }
    Ok(())
}

pub fn command_for_key(key: KeyEvent, modal: &Modal) -> Option<Command> {
    if modal.is_open() {
        return modal_command(key, modal);
    }

    let command = match key.code {
        KeyCode::Char('q') => Command::Quit,
        KeyCode::Char('n') => Command::OpenAddModal,
        KeyCode::Char('s') => Command::ToggleSidebar,
        KeyCode::Char('t') => Command::ToggleTheme,
        KeyCode::Char('[') => Command::PrevBoard,
        KeyCode::Char(']') => Command::NextBoard,
        KeyCode::Char(c @ '1'..='9') => Command::SelectBoard(c as usize - '1' as usize),
        KeyCode::Left | KeyCode::Char('h') => Command::ColumnLeft,
        KeyCode::Right | KeyCode::Char('l') => Command::ColumnRight,
        KeyCode::Up | KeyCode::Char('k') => Command::CardUp,
        KeyCode::Down | KeyCode::Char('j') => Command::CardDown,
        KeyCode::Enter => Command::OpenSelected,
        _ => return None,
    };
    Some(command)
}

fn modal_command(key: KeyEvent, modal: &Modal) -> Option<Command> {
    let editing = matches!(modal, Modal::EditTask { .. });
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('d') if editing => Some(Command::DeleteTask),
            KeyCode::Char('c') => Some(Command::CancelModal),
            _ => None,
        };
    }

    let command = match key.code {
        KeyCode::Esc => Command::CancelModal,
        KeyCode::Enter if editing => Command::SaveEdit,
        KeyCode::Enter => Command::SubmitAdd,
        KeyCode::Tab => Command::NextField,
        KeyCode::BackTab => Command::PrevField,
        KeyCode::Left => Command::StatusPrev,
        KeyCode::Right => Command::StatusNext,
        KeyCode::Backspace => Command::Backspace,
        KeyCode::Char(c) => Command::Input(c),
        _ => return None,
    };
    Some(command)
}

pub fn draw(f: &mut Frame, view: &BoardView) {
    let palette = Palette::for_view(view);
    f.render_widget(Block::default().style(palette.base()), f.area());

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(f.area());

    let header = Paragraph::new(Line::from(Span::styled(
        view.header.as_str(),
        Style::default().fg(palette.accent).add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL).title("Board"));
    f.render_widget(header, rows[0]);

    let body = if view.show_sidebar {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(10)])
            .split(rows[1]);
        draw_sidebar(f, view, palette, split[0]);
        split[1]
    } else {
        rows[1]
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(33),
            Constraint::Percentage(33),
            Constraint::Percentage(34),
        ])
        .split(body);
    for (column, area) in view.columns.iter().zip(chunks.iter()) {
        draw_column(f, column, palette, *area);
    }

    let help = if view.modal.is_open() {
        "Tab field  ←/→ status  Enter save  Esc cancel"
    } else {
        "n new  Enter edit  [/] board  s sidebar  t theme  q quit"
    };
    f.render_widget(
        Paragraph::new(Span::styled(help, Style::default().fg(palette.muted))),
        rows[2],
    );

    match &view.modal {
        Modal::Closed => {}
        Modal::AddTask(form) => draw_modal(f, "Add New Task", form, false, palette),
        Modal::EditTask { form, .. } => draw_modal(f, "Edit Task", form, true, palette),
    }
}

fn draw_sidebar(f: &mut Frame, view: &BoardView, palette: Palette, area: Rect) {
    let items: Vec<ListItem> = view
        .boards
        .iter()
        .enumerate()
        .map(|(i, button)| {
            let style = if button.active {
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default().fg(palette.fg)
            };
            let key = if i < 9 {
                format!("{} ", i + 1)
            } else {
                "  ".to_string()
            };
            ListItem::new(Line::from(vec![
                Span::styled(key, Style::default().fg(palette.muted)),
                Span::styled(button.name.as_str(), style),
            ]))
        })
        .collect();

    let theme = if view.light_theme { "light" } else { "dark" };
    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("All boards ({})", view.boards.len()))
            .title_bottom(format!("theme: {theme}")),
    );
    f.render_widget(list, area);
}

fn draw_column(f: &mut Frame, column: &ColumnView, palette: Palette, area: Rect) {
    let items: Vec<ListItem> = column
        .cards
        .iter()
        .map(|card| {
            let mut spans = vec![Span::styled(card.title.as_str(), Style::default().fg(palette.fg))];
            if card.subtasks_total > 0 {
                spans.push(Span::styled(
                    format!(" {}/{}", card.subtasks_done, card.subtasks_total),
                    Style::default().fg(palette.muted),
                ));
            }
            let item = ListItem::new(Line::from(spans));
            if card.selected {
                item.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                item
            }
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(column.header.as_str())
            .borders(Borders::ALL)
            .border_style(if column.focused {
                Style::default().fg(palette.accent)
            } else {
                Style::default()
            }),
    );
    f.render_widget(list, area);
}

fn draw_modal(f: &mut Frame, title: &str, form: &TaskForm, editing: bool, palette: Palette) {
    let area = centered_rect(60, 50, f.area());
    f.render_widget(Clear, area);

    let field_line = |field: FormField, label: &str, value: String| {
        let focused = form.field == field;
        let marker = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.fg)
        };
        Line::from(vec![
            Span::styled(format!("{marker}{label:<12}"), style),
            Span::styled(value, Style::default().fg(palette.fg)),
        ])
    };

    let mut lines = Vec::new();
    for field in form.fields {
        let line = match field {
            FormField::Title => field_line(*field, "Title", form.title.clone()),
            FormField::Description => field_line(*field, "Description", form.description.clone()),
            FormField::Board => field_line(*field, "Board", form.board.clone()),
            FormField::Status => field_line(*field, "Status", format!("< {} >", form.status)),
        };
        lines.push(line);
    }
    if let Some(err) = &form.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(err.as_str(), Style::default().fg(Color::Red))));
    }
    lines.push(Line::from(""));
    let actions = if editing {
        "Enter save  Ctrl-d delete  Esc cancel"
    } else {
        "Enter create  Esc cancel"
    };
    lines.push(Line::from(Span::styled(actions, Style::default().fg(palette.muted))));

    let modal = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .style(palette.base())
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(modal, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
