//! Pure view model: what the board screen shows for a given state and task list.

use crate::app::{AppState, Modal};
use crate::kanban_board::distinct_boards;
use crate::task::{Status, Task, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardButton {
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: TaskId,
    pub title: String,
    pub subtasks_done: usize,
    pub subtasks_total: usize,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnView {
    pub status: Status,
    pub header: String,
    pub cards: Vec<Card>,
    pub focused: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub header: String,
    pub boards: Vec<BoardButton>,
    pub columns: Vec<ColumnView>,
    pub show_sidebar: bool,
    pub light_theme: bool,
    pub modal: Modal,
}

impl BoardView {
    pub fn column(&self, status: Status) -> &ColumnView {
        &self.columns[status.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub column: Status,
    pub card: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            column: Status::Todo,
            card: 0,
        }
    }
}

pub fn render_boards(boards: &[String], active: Option<&str>) -> Vec<BoardButton> {
    boards
        .iter()
        .map(|name| BoardButton {
            name: name.clone(),
            active: Some(name.as_str()) == active,
        })
        .collect()
}

/// One column per status, each rebuilt from scratch with the cards of `board`.
pub fn render_columns(tasks: &[Task], board: Option<&str>, selection: Selection) -> Vec<ColumnView> {
    Status::ALL
        .into_iter()
        .map(|status| {
            let focused = selection.column == status;
            let cards: Vec<Card> = match board {
                Some(board) => tasks
                    .iter()
                    .filter(|t| t.is_on(board, status))
                    .enumerate()
                    .map(|(idx, task)| Card {
                        id: task.id,
                        title: task.title.clone(),
                        subtasks_done: task.subtasks.iter().filter(|s| s.is_completed).count(),
                        subtasks_total: task.subtasks.len(),
                        selected: focused && idx == selection.card,
                    })
                    .collect(),
                None => Vec::new(),
            };
            ColumnView {
                status,
                header: format!("{} ({})", status.as_str().to_uppercase(), cards.len()),
                cards,
                focused,
            }
        })
        .collect()
}

pub fn build(state: &AppState, tasks: &[Task]) -> BoardView {
    let active = state.active_board.as_deref();
    BoardView {
        header: active.unwrap_or("No boards").to_string(),
        boards: render_boards(&distinct_boards(tasks), active),
        columns: render_columns(tasks, active, state.selection),
        show_sidebar: state.show_sidebar,
        light_theme: state.light_theme,
        modal: state.modal.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;

    fn task(id: TaskId, title: &str, board: &str, status: Status) -> Task {
        NewTask::new(title, board, status).into_task(id)
    }

    #[test]
    fn card_only_shows_on_its_board_and_column() {
        let tasks = vec![task(1, "X", "Launch", Status::Todo)];

        let on_launch = render_columns(&tasks, Some("Launch"), Selection::default());
        let titles: Vec<_> = on_launch
            .iter()
            .map(|c| c.cards.iter().map(|card| card.title.as_str()).collect::<Vec<_>>())
            .collect();
        assert_eq!(titles, vec![vec!["X"], vec![], vec![]]);

        let elsewhere = render_columns(&tasks, Some("Roadmap"), Selection::default());
        assert!(elsewhere.iter().all(|c| c.cards.is_empty()));
    }

    #[test]
    fn column_headers_carry_counts() {
        let tasks = vec![
            task(1, "a", "B", Status::Doing),
            task(2, "b", "B", Status::Doing),
        ];
        let columns = render_columns(&tasks, Some("B"), Selection::default());
        assert_eq!(columns[0].header, "TODO (0)");
        assert_eq!(columns[1].header, "DOING (2)");
        assert_eq!(columns[2].header, "DONE (0)");
    }

    #[test]
    fn selection_marks_a_single_card() {
        let tasks = vec![
            task(1, "a", "B", Status::Done),
            task(2, "b", "B", Status::Done),
        ];
        let selection = Selection {
            column: Status::Done,
            card: 1,
        };
        let columns = render_columns(&tasks, Some("B"), selection);
        let selected: Vec<_> = columns
            .iter()
            .flat_map(|c| c.cards.iter())
            .filter(|c| c.selected)
            .map(|c| c.id)
            .collect();
        assert_eq!(selected, vec![2]);
        assert!(columns[2].focused);
    }

    #[test]
    fn board_buttons_mark_the_active_board() {
        let boards = vec!["Launch".to_string(), "Roadmap".to_string()];
        let buttons = render_boards(&boards, Some("Roadmap"));
        assert_eq!(
            buttons
                .iter()
                .map(|b| (b.name.as_str(), b.active))
                .collect::<Vec<_>>(),
            vec![("Launch", false), ("Roadmap", true)]
        );
    }

    #[test]
    fn subtask_progress_is_counted() {
        let mut t = task(1, "a", "B", Status::Todo);
        t.subtasks = crate::seed::initial_tasks()[1].subtasks.clone();
        let columns = render_columns(&[t], Some("B"), Selection::default());
        let card = &columns[0].cards[0];
        assert_eq!((card.subtasks_done, card.subtasks_total), (1, 2));
    }
}
