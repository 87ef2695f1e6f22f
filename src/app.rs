use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::kanban_board::{distinct_boards, KanbanBoard};
use crate::storage::KeyValueStore;
use crate::task::{NewTask, Status, Task, TaskId, TaskPatch};
use crate::view::{self, BoardView, Selection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Board,
    Status,
}

const ADD_FIELDS: &[FormField] = &[
    FormField::Title,
    FormField::Description,
    FormField::Board,
    FormField::Status,
];
const EDIT_FIELDS: &[FormField] = &[FormField::Title, FormField::Description, FormField::Status];

const SAVE_FAILED: &str = "Could not save, see log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub board: String,
    pub status: Status,
    pub field: FormField,
    pub fields: &'static [FormField],
    pub error: Option<String>,
}

impl TaskForm {
    pub fn for_new(board: &str, status: Status) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            board: board.to_string(),
            status,
            field: FormField::Title,
            fields: ADD_FIELDS,
            error: None,
        }
    }

    pub fn for_edit(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            board: task.board.clone(),
            status: task.status,
            field: FormField::Title,
            fields: EDIT_FIELDS,
            error: None,
        }
    }

    fn text_mut(&mut self) -> Option<&mut String> {
        match self.field {
            FormField::Title => Some(&mut self.title),
            FormField::Description => Some(&mut self.description),
            FormField::Board => Some(&mut self.board),
            FormField::Status => None,
        }
    }

    fn input(&mut self, c: char) {
        if let Some(text) = self.text_mut() {
            text.push(c);
        }
    }

    fn backspace(&mut self) {
        if let Some(text) = self.text_mut() {
            text.pop();
        }
    }

    fn step_field(&mut self, forward: bool) {
        let len = self.fields.len();
        let pos = self.fields.iter().position(|f| *f == self.field).unwrap_or(0);
        let next = if forward { (pos + 1) % len } else { (pos + len - 1) % len };
        self.field = self.fields[next];
    }

    fn cycle_status(&mut self, forward: bool) {
        if self.field == FormField::Status {
            self.status = if forward { self.status.next() } else { self.status.prev() };
        }
    }

    fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.title.trim().is_empty() {
            return Err("Title is required");
        }
        if self.board.trim().is_empty() {
            return Err("Board is required");
        }
        Ok(())
    }
}

/// At most one modal is open; there is no stack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Modal {
    #[default]
    Closed,
    AddTask(TaskForm),
    EditTask { id: TaskId, form: TaskForm },
}

impl Modal {
    pub fn is_open(&self) -> bool {
        !matches!(self, Modal::Closed)
    }

    fn form_mut(&mut self) -> Option<&mut TaskForm> {
        match self {
            Modal::Closed => None,
            Modal::AddTask(form) | Modal::EditTask { form, .. } => Some(form),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    pub active_board: Option<String>,
    pub show_sidebar: bool,
    pub light_theme: bool,
    pub modal: Modal,
    pub selection: Selection,
    pub default_status: Status,
    pub should_quit: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            active_board: None,
            show_sidebar: true,
            light_theme: false,
            modal: Modal::Closed,
            selection: Selection::default(),
            default_status: Status::Todo,
            should_quit: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SwitchBoard(String),
    SelectBoard(usize),
    NextBoard,
    PrevBoard,
    ColumnLeft,
    ColumnRight,
    CardUp,
    CardDown,
    OpenAddModal,
    OpenEditModal(TaskId),
    OpenSelected,
    SubmitAdd,
    SaveEdit,
    DeleteTask,
    CancelModal,
    Input(char),
    Backspace,
    NextField,
    PrevField,
    StatusNext,
    StatusPrev,
    ToggleTheme,
    ShowSidebar,
    HideSidebar,
    ToggleSidebar,
    Quit,
}

/// Owns the board storage and the UI state; every event goes through `dispatch`.
#[derive(Debug)]
pub struct App<S> {
    board: KanbanBoard<S>,
    state: AppState,
}

impl<S: KeyValueStore> App<S> {
    /// Restores sidebar, theme and the last active board from storage.
    #[tracing::instrument(skip_all)]
    pub fn load(board: KanbanBoard<S>, default_status: Status) -> Result<Self> {
        let boards = board.boards().unwrap_or_else(|err| {
            error!(error = %err, "failed to read tasks");
            Vec::new()
        });
        let stored = board.active_board()?;
        let active_board = match stored {
            Some(name) if boards.contains(&name) => Some(name),
            _ => boards.first().cloned(),
        };

        let state = AppState {
            active_board,
            show_sidebar: board.sidebar_visible()?,
            light_theme: board.light_theme()?,
            default_status,
            ..AppState::default()
        };
        info!(
            boards = boards.len(),
            active = ?state.active_board,
            "loaded board state"
        );
        Ok(Self { board, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn board(&self) -> &KanbanBoard<S> {
        &self.board
    }

    pub fn should_quit(&self) -> bool {
        self.state.should_quit
    }

    /// Full rebuild of the screen from storage.
    pub fn view(&self) -> BoardView {
        view::build(&self.state, &self.tasks())
    }

    fn tasks(&self) -> Vec<Task> {
        self.board.list().unwrap_or_else(|err| {
            error!(error = %err, "failed to read tasks");
            Vec::new()
        })
    }

    /// Applies one command; failures are logged and leave the UI usable.
    pub fn dispatch(&mut self, command: Command) {
        debug!(?command, "dispatch");
        if let Err(err) = self.handle(command) {
            error!(error = %err, "command failed");
        }
    }

    fn handle(&mut self, command: Command) -> Result<()> {
        if self.state.modal.is_open() {
            return self.handle_modal(command);
        }

        match command {
            Command::SwitchBoard(name) => {
                if self.board.boards()?.contains(&name) {
                    self.switch_board(name)?;
                } else {
                    warn!(board = %name, "no tasks on board, not switching");
                }
            }
            Command::SelectBoard(idx) => {
                if let Some(name) = self.board.boards()?.get(idx).cloned() {
                    self.switch_board(name)?;
                }
            }
            Command::NextBoard => self.step_board(true)?,
            Command::PrevBoard => self.step_board(false)?,
            Command::ColumnLeft => {
                let idx = self.state.selection.column.index();
                if idx > 0 {
                    self.focus_column(Status::ALL[idx - 1]);
                }
            }
            Command::ColumnRight => {
                let idx = self.state.selection.column.index();
                if idx + 1 < Status::ALL.len() {
                    self.focus_column(Status::ALL[idx + 1]);
                }
            }
            Command::CardUp => {
                self.state.selection.card = self.state.selection.card.saturating_sub(1);
            }
            Command::CardDown => {
                let count = self.selected_column_cards().len();
                if self.state.selection.card + 1 < count {
                    self.state.selection.card += 1;
                }
            }
            Command::OpenAddModal => {
                let board = self.state.active_board.clone().unwrap_or_default();
                self.state.modal = Modal::AddTask(TaskForm::for_new(&board, self.state.default_status));
            }
            Command::OpenEditModal(id) => self.open_edit(id)?,
            Command::OpenSelected => {
                if let Some(id) = self.selected_column_cards().get(self.state.selection.card).copied() {
                    self.open_edit(id)?;
                }
            }
            Command::ToggleTheme => {
                self.state.light_theme = !self.state.light_theme;
                self.board.set_light_theme(self.state.light_theme)?;
            }
            Command::ShowSidebar => self.set_sidebar(true)?,
            Command::HideSidebar => self.set_sidebar(false)?,
            Command::ToggleSidebar => self.set_sidebar(!self.state.show_sidebar)?,
            Command::Quit => self.state.should_quit = true,
            Command::SubmitAdd
            | Command::SaveEdit
            | Command::DeleteTask
            | Command::CancelModal
            | Command::Input(_)
            | Command::Backspace
            | Command::NextField
            | Command::PrevField
            | Command::StatusNext
            | Command::StatusPrev => debug!("no modal open, ignoring"),
        }
        Ok(())
    }

    fn handle_modal(&mut self, command: Command) -> Result<()> {
        match command {
            Command::CancelModal => self.state.modal = Modal::Closed,
            Command::SubmitAdd | Command::SaveEdit | Command::DeleteTask => {
                self.submit_modal(command)?
            }
            Command::Quit => self.state.should_quit = true,
            other => {
                let Some(form) = self.state.modal.form_mut() else {
                    return Ok(());
                };
                match other {
                    Command::Input(c) => form.input(c),
                    Command::Backspace => form.backspace(),
                    Command::NextField => form.step_field(true),
                    Command::PrevField => form.step_field(false),
                    Command::StatusNext => form.cycle_status(true),
                    Command::StatusPrev => form.cycle_status(false),
                    _ => debug!("modal open, ignoring"),
                }
            }
        }
        Ok(())
    }

    fn submit_modal(&mut self, command: Command) -> Result<()> {
        match (std::mem::take(&mut self.state.modal), command) {
            (Modal::AddTask(mut form), Command::SubmitAdd) => {
                if let Err(msg) = form.validate() {
                    form.error = Some(msg.to_string());
                    self.state.modal = Modal::AddTask(form);
                    return Ok(());
                }
                let created = self.board.create(NewTask {
                    title: form.title.clone(),
                    description: form.description.clone(),
                    board: form.board.trim().to_string(),
                    status: form.status,
                });
                let task = match created {
                    Ok(task) => task,
                    Err(err) => {
                        form.error = Some(SAVE_FAILED.to_string());
                        self.state.modal = Modal::AddTask(form);
                        return Err(err);
                    }
                };
                self.switch_board(task.board)?;
            }
            (Modal::EditTask { id, mut form }, Command::SaveEdit) => {
                if form.title.trim().is_empty() {
                    form.error = Some("Title is required".to_string());
                    self.state.modal = Modal::EditTask { id, form };
                    return Ok(());
                }
                let patch = TaskPatch {
                    title: Some(form.title.clone()),
                    description: Some(form.description.clone()),
                    status: Some(form.status),
                };
                if let Err(err) = self.board.patch(id, &patch) {
                    form.error = Some(SAVE_FAILED.to_string());
                    self.state.modal = Modal::EditTask { id, form };
                    return Err(err);
                }
                self.refresh()?;
            }
            (Modal::EditTask { id, mut form }, Command::DeleteTask) => {
                if let Err(err) = self.board.remove(id) {
                    form.error = Some(SAVE_FAILED.to_string());
                    self.state.modal = Modal::EditTask { id, form };
                    return Err(err);
                }
                self.refresh()?;
            }
            (modal, command) => {
                debug!(?command, "command does not apply to the open modal");
                self.state.modal = modal;
            }
        }
        Ok(())
    }

    fn open_edit(&mut self, id: TaskId) -> Result<()> {
        let task = self.board.get(id)?;
        self.state.modal = Modal::EditTask {
            id,
            form: TaskForm::for_edit(&task),
        };
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn switch_board(&mut self, name: String) -> Result<()> {
        self.board.set_active_board(&name)?;
        self.state.active_board = Some(name);
        self.state.selection = Selection::default();
        info!(board = ?self.state.active_board, "switched board");
        Ok(())
    }

    fn step_board(&mut self, forward: bool) -> Result<()> {
        let boards = self.board.boards()?;
        if boards.is_empty() {
            return Ok(());
        }
        let current = self
            .state
            .active_board
            .as_ref()
            .and_then(|active| boards.iter().position(|b| b == active));
        let next = match (current, forward) {
            (Some(pos), true) => (pos + 1) % boards.len(),
            (Some(pos), false) => (pos + boards.len() - 1) % boards.len(),
            (None, _) => 0,
        };
        self.switch_board(boards[next].clone())
    }

    fn set_sidebar(&mut self, show: bool) -> Result<()> {
        self.state.show_sidebar = show;
        self.board.set_sidebar_visible(show)
    }

    fn focus_column(&mut self, status: Status) {
        self.state.selection = Selection {
            column: status,
            card: 0,
        };
    }

    fn selected_column_cards(&self) -> Vec<TaskId> {
        let Some(board) = self.state.active_board.as_deref() else {
            return Vec::new();
        };
        self.tasks()
            .iter()
            .filter(|t| t.is_on(board, self.state.selection.column))
            .map(|t| t.id)
            .collect()
    }

    /// Re-derives the board list after a mutation and keeps the selection in range.
    fn refresh(&mut self) -> Result<()> {
        let boards = distinct_boards(&self.board.list()?);
        let still_there = self
            .state
            .active_board
            .as_ref()
            .is_some_and(|active| boards.contains(active));
        if !still_there {
            let fallback = boards.first().cloned();
            warn!(previous = ?self.state.active_board, next = ?fallback, "active board has no tasks left");
            self.state.active_board = fallback;
        }

        let count = self.selected_column_cards().len();
        if self.state.selection.card >= count {
            self.state.selection.card = count.saturating_sub(1);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn empty_app() -> App<MemoryStore> {
        let mut board = KanbanBoard::new(MemoryStore::new());
        board.initialize(false).unwrap();
        App::load(board, Status::Todo).unwrap()
    }

    fn type_text(app: &mut App<MemoryStore>, text: &str) {
        for c in text.chars() {
            app.dispatch(Command::Input(c));
        }
    }

    fn add_task(app: &mut App<MemoryStore>, title: &str, board: &str) {
        app.dispatch(Command::OpenAddModal);
        type_text(app, title);
        app.dispatch(Command::NextField);
        app.dispatch(Command::NextField);
        if let Modal::AddTask(form) = &mut app.state.modal {
            form.board = board.to_string();
        }
        app.dispatch(Command::SubmitAdd);
    }

    #[test]
    fn add_modal_defaults_to_todo_on_active_board() {
        let mut app = empty_app();
        add_task(&mut app, "first", "Launch");
        app.dispatch(Command::OpenAddModal);
        match &app.state().modal {
            Modal::AddTask(form) => {
                assert_eq!(form.board, "Launch");
                assert_eq!(form.status, Status::Todo);
            }
            other => panic!("unexpected modal {other:?}"),
        }
    }

    #[test]
    fn submitting_empty_title_keeps_modal_open() {
        let mut app = empty_app();
        app.dispatch(Command::OpenAddModal);
        app.dispatch(Command::SubmitAdd);
        match &app.state().modal {
            Modal::AddTask(form) => assert_eq!(form.error.as_deref(), Some("Title is required")),
            other => panic!("unexpected modal {other:?}"),
        }
        assert!(app.board().list().unwrap().is_empty());
    }

    #[test]
    fn created_task_switches_to_its_board() {
        let mut app = empty_app();
        add_task(&mut app, "X", "Launch");
        assert_eq!(app.state().modal, Modal::Closed);
        assert_eq!(app.state().active_board.as_deref(), Some("Launch"));
        assert_eq!(app.board().active_board().unwrap().as_deref(), Some("Launch"));
    }

    #[test]
    fn status_field_cycles_only_when_focused() {
        let mut app = empty_app();
        app.dispatch(Command::OpenAddModal);
        app.dispatch(Command::StatusNext);
        app.dispatch(Command::PrevField);
        app.dispatch(Command::StatusNext);
        app.dispatch(Command::StatusNext);
        match &app.state().modal {
            Modal::AddTask(form) => {
                assert_eq!(form.field, FormField::Status);
                assert_eq!(form.status, Status::Done);
            }
            other => panic!("unexpected modal {other:?}"),
        }
    }

    #[test]
    fn opening_a_modal_while_one_is_open_is_ignored() {
        let mut app = empty_app();
        add_task(&mut app, "X", "Launch");
        let id = app.board().list().unwrap()[0].id;

        app.dispatch(Command::OpenEditModal(id));
        app.dispatch(Command::OpenAddModal);
        assert!(matches!(app.state().modal, Modal::EditTask { id: open, .. } if open == id));

        app.dispatch(Command::CancelModal);
        assert_eq!(app.state().modal, Modal::Closed);
    }

    #[test]
    fn edit_modal_for_unknown_id_stays_idle() {
        let mut app = empty_app();
        app.dispatch(Command::OpenEditModal(404));
        assert_eq!(app.state().modal, Modal::Closed);
    }

    #[test]
    fn card_selection_opens_the_selected_card() {
        let mut app = empty_app();
        add_task(&mut app, "one", "Launch");
        add_task(&mut app, "two", "Launch");
        app.dispatch(Command::CardDown);
        app.dispatch(Command::CardDown);
        assert_eq!(app.state().selection.card, 1);

        app.dispatch(Command::OpenSelected);
        match &app.state().modal {
            Modal::EditTask { form, .. } => assert_eq!(form.title, "two"),
            other => panic!("unexpected modal {other:?}"),
        }
    }

    #[test]
    fn deleting_last_task_of_board_falls_back_to_next_board() {
        let mut app = empty_app();
        add_task(&mut app, "keep", "Roadmap");
        add_task(&mut app, "gone", "Launch");
        let id = app
            .board()
            .list()
            .unwrap()
            .into_iter()
            .find(|t| t.title == "gone")
            .map(|t| t.id)
            .unwrap();

        app.dispatch(Command::OpenEditModal(id));
        app.dispatch(Command::DeleteTask);
        assert_eq!(app.state().active_board.as_deref(), Some("Roadmap"));
    }

    #[test]
    fn switching_to_a_board_without_tasks_is_ignored() {
        let mut app = empty_app();
        add_task(&mut app, "a", "A");
        app.dispatch(Command::SwitchBoard("Ghost".to_string()));
        assert_eq!(app.state().active_board.as_deref(), Some("A"));
        assert_eq!(app.board().active_board().unwrap().as_deref(), Some("A"));
    }

    #[test]
    fn board_cycling_wraps() {
        let mut app = empty_app();
        add_task(&mut app, "a", "A");
        add_task(&mut app, "b", "B");
        assert_eq!(app.state().active_board.as_deref(), Some("B"));
        app.dispatch(Command::NextBoard);
        assert_eq!(app.state().active_board.as_deref(), Some("A"));
        app.dispatch(Command::PrevBoard);
        assert_eq!(app.state().active_board.as_deref(), Some("B"));
        app.dispatch(Command::SelectBoard(0));
        assert_eq!(app.state().active_board.as_deref(), Some("A"));
    }

    #[test]
    fn toggles_persist_flags() {
        let mut app = empty_app();
        app.dispatch(Command::ToggleTheme);
        app.dispatch(Command::HideSidebar);
        assert!(app.board().light_theme().unwrap());
        assert!(!app.board().sidebar_visible().unwrap());

        app.dispatch(Command::ToggleSidebar);
        assert!(app.state().show_sidebar);
        assert!(app.board().sidebar_visible().unwrap());
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = empty_app();
        app.dispatch(Command::Quit);
        assert!(app.should_quit());
    }
}
