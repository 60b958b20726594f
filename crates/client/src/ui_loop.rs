//! The UI loop.
//!
//! One task owns the [`Session`] and consumes [`UiEvent`]s in arrival
//! order. Background tasks (push session, deletion watches, input reader)
//! only hold an `mpsc::UnboundedSender<UiEvent>`, so every registry and view
//! mutation happens here.

use tokio::sync::mpsc;

use talio_core::model::{Placement, Tag};
use talio_core::types::DbId;
use talio_events::push::PushEnvelope;

use crate::error::{ClientError, ClientResult};
use crate::gateway::WatchTarget;
use crate::session::{Session, TaskEdit};

#[derive(Debug)]
pub enum UiEvent {
    /// A frame already parsed off the bus.
    Push(PushEnvelope),
    /// A raw text frame from the relay socket.
    PushRaw(String),
    /// The relay connection was lost (sent once per loss).
    PushDisconnected,
    /// A deletion watch fired.
    Deleted(WatchTarget),
    Action(UserAction),
    Shutdown,
}

/// A user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserAction {
    Show,
    CreateBoard { title: String, password: Option<String> },
    Join(String),
    Open(DbId),
    Close(DbId),
    Select(DbId),
    Forget(DbId),
    Admin(String),
    LeaveAdmin,
    AdminDelete(DbId),
    Unlock { board: DbId, password: String },
    SetPassword { board: DbId, password: String },
    RemovePassword { board: DbId, password: String },
    AddList { board: DbId, title: String },
    RenameList { list: DbId, title: String },
    DeleteList(DbId),
    AddTask { list: DbId, title: String },
    DeleteTask(DbId),
    MoveTask { task: DbId, list: DbId, anchor: Option<(DbId, Placement)> },
    RenameTask { task: DbId, title: String },
    Describe { task: DbId, text: String },
    AddSubtask { task: DbId, text: String },
    ToggleSubtask { task: DbId, subtask: DbId },
    EditSubtask { task: DbId, subtask: DbId, text: String },
    MoveSubtask { task: DbId, subtask: DbId, anchor: DbId, placement: Placement },
    DeleteSubtask { task: DbId, subtask: DbId },
    Tag { task: DbId, label: String },
    Untag { task: DbId, tag: DbId },
    OpenTask(DbId),
    CloseTask,
}

impl UserAction {
    /// Parse one input line, e.g. `add-task 4 Write release notes`.
    pub fn parse(line: &str) -> ClientResult<Self> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let mut args = Args { words };

        let action = match command {
            "show" | "" => Self::Show,
            "create" => {
                let title = args.rest("title")?;
                match title.split_once(" --password ") {
                    Some((title, password)) => Self::CreateBoard {
                        title: title.to_owned(),
                        password: Some(password.to_owned()),
                    },
                    None => Self::CreateBoard { title, password: None },
                }
            }
            "join" => Self::Join(args.word("join code")?.to_owned()),
            "open" => Self::Open(args.id("board id")?),
            "close" => Self::Close(args.id("board id")?),
            "select" => Self::Select(args.id("board id")?),
            "forget" => Self::Forget(args.id("board id")?),
            "admin" => Self::Admin(args.word("password")?.to_owned()),
            "leave-admin" => Self::LeaveAdmin,
            "admin-delete" => Self::AdminDelete(args.id("board id")?),
            "unlock" => Self::Unlock {
                board: args.id("board id")?,
                password: args.word("password")?.to_owned(),
            },
            "set-password" => Self::SetPassword {
                board: args.id("board id")?,
                password: args.word("password")?.to_owned(),
            },
            "remove-password" => Self::RemovePassword {
                board: args.id("board id")?,
                password: args.words.next().unwrap_or_default().to_owned(),
            },
            "add-list" => Self::AddList {
                board: args.id("board id")?,
                title: args.rest("title")?,
            },
            "rename-list" => Self::RenameList {
                list: args.id("list id")?,
                title: args.rest("title")?,
            },
            "delete-list" => Self::DeleteList(args.id("list id")?),
            "add-task" => Self::AddTask {
                list: args.id("list id")?,
                title: args.rest("title")?,
            },
            "delete-task" => Self::DeleteTask(args.id("task id")?),
            "move" => {
                let task = args.id("task id")?;
                let list = args.id("list id")?;
                let anchor = match args.words.next() {
                    None => None,
                    Some(placement) => {
                        let placement = parse_placement(placement)?;
                        Some((args.id("anchor task id")?, placement))
                    }
                };
                Self::MoveTask { task, list, anchor }
            }
            "rename-task" => Self::RenameTask {
                task: args.id("task id")?,
                title: args.rest("title")?,
            },
            "describe" => Self::Describe {
                task: args.id("task id")?,
                text: args.words.collect::<Vec<_>>().join(" "),
            },
            "add-subtask" => Self::AddSubtask {
                task: args.id("task id")?,
                text: args.rest("description")?,
            },
            "toggle" => Self::ToggleSubtask {
                task: args.id("task id")?,
                subtask: args.id("subtask id")?,
            },
            "edit-subtask" => Self::EditSubtask {
                task: args.id("task id")?,
                subtask: args.id("subtask id")?,
                text: args.rest("description")?,
            },
            "move-subtask" => {
                let task = args.id("task id")?;
                let subtask = args.id("subtask id")?;
                let placement = parse_placement(args.word("before or after")?)?;
                Self::MoveSubtask {
                    task,
                    subtask,
                    anchor: args.id("anchor subtask id")?,
                    placement,
                }
            }
            "delete-subtask" => Self::DeleteSubtask {
                task: args.id("task id")?,
                subtask: args.id("subtask id")?,
            },
            "tag" => Self::Tag {
                task: args.id("task id")?,
                label: args.rest("label")?,
            },
            "untag" => Self::Untag {
                task: args.id("task id")?,
                tag: args.id("tag id")?,
            },
            "task" => Self::OpenTask(args.id("task id")?),
            "close-task" => Self::CloseTask,
            other => return Err(ClientError::Validation(format!("Unknown command {other:?}"))),
        };
        Ok(action)
    }

    /// Run the action against `session`.
    pub async fn execute(self, session: &mut Session) -> ClientResult<()> {
        match self {
            Self::Show => {}
            Self::CreateBoard { title, password } => {
                session.create_board(&title, password.as_deref()).await?;
            }
            Self::Join(code) => {
                session.join_board(&code).await?;
            }
            Self::Open(id) => session.open_board(id).await?,
            Self::Close(id) => {
                session.close_board(id);
            }
            Self::Select(id) => session.select_board(id)?,
            Self::Forget(id) => session.forget_recent_board(id)?,
            Self::Admin(password) => {
                if !session.enter_admin(&password).await? {
                    return Err(ClientError::Validation("Wrong admin password".into()));
                }
            }
            Self::LeaveAdmin => session.leave_admin().await?,
            Self::AdminDelete(id) => session.admin_delete_board(id).await?,
            Self::Unlock { board, password } => {
                if !session.unlock_board(board, &password).await? {
                    return Err(ClientError::Validation("Wrong board password".into()));
                }
            }
            Self::SetPassword { board, password } => {
                session.set_board_password(board, &password).await?
            }
            Self::RemovePassword { board, password } => {
                if !session.remove_board_password(board, &password).await? {
                    return Err(ClientError::Validation("Wrong board password".into()));
                }
            }
            Self::AddList { board, title } => {
                session.add_task_list(board, &title).await?;
            }
            Self::RenameList { list, title } => session.rename_task_list(list, &title).await?,
            Self::DeleteList(list) => session.delete_task_list(list).await?,
            Self::AddTask { list, title } => {
                session.add_task(list, &title).await?;
            }
            Self::DeleteTask(task) => session.delete_task(task).await?,
            Self::MoveTask { task, list, anchor } => session.move_task(task, list, anchor).await?,
            Self::RenameTask { task, title } => {
                let edit = TaskEdit {
                    title: Some(title),
                    ..Default::default()
                };
                session.edit_task(task, edit).await?;
            }
            Self::Describe { task, text } => {
                let edit = TaskEdit {
                    description: Some(text),
                    ..Default::default()
                };
                session.edit_task(task, edit).await?;
            }
            Self::AddSubtask { task, text } => {
                session.add_subtask(task, &text).await?;
            }
            Self::ToggleSubtask { task, subtask } => {
                session.toggle_subtask(task, subtask).await?;
            }
            Self::EditSubtask { task, subtask, text } => {
                session.edit_subtask(task, subtask, &text).await?;
            }
            Self::MoveSubtask {
                task,
                subtask,
                anchor,
                placement,
            } => session.move_subtask(task, subtask, anchor, placement).await?,
            Self::DeleteSubtask { task, subtask } => session.delete_subtask(task, subtask).await?,
            Self::Tag { task, label } => {
                session.edit_tag_on_task(task, Tag::new(label, 0)).await?;
            }
            Self::Untag { task, tag } => session.remove_tag_from_task(task, tag).await?,
            Self::OpenTask(task) => session.open_task_detail(task)?,
            Self::CloseTask => session.close_task_detail(),
        }
        Ok(())
    }
}

struct Args<'a> {
    words: std::str::SplitWhitespace<'a>,
}

impl<'a> Args<'a> {
    fn word(&mut self, what: &str) -> ClientResult<&'a str> {
        self.words
            .next()
            .ok_or_else(|| ClientError::Validation(format!("Missing {what}")))
    }

    fn id(&mut self, what: &str) -> ClientResult<DbId> {
        let word = self.word(what)?;
        word.parse()
            .map_err(|_| ClientError::Validation(format!("Invalid {what}: {word:?}")))
    }

    fn rest(&mut self, what: &str) -> ClientResult<String> {
        let rest = self.words.by_ref().collect::<Vec<_>>().join(" ");
        if rest.is_empty() {
            return Err(ClientError::Validation(format!("Missing {what}")));
        }
        Ok(rest)
    }
}

fn parse_placement(word: &str) -> ClientResult<Placement> {
    match word {
        "before" => Ok(Placement::Before),
        "after" => Ok(Placement::After),
        other => Err(ClientError::Validation(format!(
            "Expected before or after, got {other:?}"
        ))),
    }
}

/// Consume events until [`UiEvent::Shutdown`] or every sender is gone.
///
/// `on_idle` runs after each event so a front end can redraw.
pub async fn run_ui_loop(
    mut session: Session,
    mut rx: mpsc::UnboundedReceiver<UiEvent>,
    mut on_idle: impl FnMut(&mut Session),
) -> Session {
    tracing::info!(origin = %session.origin(), "UI loop started");
    while let Some(event) = rx.recv().await {
        tracing::trace!(?event, "UI event");
        if !session.handle_event(event).await {
            break;
        }
        on_idle(&mut session);
    }
    tracing::info!("UI loop stopped");
    session
}
