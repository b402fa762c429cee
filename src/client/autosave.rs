//! Autosave loop
//!
//! A task owning a [`SaveController`] and driving it from commands: edits come in through an
//! [`AutosaveHandle`], debounce firings, save responses and remote notifications come back in
//! through the same channel. Everything touching the controller runs on that one task, so the
//! order of commands is the order of state changes.
//!
//! ```text
//!   AutosaveHandle      mpsc       Autosave task          NoteTransport
//!   .edit()         ──────────▶  SaveController  ──────▶  .save()
//!   .watch()        ◀──────────  (watch)          ◀──────  SaveCompleted
//! ```

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::env_var_or_else;
use crate::notes::Note;
use crate::realtime::NoteEvent;

use super::Debounce;
use super::Edit;
use super::NoteTransport;
use super::SaveController;
use super::SaveStatus;
use super::TransportError;

/// Quiet period after the last edit before saving
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(800);

/// Autosave settings
#[derive(Clone, Copy, Debug)]
pub struct AutosaveConfig {
    /// Quiet period after the last edit before saving
    pub debounce: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl AutosaveConfig {
    /// Read the settings from `AUTOSAVE_DEBOUNCE_MS`
    pub fn from_env() -> Self {
        let debounce = env_var_or_else("AUTOSAVE_DEBOUNCE_MS", String::new);

        if debounce.is_empty() {
            return Self::default();
        }

        match debounce.parse::<u64>() {
            Ok(millis) => Self {
                debounce: Duration::from_millis(millis),
            },
            Err(err) => {
                tracing::warn!(
                    "Invalid `AUTOSAVE_DEBOUNCE_MS` ({err}), using {}ms",
                    DEFAULT_DEBOUNCE.as_millis()
                );

                Self::default()
            }
        }
    }
}

/// The autosave task is gone
#[derive(Debug, Error)]
#[error("Autosave has stopped")]
pub struct Stopped;

/// Everything the autosave task reacts to
#[derive(Debug)]
enum Command {
    Open(Box<Note>),
    Close,
    Edit(Edit),
    ResolveWithLocal,
    ResolveWithRemote,
    DebounceFired(u64),
    SaveCompleted {
        seq: u64,
        result: Result<i64, TransportError>,
    },
    Remote(NoteEvent),
}

/// Handle to a running autosave task
///
/// The task stops once every handle is dropped
#[derive(Clone, Debug)]
pub struct AutosaveHandle {
    /// Commands to the task
    commands: mpsc::UnboundedSender<Command>,

    /// Latest state of the task
    state: watch::Receiver<SaveController>,
}

impl AutosaveHandle {
    /// Start an autosave task saving through `transport`
    pub fn spawn<T: NoteTransport>(transport: T, config: AutosaveConfig) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let (state_sender, state) = watch::channel(SaveController::new());

        let autosave = Autosave {
            transport: Arc::new(transport),
            controller: SaveController::new(),
            debounce: Debounce::new(config.debounce),
            commands: commands.downgrade(),
            state: state_sender,
            subscription: None,
            save_due: false,
        };

        tokio::spawn(autosave.run(receiver));

        Self { commands, state }
    }

    /// Open a note, whatever was open is left without saving
    pub fn open(&self, note: Note) -> Result<(), Stopped> {
        self.send(Command::Open(Box::new(note)))
    }

    /// Close the open note, pending edits are not saved
    pub fn close(&self) -> Result<(), Stopped> {
        self.send(Command::Close)
    }

    /// Apply a local edit
    pub fn edit(&self, edit: Edit) -> Result<(), Stopped> {
        self.send(Command::Edit(edit))
    }

    /// Keep the local side of a conflict, saved after the next quiet period
    pub fn resolve_with_local(&self) -> Result<(), Stopped> {
        self.send(Command::ResolveWithLocal)
    }

    /// Take the remote side of a conflict
    pub fn resolve_with_remote(&self) -> Result<(), Stopped> {
        self.send(Command::ResolveWithRemote)
    }

    /// Current state of the controller
    pub fn state(&self) -> SaveController {
        self.state.borrow().clone()
    }

    /// Follow state changes
    pub fn watch(&self) -> watch::Receiver<SaveController> {
        self.state.clone()
    }

    fn send(&self, command: Command) -> Result<(), Stopped> {
        self.commands.send(command).map_err(|_| Stopped)
    }
}

/// The autosave task
struct Autosave<T: NoteTransport> {
    /// Where saves go
    transport: Arc<T>,

    /// Save state of the open note
    controller: SaveController,

    /// Quiet period before a save
    debounce: Debounce,

    /// Commands to self, weak so dropping every handle stops the task
    commands: mpsc::WeakUnboundedSender<Command>,

    /// Publishes the controller after every command
    state: watch::Sender<SaveController>,

    /// Stops following notifications of the open note
    subscription: Option<CancellationToken>,

    /// The debounce fired while a save was in flight
    save_due: bool,
}

impl<T: NoteTransport> Autosave<T> {
    async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = receiver.recv().await {
            self.handle(command).await;
            self.state.send_replace(self.controller.clone());
        }

        self.debounce.cancel();
        self.unfollow();

        tracing::debug!("Autosave stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Open(note) => {
                self.reset();
                self.controller.open(&note);
                self.follow(note.id).await;
            }
            Command::Close => {
                self.reset();
                self.controller.close();
            }
            Command::Edit(edit) => {
                if self.controller.apply(edit) {
                    self.schedule();
                }
            }
            Command::ResolveWithLocal => {
                if self.controller.resolve_with_local() {
                    self.schedule();
                }
            }
            Command::ResolveWithRemote => {
                if self.controller.resolve_with_remote() {
                    self.debounce.cancel();
                    self.save_due = false;
                }
            }
            Command::DebounceFired(generation) => {
                if self.debounce.take_fired(generation) {
                    self.save();
                }
            }
            Command::SaveCompleted { seq, result } => {
                self.controller.complete(seq, result);

                if self.save_due && !self.controller.is_saving() {
                    self.save_due = false;
                    self.save();
                }
            }
            Command::Remote(event) => {
                if event.editor() != self.transport.actor_id() {
                    self.controller.mark_remote_changed(&event.note_id());
                }
            }
        }
    }

    /// Forget timers and notifications of the open note
    fn reset(&mut self) {
        self.debounce.cancel();
        self.save_due = false;
        self.unfollow();
    }

    /// Restart the quiet period, no saves during a conflict
    fn schedule(&mut self) {
        if self.controller.status() == SaveStatus::Conflict {
            return;
        }

        let Some(commands) = self.commands.upgrade() else {
            return;
        };

        self.debounce.restart(move |generation| {
            let _ = commands.send(Command::DebounceFired(generation));
        });
    }

    /// Save now, or right after the save in flight
    fn save(&mut self) {
        if self.controller.is_saving() {
            self.save_due = true;
            return;
        }

        let Some(commands) = self.commands.upgrade() else {
            return;
        };

        let Some(request) = self.controller.begin_save() else {
            return;
        };

        tracing::debug!(
            "Saving note {} as save {} on version {}",
            request.note_id,
            request.seq,
            request.version
        );

        let transport = Arc::clone(&self.transport);

        tokio::spawn(async move {
            let result = transport.save(&request).await.map(|note| note.version);

            let _ = commands.send(Command::SaveCompleted {
                seq: request.seq,
                result,
            });
        });
    }

    /// Follow notifications of a note, when the transport has them
    async fn follow(&mut self, note_id: Uuid) {
        let Some(mut subscription) = self.transport.subscribe(&note_id).await else {
            return;
        };

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let commands = self.commands.clone();

        self.subscription = Some(token);

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    () = cancelled.cancelled() => break,
                    event = subscription.recv() => event,
                };

                let Some(event) = event else {
                    break;
                };

                let Some(commands) = commands.upgrade() else {
                    break;
                };

                if commands.send(Command::Remote(event)).is_err() {
                    break;
                }
            }
        });
    }

    fn unfollow(&mut self) {
        if let Some(token) = self.subscription.take() {
            token.cancel();
        }
    }
}
