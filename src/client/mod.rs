//! Client side of saving
//!
//! Keeps the local copy of an open note, turns edits into debounced saves, discards responses
//! that arrive out of order and holds on to local edits when the server reports a conflict.

pub mod autosave;
pub mod controller;
pub mod debounce;
pub mod sequencer;
pub mod transport;

pub use autosave::AutosaveConfig;
pub use autosave::AutosaveHandle;
pub use autosave::Stopped;
pub use controller::ConflictState;
pub use controller::Edit;
pub use controller::SaveController;
pub use controller::SaveRequest;
pub use controller::SaveStatus;
pub use debounce::Debounce;
pub use sequencer::RequestSequencer;
pub use transport::LocalTransport;
pub use transport::NoteTransport;
pub use transport::RemoteSnapshot;
pub use transport::TransportError;
