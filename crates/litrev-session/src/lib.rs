//! litrev-session: review stream session with persisted resume
//!
//! [`StreamSession`] follows one review's update stream, keeps the ordered
//! transcript, and persists it so a finished review is shown from the store
//! instead of being streamed again.

pub mod error;
pub mod events;
pub mod progress;
pub mod session;
pub mod store;
pub mod transport;

pub use error::{Error, Result};
pub use events::SessionEvent;
pub use progress::{ResearchProgress, ResearchStage};
pub use session::{PersistedSession, SESSION_KEY, StreamSession};
pub use store::{FileStore, MemoryStore, SessionStore};
pub use transport::Transport;
