//! Session Gate and application state
//!
//! - [`token_store`]: the persisted token
//! - [`store`]: auth and data slices and the backend calls that feed them
//! - [`gate`]: route guard

pub mod error;
pub mod gate;
pub mod store;
pub mod token_store;

pub use error::{SessionError, SessionResult};
pub use gate::{Resolution, Route, SessionGate};
pub use store::{Action, AppStore, AuthState, DataState};
pub use token_store::{StoredSession, TokenStore, SESSION_FILE};
