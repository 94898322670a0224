//! In-memory session storage for cookie based authentication.
//!
//! Sessions bind an opaque token to a user for a fixed lifetime. Only one
//! session may exist per nickname: creating a new one supersedes whatever was
//! there before, and the superseded records are handed back to the caller so
//! it can notify any live channels of that user.
//!
//! # Modules
//!
//! - `clock`: time source abstraction so expiry can be tested without sleeping
//! - `store`: the concurrent `SessionStore`
//! - `sweeper`: periodic, cancellable removal of expired sessions

pub mod clock;
pub mod store;
pub mod sweeper;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{CreatedSession, Session, SessionStore};
pub use sweeper::spawn_sweeper;

/// Matches the entity crate's `Id` type.
pub type UserId = uuid::Uuid;
