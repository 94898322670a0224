//! Live channel infrastructure: who is connected, and who hears what.
//!
//! # Architecture
//!
//! - **Dual-index registry**: connections are looked up by id for lifecycle
//!   management and by declared user for targeted routing.
//! - **Self-declared identity**: a channel starts anonymous and becomes
//!   associated with a user only when it sends a `login` frame.
//! - **Bounded outbound queues**: each channel has its own queue and pushes
//!   use `try_send`, so a slow or dead peer never holds up the others.
//! - **Ephemeral events**: nothing is replayed; a client that was not
//!   connected reloads state over HTTP.
//!
//! # Routing rules
//!
//! | event           | recipients                                        |
//! |-----------------|---------------------------------------------------|
//! | `post`          | every channel                                     |
//! | `comment`       | every channel                                     |
//! | `status`        | authenticated channels of other users             |
//! | `message`       | receiver's channels (and the sender's, with echo) |
//! | `token-expired` | that user's channels                              |
//!
//! # Modules
//!
//! - `connection`: `ConnectionRegistry` and the `ConnectionId` handle type
//! - `manager`: `Manager` fan-out and the `LiveConnection` lifecycle guard
//! - `message`: wire types for both directions
//! - `domain_event_handler`: bridge from `events::DomainEvent`

pub mod connection;
pub mod domain_event_handler;
pub mod manager;
pub mod message;

pub use domain_event_handler::LiveDomainEventHandler;
pub use manager::{LiveConnection, Manager};
