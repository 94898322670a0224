//! This module holds typed parameters for various endpoint inputs.
//!
//! Query strings are deserialized into these structs before a controller
//! runs, so a malformed value is rejected by axum with a 400 and never reaches
//! the domain layer.

pub(crate) mod message;
pub(crate) mod post;
