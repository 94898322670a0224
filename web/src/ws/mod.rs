//! Websocket endpoint bridging a socket to a `realtime::LiveConnection`.
pub(crate) mod handler;
