//! Domain types of the handoff flow: the session record, the UI display model,
//! the backend payloads, the completion signal and the ports to the outside.

pub mod display;
pub mod messages;
pub mod ports;
pub mod session;
pub mod signal;
