//! A terminal host for the handoff flow: the display is printed line by line,
//! the provider URL is shown for the user to open, and completion is relayed
//! from stdin.

pub mod signals;
pub mod view;
pub mod window;
