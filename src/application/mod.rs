//! Application layer orchestrating the handoff flow.
//!
//! This module defines the `HandoffController`, the single entry point that walks a
//! session through start, completion, and finalize against the domain ports.

pub mod controller;
