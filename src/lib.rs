//! Client-side task manager: a typed gateway to a remote task service, a
//! synchronization engine owning the session state, and a thin CLI/shell
//! presentation on top.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod model;
pub mod ordering;
pub mod render;
pub mod shell;
