//! Debugger session layer.
//!
//! Turns the debugger's unframed, line-buffered text protocol into a
//! reliable request/response interface: process lifecycle, a
//! background output collector, and quiescence-based "is the debugger
//! idle" detection. The MCP adapter in [`crate::mcp`] is the only
//! intended caller.

pub mod collector;
pub mod controller;
pub mod interpreter;
pub mod launcher;
pub mod prompt;
pub mod quiescence;
pub mod registry;

pub use controller::{DebugSession, LaunchOptions, SessionSettings};
pub use registry::SessionRegistry;
