//! Model Context Protocol surface: handler, tool dispatch, transport.

pub mod handler;
pub mod tools;
pub mod transport;
