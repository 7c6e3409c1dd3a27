//! MCP (Model Context Protocol) server implementation
//!
//! This module provides an MCP server that exposes the note and folder operations
//! as tools for MCP clients.

pub mod protocol;
pub mod tools;
pub mod handlers;
pub mod server;

pub use protocol::*;
pub use server::McpServer;
