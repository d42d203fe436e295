//! Model Context Protocol (MCP) server
//!
//! Exposes Vikunja as MCP tools over stdio or Streamable HTTP.
//!
//! - **server**: the server struct, its info and the merged tool router
//! - **service**: stdio and Streamable HTTP transports
//! - **tools**: one module per area (instances, projects, tasks, labels,
//!   kanban, relations, batch, transfer, power queries, X-Q)
//!
//! The server is generic over [`Environment`](crate::instances::Environment)
//! so tests resolve instances from a fixed map instead of process state.

pub mod server;
mod service;
pub mod tools;


pub use server::VikunjaMcpServer;
pub use service::{create_mcp_service, serve_stdio};
