//! Grafana MCP Server Library
//!
//! This crate implements the Model Context Protocol (MCP) server for Grafana,
//! letting agents search dashboards, query metrics and logs, and work with
//! incidents, alerts and on-call schedules through standardized tools.
//!
//! ## Architecture
//!
//! ```text
//! Agent (Claude, GPT, etc.)
//!        │  JSON-RPC, one message per line
//!        ▼
//! ┌─────────────────────┐
//! │     McpServer       │ ◄── This crate
//! │                     │
//! │  read loop ──┐      │
//! │              ▼      │
//! │  category gate +    │
//! │  schema validation  │
//! │              │      │
//! │  tool tasks ─┴──▶ writer
//! └─────────┬───────────┘
//!           │ BackendRequest
//!           ▼
//! ┌─────────────────────┐
//! │   GrafanaClient     │ reqwest, auth headers, TLS
//! └─────────┬───────────┘
//!           ▼
//!        Grafana
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use grafana_mcp::{tools, GrafanaClient, McpServer};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = grafana_mcp_core::ServerConfig::builder()
//!         .url("http://localhost:3000")
//!         .service_account_token("glsa_...")
//!         .build()
//!         .unwrap();
//!     let client = Arc::new(GrafanaClient::new(&config.backend).unwrap());
//!
//!     McpServer::builder(config)
//!         .tools(tools::all(client))
//!         .build()
//!         .run_stdio(std::future::pending())
//!         .await
//!         .unwrap();
//! }
//! ```

pub mod cli;
pub mod client;
pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;

pub use client::GrafanaClient;
pub use error::{McpError, McpResult, ProtocolError};
pub use server::{ClientInfo, McpServer, McpServerBuilder, SessionState};

/// Server metadata for MCP protocol
pub const SERVER_NAME: &str = "mcp-grafana";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SERVER_INSTRUCTIONS: &str = "Tools for a Grafana instance: search and edit \
dashboards, inspect datasources, query Prometheus and Loki, manage incidents, alert rules \
and on-call schedules, run Sift investigations, fetch Pyroscope profiles and build deeplinks.";
