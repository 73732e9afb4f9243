//! # Grafana MCP Core
//!
//! The protocol-independent half of the Grafana MCP server: everything a tool
//! needs to be declared, gated, validated and answered, without knowing how
//! requests arrive.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      grafana-mcp-core                        │
//! │                                                              │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐  │
//! │  │ InputSchema  │   │ ToolRegistry │   │  Category Gate   │  │
//! │  │ (validate +  │──▶│ name → Arc<  │   │  category_of()   │  │
//! │  │  JSON Schema)│   │ ToolDef>     │   │  is_enabled()    │  │
//! │  └──────────────┘   └──────┬───────┘   └──────────────────┘  │
//! │                            │                                 │
//! │  ┌──────────────┐   ┌──────▼───────┐   ┌──────────────────┐  │
//! │  │ ServerConfig │──▶│RequestContext│──▶│ ToolHandler      │  │
//! │  │ (read-only)  │   │ (per call)   │   │ → ToolResult     │  │
//! │  └──────────────┘   └──────────────┘   └──────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use grafana_mcp_core::{FieldType, InputSchema, ToolDefinition, ToolRegistry, ToolResult};
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(ToolDefinition::from_fn(
//!     "echo",
//!     "Echo a message back",
//!     InputSchema::new().required("msg", FieldType::String, "Message to echo"),
//!     |args, _ctx| async move { args.str("msg").map(ToolResult::text) },
//! ));
//!
//! assert!(registry.get("echo").is_some());
//! ```

pub mod arguments;
pub mod backend;
pub mod category;
pub mod config;
pub mod context;
pub mod error;
pub mod registry;
pub mod result;
pub mod schema;
pub mod tool;

pub use arguments::Arguments;
pub use backend::{Backend, BackendError, BackendRequest, HttpMethod};
pub use category::{all_categories, category_of, is_enabled, Category, CategorySet};
pub use config::{
    BackendConfig, Credentials, ServerConfig, ServerConfigBuilder, TlsConfig, Transport,
};
pub use context::RequestContext;
pub use error::{ConfigError, ConfigResult, ToolError};
pub use registry::ToolRegistry;
pub use result::{ContentBlock, ToolResult};
pub use schema::{FieldSpec, FieldType, FieldViolation, InputSchema, SchemaError};
pub use tool::{ToolDefinition, ToolHandler, ToolOutcome};
