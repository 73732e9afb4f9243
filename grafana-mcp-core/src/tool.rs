//! Tool definitions and the handler trait

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::arguments::Arguments;
use crate::category::{category_of, Category};
use crate::context::RequestContext;
use crate::error::ToolError;
use crate::result::ToolResult;
use crate::schema::InputSchema;

/// What a handler returns; `Err` becomes an error envelope
pub type ToolOutcome = Result<ToolResult, ToolError>;

/// The single seam every tool implements
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with validated arguments
    async fn call(&self, args: Arguments, ctx: RequestContext) -> ToolOutcome;
}

/// Adapter letting a plain async closure act as a handler
struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> ToolHandler for FnHandler<F>
where
    F: Fn(Arguments, RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolOutcome> + Send + 'static,
{
    async fn call(&self, args: Arguments, ctx: RequestContext) -> ToolOutcome {
        (self.0)(args, ctx).await
    }
}

/// Static descriptor of one tool
///
/// Created once at startup and shared by `Arc` from then on.
#[derive(Clone)]
pub struct ToolDefinition {
    name: String,
    description: String,
    input_schema: InputSchema,
    handler: Arc<dyn ToolHandler>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler: Arc::new(handler),
        }
    }

    /// Define a tool from an async closure
    pub fn from_fn<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
        handler: F,
    ) -> Self
    where
        F: Fn(Arguments, RequestContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolOutcome> + Send + 'static,
    {
        Self::new(name, description, input_schema, FnHandler(handler))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn input_schema(&self) -> &InputSchema {
        &self.input_schema
    }

    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.handler)
    }

    /// Derived on every call, never stored
    pub fn category(&self) -> Option<Category> {
        category_of(&self.name)
    }

    /// Entry for a `tools/list` response
    pub fn to_listing(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema.to_json_schema(),
        })
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::schema::FieldType;
    use serde_json::json;

    fn context(tool: &str) -> RequestContext {
        let config = ServerConfig::builder()
            .url("http://localhost:3000")
            .api_key("k")
            .build()
            .unwrap();
        RequestContext::new(Arc::new(config), tool)
    }

    fn echo() -> ToolDefinition {
        ToolDefinition::from_fn(
            "echo",
            "Echo a message back",
            InputSchema::new().required("msg", FieldType::String, "Message to echo"),
            |args, _ctx| async move { args.str("msg").map(ToolResult::text) },
        )
    }

    #[test]
    fn test_listing_shape() {
        let listing = echo().to_listing();

        assert_eq!(listing["name"], "echo");
        assert_eq!(listing["description"], "Echo a message back");
        assert_eq!(listing["inputSchema"]["required"], json!(["msg"]));
    }

    #[test]
    fn test_category_is_derived_from_name() {
        assert_eq!(echo().category(), None);

        let teams = ToolDefinition::from_fn("list_teams", "", InputSchema::new(), |_, _| async {
            Ok(ToolResult::text("[]"))
        });
        assert_eq!(teams.category(), Some(Category::Admin));
    }

    #[tokio::test]
    async fn test_handler_runs_closure() {
        let tool = echo();
        let args = tool
            .input_schema()
            .validate(Some(&json!({"msg": "hi"})))
            .unwrap();

        let result = tool.handler().call(args, context("echo")).await.unwrap();
        assert_eq!(result, ToolResult::text("hi"));
    }

    #[test]
    fn test_debug_omits_handler() {
        let rendered = format!("{:?}", echo());
        assert!(rendered.starts_with("ToolDefinition"));
        assert!(rendered.contains("echo"));
    }
}
