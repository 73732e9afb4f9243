//! Grafana tool sets
//!
//! Each module contributes the definitions for one category. Handlers are
//! thin: build a [`BackendRequest`], hand it to the backend, shape the answer.

use std::future::Future;
use std::sync::Arc;

use grafana_mcp_core::{Arguments, Backend, BackendRequest, InputSchema, ToolDefinition, ToolError, ToolOutcome, ToolResult};
use url::Url;

pub mod admin;
pub mod alerting;
pub mod asserts;
pub mod dashboard;
pub mod datasource;
pub mod incident;
pub mod loki;
pub mod navigation;
pub mod oncall;
pub mod prometheus;
pub mod pyroscope;
pub mod search;
pub mod sift;
pub mod timerange;

/// Every tool this server offers
pub fn all(backend: Arc<dyn Backend>) -> Vec<ToolDefinition> {
    let mut tools = Vec::new();
    tools.extend(search::tools(&backend));
    tools.extend(dashboard::tools(&backend));
    tools.extend(datasource::tools(&backend));
    tools.extend(prometheus::tools(&backend));
    tools.extend(loki::tools(&backend));
    tools.extend(incident::tools(&backend));
    tools.extend(alerting::tools(&backend));
    tools.extend(oncall::tools(&backend));
    tools.extend(sift::tools(&backend));
    tools.extend(pyroscope::tools(&backend));
    tools.extend(navigation::tools());
    tools.extend(asserts::tools(&backend));
    tools.extend(admin::tools(&backend));
    tools
}

/// Define a tool whose handler only needs the backend and its arguments
pub(crate) fn backed<F, Fut>(
    backend: &Arc<dyn Backend>,
    name: &str,
    description: &str,
    schema: InputSchema,
    handler: F,
) -> ToolDefinition
where
    F: Fn(Arc<dyn Backend>, Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ToolOutcome> + Send + 'static,
{
    let backend = Arc::clone(backend);
    ToolDefinition::from_fn(name, description, schema, move |args, _ctx| {
        handler(Arc::clone(&backend), args)
    })
}

/// Send one request and return the payload pretty-printed
pub(crate) async fn fetch_json(backend: &dyn Backend, request: BackendRequest) -> ToolOutcome {
    let value = backend.call(request).await?;
    ToolResult::json(&value)
}

/// Join segments into a path relative to the Grafana root
///
/// Each segment is percent-encoded on its own, so a `/` inside a UID stays
/// part of that UID.
pub(crate) fn api_path<I>(segments: I) -> Result<String, ToolError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut url = Url::parse("http://grafana.invalid/").map_err(|e| ToolError::Other(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| ToolError::Other("base URL cannot hold a path".to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.path().trim_start_matches('/').to_string())
}

/// Grafana datasource proxy path for a datasource UID
pub(crate) fn datasource_proxy(uid: &str, rest: &[&str]) -> Result<String, ToolError> {
    api_path(
        ["api", "datasources", "proxy", "uid", uid]
            .into_iter()
            .chain(rest.iter().copied()),
    )
}
