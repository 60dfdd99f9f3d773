//! Tasknest MCP binary - exposes the agent tool façade over MCP stdio
//!
//! Usage:
//!   tasknest-mcp serve    - Run as MCP server (stdio transport)
//!
//! Tools call the running tasknest server's agent endpoints; every tool
//! relays the structured success/failure envelope so the agent can read
//! error text instead of crashing on transport errors.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rmcp::{
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{
        CallToolResult, Content, ErrorCode, Implementation, ProtocolVersion, ServerCapabilities,
        ServerInfo,
    },
    schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{borrow::Cow, sync::Arc};

// =============================================================================
// CLI STRUCTURE
// =============================================================================

#[derive(Parser)]
#[command(name = "tasknest-mcp")]
#[command(about = "Tasknest - MCP server for task management tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as MCP server (stdio transport)
    Serve {
        /// API URL for the tasknest server
        #[arg(long, env = "TASKNEST_API_URL", default_value = "http://127.0.0.1:3030")]
        api_url: String,

        /// Bearer token for authentication
        #[arg(long, env = "TASKNEST_API_TOKEN", default_value = "dev-user")]
        api_token: String,
    },
}

// =============================================================================
// API CLIENT
// =============================================================================

/// HTTP client for the tasknest agent tool endpoints
#[derive(Clone, Debug)]
struct AsyncApiClient {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl AsyncApiClient {
    fn new(base_url: String, api_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            api_token,
        }
    }

    /// Invoke a named tool. The server always answers 200 with an envelope;
    /// other statuses are transport-level failures.
    async fn invoke_tool(&self, tool: &str, args: &Value) -> Result<Value> {
        let url = format!("{}/api/agent/tools/{}", self.base_url, tool);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(args)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("API error {}: {}", status, text);
        }

        Ok(resp.json().await?)
    }
}

// =============================================================================
// MCP TOOL PARAMETER TYPES
// =============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct AddTaskParams {
    /// Title of the task (required, max 255 characters)
    title: String,
    /// Optional longer description (max 1000 characters)
    description: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct ListTasksParams {
    /// Filter: "all" (default), "completed", or "incomplete"
    filter: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct SetCompletionParams {
    /// Task ID or a fragment of the task title
    identifier: String,
    /// true to mark complete, false to mark incomplete
    completed: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct DeleteTaskParams {
    /// Task ID or a fragment of the task title
    identifier: String,
    /// Must be true to actually delete; a first call without it returns a
    /// confirmation prompt and deletes nothing
    confirmed: Option<bool>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
struct UpdateTaskParams {
    /// Task ID or a fragment of the task title
    identifier: String,
    /// New title (optional)
    new_title: Option<String>,
    /// New description (optional; empty string clears it)
    new_description: Option<String>,
}

// =============================================================================
// MCP SERVER
// =============================================================================

#[derive(Debug, Clone)]
struct TasknestMcpServer {
    client: Arc<AsyncApiClient>,
    tool_router: ToolRouter<Self>,
}

/// Render a tool envelope as MCP text content. Envelope failures
/// ({"success": false}) are still successful tool calls: the agent reads
/// the error text and decides what to do.
fn envelope_to_result(result: Result<Value>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(envelope) => {
            let text = serde_json::to_string_pretty(&envelope)
                .unwrap_or_else(|_| envelope.to_string());
            Ok(CallToolResult::success(vec![Content::text(text)]))
        }
        Err(e) => Err(McpError {
            code: ErrorCode::INTERNAL_ERROR,
            message: Cow::from(e.to_string()),
            data: None,
        }),
    }
}

#[tool_router]
impl TasknestMcpServer {
    fn new(api_url: String, api_token: String) -> Self {
        Self {
            client: Arc::new(AsyncApiClient::new(api_url, api_token)),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Create a new task with a title and optional description.")]
    async fn add_task(
        &self,
        Parameters(params): Parameters<AddTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        let args = json!({
            "title": params.title,
            "description": params.description,
        });
        envelope_to_result(self.client.invoke_tool("add_task", &args).await)
    }

    #[tool(description = "List your tasks. Filter by 'all' (default), 'completed', or 'incomplete'. An empty list is a normal result, not an error.")]
    async fn list_tasks(
        &self,
        Parameters(params): Parameters<ListTasksParams>,
    ) -> Result<CallToolResult, McpError> {
        let args = json!({ "filter": params.filter });
        envelope_to_result(self.client.invoke_tool("list_tasks", &args).await)
    }

    #[tool(description = "Mark a task complete or incomplete. Identify the task by its numeric ID or a fragment of its title. If several tasks match, the result lists the candidates so you can be more specific.")]
    async fn set_task_completion(
        &self,
        Parameters(params): Parameters<SetCompletionParams>,
    ) -> Result<CallToolResult, McpError> {
        let args = json!({
            "identifier": params.identifier,
            "completed": params.completed,
        });
        envelope_to_result(
            self.client
                .invoke_tool("set_task_completion", &args)
                .await,
        )
    }

    #[tool(description = "Delete a task. The first call (without confirmed=true) deletes nothing and returns a confirmation prompt with the task that would be removed; call again with confirmed=true to actually delete. Prefer confirming by the task ID from the prompt.")]
    async fn delete_task(
        &self,
        Parameters(params): Parameters<DeleteTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        let args = json!({
            "identifier": params.identifier,
            "confirmed": params.confirmed.unwrap_or(false),
        });
        envelope_to_result(self.client.invoke_tool("delete_task", &args).await)
    }

    #[tool(description = "Update a task's title and/or description. Pass an empty new_description to clear it. The result reports exactly which fields changed, with old and new values.")]
    async fn update_task(
        &self,
        Parameters(params): Parameters<UpdateTaskParams>,
    ) -> Result<CallToolResult, McpError> {
        let args = json!({
            "identifier": params.identifier,
            "new_title": params.new_title,
            "new_description": params.new_description,
        });
        envelope_to_result(self.client.invoke_tool("update_task", &args).await)
    }
}

#[tool_handler]
impl ServerHandler for TasknestMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Tasknest - personal task management tools. \
                 Tasks can be identified by numeric ID or by a fragment of their title. \
                 Deleting a task requires a second, confirmed call."
                    .to_string(),
            ),
        }
    }
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { api_url, api_token } => {
            eprintln!("Starting tasknest MCP server...");
            eprintln!("  API URL: {}", api_url);

            let server = TasknestMcpServer::new(api_url, api_token);
            let service = server.serve(rmcp::transport::stdio()).await?;
            service.waiting().await?;
        }
    }

    Ok(())
}
