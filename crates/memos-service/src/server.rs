//! MCP server exposing the memo tools over stdio.

use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::router::prompt::PromptRouter;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, GetPromptRequestParams, GetPromptResult, Implementation, ListPromptsResult,
    PaginatedRequestParams, PromptMessage, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{
    prompt, prompt_handler, prompt_router, tool, tool_handler, tool_router, ErrorData,
    RoleServer, ServerHandler, ServiceExt,
};
use tracing::{debug, info};

use memos_types::BuildInfo;

use crate::retrieval::Retriever;
use crate::tools::{self, AddMemoPromptArgs, RepeatArgs, RetrieveMemoArgs, StoreMemoArgs};

/// Name the server reports to clients.
pub const SERVER_NAME: &str = "agent-memos";

/// Usage instructions sent with the server info.
pub const INSTRUCTIONS: &str = "You are an assistant that helps users record and retrieve text
- When recording, make the description of the content as detailed as possible for accurate future retrieval
- When retrieving, it's recommended to be more specific in descriptions for more accurate text retrieval";

/// Tool server over a shared [`Retriever`].
#[derive(Clone)]
pub struct MemosServer {
    retriever: Arc<Retriever>,
    build: Arc<BuildInfo>,
    tool_router: ToolRouter<MemosServer>,
    prompt_router: PromptRouter<MemosServer>,
}

#[tool_router]
impl MemosServer {
    pub fn new(retriever: Arc<Retriever>, build: BuildInfo) -> Self {
        Self {
            retriever,
            build: Arc::new(build),
            tool_router: Self::tool_router(),
            prompt_router: Self::prompt_router(),
        }
    }

    pub fn retriever(&self) -> &Arc<Retriever> {
        &self.retriever
    }

    #[tool(
        name = "storeMemo",
        description = "Save important text information with tags for future retrieval"
    )]
    async fn store_memo(
        &self,
        Parameters(args): Parameters<StoreMemoArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        debug!(description = %args.description, "storeMemo called");
        Ok(tools::store_memo(&self.retriever, args).await)
    }

    #[tool(
        name = "retrieveMemo",
        description = "Retrieve previously saved text content based on description"
    )]
    async fn retrieve_memo(
        &self,
        Parameters(args): Parameters<RetrieveMemoArgs>,
        ctx: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        debug!(description = %args.description, "retrieveMemo called");
        Ok(tools::retrieve_memo(&self.retriever, args, &ctx.ct).await)
    }

    #[tool(name = "repeat", description = "Repeat user input text")]
    async fn repeat(
        &self,
        Parameters(args): Parameters<RepeatArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        Ok(tools::repeat(args))
    }
}

#[prompt_router]
impl MemosServer {
    #[prompt(name = "add_memo_prompt", description = "prompt to add a memo")]
    async fn add_memo_prompt(
        &self,
        Parameters(args): Parameters<AddMemoPromptArgs>,
    ) -> Result<Vec<PromptMessage>, ErrorData> {
        Ok(tools::add_memo_messages(args))
    }
}

#[tool_handler]
#[prompt_handler]
impl ServerHandler for MemosServer {
    fn get_info(&self) -> ServerInfo {
        let mut implementation = Implementation::from_build_env();
        implementation.name = SERVER_NAME.to_string();
        implementation.version = self.build.long_version();

        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder()
            .enable_tools()
            .enable_prompts()
            .build();
        info.server_info = implementation;
        info.instructions = Some(INSTRUCTIONS.to_string());
        info
    }
}

/// Serve `server` on stdin/stdout until the client disconnects.
pub async fn run_stdio_server(
    server: MemosServer,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    run_stdio_server_with_shutdown(server, std::future::pending()).await
}

/// Serve `server` on stdin/stdout until the client disconnects or
/// `shutdown_signal` resolves.
pub async fn run_stdio_server_with_shutdown<F>(
    server: MemosServer,
    shutdown_signal: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(version = %server.build.long_version(), "Starting MCP server on stdio");

    let service = server.serve(rmcp::transport::stdio()).await?;
    info!("MCP server ready");

    let cancel = service.cancellation_token();
    tokio::spawn(async move {
        shutdown_signal.await;
        info!("Shutdown requested, closing MCP session");
        cancel.cancel();
    });

    let reason = service.waiting().await?;
    info!(?reason, "MCP server stopped");
    Ok(())
}
