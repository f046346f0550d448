//! Tool arguments and the handlers behind each MCP tool.
//!
//! The handlers take plain values so they can be exercised without an MCP
//! session; `server.rs` only wires them into the protocol router.

use rmcp::model::{CallToolResult, Content, PromptMessage, PromptMessageRole};
use rmcp::schemars;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use memos_storage::AppendOutcome;
use memos_types::Memo;

use crate::retrieval::Retriever;

/// Arguments of the `storeMemo` tool.
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct StoreMemoArgs {
    /// Add a descriptive label for the saved text. Include context information
    /// to make retrieval easier.
    pub description: String,
    /// Actual text content to be saved, such as keys, code snippets, notes, etc.
    pub content: String,
}

/// Arguments of the `retrieveMemo` tool.
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct RetrieveMemoArgs {
    /// Description of the content you want to find; the most closely matching
    /// saved content is returned.
    pub description: String,
}

/// Arguments of the `repeat` tool.
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct RepeatArgs {
    /// Text that needs to be repeated
    pub text: String,
}

/// Arguments of the `add_memo_prompt` prompt.
#[derive(Debug, Clone, Deserialize, schemars::JsonSchema)]
#[schemars(crate = "rmcp::schemars")]
pub struct AddMemoPromptArgs {
    /// The description of the memo, for search later
    pub description: String,
    /// The content of the memo
    pub content: String,
}

pub async fn store_memo(retriever: &Retriever, args: StoreMemoArgs) -> CallToolResult {
    match retriever.store(&args.description, &args.content).await {
        Ok(outcome) => {
            match outcome {
                AppendOutcome::Stored(memo) => info!(id = memo.id, "Stored memo"),
                AppendOutcome::Duplicate { existing_id } => {
                    info!(existing_id, "Content already stored, skipping")
                }
            }
            CallToolResult::success(vec![Content::text(format!(
                "Text `{}` has been saved to {}",
                args.content,
                retriever.store_path().display()
            ))])
        }
        Err(e) => {
            warn!(error = %e, "Failed to store memo");
            CallToolResult::error(vec![Content::text(format!("Failed to save text: {e}"))])
        }
    }
}

pub async fn retrieve_memo(
    retriever: &Retriever,
    args: RetrieveMemoArgs,
    cancel: &CancellationToken,
) -> CallToolResult {
    match retriever.retrieve(&args.description, cancel).await {
        Ok(answer) => CallToolResult::success(vec![Content::text(answer)]),
        Err(e) => {
            warn!(error = %e, "Retrieval failed");
            CallToolResult::error(vec![Content::text(e.user_message())])
        }
    }
}

pub fn repeat(args: RepeatArgs) -> CallToolResult {
    CallToolResult::success(vec![Content::text(args.text)])
}

/// Conversation that walks the agent into calling `storeMemo`.
pub fn add_memo_messages(args: AddMemoPromptArgs) -> Vec<PromptMessage> {
    // Id 0: the memo has not been assigned one yet
    let memo = Memo::new(0, args.description, args.content);
    vec![
        PromptMessage::new_text(
            PromptMessageRole::User,
            "Call the `storeMemo` tool to save the following content to my memo",
        ),
        PromptMessage::new_text(PromptMessageRole::User, memo.to_string()),
        PromptMessage::new_text(
            PromptMessageRole::Assistant,
            "Okay, I will directly call the `storeMemo` tool to save the content to memo",
        ),
        PromptMessage::new_text(
            PromptMessageRole::User,
            "Alright, you need to call the tool now, please start",
        ),
    ]
}
