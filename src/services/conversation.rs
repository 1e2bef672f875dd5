use std::sync::Arc;
use std::time::Duration;

use crate::db::{self, queries};
use crate::errors::AppError;
use crate::models::{ChatMessage, Completion, ConversationContext, ToolCallRequest, Transcript};
use crate::services::ai::ToolChoice;
use crate::services::tools::{ToolDefinition, TOOL_FAILURE_REPLY};
use crate::state::AppState;

/// Handles one inbound message end to end, except delivery of the reply.
///
/// Returns `Ok(None)` when the model produced nothing worth sending.
pub async fn process_message(
    state: &Arc<AppState>,
    from_phone: &str,
    message: &str,
) -> anyhow::Result<Option<String>> {
    let customer = {
        let db = db::lock(&state.db)?;
        queries::get_or_create_customer(&db, from_phone)?
    };

    let mut transcript = state
        .transcripts
        .checkout(&customer.phone_number, &state.config.system_prompt)
        .await;

    let ctx = ConversationContext::new(customer.phone_number);
    let reply = advance(state, &mut transcript, message, &ctx).await?;
    Ok(reply)
}

/// Runs one turn of the conversation against `transcript`.
///
/// The model is called once with the tools on offer. If it asks for tools,
/// each call is executed in the order given and answered with a `tool`
/// message, then the model is called a second time without tools to produce
/// the reply. Tool problems are folded into the transcript; only completion
/// failures are returned as errors.
pub async fn advance(
    state: &AppState,
    transcript: &mut Transcript,
    user_message: &str,
    ctx: &ConversationContext,
) -> Result<Option<String>, AppError> {
    transcript.push(ChatMessage::user(user_message));

    let first = complete(state, transcript, ToolChoice::Auto).await?;
    let reply = first.reply();
    let tool_calls = first.tool_calls.clone();
    transcript.push(ChatMessage::assistant(first.content, first.tool_calls));

    if tool_calls.is_empty() {
        return Ok(reply);
    }

    tracing::info!(
        conversation_id = %ctx.conversation_id,
        count = tool_calls.len(),
        "model requested tool calls"
    );

    for call in &tool_calls {
        let result = run_tool_call(state, call, ctx).await;
        transcript.push(ChatMessage::tool_result(&call.id, &call.function.name, result));
    }

    let last = complete(state, transcript, ToolChoice::None).await?;
    if !last.tool_calls.is_empty() {
        // Nothing would answer these; keep the transcript balanced.
        tracing::warn!(
            count = last.tool_calls.len(),
            "dropping tool calls from a completion made without tools"
        );
    }
    let reply = last.reply();
    transcript.push(ChatMessage::assistant(last.content, vec![]));

    Ok(reply)
}

async fn complete(
    state: &AppState,
    transcript: &Transcript,
    tool_choice: ToolChoice,
) -> Result<Completion, AppError> {
    let tools: &[ToolDefinition] = match tool_choice {
        ToolChoice::Auto => state.tools.definitions(),
        ToolChoice::None => &[],
    };
    let secs = state.config.completion_timeout_secs;

    let call = state.llm.complete(transcript.messages(), tools, tool_choice);
    match tokio::time::timeout(Duration::from_secs(secs), call).await {
        Ok(Ok(completion)) => Ok(completion),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "completion call failed");
            Err(AppError::Completion(format!("{e:#}")))
        }
        Err(_) => {
            tracing::error!(secs, "completion call timed out");
            Err(AppError::CompletionTimeout { secs })
        }
    }
}

/// Executes one requested tool call and returns the text for its `tool`
/// message. Never fails.
async fn run_tool_call(state: &AppState, call: &ToolCallRequest, ctx: &ConversationContext) -> String {
    let name = call.function.name.as_str();

    let invocation = match state
        .tools
        .resolve(name)
        .and_then(|tool| tool.parse_arguments(&call.function.arguments, ctx))
    {
        Ok(invocation) => invocation,
        Err(e) => {
            tracing::warn!(tool = name, call_id = %call.id, error = %e, "rejected tool call");
            return format!("Error: {e}");
        }
    };

    tracing::info!(tool = name, args = ?invocation, "calling tool");

    match invocation.execute(state.bookings.as_ref()).await {
        Ok(result) => {
            tracing::info!(tool = name, result = %result, "tool responded");
            result
        }
        Err(e) => {
            tracing::error!(tool = name, error = %e, "tool failed");
            TOOL_FAILURE_REPLY.to_string()
        }
    }
}
