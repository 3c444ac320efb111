//! Stream orchestrator: turns one chat request into a data stream.
//!
//! A run converts and truncates history, optionally runs the manual tool
//! pre-pass, then streams the provider, dispatching native tool calls
//! between steps. When generation ends it suggests related questions and
//! persists the turn.
//!
//! The returned stream owns the provider stream. Dropping it (a client
//! disconnect) aborts the upstream request, and an aborted turn is never
//! persisted.

pub use convert::to_provider;
pub use phase::{Phase, Run};
pub use reasoning::ReasoningTimer;

use crate::{
    config::ChatConfig,
    hook::Hook,
    tools::{ASK_QUESTION, ToolSet},
    utils::new_id,
};
use anyhow::Result;
use chrono::Utc;
use futures_core::Stream;
use futures_util::StreamExt;
use llm::{
    FinishReason, General, LLM, Message, Role, ToolChoice, Usage, default_context_limit,
    is_reasoning_model, max_allowed_tokens, truncate,
};
use pcore::{ErrorKind, Store, chat_path, chat_title};
use protocol::{
    Chat, DataStreamPart, FinishPart, InvocationState, ModelSpec, ReasoningData,
    StreamAnnotation, TokenUsage, ToolCallType, ToolInvocation, UiMessage,
};
use reply::Reply;
use serde_json::{Value, json};
use std::sync::Arc;

mod convert;
mod manual;
mod phase;
mod prompt;
mod reasoning;
mod related;
mod reply;

/// One chat request.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    /// Full UI history, newest last.
    pub messages: Vec<UiMessage>,
    /// The selected model.
    pub model: ModelSpec,
    /// Chat id, already resolved from `"new"`.
    pub chat_id: String,
    /// Whether tools may be used.
    pub search_mode: bool,
    /// Owner of the chat.
    pub user_id: String,
}

/// Drives a chat run against a provider, a store, and the tool set.
pub struct Orchestrator<H: Hook> {
    provider: H::Provider,
    store: Arc<H::Store>,
    tools: Arc<ToolSet<H::Search>>,
    settings: ChatConfig,
}

impl<H: Hook> Clone for Orchestrator<H> {
    fn clone(&self) -> Self {
        Self {
            provider: self.provider.clone(),
            store: Arc::clone(&self.store),
            tools: Arc::clone(&self.tools),
            settings: self.settings.clone(),
        }
    }
}

impl<H: Hook> Orchestrator<H> {
    /// Create an orchestrator for one provider.
    pub fn new(
        provider: H::Provider,
        store: Arc<H::Store>,
        tools: Arc<ToolSet<H::Search>>,
        settings: ChatConfig,
    ) -> Self {
        Self {
            provider,
            store,
            tools,
            settings,
        }
    }

    /// Run a chat turn.
    ///
    /// Failures end the stream with a `3:` part carrying the user-facing
    /// message; parts already yielded stand.
    pub fn run(self, turn: ChatTurn) -> impl Stream<Item = DataStreamPart> + Send + 'static {
        async_stream::stream! {
            let mut run = Run::new(turn.chat_id.as_str());
            let failure = {
                let inner = self.generate(&mut run, turn);
                futures_util::pin_mut!(inner);
                let mut failure = None;
                while let Some(item) = inner.next().await {
                    match item {
                        Ok(part) => yield part,
                        Err(e) => {
                            failure = Some(e);
                            break;
                        }
                    }
                }
                failure
            };

            if let Some(e) = failure {
                tracing::error!("chat run failed during {:?}: {e:#}", run.phase());
                if let Err(e) = run.advance(Phase::Errored) {
                    tracing::warn!("{e}");
                }
                yield DataStreamPart::Error(ErrorKind::of(&e).user_message().to_owned());
            }
        }
    }

    fn generate<'a>(
        &'a self,
        run: &'a mut Run,
        turn: ChatTurn,
    ) -> impl Stream<Item = Result<DataStreamPart>> + Send + 'a {
        async_stream::try_stream! {
            run.advance(Phase::BuildingContext)?;
            let ChatTurn {
                messages,
                model,
                chat_id,
                search_mode,
                user_id,
            } = turn;
            let qualified = model.qualified_id();
            let manual = model.tool_call_type == ToolCallType::Manual;
            let native_tools = search_mode && !manual;

            let mut history = vec![Message::system(prompt::system_prompt(native_tools))];
            history.extend(convert::to_provider(&messages));
            let budget = max_allowed_tokens(default_context_limit(&qualified));
            let mut history = truncate(history, budget)?;
            tracing::debug!(
                "chat {chat_id}: {} messages in context for {qualified}",
                history.len()
            );

            let mut reply = Reply::new(new_id());
            let mut timer = ReasoningTimer::new();

            if manual && search_mode {
                run.advance(Phase::ToolPrepass)?;
                let selection =
                    manual::select(&self.provider, model.tool_call_model().into(), &history)
                        .await?;
                if let Some(selection) = selection {
                    let mut invocation = ToolInvocation {
                        state: InvocationState::Call,
                        tool_call_id: format!("call_{}", new_id()),
                        tool_name: selection.tool.clone(),
                        args: selection.args.clone(),
                        result: None,
                    };
                    yield DataStreamPart::Data(vec![
                        StreamAnnotation::ToolCall(invocation.clone()).to_value(),
                    ]);

                    let result = self.execute(&selection.tool, &selection.args.to_string()).await;
                    invocation.state = InvocationState::Result;
                    invocation.result = Some(result.clone());
                    let annotation = StreamAnnotation::ToolCall(invocation).to_value();
                    yield DataStreamPart::Annotations(vec![annotation.clone()]);
                    reply.annotate(annotation);
                    history.extend(manual::result_messages(&result));
                }
            }

            run.advance(Phase::Generating)?;
            let tools = if native_tools {
                self.tools.definitions()
            } else {
                Vec::new()
            };
            let steps = if native_tools {
                self.settings.max_steps.max(1)
            } else {
                1
            };
            let mut total = Usage::default();
            let mut finish = FinishReason::Stop;
            let mut asked = false;

            for step in 0..steps {
                let last = step + 1 == steps;
                let mut config = General::new(model.id.clone()).with_tools(tools.clone());
                if last && step > 0 {
                    // force an answer once the step budget is spent
                    config = config.with_tool_choice(ToolChoice::None);
                }

                yield DataStreamPart::StartStep {
                    message_id: reply.id().to_owned(),
                };
                reply.step_start();

                let mut builder = Message::builder(Role::Assistant);
                let mut reason = None;
                let mut usage = None;
                {
                    let inner = self.provider.stream(config, &history, true);
                    futures_util::pin_mut!(inner);
                    while let Some(chunk) = inner.next().await {
                        let chunk = chunk?;
                        tracing::trace!("chat {chat_id}: {chunk:?}");

                        if let Some(time) = timer.observe(&chunk) {
                            let annotation = StreamAnnotation::Reasoning(ReasoningData {
                                time,
                                reasoning: None,
                            });
                            yield DataStreamPart::Annotations(vec![annotation.to_value()]);
                        }
                        if let Some(delta) = chunk.reasoning_content() {
                            reply.reasoning(delta);
                            yield DataStreamPart::Reasoning(delta.to_owned());
                        }
                        if let Some(delta) = chunk.content() {
                            reply.text(delta);
                            yield DataStreamPart::Text(delta.to_owned());
                        }

                        builder.accept(&chunk);
                        if let Some(value) = chunk.usage {
                            usage = Some(value);
                        }
                        if let Some(value) = chunk.reason() {
                            reason = Some(*value);
                        }
                    }
                }
                if let Some(time) = timer.close() {
                    let annotation = StreamAnnotation::Reasoning(ReasoningData {
                        time,
                        reasoning: None,
                    });
                    yield DataStreamPart::Annotations(vec![annotation.to_value()]);
                }

                let step_usage = usage.unwrap_or_default();
                total = total.add(step_usage);
                let mut message = builder.build();
                for call in message.tool_calls.iter_mut() {
                    if call.id.is_empty() {
                        call.id = format!("call_{}", new_id()).into();
                    }
                }

                if message.tool_calls.is_empty() {
                    finish = reason.unwrap_or(FinishReason::Stop);
                    yield DataStreamPart::FinishStep(step_finish(finish, step_usage, false));
                    history.push(message);
                    break;
                }

                finish = FinishReason::ToolCalls;
                let calls = message.tool_calls.clone();
                history.push(message);
                for call in &calls {
                    let args = parse_args(&call.function.arguments);
                    reply.tool_call(&call.id, &call.function.name, args.clone());
                    yield DataStreamPart::ToolCall {
                        tool_call_id: call.id.to_string(),
                        tool_name: call.function.name.to_string(),
                        args,
                    };
                }

                // the client answers ask_question, so the run ends here
                if calls.iter().any(|call| call.function.name == ASK_QUESTION) {
                    asked = true;
                    yield DataStreamPart::FinishStep(step_finish(finish, step_usage, false));
                    break;
                }

                for call in &calls {
                    let result = self.execute(&call.function.name, &call.function.arguments).await;
                    reply.tool_result(&call.id, result.clone());
                    history.push(Message::tool(result.to_string(), call.id.clone()));
                    yield DataStreamPart::ToolResult {
                        tool_call_id: call.id.to_string(),
                        result,
                    };
                }
                yield DataStreamPart::FinishStep(step_finish(finish, step_usage, !last));
            }

            run.advance(Phase::Finishing)?;
            if let Some(time) = timer.total() {
                let reasoning = reply.reasoning_text();
                let annotation = StreamAnnotation::Reasoning(ReasoningData {
                    time,
                    reasoning: (!reasoning.is_empty()).then_some(reasoning),
                });
                reply.annotate(annotation.to_value());
            }

            let skip_related = !self.settings.related_questions
                || manual
                || asked
                || is_reasoning_model(&qualified);
            if !skip_related {
                match related::generate(&self.provider, model.id.clone(), &history).await {
                    Ok(questions) if !questions.items.is_empty() => {
                        let annotation = StreamAnnotation::RelatedQuestions(questions).to_value();
                        yield DataStreamPart::Annotations(vec![annotation.clone()]);
                        reply.annotate(annotation);
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("related questions for chat {chat_id} failed: {e:#}"),
                }
            }

            if self.settings.save_history {
                self.persist(&chat_id, &user_id, reply.into_messages(messages))
                    .await;
            }

            yield DataStreamPart::FinishMessage(FinishPart::new(
                finish_reason(finish),
                token_usage(total),
            ));
            run.advance(Phase::Completed)?;
        }
    }

    /// Run a gateway-side tool. Failures become an `{"error": ..}` result
    /// the model can read.
    async fn execute(&self, name: &str, arguments: &str) -> Value {
        match self.tools.execute(name, arguments).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("tool {name} failed: {e:#}");
                json!({ "error": e.to_string() })
            }
        }
    }

    async fn persist(&self, chat_id: &str, user_id: &str, messages: Vec<UiMessage>) {
        let chat = Chat {
            id: chat_id.to_owned(),
            title: chat_title(&messages),
            path: chat_path(chat_id),
            created_at: Utc::now(),
            user_id: user_id.to_owned(),
            messages,
        };
        match self.store.save_chat(chat).await {
            Ok(()) => tracing::debug!("saved chat {chat_id} for {user_id}"),
            Err(e) => tracing::error!("failed to save chat {chat_id}: {e:#}"),
        }
    }
}

fn parse_args(arguments: &str) -> Value {
    if arguments.trim().is_empty() {
        return json!({});
    }
    serde_json::from_str(arguments).unwrap_or_else(|_| Value::String(arguments.to_owned()))
}

fn finish_reason(reason: FinishReason) -> &'static str {
    match reason {
        FinishReason::Stop => "stop",
        FinishReason::Length => "length",
        FinishReason::ContentFilter => "content-filter",
        FinishReason::ToolCalls => "tool-calls",
        FinishReason::Error => "error",
        FinishReason::Other => "other",
    }
}

fn token_usage(usage: Usage) -> TokenUsage {
    TokenUsage {
        prompt_tokens: usage.prompt_tokens,
        completion_tokens: usage.completion_tokens,
    }
}

fn step_finish(reason: FinishReason, usage: Usage, continued: bool) -> FinishPart {
    let mut part = FinishPart::new(finish_reason(reason), token_usage(usage));
    part.is_continued = Some(continued);
    part
}
