//! Scripted model and tool doubles shared by the agent tests.

#![allow(clippy::panic)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::message::{ChatRequest, ChatResponse, Role, TokenUsage};
use super::provider::LlmProvider;
use super::tool::{ToolCall, ToolOutcome, ToolSpec};
use super::toolbox::ToolProvider;
use crate::error::AgentError;

/// One scripted model reply.
#[derive(Debug, Clone)]
pub enum Step {
    /// Final text.
    Text(String),
    /// Tool calls as `(name, arguments)`.
    Tools(Vec<(String, String)>),
    /// Provider error with this message.
    Fail(String),
    /// Sleep, then answer `"late"`.
    Delay(Duration),
    /// Panic inside the provider call.
    Panic,
}

impl Step {
    pub fn text(s: &str) -> Self {
        Self::Text(s.to_string())
    }

    pub fn tools(calls: &[(&str, &str)]) -> Self {
        Self::Tools(
            calls
                .iter()
                .map(|(n, a)| ((*n).to_string(), (*a).to_string()))
                .collect(),
        )
    }

    async fn play(&self, turn: usize) -> Result<ChatResponse, AgentError> {
        let reply = |content: String, tool_calls: Vec<ToolCall>| ChatResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            },
            finish_reason: Some(
                if tool_calls.is_empty() { "stop" } else { "tool_calls" }.to_string(),
            ),
            tool_calls,
        };
        match self {
            Self::Text(t) => Ok(reply(t.clone(), Vec::new())),
            Self::Tools(calls) => Ok(reply(
                String::new(),
                calls
                    .iter()
                    .enumerate()
                    .map(|(i, (name, args))| ToolCall {
                        id: format!("call_{turn}_{i}"),
                        name: name.clone(),
                        arguments: args.clone(),
                    })
                    .collect(),
            )),
            Self::Fail(message) => Err(AgentError::ApiRequest {
                message: message.clone(),
                status: Some(503),
            }),
            Self::Delay(d) => {
                tokio::time::sleep(*d).await;
                Ok(reply("late".to_string(), Vec::new()))
            }
            Self::Panic => panic!("scripted provider panic"),
        }
    }
}

/// Plays its steps in order; the last step repeats forever.
pub struct ScriptedProvider {
    steps: Vec<Step>,
    turn: AtomicUsize,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedProvider {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            turn: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.turn.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());
        let turn = self.turn.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .get(turn)
            .or_else(|| self.steps.last())
            .cloned()
            .unwrap_or_else(|| Step::Fail("empty script".to_string()));
        step.play(turn).await
    }
}

/// Picks a step by the first route whose key occurs in the system prompt.
pub struct RoutedProvider {
    routes: Vec<(String, Step)>,
    started: AtomicUsize,
    finished: AtomicUsize,
}

impl RoutedProvider {
    pub fn new(routes: &[(&str, Step)]) -> Self {
        Self {
            routes: routes
                .iter()
                .map(|(k, s)| ((*k).to_string(), s.clone()))
                .collect(),
            started: AtomicUsize::new(0),
            finished: AtomicUsize::new(0),
        }
    }

    /// Calls that reached the provider.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    /// Calls that ran to completion (cancelled calls never count).
    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for RoutedProvider {
    fn name(&self) -> &'static str {
        "routed"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let system = request
            .messages
            .iter()
            .find(|m| m.role == Role::System)
            .map_or("", |m| m.content.as_str());
        let step = self
            .routes
            .iter()
            .find(|(key, _)| system.contains(key.as_str()))
            .map_or_else(|| Step::Fail("no route".to_string()), |(_, s)| s.clone());
        self.started.fetch_add(1, Ordering::SeqCst);
        let result = step.play(0).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// How [`MockTools`] answers one tool name.
#[derive(Debug, Clone)]
pub enum ToolBehaviour {
    Reply(ToolOutcome),
    Fail(String),
    Hang,
}

/// In-memory tool backend recording every invocation.
pub struct MockTools {
    catalog: Vec<ToolSpec>,
    behaviours: HashMap<String, ToolBehaviour>,
    invocations: Mutex<Vec<(String, Map<String, Value>)>>,
    hang_on_list: bool,
}

impl MockTools {
    pub fn new(behaviours: &[(&str, ToolBehaviour)]) -> Self {
        Self {
            catalog: behaviours
                .iter()
                .map(|(name, _)| ToolSpec {
                    name: (*name).to_string(),
                    description: format!("{name} tool"),
                    input_schema: Value::Null,
                })
                .collect(),
            behaviours: behaviours
                .iter()
                .map(|(n, b)| ((*n).to_string(), b.clone()))
                .collect(),
            invocations: Mutex::new(Vec::new()),
            hang_on_list: false,
        }
    }

    /// A backend whose `list_tools` never answers.
    pub fn hanging_catalog() -> Self {
        Self {
            hang_on_list: true,
            ..Self::new(&[])
        }
    }

    pub fn invocations(&self) -> Vec<(String, Map<String, Value>)> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ToolProvider for MockTools {
    fn name(&self) -> &'static str {
        "mock-tools"
    }

    async fn list_tools(&self) -> Result<Vec<ToolSpec>, AgentError> {
        if self.hang_on_list {
            std::future::pending::<()>().await;
        }
        Ok(self.catalog.clone())
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolOutcome, AgentError> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((name.to_string(), arguments));
        match self.behaviours.get(name) {
            Some(ToolBehaviour::Reply(outcome)) => Ok(outcome.clone()),
            Some(ToolBehaviour::Fail(message)) => Err(AgentError::ToolInvocation {
                name: name.to_string(),
                message: message.clone(),
            }),
            Some(ToolBehaviour::Hang) => {
                std::future::pending::<()>().await;
                Ok(ToolOutcome::default())
            }
            None => Err(AgentError::ToolInvocation {
                name: name.to_string(),
                message: "unknown tool".to_string(),
            }),
        }
    }
}
