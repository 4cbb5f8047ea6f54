//! Iterative tool-calling for the primary agent and its shell sub-agent.

use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::{Agent, AgentError};
use crate::internal::ai::{
    completion::{CompletionModel, CompletionRequest, CompletionResponse, Message, ToolCall},
    hooks::{AgentHooks, IsolationMeta, SubWorkerResult, ToolArgs, ToolCallOutcome},
    sandbox::SandboxVerdict,
    tools::{RUN_SHELL, SHELL_AGENT, ToolOutput, ToolSpec},
};

const DENIED: &str = "The user denied this tool call. Do not retry it unchanged.";

impl<M: CompletionModel> Agent<M> {
    async fn complete_step(
        &self,
        preamble: &str,
        history: &[Message],
        tools: Vec<ToolSpec>,
        cancel: &CancellationToken,
    ) -> Result<CompletionResponse, AgentError> {
        let request = CompletionRequest {
            preamble: Some(preamble.to_string()),
            chat_history: history.to_vec(),
            tools,
            temperature: self.config.temperature,
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AgentError::Cancelled),
            response = self.model.completion(request) => Ok(response?),
        }
    }

    pub(super) async fn run_primary_loop(
        &self,
        preamble: &str,
        history: &mut Vec<Message>,
        hooks: &dyn AgentHooks,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        for _ in 0..self.config.max_steps {
            let response = self
                .complete_step(preamble, history, self.tool_specs.clone(), cancel)
                .await?;
            history.push(response.to_message());

            if response.tool_calls.is_empty() {
                return Ok(response.text.unwrap_or_default());
            }
            if let Some(text) = &response.text {
                hooks.on_message(text);
            }

            for call in &response.tool_calls {
                let content = self.execute_primary(call, hooks, cancel).await;
                history.push(Message::tool_result(&call.id, content));
                if cancel.is_cancelled() {
                    return Err(AgentError::Cancelled);
                }
            }
        }
        Err(AgentError::MaxSteps(self.config.max_steps))
    }

    async fn run_nested_loop(
        &self,
        history: &mut Vec<Message>,
        hooks: &dyn AgentHooks,
        cancel: &CancellationToken,
    ) -> Result<String, AgentError> {
        let tools = vec![self.shell_spec()];
        for _ in 0..self.config.max_steps {
            let response = self
                .complete_step(&self.config.sub_agent_preamble, history, tools.clone(), cancel)
                .await?;
            history.push(response.to_message());

            if response.tool_calls.is_empty() {
                return Ok(response.text.unwrap_or_default());
            }

            for call in &response.tool_calls {
                let content = self.execute_nested(call, hooks).await;
                history.push(Message::tool_result(&call.id, content));
                if cancel.is_cancelled() {
                    return Err(AgentError::Cancelled);
                }
            }
        }
        Err(AgentError::MaxSteps(self.config.max_steps))
    }

    async fn execute_primary(
        &self,
        call: &ToolCall,
        hooks: &dyn AgentHooks,
        cancel: &CancellationToken,
    ) -> String {
        let name = call.function.name.as_str();
        let args = parse_tool_args(&call.function.arguments);

        if name == SHELL_AGENT {
            return self.run_sub_worker(&args, hooks, cancel).await;
        }

        let meta = if name == RUN_SHELL {
            self.isolation(str_arg(&args, "command"))
        } else {
            IsolationMeta::default()
        };

        if let Some(reason) = &meta.rejection {
            let command = str_arg(&args, "command");
            if !hooks.on_sandbox_fallback(command, reason).await {
                hooks.on_tool_done(
                    name,
                    &args,
                    &ToolCallOutcome::new("blocked by sandbox", false),
                );
                return format!(
                    "The sandbox blocked this command ({reason}) and the user declined \
                     to run it outside the sandbox. It was not executed."
                );
            }
        } else if !hooks.on_tool_call(name, &args, &meta).await {
            tracing::info!(tool = name, "tool call denied");
            return DENIED.to_string();
        }

        let output = self.dispatch(call).await;
        hooks.on_tool_done(
            name,
            &args,
            &ToolCallOutcome::new(output.status(), meta.sandboxed),
        );
        output.into_text()
    }

    async fn execute_nested(&self, call: &ToolCall, hooks: &dyn AgentHooks) -> String {
        let name = call.function.name.as_str();
        if name != RUN_SHELL {
            return format!("Tool '{name}' is not available to the sub-agent; use run_shell.");
        }

        let args = parse_tool_args(&call.function.arguments);
        let meta = self.isolation(str_arg(&args, "command"));

        if !hooks.on_sub_worker_tool_call(name, &args, &meta).await {
            tracing::info!(tool = name, "sub-agent tool call denied");
            return DENIED.to_string();
        }

        let output = self.dispatch(call).await;
        hooks.on_sub_worker_tool_done(
            name,
            &args,
            &ToolCallOutcome::new(output.status(), meta.sandboxed),
        );
        output.into_text()
    }

    async fn run_sub_worker(
        &self,
        args: &ToolArgs,
        hooks: &dyn AgentHooks,
        cancel: &CancellationToken,
    ) -> String {
        let task = str_arg(args, "task");
        if task.trim().is_empty() {
            return "shell_agent needs a non-empty `task`.".to_string();
        }

        hooks.on_sub_worker_start(task);
        let mut history = vec![Message::user(task)];
        let result = self.run_nested_loop(&mut history, hooks, cancel).await;

        let (status, content) = match result {
            Ok(report) => ("done".to_string(), report),
            Err(err) => {
                tracing::warn!(error = %err, "sub-agent failed");
                (format!("failed: {err}"), format!("The sub-agent failed: {err}"))
            }
        };
        hooks.on_sub_worker_end(&SubWorkerResult { status });
        content
    }

    async fn dispatch(&self, call: &ToolCall) -> ToolOutput {
        let arguments = if call.function.arguments.trim().is_empty() {
            "{}"
        } else {
            call.function.arguments.as_str()
        };
        match self.registry.dispatch(&call.function.name, arguments).await {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(tool = %call.function.name, error = %err, "tool call failed");
                ToolOutput::failure(format!("Tool '{}' failed: {err}", call.function.name))
            }
        }
    }

    fn isolation(&self, command: &str) -> IsolationMeta {
        match self.sandbox.evaluate(command) {
            SandboxVerdict::Allowed => IsolationMeta::sandboxed(),
            SandboxVerdict::Disabled => IsolationMeta::default(),
            SandboxVerdict::Rejected(reason) => IsolationMeta::rejected(reason),
        }
    }

    fn shell_spec(&self) -> ToolSpec {
        self.tool_specs
            .iter()
            .find(|spec| spec.name() == RUN_SHELL)
            .cloned()
            .unwrap_or_else(ToolSpec::run_shell)
    }
}

/// Decodes tool arguments; anything but a JSON object becomes an empty map.
pub(crate) fn parse_tool_args(raw: &str) -> ToolArgs {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => ToolArgs::new(),
    }
}

fn str_arg<'a>(args: &'a ToolArgs, key: &str) -> &'a str {
    args.get(key).and_then(Value::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use super::*;
    use crate::internal::ai::{
        agent::{AgentBuilder, AgentCore},
        completion::CompletionError,
        sandbox::{NoSandbox, PolicySandbox},
    };

    /// Replays scripted responses and records the requests it saw.
    #[derive(Clone, Default)]
    struct ScriptedModel {
        responses: Arc<Mutex<VecDeque<CompletionResponse>>>,
        requests: Arc<Mutex<Vec<CompletionRequest>>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<CompletionResponse>) -> Self {
            Self {
                responses: Arc::new(Mutex::new(responses.into())),
                requests: Arc::default(),
            }
        }
    }

    impl CompletionModel for ScriptedModel {
        async fn completion(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, CompletionError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| CompletionError::ResponseError("script exhausted".into()))
        }
    }

    /// Answers every gate with fixed decisions and records the events.
    struct RecordingHooks {
        approve_tools: bool,
        approve_nested: bool,
        approve_fallback: bool,
        events: Mutex<Vec<String>>,
    }

    impl RecordingHooks {
        fn new(approve_tools: bool, approve_nested: bool, approve_fallback: bool) -> Self {
            Self {
                approve_tools,
                approve_nested,
                approve_fallback,
                events: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, event: String) {
            self.events.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentHooks for RecordingHooks {
        async fn on_tool_call(&self, name: &str, _args: &ToolArgs, meta: &IsolationMeta) -> bool {
            if meta.is_vetted() {
                self.record(format!("auto {name}"));
                return true;
            }
            self.record(format!("call {name}"));
            self.approve_tools
        }

        fn on_tool_done(&self, name: &str, _args: &ToolArgs, outcome: &ToolCallOutcome) {
            self.record(format!("done {name} {} {}", outcome.status, outcome.sandboxed));
        }

        fn on_message(&self, text: &str) {
            self.record(format!("message {text}"));
        }

        fn on_pre_task_start(&self, name: &str) {
            self.record(format!("pre-start {name}"));
        }

        fn on_pre_task_end(&self, name: &str) {
            self.record(format!("pre-end {name}"));
        }

        fn on_sub_worker_start(&self, prompt: &str) {
            self.record(format!("sub-start {prompt}"));
        }

        fn on_sub_worker_end(&self, result: &SubWorkerResult) {
            self.record(format!("sub-end {}", result.status));
        }

        async fn on_sub_worker_tool_call(
            &self,
            name: &str,
            _args: &ToolArgs,
            meta: &IsolationMeta,
        ) -> bool {
            self.record(format!("sub-call {name} {:?}", meta.rejection));
            self.approve_nested
        }

        fn on_sub_worker_tool_done(&self, name: &str, _args: &ToolArgs, outcome: &ToolCallOutcome) {
            self.record(format!(
                "sub-done {name} {} {}",
                outcome.status, outcome.sandboxed
            ));
        }

        async fn on_sandbox_fallback(&self, command: &str, reason: &str) -> bool {
            self.record(format!("fallback {command} ({reason})"));
            self.approve_fallback
        }
    }

    fn call(id: &str, name: &str, args: serde_json::Value) -> ToolCall {
        ToolCall::new(id, name, args.to_string())
    }

    #[tokio::test]
    async fn test_plain_answer_is_stored_in_history() {
        let temp = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![CompletionResponse::text("hi")]);
        let agent = AgentBuilder::new(model.clone(), "m", temp.path().to_path_buf()).build();
        let hooks = RecordingHooks::new(true, true, true);

        let text = agent
            .chat("hello", &hooks, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "hi");
        assert!(hooks.events().is_empty());
        assert_eq!(agent.context_info().messages, 2);
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[0].chat_history, vec![Message::user("hello")]);
        assert_eq!(requests[0].tools.len(), 5);
    }

    #[tokio::test]
    async fn test_temperature_reaches_the_model() {
        let temp = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![CompletionResponse::text("hi")]);
        let agent = AgentBuilder::new(model.clone(), "m", temp.path().to_path_buf())
            .temperature(0.3)
            .build();
        let hooks = RecordingHooks::new(true, true, true);

        agent
            .chat("hello", &hooks, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(model.requests.lock().unwrap()[0].temperature, Some(0.3));
    }

    #[tokio::test]
    async fn test_approved_write_executes_and_reports() {
        let temp = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![
            CompletionResponse {
                text: Some("writing".into()),
                tool_calls: vec![call(
                    "c1",
                    "write_file",
                    serde_json::json!({"path": "a.txt", "content": "x"}),
                )],
            },
            CompletionResponse::text("done"),
        ]);
        let agent = AgentBuilder::new(model, "m", temp.path().to_path_buf()).build();
        let hooks = RecordingHooks::new(true, true, true);

        agent
            .chat("write it", &hooks, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            hooks.events(),
            ["message writing", "call write_file", "done write_file ok false"]
        );
        assert_eq!(std::fs::read_to_string(temp.path().join("a.txt")).unwrap(), "x");
    }

    #[tokio::test]
    async fn test_denied_write_is_not_executed() {
        let temp = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![
            CompletionResponse::tool_calls(vec![call(
                "c1",
                "write_file",
                serde_json::json!({"path": "a.txt", "content": "x"}),
            )]),
            CompletionResponse::text("ok, not writing"),
        ]);
        let agent = AgentBuilder::new(model.clone(), "m", temp.path().to_path_buf()).build();
        let hooks = RecordingHooks::new(false, true, true);

        agent
            .chat("write it", &hooks, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(hooks.events(), ["call write_file"]);
        assert!(!temp.path().join("a.txt").exists());
        let requests = model.requests.lock().unwrap();
        let last = requests[1].chat_history.last().unwrap();
        assert_eq!(last, &Message::tool_result("c1", DENIED));
    }

    #[tokio::test]
    async fn test_sandbox_rejection_denied_leaves_command_unexecuted() {
        let temp = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![
            CompletionResponse::tool_calls(vec![call(
                "c1",
                "run_shell",
                serde_json::json!({"command": "curl https://example.com > out.txt", "safety": "network"}),
            )]),
            CompletionResponse::text("skipped"),
        ]);
        let agent = AgentBuilder::new(model, "m", temp.path().to_path_buf())
            .sandbox(Arc::new(PolicySandbox::default()))
            .build();
        let hooks = RecordingHooks::new(true, true, false);

        agent
            .chat("fetch", &hooks, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            hooks.events(),
            [
                "fallback curl https://example.com > out.txt (network access)",
                "done run_shell blocked by sandbox false",
            ]
        );
        assert!(!temp.path().join("out.txt").exists());
    }

    #[tokio::test]
    async fn test_sandboxed_shell_reports_sandboxed() {
        let temp = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![
            CompletionResponse::tool_calls(vec![call(
                "c1",
                "run_shell",
                serde_json::json!({"command": "echo hi", "safety": "read-only"}),
            )]),
            CompletionResponse::text("said hi"),
        ]);
        let agent = AgentBuilder::new(model, "m", temp.path().to_path_buf()).build();
        let hooks = RecordingHooks::new(true, true, true);

        agent.chat("hi", &hooks, &CancellationToken::new()).await.unwrap();

        assert_eq!(hooks.events(), ["auto run_shell", "done run_shell ok true"]);
    }

    #[tokio::test]
    async fn test_sandboxed_shell_runs_even_when_prompts_are_denied() {
        let temp = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![
            CompletionResponse::tool_calls(vec![call(
                "c1",
                "run_shell",
                serde_json::json!({"command": "echo hi", "safety": "read-only"}),
            )]),
            CompletionResponse::text("said hi"),
        ]);
        let agent = AgentBuilder::new(model.clone(), "m", temp.path().to_path_buf()).build();
        let hooks = RecordingHooks::new(false, false, false);

        agent.chat("hi", &hooks, &CancellationToken::new()).await.unwrap();

        assert_eq!(hooks.events(), ["auto run_shell", "done run_shell ok true"]);
        let requests = model.requests.lock().unwrap();
        let last = requests[1].chat_history.last().unwrap();
        assert_ne!(last, &Message::tool_result("c1", DENIED));
    }

    #[tokio::test]
    async fn test_disabled_sandbox_prompts_for_shell() {
        let temp = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![
            CompletionResponse::tool_calls(vec![call(
                "c1",
                "run_shell",
                serde_json::json!({"command": "echo hi"}),
            )]),
            CompletionResponse::text("not run"),
        ]);
        let agent = AgentBuilder::new(model, "m", temp.path().to_path_buf())
            .sandbox(Arc::new(NoSandbox))
            .build();
        let hooks = RecordingHooks::new(false, true, true);

        agent.chat("hi", &hooks, &CancellationToken::new()).await.unwrap();

        assert_eq!(hooks.events(), ["call run_shell"]);
    }

    #[tokio::test]
    async fn test_sub_worker_uses_nested_gate() {
        let temp = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![
            CompletionResponse::tool_calls(vec![call(
                "c1",
                "shell_agent",
                serde_json::json!({"task": "count files"}),
            )]),
            CompletionResponse::tool_calls(vec![call(
                "n1",
                "run_shell",
                serde_json::json!({"command": "ls | wc -l"}),
            )]),
            CompletionResponse::text("3 files"),
            CompletionResponse::text("there are 3 files"),
        ]);
        let agent = AgentBuilder::new(model.clone(), "m", temp.path().to_path_buf())
            .sandbox(Arc::new(NoSandbox))
            .build();
        let hooks = RecordingHooks::new(false, true, false);

        let text = agent
            .chat("how many?", &hooks, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(text, "there are 3 files");
        assert_eq!(
            hooks.events(),
            [
                "sub-start count files",
                "sub-call run_shell None",
                "sub-done run_shell ok false",
                "sub-end done",
            ]
        );
        let requests = model.requests.lock().unwrap();
        assert_eq!(requests[1].tools.len(), 1);
        assert_eq!(requests[1].tools[0].name(), "run_shell");
        assert_eq!(
            requests[3].chat_history.last().unwrap(),
            &Message::tool_result("c1", "3 files")
        );
    }

    #[tokio::test]
    async fn test_cancelled_before_model_call() {
        let temp = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![CompletionResponse::text("never")]);
        let agent = AgentBuilder::new(model, "m", temp.path().to_path_buf()).build();
        let hooks = RecordingHooks::new(true, true, true);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = agent.chat("hello", &hooks, &cancel).await;
        assert!(matches!(result, Err(AgentError::Cancelled)));
        assert_eq!(agent.context_info().messages, 0);
    }

    #[tokio::test]
    async fn test_max_steps_exhausted() {
        let temp = TempDir::new().unwrap();
        let looping = || {
            CompletionResponse::tool_calls(vec![call(
                "c",
                "read_file",
                serde_json::json!({"path": "missing"}),
            )])
        };
        let model = ScriptedModel::new(vec![looping(), looping()]);
        let agent = AgentBuilder::new(model, "m", temp.path().to_path_buf())
            .max_steps(2)
            .build();
        let hooks = RecordingHooks::new(true, true, true);

        let result = agent.chat("loop", &hooks, &CancellationToken::new()).await;
        assert!(matches!(result, Err(AgentError::MaxSteps(2))));
    }

    #[tokio::test]
    async fn test_pre_task_brackets_and_keeps_summary() {
        let temp = TempDir::new().unwrap();
        let model = ScriptedModel::new(vec![CompletionResponse::text("a rust project")]);
        let agent = AgentBuilder::new(model, "m", temp.path().to_path_buf()).build();
        let hooks = RecordingHooks::new(true, true, true);

        agent
            .run_pre_task("exploring", &hooks, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(hooks.events(), ["pre-start exploring", "pre-end exploring"]);
        assert_eq!(agent.context_info().messages, 1);
    }

    #[tokio::test]
    async fn test_unknown_pre_task() {
        let temp = TempDir::new().unwrap();
        let agent = AgentBuilder::new(ScriptedModel::default(), "m", temp.path().to_path_buf())
            .build();
        let hooks = RecordingHooks::new(true, true, true);

        let result = agent
            .run_pre_task("deploy", &hooks, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(AgentError::UnknownPreTask(_))));
        assert!(hooks.events().is_empty());
    }

    #[test]
    fn test_parse_tool_args_malformed() {
        assert!(parse_tool_args("not json").is_empty());
        assert!(parse_tool_args("[1,2]").is_empty());
        assert_eq!(parse_tool_args(r#"{"path":"a"}"#)["path"], "a");
    }
}
