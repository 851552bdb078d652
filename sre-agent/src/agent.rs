//! Agent implementation - the decide, validate, execute, observe loop

use futures_core::Stream;
use serde::{Deserialize, Serialize};
use sre_core::{
    Action, Error, Guardrail, History, HistoryEntry, ModelAdapter, Observation, Registry, Result,
    Step,
};

/// Configuration for the agent
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum number of model calls per run
    pub max_loops: usize,
    /// Extra instructions placed at the top of the history
    pub system_prompt: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_loops: 10,
            system_prompt: None,
        }
    }
}

impl AgentConfig {
    pub fn with_max_loops(mut self, max_loops: usize) -> Self {
        self.max_loops = max_loops;
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }
}

/// The agent - owns the model, the tools and the gate; each `run` gets a
/// fresh history.
pub struct Agent<M> {
    config: AgentConfig,
    model: M,
    registry: Registry,
    guardrail: Guardrail,
}

impl<M: ModelAdapter> Agent<M> {
    pub fn new(config: AgentConfig, model: M, registry: Registry, guardrail: Guardrail) -> Self {
        Self {
            config,
            model,
            registry,
            guardrail,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Start a run for `goal`.
    ///
    /// Nothing happens until the returned handle is polled with
    /// [`Run::next_step`]. Dropping the handle abandons the run.
    pub fn run(&self, goal: impl Into<String>) -> Run<'_, M> {
        let goal = goal.into();
        let mut history = History::new();

        if let Some(prompt) = &self.config.system_prompt {
            history.push(HistoryEntry::SystemNote(prompt.clone()));
        }
        history.push(HistoryEntry::SystemNote(format!(
            "System Note: You have access to the following tools:\n{}",
            self.registry.tools_prompt()
        )));
        history.push(HistoryEntry::Goal(goal.clone()));

        Run {
            agent: self,
            goal,
            history,
            iterations: 0,
            pending: None,
            state: RunState::AwaitingModel,
        }
    }
}

/// Where a run currently is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
    /// Next pull asks the model for a step
    AwaitingModel,
    /// An action step was handed out; next pull dispatches it first
    Executing,
    /// A final answer was produced
    Finished(String),
    /// The run failed; the error was handed out by `next_step`
    Failed,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Finished(_) | RunState::Failed)
    }
}

/// A single run of the loop, pulled one step at a time.
///
/// Every step the model produces is handed to the caller, action steps and
/// the final one alike. After the run finishes or fails, `next_step`
/// returns `None`.
pub struct Run<'a, M> {
    agent: &'a Agent<M>,
    goal: String,
    history: History,
    iterations: usize,
    pending: Option<Action>,
    state: RunState,
}

impl<'a, M: ModelAdapter> Run<'a, M> {
    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Completed iterations (model call plus dispatch)
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn final_answer(&self) -> Option<&str> {
        match &self.state {
            RunState::Finished(answer) => Some(answer),
            _ => None,
        }
    }

    /// Drive the loop until it hands out the next step.
    ///
    /// If the previous step requested an action, that action is dispatched
    /// first. Returns `Some(Err(_))` once when the run fails, then `None`.
    pub async fn next_step(&mut self) -> Option<Result<Step>> {
        if self.state.is_terminal() {
            return None;
        }

        if self.agent.config.max_loops == 0 {
            return Some(self.fail(Error::config_invalid("max_loops must be at least 1")));
        }

        if let Some(action) = self.pending.take() {
            self.dispatch(action).await;
            self.iterations += 1;
            self.state = RunState::AwaitingModel;

            if self.iterations >= self.agent.config.max_loops {
                tracing::warn!(
                    iterations = self.iterations,
                    "run stopped without a final answer"
                );
                return Some(self.fail(Error::max_loops_exceeded(self.agent.config.max_loops)));
            }
        }

        tracing::debug!(
            iteration = self.iterations + 1,
            history_len = self.history.len(),
            "requesting next step"
        );

        let raw = match self.agent.model.generate(&self.goal, &self.history).await {
            Ok(raw) => raw,
            Err(err) => return Some(self.fail(err)),
        };

        let step = match Step::parse(&raw) {
            Ok(step) => step,
            Err(err) => {
                let err = err.with_context("iteration", (self.iterations + 1).to_string());
                return Some(self.fail(err));
            }
        };

        tracing::debug!(thought = step.thought(), "model step");

        if let Some(answer) = step.final_answer() {
            tracing::info!(
                iterations = self.iterations + 1,
                answer,
                "run finished"
            );
            self.state = RunState::Finished(answer.to_string());
            return Some(Ok(step));
        }

        self.history.push(HistoryEntry::Step(step.clone()));
        self.pending = step.action().cloned();
        self.state = RunState::Executing;
        Some(Ok(step))
    }

    /// Drain the remaining steps and return the final answer
    pub async fn finish(mut self) -> Result<String> {
        while let Some(step) = self.next_step().await {
            step?;
        }

        match self.state {
            RunState::Finished(answer) => Ok(answer),
            _ => Err(Error::unexpected("run ended without an outcome").with_operation("run::finish")),
        }
    }

    /// The run as a `Stream` of steps
    pub fn into_stream(mut self) -> impl Stream<Item = Result<Step>> + 'a
    where
        M: 'a,
    {
        async_stream::stream! {
            while let Some(step) = self.next_step().await {
                yield step;
            }
        }
    }

    fn fail(&mut self, err: Error) -> Result<Step> {
        tracing::error!(error = %err, "run failed");
        self.state = RunState::Failed;
        Err(err.with_operation("run::next_step"))
    }

    /// Gate, resolve and execute one action; always records one observation.
    ///
    /// Every failure on this path is recoverable: it becomes the observation
    /// instead of ending the run.
    async fn dispatch(&mut self, action: Action) {
        let observation = match self.invoke(&action).await {
            Ok(output) => {
                tracing::info!(tool = %action.name, "tool executed");
                Observation::output(output)
            }
            Err(err) => {
                tracing::warn!(tool = %action.name, error = %err, "action not completed");
                Observation::from_error(&action.name, &err)
            }
        };

        self.history.push(HistoryEntry::Observation(observation));
    }

    async fn invoke(&self, action: &Action) -> Result<String> {
        self.agent.guardrail.check(&action.name, &action.arguments)?;

        let tool = self
            .agent
            .registry
            .get(&action.name)
            .ok_or_else(|| Error::tool_not_found(&action.name).with_operation("run::dispatch"))?;

        tool.execute(&action.arguments).await
    }
}
