//! # SRE Agent
//!
//! The agent drives the reasoning loop:
//! 1. Ask the model for the next step, given the goal and the history
//! 2. Validate the raw output against the step schema
//! 3. Hand the step to the caller
//! 4. Stop on a final answer
//! 5. Otherwise run the safety gate, resolve the tool and execute it
//! 6. Append the observation and go again, up to `max_loops` iterations
//!
//! The model decides, the guardrail vetoes, the tools act.

mod agent;

pub use agent::{Agent, AgentConfig, Run, RunState};
pub use sre_core::{
    Action, Error, ErrorKind, Guardrail, History, HistoryEntry, ModelAdapter, Observation,
    ObservationKind, Registry, Result, Step, Tool,
};
