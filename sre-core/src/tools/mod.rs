//! Built-in tools

pub mod simulated_bash;

pub use simulated_bash::SimulatedBash;
