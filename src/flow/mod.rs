//! Structural flow analysis
//!
//! Computes, for any subtree or run of statements, how control leaves it
//! and how it touches the variables in scope. Built for source-to-source
//! refactorings: extract method needs the inputs and outputs of a
//! selection, inline needs to know whether a body always returns.

pub mod analyzer;
pub mod context;
pub mod in_out;
pub mod info;
pub mod summary;
pub mod variants;

pub use analyzer::{FlowAnalyzer, FlowPolicy, SubtreePolicy};
pub use context::{ComputeMode, FlowContext};
pub use in_out::InOutFlowAnalyzer;
pub use info::{AccessMode, FlowFlags, FlowInfo};
pub use summary::{FlowSummary, VariableRole, VariableSummary};
