//! Host-facing view of an analysis result
//!
//! `FlowInfo` is index-based and tied to one context's tracking window;
//! the summary resolves indexes back to names so it can be serialized or
//! handed to a refactoring host.

use serde::Serialize;

use crate::flow::context::FlowContext;
use crate::flow::info::{AccessMode, FlowInfo};
use crate::tree::LocalKind;

/// How a variable crosses the analyzed region's boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableRole {
    /// Read before any write: the caller must supply it.
    Argument,
    /// Written inside: visible to code after the region.
    Result,
    /// Declared inside the region or otherwise unresolvable from outside.
    Internal,
}

impl VariableRole {
    fn from_mode(mode: AccessMode) -> Option<Self> {
        match mode {
            AccessMode::Unused => None,
            AccessMode::Read | AccessMode::ReadPotential => Some(VariableRole::Argument),
            AccessMode::Write | AccessMode::WritePotential => Some(VariableRole::Result),
            AccessMode::Unknown => Some(VariableRole::Internal),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VariableSummary {
    pub name: String,
    pub kind: LocalKind,
    pub mode: AccessMode,
    pub role: VariableRole,
}

/// Resolved, serializable result of one flow analysis.
#[derive(Debug, Clone, Serialize)]
pub struct FlowSummary {
    pub variables: Vec<VariableSummary>,
    pub always_returns: bool,
    pub partial_return: bool,
    pub returns_value: bool,
    pub throws: bool,
    pub falls_through: bool,
    /// Branch targets escaping the region; `None` is an unlabeled jump.
    pub escaping_branches: Vec<Option<String>>,
    pub exceptions: Vec<String>,
    pub type_variables: Vec<String>,
}

impl FlowSummary {
    pub fn new(info: &FlowInfo, context: &FlowContext) -> Self {
        let tree = context.tree();
        let variables = info
            .accesses()
            .filter_map(|(index, mode)| {
                let (local, _) = context.local_at(index);
                VariableRole::from_mode(mode).map(|role| VariableSummary {
                    name: local.name.clone(),
                    kind: local.kind,
                    mode,
                    role,
                })
            })
            .collect();
        FlowSummary {
            variables,
            always_returns: info.is_return(),
            partial_return: info.is_partial_return(),
            returns_value: info.is_value_return(),
            throws: info.is_throw(),
            falls_through: info.falls_through(),
            escaping_branches: info.branches().iter().cloned().collect(),
            exceptions: info
                .exceptions()
                .iter()
                .map(|&ty| tree.types.name(ty).to_string())
                .collect(),
            type_variables: info
                .type_variables()
                .iter()
                .map(|&var| tree.type_var_name(var).to_string())
                .collect(),
        }
    }

    /// Variables the region needs handed in.
    pub fn arguments(&self) -> impl Iterator<Item = &VariableSummary> {
        self.variables
            .iter()
            .filter(|v| v.role == VariableRole::Argument)
    }

    /// Variables whose values the region exposes.
    pub fn results(&self) -> impl Iterator<Item = &VariableSummary> {
        self.variables
            .iter()
            .filter(|v| v.role == VariableRole::Result)
    }
}
