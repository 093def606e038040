//! Input/output analysis over a selected run of statements
//!
//! Answers the extract-method question: of the variables a selection
//! touches, which are inputs (read before written), which are outputs
//! (written and visible afterwards), and which are its own business.
//! Variables declared inside the selection are neither; their recorded
//! access is forced to `Unknown` so callers can filter them out.

use crate::flow::analyzer::{FlowAnalyzer, FlowPolicy};
use crate::flow::context::FlowContext;
use crate::flow::info::FlowInfo;
use crate::tree::{NodeId, NodeKind, SyntaxTree};

/// Clears locals at the boundary of every scope the walk closes.
#[derive(Debug, Default)]
struct SelectionPolicy;

impl FlowPolicy for SelectionPolicy {
    fn finish_node(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        info: &mut FlowInfo,
        context: &FlowContext,
    ) {
        let declared = match tree.kind(node) {
            NodeKind::Block { declared, .. }
            | NodeKind::Catch { declared, .. }
            | NodeKind::Function { declared, .. } => declared,
            _ => return,
        };
        for &local in declared {
            info.clear_access_mode(local, context);
        }
    }
}

/// Folds the selected statements into one summary, in source order.
pub struct InOutFlowAnalyzer<'t, 'c> {
    analyzer: FlowAnalyzer<'t, 'c, SelectionPolicy>,
}

impl<'t, 'c> InOutFlowAnalyzer<'t, 'c> {
    pub fn new(tree: &'t SyntaxTree, context: &'c mut FlowContext<'t>) -> Self {
        Self {
            analyzer: FlowAnalyzer::new(tree, context, SelectionPolicy),
        }
    }

    pub fn perform(mut self, selected: &[NodeId]) -> FlowInfo {
        let mut result = FlowInfo::empty();
        for &node in selected {
            self.analyzer.process(node);
            let info = self.analyzer.take_flow_info(node);
            result.merge_sequential(info, self.analyzer.context());
        }
        // Declarations sitting directly among the selected statements
        // never hit a closing scope node, so their boundary is here.
        for &node in selected {
            self.clear_direct_declarations(node, &mut result);
        }
        result
    }

    fn clear_direct_declarations(&self, node: NodeId, result: &mut FlowInfo) {
        let tree = self.analyzer.tree();
        if let NodeKind::VarDecl { decls } = tree.kind(node) {
            for &decl in decls {
                if let NodeKind::Declarator { locals, .. } = tree.kind(decl) {
                    for &local in locals {
                        result.clear_access_mode(local, self.analyzer.context());
                    }
                }
            }
        }
    }
}
