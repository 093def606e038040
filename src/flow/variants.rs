//! Per-construct merge protocols over the base summary
//!
//! Every control-flow construct reduces to the same `FlowInfo` fields;
//! what differs is the order and conditionality of the merges. Each
//! protocol here mirrors one construct the walker dispatches on.

use crate::flow::context::FlowContext;
use crate::flow::info::FlowInfo;
use crate::tree::{CaughtTypes, TypeRegistry};

/// Ordered composition of a statement list or expression operands.
#[derive(Debug, Default)]
pub struct SequentialFlow {
    info: FlowInfo,
}

impl SequentialFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, info: Option<FlowInfo>, context: &FlowContext) {
        self.info.merge_sequential(info, context);
    }

    pub fn info(&self) -> &FlowInfo {
        &self.info
    }

    pub fn finish(self) -> FlowInfo {
        self.info
    }
}

/// `if`/ternary: an always-evaluated condition plus two alternative arms.
#[derive(Debug, Default)]
pub struct ConditionalFlow {
    info: FlowInfo,
}

impl ConditionalFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_condition(&mut self, info: Option<FlowInfo>, context: &FlowContext) {
        self.info.merge_sequential(info, context);
    }

    /// Merges the two arms; a missing arm falls straight through, turning
    /// the other arm's accesses into potentials.
    pub fn merge_branches(
        &mut self,
        then_info: Option<FlowInfo>,
        else_info: Option<FlowInfo>,
        context: &FlowContext,
    ) {
        let mut combined = then_info.unwrap_or_default();
        combined.merge_conditional(else_info, context);
        self.info.merge_sequential(Some(combined), context);
    }

    pub fn finish(self) -> FlowInfo {
        self.info
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    While,
    DoWhile,
    For,
    ForEach,
}

/// Loops: initializer/condition/body/increment in the construct's
/// evaluation order, a reentrance merge modeling the second iteration,
/// and resolution of the loop's own unlabeled branches.
#[derive(Debug)]
pub struct LoopFlow {
    kind: LoopKind,
    initializer: Option<FlowInfo>,
    condition: Option<FlowInfo>,
    action: Option<FlowInfo>,
    increment: Option<FlowInfo>,
}

impl LoopFlow {
    pub fn new(kind: LoopKind) -> Self {
        Self {
            kind,
            initializer: None,
            condition: None,
            action: None,
            increment: None,
        }
    }

    pub fn merge_initializer(&mut self, info: Option<FlowInfo>) {
        self.initializer = info;
    }

    pub fn merge_condition(&mut self, info: Option<FlowInfo>) {
        self.condition = info;
    }

    pub fn merge_action(&mut self, info: Option<FlowInfo>) {
        self.action = info;
    }

    pub fn merge_increment(&mut self, info: Option<FlowInfo>) {
        self.increment = info;
    }

    pub fn finish(self, context: &mut FlowContext) -> FlowInfo {
        let mut info = FlowInfo::empty();
        let condition = self.condition;
        let action = self.action;
        let increment = self.increment;

        // Regions that run zero times on some executions are demoted
        // before they are composed.
        let demoted = |region: &Option<FlowInfo>, context: &FlowContext| {
            region.clone().map(|mut r| {
                r.merge_empty_condition(context);
                r
            })
        };

        info.merge_sequential(self.initializer, context);
        match self.kind {
            LoopKind::While => {
                info.merge_sequential(condition.clone(), context);
                info.merge_sequential(demoted(&action, context), context);
            }
            LoopKind::DoWhile => {
                // The body runs at least once; the condition only if the
                // body fell through.
                info.merge_sequential(action.clone(), context);
                info.merge_sequential(demoted(&condition, context), context);
            }
            LoopKind::For => {
                info.merge_sequential(condition.clone(), context);
                info.merge_sequential(demoted(&action, context), context);
                info.merge_sequential(demoted(&increment, context), context);
            }
            LoopKind::ForEach => {
                // Iteration binding and body both depend on the object
                // producing at least one element; the object itself is
                // always evaluated. Callers pass the binding as condition.
                info.merge_sequential(demoted(&condition, context), context);
                info.merge_sequential(demoted(&action, context), context);
            }
        }

        // Reentrance merge: compose the condition and body against the
        // already-accumulated summary a second time, so an access at the
        // top of iteration n+1 is seen after the accesses of iteration n.
        context.set_loop_reentrance(true);
        match self.kind {
            LoopKind::DoWhile => {
                info.merge_sequential(demoted(&action, context), context);
                info.merge_sequential(demoted(&condition, context), context);
            }
            _ => {
                info.merge_sequential(demoted(&condition, context), context);
                info.merge_sequential(demoted(&action, context), context);
            }
        }
        context.set_loop_reentrance(false);

        info.remove_label(None);
        info
    }
}

/// `switch`: selector, conditionally-merged case regions (fall-through
/// regions arrive pre-merged), and default-case tracking.
#[derive(Debug)]
pub struct SwitchFlow {
    info: FlowInfo,
    cases: Option<FlowInfo>,
}

impl SwitchFlow {
    pub fn new() -> Self {
        Self {
            info: FlowInfo::empty(),
            cases: None,
        }
    }

    pub fn merge_test(&mut self, info: Option<FlowInfo>, context: &FlowContext) {
        self.info.merge_sequential(info, context);
    }

    pub fn merge_case(&mut self, info: FlowInfo, context: &FlowContext) {
        match &mut self.cases {
            None => self.cases = Some(info),
            Some(cases) => cases.merge_conditional(Some(info), context),
        }
    }

    /// Without a default case the switch cannot be proven exhaustive: the
    /// no-match path falls through with no case executed.
    pub fn merge_default(&mut self, has_default_case: bool, context: &FlowContext) {
        if let Some(cases) = &mut self.cases {
            if !has_default_case {
                cases.merge_empty_condition(context);
            }
        }
    }

    pub fn finish(mut self, context: &FlowContext) -> FlowInfo {
        self.info.merge_sequential(self.cases.take(), context);
        self.info.remove_label(None);
        self.info
    }
}

/// `try`/`catch`/`finally`.
#[derive(Debug, Default)]
pub struct TryFlow {
    info: FlowInfo,
}

impl TryFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_try(&mut self, info: Option<FlowInfo>, context: &FlowContext) {
        self.info.merge_sequential(info, context);
    }

    /// Drops exceptions captured by this statement's own catch clauses.
    pub fn remove_caught(&mut self, handlers: &[CaughtTypes], types: &TypeRegistry) {
        self.info.remove_exceptions(handlers, types);
    }

    /// A catch body is an alternative to the tail of the try body: it may
    /// run after any prefix of it.
    pub fn merge_catch(&mut self, info: Option<FlowInfo>, context: &FlowContext) {
        if let Some(info) = info {
            self.info.merge_conditional(Some(info), context);
        }
    }

    /// Finally runs on every path, exceptional ones included.
    pub fn merge_finally(&mut self, info: Option<FlowInfo>, context: &FlowContext) {
        self.info.merge_sequential(info, context);
    }

    pub fn finish(self) -> FlowInfo {
        self.info
    }
}

/// `with`: the scope object, then a body that always executes.
#[derive(Debug, Default)]
pub struct WithFlow {
    info: FlowInfo,
}

impl WithFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge_object(&mut self, info: Option<FlowInfo>, context: &FlowContext) {
        self.info.merge_sequential(info, context);
    }

    pub fn merge_action(&mut self, info: Option<FlowInfo>, context: &FlowContext) {
        self.info.merge_sequential(info, context);
    }

    pub fn finish(self) -> FlowInfo {
        self.info
    }
}
