//! Bottom-up tree walker producing flow summaries
//!
//! The walker computes a `FlowInfo` for every node it visits and stashes
//! it in a scratch slot keyed by node id. Parents take (not read) their
//! children's summaries, so each one is consumed exactly once.

use crate::flow::context::FlowContext;
use crate::flow::info::{AccessMode, FlowInfo};
use crate::flow::variants::{
    ConditionalFlow, LoopFlow, LoopKind, SequentialFlow, SwitchFlow, TryFlow, WithFlow,
};
use crate::tree::{AssignKind, CaughtTypes, LocalId, NodeId, NodeKind, SyntaxTree};

/// Hooks specializing one traversal; the analyzer supplies the defaults.
pub trait FlowPolicy {
    /// Whether to descend into `node` at all. A skipped node produces no
    /// summary.
    fn traverse_node(&self, _tree: &SyntaxTree, _node: NodeId) -> bool {
        true
    }

    /// Whether a `return` contributes its control-transfer fact, or only
    /// the accesses of its argument.
    fn create_return_flow_info(&self, _tree: &SyntaxTree, _node: NodeId) -> bool {
        true
    }

    /// Runs over a node's finished summary before the parent consumes it.
    fn finish_node(
        &self,
        _tree: &SyntaxTree,
        _node: NodeId,
        _info: &mut FlowInfo,
        _context: &FlowContext,
    ) {
    }
}

/// Policy for plain whole-subtree analysis.
#[derive(Debug, Default)]
pub struct SubtreePolicy;

impl FlowPolicy for SubtreePolicy {}

/// Walks a subtree and synthesizes flow summaries bottom-up.
pub struct FlowAnalyzer<'t, 'c, P> {
    tree: &'t SyntaxTree,
    context: &'c mut FlowContext<'t>,
    data: Vec<Option<FlowInfo>>,
    policy: P,
}

impl<'t, 'c, P: FlowPolicy> FlowAnalyzer<'t, 'c, P> {
    pub fn new(tree: &'t SyntaxTree, context: &'c mut FlowContext<'t>, policy: P) -> Self {
        Self {
            tree,
            context,
            data: vec![None; tree.node_count()],
            policy,
        }
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn context(&self) -> &FlowContext<'t> {
        self.context
    }

    /// Takes a node's computed summary out of the scratch slot.
    pub fn take_flow_info(&mut self, node: NodeId) -> Option<FlowInfo> {
        self.data[node.index()].take()
    }

    /// Computes and stores the summary for `node` and everything below it.
    pub fn process(&mut self, node: NodeId) {
        if !self.policy.traverse_node(self.tree, node) {
            return;
        }
        let kind = self.tree.kind(node).clone();
        let mut info = self.compute(node, kind);
        self.policy.finish_node(self.tree, node, &mut info, self.context);
        self.data[node.index()] = Some(info);
    }

    fn process_and_take(&mut self, node: NodeId) -> Option<FlowInfo> {
        self.process(node);
        self.take_flow_info(node)
    }

    fn sequence(&mut self, nodes: &[NodeId]) -> FlowInfo {
        let mut flow = SequentialFlow::new();
        for &node in nodes {
            let child = self.process_and_take(node);
            flow.merge(child, self.context);
        }
        flow.finish()
    }

    fn write_leaf(&mut self, local: LocalId) -> FlowInfo {
        FlowInfo::local_access(local, AccessMode::Write, self.context)
    }

    fn compute(&mut self, node: NodeId, kind: NodeKind) -> FlowInfo {
        match kind {
            NodeKind::Block { stmts, .. } => self.sequence(&stmts),
            NodeKind::VarDecl { decls } => self.sequence(&decls),
            NodeKind::Declarator {
                locals,
                ty,
                init,
                implicit_write,
            } => {
                let mut flow = SequentialFlow::new();
                for &t in &ty {
                    let child = self.process_and_take(t);
                    flow.merge(child, self.context);
                }
                if let Some(init) = init {
                    let child = self.process_and_take(init);
                    flow.merge(child, self.context);
                }
                let mut info = flow.finish();
                if init.is_some() || implicit_write {
                    for &local in &locals {
                        let write = self.write_leaf(local);
                        info.merge_sequential(Some(write), self.context);
                    }
                }
                info
            }
            NodeKind::ExprStmt { expr } => self.process_and_take(expr).unwrap_or_default(),
            NodeKind::Empty | NodeKind::Lit => FlowInfo::empty(),

            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond_info = self.process_and_take(cond);
                let then_info = self.process_and_take(then_branch);
                let else_info = else_branch.and_then(|e| self.process_and_take(e));
                let mut flow = ConditionalFlow::new();
                flow.merge_condition(cond_info, self.context);
                flow.merge_branches(then_info, else_info, self.context);
                flow.finish()
            }
            NodeKind::Cond { cond, cons, alt } => {
                let cond_info = self.process_and_take(cond);
                let cons_info = self.process_and_take(cons);
                let alt_info = self.process_and_take(alt);
                let mut flow = ConditionalFlow::new();
                flow.merge_condition(cond_info, self.context);
                flow.merge_branches(cons_info, alt_info, self.context);
                flow.finish()
            }

            NodeKind::While { cond, body } => {
                let cond_info = self.process_and_take(cond);
                let body_info = self.process_and_take(body);
                let mut flow = LoopFlow::new(LoopKind::While);
                flow.merge_condition(cond_info);
                flow.merge_action(body_info);
                flow.finish(self.context)
            }
            NodeKind::DoWhile { body, cond } => {
                let body_info = self.process_and_take(body);
                let cond_info = self.process_and_take(cond);
                let mut flow = LoopFlow::new(LoopKind::DoWhile);
                flow.merge_action(body_info);
                flow.merge_condition(cond_info);
                flow.finish(self.context)
            }
            NodeKind::For {
                init,
                cond,
                update,
                body,
            } => {
                let init_info = init.and_then(|n| self.process_and_take(n));
                let cond_info = cond.and_then(|n| self.process_and_take(n));
                let body_info = self.process_and_take(body);
                let update_info = update.and_then(|n| self.process_and_take(n));
                let mut flow = LoopFlow::new(LoopKind::For);
                flow.merge_initializer(init_info);
                flow.merge_condition(cond_info);
                flow.merge_action(body_info);
                flow.merge_increment(update_info);
                flow.finish(self.context)
            }
            NodeKind::ForEach {
                binding,
                object,
                body,
            } => {
                // A bare-name binding writes an existing variable each
                // iteration; declarators and patterns handle themselves.
                let binding_info = match *self.tree.kind(binding) {
                    NodeKind::Name { local } => local.map(|l| self.write_leaf(l)),
                    _ => self.process_and_take(binding),
                };
                let object_info = self.process_and_take(object);
                let body_info = self.process_and_take(body);
                let mut flow = LoopFlow::new(LoopKind::ForEach);
                flow.merge_initializer(object_info);
                flow.merge_condition(binding_info);
                flow.merge_action(body_info);
                flow.finish(self.context)
            }

            NodeKind::Switch {
                discriminant,
                clauses,
            } => {
                let mut flow = SwitchFlow::new();
                let discriminant_info = self.process_and_take(discriminant);
                flow.merge_test(discriminant_info, self.context);

                // Clauses group into regions: a clause whose accumulated
                // summary still falls through feeds the next clause
                // (fall-through); otherwise the region closes.
                let mut region: Option<FlowInfo> = None;
                let mut has_default = false;
                for clause in &clauses {
                    has_default |= clause.is_default;
                    if let Some(test) = clause.test {
                        let test_info = self.process_and_take(test);
                        flow.merge_test(test_info, self.context);
                    }
                    for &stmt in &clause.body {
                        let stmt_info = self.process_and_take(stmt);
                        region
                            .get_or_insert_with(FlowInfo::empty)
                            .merge_sequential(stmt_info, self.context);
                    }
                    if region.as_ref().is_some_and(region_ends) {
                        flow.merge_case(region.take().unwrap_or_default(), self.context);
                    }
                }
                if let Some(trailing) = region {
                    flow.merge_case(trailing, self.context);
                }
                flow.merge_default(has_default, self.context);
                flow.finish(self.context)
            }

            NodeKind::Try {
                block,
                handlers,
                finalizer,
            } => {
                let caught: Vec<CaughtTypes> = handlers
                    .iter()
                    .map(|&h| match self.tree.kind(h) {
                        NodeKind::Catch { caught, .. } => caught.clone(),
                        _ => CaughtTypes::All,
                    })
                    .collect();
                self.context.push_exceptions(caught.clone());
                self.process(block);
                self.context.pop_exceptions();

                let mut flow = TryFlow::new();
                let block_info = self.take_flow_info(block);
                flow.merge_try(block_info, self.context);
                flow.remove_caught(&caught, &self.tree.types);
                for &handler in &handlers {
                    let handler_info = self.process_and_take(handler);
                    flow.merge_catch(handler_info, self.context);
                }
                if let Some(finalizer) = finalizer {
                    let finally_info = self.process_and_take(finalizer);
                    flow.merge_finally(finally_info, self.context);
                }
                flow.finish()
            }
            NodeKind::Catch { declared, body, .. } => {
                let mut info = FlowInfo::empty();
                for &local in &declared {
                    let write = self.write_leaf(local);
                    info.merge_sequential(Some(write), self.context);
                }
                let body_info = self.process_and_take(body);
                info.merge_sequential(body_info, self.context);
                info
            }

            NodeKind::Return { arg } => {
                let arg_info = arg.and_then(|a| self.process_and_take(a));
                if self.policy.create_return_flow_info(self.tree, node) {
                    let mut info = FlowInfo::empty();
                    info.merge_sequential(arg_info, self.context);
                    info.merge_sequential(Some(FlowInfo::returning(arg.is_some())), self.context);
                    info
                } else {
                    arg_info.unwrap_or_default()
                }
            }
            NodeKind::Throw { arg, exception } => {
                let mut info = FlowInfo::empty();
                let arg_info = self.process_and_take(arg);
                info.merge_sequential(arg_info, self.context);
                info.merge_sequential(Some(FlowInfo::throwing()), self.context);
                if let Some(ty) = exception {
                    if !self.context.is_exception_caught(ty) {
                        info.merge_exception(Some(ty));
                    }
                }
                info
            }
            NodeKind::Break { label } | NodeKind::Continue { label } => FlowInfo::branch(label),
            NodeKind::Labeled { label, body } => {
                let mut info = self.process_and_take(body).unwrap_or_default();
                info.remove_label(Some(&label));
                info
            }
            NodeKind::With { object, body } => {
                let object_info = self.process_and_take(object);
                let body_info = self.process_and_take(body);
                let mut flow = WithFlow::new();
                flow.merge_object(object_info, self.context);
                flow.merge_action(body_info, self.context);
                flow.finish()
            }

            NodeKind::Function {
                params,
                body,
                type_params,
                ..
            } => {
                // Nested closures contribute their captures but cannot
                // return or branch out of the enclosing region.
                let mut flow = SequentialFlow::new();
                for &param in &params {
                    let param_info = self.process_and_take(param);
                    flow.merge(param_info, self.context);
                }
                if let Some(body) = body {
                    let body_info = self.process_and_take(body);
                    flow.merge(body_info, self.context);
                }
                let mut info = flow.finish();
                info.remove_type_variables(&type_params);
                info.set_no_return();
                info
            }
            NodeKind::Class { members } => {
                let mut info = self.sequence(&members);
                info.set_no_return();
                info
            }

            NodeKind::Name { local } => match local {
                Some(local) => FlowInfo::local_access(local, AccessMode::Read, self.context),
                None => FlowInfo::empty(),
            },
            NodeKind::Assign { op, target, value } => self.compute_assignment(op, target, value),
            NodeKind::Pattern { locals, exprs } => {
                let mut info = self.sequence(&exprs);
                for &local in &locals {
                    let write = self.write_leaf(local);
                    info.merge_sequential(Some(write), self.context);
                }
                info
            }
            NodeKind::Update { operand } => match *self.tree.kind(operand) {
                NodeKind::Name {
                    local: Some(local), ..
                } => {
                    let mut info = FlowInfo::local_access(local, AccessMode::Read, self.context);
                    let write = self.write_leaf(local);
                    info.merge_sequential(Some(write), self.context);
                    info
                }
                _ => self.process_and_take(operand).unwrap_or_default(),
            },
            NodeKind::Unary { operand } => self.process_and_take(operand).unwrap_or_default(),
            NodeKind::Binary { left, right } => {
                let mut info = self.process_and_take(left).unwrap_or_default();
                let right_info = self.process_and_take(right);
                info.merge_sequential(right_info, self.context);
                info
            }
            NodeKind::Call { callee, args } => {
                // Arguments are merged before the callee expression.
                let callee_info = callee.and_then(|c| self.process_and_take(c));
                let mut info = self.sequence(&args);
                info.merge_sequential(callee_info, self.context);
                info
            }
            NodeKind::New { callee, args } => {
                let callee_info = callee.and_then(|c| self.process_and_take(c));
                let mut info = FlowInfo::empty();
                info.merge_sequential(callee_info, self.context);
                let args_info = self.sequence(&args);
                info.merge_sequential(Some(args_info), self.context);
                info
            }
            NodeKind::Member { object, property } => {
                let mut info = self.process_and_take(object).unwrap_or_default();
                if let Some(property) = property {
                    let property_info = self.process_and_take(property);
                    info.merge_sequential(property_info, self.context);
                }
                info
            }
            NodeKind::Seq { exprs } => self.sequence(&exprs),
            NodeKind::TypeRef { var } => match var {
                Some(var) => FlowInfo::type_variable(var),
                None => FlowInfo::empty(),
            },
        }
    }

    /// The right-hand side merges before the target's write; compound
    /// operators read the target first.
    fn compute_assignment(&mut self, op: AssignKind, target: NodeId, value: NodeId) -> FlowInfo {
        let mut info = FlowInfo::empty();
        if let NodeKind::Name { local } = *self.tree.kind(target) {
            if op == AssignKind::Compound {
                if let Some(local) = local {
                    let read = FlowInfo::local_access(local, AccessMode::Read, self.context);
                    info.merge_sequential(Some(read), self.context);
                }
            }
            let value_info = self.process_and_take(value);
            info.merge_sequential(value_info, self.context);
            if let Some(local) = local {
                let write = self.write_leaf(local);
                info.merge_sequential(Some(write), self.context);
            }
        } else {
            if op == AssignKind::Compound {
                let target_info = self.process_and_take(target);
                info.merge_sequential(target_info, self.context);
                let value_info = self.process_and_take(value);
                info.merge_sequential(value_info, self.context);
            } else {
                let value_info = self.process_and_take(value);
                info.merge_sequential(value_info, self.context);
                let target_info = self.process_and_take(target);
                info.merge_sequential(target_info, self.context);
            }
        }
        info
    }
}

fn region_ends(info: &FlowInfo) -> bool {
    !info.falls_through() || info.is_partial_return() || info.has_branches()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{LocalId, LocalKind, SwitchClause, SyntaxTree};
    use pretty_assertions::assert_eq;

    fn name(tree: &mut SyntaxTree, local: LocalId) -> NodeId {
        tree.push_node(NodeKind::Name { local: Some(local) })
    }

    fn analyze(tree: &SyntaxTree, root: NodeId) -> FlowInfo {
        let mut context = FlowContext::for_tree(tree);
        let mut analyzer = FlowAnalyzer::new(tree, &mut context, SubtreePolicy);
        analyzer.process(root);
        analyzer.take_flow_info(root).unwrap_or_default()
    }

    #[test]
    fn test_if_with_both_arms_returning() {
        // if (a) { return b; } else { return c; }
        let mut tree = SyntaxTree::new();
        let a = tree.add_local("a", LocalKind::Let);
        let b = tree.add_local("b", LocalKind::Let);
        let c = tree.add_local("c", LocalKind::Let);

        let cond = name(&mut tree, a);
        let b_name = name(&mut tree, b);
        let then_ret = tree.push_node(NodeKind::Return { arg: Some(b_name) });
        let c_name = name(&mut tree, c);
        let else_ret = tree.push_node(NodeKind::Return { arg: Some(c_name) });
        let root = tree.push_node(NodeKind::If {
            cond,
            then_branch: then_ret,
            else_branch: Some(else_ret),
        });

        let info = analyze(&tree, root);
        let context = FlowContext::for_tree(&tree);
        assert!(info.is_return());
        assert!(info.is_value_return());
        assert_eq!(info.access_mode(&context, a), AccessMode::Read);
        assert_eq!(info.access_mode(&context, b), AccessMode::ReadPotential);
        assert_eq!(info.access_mode(&context, c), AccessMode::ReadPotential);
    }

    #[test]
    fn test_if_without_else_is_partial_return() {
        let mut tree = SyntaxTree::new();
        let a = tree.add_local("a", LocalKind::Let);

        let cond = name(&mut tree, a);
        let ret = tree.push_node(NodeKind::Return { arg: None });
        let root = tree.push_node(NodeKind::If {
            cond,
            then_branch: ret,
            else_branch: None,
        });

        let info = analyze(&tree, root);
        assert!(!info.is_return());
        assert!(info.is_partial_return());
    }

    #[test]
    fn test_compound_assignment_reads_then_writes() {
        // v += w  =>  first access to v is a read
        let mut tree = SyntaxTree::new();
        let v = tree.add_local("v", LocalKind::Let);
        let w = tree.add_local("w", LocalKind::Let);

        let target = name(&mut tree, v);
        let value = name(&mut tree, w);
        let root = tree.push_node(NodeKind::Assign {
            op: AssignKind::Compound,
            target,
            value,
        });

        let info = analyze(&tree, root);
        let context = FlowContext::for_tree(&tree);
        assert_eq!(info.access_mode(&context, v), AccessMode::Read);
        assert_eq!(info.access_mode(&context, w), AccessMode::Read);
    }

    #[test]
    fn test_simple_assignment_is_plain_write() {
        let mut tree = SyntaxTree::new();
        let v = tree.add_local("v", LocalKind::Let);

        let target = name(&mut tree, v);
        let value = tree.push_node(NodeKind::Lit);
        let root = tree.push_node(NodeKind::Assign {
            op: AssignKind::Simple,
            target,
            value,
        });

        let info = analyze(&tree, root);
        let context = FlowContext::for_tree(&tree);
        assert_eq!(info.access_mode(&context, v), AccessMode::Write);
    }

    #[test]
    fn test_loop_body_read_after_write_still_reads_on_reentry() {
        // while (c) { use(v); v = 1; }
        let mut tree = SyntaxTree::new();
        let c = tree.add_local("c", LocalKind::Let);
        let v = tree.add_local("v", LocalKind::Let);

        let cond = name(&mut tree, c);
        let v_read = name(&mut tree, v);
        let use_call = tree.push_node(NodeKind::Call {
            callee: None,
            args: vec![v_read],
        });
        let use_stmt = tree.push_node(NodeKind::ExprStmt { expr: use_call });
        let v_target = name(&mut tree, v);
        let lit = tree.push_node(NodeKind::Lit);
        let assign = tree.push_node(NodeKind::Assign {
            op: AssignKind::Simple,
            target: v_target,
            value: lit,
        });
        let assign_stmt = tree.push_node(NodeKind::ExprStmt { expr: assign });
        let body = tree.push_node(NodeKind::Block {
            stmts: vec![use_stmt, assign_stmt],
            declared: vec![],
        });
        let root = tree.push_node(NodeKind::While { cond, body });

        let info = analyze(&tree, root);
        let context = FlowContext::for_tree(&tree);
        assert_eq!(info.access_mode(&context, v), AccessMode::ReadPotential);
    }

    #[test]
    fn test_switch_fall_through_groups_one_region() {
        // switch (d) { case 0: case 1: return; default: v = 1; }
        let mut tree = SyntaxTree::new();
        let d = tree.add_local("d", LocalKind::Let);
        let v = tree.add_local("v", LocalKind::Let);

        let discriminant = name(&mut tree, d);
        let t0 = tree.push_node(NodeKind::Lit);
        let t1 = tree.push_node(NodeKind::Lit);
        let ret = tree.push_node(NodeKind::Return { arg: None });
        let v_target = name(&mut tree, v);
        let lit = tree.push_node(NodeKind::Lit);
        let assign = tree.push_node(NodeKind::Assign {
            op: AssignKind::Simple,
            target: v_target,
            value: lit,
        });
        let assign_stmt = tree.push_node(NodeKind::ExprStmt { expr: assign });

        let root = tree.push_node(NodeKind::Switch {
            discriminant,
            clauses: vec![
                SwitchClause {
                    test: Some(t0),
                    body: vec![],
                    is_default: false,
                },
                SwitchClause {
                    test: Some(t1),
                    body: vec![ret],
                    is_default: false,
                },
                SwitchClause {
                    test: None,
                    body: vec![assign_stmt],
                    is_default: true,
                },
            ],
        });

        let info = analyze(&tree, root);
        let context = FlowContext::for_tree(&tree);
        assert!(info.is_partial_return());
        assert_eq!(info.access_mode(&context, v), AccessMode::WritePotential);
    }

    #[test]
    fn test_unlabeled_break_resolved_by_loop() {
        let mut tree = SyntaxTree::new();
        let cond = tree.push_node(NodeKind::Lit);
        let brk = tree.push_node(NodeKind::Break { label: None });
        let body = tree.push_node(NodeKind::Block {
            stmts: vec![brk],
            declared: vec![],
        });
        let root = tree.push_node(NodeKind::While { cond, body });

        let info = analyze(&tree, root);
        assert!(!info.has_branches());
    }

    #[test]
    fn test_labeled_break_escapes_inner_loop() {
        // outer: while (1) { while (1) { break outer; } }
        let mut tree = SyntaxTree::new();
        let inner_cond = tree.push_node(NodeKind::Lit);
        let brk = tree.push_node(NodeKind::Break {
            label: Some("outer".to_string()),
        });
        let inner_body = tree.push_node(NodeKind::Block {
            stmts: vec![brk],
            declared: vec![],
        });
        let inner = tree.push_node(NodeKind::While {
            cond: inner_cond,
            body: inner_body,
        });
        let outer_cond = tree.push_node(NodeKind::Lit);
        let outer_body = tree.push_node(NodeKind::Block {
            stmts: vec![inner],
            declared: vec![],
        });
        let outer = tree.push_node(NodeKind::While {
            cond: outer_cond,
            body: outer_body,
        });
        let root = tree.push_node(NodeKind::Labeled {
            label: "outer".to_string(),
            body: outer,
        });

        // The inner loop leaves the labeled branch pending; the labeled
        // statement resolves it.
        let mut context = FlowContext::for_tree(&tree);
        let mut analyzer = FlowAnalyzer::new(&tree, &mut context, SubtreePolicy);
        analyzer.process(inner);
        let inner_info = analyzer.take_flow_info(inner).unwrap();
        assert!(inner_info.branches().contains(&Some("outer".to_string())));

        let info = analyze(&tree, root);
        assert!(!info.has_branches());
    }

    #[test]
    fn test_throw_caught_by_enclosing_catch_all() {
        // try { throw new AppError(); } catch (e) {}
        let mut tree = SyntaxTree::new();
        let app_error = tree.types.intern("AppError");
        let e = tree.add_local("e", LocalKind::CatchParam);

        let callee = tree.push_node(NodeKind::Name { local: None });
        let new_expr = tree.push_node(NodeKind::New {
            callee: Some(callee),
            args: vec![],
        });
        let throw = tree.push_node(NodeKind::Throw {
            arg: new_expr,
            exception: Some(app_error),
        });
        let block = tree.push_node(NodeKind::Block {
            stmts: vec![throw],
            declared: vec![],
        });
        let catch_body = tree.push_node(NodeKind::Block {
            stmts: vec![],
            declared: vec![],
        });
        let handler = tree.push_node(NodeKind::Catch {
            declared: vec![e],
            caught: CaughtTypes::All,
            body: catch_body,
        });
        let root = tree.push_node(NodeKind::Try {
            block,
            handlers: vec![handler],
            finalizer: None,
        });

        let info = analyze(&tree, root);
        assert!(info.exceptions().is_empty());
        assert!(!info.is_throw() || info.falls_through());
    }

    #[test]
    fn test_typed_catch_lets_unrelated_exception_escape() {
        let mut tree = SyntaxTree::new();
        let type_error = tree.types.lookup("TypeError").unwrap();
        let app_error = tree.types.intern("AppError");
        let e = tree.add_local("e", LocalKind::CatchParam);

        let arg = tree.push_node(NodeKind::Lit);
        let throw = tree.push_node(NodeKind::Throw {
            arg,
            exception: Some(app_error),
        });
        let block = tree.push_node(NodeKind::Block {
            stmts: vec![throw],
            declared: vec![],
        });
        let catch_body = tree.push_node(NodeKind::Block {
            stmts: vec![],
            declared: vec![],
        });
        let handler = tree.push_node(NodeKind::Catch {
            declared: vec![e],
            caught: CaughtTypes::Types(vec![type_error]),
            body: catch_body,
        });
        let root = tree.push_node(NodeKind::Try {
            block,
            handlers: vec![handler],
            finalizer: None,
        });

        let info = analyze(&tree, root);
        assert_eq!(info.exceptions().len(), 1);
        assert!(info.exceptions().contains(&app_error));
    }

    #[test]
    fn test_nested_function_captures_without_returning() {
        // const f = () => { return v; };
        let mut tree = SyntaxTree::new();
        let v = tree.add_local("v", LocalKind::Let);
        let f = tree.add_local("f", LocalKind::Const);

        let v_name = name(&mut tree, v);
        let ret = tree.push_node(NodeKind::Return { arg: Some(v_name) });
        let fn_body = tree.push_node(NodeKind::Block {
            stmts: vec![ret],
            declared: vec![],
        });
        let function = tree.push_node(NodeKind::Function {
            name: None,
            params: vec![],
            body: Some(fn_body),
            declared: vec![],
            type_params: vec![],
        });
        let decl = tree.push_node(NodeKind::Declarator {
            locals: vec![f],
            ty: vec![],
            init: Some(function),
            implicit_write: false,
        });
        let root = tree.push_node(NodeKind::VarDecl { decls: vec![decl] });

        let info = analyze(&tree, root);
        let context = FlowContext::for_tree(&tree);
        assert!(!info.is_return());
        assert!(!info.is_partial_return());
        assert_eq!(info.access_mode(&context, v), AccessMode::Read);
        assert_eq!(info.access_mode(&context, f), AccessMode::Write);
    }

    #[test]
    fn test_update_expression_reads_then_writes() {
        let mut tree = SyntaxTree::new();
        let i = tree.add_local("i", LocalKind::Let);
        let operand = name(&mut tree, i);
        let root = tree.push_node(NodeKind::Update { operand });

        let info = analyze(&tree, root);
        let context = FlowContext::for_tree(&tree);
        assert_eq!(info.access_mode(&context, i), AccessMode::Read);
    }
}
