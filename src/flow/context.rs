//! Analysis configuration and scratch state threaded through one traversal

use std::collections::BTreeSet;

use crate::tree::{CaughtTypes, Local, LocalId, SyntaxTree, TypeId};

/// How sequential access merges combine a variable's earlier and later
/// accesses. Callers pick the mode matching the question they are asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComputeMode {
    /// Plain first-access summary.
    #[default]
    Merge,
    /// "What must be passed in": a read escaping a potential write still
    /// counts as a read.
    Arguments,
    /// "What is written and visible afterwards": a definite write is
    /// surfaced even after earlier reads.
    ReturnValues,
}

/// Per-analysis configuration plus the catch-clause stack.
///
/// One context belongs to one analyzer instance; independent analyses use
/// independent contexts and share no mutable state.
pub struct FlowContext<'t> {
    tree: &'t SyntaxTree,
    start: usize,
    length: usize,
    consider_access_mode: bool,
    loop_reentrance: bool,
    compute_mode: ComputeMode,
    catch_stack: Vec<Vec<CaughtTypes>>,
    managed: BTreeSet<LocalId>,
}

impl<'t> FlowContext<'t> {
    /// Context tracking the id window `[start, start + length)`.
    pub fn new(tree: &'t SyntaxTree, start: usize, length: usize) -> Self {
        Self {
            tree,
            start,
            length,
            consider_access_mode: true,
            loop_reentrance: false,
            compute_mode: ComputeMode::Merge,
            catch_stack: Vec::new(),
            managed: BTreeSet::new(),
        }
    }

    /// Context tracking every local the tree declares.
    pub fn for_tree(tree: &'t SyntaxTree) -> Self {
        Self::new(tree, 0, tree.local_count())
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn window_len(&self) -> usize {
        self.length
    }

    /// Index of a local inside the tracking window, if tracked at all.
    pub fn index_of(&self, local: LocalId) -> Option<usize> {
        let id = local.index();
        (id >= self.start && id < self.start + self.length).then(|| id - self.start)
    }

    /// The local at a window index.
    pub fn local_at(&self, index: usize) -> (&'t Local, LocalId) {
        let id = LocalId((self.start + index) as u32);
        (self.tree.local(id), id)
    }

    /// Records that an access to `local` was seen during this analysis.
    pub fn manage_local(&mut self, local: LocalId) {
        self.managed.insert(local);
    }

    pub fn managed_locals(&self) -> impl Iterator<Item = LocalId> + '_ {
        self.managed.iter().copied()
    }

    pub fn consider_access_mode(&self) -> bool {
        self.consider_access_mode
    }

    pub fn set_consider_access_mode(&mut self, value: bool) {
        self.consider_access_mode = value;
    }

    pub fn is_loop_reentrance(&self) -> bool {
        self.loop_reentrance
    }

    pub fn set_loop_reentrance(&mut self, value: bool) {
        self.loop_reentrance = value;
    }

    pub fn compute_mode(&self) -> ComputeMode {
        self.compute_mode
    }

    pub fn set_compute_mode(&mut self, mode: ComputeMode) {
        self.compute_mode = mode;
    }

    /// Pushes the catch clauses of a try statement whose body is about to
    /// be traversed.
    pub fn push_exceptions(&mut self, caught: Vec<CaughtTypes>) {
        self.catch_stack.push(caught);
    }

    pub fn pop_exceptions(&mut self) {
        self.catch_stack.pop();
    }

    /// Whether an exception of `ty` is captured by any active catch clause,
    /// walking the stack innermost-first and each candidate's supertype
    /// chain.
    pub fn is_exception_caught(&self, ty: TypeId) -> bool {
        self.catch_stack
            .iter()
            .rev()
            .any(|clauses| clauses.iter().any(|c| c.catches(ty, &self.tree.types)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::LocalKind;

    fn tree_with_locals(names: &[&str]) -> SyntaxTree {
        let mut tree = SyntaxTree::new();
        for name in names {
            tree.add_local(name, LocalKind::Let);
        }
        tree
    }

    #[test]
    fn test_window_indexing() {
        let tree = tree_with_locals(&["a", "b", "c", "d"]);
        let context = FlowContext::new(&tree, 1, 2);

        assert_eq!(context.index_of(LocalId(0)), None);
        assert_eq!(context.index_of(LocalId(1)), Some(0));
        assert_eq!(context.index_of(LocalId(2)), Some(1));
        assert_eq!(context.index_of(LocalId(3)), None);
    }

    #[test]
    fn test_exception_caught_through_stack() {
        let mut tree = tree_with_locals(&[]);
        let error = tree.types.lookup("Error").unwrap();
        let sub = tree.types.intern("SubError");
        tree.types.set_parent(sub, error);
        let unrelated = tree.types.intern("AppSignal");

        let mut context = FlowContext::for_tree(&tree);
        assert!(!context.is_exception_caught(sub));

        context.push_exceptions(vec![CaughtTypes::Types(vec![error])]);
        assert!(context.is_exception_caught(sub));
        assert!(context.is_exception_caught(error));
        assert!(!context.is_exception_caught(unrelated));

        context.push_exceptions(vec![CaughtTypes::All]);
        assert!(context.is_exception_caught(unrelated));

        context.pop_exceptions();
        context.pop_exceptions();
        assert!(!context.is_exception_caught(sub));
    }
}
