//! Scope tracking for binding resolution during lowering
//!
//! Maps names to dense local ids across nested scopes, with `var`
//! declarations hoisted to the nearest function scope and `let`/`const`
//! bound in the block that declares them. Each scope also remembers the
//! locals it introduced so scope-introducing nodes can carry them for the
//! selection-boundary post-pass.

use std::collections::HashMap;

use super::{LocalId, LocalKind, SyntaxTree, TypeVarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Module,
    Function,
    Block,
}

#[derive(Debug)]
struct Scope {
    parent: Option<usize>,
    kind: ScopeKind,
    bindings: HashMap<String, LocalId>,
    type_bindings: HashMap<String, TypeVarId>,
    declared: Vec<LocalId>,
}

/// Scope-chain tracker used by the lowering pass.
pub struct ScopeTracker {
    scopes: Vec<Scope>,
    current: usize,
}

impl ScopeTracker {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope {
                parent: None,
                kind: ScopeKind::Module,
                bindings: HashMap::new(),
                type_bindings: HashMap::new(),
                declared: Vec::new(),
            }],
            current: 0,
        }
    }

    pub fn enter_scope(&mut self, kind: ScopeKind) {
        let parent = self.current;
        self.scopes.push(Scope {
            parent: Some(parent),
            kind,
            bindings: HashMap::new(),
            type_bindings: HashMap::new(),
            declared: Vec::new(),
        });
        self.current = self.scopes.len() - 1;
    }

    /// Exits the current scope, returning the locals it declared.
    pub fn exit_scope(&mut self) -> Vec<LocalId> {
        let declared = std::mem::take(&mut self.scopes[self.current].declared);
        if let Some(parent) = self.scopes[self.current].parent {
            self.current = parent;
        }
        declared
    }

    /// Declares a name, allocating a local id in the tree.
    ///
    /// `var` and function declarations bind in the nearest function (or
    /// module) scope; everything else binds in the current scope.
    /// Re-declaring a name in the same scope reuses the existing id, which
    /// is how the hoisting pre-scan and the in-order lowering agree.
    pub fn declare(&mut self, tree: &mut SyntaxTree, name: &str, kind: LocalKind) -> LocalId {
        let target = match kind {
            LocalKind::Var | LocalKind::Function => self.nearest_function_scope(),
            _ => self.current,
        };
        if let Some(&existing) = self.scopes[target].bindings.get(name) {
            return existing;
        }
        let id = tree.add_local(name, kind);
        self.scopes[target].bindings.insert(name.to_string(), id);
        self.scopes[target].declared.push(id);
        id
    }

    /// Resolves a name through the scope chain.
    pub fn resolve(&self, name: &str) -> Option<LocalId> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            if let Some(&local) = self.scopes[id].bindings.get(name) {
                return Some(local);
            }
            scope_id = self.scopes[id].parent;
        }
        None
    }

    pub fn declare_type_param(&mut self, tree: &mut SyntaxTree, name: &str) -> TypeVarId {
        if let Some(&existing) = self.scopes[self.current].type_bindings.get(name) {
            return existing;
        }
        let id = tree.add_type_var(name);
        self.scopes[self.current]
            .type_bindings
            .insert(name.to_string(), id);
        id
    }

    pub fn resolve_type_param(&self, name: &str) -> Option<TypeVarId> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            if let Some(&var) = self.scopes[id].type_bindings.get(name) {
                return Some(var);
            }
            scope_id = self.scopes[id].parent;
        }
        None
    }

    fn nearest_function_scope(&self) -> usize {
        let mut scope_id = self.current;
        loop {
            match self.scopes[scope_id].kind {
                ScopeKind::Function | ScopeKind::Module => return scope_id,
                ScopeKind::Block => scope_id = self.scopes[scope_id].parent.unwrap_or(0),
            }
        }
    }
}

impl Default for ScopeTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_chain_resolution() {
        let mut tree = SyntaxTree::new();
        let mut scopes = ScopeTracker::new();

        let outer = scopes.declare(&mut tree, "x", LocalKind::Let);
        scopes.enter_scope(ScopeKind::Function);
        let inner = scopes.declare(&mut tree, "y", LocalKind::Param);

        assert_eq!(scopes.resolve("x"), Some(outer));
        assert_eq!(scopes.resolve("y"), Some(inner));
        assert_eq!(scopes.resolve("z"), None);

        scopes.exit_scope();
        assert_eq!(scopes.resolve("y"), None);
    }

    #[test]
    fn test_shadowing_allocates_new_id() {
        let mut tree = SyntaxTree::new();
        let mut scopes = ScopeTracker::new();

        let outer = scopes.declare(&mut tree, "v", LocalKind::Let);
        scopes.enter_scope(ScopeKind::Block);
        let shadow = scopes.declare(&mut tree, "v", LocalKind::Let);

        assert_ne!(outer, shadow);
        assert_eq!(scopes.resolve("v"), Some(shadow));
        scopes.exit_scope();
        assert_eq!(scopes.resolve("v"), Some(outer));
    }

    #[test]
    fn test_var_hoists_to_function_scope() {
        let mut tree = SyntaxTree::new();
        let mut scopes = ScopeTracker::new();

        scopes.enter_scope(ScopeKind::Function);
        scopes.enter_scope(ScopeKind::Block);
        let hoisted = scopes.declare(&mut tree, "v", LocalKind::Var);

        let block_declared = scopes.exit_scope();
        assert!(block_declared.is_empty());
        assert_eq!(scopes.resolve("v"), Some(hoisted));

        let fn_declared = scopes.exit_scope();
        assert_eq!(fn_declared, vec![hoisted]);
    }

    #[test]
    fn test_redeclaring_var_reuses_id() {
        let mut tree = SyntaxTree::new();
        let mut scopes = ScopeTracker::new();

        scopes.enter_scope(ScopeKind::Function);
        let first = scopes.declare(&mut tree, "v", LocalKind::Var);
        let second = scopes.declare(&mut tree, "v", LocalKind::Var);
        assert_eq!(first, second);
        assert_eq!(tree.local_count(), 1);
    }
}
