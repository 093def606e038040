//! Arena-based syntax-tree view consumed by the flow engine
//!
//! The engine never walks the swc AST directly. Source is lowered into a
//! flat arena of nodes with integer ids, resolved local-variable bindings
//! and an exception-type registry. Refactoring hosts with richer semantic
//! information can also build trees directly through the push APIs.

pub mod lower;
pub mod scope;

use serde::Serialize;

pub use lower::lower_module;

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Dense id of a local variable or parameter declaration.
///
/// Ids are assigned in declaration order and double as indexes into the
/// flow engine's access-mode arrays (the tracking window).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalId(pub(crate) u32);

impl LocalId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Interned exception type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(pub(crate) u32);

/// Interned TypeScript type parameter visible at the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeVarId(pub(crate) u32);

/// What kind of declaration introduced a local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalKind {
    Param,
    Var,
    Let,
    Const,
    CatchParam,
    Function,
    Class,
}

#[derive(Debug, Clone)]
pub struct Local {
    pub name: String,
    pub kind: LocalKind,
}

/// Exception types a catch clause can capture.
///
/// Plain JavaScript `catch (e)` captures everything; hosts that know the
/// guarded types (conditional catch, instanceof dispatch) narrow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaughtTypes {
    All,
    Types(Vec<TypeId>),
}

impl CaughtTypes {
    /// Whether this clause captures a thrown exception of `ty`, walking
    /// each declared type's supertype chain.
    pub fn catches(&self, ty: TypeId, types: &TypeRegistry) -> bool {
        match self {
            CaughtTypes::All => true,
            CaughtTypes::Types(declared) => declared.iter().any(|&t| types.is_subtype(ty, t)),
        }
    }
}

/// One `case`/`default` clause of a switch statement.
#[derive(Debug, Clone)]
pub struct SwitchClause {
    pub test: Option<NodeId>,
    pub body: Vec<NodeId>,
    pub is_default: bool,
}

/// Assignment operator class; compound assignments read before they write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignKind {
    Simple,
    Compound,
}

/// Closed set of node kinds the flow engine dispatches over.
///
/// Children are held inline as node ids; structural slots keep the
/// evaluation order of the original constructs.
#[derive(Debug, Clone)]
pub enum NodeKind {
    // Statements
    Block {
        stmts: Vec<NodeId>,
        declared: Vec<LocalId>,
    },
    VarDecl {
        decls: Vec<NodeId>,
    },
    Declarator {
        locals: Vec<LocalId>,
        ty: Vec<NodeId>,
        init: Option<NodeId>,
        /// Written without a syntactic initializer (for-in/for-of bindings).
        implicit_write: bool,
    },
    ExprStmt {
        expr: NodeId,
    },
    Empty,
    If {
        cond: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        cond: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        cond: NodeId,
    },
    For {
        init: Option<NodeId>,
        cond: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    /// for-in / for-of; `binding` is a Declarator or an assignment target.
    ForEach {
        binding: NodeId,
        object: NodeId,
        body: NodeId,
    },
    Switch {
        discriminant: NodeId,
        clauses: Vec<SwitchClause>,
    },
    Try {
        block: NodeId,
        handlers: Vec<NodeId>,
        finalizer: Option<NodeId>,
    },
    Catch {
        declared: Vec<LocalId>,
        caught: CaughtTypes,
        body: NodeId,
    },
    Return {
        arg: Option<NodeId>,
    },
    Throw {
        arg: NodeId,
        exception: Option<TypeId>,
    },
    Break {
        label: Option<String>,
    },
    Continue {
        label: Option<String>,
    },
    Labeled {
        label: String,
        body: NodeId,
    },
    With {
        object: NodeId,
        body: NodeId,
    },
    Function {
        name: Option<String>,
        params: Vec<NodeId>,
        body: Option<NodeId>,
        /// Params plus function-scoped (`var`-hoisted) locals.
        declared: Vec<LocalId>,
        type_params: Vec<TypeVarId>,
    },
    Class {
        members: Vec<NodeId>,
    },

    // Expressions
    Name {
        local: Option<LocalId>,
    },
    Assign {
        op: AssignKind,
        target: NodeId,
        value: NodeId,
    },
    /// Destructuring assignment target: locals written plus embedded
    /// expressions (computed keys, member targets, defaults) read first.
    Pattern {
        locals: Vec<LocalId>,
        exprs: Vec<NodeId>,
    },
    Update {
        operand: NodeId,
    },
    Unary {
        operand: NodeId,
    },
    Binary {
        left: NodeId,
        right: NodeId,
    },
    Cond {
        cond: NodeId,
        cons: NodeId,
        alt: NodeId,
    },
    Call {
        callee: Option<NodeId>,
        args: Vec<NodeId>,
    },
    New {
        callee: Option<NodeId>,
        args: Vec<NodeId>,
    },
    Member {
        object: NodeId,
        /// Present only for computed properties.
        property: Option<NodeId>,
    },
    Seq {
        exprs: Vec<NodeId>,
    },
    TypeRef {
        var: Option<TypeVarId>,
    },
    Lit,
}

impl NodeKind {
    /// Collects direct children in evaluation order.
    pub fn children(&self, out: &mut Vec<NodeId>) {
        match self {
            NodeKind::Block { stmts, .. } => out.extend(stmts),
            NodeKind::VarDecl { decls } => out.extend(decls),
            NodeKind::Declarator { ty, init, .. } => {
                out.extend(ty);
                out.extend(init);
            }
            NodeKind::ExprStmt { expr } => out.push(*expr),
            NodeKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                out.push(*cond);
                out.push(*then_branch);
                out.extend(else_branch);
            }
            NodeKind::While { cond, body } => {
                out.push(*cond);
                out.push(*body);
            }
            NodeKind::DoWhile { body, cond } => {
                out.push(*body);
                out.push(*cond);
            }
            NodeKind::For {
                init,
                cond,
                update,
                body,
            } => {
                out.extend(init);
                out.extend(cond);
                out.extend(update);
                out.push(*body);
            }
            NodeKind::ForEach {
                binding,
                object,
                body,
            } => {
                out.push(*binding);
                out.push(*object);
                out.push(*body);
            }
            NodeKind::Switch {
                discriminant,
                clauses,
            } => {
                out.push(*discriminant);
                for clause in clauses {
                    out.extend(clause.test);
                    out.extend(&clause.body);
                }
            }
            NodeKind::Try {
                block,
                handlers,
                finalizer,
            } => {
                out.push(*block);
                out.extend(handlers);
                out.extend(finalizer);
            }
            NodeKind::Catch { body, .. } => out.push(*body),
            NodeKind::Return { arg } => out.extend(arg),
            NodeKind::Throw { arg, .. } => out.push(*arg),
            NodeKind::Labeled { body, .. } => out.push(*body),
            NodeKind::With { object, body } => {
                out.push(*object);
                out.push(*body);
            }
            NodeKind::Function { params, body, .. } => {
                out.extend(params);
                out.extend(body);
            }
            NodeKind::Class { members } => out.extend(members),
            NodeKind::Assign { target, value, .. } => {
                out.push(*value);
                out.push(*target);
            }
            NodeKind::Pattern { exprs, .. } => out.extend(exprs),
            NodeKind::Update { operand } | NodeKind::Unary { operand } => out.push(*operand),
            NodeKind::Binary { left, right } => {
                out.push(*left);
                out.push(*right);
            }
            NodeKind::Cond { cond, cons, alt } => {
                out.push(*cond);
                out.push(*cons);
                out.push(*alt);
            }
            NodeKind::Call { callee, args } | NodeKind::New { callee, args } => {
                out.extend(callee);
                out.extend(args);
            }
            NodeKind::Member { object, property } => {
                out.push(*object);
                out.extend(property);
            }
            NodeKind::Seq { exprs } => out.extend(exprs),
            NodeKind::Empty
            | NodeKind::Break { .. }
            | NodeKind::Continue { .. }
            | NodeKind::Name { .. }
            | NodeKind::TypeRef { .. }
            | NodeKind::Lit => {}
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
}

/// Interned exception-type table with single-inheritance supertype edges.
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    names: Vec<String>,
    parents: Vec<Option<TypeId>>,
}

impl TypeRegistry {
    /// Registry pre-populated with the built-in JavaScript error hierarchy.
    pub fn with_builtin_errors() -> Self {
        let mut registry = Self::default();
        let error = registry.intern("Error");
        for name in [
            "TypeError",
            "RangeError",
            "SyntaxError",
            "ReferenceError",
            "EvalError",
            "URIError",
        ] {
            let id = registry.intern(name);
            registry.set_parent(id, error);
        }
        registry
    }

    pub fn intern(&mut self, name: &str) -> TypeId {
        if let Some(id) = self.lookup(name) {
            return id;
        }
        let id = TypeId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.parents.push(None);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| TypeId(i as u32))
    }

    pub fn set_parent(&mut self, ty: TypeId, parent: TypeId) {
        self.parents[ty.0 as usize] = Some(parent);
    }

    pub fn name(&self, ty: TypeId) -> &str {
        &self.names[ty.0 as usize]
    }

    /// Walks the supertype chain; every type is a subtype of itself.
    pub fn is_subtype(&self, sub: TypeId, sup: TypeId) -> bool {
        let mut current = Some(sub);
        while let Some(ty) = current {
            if ty == sup {
                return true;
            }
            current = self.parents[ty.0 as usize];
        }
        false
    }
}

/// The arena tree handed to the flow engine.
#[derive(Debug, Default)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    locals: Vec<Local>,
    type_vars: Vec<String>,
    pub types: TypeRegistry,
    /// Top-level statements of the lowered module, in source order.
    pub root_stmts: Vec<NodeId>,
    functions: Vec<(String, NodeId)>,
}

impl SyntaxTree {
    pub fn new() -> Self {
        Self {
            types: TypeRegistry::with_builtin_errors(),
            ..Self::default()
        }
    }

    pub fn push_node(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind });
        id
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.index()].kind
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn add_local(&mut self, name: &str, kind: LocalKind) -> LocalId {
        let id = LocalId(self.locals.len() as u32);
        self.locals.push(Local {
            name: name.to_string(),
            kind,
        });
        id
    }

    pub fn local(&self, id: LocalId) -> &Local {
        &self.locals[id.index()]
    }

    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    pub fn add_type_var(&mut self, name: &str) -> TypeVarId {
        let id = TypeVarId(self.type_vars.len() as u32);
        self.type_vars.push(name.to_string());
        id
    }

    pub fn type_var_name(&self, id: TypeVarId) -> &str {
        &self.type_vars[id.0 as usize]
    }

    pub(crate) fn register_function(&mut self, name: &str, node: NodeId) {
        self.functions.push((name.to_string(), node));
    }

    /// Looks up a named function declaration anywhere in the module.
    pub fn find_function(&self, name: &str) -> Option<NodeId> {
        self.functions
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, id)| *id)
    }

    /// The statements of a function's body block, for range selections.
    pub fn function_body_stmts(&self, function: NodeId) -> &[NodeId] {
        if let NodeKind::Function {
            body: Some(body), ..
        } = self.kind(function)
        {
            if let NodeKind::Block { stmts, .. } = self.kind(*body) {
                return stmts;
            }
        }
        &[]
    }
}
