//! Lowering from the swc AST into the arena tree
//!
//! Resolves identifiers to dense local ids while walking, hoists `var`
//! and function declarations to their function scope, and flattens the
//! syntax the flow engine does not care about (template literals,
//! parentheses, TS assertions) into the closed node set. Anything with
//! no flow relevance lowers to a literal leaf, so unknown syntax never
//! aborts an analysis.

use swc_core::ecma::ast::*;

use super::scope::{ScopeKind, ScopeTracker};
use super::{
    AssignKind, CaughtTypes, LocalId, LocalKind, NodeId, NodeKind, SwitchClause, SyntaxTree,
    TypeId,
};

/// Lowers a parsed module into a tree ready for flow analysis.
pub fn lower_module(module: &Module) -> SyntaxTree {
    let mut lowerer = Lowerer::new();
    lowerer.hoist_module(module);
    for item in &module.body {
        let node = lowerer.lower_module_item(item);
        lowerer.tree.root_stmts.push(node);
    }
    lowerer.tree
}

enum FnBody<'a> {
    Block(&'a BlockStmt),
    Expr(&'a Expr),
    None,
}

struct Lowerer {
    tree: SyntaxTree,
    scopes: ScopeTracker,
}

impl Lowerer {
    fn new() -> Self {
        Self {
            tree: SyntaxTree::new(),
            scopes: ScopeTracker::new(),
        }
    }

    // ---- Hoisting pre-scan -------------------------------------------
    //
    // `var` and function declarations bind before execution reaches
    // them, so their names are declared up front; the in-order pass then
    // resolves to the same ids.

    fn hoist_module(&mut self, module: &Module) {
        for item in &module.body {
            match item {
                ModuleItem::Stmt(stmt) => self.hoist_stmt(stmt),
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                    if let Decl::Var(var) = &export.decl {
                        self.hoist_var_decl(var);
                    }
                }
                ModuleItem::ModuleDecl(_) => {}
            }
        }
    }

    fn hoist_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(Decl::Var(var)) => self.hoist_var_decl(var),
            Stmt::Decl(Decl::Fn(decl)) => {
                self.scopes
                    .declare(&mut self.tree, decl.ident.sym.as_ref(), LocalKind::Function);
            }
            Stmt::Block(block) => {
                for stmt in &block.stmts {
                    self.hoist_stmt(stmt);
                }
            }
            Stmt::If(stmt) => {
                self.hoist_stmt(&stmt.cons);
                if let Some(alt) = &stmt.alt {
                    self.hoist_stmt(alt);
                }
            }
            Stmt::While(stmt) => self.hoist_stmt(&stmt.body),
            Stmt::DoWhile(stmt) => self.hoist_stmt(&stmt.body),
            Stmt::For(stmt) => {
                if let Some(VarDeclOrExpr::VarDecl(var)) = &stmt.init {
                    self.hoist_var_decl(var);
                }
                self.hoist_stmt(&stmt.body);
            }
            Stmt::ForIn(stmt) => {
                if let ForHead::VarDecl(var) = &stmt.left {
                    self.hoist_var_decl(var);
                }
                self.hoist_stmt(&stmt.body);
            }
            Stmt::ForOf(stmt) => {
                if let ForHead::VarDecl(var) = &stmt.left {
                    self.hoist_var_decl(var);
                }
                self.hoist_stmt(&stmt.body);
            }
            Stmt::Labeled(stmt) => self.hoist_stmt(&stmt.body),
            Stmt::With(stmt) => self.hoist_stmt(&stmt.body),
            Stmt::Switch(stmt) => {
                for case in &stmt.cases {
                    for stmt in &case.cons {
                        self.hoist_stmt(stmt);
                    }
                }
            }
            Stmt::Try(stmt) => {
                for s in &stmt.block.stmts {
                    self.hoist_stmt(s);
                }
                if let Some(handler) = &stmt.handler {
                    for s in &handler.body.stmts {
                        self.hoist_stmt(s);
                    }
                }
                if let Some(finalizer) = &stmt.finalizer {
                    for s in &finalizer.stmts {
                        self.hoist_stmt(s);
                    }
                }
            }
            _ => {}
        }
    }

    fn hoist_var_decl(&mut self, var: &VarDecl) {
        if var.kind != VarDeclKind::Var {
            return;
        }
        for decl in &var.decls {
            self.hoist_pat_names(&decl.name);
        }
    }

    fn hoist_pat_names(&mut self, pat: &Pat) {
        match pat {
            Pat::Ident(binding) => {
                self.scopes
                    .declare(&mut self.tree, binding.id.sym.as_ref(), LocalKind::Var);
            }
            Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.hoist_pat_names(elem);
                }
            }
            Pat::Rest(rest) => self.hoist_pat_names(&rest.arg),
            Pat::Assign(assign) => self.hoist_pat_names(&assign.left),
            Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => self.hoist_pat_names(&kv.value),
                        ObjectPatProp::Assign(assign) => {
                            self.scopes.declare(
                                &mut self.tree,
                                assign.key.id.sym.as_ref(),
                                LocalKind::Var,
                            );
                        }
                        ObjectPatProp::Rest(rest) => self.hoist_pat_names(&rest.arg),
                    }
                }
            }
            Pat::Expr(_) | Pat::Invalid(_) => {}
        }
    }

    // ---- Statements --------------------------------------------------

    fn lower_module_item(&mut self, item: &ModuleItem) -> NodeId {
        match item {
            ModuleItem::Stmt(stmt) => self.lower_stmt(stmt),
            ModuleItem::ModuleDecl(decl) => match decl {
                ModuleDecl::Import(import) => {
                    for spec in &import.specifiers {
                        let local = match spec {
                            ImportSpecifier::Named(named) => &named.local,
                            ImportSpecifier::Default(default) => &default.local,
                            ImportSpecifier::Namespace(ns) => &ns.local,
                        };
                        self.scopes
                            .declare(&mut self.tree, local.sym.as_ref(), LocalKind::Const);
                    }
                    self.tree.push_node(NodeKind::Empty)
                }
                ModuleDecl::ExportDecl(export) => self.lower_decl(&export.decl),
                ModuleDecl::ExportDefaultDecl(export) => match &export.decl {
                    DefaultDecl::Fn(expr) => self.lower_fn_expr(expr),
                    DefaultDecl::Class(expr) => self.lower_class_expr(expr),
                    DefaultDecl::TsInterfaceDecl(_) => self.tree.push_node(NodeKind::Empty),
                },
                ModuleDecl::ExportDefaultExpr(export) => {
                    let expr = self.lower_expr(&export.expr);
                    self.tree.push_node(NodeKind::ExprStmt { expr })
                }
                _ => self.tree.push_node(NodeKind::Empty),
            },
        }
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> NodeId {
        match stmt {
            Stmt::Block(block) => self.lower_block(block),
            Stmt::Empty(_) | Stmt::Debugger(_) => self.tree.push_node(NodeKind::Empty),
            Stmt::Expr(stmt) => {
                let expr = self.lower_expr(&stmt.expr);
                self.tree.push_node(NodeKind::ExprStmt { expr })
            }
            Stmt::Decl(decl) => self.lower_decl(decl),
            Stmt::Return(stmt) => {
                let arg = stmt.arg.as_deref().map(|e| self.lower_expr(e));
                self.tree.push_node(NodeKind::Return { arg })
            }
            Stmt::Throw(stmt) => {
                let exception = self.throw_exception_type(&stmt.arg);
                let arg = self.lower_expr(&stmt.arg);
                self.tree.push_node(NodeKind::Throw { arg, exception })
            }
            Stmt::Break(stmt) => self.tree.push_node(NodeKind::Break {
                label: stmt.label.as_ref().map(|l| l.sym.to_string()),
            }),
            Stmt::Continue(stmt) => self.tree.push_node(NodeKind::Continue {
                label: stmt.label.as_ref().map(|l| l.sym.to_string()),
            }),
            Stmt::Labeled(stmt) => {
                let body = self.lower_stmt(&stmt.body);
                self.tree.push_node(NodeKind::Labeled {
                    label: stmt.label.sym.to_string(),
                    body,
                })
            }
            Stmt::If(stmt) => {
                let cond = self.lower_expr(&stmt.test);
                let then_branch = self.lower_stmt(&stmt.cons);
                let else_branch = stmt.alt.as_deref().map(|s| self.lower_stmt(s));
                self.tree.push_node(NodeKind::If {
                    cond,
                    then_branch,
                    else_branch,
                })
            }
            Stmt::While(stmt) => {
                let cond = self.lower_expr(&stmt.test);
                let body = self.lower_stmt(&stmt.body);
                self.tree.push_node(NodeKind::While { cond, body })
            }
            Stmt::DoWhile(stmt) => {
                let body = self.lower_stmt(&stmt.body);
                let cond = self.lower_expr(&stmt.test);
                self.tree.push_node(NodeKind::DoWhile { body, cond })
            }
            Stmt::For(stmt) => {
                self.scopes.enter_scope(ScopeKind::Block);
                let init = stmt.init.as_ref().map(|init| match init {
                    VarDeclOrExpr::VarDecl(var) => self.lower_var_decl(var),
                    VarDeclOrExpr::Expr(expr) => self.lower_expr(expr),
                });
                let cond = stmt.test.as_deref().map(|e| self.lower_expr(e));
                let update = stmt.update.as_deref().map(|e| self.lower_expr(e));
                let body = self.lower_stmt(&stmt.body);
                let declared = self.scopes.exit_scope();
                let node = self.tree.push_node(NodeKind::For {
                    init,
                    cond,
                    update,
                    body,
                });
                self.wrap_declared(node, declared)
            }
            Stmt::ForIn(stmt) => self.lower_for_each(&stmt.left, &stmt.right, &stmt.body),
            Stmt::ForOf(stmt) => self.lower_for_each(&stmt.left, &stmt.right, &stmt.body),
            Stmt::Switch(stmt) => {
                let discriminant = self.lower_expr(&stmt.discriminant);
                self.scopes.enter_scope(ScopeKind::Block);
                let clauses = stmt
                    .cases
                    .iter()
                    .map(|case| SwitchClause {
                        test: case.test.as_deref().map(|e| self.lower_expr(e)),
                        body: case.cons.iter().map(|s| self.lower_stmt(s)).collect(),
                        is_default: case.test.is_none(),
                    })
                    .collect();
                let declared = self.scopes.exit_scope();
                let node = self.tree.push_node(NodeKind::Switch {
                    discriminant,
                    clauses,
                });
                self.wrap_declared(node, declared)
            }
            Stmt::Try(stmt) => {
                let block = self.lower_block(&stmt.block);
                let mut handlers = Vec::new();
                if let Some(handler) = &stmt.handler {
                    handlers.push(self.lower_catch(handler));
                }
                let finalizer = stmt.finalizer.as_ref().map(|b| self.lower_block(b));
                self.tree.push_node(NodeKind::Try {
                    block,
                    handlers,
                    finalizer,
                })
            }
            Stmt::With(stmt) => {
                let object = self.lower_expr(&stmt.obj);
                let body = self.lower_stmt(&stmt.body);
                self.tree.push_node(NodeKind::With { object, body })
            }
        }
    }

    fn lower_decl(&mut self, decl: &Decl) -> NodeId {
        match decl {
            Decl::Var(var) => self.lower_var_decl(var),
            Decl::Fn(decl) => {
                let name = decl.ident.sym.as_ref();
                self.scopes
                    .declare(&mut self.tree, name, LocalKind::Function);
                let pats: Vec<Pat> =
                    decl.function.params.iter().map(|p| p.pat.clone()).collect();
                let body = match &decl.function.body {
                    Some(block) => FnBody::Block(block),
                    None => FnBody::None,
                };
                let node = self.lower_function(
                    Some(name),
                    decl.function.type_params.as_deref(),
                    &pats,
                    decl.function.return_type.as_deref(),
                    body,
                );
                self.tree.register_function(name, node);
                node
            }
            Decl::Class(decl) => {
                let name = decl.ident.sym.as_ref().to_string();
                self.scopes
                    .declare(&mut self.tree, &name, LocalKind::Class);
                self.register_class_type(&name, &decl.class);
                self.lower_class(&decl.class)
            }
            Decl::Using(using) => {
                let decls = using
                    .decls
                    .iter()
                    .map(|d| self.lower_declarator(d, LocalKind::Const))
                    .collect();
                self.tree.push_node(NodeKind::VarDecl { decls })
            }
            Decl::TsInterface(_) | Decl::TsTypeAlias(_) | Decl::TsEnum(_) | Decl::TsModule(_) => {
                self.tree.push_node(NodeKind::Empty)
            }
        }
    }

    fn lower_block(&mut self, block: &BlockStmt) -> NodeId {
        self.scopes.enter_scope(ScopeKind::Block);
        let stmts = block.stmts.iter().map(|s| self.lower_stmt(s)).collect();
        let declared = self.scopes.exit_scope();
        self.tree.push_node(NodeKind::Block { stmts, declared })
    }

    fn lower_catch(&mut self, handler: &CatchClause) -> NodeId {
        self.scopes.enter_scope(ScopeKind::Block);
        if let Some(param) = &handler.param {
            let mut locals = Vec::new();
            let mut exprs = Vec::new();
            self.lower_binding_pat(param, LocalKind::CatchParam, &mut locals, &mut exprs);
        }
        let stmts = handler.body.stmts.iter().map(|s| self.lower_stmt(s)).collect();
        let body = self.tree.push_node(NodeKind::Block {
            stmts,
            declared: Vec::new(),
        });
        let declared = self.scopes.exit_scope();
        self.tree.push_node(NodeKind::Catch {
            declared,
            caught: CaughtTypes::All,
            body,
        })
    }

    fn lower_var_decl(&mut self, var: &VarDecl) -> NodeId {
        let kind = local_kind(var.kind);
        let decls = var
            .decls
            .iter()
            .map(|d| self.lower_declarator(d, kind))
            .collect();
        self.tree.push_node(NodeKind::VarDecl { decls })
    }

    fn lower_declarator(&mut self, decl: &VarDeclarator, kind: LocalKind) -> NodeId {
        let init = decl.init.as_deref().map(|e| self.lower_expr(e));
        let mut locals = Vec::new();
        let mut ty = Vec::new();
        self.lower_binding_pat(&decl.name, kind, &mut locals, &mut ty);
        self.tree.push_node(NodeKind::Declarator {
            locals,
            ty,
            init,
            implicit_write: false,
        })
    }

    fn lower_for_each(&mut self, left: &ForHead, right: &Expr, body: &Stmt) -> NodeId {
        self.scopes.enter_scope(ScopeKind::Block);
        let binding = match left {
            ForHead::VarDecl(var) => {
                let kind = local_kind(var.kind);
                let mut locals = Vec::new();
                let mut ty = Vec::new();
                if let Some(decl) = var.decls.first() {
                    self.lower_binding_pat(&decl.name, kind, &mut locals, &mut ty);
                }
                self.tree.push_node(NodeKind::Declarator {
                    locals,
                    ty,
                    init: None,
                    implicit_write: true,
                })
            }
            ForHead::UsingDecl(using) => {
                let mut locals = Vec::new();
                let mut ty = Vec::new();
                if let Some(decl) = using.decls.first() {
                    self.lower_binding_pat(&decl.name, LocalKind::Const, &mut locals, &mut ty);
                }
                self.tree.push_node(NodeKind::Declarator {
                    locals,
                    ty,
                    init: None,
                    implicit_write: true,
                })
            }
            ForHead::Pat(pat) => self.lower_assign_target_pat(pat),
        };
        let object = self.lower_expr(right);
        let body = self.lower_stmt(body);
        let declared = self.scopes.exit_scope();
        let node = self.tree.push_node(NodeKind::ForEach {
            binding,
            object,
            body,
        });
        self.wrap_declared(node, declared)
    }

    /// Lexical declarations scoped to a loop or switch head get a
    /// synthetic block so the boundary pass sees where they end.
    fn wrap_declared(&mut self, node: NodeId, declared: Vec<LocalId>) -> NodeId {
        if declared.is_empty() {
            node
        } else {
            self.tree.push_node(NodeKind::Block {
                stmts: vec![node],
                declared,
            })
        }
    }

    // ---- Expressions -------------------------------------------------

    fn lower_expr(&mut self, expr: &Expr) -> NodeId {
        match expr {
            Expr::Ident(ident) => {
                let local = self.scopes.resolve(ident.sym.as_ref());
                self.tree.push_node(NodeKind::Name { local })
            }
            Expr::Paren(paren) => self.lower_expr(&paren.expr),
            Expr::Seq(seq) => {
                let exprs = seq.exprs.iter().map(|e| self.lower_expr(e)).collect();
                self.tree.push_node(NodeKind::Seq { exprs })
            }
            Expr::Unary(unary) => {
                let operand = self.lower_expr(&unary.arg);
                self.tree.push_node(NodeKind::Unary { operand })
            }
            Expr::Update(update) => {
                let operand = self.lower_expr(&update.arg);
                self.tree.push_node(NodeKind::Update { operand })
            }
            Expr::Bin(bin) => {
                let left = self.lower_expr(&bin.left);
                let right = self.lower_expr(&bin.right);
                self.tree.push_node(NodeKind::Binary { left, right })
            }
            Expr::Cond(cond) => {
                let test = self.lower_expr(&cond.test);
                let cons = self.lower_expr(&cond.cons);
                let alt = self.lower_expr(&cond.alt);
                self.tree.push_node(NodeKind::Cond {
                    cond: test,
                    cons,
                    alt,
                })
            }
            Expr::Assign(assign) => self.lower_assign(assign),
            Expr::Member(member) => self.lower_member(member),
            Expr::SuperProp(sup) => {
                let object = self.tree.push_node(NodeKind::Lit);
                let property = match &sup.prop {
                    SuperProp::Computed(computed) => Some(self.lower_expr(&computed.expr)),
                    SuperProp::Ident(_) => None,
                };
                self.tree.push_node(NodeKind::Member { object, property })
            }
            Expr::Call(call) => {
                let callee = match &call.callee {
                    Callee::Expr(expr) => Some(self.lower_expr(expr)),
                    Callee::Super(_) | Callee::Import(_) => None,
                };
                let args = call.args.iter().map(|a| self.lower_expr(&a.expr)).collect();
                self.tree.push_node(NodeKind::Call { callee, args })
            }
            Expr::OptChain(chain) => match &*chain.base {
                OptChainBase::Member(member) => self.lower_member(member),
                OptChainBase::Call(call) => {
                    let callee = Some(self.lower_expr(&call.callee));
                    let args = call.args.iter().map(|a| self.lower_expr(&a.expr)).collect();
                    self.tree.push_node(NodeKind::Call { callee, args })
                }
            },
            Expr::New(new) => {
                let callee = Some(self.lower_expr(&new.callee));
                let args = new
                    .args
                    .iter()
                    .flatten()
                    .map(|a| self.lower_expr(&a.expr))
                    .collect();
                self.tree.push_node(NodeKind::New { callee, args })
            }
            Expr::Array(array) => {
                let exprs = array
                    .elems
                    .iter()
                    .flatten()
                    .map(|e| self.lower_expr(&e.expr))
                    .collect();
                self.tree.push_node(NodeKind::Seq { exprs })
            }
            Expr::Object(object) => {
                let mut exprs = Vec::new();
                for prop in &object.props {
                    match prop {
                        PropOrSpread::Spread(spread) => exprs.push(self.lower_expr(&spread.expr)),
                        PropOrSpread::Prop(prop) => match &**prop {
                            Prop::Shorthand(ident) => {
                                let local = self.scopes.resolve(ident.sym.as_ref());
                                exprs.push(self.tree.push_node(NodeKind::Name { local }));
                            }
                            Prop::KeyValue(kv) => {
                                if let PropName::Computed(key) = &kv.key {
                                    exprs.push(self.lower_expr(&key.expr));
                                }
                                exprs.push(self.lower_expr(&kv.value));
                            }
                            Prop::Assign(assign) => exprs.push(self.lower_expr(&assign.value)),
                            Prop::Getter(getter) => {
                                let body = match &getter.body {
                                    Some(block) => FnBody::Block(block),
                                    None => FnBody::None,
                                };
                                exprs.push(self.lower_function(None, None, &[], None, body));
                            }
                            Prop::Setter(setter) => {
                                let params = vec![(*setter.param).clone()];
                                let body = match &setter.body {
                                    Some(block) => FnBody::Block(block),
                                    None => FnBody::None,
                                };
                                exprs.push(self.lower_function(None, None, &params, None, body));
                            }
                            Prop::Method(method) => {
                                exprs.push(self.lower_fn_parts(None, &method.function));
                            }
                        },
                    }
                }
                self.tree.push_node(NodeKind::Seq { exprs })
            }
            Expr::Fn(expr) => self.lower_fn_expr(expr),
            Expr::Arrow(arrow) => {
                let body = match &*arrow.body {
                    BlockStmtOrExpr::BlockStmt(block) => FnBody::Block(block),
                    BlockStmtOrExpr::Expr(expr) => FnBody::Expr(expr),
                };
                self.lower_function(
                    None,
                    arrow.type_params.as_deref(),
                    &arrow.params,
                    arrow.return_type.as_deref(),
                    body,
                )
            }
            Expr::Class(expr) => self.lower_class_expr(expr),
            Expr::Tpl(tpl) => {
                let exprs = tpl.exprs.iter().map(|e| self.lower_expr(e)).collect();
                self.tree.push_node(NodeKind::Seq { exprs })
            }
            Expr::TaggedTpl(tagged) => {
                let callee = Some(self.lower_expr(&tagged.tag));
                let args = tagged.tpl.exprs.iter().map(|e| self.lower_expr(e)).collect();
                self.tree.push_node(NodeKind::Call { callee, args })
            }
            Expr::Yield(expr) => match &expr.arg {
                Some(arg) => {
                    let operand = self.lower_expr(arg);
                    self.tree.push_node(NodeKind::Unary { operand })
                }
                None => self.tree.push_node(NodeKind::Lit),
            },
            Expr::Await(expr) => {
                let operand = self.lower_expr(&expr.arg);
                self.tree.push_node(NodeKind::Unary { operand })
            }
            Expr::TsNonNull(expr) => self.lower_expr(&expr.expr),
            Expr::TsAs(expr) => self.lower_expr(&expr.expr),
            Expr::TsSatisfies(expr) => self.lower_expr(&expr.expr),
            Expr::TsConstAssertion(expr) => self.lower_expr(&expr.expr),
            Expr::TsTypeAssertion(expr) => self.lower_expr(&expr.expr),
            Expr::TsInstantiation(expr) => self.lower_expr(&expr.expr),
            _ => self.tree.push_node(NodeKind::Lit),
        }
    }

    fn lower_member(&mut self, member: &MemberExpr) -> NodeId {
        let object = self.lower_expr(&member.obj);
        let property = match &member.prop {
            MemberProp::Computed(computed) => Some(self.lower_expr(&computed.expr)),
            MemberProp::Ident(_) | MemberProp::PrivateName(_) => None,
        };
        self.tree.push_node(NodeKind::Member { object, property })
    }

    fn lower_assign(&mut self, assign: &AssignExpr) -> NodeId {
        let op = if assign.op == AssignOp::Assign {
            AssignKind::Simple
        } else {
            AssignKind::Compound
        };
        let target = match &assign.left {
            AssignTarget::Simple(simple) => match simple {
                SimpleAssignTarget::Ident(binding) => {
                    let local = self.scopes.resolve(binding.id.sym.as_ref());
                    self.tree.push_node(NodeKind::Name { local })
                }
                SimpleAssignTarget::Member(member) => self.lower_member(member),
                SimpleAssignTarget::Paren(paren) => self.lower_expr(&paren.expr),
                SimpleAssignTarget::OptChain(chain) => {
                    self.lower_expr(&Expr::OptChain(chain.clone()))
                }
                SimpleAssignTarget::TsAs(expr) => self.lower_expr(&expr.expr),
                SimpleAssignTarget::TsSatisfies(expr) => self.lower_expr(&expr.expr),
                SimpleAssignTarget::TsNonNull(expr) => self.lower_expr(&expr.expr),
                SimpleAssignTarget::TsTypeAssertion(expr) => self.lower_expr(&expr.expr),
                SimpleAssignTarget::TsInstantiation(expr) => self.lower_expr(&expr.expr),
                SimpleAssignTarget::SuperProp(_) | SimpleAssignTarget::Invalid(_) => {
                    self.tree.push_node(NodeKind::Lit)
                }
            },
            AssignTarget::Pat(pat) => match pat {
                AssignTargetPat::Array(array) => {
                    let mut locals = Vec::new();
                    let mut exprs = Vec::new();
                    for elem in array.elems.iter().flatten() {
                        self.collect_assign_pat(elem, &mut locals, &mut exprs);
                    }
                    self.tree.push_node(NodeKind::Pattern { locals, exprs })
                }
                AssignTargetPat::Object(object) => {
                    let mut locals = Vec::new();
                    let mut exprs = Vec::new();
                    self.collect_assign_object(object, &mut locals, &mut exprs);
                    self.tree.push_node(NodeKind::Pattern { locals, exprs })
                }
                AssignTargetPat::Invalid(_) => self.tree.push_node(NodeKind::Lit),
            },
        };
        let value = self.lower_expr(&assign.right);
        self.tree.push_node(NodeKind::Assign { op, target, value })
    }

    /// Assignment-position pattern: names resolve to existing locals.
    fn lower_assign_target_pat(&mut self, pat: &Pat) -> NodeId {
        match pat {
            Pat::Ident(binding) => {
                let local = self.scopes.resolve(binding.id.sym.as_ref());
                self.tree.push_node(NodeKind::Name { local })
            }
            Pat::Expr(expr) => self.lower_expr(expr),
            _ => {
                let mut locals = Vec::new();
                let mut exprs = Vec::new();
                self.collect_assign_pat(pat, &mut locals, &mut exprs);
                self.tree.push_node(NodeKind::Pattern { locals, exprs })
            }
        }
    }

    fn collect_assign_pat(
        &mut self,
        pat: &Pat,
        locals: &mut Vec<LocalId>,
        exprs: &mut Vec<NodeId>,
    ) {
        match pat {
            Pat::Ident(binding) => {
                if let Some(local) = self.scopes.resolve(binding.id.sym.as_ref()) {
                    locals.push(local);
                }
            }
            Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.collect_assign_pat(elem, locals, exprs);
                }
            }
            Pat::Rest(rest) => self.collect_assign_pat(&rest.arg, locals, exprs),
            Pat::Assign(assign) => {
                exprs.push(self.lower_expr(&assign.right));
                self.collect_assign_pat(&assign.left, locals, exprs);
            }
            Pat::Object(object) => self.collect_assign_object(object, locals, exprs),
            Pat::Expr(expr) => exprs.push(self.lower_expr(expr)),
            Pat::Invalid(_) => {}
        }
    }

    fn collect_assign_object(
        &mut self,
        object: &ObjectPat,
        locals: &mut Vec<LocalId>,
        exprs: &mut Vec<NodeId>,
    ) {
        for prop in &object.props {
            match prop {
                ObjectPatProp::KeyValue(kv) => {
                    if let PropName::Computed(key) = &kv.key {
                        exprs.push(self.lower_expr(&key.expr));
                    }
                    self.collect_assign_pat(&kv.value, locals, exprs);
                }
                ObjectPatProp::Assign(assign) => {
                    if let Some(value) = &assign.value {
                        exprs.push(self.lower_expr(value));
                    }
                    if let Some(local) = self.scopes.resolve(assign.key.id.sym.as_ref()) {
                        locals.push(local);
                    }
                }
                ObjectPatProp::Rest(rest) => self.collect_assign_pat(&rest.arg, locals, exprs),
            }
        }
    }

    /// Declaration-position pattern: names bind fresh locals of `kind`.
    fn lower_binding_pat(
        &mut self,
        pat: &Pat,
        kind: LocalKind,
        locals: &mut Vec<LocalId>,
        exprs: &mut Vec<NodeId>,
    ) {
        match pat {
            Pat::Ident(binding) => {
                locals.push(
                    self.scopes
                        .declare(&mut self.tree, binding.id.sym.as_ref(), kind),
                );
                if let Some(ann) = &binding.type_ann {
                    self.collect_type(&ann.type_ann, exprs);
                }
            }
            Pat::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.lower_binding_pat(elem, kind, locals, exprs);
                }
            }
            Pat::Rest(rest) => self.lower_binding_pat(&rest.arg, kind, locals, exprs),
            Pat::Assign(assign) => {
                exprs.push(self.lower_expr(&assign.right));
                self.lower_binding_pat(&assign.left, kind, locals, exprs);
            }
            Pat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => {
                            if let PropName::Computed(key) = &kv.key {
                                exprs.push(self.lower_expr(&key.expr));
                            }
                            self.lower_binding_pat(&kv.value, kind, locals, exprs);
                        }
                        ObjectPatProp::Assign(assign) => {
                            if let Some(value) = &assign.value {
                                exprs.push(self.lower_expr(value));
                            }
                            locals.push(self.scopes.declare(
                                &mut self.tree,
                                assign.key.id.sym.as_ref(),
                                kind,
                            ));
                        }
                        ObjectPatProp::Rest(rest) => {
                            self.lower_binding_pat(&rest.arg, kind, locals, exprs)
                        }
                    }
                }
            }
            Pat::Expr(expr) => exprs.push(self.lower_expr(expr)),
            Pat::Invalid(_) => {}
        }
    }

    // ---- Functions and classes ---------------------------------------

    fn lower_fn_expr(&mut self, expr: &FnExpr) -> NodeId {
        let name = expr.ident.as_ref().map(|i| i.sym.to_string());
        self.lower_fn_parts(name.as_deref(), &expr.function)
    }

    fn lower_fn_parts(&mut self, name: Option<&str>, function: &Function) -> NodeId {
        let pats: Vec<Pat> = function.params.iter().map(|p| p.pat.clone()).collect();
        let body = match &function.body {
            Some(block) => FnBody::Block(block),
            None => FnBody::None,
        };
        self.lower_function(
            name,
            function.type_params.as_deref(),
            &pats,
            function.return_type.as_deref(),
            body,
        )
    }

    fn lower_function(
        &mut self,
        name: Option<&str>,
        type_params: Option<&TsTypeParamDecl>,
        params: &[Pat],
        return_type: Option<&TsTypeAnn>,
        body: FnBody,
    ) -> NodeId {
        self.scopes.enter_scope(ScopeKind::Function);
        // A function expression's name is visible inside its own body.
        if let Some(name) = name {
            self.scopes.declare(&mut self.tree, name, LocalKind::Function);
        }
        let mut bound = Vec::new();
        if let Some(decl) = type_params {
            for param in &decl.params {
                bound.push(
                    self.scopes
                        .declare_type_param(&mut self.tree, param.name.sym.as_ref()),
                );
            }
        }
        let mut param_nodes = Vec::new();
        for pat in params {
            let mut locals = Vec::new();
            let mut exprs = Vec::new();
            self.lower_binding_pat(pat, LocalKind::Param, &mut locals, &mut exprs);
            param_nodes.push(self.tree.push_node(NodeKind::Pattern { locals, exprs }));
        }
        if let Some(ret) = return_type {
            let mut refs = Vec::new();
            self.collect_type(&ret.type_ann, &mut refs);
            if !refs.is_empty() {
                param_nodes.push(self.tree.push_node(NodeKind::Pattern {
                    locals: Vec::new(),
                    exprs: refs,
                }));
            }
        }
        let body_node = match body {
            FnBody::Block(block) => {
                for stmt in &block.stmts {
                    self.hoist_stmt(stmt);
                }
                let stmts = block.stmts.iter().map(|s| self.lower_stmt(s)).collect();
                Some(self.tree.push_node(NodeKind::Block {
                    stmts,
                    declared: Vec::new(),
                }))
            }
            FnBody::Expr(expr) => {
                let arg = self.lower_expr(expr);
                let ret = self.tree.push_node(NodeKind::Return { arg: Some(arg) });
                Some(self.tree.push_node(NodeKind::Block {
                    stmts: vec![ret],
                    declared: Vec::new(),
                }))
            }
            FnBody::None => None,
        };
        let declared = self.scopes.exit_scope();
        self.tree.push_node(NodeKind::Function {
            name: name.map(str::to_string),
            params: param_nodes,
            body: body_node,
            declared,
            type_params: bound,
        })
    }

    fn lower_class_expr(&mut self, expr: &ClassExpr) -> NodeId {
        if let Some(ident) = &expr.ident {
            let name = ident.sym.to_string();
            self.register_class_type(&name, &expr.class);
        }
        self.lower_class(&expr.class)
    }

    fn lower_class(&mut self, class: &Class) -> NodeId {
        let mut members = Vec::new();
        if let Some(super_class) = class.super_class.as_deref() {
            members.push(self.lower_expr(super_class));
        }
        for member in &class.body {
            match member {
                ClassMember::Constructor(ctor) => {
                    let pats: Vec<Pat> = ctor
                        .params
                        .iter()
                        .filter_map(|p| match p {
                            ParamOrTsParamProp::Param(param) => Some(param.pat.clone()),
                            ParamOrTsParamProp::TsParamProp(_) => None,
                        })
                        .collect();
                    let body = match &ctor.body {
                        Some(block) => FnBody::Block(block),
                        None => FnBody::None,
                    };
                    members.push(self.lower_function(None, None, &pats, None, body));
                }
                ClassMember::Method(method) => {
                    if let PropName::Computed(key) = &method.key {
                        members.push(self.lower_expr(&key.expr));
                    }
                    members.push(self.lower_fn_parts(None, &method.function));
                }
                ClassMember::PrivateMethod(method) => {
                    members.push(self.lower_fn_parts(None, &method.function));
                }
                ClassMember::ClassProp(prop) => {
                    if let PropName::Computed(key) = &prop.key {
                        members.push(self.lower_expr(&key.expr));
                    }
                    if let Some(value) = &prop.value {
                        members.push(self.lower_expr(value));
                    }
                }
                ClassMember::PrivateProp(prop) => {
                    if let Some(value) = &prop.value {
                        members.push(self.lower_expr(value));
                    }
                }
                ClassMember::StaticBlock(block) => {
                    members.push(self.lower_block(&block.body));
                }
                ClassMember::TsIndexSignature(_)
                | ClassMember::Empty(_)
                | ClassMember::AutoAccessor(_) => {}
            }
        }
        self.tree.push_node(NodeKind::Class { members })
    }

    /// `class X extends Y` contributes a supertype edge so catch-clause
    /// matching can walk user-defined error hierarchies.
    fn register_class_type(&mut self, name: &str, class: &Class) {
        let ty = self.tree.types.intern(name);
        if let Some(Expr::Ident(sup)) = class.super_class.as_deref() {
            let parent = self.tree.types.intern(sup.sym.as_ref());
            self.tree.types.set_parent(ty, parent);
        }
    }

    /// `throw new E(...)` is the one throw shape whose exception type is
    /// statically known.
    fn throw_exception_type(&mut self, arg: &Expr) -> Option<TypeId> {
        if let Expr::New(new) = arg {
            if let Expr::Ident(ident) = &*new.callee {
                return Some(self.tree.types.intern(ident.sym.as_ref()));
            }
        }
        None
    }

    // ---- Types -------------------------------------------------------

    /// Collects references to in-scope type parameters from an
    /// annotation; anything else in the type is irrelevant to flow.
    fn collect_type(&mut self, ty: &TsType, out: &mut Vec<NodeId>) {
        match ty {
            TsType::TsTypeRef(type_ref) => {
                if let TsEntityName::Ident(ident) = &type_ref.type_name {
                    let var = self.scopes.resolve_type_param(ident.sym.as_ref());
                    out.push(self.tree.push_node(NodeKind::TypeRef { var }));
                }
                if let Some(args) = &type_ref.type_params {
                    for arg in &args.params {
                        self.collect_type(arg, out);
                    }
                }
            }
            TsType::TsArrayType(array) => self.collect_type(&array.elem_type, out),
            TsType::TsOptionalType(opt) => self.collect_type(&opt.type_ann, out),
            TsType::TsRestType(rest) => self.collect_type(&rest.type_ann, out),
            TsType::TsParenthesizedType(paren) => self.collect_type(&paren.type_ann, out),
            TsType::TsTypeOperator(op) => self.collect_type(&op.type_ann, out),
            TsType::TsTupleType(tuple) => {
                for elem in &tuple.elem_types {
                    self.collect_type(&elem.ty, out);
                }
            }
            TsType::TsUnionOrIntersectionType(either) => {
                let types = match either {
                    TsUnionOrIntersectionType::TsUnionType(union) => &union.types,
                    TsUnionOrIntersectionType::TsIntersectionType(inter) => &inter.types,
                };
                for ty in types {
                    self.collect_type(ty, out);
                }
            }
            TsType::TsIndexedAccessType(indexed) => {
                self.collect_type(&indexed.obj_type, out);
                self.collect_type(&indexed.index_type, out);
            }
            _ => {}
        }
    }
}

fn local_kind(kind: VarDeclKind) -> LocalKind {
    match kind {
        VarDeclKind::Var => LocalKind::Var,
        VarDeclKind::Let => LocalKind::Let,
        VarDeclKind::Const => LocalKind::Const,
    }
}
