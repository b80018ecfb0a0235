//! Scopes and classified identifiers
//!
//! A [`Scope`] is an area of the ownership tree that carries the ordered
//! list of identifiers recorded while walking its region of the AST. The
//! walk never claims certainty it lacks: a name read before its binding is
//! known is recorded as [`IdType::Unknown`] and settled here, in the
//! resolution pass run by [`ScopeTree::finalize`].

use crate::area::{Area, AreaId, ScopeTree};
use crate::ast::Node;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Why a scope exists - which syntactic construct introduced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    /// The program root.
    Program,
    /// Function declaration/expression, arrow function, or a class
    /// method/accessor/constructor body.
    Function,
    /// A standalone block in a scope-opening position.
    Block,
    /// `for`, `for..in` or `for..of` head and body.
    For,
    /// A `catch` clause (parameter and body).
    Catch,
    /// One scope wrapping a whole `switch`, shared by all cases.
    Switch,
    /// A `with` statement: constructed for tree-shape consistency, but its
    /// body is statically undecidable and never analyzed.
    With,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Program => "program",
            ScopeKind::Function => "function",
            ScopeKind::Block => "block",
            ScopeKind::For => "for",
            ScopeKind::Catch => "catch",
            ScopeKind::Switch => "switch",
            ScopeKind::With => "with",
        }
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of an identifier recorded in a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdType {
    /// Bound by a variable declaration (any of `var`/`let`/`const`).
    Variable,
    /// Bound by a function declaration, or a named function expression's
    /// self-reference.
    Function,
    /// Bound by a class declaration, or a named class expression's
    /// self-reference.
    Class,
    /// Bound as a function or catch-clause parameter.
    Argument,
    /// Bound by an import specifier.
    Import,
    /// A free read: not (yet) resolvable to any binding visible here.
    Unknown,
}

impl IdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdType::Variable => "variable",
            IdType::Function => "function",
            IdType::Class => "class",
            IdType::Argument => "argument",
            IdType::Import => "import",
            IdType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for IdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a name binds, as seen from one scope. See [`Scope::reach`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reach {
    /// Bound in this scope.
    Local,
    /// Bound in an enclosing scope.
    Ancestral,
    /// Bound outside any visible scope (or never recorded here).
    Global,
}

impl Reach {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reach::Local => "local",
            Reach::Ancestral => "ancestral",
            Reach::Global => "global",
        }
    }
}

impl std::fmt::Display for Reach {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One classified identifier occurrence recorded against a scope.
///
/// `local` means the name is bound by this scope itself; it is fixed at
/// record time and never becomes true retroactively. Resolution may replace
/// an `Unknown` kind with the kind found in an ancestor scope, but the entry
/// stays non-local and non-hoisted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifierInScope {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: IdType,
    pub local: bool,
    pub hoisted: bool,
    /// True only for records describing a `static` class member; such
    /// records are rerouted into the class member table, so identifiers in
    /// scope lists always carry `false`.
    #[serde(rename = "static")]
    pub is_static: bool,
}

impl IdentifierInScope {
    /// Build a record; `local` follows from the kind (a classified name is
    /// bound here, an unknown one is not).
    pub fn new(name: impl Into<String>, kind: IdType, hoisted: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            local: kind != IdType::Unknown,
            hoisted,
            is_static: false,
        }
    }

    /// A free read, to be settled by resolution.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::new(name, IdType::Unknown, false)
    }
}

/// A lexical scope: one area of the ownership tree plus its identifiers.
#[derive(Debug)]
pub struct Scope<'ast> {
    /// The AST node that introduced this scope.
    pub node: &'ast Node,
    pub kind: ScopeKind,
    pub parent: Option<AreaId>,
    pub children: Vec<AreaId>,
    /// Identifiers in record order.
    pub identifiers: Vec<IdentifierInScope>,
}

impl<'ast> Scope<'ast> {
    pub(crate) fn new(node: &'ast Node, kind: ScopeKind, parent: Option<AreaId>) -> Self {
        Self {
            node,
            kind,
            parent,
            children: Vec::new(),
            identifiers: Vec::new(),
        }
    }

    /// Record an identifier. An entry identical in every field to one
    /// already present is suppressed, so repeated free reads of one name
    /// collapse into a single record.
    pub(crate) fn push(&mut self, id: IdentifierInScope) {
        if !self.identifiers.contains(&id) {
            self.identifiers.push(id);
        }
    }

    /// First identifier with this name in *this* scope only - no ancestor
    /// search.
    pub fn find(&self, name: &str) -> Option<&IdentifierInScope> {
        self.identifiers.iter().find(|id| id.name == name)
    }

    /// Where `name` binds as seen from this scope. Meaningful after
    /// finalize: an `Unknown` entry at that point is a name bound outside
    /// any visible scope.
    pub fn reach(&self, name: &str) -> Reach {
        match self.find(name) {
            Some(id) if id.local => Reach::Local,
            Some(id) if id.kind != IdType::Unknown => Reach::Ancestral,
            _ => Reach::Global,
        }
    }
}

impl<'ast> ScopeTree<'ast> {
    /// Resolution pass for one scope. Runs parent before children (driven
    /// by [`ScopeTree::finalize`]), so a scope sees its ancestors already
    /// resolved.
    pub(crate) fn resolve_scope(&mut self, id: AreaId) {
        let (parent, local_names) = {
            let Some(scope) = self.areas[id.index()].as_scope() else {
                return;
            };
            let names: FxHashSet<String> = scope
                .identifiers
                .iter()
                .filter(|i| i.local)
                .map(|i| i.name.clone())
                .collect();
            (scope.parent, names)
        };

        // An unknown entry for a locally declared name is a placeholder read
        // recorded before declaration order was known; the local binding
        // supersedes it.
        if let Some(scope) = self.areas[id.index()].as_scope_mut() {
            scope
                .identifiers
                .retain(|i| i.kind != IdType::Unknown || !local_names.contains(&i.name));
        }

        let pending: Vec<(usize, String)> = match self.areas[id.index()].as_scope() {
            Some(scope) => scope
                .identifiers
                .iter()
                .enumerate()
                .filter(|(_, i)| i.kind == IdType::Unknown)
                .map(|(idx, i)| (idx, i.name.clone()))
                .collect(),
            None => return,
        };

        let mut updates: Vec<(usize, IdType)> = Vec::new();
        for (idx, name) in &pending {
            // First try the ancestor scopes; the nearest one that knows the
            // name at all settles the walk, even if it only knows it as
            // another free read.
            let settled = match self.ancestral_kind(parent, name) {
                Some(kind) if kind != IdType::Unknown => {
                    updates.push((*idx, kind));
                    true
                }
                Some(_) => true,
                None => false,
            };
            if settled {
                continue;
            }
            // A named function/class expression's own name is visible only
            // inside its own body and is registered in no scope at all, so
            // the ancestor walk can never find it.
            if let Some(kind) = self.self_reference_kind(id, name) {
                updates.push((*idx, kind));
            }
        }

        if updates.is_empty() {
            return;
        }
        if let Some(scope) = self.areas[id.index()].as_scope_mut() {
            for (idx, kind) in updates {
                scope.identifiers[idx].kind = kind;
            }
        }
    }

    /// Walk ancestor scopes (class definitions are transparent) from `from`
    /// outward; the first scope where the name is recorded supplies its
    /// kind.
    fn ancestral_kind(&self, from: Option<AreaId>, name: &str) -> Option<IdType> {
        let mut cursor = from;
        while let Some(id) = cursor {
            match &self.areas[id.index()] {
                Area::Class(class) => cursor = class.parent,
                Area::Scope(scope) => {
                    if let Some(found) = scope.find(name) {
                        return Some(found.kind);
                    }
                    cursor = scope.parent;
                }
            }
        }
        None
    }

    /// Walk the area chain (scopes and class definitions) from `start`
    /// outward looking for a named function/class expression whose name
    /// matches.
    fn self_reference_kind(&self, start: AreaId, name: &str) -> Option<IdType> {
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            match &self.areas[id.index()] {
                Area::Scope(scope) => {
                    if let Node::FunctionExpression(func) = scope.node
                        && func.id.as_deref().and_then(Node::identifier_name) == Some(name)
                    {
                        // A same-named class member shadows the function
                        // expression's self-reference inside member bodies.
                        let shadowed = scope.parent.is_some_and(|p| {
                            self.areas[p.index()]
                                .as_class()
                                .is_some_and(|class| class.has_member(name))
                        });
                        if !shadowed {
                            return Some(IdType::Function);
                        }
                    }
                    cursor = scope.parent;
                }
                Area::Class(class) => {
                    if let Node::ClassExpression(c) = class.node
                        && c.id.as_deref().and_then(Node::identifier_name) == Some(name)
                    {
                        return Some(IdType::Class);
                    }
                    cursor = class.parent;
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze_script;
    use crate::ast::build::*;
    use crate::ast::{DeclKind, MethodKind};

    fn id(name: &str, kind: IdType, local: bool, hoisted: bool) -> IdentifierInScope {
        IdentifierInScope {
            name: name.to_string(),
            kind,
            local,
            hoisted,
            is_static: false,
        }
    }

    #[test]
    fn test_find_and_reach() {
        // const a = 10; function A(arg) { a }; console.log(a)
        let program = program(vec![
            decl_one(DeclKind::Const, "a", Some(num(10.0))),
            func_decl(Some("A"), vec![ident("arg")], vec![expr_stmt(ident("a"))]),
            expr_stmt(call(member(ident("console"), ident("log"), false), vec![ident("a")])),
        ]);
        let tree = analyze_script(&program).unwrap();
        let top = tree.scope(tree.root()).unwrap();

        assert!(top.find("b").is_none());
        assert!(top.find("a").is_some());

        assert_eq!(top.reach("b"), Reach::Global);
        assert_eq!(top.reach("a"), Reach::Local);
        assert_eq!(top.reach("A"), Reach::Local);
        assert_eq!(top.reach("console"), Reach::Global);

        let fn_scope = tree.scope(top.children[0]).unwrap();
        assert_eq!(fn_scope.reach("arg"), Reach::Local);
        assert_eq!(fn_scope.reach("a"), Reach::Ancestral);
    }

    #[test]
    fn test_resolves_unknowns_from_ancestors() {
        // import a from 'a'; const b = 10; class c {}; function d() {}
        // function fn() { (a, b, c, d) }
        let program = program(vec![
            import_decl(vec![import_default_spec("a")], "a"),
            decl_one(DeclKind::Const, "b", Some(num(10.0))),
            class_decl(Some("c"), None, vec![]),
            func_decl(Some("d"), vec![], vec![]),
            func_decl(
                Some("fn"),
                vec![],
                vec![expr_stmt(Node::SequenceExpression {
                    expressions: vec![ident("a"), ident("b"), ident("c"), ident("d")],
                })],
            ),
        ]);
        let tree = crate::analyzer::analyze_module(&program).unwrap();
        let top = tree.scope(tree.root()).unwrap();
        let fn_scope = tree.scope(top.children[2]).unwrap();
        assert_eq!(
            fn_scope.identifiers,
            vec![
                id("a", IdType::Import, false, false),
                id("b", IdType::Variable, false, false),
                id("c", IdType::Class, false, false),
                id("d", IdType::Function, false, false),
            ]
        );
    }

    #[test]
    fn test_prunes_redundant_unknowns_of_local_names() {
        // const a = 10; a; a;
        let program = program(vec![
            decl_one(DeclKind::Const, "a", Some(num(10.0))),
            expr_stmt(ident("a")),
            expr_stmt(ident("a")),
        ]);
        let tree = analyze_script(&program).unwrap();
        let top = tree.scope(tree.root()).unwrap();
        assert_eq!(top.identifiers, vec![id("a", IdType::Variable, true, false)]);
    }

    #[test]
    fn test_repeated_free_reads_collapse_to_one_record() {
        // console.log(console)
        let program = program(vec![expr_stmt(call(
            member(ident("console"), ident("log"), false),
            vec![ident("console")],
        ))]);
        let tree = analyze_script(&program).unwrap();
        let top = tree.scope(tree.root()).unwrap();
        assert_eq!(top.identifiers, vec![id("console", IdType::Unknown, false, false)]);
    }

    #[test]
    fn test_resolves_function_expression_self_reference() {
        // const a = function A() { A }
        let program = program(vec![decl_one(
            DeclKind::Const,
            "a",
            Some(func_expr(Some("A"), vec![], vec![expr_stmt(ident("A"))])),
        )]);
        let tree = analyze_script(&program).unwrap();
        let top = tree.scope(tree.root()).unwrap();
        let fn_scope = tree.scope(top.children[0]).unwrap();
        assert_eq!(fn_scope.identifiers, vec![id("A", IdType::Function, false, false)]);
    }

    #[test]
    fn test_resolves_class_expression_self_reference() {
        // const a = class A { method1() { A } method2() { method2() } }
        let program = program(vec![decl_one(
            DeclKind::Const,
            "a",
            Some(class_expr(
                Some("A"),
                None,
                vec![
                    method(
                        ident("method1"),
                        MethodKind::Method,
                        false,
                        vec![],
                        vec![expr_stmt(ident("A"))],
                    ),
                    method(
                        ident("method2"),
                        MethodKind::Method,
                        false,
                        vec![],
                        vec![expr_stmt(call(ident("method2"), vec![]))],
                    ),
                ],
            )),
        )]);
        let tree = analyze_script(&program).unwrap();
        let top = tree.scope(tree.root()).unwrap();
        let class_def = tree.class(top.children[0]).unwrap();

        let method1 = tree.scope(class_def.children[0]).unwrap();
        assert_eq!(method1.identifiers, vec![id("A", IdType::Class, false, false)]);

        // A method name is not a lexical binding: the call stays unknown.
        let method2 = tree.scope(class_def.children[1]).unwrap();
        assert_eq!(
            method2.identifiers,
            vec![id("method2", IdType::Unknown, false, false)]
        );
    }

    #[test]
    fn test_member_shadow_suppresses_function_self_reference() {
        // const a = class { m = function m() { m } }
        // The member named `m` shadows the function expression's own name
        // inside the member body, so the read stays unknown.
        let program = program(vec![decl_one(
            DeclKind::Const,
            "a",
            Some(class_expr(
                None,
                None,
                vec![prop_def(
                    ident("m"),
                    Some(func_expr(Some("m"), vec![], vec![expr_stmt(ident("m"))])),
                    false,
                    false,
                )],
            )),
        )]);
        let tree = analyze_script(&program).unwrap();
        let top = tree.scope(tree.root()).unwrap();
        let class_def = tree.class(top.children[0]).unwrap();
        let body = tree.scope(class_def.children[0]).unwrap();
        assert_eq!(body.identifiers, vec![id("m", IdType::Unknown, false, false)]);
    }

    #[test]
    fn test_class_expression_name_resolves_even_when_member_shadows() {
        // const a = class A { A() { A } }
        // Unlike the function-expression rule, the class-expression rule has
        // no member-shadow guard; this pins the (deliberate) asymmetry.
        let program = program(vec![decl_one(
            DeclKind::Const,
            "a",
            Some(class_expr(
                Some("A"),
                None,
                vec![method(
                    ident("A"),
                    MethodKind::Method,
                    false,
                    vec![],
                    vec![expr_stmt(ident("A"))],
                )],
            )),
        )]);
        let tree = analyze_script(&program).unwrap();
        let top = tree.scope(tree.root()).unwrap();
        let class_def = tree.class(top.children[0]).unwrap();
        let body = tree.scope(class_def.children[0]).unwrap();
        assert_eq!(body.identifiers, vec![id("A", IdType::Class, false, false)]);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let program = program(vec![
            decl_one(DeclKind::Const, "a", Some(num(10.0))),
            func_decl(
                Some("fn"),
                vec![ident("x")],
                vec![
                    expr_stmt(ident("a")),
                    expr_stmt(ident("missing")),
                    expr_stmt(decl_one_expr_helper()),
                ],
            ),
        ]);
        let mut tree = analyze_script(&program).unwrap();
        let snapshot: Vec<Vec<IdentifierInScope>> = (0..tree.len())
            .map(|i| {
                tree.scope(AreaId(i as u32))
                    .map(|s| s.identifiers.clone())
                    .unwrap_or_default()
            })
            .collect();
        tree.finalize();
        let after: Vec<Vec<IdentifierInScope>> = (0..tree.len())
            .map(|i| {
                tree.scope(AreaId(i as u32))
                    .map(|s| s.identifiers.clone())
                    .unwrap_or_default()
            })
            .collect();
        assert_eq!(snapshot, after);
    }

    // A self-referencing function expression: the hardest case for a second
    // finalize to disturb.
    fn decl_one_expr_helper() -> Node {
        func_expr(Some("inner"), vec![], vec![expr_stmt(ident("inner"))])
    }

    #[test]
    fn test_shadowing_yields_single_entry() {
        // a; const a = 1; a;  - one record for `a` after finalize.
        let program = program(vec![
            expr_stmt(ident("a")),
            decl_one(DeclKind::Const, "a", Some(num(1.0))),
            expr_stmt(ident("a")),
        ]);
        let tree = analyze_script(&program).unwrap();
        let top = tree.scope(tree.root()).unwrap();
        let entries: Vec<_> = top.identifiers.iter().filter(|i| i.name == "a").collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].local);
        assert_eq!(entries[0].kind, IdType::Variable);
    }

    #[test]
    fn test_local_implies_classified() {
        let program = program(vec![
            decl_one(DeclKind::Var, "a", None),
            func_decl(Some("f"), vec![ident("p")], vec![expr_stmt(ident("free"))]),
        ]);
        let tree = analyze_script(&program).unwrap();
        for i in 0..tree.len() {
            if let Some(scope) = tree.scope(AreaId(i as u32)) {
                for ident in &scope.identifiers {
                    if ident.local {
                        assert_ne!(ident.kind, IdType::Unknown);
                    }
                }
            }
        }
    }
}
