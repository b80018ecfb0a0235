//! The scope analyzer
//!
//! One depth-first walk over the AST builds the whole area tree: scopes
//! open and close as the walk enters and leaves the constructs that
//! introduce them, identifiers are classified at their binding or use
//! sites, and everything the walk cannot yet know is recorded as
//! [`IdType::Unknown`] for the resolution pass to settle.
//!
//! All state lives in the per-invocation [`Analyzer`]; independent
//! analyses never share anything and may run on different threads.

use crate::area::{AreaId, ScopeTree};
use crate::ast::{Class, DeclKind, Function, Node, SourceType};
use crate::class_def::ClassMember;
use crate::scope::{IdType, IdentifierInScope, ScopeKind};
use crate::{Error, Result};

/// Analyze a tree parsed in script mode. Import/export syntax is illegal
/// here and aborts the analysis.
pub fn analyze_script(root: &Node) -> Result<ScopeTree<'_>> {
    analyze(root, SourceType::Script)
}

/// Analyze a tree parsed in module mode: import/export syntax is legal and
/// classifiable.
pub fn analyze_module(root: &Node) -> Result<ScopeTree<'_>> {
    analyze(root, SourceType::Module)
}

fn analyze(root: &Node, mode: SourceType) -> Result<ScopeTree<'_>> {
    tracing::debug!(root = root.kind_name(), mode = mode.as_str(), "analyzing syntax tree");
    let tree = match root {
        Node::Program { .. } => ScopeTree::with_root_scope(root, ScopeKind::Program),
        Node::FunctionDeclaration(_)
        | Node::FunctionExpression(_)
        | Node::ArrowFunctionExpression(_) => ScopeTree::with_root_scope(root, ScopeKind::Function),
        Node::BlockStatement { .. } => ScopeTree::with_root_scope(root, ScopeKind::Block),
        Node::ForStatement { .. } | Node::ForInStatement { .. } | Node::ForOfStatement { .. } => {
            ScopeTree::with_root_scope(root, ScopeKind::For)
        }
        Node::CatchClause { .. } => ScopeTree::with_root_scope(root, ScopeKind::Catch),
        Node::SwitchStatement { .. } => ScopeTree::with_root_scope(root, ScopeKind::Switch),
        Node::WithStatement { .. } => ScopeTree::with_root_scope(root, ScopeKind::With),
        Node::ClassDeclaration(_) | Node::ClassExpression(_) => ScopeTree::with_root_class(root),
        other => return Err(Error::InvalidRoot(other.kind_name())),
    };

    let current = tree.root();
    let mut analyzer = Analyzer { tree, mode, current };
    analyzer.visit_root(root)?;

    let mut tree = analyzer.tree;
    tree.finalize();
    Ok(tree)
}

/// How an identifier in binding position is classified.
#[derive(Debug, Clone, Copy)]
enum Binding {
    Variable { hoisted: bool },
    Argument,
}

/// Per-invocation traversal state: the tree under construction and the
/// cursor of the area the walk is currently inside.
struct Analyzer<'ast> {
    tree: ScopeTree<'ast>,
    mode: SourceType,
    current: AreaId,
}

impl<'ast> Analyzer<'ast> {
    /// Visit the interior of the root node. The root area already wraps it,
    /// so the construct is not opened a second time; a name that would bind
    /// outward (root function/class declarations) has no scope to land in.
    fn visit_root(&mut self, root: &'ast Node) -> Result<()> {
        match root {
            Node::Program { body, .. } | Node::BlockStatement { body } => {
                self.visit_statements(body)
            }
            Node::FunctionDeclaration(func)
            | Node::FunctionExpression(func)
            | Node::ArrowFunctionExpression(func) => self.visit_function_interior(func),
            Node::ForStatement { init, test, update, body } => {
                self.visit_for_interior(init.as_deref(), test.as_deref(), update.as_deref(), body)
            }
            Node::ForInStatement { left, right, body }
            | Node::ForOfStatement { left, right, body } => {
                self.visit_for_each_interior(left, right, body)
            }
            Node::CatchClause { param, body } => {
                self.visit_catch_interior(param.as_deref(), body)
            }
            Node::SwitchStatement { discriminant, cases } => {
                // With no enclosing scope, the discriminant is classified
                // into the switch scope itself.
                self.visit_expression(discriminant)?;
                self.visit_switch_cases(cases)
            }
            // The with body is never analyzed; as a root there is no
            // enclosing scope for the object reference either.
            Node::WithStatement { .. } => Ok(()),
            Node::ClassDeclaration(class) | Node::ClassExpression(class) => {
                self.visit_class_members(class)
            }
            other => Err(Error::InvalidRoot(other.kind_name())),
        }
    }

    fn visit_statements(&mut self, body: &'ast [Node]) -> Result<()> {
        for stmt in body {
            self.visit_statement(stmt)?;
        }
        Ok(())
    }

    fn visit_statement(&mut self, node: &'ast Node) -> Result<()> {
        match node {
            Node::VariableDeclaration { kind, declarations } => {
                self.visit_variable_declaration(*kind, declarations)
            }
            Node::FunctionDeclaration(func) => self.visit_function_declaration(node, func),
            Node::ClassDeclaration(class) => {
                if let Some(name) = class.id.as_deref().and_then(Node::identifier_name) {
                    self.push_identifier(IdentifierInScope::new(name, IdType::Class, false));
                }
                self.visit_class(node, class)
            }
            Node::ExpressionStatement { expression } => self.visit_expression(expression),
            // A block in statement position opens its own scope; blocks that
            // share an enclosing construct's scope (function/for/catch
            // bodies) are visited inline by their construct's visitor.
            Node::BlockStatement { body } => {
                let prev = self.current;
                self.open_scope(node, ScopeKind::Block);
                self.visit_statements(body)?;
                self.current = prev;
                Ok(())
            }
            Node::EmptyStatement | Node::DebuggerStatement => Ok(()),
            Node::ReturnStatement { argument } => self.visit_expression_opt(argument.as_deref()),
            Node::ThrowStatement { argument } => self.visit_expression(argument),
            Node::IfStatement { test, consequent, alternate } => {
                self.visit_expression(test)?;
                self.visit_statement(consequent)?;
                if let Some(alternate) = alternate {
                    self.visit_statement(alternate)?;
                }
                Ok(())
            }
            Node::WhileStatement { test, body } => {
                self.visit_expression(test)?;
                self.visit_statement(body)
            }
            Node::DoWhileStatement { body, test } => {
                self.visit_statement(body)?;
                self.visit_expression(test)
            }
            Node::ForStatement { init, test, update, body } => {
                let prev = self.current;
                self.open_scope(node, ScopeKind::For);
                self.visit_for_interior(init.as_deref(), test.as_deref(), update.as_deref(), body)?;
                self.current = prev;
                Ok(())
            }
            Node::ForInStatement { left, right, body }
            | Node::ForOfStatement { left, right, body } => {
                let prev = self.current;
                self.open_scope(node, ScopeKind::For);
                self.visit_for_each_interior(left, right, body)?;
                self.current = prev;
                Ok(())
            }
            Node::TryStatement { block, handler, finalizer } => {
                self.visit_statement(block)?;
                if let Some(handler) = handler {
                    self.visit_catch(handler)?;
                }
                match finalizer {
                    Some(finalizer) => self.visit_statement(finalizer),
                    None => Ok(()),
                }
            }
            Node::SwitchStatement { discriminant, cases } => {
                // The discriminant is evaluated in the enclosing scope; one
                // scope then wraps the whole switch, shared by all cases.
                self.visit_expression(discriminant)?;
                let prev = self.current;
                self.open_scope(node, ScopeKind::Switch);
                self.visit_switch_cases(cases)?;
                self.current = prev;
                Ok(())
            }
            Node::WithStatement { object, .. } => {
                // The object is an ordinary reference. The body is bound by
                // runtime object shape, not syntax: a scope is constructed
                // for tree-shape consistency and left empty.
                self.visit_expression(object)?;
                tracing::debug!("leaving with body unanalyzed");
                self.tree.push_scope(self.current, node, ScopeKind::With);
                Ok(())
            }
            Node::LabeledStatement { body, .. } => self.visit_inline(body),
            Node::BreakStatement { .. } | Node::ContinueStatement { .. } => Ok(()),

            Node::ImportDeclaration { specifiers, .. } => {
                self.require_module("import declaration")?;
                for spec in specifiers {
                    let local = match spec {
                        Node::ImportSpecifier { local }
                        | Node::ImportDefaultSpecifier { local }
                        | Node::ImportNamespaceSpecifier { local } => local,
                        other => {
                            return Err(Error::MalformedAst(format!(
                                "{} in import specifier position",
                                other.kind_name()
                            )));
                        }
                    };
                    let name = Self::expect_identifier(local)?;
                    self.push_identifier(IdentifierInScope::new(name, IdType::Import, false));
                }
                Ok(())
            }
            Node::ExportNamedDeclaration { declaration, .. } => {
                self.require_module("export declaration")?;
                // Exported/source names are never locally bound; only an
                // inline declaration is analyzed.
                match declaration {
                    Some(declaration) => self.visit_statement(declaration),
                    None => Ok(()),
                }
            }
            Node::ExportDefaultDeclaration { declaration } => {
                self.require_module("export declaration")?;
                match &**declaration {
                    Node::FunctionDeclaration(func) => {
                        self.visit_function_declaration(declaration, func)
                    }
                    Node::ClassDeclaration(class) => {
                        if let Some(name) = class.id.as_deref().and_then(Node::identifier_name) {
                            self.push_identifier(IdentifierInScope::new(name, IdType::Class, false));
                        }
                        self.visit_class(declaration, class)
                    }
                    expression => self.visit_expression(expression),
                }
            }
            Node::ExportAllDeclaration => self.require_module("export declaration"),

            other => Err(Error::MalformedAst(format!(
                "{} in statement position",
                other.kind_name()
            ))),
        }
    }

    /// Visit a statement that shares the current scope even when it is a
    /// block (function/for/catch bodies, labeled statement bodies).
    fn visit_inline(&mut self, node: &'ast Node) -> Result<()> {
        match node {
            Node::BlockStatement { body } => self.visit_statements(body),
            other => self.visit_statement(other),
        }
    }

    fn visit_variable_declaration(
        &mut self,
        kind: DeclKind,
        declarations: &'ast [Node],
    ) -> Result<()> {
        for declaration in declarations {
            match declaration {
                Node::VariableDeclarator { id, init } => {
                    self.visit_pattern(id, Binding::Variable { hoisted: kind == DeclKind::Var })?;
                    self.visit_expression_opt(init.as_deref())?;
                }
                other => {
                    return Err(Error::MalformedAst(format!(
                        "{} in declarator position",
                        other.kind_name()
                    )));
                }
            }
        }
        Ok(())
    }

    /// A function declaration binds its name outward: the name is attached
    /// to the enclosing scope first, and only then does the parameter/body
    /// scope open.
    fn visit_function_declaration(&mut self, node: &'ast Node, func: &'ast Function) -> Result<()> {
        if let Some(name) = func.id.as_deref().and_then(Node::identifier_name) {
            self.push_identifier(IdentifierInScope::new(name, IdType::Function, true));
        }
        let prev = self.current;
        self.open_scope(node, ScopeKind::Function);
        self.visit_function_interior(func)?;
        self.current = prev;
        Ok(())
    }

    /// Parameters and body, inside an already-open function scope. The body
    /// block shares the function scope; an expression body (arrow) is
    /// visited as an expression.
    fn visit_function_interior(&mut self, func: &'ast Function) -> Result<()> {
        for param in &func.params {
            self.visit_pattern(param, Binding::Argument)?;
        }
        self.visit_inline_or_expression(&func.body)
    }

    fn visit_inline_or_expression(&mut self, body: &'ast Node) -> Result<()> {
        match body {
            Node::BlockStatement { body } => self.visit_statements(body),
            expression => self.visit_expression(expression),
        }
    }

    fn visit_for_interior(
        &mut self,
        init: Option<&'ast Node>,
        test: Option<&'ast Node>,
        update: Option<&'ast Node>,
        body: &'ast Node,
    ) -> Result<()> {
        match init {
            Some(Node::VariableDeclaration { kind, declarations }) => {
                self.visit_variable_declaration(*kind, declarations)?;
            }
            Some(expression) => self.visit_expression(expression)?,
            None => {}
        }
        self.visit_expression_opt(test)?;
        self.visit_expression_opt(update)?;
        self.visit_inline(body)
    }

    fn visit_for_each_interior(
        &mut self,
        left: &'ast Node,
        right: &'ast Node,
        body: &'ast Node,
    ) -> Result<()> {
        match left {
            Node::VariableDeclaration { kind, declarations } => {
                self.visit_variable_declaration(*kind, declarations)?;
            }
            // `for (x of y)` assigns to an existing binding.
            target => self.visit_expression(target)?,
        }
        self.visit_expression(right)?;
        self.visit_inline(body)
    }

    fn visit_catch(&mut self, node: &'ast Node) -> Result<()> {
        match node {
            Node::CatchClause { param, body } => {
                let prev = self.current;
                self.open_scope(node, ScopeKind::Catch);
                self.visit_catch_interior(param.as_deref(), body)?;
                self.current = prev;
                Ok(())
            }
            other => Err(Error::MalformedAst(format!(
                "{} in catch handler position",
                other.kind_name()
            ))),
        }
    }

    fn visit_catch_interior(&mut self, param: Option<&'ast Node>, body: &'ast Node) -> Result<()> {
        if let Some(param) = param {
            self.visit_pattern(param, Binding::Argument)?;
        }
        self.visit_inline(body)
    }

    fn visit_switch_cases(&mut self, cases: &'ast [Node]) -> Result<()> {
        for case in cases {
            match case {
                Node::SwitchCase { test, consequent } => {
                    self.visit_expression_opt(test.as_deref())?;
                    self.visit_statements(consequent)?;
                }
                other => {
                    return Err(Error::MalformedAst(format!(
                        "{} in switch case position",
                        other.kind_name()
                    )));
                }
            }
        }
        Ok(())
    }

    /// A class declaration or expression. The caller has already bound a
    /// declaration's name; an expression's own name is visible only inside
    /// the class and is handled by the resolution pass.
    fn visit_class(&mut self, node: &'ast Node, class: &'ast Class) -> Result<()> {
        if let Some(super_class) = &class.super_class {
            self.visit_expression(super_class)?;
        }
        let prev = self.current;
        self.current = self.tree.push_class(self.current, node);
        self.visit_class_members(class)?;
        self.current = prev;
        Ok(())
    }

    fn visit_class_members(&mut self, class: &'ast Class) -> Result<()> {
        let members = match &*class.body {
            Node::ClassBody { body } => body,
            other => {
                return Err(Error::MalformedAst(format!(
                    "{} in class body position",
                    other.kind_name()
                )));
            }
        };
        for member in members {
            match member {
                Node::MethodDefinition { key, value, kind, computed, is_static } => {
                    // A computed key is never a scope reference and records
                    // no member.
                    if !computed && let Some(name) = Self::member_key_name(key) {
                        self.push_member(ClassMember::new(name, (*kind).into(), *is_static));
                    }
                    self.visit_member_function(value)?;
                }
                Node::PropertyDefinition { key, value, computed, is_static } => {
                    if !computed && let Some(name) = Self::member_key_name(key) {
                        self.push_member(ClassMember::new(
                            name,
                            crate::class_def::MemberKind::Property,
                            *is_static,
                        ));
                    }
                    // The initializer is evaluated against the instance, not
                    // a lexical scope; only function-valued initializers
                    // open scopes (as children of the class definition).
                    self.visit_expression_opt(value.as_deref())?;
                }
                other => {
                    return Err(Error::MalformedAst(format!(
                        "{} in class member position",
                        other.kind_name()
                    )));
                }
            }
        }
        Ok(())
    }

    /// A method/accessor/constructor value: its body scope is a direct
    /// child of the class definition.
    fn visit_member_function(&mut self, value: &'ast Node) -> Result<()> {
        match value {
            Node::FunctionExpression(func) => {
                let prev = self.current;
                self.open_scope(value, ScopeKind::Function);
                self.visit_function_interior(func)?;
                self.current = prev;
                Ok(())
            }
            other => Err(Error::MalformedAst(format!(
                "{} in class member value position",
                other.kind_name()
            ))),
        }
    }

    fn member_key_name(key: &Node) -> Option<String> {
        match key {
            Node::Identifier { name } => Some(name.clone()),
            Node::Literal { value } => value.as_str().map(str::to_string),
            // Private names are not reachable through lexical scope.
            _ => None,
        }
    }

    fn visit_expression_opt(&mut self, node: Option<&'ast Node>) -> Result<()> {
        match node {
            Some(node) => self.visit_expression(node),
            None => Ok(()),
        }
    }

    fn visit_expression(&mut self, node: &'ast Node) -> Result<()> {
        match node {
            Node::Identifier { name } => {
                self.push_identifier(IdentifierInScope::unknown(name));
                Ok(())
            }
            Node::Literal { .. }
            | Node::ThisExpression
            | Node::Super
            | Node::MetaProperty
            | Node::PrivateIdentifier { .. } => Ok(()),
            Node::TemplateLiteral { expressions } => {
                // Only the interpolations; the quasis are text.
                for expression in expressions {
                    self.visit_expression(expression)?;
                }
                Ok(())
            }
            Node::TaggedTemplateExpression { tag, quasi } => {
                self.visit_expression(tag)?;
                self.visit_expression(quasi)
            }
            Node::MemberExpression { object, property, computed } => {
                self.visit_expression(object)?;
                if *computed {
                    self.visit_expression(property)?;
                }
                Ok(())
            }
            Node::CallExpression { callee, arguments }
            | Node::NewExpression { callee, arguments } => {
                self.visit_expression(callee)?;
                for argument in arguments {
                    self.visit_expression(argument)?;
                }
                Ok(())
            }
            Node::ChainExpression { expression } => self.visit_expression(expression),
            Node::ObjectExpression { properties } => {
                for property in properties {
                    match property {
                        Node::Property { key, value, computed } => {
                            if *computed {
                                self.visit_expression(key)?;
                            }
                            self.visit_expression(value)?;
                        }
                        Node::SpreadElement { argument } => self.visit_expression(argument)?,
                        other => {
                            return Err(Error::MalformedAst(format!(
                                "{} in object literal position",
                                other.kind_name()
                            )));
                        }
                    }
                }
                Ok(())
            }
            Node::ArrayExpression { elements } => {
                for element in elements.iter().flatten() {
                    self.visit_expression(element)?;
                }
                Ok(())
            }
            // A function expression's own name is skipped here: it is
            // visible only inside the body and never registered in any
            // enclosing scope (resolution recovers it as a self-reference).
            Node::FunctionExpression(func) | Node::ArrowFunctionExpression(func) => {
                let prev = self.current;
                self.open_scope(node, ScopeKind::Function);
                self.visit_function_interior(func)?;
                self.current = prev;
                Ok(())
            }
            Node::ClassExpression(class) => self.visit_class(node, class),
            Node::AssignmentExpression { left, right }
            | Node::BinaryExpression { left, right }
            | Node::LogicalExpression { left, right } => {
                self.visit_expression(left)?;
                self.visit_expression(right)
            }
            Node::ConditionalExpression { test, consequent, alternate } => {
                self.visit_expression(test)?;
                self.visit_expression(consequent)?;
                self.visit_expression(alternate)
            }
            Node::SequenceExpression { expressions } => {
                for expression in expressions {
                    self.visit_expression(expression)?;
                }
                Ok(())
            }
            Node::UnaryExpression { argument }
            | Node::UpdateExpression { argument }
            | Node::SpreadElement { argument }
            | Node::AwaitExpression { argument }
            | Node::RestElement { argument } => self.visit_expression(argument),
            Node::YieldExpression { argument } => self.visit_expression_opt(argument.as_deref()),
            // Destructuring assignment targets: every leaf is a reference
            // to an existing binding, not a new one.
            Node::ObjectPattern { properties } => {
                for property in properties {
                    match property {
                        Node::Property { key, value, computed } => {
                            if *computed {
                                self.visit_expression(key)?;
                            }
                            self.visit_expression(value)?;
                        }
                        Node::RestElement { argument } => self.visit_expression(argument)?,
                        other => {
                            return Err(Error::MalformedAst(format!(
                                "{} in object pattern position",
                                other.kind_name()
                            )));
                        }
                    }
                }
                Ok(())
            }
            Node::ArrayPattern { elements } => {
                for element in elements.iter().flatten() {
                    self.visit_expression(element)?;
                }
                Ok(())
            }
            Node::AssignmentPattern { left, right } => {
                self.visit_expression(left)?;
                self.visit_expression(right)
            }
            other => Err(Error::MalformedAst(format!(
                "{} in expression position",
                other.kind_name()
            ))),
        }
    }

    /// A subtree in binding position: identifiers bind into the current
    /// scope with the given classification; default values and computed
    /// keys are ordinary reads.
    fn visit_pattern(&mut self, node: &'ast Node, binding: Binding) -> Result<()> {
        match node {
            Node::Identifier { name } => {
                let (kind, hoisted) = match binding {
                    Binding::Variable { hoisted } => (IdType::Variable, hoisted),
                    Binding::Argument => (IdType::Argument, false),
                };
                self.push_identifier(IdentifierInScope::new(name, kind, hoisted));
                Ok(())
            }
            Node::ObjectPattern { properties } => {
                for property in properties {
                    match property {
                        Node::Property { key, value, computed } => {
                            if *computed {
                                self.visit_expression(key)?;
                            }
                            self.visit_pattern(value, binding)?;
                        }
                        Node::RestElement { argument } => self.visit_pattern(argument, binding)?,
                        other => {
                            return Err(Error::MalformedAst(format!(
                                "{} in object pattern position",
                                other.kind_name()
                            )));
                        }
                    }
                }
                Ok(())
            }
            Node::ArrayPattern { elements } => {
                for element in elements.iter().flatten() {
                    self.visit_pattern(element, binding)?;
                }
                Ok(())
            }
            Node::RestElement { argument } => self.visit_pattern(argument, binding),
            Node::AssignmentPattern { left, right } => {
                self.visit_pattern(left, binding)?;
                self.visit_expression(right)
            }
            other => Err(Error::MalformedAst(format!(
                "{} in binding position",
                other.kind_name()
            ))),
        }
    }

    fn open_scope(&mut self, node: &'ast Node, kind: ScopeKind) -> AreaId {
        let id = self.tree.push_scope(self.current, node, kind);
        self.current = id;
        id
    }

    fn push_identifier(&mut self, ident: IdentifierInScope) {
        self.tree.push_identifier(self.current, ident);
    }

    fn push_member(&mut self, member: ClassMember) {
        self.tree.push_member(self.current, member);
    }

    fn require_module(&self, construct: &'static str) -> Result<()> {
        if self.mode == SourceType::Module {
            Ok(())
        } else {
            Err(Error::ModuleSyntaxInScript(construct))
        }
    }

    fn expect_identifier(node: &Node) -> Result<&str> {
        node.identifier_name().ok_or_else(|| {
            Error::MalformedAst(format!("{} where an identifier is required", node.kind_name()))
        })
    }
}
