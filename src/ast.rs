//! ESTree-shaped JavaScript AST
//!
//! The analyzer consumes trees produced by an external parser (acorn,
//! esprima, or anything else that emits the standard ESTree JSON shape).
//! `Node` is a tagged union over the node kinds the analyzer consults;
//! the `"type"` field of the JSON object selects the variant, so parser
//! output deserializes directly via [`from_json_str`] / [`from_json_value`].
//!
//! Positional fields (`start`, `end`, `loc`, `range`) and other extras are
//! ignored. A node kind outside this set fails deserialization, which is a
//! precondition violation: the tree is either unsupported or malformed, and
//! no partial analysis is attempted.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A JavaScript AST node.
///
/// Variants mirror the ESTree node types consulted during scope analysis.
/// Kinds the analyzer only passes through (arithmetic, calls, conditionals,
/// …) carry just the child slots needed to continue the walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    // ---- program & statements ----
    Program {
        #[serde(default)]
        body: Vec<Node>,
        #[serde(rename = "sourceType", default)]
        source_type: Option<SourceType>,
    },
    ExpressionStatement {
        expression: Box<Node>,
    },
    BlockStatement {
        #[serde(default)]
        body: Vec<Node>,
    },
    EmptyStatement,
    DebuggerStatement,
    ReturnStatement {
        #[serde(default)]
        argument: Option<Box<Node>>,
    },
    ThrowStatement {
        argument: Box<Node>,
    },
    IfStatement {
        test: Box<Node>,
        consequent: Box<Node>,
        #[serde(default)]
        alternate: Option<Box<Node>>,
    },
    SwitchStatement {
        discriminant: Box<Node>,
        #[serde(default)]
        cases: Vec<Node>,
    },
    SwitchCase {
        #[serde(default)]
        test: Option<Box<Node>>,
        #[serde(default)]
        consequent: Vec<Node>,
    },
    WhileStatement {
        test: Box<Node>,
        body: Box<Node>,
    },
    DoWhileStatement {
        body: Box<Node>,
        test: Box<Node>,
    },
    ForStatement {
        #[serde(default)]
        init: Option<Box<Node>>,
        #[serde(default)]
        test: Option<Box<Node>>,
        #[serde(default)]
        update: Option<Box<Node>>,
        body: Box<Node>,
    },
    ForInStatement {
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
    },
    ForOfStatement {
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
    },
    TryStatement {
        block: Box<Node>,
        #[serde(default)]
        handler: Option<Box<Node>>,
        #[serde(default)]
        finalizer: Option<Box<Node>>,
    },
    CatchClause {
        #[serde(default)]
        param: Option<Box<Node>>,
        body: Box<Node>,
    },
    WithStatement {
        object: Box<Node>,
        body: Box<Node>,
    },
    LabeledStatement {
        label: Box<Node>,
        body: Box<Node>,
    },
    BreakStatement {
        #[serde(default)]
        label: Option<Box<Node>>,
    },
    ContinueStatement {
        #[serde(default)]
        label: Option<Box<Node>>,
    },

    // ---- declarations ----
    VariableDeclaration {
        kind: DeclKind,
        #[serde(default)]
        declarations: Vec<Node>,
    },
    VariableDeclarator {
        id: Box<Node>,
        #[serde(default)]
        init: Option<Box<Node>>,
    },
    FunctionDeclaration(Function),
    ClassDeclaration(Class),

    // ---- module syntax ----
    ImportDeclaration {
        #[serde(default)]
        specifiers: Vec<Node>,
        source: Box<Node>,
    },
    ImportSpecifier {
        local: Box<Node>,
    },
    ImportDefaultSpecifier {
        local: Box<Node>,
    },
    ImportNamespaceSpecifier {
        local: Box<Node>,
    },
    ExportNamedDeclaration {
        #[serde(default)]
        declaration: Option<Box<Node>>,
        #[serde(default)]
        specifiers: Vec<Node>,
        #[serde(default)]
        source: Option<Box<Node>>,
    },
    /// Exported/source names are never locally bound; the walker does not
    /// descend into specifiers, so no child slots are modelled.
    ExportSpecifier,
    ExportDefaultDeclaration {
        declaration: Box<Node>,
    },
    ExportAllDeclaration,

    // ---- expressions ----
    Identifier {
        name: String,
    },
    PrivateIdentifier {
        name: String,
    },
    Literal {
        #[serde(default)]
        value: serde_json::Value,
    },
    ThisExpression,
    Super,
    MetaProperty,
    ArrayExpression {
        #[serde(default)]
        elements: Vec<Option<Node>>,
    },
    ObjectExpression {
        #[serde(default)]
        properties: Vec<Node>,
    },
    Property {
        key: Box<Node>,
        value: Box<Node>,
        #[serde(default)]
        computed: bool,
    },
    FunctionExpression(Function),
    ArrowFunctionExpression(Function),
    ClassExpression(Class),
    ClassBody {
        #[serde(default)]
        body: Vec<Node>,
    },
    MethodDefinition {
        key: Box<Node>,
        value: Box<Node>,
        kind: MethodKind,
        #[serde(default)]
        computed: bool,
        #[serde(rename = "static", default)]
        is_static: bool,
    },
    PropertyDefinition {
        key: Box<Node>,
        #[serde(default)]
        value: Option<Box<Node>>,
        #[serde(default)]
        computed: bool,
        #[serde(rename = "static", default)]
        is_static: bool,
    },
    TemplateLiteral {
        #[serde(default)]
        expressions: Vec<Node>,
    },
    TaggedTemplateExpression {
        tag: Box<Node>,
        quasi: Box<Node>,
    },
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        #[serde(default)]
        computed: bool,
    },
    CallExpression {
        callee: Box<Node>,
        #[serde(default)]
        arguments: Vec<Node>,
    },
    NewExpression {
        callee: Box<Node>,
        #[serde(default)]
        arguments: Vec<Node>,
    },
    ChainExpression {
        expression: Box<Node>,
    },
    UnaryExpression {
        argument: Box<Node>,
    },
    UpdateExpression {
        argument: Box<Node>,
    },
    BinaryExpression {
        left: Box<Node>,
        right: Box<Node>,
    },
    LogicalExpression {
        left: Box<Node>,
        right: Box<Node>,
    },
    AssignmentExpression {
        left: Box<Node>,
        right: Box<Node>,
    },
    ConditionalExpression {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    SequenceExpression {
        #[serde(default)]
        expressions: Vec<Node>,
    },
    SpreadElement {
        argument: Box<Node>,
    },
    AwaitExpression {
        argument: Box<Node>,
    },
    YieldExpression {
        #[serde(default)]
        argument: Option<Box<Node>>,
    },

    // ---- binding patterns ----
    ObjectPattern {
        #[serde(default)]
        properties: Vec<Node>,
    },
    ArrayPattern {
        #[serde(default)]
        elements: Vec<Option<Node>>,
    },
    RestElement {
        argument: Box<Node>,
    },
    AssignmentPattern {
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// Shared payload of function declarations, function expressions and arrow
/// function expressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    #[serde(default)]
    pub id: Option<Box<Node>>,
    #[serde(default)]
    pub params: Vec<Node>,
    pub body: Box<Node>,
    /// True for an arrow function whose body is a bare expression.
    #[serde(default)]
    pub expression: bool,
}

/// Shared payload of class declarations and class expressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Class {
    #[serde(default)]
    pub id: Option<Box<Node>>,
    #[serde(rename = "superClass", default)]
    pub super_class: Option<Box<Node>>,
    pub body: Box<Node>,
}

/// Parse goal recorded on a `Program` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Script,
    Module,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Script => "script",
            SourceType::Module => "module",
        }
    }
}

/// `var` / `let` / `const` of a variable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

/// The `kind` field of a `MethodDefinition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodKind {
    Constructor,
    Method,
    Get,
    Set,
}

impl Node {
    /// The ESTree `type` string of this node.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Program { .. } => "Program",
            Node::ExpressionStatement { .. } => "ExpressionStatement",
            Node::BlockStatement { .. } => "BlockStatement",
            Node::EmptyStatement => "EmptyStatement",
            Node::DebuggerStatement => "DebuggerStatement",
            Node::ReturnStatement { .. } => "ReturnStatement",
            Node::ThrowStatement { .. } => "ThrowStatement",
            Node::IfStatement { .. } => "IfStatement",
            Node::SwitchStatement { .. } => "SwitchStatement",
            Node::SwitchCase { .. } => "SwitchCase",
            Node::WhileStatement { .. } => "WhileStatement",
            Node::DoWhileStatement { .. } => "DoWhileStatement",
            Node::ForStatement { .. } => "ForStatement",
            Node::ForInStatement { .. } => "ForInStatement",
            Node::ForOfStatement { .. } => "ForOfStatement",
            Node::TryStatement { .. } => "TryStatement",
            Node::CatchClause { .. } => "CatchClause",
            Node::WithStatement { .. } => "WithStatement",
            Node::LabeledStatement { .. } => "LabeledStatement",
            Node::BreakStatement { .. } => "BreakStatement",
            Node::ContinueStatement { .. } => "ContinueStatement",
            Node::VariableDeclaration { .. } => "VariableDeclaration",
            Node::VariableDeclarator { .. } => "VariableDeclarator",
            Node::FunctionDeclaration(_) => "FunctionDeclaration",
            Node::ClassDeclaration(_) => "ClassDeclaration",
            Node::ImportDeclaration { .. } => "ImportDeclaration",
            Node::ImportSpecifier { .. } => "ImportSpecifier",
            Node::ImportDefaultSpecifier { .. } => "ImportDefaultSpecifier",
            Node::ImportNamespaceSpecifier { .. } => "ImportNamespaceSpecifier",
            Node::ExportNamedDeclaration { .. } => "ExportNamedDeclaration",
            Node::ExportSpecifier => "ExportSpecifier",
            Node::ExportDefaultDeclaration { .. } => "ExportDefaultDeclaration",
            Node::ExportAllDeclaration => "ExportAllDeclaration",
            Node::Identifier { .. } => "Identifier",
            Node::PrivateIdentifier { .. } => "PrivateIdentifier",
            Node::Literal { .. } => "Literal",
            Node::ThisExpression => "ThisExpression",
            Node::Super => "Super",
            Node::MetaProperty => "MetaProperty",
            Node::ArrayExpression { .. } => "ArrayExpression",
            Node::ObjectExpression { .. } => "ObjectExpression",
            Node::Property { .. } => "Property",
            Node::FunctionExpression(_) => "FunctionExpression",
            Node::ArrowFunctionExpression(_) => "ArrowFunctionExpression",
            Node::ClassExpression(_) => "ClassExpression",
            Node::ClassBody { .. } => "ClassBody",
            Node::MethodDefinition { .. } => "MethodDefinition",
            Node::PropertyDefinition { .. } => "PropertyDefinition",
            Node::TemplateLiteral { .. } => "TemplateLiteral",
            Node::TaggedTemplateExpression { .. } => "TaggedTemplateExpression",
            Node::MemberExpression { .. } => "MemberExpression",
            Node::CallExpression { .. } => "CallExpression",
            Node::NewExpression { .. } => "NewExpression",
            Node::ChainExpression { .. } => "ChainExpression",
            Node::UnaryExpression { .. } => "UnaryExpression",
            Node::UpdateExpression { .. } => "UpdateExpression",
            Node::BinaryExpression { .. } => "BinaryExpression",
            Node::LogicalExpression { .. } => "LogicalExpression",
            Node::AssignmentExpression { .. } => "AssignmentExpression",
            Node::ConditionalExpression { .. } => "ConditionalExpression",
            Node::SequenceExpression { .. } => "SequenceExpression",
            Node::SpreadElement { .. } => "SpreadElement",
            Node::AwaitExpression { .. } => "AwaitExpression",
            Node::YieldExpression { .. } => "YieldExpression",
            Node::ObjectPattern { .. } => "ObjectPattern",
            Node::ArrayPattern { .. } => "ArrayPattern",
            Node::RestElement { .. } => "RestElement",
            Node::AssignmentPattern { .. } => "AssignmentPattern",
        }
    }

    /// The `name` of an `Identifier` node, if this is one.
    pub fn identifier_name(&self) -> Option<&str> {
        match self {
            Node::Identifier { name } => Some(name.as_str()),
            _ => None,
        }
    }
}

/// Deserialize an ESTree JSON document into a [`Node`].
pub fn from_json_str(json: &str) -> Result<Node> {
    serde_json::from_str(json).map_err(Error::Json)
}

/// Deserialize an already-parsed ESTree JSON value into a [`Node`].
pub fn from_json_value(value: serde_json::Value) -> Result<Node> {
    serde_json::from_value(value).map_err(Error::Json)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_acorn_program() {
        // acorn -e 'const a = 10' --ecma2021 (positions elided)
        let json = r#"{
            "type": "Program",
            "start": 0,
            "end": 12,
            "sourceType": "script",
            "body": [
                {
                    "type": "VariableDeclaration",
                    "kind": "const",
                    "declarations": [
                        {
                            "type": "VariableDeclarator",
                            "id": { "type": "Identifier", "name": "a" },
                            "init": { "type": "Literal", "value": 10, "raw": "10" }
                        }
                    ]
                }
            ]
        }"#;
        let node = from_json_str(json).unwrap();
        match &node {
            Node::Program { body, source_type } => {
                assert_eq!(*source_type, Some(SourceType::Script));
                assert_eq!(body.len(), 1);
                match &body[0] {
                    Node::VariableDeclaration { kind, declarations } => {
                        assert_eq!(*kind, DeclKind::Const);
                        assert_eq!(declarations.len(), 1);
                    }
                    other => panic!("expected VariableDeclaration, got {}", other.kind_name()),
                }
            }
            other => panic!("expected Program, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_deserialize_ignores_position_fields() {
        let json = r#"{
            "type": "Identifier",
            "name": "x",
            "start": 4,
            "end": 5,
            "loc": { "start": { "line": 1, "column": 4 }, "end": { "line": 1, "column": 5 } }
        }"#;
        let node = from_json_str(json).unwrap();
        assert_eq!(node.identifier_name(), Some("x"));
    }

    #[test]
    fn test_deserialize_rejects_unknown_kind() {
        let json = r#"{ "type": "JSXElement", "children": [] }"#;
        assert!(from_json_str(json).is_err());
    }

    #[test]
    fn test_deserialize_method_definition() {
        let json = r#"{
            "type": "MethodDefinition",
            "key": { "type": "Identifier", "name": "value1" },
            "value": {
                "type": "FunctionExpression",
                "id": null,
                "params": [],
                "body": { "type": "BlockStatement", "body": [] }
            },
            "kind": "get",
            "computed": false,
            "static": true
        }"#;
        let node = from_json_str(json).unwrap();
        match node {
            Node::MethodDefinition { kind, is_static, computed, .. } => {
                assert_eq!(kind, MethodKind::Get);
                assert!(is_static);
                assert!(!computed);
            }
            other => panic!("expected MethodDefinition, got {}", other.kind_name()),
        }
    }

    #[test]
    fn test_array_holes_deserialize_as_none() {
        let json = r#"{
            "type": "ArrayExpression",
            "elements": [
                { "type": "Identifier", "name": "a" },
                null,
                { "type": "Identifier", "name": "b" }
            ]
        }"#;
        let node = from_json_str(json).unwrap();
        match node {
            Node::ArrayExpression { elements } => {
                assert_eq!(elements.len(), 3);
                assert!(elements[1].is_none());
            }
            other => panic!("expected ArrayExpression, got {}", other.kind_name()),
        }
    }
}
