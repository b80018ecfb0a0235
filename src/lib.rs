//! # Scopewalk - Lexical scope analysis for JavaScript
//!
//! Static scope resolution over ESTree-shaped ASTs, for tooling (linters,
//! refactoring engines, bundlers) that must know, for every identifier,
//! where and how it is bound.
//!
//! Scopewalk provides:
//! - A serde-deserializable ESTree AST consumed from any external parser
//! - A single-walk analyzer producing a tree of scopes with classified
//!   identifiers and class member tables
//! - A resolution pass settling forward references, hoisting and named
//!   function/class expression self-references
//! - O(1) node-to-area lookup over finished trees
//!
//! ```
//! use scopewalk::{analyze_script, IdType};
//!
//! let ast = scopewalk::ast::from_json_str(r#"{
//!     "type": "Program",
//!     "body": [{
//!         "type": "VariableDeclaration",
//!         "kind": "const",
//!         "declarations": [{
//!             "type": "VariableDeclarator",
//!             "id": { "type": "Identifier", "name": "a" },
//!             "init": { "type": "Literal", "value": 10 }
//!         }]
//!     }]
//! }"#)?;
//!
//! let tree = analyze_script(&ast)?;
//! let top = tree.scope(tree.root()).unwrap();
//! assert_eq!(top.find("a").unwrap().kind, IdType::Variable);
//! # Ok::<(), scopewalk::Error>(())
//! ```
//!
//! Analysis is fully synchronous and shares no state between invocations;
//! independent trees may be analyzed on different threads. A finished tree
//! should be treated as read-only.

pub mod analyzer;
pub mod area;
pub mod ast;
pub mod class_def;
pub mod scope;

// Re-exports for convenient access
pub use analyzer::{analyze_module, analyze_script};
pub use area::{Area, AreaId, AreaMap, ScopeTree};
pub use ast::Node;
pub use class_def::{ClassDefinition, ClassMember, MemberKind};
pub use scope::{IdType, IdentifierInScope, Reach, Scope, ScopeKind};

/// Result type alias for scopewalk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for scopewalk operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input document is not a well-formed ESTree AST (or uses a node
    /// kind outside the supported set).
    #[error("failed to deserialize AST: {0}")]
    Json(#[from] serde_json::Error),

    /// The analysis root is not a scope-introducing node.
    #[error("cannot analyze from a {0} node")]
    InvalidRoot(&'static str),

    /// A node appeared in a position the ESTree grammar does not allow.
    /// No partial result is reliable after this.
    #[error("malformed AST: {0}")]
    MalformedAst(String),

    /// Import/export syntax encountered while analyzing in script mode.
    #[error("{0} is only valid in module mode")]
    ModuleSyntaxInScript(&'static str),
}
