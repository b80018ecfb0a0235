//! Class definitions and member descriptors
//!
//! A class body introduces a naming region of its own, but not a lexical
//! scope: it owns member descriptors instead of identifiers. Method,
//! accessor and constructor bodies hang off it as ordinary function scopes.

use crate::area::AreaId;
use crate::ast::{MethodKind, Node};
use serde::{Deserialize, Serialize};

/// Classification of a class member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Property,
    Method,
    Get,
    Set,
    Constructor,
}

impl MemberKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Property => "property",
            MemberKind::Method => "method",
            MemberKind::Get => "get",
            MemberKind::Set => "set",
            MemberKind::Constructor => "constructor",
        }
    }
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<MethodKind> for MemberKind {
    fn from(kind: MethodKind) -> Self {
        match kind {
            MethodKind::Constructor => MemberKind::Constructor,
            MethodKind::Method => MemberKind::Method,
            MethodKind::Get => MemberKind::Get,
            MethodKind::Set => MemberKind::Set,
        }
    }
}

/// One member recorded against a class.
///
/// Members are not unique by name: a getter/setter pair shares its name and
/// differs in kind, and a static member may coexist with an instance member
/// of the same name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMember {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: MemberKind,
    #[serde(rename = "static")]
    pub is_static: bool,
}

impl ClassMember {
    pub fn new(name: impl Into<String>, kind: MemberKind, is_static: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            is_static,
        }
    }
}

/// The area introduced by a class body.
///
/// Its parent is always a scope (absent only when a class node is the
/// analysis root); its children are always scopes - the bodies of its
/// methods, accessors and constructor.
#[derive(Debug)]
pub struct ClassDefinition<'ast> {
    /// The whole class node (declaration or expression, named or anonymous).
    pub node: &'ast Node,
    pub parent: Option<AreaId>,
    pub children: Vec<AreaId>,
    /// Member descriptors in source order.
    pub definitions: Vec<ClassMember>,
}

impl<'ast> ClassDefinition<'ast> {
    pub(crate) fn new(node: &'ast Node, parent: Option<AreaId>) -> Self {
        Self {
            node,
            parent,
            children: Vec::new(),
            definitions: Vec::new(),
        }
    }

    /// First member matching `name`, the kind filter (if any), and exactly
    /// the given staticness.
    pub fn find(&self, name: &str, kind: Option<MemberKind>, is_static: bool) -> Option<&ClassMember> {
        self.definitions.iter().find(|member| {
            member.name == name
                && member.is_static == is_static
                && kind.is_none_or(|k| member.kind == k)
        })
    }

    /// Whether any member (of any kind or staticness) carries this name.
    pub fn has_member(&self, name: &str) -> bool {
        self.definitions.iter().any(|member| member.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze_script;
    use crate::ast::MethodKind;
    use crate::ast::build::*;

    fn sample_class() -> Node {
        // class A {
        //   constructor() {}
        //   static prop1 = 10;
        //   prop1 = 10;
        //   get value() { return 1 }
        //   set value(v) {}
        //   method() {}
        //   static method() {}
        // }
        program(vec![class_decl(
            Some("A"),
            None,
            vec![
                method(ident("constructor"), MethodKind::Constructor, false, vec![], vec![]),
                prop_def(ident("prop1"), Some(num(10.0)), true, false),
                prop_def(ident("prop1"), Some(num(10.0)), false, false),
                method(ident("value"), MethodKind::Get, false, vec![], vec![Node::ReturnStatement {
                    argument: Some(Box::new(num(1.0))),
                }]),
                method(ident("value"), MethodKind::Set, false, vec![ident("v")], vec![]),
                method(ident("method"), MethodKind::Method, false, vec![], vec![]),
                method(ident("method"), MethodKind::Method, true, vec![], vec![]),
            ],
        )])
    }

    #[test]
    fn test_find_by_name_kind_and_staticness() {
        let program = sample_class();
        let tree = analyze_script(&program).unwrap();
        let top = tree.scope(tree.root()).unwrap();
        let class_def = tree.class(top.children[0]).unwrap();

        assert!(class_def.find("constructor", Some(MemberKind::Constructor), false).is_some());
        assert!(class_def.find("prop1", Some(MemberKind::Property), false).is_some());
        assert!(class_def.find("prop1", Some(MemberKind::Property), true).is_some());
        assert!(class_def.find("method", Some(MemberKind::Method), false).is_some());
        assert!(class_def.find("method", Some(MemberKind::Method), true).is_some());
        assert!(class_def.find("value", Some(MemberKind::Get), false).is_some());
        assert!(class_def.find("value", Some(MemberKind::Set), false).is_some());
        assert!(class_def.find("test", None, false).is_none());
    }

    #[test]
    fn test_member_table_in_source_order() {
        let program = sample_class();
        let tree = analyze_script(&program).unwrap();
        let top = tree.scope(tree.root()).unwrap();
        let class_def = tree.class(top.children[0]).unwrap();
        assert_eq!(
            class_def.definitions,
            vec![
                ClassMember::new("constructor", MemberKind::Constructor, false),
                ClassMember::new("prop1", MemberKind::Property, true),
                ClassMember::new("prop1", MemberKind::Property, false),
                ClassMember::new("value", MemberKind::Get, false),
                ClassMember::new("value", MemberKind::Set, false),
                ClassMember::new("method", MemberKind::Method, false),
                ClassMember::new("method", MemberKind::Method, true),
            ]
        );
    }

    #[test]
    fn test_getter_setter_pair_shares_name() {
        let program = sample_class();
        let tree = analyze_script(&program).unwrap();
        let top = tree.scope(tree.root()).unwrap();
        let class_def = tree.class(top.children[0]).unwrap();
        let values: Vec<_> = class_def
            .definitions
            .iter()
            .filter(|m| m.name == "value")
            .collect();
        assert_eq!(values.len(), 2);
        assert_ne!(values[0].kind, values[1].kind);
    }
}
