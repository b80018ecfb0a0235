//! The ownership tree of naming regions
//!
//! Scopes and class definitions share one tree shape: a node of the AST
//! that introduces a naming region, a non-owning parent link, and an owned,
//! ordered list of children. The tree lives in an arena ([`ScopeTree`]);
//! areas address each other by plain index ([`AreaId`]), so ownership runs
//! in exactly one direction and back-references cost nothing to manage.

use crate::ast::Node;
use crate::class_def::ClassDefinition;
use crate::scope::{Scope, ScopeKind};
use rustc_hash::FxHashMap;
use std::ops::Index;

/// Index of an area within its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AreaId(pub u32);

impl AreaId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One naming region: a scope or a class definition.
#[derive(Debug)]
pub enum Area<'ast> {
    Scope(Scope<'ast>),
    Class(ClassDefinition<'ast>),
}

impl<'ast> Area<'ast> {
    /// The AST node that introduced this area.
    pub fn node(&self) -> &'ast Node {
        match self {
            Area::Scope(scope) => scope.node,
            Area::Class(class) => class.node,
        }
    }

    pub fn parent(&self) -> Option<AreaId> {
        match self {
            Area::Scope(scope) => scope.parent,
            Area::Class(class) => class.parent,
        }
    }

    pub fn children(&self) -> &[AreaId] {
        match self {
            Area::Scope(scope) => &scope.children,
            Area::Class(class) => &class.children,
        }
    }

    pub fn as_scope(&self) -> Option<&Scope<'ast>> {
        match self {
            Area::Scope(scope) => Some(scope),
            Area::Class(_) => None,
        }
    }

    pub(crate) fn as_scope_mut(&mut self) -> Option<&mut Scope<'ast>> {
        match self {
            Area::Scope(scope) => Some(scope),
            Area::Class(_) => None,
        }
    }

    pub fn as_class(&self) -> Option<&ClassDefinition<'ast>> {
        match self {
            Area::Scope(_) => None,
            Area::Class(class) => Some(class),
        }
    }
}

/// The finished (or in-construction) tree of areas for one analysis.
///
/// Built in a single top-down pass, mutated only by identifier pushes and
/// by the corrections of [`finalize`](ScopeTree::finalize), then treated as
/// read-only. Areas are never removed.
#[derive(Debug)]
pub struct ScopeTree<'ast> {
    pub(crate) areas: Vec<Area<'ast>>,
    root: AreaId,
}

impl<'ast> ScopeTree<'ast> {
    pub(crate) fn with_root_scope(node: &'ast Node, kind: ScopeKind) -> Self {
        Self {
            areas: vec![Area::Scope(Scope::new(node, kind, None))],
            root: AreaId(0),
        }
    }

    pub(crate) fn with_root_class(node: &'ast Node) -> Self {
        Self {
            areas: vec![Area::Class(ClassDefinition::new(node, None))],
            root: AreaId(0),
        }
    }

    /// Append a child scope under `parent`. Children are linked exactly
    /// once, at construction.
    pub(crate) fn push_scope(&mut self, parent: AreaId, node: &'ast Node, kind: ScopeKind) -> AreaId {
        let id = AreaId(self.areas.len() as u32);
        self.areas.push(Area::Scope(Scope::new(node, kind, Some(parent))));
        self.link_child(parent, id);
        id
    }

    /// Append a child class definition under `parent`.
    pub(crate) fn push_class(&mut self, parent: AreaId, node: &'ast Node) -> AreaId {
        let id = AreaId(self.areas.len() as u32);
        self.areas.push(Area::Class(ClassDefinition::new(node, Some(parent))));
        self.link_child(parent, id);
        id
    }

    fn link_child(&mut self, parent: AreaId, child: AreaId) {
        match &mut self.areas[parent.index()] {
            Area::Scope(scope) => scope.children.push(child),
            Area::Class(class) => class.children.push(child),
        }
    }

    /// Record an identifier against an area. A class definition owns member
    /// descriptors, not identifiers, so a record landing there has no list
    /// to join and is dropped.
    pub(crate) fn push_identifier(&mut self, id: AreaId, ident: crate::scope::IdentifierInScope) {
        if let Area::Scope(scope) = &mut self.areas[id.index()] {
            scope.push(ident);
        }
    }

    /// Record a member descriptor against a class definition. Ignored for
    /// scopes (member syntax cannot occur there).
    pub(crate) fn push_member(&mut self, id: AreaId, member: crate::class_def::ClassMember) {
        if let Area::Class(class) = &mut self.areas[id.index()] {
            class.definitions.push(member);
        }
    }

    pub fn root(&self) -> AreaId {
        self.root
    }

    pub fn area(&self, id: AreaId) -> &Area<'ast> {
        &self.areas[id.index()]
    }

    /// Number of areas in the tree.
    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }

    pub fn parent(&self, id: AreaId) -> Option<AreaId> {
        self.areas[id.index()].parent()
    }

    pub fn children(&self, id: AreaId) -> &[AreaId] {
        self.areas[id.index()].children()
    }

    /// The scope at `id`, if the area is one.
    pub fn scope(&self, id: AreaId) -> Option<&Scope<'ast>> {
        self.areas[id.index()].as_scope()
    }

    /// The class definition at `id`, if the area is one.
    pub fn class(&self, id: AreaId) -> Option<&ClassDefinition<'ast>> {
        self.areas[id.index()].as_class()
    }

    /// Depth-first search for the area introduced by exactly this node
    /// (reference identity, not structural equality).
    pub fn acquire(&self, node: &Node) -> Option<AreaId> {
        self.acquire_in(self.root, node)
    }

    fn acquire_in(&self, id: AreaId, node: &Node) -> Option<AreaId> {
        if std::ptr::eq(self.areas[id.index()].node(), node) {
            return Some(id);
        }
        self.areas[id.index()]
            .children()
            .iter()
            .find_map(|child| self.acquire_in(*child, node))
    }

    /// Build the node-identity index over the finished tree: one linear
    /// traversal, O(1) per lookup afterwards. Agrees with
    /// [`acquire`](ScopeTree::acquire) for every node.
    pub fn area_map(&self) -> AreaMap {
        let mut entries =
            FxHashMap::with_capacity_and_hasher(self.areas.len(), Default::default());
        for (index, area) in self.areas.iter().enumerate() {
            entries.insert(area.node() as *const Node as usize, AreaId(index as u32));
        }
        AreaMap { entries }
    }

    /// Run the resolution pass over the whole tree, parent before children.
    /// Idempotent: a second run changes nothing.
    pub fn finalize(&mut self) {
        tracing::debug!(areas = self.areas.len(), "resolving scope tree");
        self.finalize_area(self.root);
    }

    fn finalize_area(&mut self, id: AreaId) {
        if self.areas[id.index()].as_scope().is_some() {
            self.resolve_scope(id);
        }
        // Class definitions resolve nothing themselves; their child scopes do.
        let children: Vec<AreaId> = self.areas[id.index()].children().to_vec();
        for child in children {
            self.finalize_area(child);
        }
    }
}

impl<'ast> Index<AreaId> for ScopeTree<'ast> {
    type Output = Area<'ast>;

    fn index(&self, id: AreaId) -> &Self::Output {
        &self.areas[id.index()]
    }
}

/// O(1) node-identity lookup over a finished [`ScopeTree`], equivalent to
/// repeated [`ScopeTree::acquire`] calls.
#[derive(Debug)]
pub struct AreaMap {
    entries: FxHashMap<usize, AreaId>,
}

impl AreaMap {
    /// The area introduced by exactly this node, if it is in the tree.
    pub fn get(&self, node: &Node) -> Option<AreaId> {
        self.entries.get(&(node as *const Node as usize)).copied()
    }
}
