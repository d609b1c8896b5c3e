//! Namespace Tree - hierarchical storage for module nodes and placeholders.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: [`RegistryNode`] (the root, a module node, or a type placeholder)
//! - Edges: `Contains(name)` from a parent to each child
//!
//! Modules may contain modules and placeholders; placeholders may contain
//! nested placeholders only. Nodes are never removed, so a `NodeIndex`
//! identifies the same node for the life of the tree.

use latebind_core::{QualifiedName, RegistrationError, TypeHash, Value};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;

/// Edge types in the registry graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryEdge {
    /// Parent contains child. The String is the child's simple name.
    Contains(String),
}

/// The two kinds of named nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Module,
    Placeholder,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Module => "module",
            NodeKind::Placeholder => "type",
        }
    }
}

/// Data stored in each node.
#[derive(Debug, Clone)]
pub enum RegistryNode {
    /// The unnamed root; its children are top-level modules.
    Root,
    /// Mirror of a real module.
    Module {
        name: QualifiedName,
        hash: TypeHash,
    },
    /// Stand-in for a type that will be implemented later.
    Placeholder {
        name: QualifiedName,
        hash: TypeHash,
        /// Static members copied from the implementation.
        statics: Vec<(String, Value)>,
    },
}

impl RegistryNode {
    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            RegistryNode::Root => None,
            RegistryNode::Module { .. } => Some(NodeKind::Module),
            RegistryNode::Placeholder { .. } => Some(NodeKind::Placeholder),
        }
    }

    pub fn name(&self) -> Option<&QualifiedName> {
        match self {
            RegistryNode::Root => None,
            RegistryNode::Module { name, .. } | RegistryNode::Placeholder { name, .. } => Some(name),
        }
    }

    pub fn hash(&self) -> TypeHash {
        match self {
            RegistryNode::Root => TypeHash::EMPTY,
            RegistryNode::Module { hash, .. } | RegistryNode::Placeholder { hash, .. } => *hash,
        }
    }
}

/// The registry graph.
pub struct NamespaceTree {
    /// The directed graph storing all nodes.
    graph: DiGraph<RegistryNode, RegistryEdge>,

    /// The root node.
    root: NodeIndex,

    /// Reverse index: TypeHash -> node, for placeholders and modules.
    hash_index: FxHashMap<TypeHash, NodeIndex>,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceTree {
    /// Create a new tree with an empty root.
    pub fn new() -> Self {
        let mut graph = DiGraph::new();
        let root = graph.add_node(RegistryNode::Root);
        Self {
            graph,
            root,
            hash_index: FxHashMap::default(),
        }
    }

    /// Get the root node index.
    pub fn root(&self) -> NodeIndex {
        self.root
    }

    /// Get a node's data.
    pub fn node(&self, node: NodeIndex) -> Option<&RegistryNode> {
        self.graph.node_weight(node)
    }

    /// Get a mutable reference to a node's data.
    pub fn node_mut(&mut self, node: NodeIndex) -> Option<&mut RegistryNode> {
        self.graph.node_weight_mut(node)
    }

    /// Find a child by simple name.
    pub fn find_child(&self, parent: NodeIndex, name: &str) -> Option<NodeIndex> {
        self.graph
            .edges(parent)
            .find(|edge| matches!(edge.weight(), RegistryEdge::Contains(n) if n == name))
            .map(|edge| edge.target())
    }

    /// Children of a node with their simple names, in creation order.
    pub fn children(&self, parent: NodeIndex) -> Vec<(&str, NodeIndex)> {
        let mut children: Vec<(&str, NodeIndex)> = self
            .graph
            .edges(parent)
            .map(|edge| {
                let RegistryEdge::Contains(name) = edge.weight();
                (name.as_str(), edge.target())
            })
            .collect();
        // petgraph iterates outgoing edges newest first.
        children.sort_by_key(|(_, idx)| idx.index());
        children
    }

    /// Get or create a child of the given kind.
    ///
    /// Fails with `KindMismatch` when the child exists with the other kind,
    /// or when a module is requested inside a placeholder.
    pub fn get_or_create_child(
        &mut self,
        parent: NodeIndex,
        name: &str,
        kind: NodeKind,
    ) -> Result<NodeIndex, RegistrationError> {
        if let Some(child) = self.find_child(parent, name) {
            let found = self.node(child).and_then(RegistryNode::kind);
            if found == Some(kind) {
                return Ok(child);
            }
            return Err(RegistrationError::KindMismatch {
                name: self.child_name(parent, name).to_string(),
                expected: kind.as_str(),
                found: found.map_or("root", NodeKind::as_str),
            });
        }

        let parent_kind = self.node(parent).and_then(RegistryNode::kind);
        if kind == NodeKind::Module && parent_kind == Some(NodeKind::Placeholder) {
            return Err(RegistrationError::KindMismatch {
                name: self.qualified_name(parent).to_string(),
                expected: NodeKind::Module.as_str(),
                found: NodeKind::Placeholder.as_str(),
            });
        }

        let name_q = self.child_name(parent, name);
        let data = match kind {
            NodeKind::Module => RegistryNode::Module {
                hash: TypeHash::from_module(&name_q.to_string()),
                name: name_q,
            },
            NodeKind::Placeholder => RegistryNode::Placeholder {
                hash: name_q.to_type_hash(),
                name: name_q,
                statics: Vec::new(),
            },
        };
        let hash = data.hash();

        let child = self.graph.add_node(data);
        self.graph
            .add_edge(parent, child, RegistryEdge::Contains(name.to_string()));
        self.hash_index.insert(hash, child);
        Ok(child)
    }

    /// Get or create a path of nodes of one kind below `start`.
    pub fn get_or_create_path<S: AsRef<str>>(
        &mut self,
        start: NodeIndex,
        path: &[S],
        kind: NodeKind,
    ) -> Result<NodeIndex, RegistrationError> {
        let mut current = start;
        for segment in path {
            current = self.get_or_create_child(current, segment.as_ref(), kind)?;
        }
        Ok(current)
    }

    /// Get an existing node by path from the root, or None if it doesn't exist.
    pub fn get_path<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeIndex> {
        let mut current = self.root;
        for segment in path {
            current = self.find_child(current, segment.as_ref())?;
        }
        Some(current)
    }

    /// Find a node by its hash.
    pub fn get_by_hash(&self, hash: TypeHash) -> Option<NodeIndex> {
        self.hash_index.get(&hash).copied()
    }

    /// Find the parent of a node.
    pub fn find_parent(&self, node: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(node, Direction::Incoming)
            .next()
            .map(|edge| edge.source())
    }

    /// Get the simple name of a node.
    pub fn node_name(&self, node: NodeIndex) -> Option<&str> {
        if node == self.root {
            return None;
        }
        self.graph
            .edges_directed(node, Direction::Incoming)
            .next()
            .map(|edge| {
                let RegistryEdge::Contains(name) = edge.weight();
                name.as_str()
            })
    }

    /// Get the full path of segments from the root to a node.
    pub fn node_path(&self, node: NodeIndex) -> Vec<String> {
        let mut path = Vec::new();
        let mut current = node;

        while current != self.root {
            if let Some(name) = self.node_name(current) {
                path.push(name.to_string());
            }
            match self.find_parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        path.reverse();
        path
    }

    /// Qualified name of a node (empty for the root).
    pub fn qualified_name(&self, node: NodeIndex) -> QualifiedName {
        match self.node(node).and_then(RegistryNode::name) {
            Some(name) => name.clone(),
            None => QualifiedName::from_parts(&self.node_path(node)).unwrap_or_else(|| QualifiedName::global("")),
        }
    }

    /// Number of nodes of the given kind.
    pub fn count(&self, kind: NodeKind) -> usize {
        self.graph
            .node_weights()
            .filter(|n| n.kind() == Some(kind))
            .count()
    }

    fn child_name(&self, parent: NodeIndex, name: &str) -> QualifiedName {
        if parent == self.root {
            QualifiedName::global(name)
        } else {
            self.qualified_name(parent).child(name)
        }
    }
}
