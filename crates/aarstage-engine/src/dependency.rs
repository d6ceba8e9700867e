//! Typed dependency nodes, stored in an arena for the whole invocation.

use std::collections::HashSet;
use std::path::PathBuf;

use aarstage_util::maven::MavenCoordinates;

/// Index of a node inside a [`DependencyGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// An Android library: a bundle unpacked into its own folder.
#[derive(Debug, Clone)]
pub struct LibraryNode {
    pub coordinates: MavenCoordinates,
    /// `group:name:version[:classifier]`.
    pub name: String,
    pub bundle: PathBuf,
    pub folder: PathBuf,
    pub libraries: Vec<NodeId>,
    pub jars: Vec<NodeId>,
    pub project: Option<String>,
    /// Configuration the node was first discovered in.
    pub configuration: String,
    pub provided: bool,
    pub skipped: bool,
}

/// A plain jar, either from the graph or from the local filesystem.
#[derive(Debug, Clone)]
pub struct JarNode {
    pub coordinates: MavenCoordinates,
    pub file: PathBuf,
    pub dependencies: Vec<NodeId>,
    pub project: Option<String>,
    pub configuration: String,
    pub provided: bool,
    pub skipped: bool,
    pub local: bool,
}

#[derive(Debug, Clone)]
pub enum Node {
    Library(LibraryNode),
    Jar(JarNode),
}

impl Node {
    pub fn coordinates(&self) -> &MavenCoordinates {
        match self {
            Self::Library(lib) => &lib.coordinates,
            Self::Jar(jar) => &jar.coordinates,
        }
    }

    pub fn project(&self) -> Option<&str> {
        match self {
            Self::Library(lib) => lib.project.as_deref(),
            Self::Jar(jar) => jar.project.as_deref(),
        }
    }

    pub fn is_provided(&self) -> bool {
        match self {
            Self::Library(lib) => lib.provided,
            Self::Jar(jar) => jar.provided,
        }
    }

    pub fn is_skipped(&self) -> bool {
        match self {
            Self::Library(lib) => lib.skipped,
            Self::Jar(jar) => jar.skipped,
        }
    }

    /// Direct children, libraries first.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Self::Library(lib) => lib.libraries.iter().chain(&lib.jars).copied().collect(),
            Self::Jar(jar) => jar.dependencies.clone(),
        }
    }

    fn set_skipped(&mut self) {
        match self {
            Self::Library(lib) => lib.skipped = true,
            Self::Jar(jar) => jar.skipped = true,
        }
    }
}

/// Arena owning every node created during one invocation.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn library(&self, id: NodeId) -> Option<&LibraryNode> {
        match self.get(id)? {
            Node::Library(lib) => Some(lib),
            Node::Jar(_) => None,
        }
    }

    pub fn jar(&self, id: NodeId) -> Option<&JarNode> {
        match self.get(id)? {
            Node::Jar(jar) => Some(jar),
            Node::Library(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Exclude a single node from packaging.
    pub fn skip(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.set_skipped();
        }
    }

    /// Exclude a node and everything it owns, transitively, from packaging.
    ///
    /// Only descendants are touched; siblings and parents keep their flag.
    pub fn skip_subtree(&mut self, root: NodeId) {
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.nodes.get_mut(id.0) else {
                continue;
            };
            node.set_skipped();
            stack.extend(node.children());
        }
    }
}
