use std::fmt;

/// A capability declared under DFProperties/AccessType
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    Add,
    Copy,
    Delete,
    Exec,
    Get,
    Replace,
}

impl AccessType {
    /// Map an AccessType child tag (or a bare text token) to a capability.
    /// Unknown tags are ignored by the parser.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "add" => Some(AccessType::Add),
            "copy" => Some(AccessType::Copy),
            "delete" => Some(AccessType::Delete),
            "exec" => Some(AccessType::Exec),
            "get" => Some(AccessType::Get),
            "replace" => Some(AccessType::Replace),
            _ => None,
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccessType::Add => "Add",
            AccessType::Copy => "Copy",
            AccessType::Delete => "Delete",
            AccessType::Exec => "Exec",
            AccessType::Get => "Get",
            AccessType::Replace => "Replace",
        };
        f.write_str(s)
    }
}

/// One DDF `<Node>` element.
///
/// Nodes live in the arena of their [`DdfTree`]; `parent` and `children` are
/// arena indices, so the tree owns every node through forward links and the
/// parent back-reference carries no ownership.
#[derive(Debug, Clone)]
pub struct DdfNode {
    /// From the NodeName child, whitespace-normalized
    pub name: String,

    /// Explicit Path child, when the schema declares one. This is how DDF
    /// documents anchor a subtree at a well-known URI base such as
    /// "./Device/Vendor/MSFT".
    pub path: Option<String>,

    /// Capabilities declared under DFProperties/AccessType
    pub access: Vec<AccessType>,

    /// DFProperties/Description text
    pub description: Option<String>,

    /// DFProperties/Applicability/OsBuildVersion text
    pub os_build: Option<String>,

    /// DFFormat leaf tag name (chr, int, null, ...)
    pub df_format: Option<String>,

    /// DFProperties/DefaultValue text
    pub default_value: Option<String>,

    /// Arena index of the enclosing node, None for top-level nodes
    pub parent: Option<usize>,

    /// Arena indices of nested Node children, in document order
    pub children: Vec<usize>,
}

impl DdfNode {
    pub fn new(parent: Option<usize>) -> Self {
        Self {
            name: String::new(),
            path: None,
            access: Vec::new(),
            description: None,
            os_build: None,
            df_format: None,
            default_value: None,
            parent,
            children: Vec::new(),
        }
    }

    /// Membership test: "Get Exec" still qualifies as executable
    pub fn has_access(&self, capability: AccessType) -> bool {
        self.access.contains(&capability)
    }
}

/// The node tree of one parsed DDF document
#[derive(Debug)]
pub struct DdfTree {
    /// Bare name of the originating XML file
    pub source_file: String,

    nodes: Vec<DdfNode>,
    roots: Vec<usize>,
}

impl DdfTree {
    pub fn new(source_file: impl Into<String>) -> Self {
        Self {
            source_file: source_file.into(),
            nodes: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Add a node to the arena, wiring it into its parent's child list.
    /// Returns the new node's arena index.
    pub fn push(&mut self, node: DdfNode) -> usize {
        let id = self.nodes.len();
        match node.parent {
            Some(parent) => self.nodes[parent].children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.push(node);
        id
    }

    pub fn node(&self, id: usize) -> &DdfNode {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: usize) -> &mut DdfNode {
        &mut self.nodes[id]
    }

    /// Top-level nodes under MgmtTree, in document order
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Number of nodes in the arena; arena order is document pre-order
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
