use uuid::Uuid;

/// Stable identity of a node
///
/// Identity is never transferred between nodes: a relocated block is a
/// detached copy with fresh ids, see [`Node::detached_copy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type tag of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Paragraph,
    Heading { level: u8 },
    BulletList,
    OrderedList { start: u64 },
    ListItem,
    BlockQuote,
    CodeBlock { language: Option<String> },
    Image { src: String, alt: String },
    Table,
    TableRow,
    TableCell,
    HorizontalRule,
    Text,
}

impl NodeKind {
    /// Whether nodes of this kind can be picked up and moved as a top-level block
    pub fn is_reorderable(&self) -> bool {
        !matches!(
            self,
            NodeKind::Text | NodeKind::ListItem | NodeKind::TableRow | NodeKind::TableCell
        )
    }

    /// Short name used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Paragraph => "paragraph",
            NodeKind::Heading { .. } => "heading",
            NodeKind::BulletList => "bullet_list",
            NodeKind::OrderedList { .. } => "ordered_list",
            NodeKind::ListItem => "list_item",
            NodeKind::BlockQuote => "blockquote",
            NodeKind::CodeBlock { .. } => "code_block",
            NodeKind::Image { .. } => "image",
            NodeKind::Table => "table",
            NodeKind::TableRow => "table_row",
            NodeKind::TableCell => "table_cell",
            NodeKind::HorizontalRule => "horizontal_rule",
            NodeKind::Text => "text",
        }
    }
}

/// What a node holds
#[derive(Debug, Clone, PartialEq)]
pub enum NodeContent {
    /// Leaf text, one position per char
    Text(String),
    /// Branch node, framed by an opening and a closing position
    Children(Vec<Node>),
    /// Leaf without content (image, rule), one position
    Atom,
}

/// A node in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    content: NodeContent,
}

impl Node {
    pub fn new(kind: NodeKind, content: NodeContent) -> Self {
        Self {
            id: NodeId::new(),
            kind,
            content,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Text, NodeContent::Text(text.into()))
    }

    pub fn branch(kind: NodeKind, children: Vec<Node>) -> Self {
        Self::new(kind, NodeContent::Children(children))
    }

    pub fn atom(kind: NodeKind) -> Self {
        Self::new(kind, NodeContent::Atom)
    }

    /// Paragraph holding a single text child
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::branch(NodeKind::Paragraph, vec![Self::text(text)])
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::branch(NodeKind::Heading { level }, vec![Self::text(text)])
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn content(&self) -> &NodeContent {
        &self.content
    }

    /// Child nodes; empty for leaves
    pub fn children(&self) -> &[Node] {
        match &self.content {
            NodeContent::Children(children) => children,
            _ => &[],
        }
    }

    /// Number of positions this node occupies in the linear extent
    pub fn size(&self) -> usize {
        match &self.content {
            NodeContent::Text(text) => text.chars().count(),
            NodeContent::Atom => 1,
            NodeContent::Children(children) => 2 + children.iter().map(Node::size).sum::<usize>(),
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match &self.content {
            NodeContent::Text(text) => out.push_str(text),
            NodeContent::Children(children) => {
                for child in children {
                    child.collect_text(out);
                }
            }
            NodeContent::Atom => {}
        }
    }

    /// Deep copy with fresh identities throughout the subtree
    pub fn detached_copy(&self) -> Node {
        let content = match &self.content {
            NodeContent::Children(children) => {
                NodeContent::Children(children.iter().map(Node::detached_copy).collect())
            }
            other => other.clone(),
        };
        Node::new(self.kind.clone(), content)
    }
}
