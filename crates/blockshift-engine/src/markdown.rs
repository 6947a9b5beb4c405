//! Markdown import and export for [`Document`]s
//!
//! Import walks `pulldown-cmark`'s offset iterator and keeps the raw inline
//! markdown of each text block (emphasis markers, links and escapes survive
//! untouched) while building the block structure as nodes. Export writes
//! blocks back out separated by blank lines.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::document::{Document, Node, NodeKind};

/// Parse markdown source into a document
pub fn parse_markdown(source: &str) -> Document {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut builder = TreeBuilder::default();
    for (event, range) in Parser::new_ext(source, options).into_offset_iter() {
        builder.event(source, event, range);
    }
    Document::new(builder.finish())
}

/// Render a whole document as markdown
pub fn to_markdown(document: &Document) -> String {
    if document.blocks().is_empty() {
        return String::new();
    }
    let mut out = document
        .blocks()
        .iter()
        .map(block_to_markdown)
        .collect::<Vec<_>>()
        .join("\n\n");
    out.push('\n');
    out
}

/// Render a single block (and its subtree) as markdown
pub fn block_to_markdown(node: &Node) -> String {
    match node.kind() {
        NodeKind::Paragraph | NodeKind::TableCell | NodeKind::Text => node.text_content(),
        NodeKind::Heading { level } => {
            format!("{} {}", "#".repeat(*level as usize), node.text_content())
        }
        NodeKind::CodeBlock { language } => format!(
            "```{}\n{}\n```",
            language.as_deref().unwrap_or(""),
            node.text_content()
        ),
        NodeKind::Image { src, alt } => format!("![{alt}]({src})"),
        NodeKind::HorizontalRule => "---".to_string(),
        NodeKind::BlockQuote => {
            let inner = join_blocks(node.children());
            inner
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {line}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
        NodeKind::BulletList => node
            .children()
            .iter()
            .map(|item| list_item_to_markdown(item, "- "))
            .collect::<Vec<_>>()
            .join("\n"),
        NodeKind::OrderedList { start } => node
            .children()
            .iter()
            .enumerate()
            .map(|(offset, item)| {
                list_item_to_markdown(item, &format!("{}. ", start + offset as u64))
            })
            .collect::<Vec<_>>()
            .join("\n"),
        NodeKind::ListItem => list_item_to_markdown(node, "- "),
        NodeKind::Table => {
            let mut lines = Vec::new();
            for (row_index, row) in node.children().iter().enumerate() {
                lines.push(table_row_to_markdown(row));
                if row_index == 0 {
                    let separators = vec!["---"; row.children().len()];
                    lines.push(format!("| {} |", separators.join(" | ")));
                }
            }
            lines.join("\n")
        }
        NodeKind::TableRow => table_row_to_markdown(node),
    }
}

fn join_blocks(nodes: &[Node]) -> String {
    nodes
        .iter()
        .map(block_to_markdown)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn list_item_to_markdown(item: &Node, marker: &str) -> String {
    let body = join_blocks(item.children());
    let indent = " ".repeat(marker.chars().count());
    let mut lines = body.lines();
    let mut out = format!("{marker}{}", lines.next().unwrap_or(""));
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(&indent);
            out.push_str(line);
        }
    }
    out
}

fn table_row_to_markdown(row: &Node) -> String {
    let cells = row
        .children()
        .iter()
        .map(Node::text_content)
        .collect::<Vec<_>>();
    format!("| {} |", cells.join(" | "))
}

/// Reassembles the raw source of inline content from event ranges
///
/// Gaps between consecutive inline events (emphasis markers, link syntax,
/// escapes) are copied from the source verbatim. The gap after a line break
/// is dropped since it holds container prefixes such as `> ` or list
/// indentation that belong to the enclosing block.
#[derive(Debug, Default)]
struct InlineSource {
    out: String,
    cursor: Option<usize>,
    after_break: bool,
}

impl InlineSource {
    fn sync(&mut self, source: &str, start: usize) {
        match self.cursor {
            Some(_) if self.after_break => {
                self.cursor = Some(start);
                self.after_break = false;
            }
            Some(cursor) if start > cursor => {
                if let Some(gap) = source.get(cursor..start) {
                    self.out.push_str(gap);
                }
                self.cursor = Some(start);
            }
            Some(_) => {}
            None => self.cursor = Some(start),
        }
    }

    fn open(&mut self, source: &str, range: Range<usize>) {
        self.sync(source, range.start);
    }

    fn close(&mut self, source: &str, range: Range<usize>) {
        if let Some(cursor) = self.cursor
            && range.end > cursor
            && !self.after_break
        {
            if let Some(tail) = source.get(cursor..range.end) {
                self.out.push_str(tail);
            }
            self.cursor = Some(range.end);
        }
    }

    fn leaf(&mut self, source: &str, range: Range<usize>, is_break: bool) {
        self.sync(source, range.start);
        if is_break {
            // hard breaks keep their trailing spaces or backslash
            self.out.push_str(source.get(range.clone()).unwrap_or("\n"));
            self.after_break = true;
        } else if let Some(text) = source.get(range.clone()) {
            self.out.push_str(text);
        }
        self.cursor = Some(range.end);
    }

    fn finish(self) -> String {
        self.out.trim_end_matches('\n').to_string()
    }
}

/// Tracks whether a text block consists of a single image and nothing else
#[derive(Debug, Default)]
struct ImageProbe {
    src: Option<String>,
    alt: String,
    inside: bool,
    images: usize,
    other_content: bool,
}

impl ImageProbe {
    fn image(&self) -> Option<NodeKind> {
        match (&self.src, self.images, self.other_content) {
            (Some(src), 1, false) => Some(NodeKind::Image {
                src: src.clone(),
                alt: self.alt.clone(),
            }),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Frame {
    /// `None` for containers we do not model; their children go to the parent
    kind: Option<NodeKind>,
    children: Vec<Node>,
    inline: Option<InlineSource>,
    code: Option<String>,
    image: ImageProbe,
    /// Paragraph opened for inline content of a tight list item
    implicit: bool,
}

impl Frame {
    fn container(kind: Option<NodeKind>) -> Self {
        Self {
            kind,
            children: Vec::new(),
            inline: None,
            code: None,
            image: ImageProbe::default(),
            implicit: false,
        }
    }

    fn textblock(kind: NodeKind, implicit: bool) -> Self {
        Self {
            inline: Some(InlineSource::default()),
            implicit,
            ..Self::container(Some(kind))
        }
    }

    fn code_block(language: Option<String>) -> Self {
        Self {
            code: Some(String::new()),
            ..Self::container(Some(NodeKind::CodeBlock { language }))
        }
    }

    fn into_nodes(self) -> Vec<Node> {
        let Some(kind) = self.kind else {
            return self.children;
        };

        if let Some(code) = self.code {
            let code = code.strip_suffix('\n').unwrap_or(&code).to_string();
            let children = if code.is_empty() {
                Vec::new()
            } else {
                vec![Node::text(code)]
            };
            return vec![Node::branch(kind, children)];
        }

        if let Some(inline) = self.inline {
            if kind == NodeKind::Paragraph
                && let Some(image) = self.image.image()
            {
                return vec![Node::atom(image)];
            }
            let text = inline.finish();
            let children = if text.is_empty() {
                Vec::new()
            } else {
                vec![Node::text(text)]
            };
            return vec![Node::branch(kind, children)];
        }

        vec![Node::branch(kind, self.children)]
    }
}

#[derive(Debug, Default)]
struct TreeBuilder {
    stack: Vec<Frame>,
    blocks: Vec<Node>,
}

impl TreeBuilder {
    fn event(&mut self, source: &str, event: Event<'_>, range: Range<usize>) {
        match event {
            Event::Start(tag) => self.start(source, tag, range),
            Event::End(tag) => self.end(source, tag, range),
            Event::Text(text) => {
                if let Some(code) = self.stack.last_mut().and_then(|f| f.code.as_mut()) {
                    code.push_str(&text);
                    return;
                }
                let frame = self.inline_frame();
                if frame.image.inside {
                    frame.image.alt.push_str(&text);
                } else {
                    frame.image.other_content = true;
                }
                if let Some(inline) = frame.inline.as_mut() {
                    inline.leaf(source, range, false);
                }
            }
            Event::Code(_)
            | Event::Html(_)
            | Event::InlineHtml(_)
            | Event::InlineMath(_)
            | Event::DisplayMath(_)
            | Event::FootnoteReference(_) => self.inline_leaf(source, range, false),
            Event::SoftBreak | Event::HardBreak => self.inline_leaf(source, range, true),
            Event::Rule => {
                self.close_implicit();
                self.push_nodes(vec![Node::atom(NodeKind::HorizontalRule)]);
            }
            Event::TaskListMarker(_) => {}
        }
    }

    fn start(&mut self, source: &str, tag: Tag<'_>, range: Range<usize>) {
        let frame = match tag {
            Tag::Paragraph | Tag::HtmlBlock => Frame::textblock(NodeKind::Paragraph, false),
            Tag::Heading { level, .. } => Frame::textblock(
                NodeKind::Heading {
                    level: level as u8,
                },
                false,
            ),
            Tag::BlockQuote(_) => Frame::container(Some(NodeKind::BlockQuote)),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| lang.to_string()),
                    CodeBlockKind::Indented => None,
                };
                Frame::code_block(language)
            }
            Tag::List(None) => Frame::container(Some(NodeKind::BulletList)),
            Tag::List(Some(start)) => Frame::container(Some(NodeKind::OrderedList { start })),
            Tag::Item => Frame::container(Some(NodeKind::ListItem)),
            Tag::Table(_) => Frame::container(Some(NodeKind::Table)),
            Tag::TableHead | Tag::TableRow => Frame::container(Some(NodeKind::TableRow)),
            Tag::TableCell => Frame::textblock(NodeKind::TableCell, false),
            Tag::FootnoteDefinition(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::MetadataBlock(_) => Frame::container(None),
            Tag::Image { dest_url, .. } => {
                let frame = self.inline_frame();
                frame.image.images += 1;
                frame.image.inside = true;
                frame.image.src = Some(dest_url.to_string());
                if let Some(inline) = frame.inline.as_mut() {
                    inline.open(source, range);
                }
                return;
            }
            _ => {
                if let Some(inline) = self.inline_frame().inline.as_mut() {
                    inline.open(source, range);
                }
                return;
            }
        };

        self.close_implicit();
        self.stack.push(frame);
    }

    fn end(&mut self, source: &str, tag: TagEnd, range: Range<usize>) {
        match tag {
            TagEnd::Paragraph
            | TagEnd::HtmlBlock
            | TagEnd::Heading(_)
            | TagEnd::BlockQuote(_)
            | TagEnd::CodeBlock
            | TagEnd::List(_)
            | TagEnd::Item
            | TagEnd::Table
            | TagEnd::TableHead
            | TagEnd::TableRow
            | TagEnd::TableCell
            | TagEnd::FootnoteDefinition
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition
            | TagEnd::MetadataBlock(_) => {
                self.close_implicit();
                if let Some(frame) = self.stack.pop() {
                    self.push_nodes(frame.into_nodes());
                }
            }
            other => {
                if let Some(frame) = self.stack.last_mut() {
                    if other == TagEnd::Image {
                        frame.image.inside = false;
                    }
                    if let Some(inline) = frame.inline.as_mut() {
                        inline.close(source, range);
                    }
                }
            }
        }
    }

    fn inline_leaf(&mut self, source: &str, range: Range<usize>, is_break: bool) {
        let frame = self.inline_frame();
        if !frame.image.inside {
            frame.image.other_content = true;
        }
        if let Some(inline) = frame.inline.as_mut() {
            inline.leaf(source, range, is_break);
        }
    }

    /// The frame collecting inline content, opening an implicit paragraph
    /// when inline content appears directly inside a container
    fn inline_frame(&mut self) -> &mut Frame {
        if !self.stack.last().is_some_and(|frame| frame.inline.is_some()) {
            self.stack.push(Frame::textblock(NodeKind::Paragraph, true));
        }
        let top = self.stack.len() - 1;
        &mut self.stack[top]
    }

    fn close_implicit(&mut self) {
        while self.stack.last().is_some_and(|frame| frame.implicit) {
            if let Some(frame) = self.stack.pop() {
                self.push_nodes(frame.into_nodes());
            }
        }
    }

    fn push_nodes(&mut self, nodes: Vec<Node>) {
        match self.stack.last_mut() {
            Some(parent) => parent.children.extend(nodes),
            None => self.blocks.extend(nodes),
        }
    }

    fn finish(mut self) -> Vec<Node> {
        while let Some(frame) = self.stack.pop() {
            self.push_nodes(frame.into_nodes());
        }
        self.blocks
    }
}
