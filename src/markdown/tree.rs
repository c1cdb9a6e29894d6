//! Typed body tree built from the pulldown-cmark event stream.
//!
//! The transform and extractor both want a tree, not an event stream: the
//! paragraph-of-images rule needs to see a paragraph's children all at once,
//! and image extraction needs encounter order across arbitrary nesting.
//! So we fold the events into a small block/inline tree once and let every
//! later pass walk it read-only.
//!
//! Node types outside the fixed set below (tables, strikethrough, footnotes,
//! block-level HTML) are dropped together with their content — the transform
//! defines no output for them and silently skipping is the documented
//! behaviour. Inline HTML is different: it survives as literal text so the
//! renderer escapes it instead of letting markup disappear.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

/// A top-level (or quote/list-nested) block node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, children: Vec<Inline> },
    Paragraph(Vec<Inline>),
    List { ordered: bool, items: Vec<Vec<Block>> },
    Code(String),
    Quote(Vec<Block>),
    Separator,
}

/// Inline (phrasing) content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    Code(String),
    Link {
        url: String,
        title: Option<String>,
        children: Vec<Inline>,
    },
    Image {
        url: String,
        alt: String,
    },
    Break,
}

/// Parse markdown into a body tree.
///
/// CommonMark with the GFM tables and strikethrough extensions enabled, so
/// their syntax never leaks into output as literal text — the nodes are
/// parsed, then dropped by the transform.
pub fn parse_tree(markdown: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    TreeBuilder::default().build(parser)
}

/// Containers that can be open while folding the event stream.
enum Open {
    Paragraph(Vec<Inline>),
    Heading(u8, Vec<Inline>),
    List {
        ordered: bool,
        items: Vec<Vec<Block>>,
    },
    Item {
        blocks: Vec<Block>,
        inlines: Vec<Inline>,
    },
    Quote(Vec<Block>),
    CodeBlock(String),
    Bold(Vec<Inline>),
    Italic(Vec<Inline>),
    Link {
        url: String,
        title: Option<String>,
        children: Vec<Inline>,
    },
    Image {
        url: String,
        label: Vec<Inline>,
    },
}

#[derive(Default)]
struct TreeBuilder {
    stack: Vec<Open>,
    root: Vec<Block>,
    /// Depth inside an unrecognized container whose events are discarded.
    ignore_depth: usize,
}

impl TreeBuilder {
    fn build(mut self, parser: Parser) -> Vec<Block> {
        for event in parser {
            self.handle(event);
        }
        self.root
    }

    fn handle(&mut self, event: Event) {
        if self.ignore_depth > 0 {
            match event {
                Event::Start(_) => self.ignore_depth += 1,
                Event::End(_) => self.ignore_depth -= 1,
                _ => {}
            }
            return;
        }
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.push_inline(Inline::Code(code.into_string())),
            // Block-level HTML is dropped with its container; inline HTML
            // becomes literal text and gets escaped by the renderer.
            Event::Html(_) => {}
            Event::InlineHtml(html) => self.push_text(&html),
            // A soft break is just a source line wrap.
            Event::SoftBreak => self.push_text("\n"),
            Event::HardBreak => self.push_inline(Inline::Break),
            Event::Rule => self.push_block(Block::Separator),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        let open = match tag {
            Tag::Paragraph => Open::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Open::Heading(level as u8, Vec::new()),
            Tag::List(start) => Open::List {
                ordered: start.is_some(),
                items: Vec::new(),
            },
            Tag::Item => Open::Item {
                blocks: Vec::new(),
                inlines: Vec::new(),
            },
            Tag::BlockQuote(_) => Open::Quote(Vec::new()),
            // Language tags carry no meaning downstream; only the raw
            // text of the block survives.
            Tag::CodeBlock(_) => Open::CodeBlock(String::new()),
            Tag::Strong => Open::Bold(Vec::new()),
            Tag::Emphasis => Open::Italic(Vec::new()),
            Tag::Link {
                dest_url, title, ..
            } => Open::Link {
                url: dest_url.into_string(),
                title: (!title.is_empty()).then(|| title.into_string()),
                children: Vec::new(),
            },
            Tag::Image { dest_url, .. } => Open::Image {
                url: dest_url.into_string(),
                label: Vec::new(),
            },
            // Tables, footnotes, definition lists, HTML blocks, …
            _ => {
                self.ignore_depth = 1;
                return;
            }
        };
        self.stack.push(open);
    }

    fn end(&mut self, _tag: TagEnd) {
        let Some(open) = self.stack.pop() else {
            return;
        };
        match open {
            Open::Paragraph(inlines) => self.push_block(Block::Paragraph(inlines)),
            Open::Heading(level, children) => {
                self.push_block(Block::Heading { level, children })
            }
            Open::List { ordered, items } => self.push_block(Block::List { ordered, items }),
            Open::Item {
                mut blocks,
                inlines,
            } => {
                // Tight list items carry inline content with no paragraph
                // wrapper; normalise to a paragraph so the transform sees
                // one shape.
                if !inlines.is_empty() {
                    blocks.push(Block::Paragraph(inlines));
                }
                if let Some(Open::List { items, .. }) = self.stack.last_mut() {
                    items.push(blocks);
                }
            }
            Open::Quote(blocks) => self.push_block(Block::Quote(blocks)),
            Open::CodeBlock(text) => self.push_block(Block::Code(text)),
            Open::Bold(children) => self.push_inline(Inline::Bold(children)),
            Open::Italic(children) => self.push_inline(Inline::Italic(children)),
            Open::Link {
                url,
                title,
                children,
            } => self.push_inline(Inline::Link {
                url,
                title,
                children,
            }),
            Open::Image { url, label } => {
                let alt = plain_text(&label);
                self.push_inline(Inline::Image { url, alt });
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(Open::CodeBlock(buf)) = self.stack.last_mut() {
            buf.push_str(text);
            return;
        }
        self.push_inline(Inline::Text(text.to_string()));
    }

    fn push_inline(&mut self, inline: Inline) {
        let sink = match self.stack.last_mut() {
            Some(Open::Paragraph(inlines))
            | Some(Open::Heading(_, inlines))
            | Some(Open::Bold(inlines))
            | Some(Open::Italic(inlines))
            | Some(Open::Link {
                children: inlines, ..
            })
            | Some(Open::Image {
                label: inlines, ..
            })
            | Some(Open::Item { inlines, .. }) => inlines,
            // Inline content in a block-only context has nowhere to go.
            _ => return,
        };
        sink.push(inline);
    }

    fn push_block(&mut self, block: Block) {
        match self.stack.last_mut() {
            Some(Open::Quote(blocks)) | Some(Open::Item { blocks, .. }) => blocks.push(block),
            None => self.root.push(block),
            // A block inside a purely inline container is malformed input;
            // drop it rather than mis-nest.
            _ => {}
        }
    }
}

/// Flatten inline content to its literal text (used for image alt labels).
fn plain_text(inlines: &[Inline]) -> String {
    let mut out = String::new();
    for inline in inlines {
        match inline {
            Inline::Text(t) | Inline::Code(t) => out.push_str(t),
            Inline::Bold(children) | Inline::Italic(children) => {
                out.push_str(&plain_text(children))
            }
            Inline::Link { children, .. } => out.push_str(&plain_text(children)),
            Inline::Image { alt, .. } => out.push_str(alt),
            Inline::Break => out.push(' '),
        }
    }
    out
}
