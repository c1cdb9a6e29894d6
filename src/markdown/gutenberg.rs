//! Body tree → Gutenberg block serialisation.
//!
//! WordPress stores Gutenberg content as HTML annotated with
//! `<!-- wp:… -->` block comments. Each top-level tree node becomes one
//! block (or, for a paragraph that is nothing but images, one image block
//! per image — a bare image paragraph is the Gutenberg convention for a
//! block-level image, not an inline one).
//!
//! Output is byte-for-byte deterministic for a given (tree, map) pair:
//! iteration follows the tree's explicit ordering and the map is only ever
//! probed by key.

use super::tree::{Block, Inline};
use indexmap::IndexMap;

/// Remote media assigned to an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub id: u64,
    pub url: String,
}

/// Source image path (as written in the markdown) → uploaded media.
///
/// Keyed by the literal path string, not the content hash: the transform
/// joins on what it finds in the tree. Insertion-ordered so logs and
/// serialised forms stay stable.
pub type ImageMap = IndexMap<String, MediaRef>;

/// Serialise a body tree to Gutenberg block HTML.
///
/// Unrecognized nodes produce no output. Blocks are joined by a blank
/// line, matching what the WordPress editor itself writes.
pub fn to_gutenberg(tree: &[Block], images: &ImageMap) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for node in tree {
        render_block(node, images, &mut blocks);
    }
    blocks.join("\n\n")
}

fn render_block(node: &Block, images: &ImageMap, out: &mut Vec<String>) {
    match node {
        Block::Heading { level, children } => {
            let content = render_inlines(children, images);
            out.push(format!(
                "<!-- wp:heading {{\"level\":{level}}} -->\n<h{level} class=\"wp-block-heading\">{content}</h{level}>\n<!-- /wp:heading -->"
            ));
        }
        Block::Paragraph(children) => {
            if let Some(only_images) = as_image_paragraph(children) {
                for (url, alt) in only_images {
                    out.push(render_image_block(url, alt, images));
                }
            } else {
                let content = render_inlines(children, images);
                out.push(format!(
                    "<!-- wp:paragraph -->\n<p>{content}</p>\n<!-- /wp:paragraph -->"
                ));
            }
        }
        Block::List { ordered, items } => {
            let (tag, attrs) = if *ordered {
                ("ol", " {\"ordered\":true}")
            } else {
                ("ul", "")
            };
            let rendered: Vec<String> = items
                .iter()
                .map(|item| format!("<li>{}</li>", render_list_item(item, images)))
                .collect();
            out.push(format!(
                "<!-- wp:list{attrs} -->\n<{tag} class=\"wp-block-list\">\n{}\n</{tag}>\n<!-- /wp:list -->",
                rendered.join("\n")
            ));
        }
        Block::Code(raw) => {
            let code = escape_html(raw);
            out.push(format!(
                "<!-- wp:code -->\n<pre class=\"wp-block-code\"><code>{code}</code></pre>\n<!-- /wp:code -->"
            ));
        }
        Block::Quote(children) => {
            // Only direct paragraph children render; anything else nested
            // in a quote is dropped.
            let paragraphs: Vec<String> = children
                .iter()
                .filter_map(|child| match child {
                    Block::Paragraph(inlines) => {
                        Some(format!("<p>{}</p>", render_inlines(inlines, images)))
                    }
                    _ => None,
                })
                .collect();
            out.push(format!(
                "<!-- wp:quote -->\n<blockquote class=\"wp-block-quote\">\n{}\n</blockquote>\n<!-- /wp:quote -->",
                paragraphs.join("\n")
            ));
        }
        Block::Separator => {
            out.push(
                "<!-- wp:separator -->\n<hr class=\"wp-block-separator has-alpha-channel-opacity\"/>\n<!-- /wp:separator -->"
                    .to_string(),
            );
        }
    }
}

/// If a paragraph consists entirely of images (ignoring whitespace-only
/// text between them), return them for block-level promotion.
fn as_image_paragraph(children: &[Inline]) -> Option<Vec<(&str, &str)>> {
    let mut found = Vec::new();
    for child in children {
        match child {
            Inline::Image { url, alt } => found.push((url.as_str(), alt.as_str())),
            Inline::Text(t) if t.trim().is_empty() => {}
            _ => return None,
        }
    }
    if found.is_empty() {
        None
    } else {
        Some(found)
    }
}

/// A block-level image: mapped images carry the remote media id, everything
/// else (already-remote URLs) renders its original source verbatim.
fn render_image_block(url: &str, alt: &str, images: &ImageMap) -> String {
    match images.get(url) {
        Some(media) => {
            let id = media.id;
            format!(
                "<!-- wp:image {{\"id\":{id},\"sizeSlug\":\"large\"}} -->\n<figure class=\"wp-block-image size-large\">\n  <img src=\"{}\" alt=\"{}\" class=\"wp-image-{id}\"/>\n</figure>\n<!-- /wp:image -->",
                escape_html(&media.url),
                escape_html(alt),
            )
        }
        None => format!(
            "<!-- wp:image -->\n<figure class=\"wp-block-image\">\n  <img src=\"{}\" alt=\"{}\"/>\n</figure>\n<!-- /wp:image -->",
            escape_html(url),
            escape_html(alt),
        ),
    }
}

/// List items keep only their paragraph children, space-joined into one
/// flat line; deeper block structure inside an item is not modelled.
fn render_list_item(item: &[Block], images: &ImageMap) -> String {
    item.iter()
        .filter_map(|child| match child {
            Block::Paragraph(inlines) => Some(render_inlines(inlines, images)),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn render_inlines(inlines: &[Inline], images: &ImageMap) -> String {
    inlines
        .iter()
        .map(|inline| render_inline(inline, images))
        .collect()
}

fn render_inline(inline: &Inline, images: &ImageMap) -> String {
    match inline {
        Inline::Text(text) => escape_html(text),
        Inline::Bold(children) => format!("<strong>{}</strong>", render_inlines(children, images)),
        Inline::Italic(children) => format!("<em>{}</em>", render_inlines(children, images)),
        Inline::Code(code) => format!("<code>{}</code>", escape_html(code)),
        Inline::Link {
            url,
            title,
            children,
        } => {
            let href = escape_html(url);
            let title_attr = title
                .as_deref()
                .map(|t| format!(" title=\"{}\"", escape_html(t)))
                .unwrap_or_default();
            format!(
                "<a href=\"{href}\"{title_attr}>{}</a>",
                render_inlines(children, images)
            )
        }
        Inline::Image { url, alt } => match images.get(url) {
            Some(media) => format!(
                "<img src=\"{}\" alt=\"{}\" class=\"wp-image-{}\"/>",
                escape_html(&media.url),
                escape_html(alt),
                media.id
            ),
            None => format!(
                "<img src=\"{}\" alt=\"{}\"/>",
                escape_html(url),
                escape_html(alt)
            ),
        },
        Inline::Break => "<br>".to_string(),
    }
}

/// Escape the five HTML-significant characters. All literal text funnels
/// through here; raw markup never reaches the output unescaped.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(ch),
        }
    }
    out
}
