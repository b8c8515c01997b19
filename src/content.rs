//! The swappable content region: an HTML fragment reduced to blocks of text nodes.

use std::sync::OnceLock;

use regex::{Captures, Regex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Heading,
    ListItem,
    Preformatted,
    Text,
}

/// A text node, or part of one split out by highlighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub emphasis: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub segments: Vec<Segment>,
}

impl Block {
    pub fn plain_text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContentRegion {
    path: String,
    blocks: Vec<Block>,
    /// Block to bring into view on the next draw.
    focus: Option<usize>,
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)<!--.*?-->|<(/?)([a-zA-Z][a-zA-Z0-9]*)[^>]*>|[^<]+|<")
            .expect("content token pattern is valid")
    })
}

fn entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("entity pattern is valid")
    })
}

fn block_kind(tag: &str) -> Option<BlockKind> {
    match tag {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(BlockKind::Heading),
        "li" => Some(BlockKind::ListItem),
        "pre" => Some(BlockKind::Preformatted),
        "p" | "div" | "ul" | "ol" | "article" | "section" | "header" | "footer" | "nav"
        | "main" | "blockquote" | "table" | "tr" | "hr" | "br" => Some(BlockKind::Text),
        _ => None,
    }
}

pub fn decode_entities(text: &str) -> String {
    entity_pattern()
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                "mdash" => Some('\u{2014}'),
                "ndash" => Some('\u{2013}'),
                "hellip" => Some('\u{2026}'),
                "lsquo" => Some('\u{2018}'),
                "rsquo" => Some('\u{2019}'),
                "ldquo" => Some('\u{201C}'),
                "rdquo" => Some('\u{201D}'),
                "laquo" => Some('\u{00AB}'),
                "raquo" => Some('\u{00BB}'),
                "bull" => Some('\u{2022}'),
                "middot" => Some('\u{00B7}'),
                "copy" => Some('\u{00A9}'),
                "reg" => Some('\u{00AE}'),
                "trade" => Some('\u{2122}'),
                "deg" => Some('\u{00B0}'),
                "times" => Some('\u{00D7}'),
                "euro" => Some('\u{20AC}'),
                "pound" => Some('\u{00A3}'),
                "rarr" => Some('\u{2192}'),
                "larr" => Some('\u{2190}'),
                _ if name.starts_with("#x") || name.starts_with("#X") => {
                    u32::from_str_radix(&name[2..], 16).ok().and_then(char::from_u32)
                }
                _ if name.starts_with('#') => name[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out
}

struct Builder {
    blocks: Vec<Block>,
    current: Block,
}

impl Builder {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            current: Block {
                kind: BlockKind::Text,
                segments: Vec::new(),
            },
        }
    }

    fn start(&mut self, kind: BlockKind) {
        self.finish();
        self.current.kind = kind;
    }

    fn finish(&mut self) {
        let mut block = std::mem::replace(
            &mut self.current,
            Block {
                kind: BlockKind::Text,
                segments: Vec::new(),
            },
        );
        if block.kind != BlockKind::Preformatted {
            trim_block(&mut block);
        }
        if !block.segments.is_empty() {
            self.blocks.push(block);
        }
    }

    fn text(&mut self, text: String) {
        if !text.is_empty() {
            self.current.segments.push(Segment {
                text,
                emphasis: false,
            });
        }
    }
}

fn trim_block(block: &mut Block) {
    if let Some(first) = block.segments.first_mut() {
        first.text = first.text.trim_start().to_string();
    }
    if let Some(last) = block.segments.last_mut() {
        last.text = last.text.trim_end().to_string();
    }
    block.segments.retain(|s| !s.text.is_empty());
}

impl ContentRegion {
    pub fn from_html(path: impl Into<String>, html: &str) -> Self {
        let mut builder = Builder::new();
        let mut skipping: Option<String> = None;
        let mut pre_depth = 0usize;

        for caps in token_pattern().captures_iter(html) {
            let token = &caps[0];

            if let Some(tag) = caps.get(2) {
                let tag = tag.as_str().to_lowercase();
                let closing = !caps[1].is_empty();

                if let Some(skip) = &skipping {
                    if closing && *skip == tag {
                        skipping = None;
                    }
                    continue;
                }
                if !closing && (tag == "script" || tag == "style") {
                    skipping = Some(tag);
                    continue;
                }

                if tag == "pre" {
                    pre_depth = if closing { pre_depth.saturating_sub(1) } else { pre_depth + 1 };
                }

                if let Some(kind) = block_kind(&tag) {
                    if closing {
                        builder.finish();
                    } else {
                        builder.start(kind);
                    }
                }
                continue;
            }

            if skipping.is_some() || token.starts_with("<!--") {
                continue;
            }

            let decoded = decode_entities(token);
            if pre_depth > 0 {
                for (i, line) in decoded.split('\n').enumerate() {
                    if i > 0 {
                        builder.start(BlockKind::Preformatted);
                    }
                    builder.text(line.to_string());
                }
            } else {
                builder.text(collapse_whitespace(&decoded));
            }
        }
        builder.finish();

        Self {
            path: path.into(),
            blocks: builder.blocks,
            focus: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn emphasis_count(&self) -> usize {
        self.blocks
            .iter()
            .flat_map(|b| &b.segments)
            .filter(|s| s.emphasis)
            .count()
    }

    /// Index of the first block holding an emphasized segment.
    pub fn first_emphasis(&self) -> Option<usize> {
        self.blocks
            .iter()
            .position(|b| b.segments.iter().any(|s| s.emphasis))
    }

    pub fn set_focus(&mut self, block: usize) {
        self.focus = Some(block);
    }

    pub fn take_focus(&mut self) -> Option<usize> {
        self.focus.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_and_text_nodes() {
        let html = r#"
            <article>
              <h1>About me</h1>
              <p>I build <strong>fast</strong> things.</p>
              <ul><li>Rust</li><li>Python</li></ul>
            </article>"#;
        let region = ContentRegion::from_html("/about", html);
        let blocks = region.blocks();

        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0].kind, BlockKind::Heading);
        assert_eq!(blocks[0].plain_text(), "About me");
        assert_eq!(blocks[1].segments.len(), 3);
        assert_eq!(blocks[1].plain_text(), "I build fast things.");
        assert_eq!(blocks[2].kind, BlockKind::ListItem);
        assert_eq!(blocks[3].plain_text(), "Python");
    }

    #[test]
    fn test_scripts_and_comments_dropped() {
        let html = "<p>kept</p><script>var x = '<p>no</p>';</script><!-- hidden --><style>p{}</style>";
        let region = ContentRegion::from_html("/home", html);

        assert_eq!(region.plain_text(), "kept");
    }

    #[test]
    fn test_entities_decoded() {
        assert_eq!(decode_entities("a &amp; b &lt;c&gt; &#65;&#x42; &bogus;"), "a & b <c> AB &bogus;");
    }

    #[test]
    fn test_typographic_entities_decoded() {
        assert_eq!(
            decode_entities("it&rsquo;s &ldquo;fast&rdquo; &mdash; 2020&ndash;2024&hellip; &copy; me"),
            "it\u{2019}s \u{201C}fast\u{201D} \u{2014} 2020\u{2013}2024\u{2026} \u{00A9} me"
        );
    }

    #[test]
    fn test_decoded_entities_are_highlightable() {
        let mut region = ContentRegion::from_html("/blog/x", "<p>Rust&rsquo;s borrow checker</p>");
        assert_eq!(region.plain_text(), "Rust\u{2019}s borrow checker");
        assert_eq!(crate::highlight::highlight(&mut region, "rust\u{2019}s"), 1);
    }

    #[test]
    fn test_preformatted_keeps_lines() {
        let region = ContentRegion::from_html("/blog/x", "<pre>fn main() {\n    run();\n}</pre>");
        let blocks = region.blocks();

        assert_eq!(blocks.len(), 3);
        assert!(blocks.iter().all(|b| b.kind == BlockKind::Preformatted));
        assert_eq!(blocks[1].plain_text(), "    run();");
    }

    #[test]
    fn test_plain_fragment_without_tags() {
        let region = ContentRegion::from_html("/home", "  just   text  ");
        assert_eq!(region.plain_text(), "just text");
        assert_eq!(region.emphasis_count(), 0);
        assert_eq!(region.first_emphasis(), None);
    }
}
