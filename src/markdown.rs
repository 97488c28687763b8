//! Markdown to Notion block conversion.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use serde_json::{json, Value};

use crate::notion::ContentBlock;

/// Notion caps a single rich text segment at this many characters.
pub const MAX_RICH_TEXT_CHARS: usize = 2000;

/// Languages Notion code blocks accept, after alias normalization.
const CODE_LANGUAGES: &[&str] = &[
    "bash",
    "c",
    "c#",
    "c++",
    "css",
    "diff",
    "docker",
    "go",
    "graphql",
    "haskell",
    "html",
    "java",
    "javascript",
    "json",
    "kotlin",
    "lua",
    "makefile",
    "markdown",
    "php",
    "plain text",
    "python",
    "ruby",
    "rust",
    "scala",
    "shell",
    "sql",
    "swift",
    "toml",
    "typescript",
    "xml",
    "yaml",
];

/// Converts markdown text into an ordered sequence of content blocks.
pub trait MarkdownConverter: Send + Sync {
    fn convert(&self, markdown: &str) -> Vec<ContentBlock>;
}

/// pulldown-cmark based converter producing Notion block objects.
///
/// Nested lists are flattened into reading order; tables become one
/// paragraph per row with cells separated by ` | `.
#[derive(Debug, Clone)]
pub struct NotionMarkdownConverter {
    options: Options,
}

impl Default for NotionMarkdownConverter {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }
}

impl MarkdownConverter for NotionMarkdownConverter {
    fn convert(&self, markdown: &str) -> Vec<ContentBlock> {
        let mut builder = BlockBuilder::default();
        for event in Parser::new_ext(markdown, self.options) {
            builder.handle(event);
        }
        builder.finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Leaf {
    Paragraph,
    Heading(u8),
    ListItem { ordered: bool },
    ToDo { checked: bool },
    Quote,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Annotations {
    bold: bool,
    italic: bool,
    strikethrough: bool,
    code: bool,
}

#[derive(Debug)]
struct Span {
    text: String,
    annotations: Annotations,
}

#[derive(Debug, Default)]
struct BlockBuilder {
    blocks: Vec<ContentBlock>,
    spans: Vec<Span>,
    leaf: Option<Leaf>,
    lists: Vec<bool>,
    quote_depth: usize,
    bold: usize,
    italic: usize,
    strikethrough: usize,
    code: Option<(String, String)>,
}

impl BlockBuilder {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush();
                self.leaf = Some(Leaf::Heading(heading_level_to_int(level)));
            }
            Event::End(TagEnd::Heading(_)) => self.flush(),
            Event::Start(Tag::Paragraph) => {
                if self.leaf.is_none() {
                    self.leaf = Some(self.default_leaf());
                }
            }
            Event::End(TagEnd::Paragraph) => match self.leaf {
                Some(Leaf::Paragraph) => self.flush(),
                // Paragraphs inside items and quotes join into one block.
                _ => self.push_text("\n"),
            },
            Event::Start(Tag::List(first)) => {
                self.flush();
                self.lists.push(first.is_some());
            }
            Event::End(TagEnd::List(_)) => {
                self.flush();
                self.lists.pop();
            }
            Event::Start(Tag::Item) => {
                self.flush();
                let ordered = self.lists.last().copied().unwrap_or(false);
                self.leaf = Some(Leaf::ListItem { ordered });
            }
            Event::End(TagEnd::Item) => self.flush(),
            Event::TaskListMarker(checked) => {
                self.leaf = Some(Leaf::ToDo { checked });
            }
            Event::Start(Tag::BlockQuote) => {
                self.flush();
                self.quote_depth += 1;
                self.leaf = Some(Leaf::Quote);
            }
            Event::End(TagEnd::BlockQuote) => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                self.flush();
                let language = match kind {
                    CodeBlockKind::Fenced(info) => {
                        info.split_whitespace().next().unwrap_or("").to_string()
                    }
                    CodeBlockKind::Indented => String::new(),
                };
                self.code = Some((language, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, content)) = self.code.take() {
                    let rich_text = rich_text(&[Span {
                        text: content.trim_end_matches('\n').to_string(),
                        annotations: Annotations::default(),
                    }]);
                    self.blocks.push(ContentBlock::new(
                        "code",
                        json!({
                            "rich_text": rich_text,
                            "language": normalize_language(&language),
                        }),
                    ));
                }
            }
            Event::Start(Tag::Table(_)) => self.flush(),
            Event::Start(Tag::TableHead) | Event::Start(Tag::TableRow) => {
                self.flush();
                self.leaf = Some(Leaf::Paragraph);
            }
            Event::End(TagEnd::TableCell) => self.push_text(" | "),
            Event::End(TagEnd::TableHead) | Event::End(TagEnd::TableRow) => {
                if let Some(last) = self.spans.last_mut() {
                    if let Some(stripped) = last.text.strip_suffix(" | ") {
                        last.text = stripped.to_string();
                    }
                }
                self.flush();
            }
            Event::Start(Tag::Strong) => self.bold += 1,
            Event::End(TagEnd::Strong) => self.bold = self.bold.saturating_sub(1),
            Event::Start(Tag::Emphasis) => self.italic += 1,
            Event::End(TagEnd::Emphasis) => self.italic = self.italic.saturating_sub(1),
            Event::Start(Tag::Strikethrough) => self.strikethrough += 1,
            Event::End(TagEnd::Strikethrough) => {
                self.strikethrough = self.strikethrough.saturating_sub(1)
            }
            Event::Text(text) => {
                if let Some((_, content)) = self.code.as_mut() {
                    content.push_str(&text);
                } else {
                    self.push_text(&text);
                }
            }
            Event::Code(text) => {
                let annotations = Annotations {
                    code: true,
                    ..self.annotations()
                };
                self.push_span(&text, annotations);
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                if let Some((_, content)) = self.code.as_mut() {
                    content.push_str(&html);
                } else {
                    self.push_text(&html);
                }
            }
            Event::SoftBreak => self.push_text(" "),
            Event::HardBreak => self.push_text("\n"),
            Event::Rule => {
                self.flush();
                self.blocks.push(ContentBlock::new("divider", json!({})));
            }
            _ => {}
        }
    }

    fn default_leaf(&self) -> Leaf {
        if self.quote_depth > 0 {
            Leaf::Quote
        } else {
            Leaf::Paragraph
        }
    }

    fn annotations(&self) -> Annotations {
        Annotations {
            bold: self.bold > 0,
            italic: self.italic > 0,
            strikethrough: self.strikethrough > 0,
            code: false,
        }
    }

    fn push_text(&mut self, text: &str) {
        let annotations = self.annotations();
        self.push_span(text, annotations);
    }

    fn push_span(&mut self, text: &str, annotations: Annotations) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.annotations == annotations => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.to_string(),
                annotations,
            }),
        }
    }

    /// Emit the pending leaf block, if it has any visible text.
    fn flush(&mut self) {
        let leaf = self.leaf.take().unwrap_or_else(|| self.default_leaf());
        let mut spans = std::mem::take(&mut self.spans);

        while let Some(last) = spans.last_mut() {
            let trimmed = last.text.trim_end().len();
            last.text.truncate(trimmed);
            if last.text.is_empty() {
                spans.pop();
            } else {
                break;
            }
        }
        if let Some(first) = spans.first_mut() {
            first.text = first.text.trim_start().to_string();
        }
        if spans.iter().all(|s| s.text.trim().is_empty()) {
            return;
        }

        let rich_text = rich_text(&spans);
        let block = match leaf {
            Leaf::Paragraph => ContentBlock::new("paragraph", json!({ "rich_text": rich_text })),
            Leaf::Heading(level) => ContentBlock::new(
                &format!("heading_{}", level),
                json!({ "rich_text": rich_text }),
            ),
            Leaf::ListItem { ordered: true } => {
                ContentBlock::new("numbered_list_item", json!({ "rich_text": rich_text }))
            }
            Leaf::ListItem { ordered: false } => {
                ContentBlock::new("bulleted_list_item", json!({ "rich_text": rich_text }))
            }
            Leaf::ToDo { checked } => ContentBlock::new(
                "to_do",
                json!({ "rich_text": rich_text, "checked": checked }),
            ),
            Leaf::Quote => ContentBlock::new("quote", json!({ "rich_text": rich_text })),
        };
        self.blocks.push(block);
    }

    fn finish(mut self) -> Vec<ContentBlock> {
        self.flush();
        self.blocks
    }
}

fn heading_level_to_int(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        _ => 3,
    }
}

/// Map a fence info string onto a language Notion accepts.
fn normalize_language(language: &str) -> &'static str {
    let lower = language.to_lowercase();
    let alias = match lower.as_str() {
        "rs" => "rust",
        "js" | "jsx" | "mjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "py" => "python",
        "rb" => "ruby",
        "sh" | "zsh" | "console" => "shell",
        "yml" => "yaml",
        "md" => "markdown",
        "dockerfile" => "docker",
        "cpp" | "cxx" => "c++",
        "cs" | "csharp" => "c#",
        "golang" => "go",
        "make" => "makefile",
        other => other,
    };
    CODE_LANGUAGES
        .iter()
        .find(|known| **known == alias)
        .copied()
        .unwrap_or("plain text")
}

/// Build rich text segments, splitting any that exceed the Notion limit.
fn rich_text(spans: &[Span]) -> Vec<Value> {
    let mut segments = Vec::new();
    for span in spans {
        let chars: Vec<char> = span.text.chars().collect();
        for chunk in chars.chunks(MAX_RICH_TEXT_CHARS) {
            let content: String = chunk.iter().collect();
            segments.push(json!({
                "type": "text",
                "text": { "content": content },
                "annotations": {
                    "bold": span.annotations.bold,
                    "italic": span.annotations.italic,
                    "strikethrough": span.annotations.strikethrough,
                    "underline": false,
                    "code": span.annotations.code,
                    "color": "default",
                },
            }));
        }
    }
    segments
}
