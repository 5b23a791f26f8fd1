//! Markdown to styled terminal lines.
//!
//! Converts markdown text to lines of styled spans for terminal display,
//! with syntax highlighting for code blocks.

use crossterm::style::{Attribute, Color, ContentStyle};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const THEME: &str = "base16-ocean.dark";

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledSpan {
    /// The text.
    pub text: String,
    /// Its style.
    pub style: ContentStyle,
}

impl StyledSpan {
    fn new(text: impl Into<String>, style: ContentStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// One rendered terminal line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyledLine {
    /// Spans, left to right.
    pub spans: Vec<StyledSpan>,
}

impl StyledLine {
    fn from_spans(spans: Vec<StyledSpan>) -> Self {
        Self { spans }
    }

    /// Whether the line has no spans.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// The line's text without styling.
    #[must_use]
    pub fn plain(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    /// The line's text with ANSI escape sequences.
    #[must_use]
    pub fn ansi(&self) -> String {
        self.spans
            .iter()
            .map(|span| {
                if span.style == ContentStyle::default() {
                    span.text.clone()
                } else {
                    span.style.apply(&span.text).to_string()
                }
            })
            .collect()
    }
}

fn fg(color: Color) -> ContentStyle {
    let mut style = ContentStyle::new();
    style.foreground_color = Some(color);
    style
}

fn with_attribute(mut style: ContentStyle, attribute: Attribute) -> ContentStyle {
    style.attributes.set(attribute);
    style
}

/// Syntax highlighter using syntect.
pub struct SyntaxHighlighter {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
}

impl Default for SyntaxHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntaxHighlighter {
    /// Load the bundled syntaxes and themes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
        }
    }

    /// Highlight code and return styled spans for each line.
    fn highlight(&self, code: &str, lang: &str) -> Vec<Vec<StyledSpan>> {
        let Some(theme) = self.theme_set.themes.get(THEME) else {
            return code
                .lines()
                .map(|line| vec![StyledSpan::new(line, fg(Color::Yellow))])
                .collect();
        };

        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut highlighter = HighlightLines::new(syntax, theme);
        let mut result = Vec::new();

        for line in LinesWithEndings::from(code) {
            let mut spans = Vec::new();

            match highlighter.highlight_line(line, &self.syntax_set) {
                Ok(ranges) => {
                    for (style, text) in ranges {
                        let mut span_style = fg(Color::Rgb {
                            r: style.foreground.r,
                            g: style.foreground.g,
                            b: style.foreground.b,
                        });
                        if style.font_style.contains(FontStyle::BOLD) {
                            span_style = with_attribute(span_style, Attribute::Bold);
                        }
                        if style.font_style.contains(FontStyle::ITALIC) {
                            span_style = with_attribute(span_style, Attribute::Italic);
                        }
                        if style.font_style.contains(FontStyle::UNDERLINE) {
                            span_style = with_attribute(span_style, Attribute::Underlined);
                        }

                        let text = text.trim_end_matches('\n').trim_end_matches('\r');
                        if !text.is_empty() {
                            spans.push(StyledSpan::new(text, span_style));
                        }
                    }
                }
                Err(_) => {
                    let text = line.trim_end_matches('\n').trim_end_matches('\r');
                    spans.push(StyledSpan::new(text, fg(Color::Yellow)));
                }
            }

            result.push(spans);
        }

        result
    }
}

/// Convert markdown text to styled lines.
///
/// `available_width` bounds code blocks: code lines longer than this are
/// truncated rather than wrapped so the line-number gutter stays aligned.
#[must_use]
pub fn render_markdown(
    text: &str,
    available_width: usize,
    highlighter: &SyntaxHighlighter,
) -> Vec<StyledLine> {
    MarkdownRenderer::new(available_width, highlighter).render(text)
}

/// Markdown renderer state.
struct MarkdownRenderer<'h> {
    lines: Vec<StyledLine>,
    current_spans: Vec<StyledSpan>,
    style_stack: Vec<ContentStyle>,
    in_code_block: bool,
    code_block_content: String,
    code_block_lang: Option<String>,
    list_depth: usize,
    ordered_list_index: Option<u64>,
    link_url: Option<String>,
    available_width: usize,
    highlighter: &'h SyntaxHighlighter,
}

impl<'h> MarkdownRenderer<'h> {
    fn new(available_width: usize, highlighter: &'h SyntaxHighlighter) -> Self {
        Self {
            lines: Vec::new(),
            current_spans: Vec::new(),
            style_stack: vec![ContentStyle::new()],
            in_code_block: false,
            code_block_content: String::new(),
            code_block_lang: None,
            list_depth: 0,
            ordered_list_index: None,
            link_url: None,
            available_width,
            highlighter,
        }
    }

    fn current_style(&self) -> ContentStyle {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_attribute(&mut self, attribute: Attribute) {
        let style = with_attribute(self.current_style(), attribute);
        self.style_stack.push(style);
    }

    fn push_color(&mut self, color: Color) {
        let mut style = self.current_style();
        style.foreground_color = Some(color);
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn flush_line(&mut self) {
        if !self.current_spans.is_empty() {
            let spans = std::mem::take(&mut self.current_spans);
            self.lines.push(StyledLine::from_spans(spans));
        }
    }

    fn add_blank_line(&mut self) {
        self.flush_line();
        self.lines.push(StyledLine::default());
    }

    fn add_text(&mut self, text: &str) {
        if self.in_code_block {
            self.code_block_content.push_str(text);
            return;
        }

        let style = self.current_style();

        let parts: Vec<&str> = text.split('\n').collect();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                self.flush_line();
                // Consecutive newlines are a deliberate blank line.
                if part.is_empty() && i < parts.len() - 1 {
                    self.lines.push(StyledLine::default());
                }
            }

            if !part.is_empty() {
                self.current_spans.push(StyledSpan::new(*part, style));
            }
        }
    }

    fn render_code_block(&mut self) {
        let content = std::mem::take(&mut self.code_block_content);
        let lang = self.code_block_lang.take().unwrap_or_default();

        self.flush_line();

        let gutter_style = fg(Color::DarkGrey);
        let line_num_style = fg(Color::Rgb {
            r: 100,
            g: 100,
            b: 100,
        });

        let num_lines = content.lines().count();
        let show_line_nums = num_lines > 1;
        let line_num_width = if show_line_nums {
            num_lines.to_string().len()
        } else {
            0
        };

        // "│ " + line number + " │ ", or "│ " plus padding
        let prefix_width = if show_line_nums {
            2 + line_num_width + 3
        } else {
            4
        };
        let max_code_width = self.available_width.saturating_sub(prefix_width + 2);

        if lang.is_empty() {
            self.lines.push(StyledLine::from_spans(vec![
                StyledSpan::new("┌", gutter_style),
                StyledSpan::new(
                    "─".repeat(self.available_width.saturating_sub(2).min(44)),
                    gutter_style,
                ),
            ]));
        } else {
            self.lines.push(StyledLine::from_spans(vec![
                StyledSpan::new("┌─ ", gutter_style),
                StyledSpan::new(lang.clone(), with_attribute(fg(Color::Cyan), Attribute::Bold)),
                StyledSpan::new(" ", gutter_style),
                StyledSpan::new(
                    "─".repeat(self.available_width.saturating_sub(lang.len() + 5).min(40)),
                    gutter_style,
                ),
            ]));
        }

        let highlighted_lines = self.highlighter.highlight(&content, &lang);

        for (i, highlighted_spans) in highlighted_lines.into_iter().enumerate() {
            let mut spans = vec![StyledSpan::new("│ ", gutter_style)];

            if show_line_nums {
                spans.push(StyledSpan::new(
                    format!("{:>line_num_width$}", i + 1),
                    line_num_style,
                ));
                spans.push(StyledSpan::new(" │ ", gutter_style));
            }

            let code_width: usize = highlighted_spans.iter().map(|s| s.text.chars().count()).sum();

            if code_width <= max_code_width {
                spans.extend(highlighted_spans);
            } else {
                let mut remaining = max_code_width.saturating_sub(1); // room for the ellipsis
                for span in highlighted_spans {
                    if remaining == 0 {
                        break;
                    }
                    let len = span.text.chars().count();
                    if len <= remaining {
                        remaining -= len;
                        spans.push(span);
                    } else {
                        let truncated: String = span.text.chars().take(remaining).collect();
                        spans.push(StyledSpan::new(truncated, span.style));
                        remaining = 0;
                    }
                }
                spans.push(StyledSpan::new("…", gutter_style));
            }

            self.lines.push(StyledLine::from_spans(spans));
        }

        self.lines.push(StyledLine::from_spans(vec![
            StyledSpan::new("└", gutter_style),
            StyledSpan::new(
                "─".repeat(self.available_width.saturating_sub(2).min(44)),
                gutter_style,
            ),
        ]));
        self.lines.push(StyledLine::default());
    }

    fn render(mut self, text: &str) -> Vec<StyledLine> {
        let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
        let parser = Parser::new_ext(text, options);

        for event in parser {
            match event {
                Event::Start(tag) => self.handle_start_tag(tag),
                Event::End(tag) => self.handle_end_tag(tag),
                Event::Text(text) => self.add_text(&text),
                Event::Code(code) => {
                    let mut style = fg(Color::Yellow);
                    style.background_color = Some(Color::Rgb {
                        r: 40,
                        g: 40,
                        b: 40,
                    });
                    self.current_spans.push(StyledSpan::new(format!("`{code}`"), style));
                }
                // Soft breaks keep the author's line layout in a terminal.
                Event::SoftBreak | Event::HardBreak => self.flush_line(),
                Event::Rule => {
                    self.flush_line();
                    self.lines.push(StyledLine::from_spans(vec![StyledSpan::new(
                        "─".repeat(self.available_width.min(60)),
                        fg(Color::DarkGrey),
                    )]));
                }
                _ => {}
            }
        }

        self.flush_line();

        while self.lines.last().is_some_and(StyledLine::is_empty) {
            self.lines.pop();
        }

        self.lines
    }

    fn handle_start_tag(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { level, .. } => {
                if !self.lines.is_empty() || !self.current_spans.is_empty() {
                    self.add_blank_line();
                }

                let prefix = match level {
                    HeadingLevel::H1 => "# ",
                    HeadingLevel::H2 => "## ",
                    HeadingLevel::H3 => "### ",
                    _ => "#### ",
                };

                self.current_spans
                    .push(StyledSpan::new(prefix, fg(Color::Magenta)));
                self.push_attribute(Attribute::Bold);
                self.push_color(Color::Magenta);
            }
            Tag::Paragraph => {
                if !self.lines.is_empty() && !self.current_spans.is_empty() {
                    self.flush_line();
                }
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.current_spans.push(StyledSpan::new("│ ", fg(Color::Blue)));
                self.push_color(Color::Blue);
            }
            Tag::CodeBlock(kind) => {
                self.in_code_block = true;
                self.code_block_content.clear();
                self.code_block_lang = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    CodeBlockKind::Fenced(_) | CodeBlockKind::Indented => None,
                };
            }
            Tag::List(first_item) => {
                self.list_depth += 1;
                self.ordered_list_index = first_item;
                if self.list_depth == 1 && !self.lines.is_empty() {
                    self.flush_line();
                }
            }
            Tag::Item => {
                let indent = "  ".repeat(self.list_depth.saturating_sub(1));
                let bullet = if let Some(idx) = self.ordered_list_index.as_mut() {
                    let bullet = format!("{indent}{idx}. ");
                    *idx += 1;
                    bullet
                } else {
                    format!("{indent}• ")
                };
                self.current_spans.push(StyledSpan::new(bullet, fg(Color::Cyan)));
            }
            Tag::Emphasis => self.push_attribute(Attribute::Italic),
            Tag::Strong => self.push_attribute(Attribute::Bold),
            Tag::Strikethrough => self.push_attribute(Attribute::CrossedOut),
            Tag::Link { dest_url, .. } => {
                self.push_attribute(Attribute::Underlined);
                self.push_color(Color::Blue);
                self.link_url = Some(dest_url.to_string());
            }
            _ => {}
        }
    }

    fn handle_end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                self.pop_style(); // color
                self.pop_style(); // bold
                self.flush_line();
            }
            TagEnd::Paragraph => self.add_blank_line(),
            TagEnd::BlockQuote(_) => {
                self.pop_style();
                self.flush_line();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.render_code_block();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_depth = self.list_depth.saturating_sub(1);
                if self.list_depth == 0 {
                    self.ordered_list_index = None;
                    self.add_blank_line();
                }
            }
            TagEnd::Item | TagEnd::TableHead | TagEnd::TableRow => self.flush_line(),
            TagEnd::TableCell => {
                self.current_spans.push(StyledSpan::new(" │ ", fg(Color::DarkGrey)));
            }
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => self.pop_style(),
            TagEnd::Link => {
                self.pop_style(); // color
                self.pop_style(); // underline
                if let Some(url) = self.link_url.take() {
                    self.current_spans
                        .push(StyledSpan::new(format!(" ({url})"), fg(Color::DarkGrey)));
                }
            }
            _ => {}
        }
    }
}
