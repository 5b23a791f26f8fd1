//! Render sink that writes to a terminal.

use std::io::{self, Write};

use crossterm::style::{Color, Stylize};

use super::chart::ChartData;
use super::markdown::{render_markdown, StyledLine, SyntaxHighlighter};
use super::{RenderSink, INVALID_CHART};

/// Widest frame drawn around diagrams and charts.
const MAX_FRAME_WIDTH: usize = 60;

/// Writes rendered replies to `out`, with ANSI styling unless `color` is off.
pub struct TerminalSink<W> {
    out: W,
    width: usize,
    color: bool,
    highlighter: SyntaxHighlighter,
}

impl<W: Write> TerminalSink<W> {
    /// Create a sink that renders for a terminal `width` columns wide.
    pub fn new(out: W, width: usize, color: bool) -> Self {
        Self {
            out,
            width,
            color,
            highlighter: SyntaxHighlighter::new(),
        }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Update the width after a resize.
    pub fn set_width(&mut self, width: usize) {
        self.width = width;
    }

    fn write_line(&mut self, line: &StyledLine) -> io::Result<()> {
        let text = if self.color { line.ansi() } else { line.plain() };
        writeln!(self.out, "{text}")
    }

    fn frame_width(&self) -> usize {
        self.width.saturating_sub(2).min(MAX_FRAME_WIDTH)
    }

    fn frame_top(&mut self, title: &str) -> io::Result<()> {
        let rule = "─".repeat(self.frame_width().saturating_sub(title.chars().count() + 3));
        if self.color {
            writeln!(
                self.out,
                "{}{}{}",
                "┌─ ".with(Color::DarkGrey),
                title.with(Color::Cyan).bold(),
                format!(" {rule}").with(Color::DarkGrey)
            )
        } else {
            writeln!(self.out, "┌─ {title} {rule}")
        }
    }

    fn frame_line(&mut self, text: &str) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{}{text}", "│ ".with(Color::DarkGrey))
        } else {
            writeln!(self.out, "│ {text}")
        }
    }

    fn frame_bottom(&mut self) -> io::Result<()> {
        let rule = format!("└{}", "─".repeat(self.frame_width()));
        if self.color {
            writeln!(self.out, "{}", rule.with(Color::DarkGrey))
        } else {
            writeln!(self.out, "{rule}")
        }
    }
}

impl<W: Write> RenderSink for TerminalSink<W> {
    fn diagram(&mut self, source: &str) -> io::Result<()> {
        self.frame_top("mermaid diagram")?;
        for line in source.lines() {
            self.frame_line(line)?;
        }
        self.frame_bottom()?;
        self.out.flush()
    }

    fn chart(&mut self, chart: &ChartData) -> io::Result<()> {
        let title = format!("chart: {} by {}", chart.y_key, chart.x_key);
        self.frame_top(&title)?;
        for line in chart.to_lines(self.frame_width().saturating_sub(2)) {
            self.frame_line(&line)?;
        }
        self.frame_bottom()?;
        self.out.flush()
    }

    fn invalid_chart(&mut self) -> io::Result<()> {
        if self.color {
            writeln!(self.out, "{}", INVALID_CHART.with(Color::Red))?;
        } else {
            writeln!(self.out, "{INVALID_CHART}")?;
        }
        self.out.flush()
    }

    fn markdown(&mut self, text: &str) -> io::Result<()> {
        let lines = render_markdown(text, self.width, &self.highlighter);
        for line in &lines {
            self.write_line(line)?;
        }
        self.out.flush()
    }
}
