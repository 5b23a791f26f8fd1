//! Rendering of finished tutor replies.
//!
//! A reply is shown by exactly one collaborator, chosen in priority order:
//!
//! 1. a ```` ```mermaid ```` block goes to the diagram renderer,
//! 2. else a ```` ```chart-json ```` block goes to the chart renderer (or the
//!    "Invalid chart data" fallback when it does not parse),
//! 3. else the whole reply is rendered as Markdown.
//!
//! Only the first matching block is used.

pub mod chart;
pub mod markdown;
pub mod terminal;

use std::io;
use std::sync::OnceLock;

use regex::Regex;

pub use chart::ChartData;
pub use terminal::TerminalSink;

/// Text shown in place of chart data that cannot be used.
pub const INVALID_CHART: &str = "Invalid chart data";

/// What a reply should be rendered as.
#[derive(Debug, Clone, PartialEq)]
pub enum Content<'a> {
    /// Source of a mermaid diagram.
    Diagram(&'a str),
    /// A bar chart.
    Chart(ChartData),
    /// A chart block whose contents could not be used.
    InvalidChart,
    /// Plain Markdown.
    Markdown(&'a str),
}

/// The collaborators a reply can be handed to.
pub trait RenderSink {
    /// Render a diagram from its source.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn diagram(&mut self, source: &str) -> io::Result<()>;

    /// Render a bar chart.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn chart(&mut self, chart: &ChartData) -> io::Result<()>;

    /// Show the visible fallback for unusable chart data.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn invalid_chart(&mut self) -> io::Result<()>;

    /// Render Markdown.
    ///
    /// # Errors
    ///
    /// Returns an error if output fails.
    fn markdown(&mut self, text: &str) -> io::Result<()>;
}

fn mermaid_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)```mermaid\n(.*?)```").expect("valid mermaid regex"))
}

fn chart_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)```chart-json\n(.*?)```").expect("valid chart regex"))
}

/// Decide how `text` should be rendered.
#[must_use]
pub fn classify(text: &str) -> Content<'_> {
    if let Some(source) = mermaid_block().captures(text).and_then(|c| c.get(1)) {
        return Content::Diagram(source.as_str());
    }

    if let Some(body) = chart_block().captures(text).and_then(|c| c.get(1)) {
        return match serde_json::from_str(body.as_str()) {
            Ok(value) => ChartData::from_json(value).map_or(Content::InvalidChart, Content::Chart),
            Err(err) => {
                tracing::debug!(error = %err, "Chart block is not valid JSON");
                Content::InvalidChart
            }
        };
    }

    Content::Markdown(text)
}

/// Render `text` through exactly one collaborator of `sink`.
///
/// # Errors
///
/// Returns an error if writing to the sink fails.
pub fn render(text: &str, sink: &mut impl RenderSink) -> io::Result<()> {
    match classify(text) {
        Content::Diagram(source) => sink.diagram(source),
        Content::Chart(chart) => sink.chart(&chart),
        Content::InvalidChart => sink.invalid_chart(),
        Content::Markdown(text) => sink.markdown(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl RenderSink for Recorder {
        fn diagram(&mut self, source: &str) -> io::Result<()> {
            self.calls.push(format!("diagram:{source}"));
            Ok(())
        }

        fn chart(&mut self, chart: &ChartData) -> io::Result<()> {
            self.calls.push(format!("chart:{}", chart.rows.len()));
            Ok(())
        }

        fn invalid_chart(&mut self) -> io::Result<()> {
            self.calls.push(INVALID_CHART.to_string());
            Ok(())
        }

        fn markdown(&mut self, text: &str) -> io::Result<()> {
            self.calls.push(format!("markdown:{text}"));
            Ok(())
        }
    }

    fn rendered(text: &str) -> Vec<String> {
        let mut sink = Recorder::default();
        render(text, &mut sink).unwrap();
        sink.calls
    }

    #[test]
    fn diagram_wins_over_prose() {
        let text = "Here is the flow:\n```mermaid\ngraph TD; A-->B\n```\nHope that helps!";
        assert_eq!(rendered(text), vec!["diagram:graph TD; A-->B\n"]);
    }

    #[test]
    fn diagram_tag_is_case_insensitive() {
        let text = "```Mermaid\nflowchart LR\n```";
        assert_eq!(classify(text), Content::Diagram("flowchart LR\n"));
    }

    #[test]
    fn diagram_wins_over_chart() {
        let text = "```chart-json\n[]\n```\n```mermaid\npie\n```";
        assert_eq!(classify(text), Content::Diagram("pie\n"));
    }

    #[test]
    fn chart_block_is_parsed() {
        let text = "Scores:\n```chart-json\n[{\"name\":\"A\",\"value\":3}]\n```";
        assert_eq!(
            classify(text),
            Content::Chart(ChartData::new(vec![json!({ "name": "A", "value": 3 })]))
        );
        assert_eq!(rendered(text), vec!["chart:1"]);
    }

    #[test]
    fn invalid_chart_json_shows_fallback() {
        let text = "```chart-json\n[{\"name\": \n```";
        assert_eq!(rendered(text), vec![INVALID_CHART]);
    }

    #[test]
    fn non_array_chart_shows_fallback() {
        let text = "```chart-json\n{\"name\":\"A\"}\n```";
        assert_eq!(classify(text), Content::InvalidChart);
    }

    #[test]
    fn plain_reply_is_markdown() {
        let text = "**Mitochondria** are the powerhouse of the cell.\n```rust\nfn main() {}\n```";
        assert_eq!(classify(text), Content::Markdown(text));
    }

    #[test]
    fn unterminated_block_is_markdown() {
        let text = "```mermaid\ngraph TD";
        assert_eq!(classify(text), Content::Markdown(text));
    }
}
