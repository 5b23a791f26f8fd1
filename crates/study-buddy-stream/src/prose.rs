//! Prose extraction for consumers that only want spoken text.

use std::sync::OnceLock;

use regex::Regex;

fn fenced_block() -> &'static Regex {
    static FENCED: OnceLock<Regex> = OnceLock::new();
    FENCED.get_or_init(|| Regex::new(r"```[^`]*```").expect("fenced block pattern is valid"))
}

fn newline_run() -> &'static Regex {
    static NEWLINES: OnceLock<Regex> = OnceLock::new();
    NEWLINES.get_or_init(|| Regex::new(r"\n+").expect("newline pattern is valid"))
}

/// Text of a finished reply suitable for speech synthesis.
///
/// Fenced code blocks (diagrams, chart data, code) are removed and runs of
/// newlines collapse to a single space.
#[must_use]
pub fn narration_text(text: &str) -> String {
    let without_code = fenced_block().replace_all(text, "");
    newline_run()
        .replace_all(&without_code, " ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fenced_blocks() {
        let text = "Here is a diagram:\n```mermaid\ngraph TD\nA-->B\n```\nThat's it.";
        assert_eq!(narration_text(text), "Here is a diagram: That's it.");
    }

    #[test]
    fn strips_every_block() {
        let text = "a\n```rust\nfn x() {}\n```\nb\n```chart-json\n[]\n```";
        assert_eq!(narration_text(text), "a b");
    }

    #[test]
    fn collapses_newlines() {
        assert_eq!(narration_text("one\n\n\ntwo\nthree\n"), "one two three");
    }

    #[test]
    fn inline_code_is_kept() {
        assert_eq!(narration_text("use `map` here"), "use `map` here");
    }

    #[test]
    fn code_only_reply_is_empty() {
        assert_eq!(narration_text("```\nprint(1)\n```"), "");
    }
}
