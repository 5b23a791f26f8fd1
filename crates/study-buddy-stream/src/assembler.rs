//! Incremental assembly of an assistant reply.

use study_buddy_core::{Conversation, Upsert};

/// Accumulates content deltas for one assistant turn and mirrors the running
/// text into the conversation's tail.
#[derive(Debug, Default, Clone)]
pub struct MessageAssembler {
    assembled: String,
    updates: usize,
}

impl MessageAssembler {
    /// Start a new turn with empty text.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `delta` and write the running text into `conversation`.
    ///
    /// The trailing assistant message is replaced if there is one, otherwise
    /// a new assistant message is appended. An empty delta changes nothing
    /// and returns `None`.
    pub fn apply(&mut self, delta: &str, conversation: &mut Conversation) -> Option<Upsert> {
        if delta.is_empty() {
            return None;
        }
        self.assembled.push_str(delta);
        self.updates += 1;
        Some(conversation.upsert_assistant(&self.assembled))
    }

    /// Text assembled so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.assembled
    }

    /// Number of conversation updates made.
    #[must_use]
    pub const fn updates(&self) -> usize {
        self.updates
    }

    /// Freeze the turn and return its final text.
    #[must_use]
    pub fn finish(self) -> String {
        self.assembled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use study_buddy_core::Role;

    fn replay(deltas: &[&str]) -> (String, Conversation) {
        let mut conversation = Conversation::new();
        conversation.push_user("explain recursion").unwrap();
        let mut assembler = MessageAssembler::new();
        for delta in deltas {
            assembler.apply(delta, &mut conversation);
        }
        (assembler.finish(), conversation)
    }

    #[test]
    fn first_delta_appends_then_replaces() {
        let mut conversation = Conversation::new();
        conversation.push_user("hi").unwrap();
        let mut assembler = MessageAssembler::new();

        assert_eq!(assembler.apply("Hello", &mut conversation), Some(Upsert::Appended));
        assert_eq!(assembler.apply(" world", &mut conversation), Some(Upsert::Replaced));

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.last().unwrap().role, Role::Assistant);
        assert_eq!(conversation.last().unwrap().content, "Hello world");
        assert_eq!(assembler.updates(), 2);
    }

    #[test]
    fn empty_delta_is_a_no_op() {
        let mut conversation = Conversation::new();
        conversation.push_user("hi").unwrap();
        let mut assembler = MessageAssembler::new();

        assert_eq!(assembler.apply("", &mut conversation), None);
        assert_eq!(conversation.len(), 1);
        assert_eq!(assembler.updates(), 0);
    }

    #[test]
    fn replay_is_deterministic() {
        let deltas = ["A recursive ", "function calls ", "itself."];
        let (first, first_conversation) = replay(&deltas);
        let (second, second_conversation) = replay(&deltas);
        assert_eq!(first, "A recursive function calls itself.");
        assert_eq!(first, second);
        assert_eq!(first_conversation, second_conversation);
    }

    #[test]
    fn running_text_is_always_a_prefix_of_the_final_text() {
        let deltas = ["one ", "two ", "three"];
        let mut conversation = Conversation::new();
        let mut assembler = MessageAssembler::new();
        let mut seen = Vec::new();
        for delta in deltas {
            assembler.apply(delta, &mut conversation);
            seen.push(conversation.last().unwrap().content.clone());
        }
        let last = assembler.finish();
        assert!(seen.iter().all(|text| last.starts_with(text.as_str())));
    }
}
