//! Tutor system prompt.
//!
//! The prompt adapts to the learner's language and communication style and
//! carries the current study topic plus a slice of background material.

use std::fmt::Write as _;

use serde::Serialize;
use study_buddy_core::{ConversationMessage, Role};

/// Background context beyond this many characters is cut off.
pub const MAX_CONTEXT_CHARS: usize = 1500;

/// A message in the upstream request, where `system` is also a valid role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptMessage {
    /// `system`, `user` or `assistant`.
    pub role: &'static str,
    /// Message text.
    pub content: String,
}

impl PromptMessage {
    /// A conversation message with the given role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role: role.as_str(),
            content: content.into(),
        }
    }

    /// The system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }
}

impl From<&ConversationMessage> for PromptMessage {
    fn from(message: &ConversationMessage) -> Self {
        Self::new(message.role, message.content.clone())
    }
}

/// How the learner tends to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommunicationStyle {
    /// Excited, lots of exclamation marks.
    Enthusiastic,
    /// Curious, wants depth.
    Inquisitive,
    /// Terse.
    Brief,
    /// No strong signal.
    Neutral,
}

impl CommunicationStyle {
    /// Parse a wire name. Unknown names yield `None`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "enthusiastic" => Some(Self::Enthusiastic),
            "inquisitive" => Some(Self::Inquisitive),
            "brief" => Some(Self::Brief),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    /// Guideline in `language`, falling back to English.
    #[must_use]
    pub fn guideline(self, language: &str) -> &'static str {
        let table: &[(&str, &str)] = match self {
            Self::Enthusiastic => ENTHUSIASTIC,
            Self::Inquisitive => INQUISITIVE,
            Self::Brief => BRIEF,
            Self::Neutral => NEUTRAL,
        };
        lookup(table, language)
            .or_else(|| lookup(table, "en"))
            .unwrap_or(FALLBACK_GUIDELINE)
    }
}

const FALLBACK_GUIDELINE: &str = "Be helpful and clear in your response.";

const GREETINGS: &[(&str, &str)] = &[
    ("en", "Hello there! 👋"),
    ("hi", "नमस्ते! 🙏"),
    ("es", "¡Hola! 👋"),
    ("fr", "Bonjour! 👋"),
    ("de", "Hallo! 👋"),
    ("pt", "Olá! 👋"),
    ("ja", "こんにちは! 👋"),
    ("zh", "你好! 👋"),
];

const ENTHUSIASTIC: &[(&str, &str)] = &[
    ("en", "Match the enthusiasm with excitement! Use relevant emojis 🎉 and exclamation marks! Keep it energetic!"),
    ("hi", "उत्साह के साथ मिलान करें! 🎉 प्रासंगिक इमोजी और विस्मयादिबोधक चिह्न का उपयोग करें! इसे ऊर्जावान रखें!"),
    ("es", "¡Coincide con el entusiasmo! Usa emojis relevantes 🎉 ¡Mantenlo energético!"),
    ("fr", "Correspondez à l'enthousiasme! Utilisez des emojis pertinents 🎉 Restez énergique!"),
    ("de", "Passen Sie sich der Begeisterung an! Verwenden Sie relevante Emojis 🎉 Halten Sie es energisch!"),
    ("pt", "Combine o entusiasmo! Use emojis relevantes 🎉 Mantenha-o energético!"),
    ("ja", "興奮を合わせてください! 関連する絵文字を使用してください 🎉 元気を保ってください!"),
    ("zh", "与热情相匹配! 使用相关的表情符号 🎉 保持活力!"),
];

const INQUISITIVE: &[(&str, &str)] = &[
    ("en", "Your friend is curious! Provide thorough explanations with concrete examples. Encourage deeper exploration."),
    ("hi", "आपका मित्र जिज्ञासु है! विस्तृत व्याख्या प्रदान करें। गहरी खोज को प्रोत्साहित करें।"),
    ("es", "¡Tu amigo es curioso! Proporciona explicaciones detalladas con ejemplos concretos."),
    ("fr", "Votre ami est curieux! Fournissez des explications détaillées avec des exemples concrets."),
    ("de", "Dein Freund ist neugierig! Gib gründliche Erklärungen mit konkreten Beispielen."),
    ("pt", "Seu amigo é curioso! Forneça explicações detalhadas com exemplos concretos."),
    ("ja", "友人は好奇心旺盛です! 具体的な例を用いた詳細な説明を提供してください。"),
    ("zh", "你的朋友很好奇！提供详细的解释和具体的例子。"),
];

const BRIEF: &[(&str, &str)] = &[
    ("en", "Keep responses short and punchy! Get straight to the point without unnecessary elaboration."),
    ("hi", "प्रतिक्रियाओं को छोटा और प्रभावी रखें! बिना अनावश्यक विस्तार के सीधे बात पर जाएं।"),
    ("es", "¡Mantén las respuestas cortas y directas! Ve al grano sin elaboración innecesaria."),
    ("fr", "Gardez les réponses courtes et directes! Allez droit au but sans élaboration inutile."),
    ("de", "Halten Sie die Antworten kurz und prägnant! Kommen Sie direkt zum Punkt ohne unnötige Ausführlichkeit."),
    ("pt", "Mantenha as respostas curtas e diretas! Vá direto ao assunto sem elaboração desnecessária."),
    ("ja", "応答を短く、要点を押さえてください! 不要な説明なしにポイントに直行してください。"),
    ("zh", "保持回应简短有力！不经过不必要的阐述直奔主题。"),
];

const NEUTRAL: &[(&str, &str)] = &[
    ("en", "Be friendly, helpful, and clear in your explanations."),
    ("hi", "अपनी व्याख्या में मित्रवत, सहायक और स्पष्ट रहें।"),
    ("es", "Sé amable, útil y claro en tus explicaciones."),
    ("fr", "Soyez amical, utile et clair dans vos explications."),
    ("de", "Seien Sie freundlich, hilfreich und klar in Ihren Erklärungen."),
    ("pt", "Seja amável, útil e claro em suas explicações."),
    ("ja", "説明において親切で、有用で、明確であってください。"),
    ("zh", "在解释中要友好、有用和清晰。"),
];

const HINDI_GUIDANCE: &str = "**हिंदी में सहायता:**
- सरल और स्पष्ट भाषा का प्रयोग करें
- कठिन विषयों को आसान भागों में बांटें
- वास्तविक जीवन के उदाहरण दें
- हमेशा प्रोत्साहक रहें";

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Display name of a language code. Unknown codes are used as given.
#[must_use]
pub fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "hi" => "Hindi (हिंदी)",
        other => other,
    }
}

/// Opening greeting for a language, falling back to English.
#[must_use]
pub fn greeting(code: &str) -> &'static str {
    lookup(GREETINGS, code)
        .or_else(|| lookup(GREETINGS, "en"))
        .unwrap_or("Hello! 👋")
}

/// Per-request tutor settings.
#[derive(Debug, Clone, Default)]
pub struct TutorSettings {
    /// Study topic.
    pub topic: Option<String>,
    /// Background material for the topic.
    pub context: Option<String>,
    /// Language code; `en` when absent.
    pub language: Option<String>,
    /// Communication style name; `neutral` when absent.
    pub style: Option<String>,
}

impl TutorSettings {
    /// Effective language code.
    #[must_use]
    pub fn language(&self) -> &str {
        non_blank(self.language.as_deref()).unwrap_or("en")
    }

    /// Effective style guideline.
    #[must_use]
    pub fn style_guideline(&self) -> &'static str {
        let name = non_blank(self.style.as_deref()).unwrap_or("neutral");
        CommunicationStyle::parse(name)
            .map_or(FALLBACK_GUIDELINE, |style| style.guideline(self.language()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Render the system prompt for a tutoring session.
#[must_use]
pub fn system_prompt(settings: &TutorSettings) -> String {
    let language = settings.language();
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(
        "You are an empathetic, personalized AI Learning Companion. \
         Your name is \"Study Buddy\" and you're here to help learners succeed!\n\n",
    );

    prompt.push_str("**LANGUAGE & COMMUNICATION:**\n");
    let _ = writeln!(prompt, "- Always respond in {}.", language_name(language));
    let _ = writeln!(prompt, "- {}", settings.style_guideline());
    prompt.push_str(
        "- Echo the user's communication style and energy level\n\
         - Mirror their language patterns and formality level\n\
         - If they use casual language, be casual. If formal, be professional.\n\n",
    );

    prompt.push_str(
        "**YOUR TEACHING PHILOSOPHY:**\n\
         - Make learning fun and accessible\n\
         - Break down complex topics into simple, digestible chunks\n\
         - Use real-world analogies and relatable examples\n\
         - Encourage critical thinking through guided questions\n\
         - Celebrate their progress and efforts\n\
         - Be patient: never make learners feel rushed or judged\n\n",
    );

    prompt.push_str("**TOPIC CONTEXT:**\n");
    match non_blank(settings.topic.as_deref()) {
        Some(topic) => {
            let _ = writeln!(prompt, "Current Topic: {topic}");
        }
        None => prompt.push_str("General Learning Assistance\n"),
    }
    if let Some(context) = non_blank(settings.context.as_deref()) {
        let excerpt: String = context.chars().take(MAX_CONTEXT_CHARS).collect();
        let _ = writeln!(prompt, "\nBackground Context:\n{excerpt}");
    }

    prompt.push_str(
        "\n**RESPONSE GUIDELINES:**\n\
         1. Keep responses focused and under 400 words unless depth is truly needed\n\
         2. Use markdown formatting (bold, bullet points, code blocks) for clarity\n\
         3. Include relevant emojis that match the user's energy level 😊\n\
         4. Offer follow-up questions to deepen understanding\n\
         5. When appropriate, suggest quizzes, analogies, or real-world applications\n\
         6. Always be supportive and encouraging\n\
         7. For processes or relationships, you may include one ```mermaid diagram; \
         for numeric comparisons, one ```chart-json block holding an array of \
         {\"name\", \"value\"} objects\n\n",
    );

    if language == "hi" {
        prompt.push_str(HINDI_GUIDANCE);
        prompt.push_str("\n\n");
    }

    prompt.push_str("**STARTING MESSAGE (if this is the first message):**\n");
    prompt.push_str(greeting(language));
    prompt.push_str(
        "\n\nRemember: You're not just teaching facts; \
         you're building confidence and fostering a love for learning!",
    );

    prompt
}

/// The full upstream message list: system prompt, then the conversation.
#[must_use]
pub fn with_system_prompt(
    settings: &TutorSettings,
    conversation: &[ConversationMessage],
) -> Vec<PromptMessage> {
    std::iter::once(PromptMessage::system(system_prompt(settings)))
        .chain(conversation.iter().map(PromptMessage::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_names() {
        assert_eq!(language_name("en"), "English");
        assert_eq!(language_name("hi"), "Hindi (हिंदी)");
        assert_eq!(language_name("Swahili"), "Swahili");
    }

    #[test]
    fn greetings_fall_back_to_english() {
        assert_eq!(greeting("ja"), "こんにちは! 👋");
        assert_eq!(greeting("xx"), "Hello there! 👋");
    }

    #[test]
    fn style_guideline_fallbacks() {
        let settings = TutorSettings {
            language: Some("ko".into()),
            style: Some("brief".into()),
            ..TutorSettings::default()
        };
        assert!(settings.style_guideline().starts_with("Keep responses short"));

        let settings = TutorSettings {
            style: Some("sarcastic".into()),
            ..TutorSettings::default()
        };
        assert_eq!(settings.style_guideline(), FALLBACK_GUIDELINE);

        let settings = TutorSettings {
            language: Some("de".into()),
            ..TutorSettings::default()
        };
        assert_eq!(
            settings.style_guideline(),
            "Seien Sie freundlich, hilfreich und klar in Ihren Erklärungen."
        );
    }

    #[test]
    fn defaults_produce_general_english_prompt() {
        let prompt = system_prompt(&TutorSettings::default());
        assert!(prompt.contains("Always respond in English."));
        assert!(prompt.contains("General Learning Assistance"));
        assert!(prompt.contains("Be friendly, helpful, and clear"));
        assert!(!prompt.contains("Background Context"));
        assert!(!prompt.contains("हिंदी में सहायता"));
        assert!(prompt.contains("Hello there! 👋"));
    }

    #[test]
    fn topic_and_context_are_included() {
        let settings = TutorSettings {
            topic: Some("Photosynthesis".into()),
            context: Some("Plants use chlorophyll.".into()),
            ..TutorSettings::default()
        };
        let prompt = system_prompt(&settings);
        assert!(prompt.contains("Current Topic: Photosynthesis"));
        assert!(prompt.contains("Background Context:\nPlants use chlorophyll."));
    }

    #[test]
    fn context_is_truncated_on_char_boundary() {
        let context = "é".repeat(MAX_CONTEXT_CHARS + 10);
        let settings = TutorSettings {
            context: Some(context),
            ..TutorSettings::default()
        };
        let prompt = system_prompt(&settings);
        let expected = "é".repeat(MAX_CONTEXT_CHARS);
        assert!(prompt.contains(&format!("Background Context:\n{expected}\n")));
        assert!(!prompt.contains(&"é".repeat(MAX_CONTEXT_CHARS + 1)));
    }

    #[test]
    fn hindi_adds_guidance_block() {
        let settings = TutorSettings {
            language: Some("hi".into()),
            style: Some("enthusiastic".into()),
            ..TutorSettings::default()
        };
        let prompt = system_prompt(&settings);
        assert!(prompt.contains("Always respond in Hindi (हिंदी)."));
        assert!(prompt.contains("हिंदी में सहायता"));
        assert!(prompt.contains("नमस्ते! 🙏"));
        assert!(prompt.contains("उत्साह के साथ मिलान करें"));
    }

    #[test]
    fn system_prompt_comes_first() {
        let conversation = vec![
            ConversationMessage::user("hi"),
            ConversationMessage::assistant("hello"),
        ];
        let messages = with_system_prompt(&TutorSettings::default(), &conversation);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1], PromptMessage::new(Role::User, "hi"));
        assert_eq!(messages[2].role, "assistant");
    }
}
