//! System prompt construction
//!
//! Every relayed request gets one system message in front of the
//! conversation. Normal requests combine a base sentence naming the model and
//! the assistant brand, the model's own persona sentence, and a sentence for
//! the requested text style. Title requests use [`TITLE_PROMPT`] instead.

use crate::llm::ModelDef;

/// Fixed instruction for title-generation requests
pub const TITLE_PROMPT: &str = "You are a title generator. Generate a very short title (4-6 words) that captures the essence of the conversation. Be concise and clear.";

/// Brand used when none is configured
pub const DEFAULT_ASSISTANT_NAME: &str = "OrionAI";

/// Tone requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextStyle {
    #[default]
    Default,
    Professional,
    Casual,
    Creative,
}

impl TextStyle {
    pub const ALL: [TextStyle; 4] = [
        TextStyle::Default,
        TextStyle::Professional,
        TextStyle::Casual,
        TextStyle::Creative,
    ];

    /// Parse a style name; unknown names map to `Default`
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "professional" => TextStyle::Professional,
            "casual" => TextStyle::Casual,
            "creative" => TextStyle::Creative,
            _ => TextStyle::Default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TextStyle::Default => "default",
            TextStyle::Professional => "professional",
            TextStyle::Casual => "casual",
            TextStyle::Creative => "creative",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            TextStyle::Default => "You communicate in a clear and natural way.",
            TextStyle::Professional => "You communicate in a formal and business-like manner.",
            TextStyle::Casual => "You communicate in a friendly and relaxed way.",
            TextStyle::Creative => "You communicate with flair and imagination.",
        }
    }
}

/// Build the system prompt for a normal chat request
pub fn build_system_prompt(model: &ModelDef, style: TextStyle, assistant_name: &str) -> String {
    let base = format!(
        "You are {} model, a highly capable AI assistant created by {assistant_name}.",
        model.id
    );

    [base.as_str(), model.persona.trim(), style.instruction()]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
