//! Prompt templates for fact extraction
//!
//! Placeholders: `{facts}` (JSON array of the visible facts), `{user_input}`
//! and `{ai_response}`.

use crate::mode::MemoryMode;

pub const DEFAULT_FORGET_PROMPT: &str = r#"The user wants to forget something. Look at their input.
Return a JSON list of facts to KEEP (remove the relevant ones).
Existing Facts: {facts}
User Input: {user_input}"#;

pub const DEFAULT_REMEMBER_PROMPT: &str = r#"Extract the specific fact the user wants remembered.
User: {user_input}
Return ONLY a JSON list with the new fact."#;

pub const DEFAULT_AUTO_LEARN_PROMPT: &str = r#"Extract NEW facts about the user from this text.
Return ONLY a JSON list.
Existing Knowledge (DO NOT REPEAT): {facts}

Text: {user_input}
AI Response: {ai_response}"#;

#[derive(Debug, Clone)]
pub struct MemoryPrompts {
    pub forget: String,
    pub remember: String,
    pub auto_learn: String,
}

impl Default for MemoryPrompts {
    fn default() -> Self {
        Self {
            forget: DEFAULT_FORGET_PROMPT.to_string(),
            remember: DEFAULT_REMEMBER_PROMPT.to_string(),
            auto_learn: DEFAULT_AUTO_LEARN_PROMPT.to_string(),
        }
    }
}

impl MemoryPrompts {
    pub fn template(&self, mode: MemoryMode) -> &str {
        match mode {
            MemoryMode::Forget => &self.forget,
            MemoryMode::Remember => &self.remember,
            MemoryMode::AutoLearn => &self.auto_learn,
        }
    }

    pub fn render(
        &self,
        mode: MemoryMode,
        facts: &[String],
        user_input: &str,
        ai_response: &str,
    ) -> String {
        let facts_json = serde_json::to_string(facts).unwrap_or_else(|_| "[]".to_string());
        self.template(mode)
            .replace("{facts}", &facts_json)
            .replace("{user_input}", user_input)
            .replace("{ai_response}", ai_response)
    }
}
