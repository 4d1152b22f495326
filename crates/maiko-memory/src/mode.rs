use std::fmt;

use serde::{Deserialize, Serialize};

const FORGET_MARKERS: [&str; 3] = ["forget", "delete", "erase"];
const REMEMBER_MARKERS: [&str; 3] = ["remember", "new name is", "my name is"];

/// How a turn is allowed to change the fact list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryMode {
    /// The model returns the facts to keep; the list is replaced.
    Forget,
    /// The model returns the one fact the user asked to keep; it is merged.
    Remember,
    /// The model returns any new facts it noticed; they are merged.
    AutoLearn,
}

impl MemoryMode {
    /// Pick the mode for a turn. Markers are matched case-insensitively as
    /// substrings of the user input and the reply together, forget first.
    pub fn classify(user_input: &str, ai_response: &str) -> Self {
        let text = format!("{} {}", user_input, ai_response).to_lowercase();

        if FORGET_MARKERS.iter().any(|m| text.contains(m)) {
            MemoryMode::Forget
        } else if REMEMBER_MARKERS.iter().any(|m| text.contains(m)) {
            MemoryMode::Remember
        } else {
            MemoryMode::AutoLearn
        }
    }

    pub fn replaces(&self) -> bool {
        matches!(self, MemoryMode::Forget)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryMode::Forget => "forget",
            MemoryMode::Remember => "remember",
            MemoryMode::AutoLearn => "auto_learn",
        }
    }
}

impl fmt::Display for MemoryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
