//! Conversation memory for MAiKO: the user fact list and conversation archival

mod archival;
mod engine;
mod mode;
mod parse;
mod prompts;
mod summarizer;

pub use archival::{
    ArchivalConfig, ArchivalEngine, ArchiveOutcome, EMPTY_CONVERSATION_DIGEST, SUMMARY_FAILED,
    digest,
};
pub use engine::{MemoryEngine, UpdateOutcome, UpdateReport};
pub use mode::MemoryMode;
pub use parse::{extract_json_block, parse_fact_list};
pub use prompts::{
    DEFAULT_AUTO_LEARN_PROMPT, DEFAULT_FORGET_PROMPT, DEFAULT_REMEMBER_PROMPT, MemoryPrompts,
};
pub use summarizer::{DEFAULT_SUMMARY_PROMPT, LLMSummarizer, NoopSummarizer, Summarizer};
