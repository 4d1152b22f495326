//! Chat session runtime and configuration for MAiKO

mod bootstrap;
mod config;
mod session;

pub use bootstrap::{build_registry, build_session, build_session_with_registry};
pub use config::{ArchiveSettings, LLMSettings, MaikoConfig, MemorySettings, ProviderSettings};
pub use session::{ChatSession, ChatTurn, DEFAULT_IMAGE_PROMPT, EMPTY_PREVIEW};

pub use maiko_core::{MaikoError, Result};
