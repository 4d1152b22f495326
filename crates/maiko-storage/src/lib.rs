//! Persistence for MAiKO: facts, archive records and conversation transcripts

mod archive;
mod conversation;
mod facts;
mod in_memory;
mod json_file;

pub use archive::{ArchiveRecord, ArchiveStore, DEFAULT_ARCHIVE_CAPACITY};
pub use conversation::{FileConversationStore, conversation_id, unique_conversation_id};
pub use facts::{DEFAULT_FACT_WINDOW, FactStore};
pub use in_memory::InMemoryConversationStore;
pub use json_file::JsonFile;
pub use maiko_core::{ConversationStorage, MaikoError, Result};
