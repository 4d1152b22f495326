pub mod unified;

pub use unified::{ProviderBuilder, ProviderType, UnifiedLLMProvider, ZHIPU_BASE_URL};
