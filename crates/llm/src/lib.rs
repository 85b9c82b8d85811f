//! Text-completion client boundary for Lantern.
//!
//! The rest of the system treats completion as an opaque capability: given
//! an ordered list of role-tagged messages it returns generated text or a
//! typed failure. Providers, retry policy, and concurrency limits are all
//! configured here and hidden behind the [`CompletionClient`] trait.

pub mod anthropic;
pub mod client;
pub mod config;
pub mod openai;
pub mod retry;

pub use anthropic::AnthropicClient;
pub use client::{
    ChatMessage, CompletionClient, CompletionRequest, CompletionResponse, Role, TokenUsage,
};
pub use config::{CompletionConfig, SemaphoredClient, build_completion_client};
pub use openai::OpenAiClient;
pub use retry::{RetryConfig, RetryingClient};
