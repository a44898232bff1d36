//! Provider implementations and wrappers.

pub mod rate_limited;

#[cfg(feature = "openai")]
pub mod openai;

pub use rate_limited::{ProviderExt, RateLimitedProvider};

#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;
