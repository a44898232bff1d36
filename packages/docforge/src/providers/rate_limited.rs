//! Rate-limited provider wrapper.
//!
//! Wraps any provider implementation with rate limiting using the governor
//! crate. The pipeline and orchestrator impose no rate limiting of their
//! own; wrapping the provider is how callers bound their request rate.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ProviderResult;
use crate::security::ApiCredential;
use crate::traits::provider::{
    AiProvider, AuthStatus, HealthReport, KeyedProvider, ModelInfo, SessionProvider,
};
use crate::types::file::SourceDoc;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A provider wrapper that enforces rate limits on generation-family calls.
///
/// Session management calls (sign-in, health probes) pass through
/// unlimited; only calls that consume model quota wait for a permit.
pub struct RateLimitedProvider<P> {
    inner: P,
    limiter: Arc<DefaultRateLimiter>,
}

impl<P> RateLimitedProvider<P> {
    /// Wrap a provider with a requests-per-second limit.
    pub fn new(provider: P, requests_per_second: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_second).expect("requests_per_second must be > 0"),
        );
        Self {
            inner: provider,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Wrap with burst support.
    pub fn with_burst(provider: P, requests_per_second: u32, burst: u32) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(requests_per_second).expect("requests_per_second must be > 0"),
        )
        .allow_burst(NonZeroU32::new(burst).expect("burst must be > 0"));

        Self {
            inner: provider,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &P {
        &self.inner
    }

    async fn wait_for_permit(&self) {
        self.limiter.until_ready().await;
    }
}

#[async_trait]
impl<P: AiProvider> AiProvider for RateLimitedProvider<P> {
    async fn list_models(&self) -> ProviderResult<Vec<ModelInfo>> {
        self.wait_for_permit().await;
        self.inner.list_models().await
    }

    async fn generate(&self, prompt: &str, model: &str) -> ProviderResult<String> {
        self.wait_for_permit().await;
        self.inner.generate(prompt, model).await
    }

    async fn process_files(
        &self,
        files: &[SourceDoc],
        document_name: &str,
        model: &str,
    ) -> ProviderResult<String> {
        self.wait_for_permit().await;
        self.inner.process_files(files, document_name, model).await
    }

    async fn condense(&self, content: &str, model: &str) -> ProviderResult<String> {
        self.wait_for_permit().await;
        self.inner.condense(content, model).await
    }
}

#[async_trait]
impl<P: KeyedProvider> KeyedProvider for RateLimitedProvider<P> {
    fn install_credential(&self, credential: ApiCredential) {
        self.inner.install_credential(credential);
    }

    fn clear_credential(&self) {
        self.inner.clear_credential();
    }

    async fn validate(&self) -> ProviderResult<bool> {
        self.wait_for_permit().await;
        self.inner.validate().await
    }
}

#[async_trait]
impl<P: SessionProvider> SessionProvider for RateLimitedProvider<P> {
    fn is_available(&self) -> bool {
        self.inner.is_available()
    }

    async fn wait_for_ready(&self, timeout: Duration) -> ProviderResult<bool> {
        self.inner.wait_for_ready(timeout).await
    }

    async fn health_check(&self) -> ProviderResult<HealthReport> {
        self.inner.health_check().await
    }

    async fn is_signed_in(&self) -> ProviderResult<bool> {
        self.inner.is_signed_in().await
    }

    async fn sign_in(&self) -> ProviderResult<()> {
        self.inner.sign_in().await
    }

    async fn sign_out(&self) -> ProviderResult<()> {
        self.inner.sign_out().await
    }

    async fn test_connection(&self) -> ProviderResult<bool> {
        self.inner.test_connection().await
    }

    async fn auth_status(&self) -> ProviderResult<AuthStatus> {
        self.inner.auth_status().await
    }

    async fn respond(&self, message: &str, context: &str, model: &str) -> ProviderResult<String> {
        self.wait_for_permit().await;
        self.inner.respond(message, context, model).await
    }
}

/// Extension trait for easy rate limiting.
pub trait ProviderExt: Sized {
    /// Wrap this provider with rate limiting.
    fn rate_limited(self, requests_per_second: u32) -> RateLimitedProvider<Self> {
        RateLimitedProvider::new(self, requests_per_second)
    }

    /// Wrap with rate limiting and burst support.
    fn rate_limited_with_burst(
        self,
        requests_per_second: u32,
        burst: u32,
    ) -> RateLimitedProvider<Self> {
        RateLimitedProvider::with_burst(self, requests_per_second, burst)
    }
}

impl<P: AiProvider + Sized> ProviderExt for P {}
