//! Remote intent classification over chat-completion endpoints.

pub mod classifier;

pub use classifier::{AiClassifier, ClassifierError, IntentClassifier, decide_by_ai};

/// Shared HTTP client for outbound calls.
///
/// Callers that don't need custom redirect/proxy settings should reuse this
/// client to share connection pools, DNS cache, and TLS sessions.
pub fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}
