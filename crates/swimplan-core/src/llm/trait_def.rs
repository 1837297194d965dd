//! The `LlmClient` trait: the only contract the pipeline has with a model.

use async_trait::async_trait;

use super::LlmError;

/// Text-completion collaborator.
///
/// Implementors hold read-only configuration only; one client may serve any
/// number of concurrent pipeline runs.
///
/// # Object Safety
///
/// This trait is object-safe, so the planner stores it as
/// `Arc<dyn LlmClient>` and tests swap in scripted doubles.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Short provider name for logs (e.g. "anthropic").
    fn name(&self) -> &str;

    /// Send one system + user instruction pair and return the raw reply.
    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}

// Compile-time assertion: LlmClient must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn LlmClient) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Echoes the user instruction back.
    struct EchoClient;

    #[async_trait]
    impl LlmClient for EchoClient {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, _system: &str, user: &str) -> Result<String, LlmError> {
            if user.is_empty() {
                return Err(LlmError::EmptyResponse);
            }
            Ok(user.to_string())
        }
    }

    #[test]
    fn client_is_object_safe() {
        let client: Box<dyn LlmClient> = Box::new(EchoClient);
        assert_eq!(client.name(), "echo");
    }

    #[tokio::test]
    async fn echo_client_round_trip() {
        let client: std::sync::Arc<dyn LlmClient> = std::sync::Arc::new(EchoClient);
        assert_eq!(client.complete("sys", "hello").await.unwrap(), "hello");
        let err = client.complete("sys", "").await.unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse), "expected EmptyResponse, got: {err}");
    }
}
