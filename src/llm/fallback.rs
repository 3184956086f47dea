//! Fallback enhancer — wraps any [`TextEnhancer`] and returns the input on
//! error.
//!
//! When the underlying LLM call fails for any reason (`Request`, `Timeout`,
//! `Parse`, `EmptyResponse`) [`FallbackEnhancer`] returns the user's
//! original text instead of propagating the error, so synthesis still runs.

use async_trait::async_trait;

use crate::llm::enhancer::{LlmError, TextEnhancer};

/// A transparent wrapper around any [`TextEnhancer`] that never returns an
/// error — on failure it returns `text` unchanged.
pub struct FallbackEnhancer<E: TextEnhancer> {
    inner: E,
}

impl<E: TextEnhancer> FallbackEnhancer<E> {
    pub fn new(inner: E) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<E: TextEnhancer> TextEnhancer for FallbackEnhancer<E> {
    /// This implementation **never** returns `Err(_)`.
    async fn enhance(&self, text: &str) -> Result<String, LlmError> {
        match self.inner.enhance(text).await {
            Ok(enhanced) => Ok(enhanced),
            Err(err) => {
                log::warn!(
                    "LLM enhancement failed ({err}) — using original text (len={})",
                    text.len()
                );
                Ok(text.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysOk(String);

    #[async_trait]
    impl TextEnhancer for AlwaysOk {
        async fn enhance(&self, _text: &str) -> Result<String, LlmError> {
            Ok(self.0.clone())
        }
    }

    enum Failure {
        Request,
        Timeout,
        Parse,
        Empty,
    }

    struct AlwaysFails(Failure);

    #[async_trait]
    impl TextEnhancer for AlwaysFails {
        async fn enhance(&self, _text: &str) -> Result<String, LlmError> {
            Err(match self.0 {
                Failure::Request => LlmError::Request("connection refused".into()),
                Failure::Timeout => LlmError::Timeout,
                Failure::Parse => LlmError::Parse("bad json".into()),
                Failure::Empty => LlmError::EmptyResponse,
            })
        }
    }

    #[tokio::test]
    async fn passes_through_success() {
        let enhancer = FallbackEnhancer::new(AlwaysOk("Well (laughs) hello!".into()));
        assert_eq!(enhancer.enhance("hello").await.unwrap(), "Well (laughs) hello!");
    }

    #[tokio::test]
    async fn returns_original_on_every_error_kind() {
        for failure in [Failure::Request, Failure::Timeout, Failure::Parse, Failure::Empty] {
            let enhancer = FallbackEnhancer::new(AlwaysFails(failure));
            assert_eq!(enhancer.enhance("original text").await.unwrap(), "original text");
        }
    }

    /// FallbackEnhancer<E> must itself be a valid TextEnhancer (object-safe).
    #[test]
    fn fallback_is_object_safe() {
        let _: Box<dyn TextEnhancer> = Box::new(FallbackEnhancer::new(AlwaysOk("ok".into())));
    }
}
