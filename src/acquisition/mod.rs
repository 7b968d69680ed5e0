//! Ordered-fallback acquisition.
//!
//! A [`ContentFetcher`] runs a list of [`Strategy`] implementations in priority order
//! and returns the first value that passes the strategy's own validation. Failures never
//! escape: each one is recorded as an [`Attempt`], and when the list is exhausted the
//! caller's terminal fallback value is returned alongside the full attempt trail.

pub mod browser;
pub mod http;

use crate::error::Result;
use crate::source::SourceReference;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One way of acquiring a `T` for a source.
#[async_trait]
pub trait Strategy<T>: Send + Sync {
    /// Short, stable name used in logs and attempt records.
    fn name(&self) -> &'static str;

    /// Try to acquire a value. Errors are recorded, never propagated past the fetcher.
    async fn acquire(&self, source: &SourceReference) -> Result<T>;

    /// Reject values that were produced but are not usable.
    fn validate(&self, _value: &T) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// Which strategy produced a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyUsed {
    pub name: String,
    /// 1-based position in the ordered list.
    pub position: usize,
}

/// A failed strategy attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub strategy: String,
    pub error: String,
}

/// Outcome of an ordered fetch. Either a full value or a full failure trail.
#[derive(Debug, Clone)]
pub enum Acquisition<T> {
    Acquired {
        value: T,
        strategy: StrategyUsed,
        /// Strategies that failed before the winner.
        skipped: Vec<Attempt>,
    },
    Exhausted {
        attempts: Vec<Attempt>,
        fallback: T,
    },
}

impl<T> Acquisition<T> {
    pub fn is_acquired(&self) -> bool {
        matches!(self, Acquisition::Acquired { .. })
    }

    /// The acquired value, or the terminal fallback.
    pub fn value(&self) -> &T {
        match self {
            Acquisition::Acquired { value, .. } => value,
            Acquisition::Exhausted { fallback, .. } => fallback,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Acquisition::Acquired { value, .. } => value,
            Acquisition::Exhausted { fallback, .. } => fallback,
        }
    }

    pub fn strategy(&self) -> Option<&StrategyUsed> {
        match self {
            Acquisition::Acquired { strategy, .. } => Some(strategy),
            Acquisition::Exhausted { .. } => None,
        }
    }

    /// All failed attempts, whether or not a later strategy succeeded.
    pub fn attempts(&self) -> &[Attempt] {
        match self {
            Acquisition::Acquired { skipped, .. } => skipped,
            Acquisition::Exhausted { attempts, .. } => attempts,
        }
    }
}

/// Executes an ordered list of strategies.
pub struct ContentFetcher<T> {
    label: &'static str,
    strategies: Vec<Arc<dyn Strategy<T>>>,
}

impl<T: Send> ContentFetcher<T> {
    pub fn new(label: &'static str, strategies: Vec<Arc<dyn Strategy<T>>>) -> Self {
        Self { label, strategies }
    }

    /// Names of the configured strategies, in priority order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Run the strategies in order. `fallback` is only invoked when all of them fail.
    pub async fn fetch<F>(&self, source: &SourceReference, fallback: F) -> Acquisition<T>
    where
        F: FnOnce(&[Attempt]) -> T,
    {
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for (idx, strategy) in self.strategies.iter().enumerate() {
            let position = idx + 1;
            debug!(
                "{} method {}/{}: {}",
                self.label,
                position,
                self.strategies.len(),
                strategy.name()
            );

            let error = match strategy.acquire(source).await {
                Ok(value) => match strategy.validate(&value) {
                    Ok(()) => {
                        info!("{} acquired via {} for {}", self.label, strategy.name(), source.content_id);
                        return Acquisition::Acquired {
                            value,
                            strategy: StrategyUsed {
                                name: strategy.name().to_string(),
                                position,
                            },
                            skipped: attempts,
                        };
                    }
                    Err(reason) => format!("invalid result: {}", reason),
                },
                Err(e) => e.to_string(),
            };

            warn!("{} method {} failed: {}", self.label, strategy.name(), error);
            attempts.push(Attempt {
                strategy: strategy.name().to_string(),
                error,
            });
        }

        info!(
            "{}: all {} methods failed for {}",
            self.label,
            attempts.len(),
            source.content_id
        );
        let fallback = fallback(&attempts);
        Acquisition::Exhausted { attempts, fallback }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::Scripted;
    use super::*;

    fn source() -> SourceReference {
        SourceReference::parse("https://youtu.be/dQw4w9WgXcQ").unwrap()
    }

    #[tokio::test]
    async fn test_first_success_wins_and_later_strategies_are_skipped() {
        let first = Scripted::failing("first", "boom");
        let second = Scripted::ok("second", "value".to_string());
        let third = Scripted::ok("third", "never".to_string());

        let fetcher: ContentFetcher<String> = ContentFetcher::new(
            "test",
            vec![first.clone(), second.clone(), third.clone()],
        );

        let result = fetcher.fetch(&source(), |_| "fallback".to_string()).await;

        assert!(result.is_acquired());
        assert_eq!(result.value(), "value");
        assert_eq!(result.strategy().unwrap().position, 2);
        assert_eq!(result.attempts().len(), 1);
        assert_eq!(third.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_value_falls_through() {
        let short = Arc::new(Scripted {
            name: "short",
            result: Ok("tiny".to_string()),
            min_len: Some(10),
            calls: Default::default(),
        });
        let good = Scripted::ok("good", "long enough value".to_string());

        let fetcher: ContentFetcher<String> = ContentFetcher::new("test", vec![short, good]);
        let result = fetcher.fetch(&source(), |_| String::new()).await;

        assert_eq!(result.value(), "long enough value");
        assert!(result.attempts()[0].error.starts_with("invalid result"));
    }

    #[tokio::test]
    async fn test_exhausted_carries_every_attempt_and_fallback() {
        let fetcher: ContentFetcher<String> = ContentFetcher::new(
            "test",
            vec![
                Scripted::failing("a", "err a"),
                Scripted::failing("b", "err b"),
                Scripted::failing("c", "err c"),
            ],
        );

        let result = fetcher
            .fetch(&source(), |attempts| format!("gave up after {}", attempts.len()))
            .await;

        match result {
            Acquisition::Exhausted { attempts, fallback } => {
                assert_eq!(attempts.len(), 3);
                assert_eq!(attempts[1].strategy, "b");
                assert!(attempts[2].error.contains("err c"));
                assert_eq!(fallback, "gave up after 3");
            }
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_strategy_list_goes_straight_to_fallback() {
        let fetcher: ContentFetcher<String> = ContentFetcher::new("test", Vec::new());
        let result = tokio_test::block_on(fetcher.fetch(&source(), |_| "nothing".to_string()));

        assert!(!result.is_acquired());
        assert!(result.attempts().is_empty());
        assert_eq!(result.into_value(), "nothing");
    }
}
