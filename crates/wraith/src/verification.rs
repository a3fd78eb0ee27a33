//! Invocation counting and verification over recorded call history.

use crate::history::{BoundedHistory, Exchange};
use crate::model::{matches, RequestPattern};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Predicate over an invocation count, carrying a human-readable
/// description used in mismatch errors.
#[derive(Clone)]
pub struct VerificationCriteria {
    description: String,
    predicate: Arc<dyn Fn(usize) -> bool + Send + Sync>,
}

impl VerificationCriteria {
    pub fn equal_to(expected: usize) -> VerificationCriteria {
        VerificationCriteria {
            description: format!("equal to {expected}"),
            predicate: Arc::new(move |count| count == expected),
        }
    }

    pub fn at_least(minimum: usize) -> VerificationCriteria {
        VerificationCriteria {
            description: format!("at least {minimum}"),
            predicate: Arc::new(move |count| count >= minimum),
        }
    }

    pub fn at_most(maximum: usize) -> VerificationCriteria {
        VerificationCriteria {
            description: format!("at most {maximum}"),
            predicate: Arc::new(move |count| count <= maximum),
        }
    }

    /// Inclusive on both bounds.
    pub fn between(minimum: usize, maximum: usize) -> VerificationCriteria {
        VerificationCriteria {
            description: format!("between {minimum} and {maximum}"),
            predicate: Arc::new(move |count| count >= minimum && count <= maximum),
        }
    }

    pub fn custom<F>(description: impl Into<String>, predicate: F) -> VerificationCriteria
    where
        F: Fn(usize) -> bool + Send + Sync + 'static,
    {
        VerificationCriteria {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        (self.predicate)(count)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Default for VerificationCriteria {
    fn default() -> Self {
        VerificationCriteria::equal_to(1)
    }
}

impl fmt::Debug for VerificationCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VerificationCriteria")
            .field(&self.description)
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("expected call count to be {criteria} but was {actual}")]
pub struct VerificationError {
    pub criteria: String,
    pub actual: usize,
}

/// Counts history entries whose request satisfies `pattern`. The count is
/// taken over a point-in-time snapshot of the history.
pub fn count_invocations(history: &BoundedHistory<Exchange>, pattern: &RequestPattern) -> usize {
    history
        .values()
        .iter()
        .filter(|exchange| matches(pattern, &exchange.request))
        .count()
}

/// Checks the invocation count of `pattern` against `criteria`.
pub fn verify(
    history: &BoundedHistory<Exchange>,
    pattern: &RequestPattern,
    criteria: &VerificationCriteria,
) -> Result<(), VerificationError> {
    let actual = count_invocations(history, pattern);
    if criteria.accepts(actual) {
        Ok(())
    } else {
        Err(VerificationError {
            criteria: criteria.description().to_string(),
            actual,
        })
    }
}
