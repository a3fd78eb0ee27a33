//! Per-pattern response delivery queue with default fallback.

use crate::model::{AppResponse, DefaultResponse};
use std::collections::VecDeque;

/// FIFO queue of primed responses backed by an optional default.
///
/// Consumption serves primed responses first; once the queue is drained,
/// every further consumption evaluates the default. A queue with nothing
/// primed and no default is exhausted and its mapping must be removed from
/// the store by the caller.
#[derive(Debug, Default)]
pub struct DefaultingQueue {
    primed: VecDeque<AppResponse>,
    default: Option<DefaultResponse>,
}

impl DefaultingQueue {
    pub fn new() -> DefaultingQueue {
        DefaultingQueue::default()
    }

    /// Appends a response to the tail of the primed sequence. Valid in any
    /// state; an otherwise-exhausted queue becomes servable again.
    pub fn append(&mut self, response: AppResponse) {
        self.primed.push_back(response);
    }

    /// Sets or overwrites the default. Takes effect only once the primed
    /// sequence is drained.
    pub fn set_default(&mut self, default: DefaultResponse) {
        self.default = Some(default);
    }

    /// Delivers the next response: the head of the primed sequence, or an
    /// evaluation of the default once the sequence is empty. Returns `None`
    /// only when exhausted.
    pub fn consume(&mut self) -> Option<AppResponse> {
        match self.primed.pop_front() {
            Some(response) => Some(response),
            None => self.default.as_ref().map(DefaultResponse::respond),
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.primed.is_empty() && self.default.is_none()
    }

    pub fn primed_len(&self) -> usize {
        self.primed.len()
    }

    pub fn primed(&self) -> impl Iterator<Item = &AppResponse> {
        self.primed.iter()
    }

    pub fn default_response(&self) -> Option<&DefaultResponse> {
        self.default.as_ref()
    }
}
