//! Bounded, insertion-ordered caches for call history and unmatched requests.

use crate::model::{AppRequest, AppResponse};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One recorded (request, response) pair from a matched delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    pub request: AppRequest,
    pub response: AppResponse,
    pub timestamp: DateTime<Utc>,
}

impl Exchange {
    pub fn new(request: AppRequest, response: AppResponse) -> Exchange {
        Exchange {
            request,
            response,
            timestamp: Utc::now(),
        }
    }
}

/// Fixed-capacity FIFO-eviction cache.
///
/// Capacity zero means unbounded. Recording at capacity evicts the oldest
/// element, so size never exceeds capacity and iteration order is always
/// oldest to newest. Each cache carries its own lock; append-plus-evict is
/// atomic and no invariant spans across caches.
#[derive(Debug)]
pub struct BoundedHistory<T> {
    items: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T: Clone> BoundedHistory<T> {
    /// Creates a cache holding at most `capacity` items, or unbounded when
    /// `capacity` is zero.
    pub fn new(capacity: usize) -> BoundedHistory<T> {
        BoundedHistory {
            items: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    pub fn unbounded() -> BoundedHistory<T> {
        BoundedHistory::new(0)
    }

    /// Appends an item, evicting the oldest when over capacity.
    pub fn record(&self, item: T) {
        let mut items = self.items.lock();
        items.push_back(item);
        if self.capacity > 0 && items.len() > self.capacity {
            items.pop_front();
        }
    }

    /// Stable point-in-time copy in insertion order.
    pub fn values(&self) -> Vec<T> {
        self.items.lock().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.items.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
