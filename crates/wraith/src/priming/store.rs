//! The indexed priming store: pattern-to-queue mappings with an exact-key
//! fast path and a partial-match fallback scan.

use super::queue::DefaultingQueue;
use super::{DefaultSnapshot, PrimedMapping, PrimedResponses};
use crate::model::{matches, AppRequest, AppResponse, DefaultResponse, HeaderlessKey, RequestPattern};
use parking_lot::Mutex;
use tracing::debug;

struct Entry {
    pattern: RequestPattern,
    key: HeaderlessKey,
    queue: DefaultingQueue,
}

/// Mutable, insertion-ordered collection of primed mappings.
///
/// The whole store is one critical section: every mutation and every
/// snapshot executes under a single exclusive lock, so a match-pop-remove
/// sequence is indivisible and two concurrent requests can never consume
/// the same queued response.
///
/// Lookup runs in two passes over insertion order. The first pass narrows
/// to entries whose header-stripped key equals the request's projection
/// (the exact-key fast path); only if that yields nothing does the second
/// pass try the full match predicate against every entry. Both passes use
/// ascending insertion order, so tie-breaks between overlapping patterns
/// are deterministic.
#[derive(Default)]
pub struct PrimingStore {
    entries: Mutex<Vec<Entry>>,
}

impl PrimingStore {
    pub fn new() -> PrimingStore {
        PrimingStore::default()
    }

    /// Appends `response` to the queue primed for `pattern`, creating the
    /// mapping if the pattern has not been primed before.
    pub fn add(&self, pattern: RequestPattern, response: AppResponse) {
        let mut entries = self.entries.lock();
        let queue = Self::queue_for_pattern(&mut entries, pattern);
        queue.append(response);
    }

    /// Sets (overwriting) the default response for `pattern`, creating the
    /// mapping if the pattern has not been primed before.
    pub fn add_default(&self, pattern: RequestPattern, default: DefaultResponse) {
        let mut entries = self.entries.lock();
        let queue = Self::queue_for_pattern(&mut entries, pattern);
        queue.set_default(default);
    }

    /// Adds every primed response and the default of an uploaded mapping.
    /// A mapping with nothing primed and no usable default is skipped: an
    /// entry that cannot serve anything must never enter the store, where
    /// it would shadow later matching entries.
    pub fn add_mapping(&self, mapping: PrimedMapping) {
        let default = match mapping.responses.default {
            Some(DefaultSnapshot::Response(response)) => {
                Some(DefaultResponse::Static(response))
            }
            _ => None,
        };
        if mapping.responses.primed.is_empty() && default.is_none() {
            debug!(pattern = ?mapping.request, "skipping unservable mapping");
            return;
        }

        let mut entries = self.entries.lock();
        let queue = Self::queue_for_pattern(&mut entries, mapping.request);
        for response in mapping.responses.primed {
            queue.append(response);
        }
        if let Some(default) = default {
            queue.set_default(default);
        }
    }

    fn queue_for_pattern<'a>(
        entries: &'a mut Vec<Entry>,
        pattern: RequestPattern,
    ) -> &'a mut DefaultingQueue {
        if let Some(index) = entries.iter().position(|entry| entry.pattern == pattern) {
            return &mut entries[index].queue;
        }
        let key = pattern.headerless_key();
        entries.push(Entry {
            pattern,
            key,
            queue: DefaultingQueue::new(),
        });
        &mut entries.last_mut().expect("entry just pushed").queue
    }

    /// Finds the first pattern matching `request` and consumes one response
    /// from its queue. A mapping left with nothing primed and no default is
    /// removed. Returns `None` when no pattern matches.
    pub fn find_and_consume(&self, request: &AppRequest) -> Option<AppResponse> {
        let mut entries = self.entries.lock();
        let projection = request.headerless_projection();

        let index = entries
            .iter()
            .position(|entry| entry.key == projection && matches(&entry.pattern, request))
            .or_else(|| {
                entries
                    .iter()
                    .position(|entry| matches(&entry.pattern, request))
            })?;

        let response = entries[index].queue.consume();
        if entries[index].queue.is_exhausted() {
            debug!(path = %request.path, "priming exhausted, removing mapping");
            entries.remove(index);
        }
        response
    }

    /// Empties the entire store.
    pub fn reset(&self) {
        self.entries.lock().clear();
    }

    /// Point-in-time copy of all current mappings, in insertion order.
    pub fn snapshot(&self) -> Vec<PrimedMapping> {
        let entries = self.entries.lock();
        entries
            .iter()
            .map(|entry| PrimedMapping {
                request: entry.pattern.clone(),
                responses: PrimedResponses {
                    primed: entry.queue.primed().cloned().collect(),
                    default: entry.queue.default_response().map(DefaultSnapshot::from),
                },
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
