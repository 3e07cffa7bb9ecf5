use {
    serde_json::Value,
    std::{
        collections::{HashMap, VecDeque},
        time::{Duration, Instant},
    },
    stratum::JobId,
};

/// Correlation record for a submission in flight to the upstream pool.
#[derive(Debug, Clone)]
pub struct ShareInFlight {
    pub local_id: JobId,
    pub client_id: u64,
    pub msg_id: Value,
    pub submitted_at: Instant,
}

/// Hash-indexed store of outstanding upstream submissions, keyed by a
/// locally assigned id, reaped unconditionally after a fixed TTL.
#[derive(Debug)]
pub struct ShareTracker {
    entries: HashMap<JobId, ShareInFlight>,
    order: VecDeque<JobId>,
    next_id: JobId,
}

impl Default for ShareTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareTracker {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            next_id: JobId::new(0),
        }
    }

    pub fn insert(&mut self, client_id: u64, msg_id: Value, now: Instant) -> JobId {
        let local_id = self.next_id;
        self.next_id = self.next_id.next();

        self.entries.insert(
            local_id,
            ShareInFlight {
                local_id,
                client_id,
                msg_id,
                submitted_at: now,
            },
        );
        self.order.push_back(local_id);

        local_id
    }

    /// Removes and returns the record for `id`, if still tracked. A miss
    /// means either the response already arrived once, or the entry was
    /// reaped; both are correlation misses the caller should log and drop.
    pub fn remove(&mut self, id: JobId) -> Option<ShareInFlight> {
        let removed = self.entries.remove(&id);
        if removed.is_some() {
            self.order.retain(|queued| *queued != id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unconditionally reaps entries older than `max_age`. Unlike the
    /// notification cache there is no retention floor: a share that has
    /// waited this long will never correlate successfully.
    pub fn age(&mut self, now: Instant, max_age: Duration) -> usize {
        let mut evicted = 0;

        while let Some(oldest) = self.order.front().copied() {
            let age = match self.entries.get(&oldest) {
                Some(entry) => now.saturating_duration_since(entry.submitted_at),
                None => {
                    // Already removed via `remove`; drop the stale queue entry.
                    self.order.pop_front();
                    continue;
                }
            };

            if age > max_age {
                self.order.pop_front();
                self.entries.remove(&oldest);
                evicted += 1;
            } else {
                break;
            }
        }

        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_remove_round_trips() {
        let mut tracker = ShareTracker::new();
        let now = Instant::now();

        let id = tracker.insert(7, serde_json::json!(42), now);
        let removed = tracker.remove(id).unwrap();

        assert_eq!(removed.client_id, 7);
        assert_eq!(removed.msg_id, serde_json::json!(42));
        assert!(tracker.is_empty());
    }

    #[test]
    fn remove_of_unknown_id_is_a_correlation_miss() {
        let mut tracker = ShareTracker::new();
        assert!(tracker.remove(JobId::new(999)).is_none());
    }

    #[test]
    fn remove_after_reap_is_also_a_miss() {
        let mut tracker = ShareTracker::new();
        let base = Instant::now();
        let id = tracker.insert(1, serde_json::json!(1), base);

        tracker.age(base + Duration::from_secs(121), Duration::from_secs(120));

        assert!(tracker.remove(id).is_none());
    }

    #[test]
    fn age_reaps_unconditionally_past_the_ttl() {
        let mut tracker = ShareTracker::new();
        let base = Instant::now();

        let stale = tracker.insert(1, serde_json::json!(1), base);
        let fresh = tracker.insert(2, serde_json::json!(2), base + Duration::from_secs(119));

        let evicted = tracker.age(base + Duration::from_secs(121), Duration::from_secs(120));

        assert_eq!(evicted, 1);
        assert!(tracker.remove(stale).is_none());
        assert!(tracker.remove(fresh).is_some());
    }
}
