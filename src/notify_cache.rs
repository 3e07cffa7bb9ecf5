use {
    std::{
        collections::{HashMap, VecDeque},
        time::{Duration, Instant},
    },
    stratum::{JobId, Notify},
};

/// A cached notification: the decoded upstream payload plus the
/// bookkeeping the generator itself owns. `notify.job_id` is overwritten
/// on insert to the local id; the original upstream id is kept in
/// `upstream_job_id` so it can be restored when re-keying an outbound
/// `mining.submit`.
#[derive(Debug, Clone)]
pub struct Entry {
    pub local_id: JobId,
    pub notify: Notify,
    pub upstream_job_id: String,
    pub received_at: Instant,
}

/// Hash-indexed store of received jobs, keyed by a locally assigned id,
/// with age-ordered eviction and a pointer to the most recent entry.
#[derive(Debug)]
pub struct NotifyCache {
    entries: HashMap<JobId, Entry>,
    order: VecDeque<JobId>,
    current: Option<JobId>,
    next_id: JobId,
}

impl Default for NotifyCache {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyCache {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            current: None,
            next_id: JobId::new(0),
        }
    }

    /// Assigns the next monotonic local id to `notify`, publishes it as
    /// the current notification, and returns the id.
    pub fn insert(&mut self, mut notify: Notify, now: Instant) -> JobId {
        let local_id = self.next_id;
        self.next_id = self.next_id.next();

        let upstream_job_id = notify.job_id.to_string();
        notify.job_id = local_id;

        self.entries.insert(
            local_id,
            Entry {
                local_id,
                notify,
                upstream_job_id,
                received_at: now,
            },
        );
        self.order.push_back(local_id);
        self.current = Some(local_id);

        local_id
    }

    pub fn get(&self, id: JobId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    pub fn current(&self) -> Option<&Entry> {
        self.current.and_then(|id| self.entries.get(&id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discards every entry, for use on reconnect: the upstream job
    /// namespace is no longer valid once the session is torn down.
    pub fn flush(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.current = None;
    }

    /// Evicts entries older than `max_age`, oldest first, stopping once
    /// `retention_floor` entries remain. Returns the number evicted.
    pub fn age(&mut self, now: Instant, max_age: Duration, retention_floor: usize) -> usize {
        let mut evicted = 0;

        while self.order.len() > retention_floor {
            let oldest = *self.order.front().expect("order non-empty, checked above");
            let age = now.saturating_duration_since(
                self.entries
                    .get(&oldest)
                    .expect("order and entries stay in sync")
                    .received_at,
            );

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

    fn sample_notify(job_id: &str) -> Notify {
        Notify {
            job_id: job_id.parse().unwrap(),
            prevhash: "4d16b6f85af6e2198f44ae2a6de67f78487ae5611b77c6c0440b921e00000000"
                .parse()
                .unwrap(),
            coinb1: "c1".into(),
            coinb2: "c2".into(),
            merkle_branches: Vec::new(),
            version: "00000002".parse().unwrap(),
            nbits: "1c2ac4af".parse().unwrap(),
            ntime: "504e86b9".parse().unwrap(),
            clean_jobs: false,
        }
    }

    #[test]
    fn insert_assigns_monotonic_local_ids_and_remembers_upstream_id() {
        let mut cache = NotifyCache::new();
        let now = Instant::now();

        let first = cache.insert(sample_notify("aa"), now);
        let second = cache.insert(sample_notify("bb"), now);

        assert!(first < second);
        assert_eq!(cache.get(first).unwrap().upstream_job_id, "aa");
        assert_eq!(cache.get(second).unwrap().upstream_job_id, "bb");
        assert_eq!(cache.current().unwrap().local_id, second);
    }

    #[test]
    fn current_notify_tracks_most_recent_insert() {
        let mut cache = NotifyCache::new();
        let now = Instant::now();
        assert!(cache.current().is_none());

        let id = cache.insert(sample_notify("aa"), now);
        assert_eq!(cache.current().unwrap().local_id, id);
    }

    #[test]
    fn flush_clears_everything() {
        let mut cache = NotifyCache::new();
        let now = Instant::now();
        cache.insert(sample_notify("aa"), now);
        cache.insert(sample_notify("bb"), now);

        cache.flush();

        assert!(cache.is_empty());
        assert!(cache.current().is_none());
    }

    #[test]
    fn below_retention_floor_nothing_is_aged_out() {
        let mut cache = NotifyCache::new();
        let base = Instant::now();
        cache.insert(sample_notify("aa"), base);
        cache.insert(sample_notify("bb"), base);

        let far_future = base + Duration::from_secs(10_000);
        let evicted = cache.age(far_future, Duration::from_secs(600), 3);

        assert_eq!(evicted, 0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn ages_out_oldest_entries_beyond_the_retention_floor() {
        let mut cache = NotifyCache::new();
        let base = Instant::now();

        let ids: Vec<JobId> = (0..10u64)
            .map(|i| cache.insert(sample_notify(&format!("{i:x}")), base + Duration::from_secs(i)))
            .collect();

        let now = base + Duration::from_secs(709);
        let evicted = cache.age(now, Duration::from_secs(600), 3);

        assert_eq!(evicted, 7);
        assert_eq!(cache.len(), 3);

        for id in &ids[..7] {
            assert!(cache.get(*id).is_none());
        }
        for id in &ids[7..] {
            assert!(cache.get(*id).is_some());
        }
    }
}
