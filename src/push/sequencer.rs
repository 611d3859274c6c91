//! Per-task monotonic event sequence numbers. In-process only: the counter
//! resets on restart (see the boot-epoch discussion in DESIGN.md).

use dashmap::DashMap;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct Sequencer {
    counters: DashMap<Uuid, u64>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments before returning, so concurrent callers for the same
    /// `task_id` each get a distinct, strictly increasing sequence number.
    pub fn next(&self, task_id: Uuid) -> u64 {
        let mut entry = self.counters.entry(task_id).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn reset(&self, task_id: Uuid) {
        self.counters.remove(&task_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_starts_at_one_and_increments() {
        let sequencer = Sequencer::new();
        let task_id = Uuid::new_v4();
        assert_eq!(sequencer.next(task_id), 1);
        assert_eq!(sequencer.next(task_id), 2);
        assert_eq!(sequencer.next(task_id), 3);
    }

    #[test]
    fn sequences_are_independent_per_task() {
        let sequencer = Sequencer::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(sequencer.next(a), 1);
        assert_eq!(sequencer.next(b), 1);
        assert_eq!(sequencer.next(a), 2);
    }

    #[test]
    fn many_concurrent_increments_remain_distinct() {
        use std::sync::Arc;
        use std::thread;

        let sequencer = Arc::new(Sequencer::new());
        let task_id = Uuid::new_v4();
        let mut handles = Vec::new();
        for _ in 0..10 {
            let sequencer = sequencer.clone();
            handles.push(thread::spawn(move || {
                let mut seen = Vec::new();
                for _ in 0..100 {
                    seen.push(sequencer.next(task_id));
                }
                seen
            }));
        }
        let mut all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 1000);
        assert_eq!(*all.last().unwrap(), 1000);
    }
}
