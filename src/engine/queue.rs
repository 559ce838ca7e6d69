// src/engine/queue.rs

use std::collections::BTreeSet;
use std::path::PathBuf;

/// Pending file changes, waiting for the next rebuild.
///
/// Depth is one batch: however many change events arrive before or during a
/// rebuild, they collapse into a single follow-up rebuild. Paths are kept
/// sorted and unique for logging.
#[derive(Debug, Default)]
pub struct ChangeQueue {
    paths: BTreeSet<PathBuf>,
    events: usize,
}

impl ChangeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one change event.
    pub fn record<I>(&mut self, paths: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.paths.extend(paths);
        self.events += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.events == 0
    }

    /// Number of events folded into the pending batch.
    pub fn events(&self) -> usize {
        self.events
    }

    /// Take the pending batch, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<PathBuf> {
        self.events = 0;
        std::mem::take(&mut self.paths).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesces_events_into_one_batch() {
        let mut q = ChangeQueue::new();
        assert!(q.is_empty());

        q.record([PathBuf::from("js/b.js")]);
        q.record([PathBuf::from("js/a.js"), PathBuf::from("js/b.js")]);

        assert_eq!(q.events(), 2);
        assert_eq!(
            q.drain(),
            vec![PathBuf::from("js/a.js"), PathBuf::from("js/b.js")]
        );
        assert!(q.is_empty());
        assert!(q.drain().is_empty());
    }

    #[test]
    fn event_without_paths_still_counts() {
        let mut q = ChangeQueue::new();
        q.record(Vec::new());
        assert!(!q.is_empty());
    }
}
