use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use time::OffsetDateTime;

use crate::listings::model::{Category, Listing};

/// The materialized working set of one completed fetch. Consumers filter
/// and sort over copies of it; the snapshot itself is immutable.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub listings: Vec<Listing>,
    pub categories: Vec<Category>,
    pub fetched_at: OffsetDateTime,
}

/// Ticket drawn at the start of a refresh. Commit order between
/// overlapping refreshes is decided by ticket order, not completion order.
#[derive(Debug)]
pub struct RefreshTicket(u64);

pub enum CommitOutcome {
    Applied(Arc<FeedSnapshot>),
    /// A refresh that started later already committed; the stale result is
    /// dropped and the newer committed snapshot returned instead.
    Stale(Arc<FeedSnapshot>),
}

impl CommitOutcome {
    pub fn snapshot(self) -> Arc<FeedSnapshot> {
        match self {
            CommitOutcome::Applied(s) | CommitOutcome::Stale(s) => s,
        }
    }
}

/// Holds the only snapshot visible to consumers. A monotonic sequence
/// number guards against an older in-flight refresh overwriting a newer
/// completed one; the superseded fetch is soft-cancelled by ignoring its
/// result rather than aborting the remote read.
#[derive(Default)]
pub struct FeedCache {
    next_seq: AtomicU64,
    committed: Mutex<Option<(u64, Arc<FeedSnapshot>)>>,
}

impl FeedCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> RefreshTicket {
        RefreshTicket(self.next_seq.fetch_add(1, Ordering::Relaxed) + 1)
    }

    pub fn commit(&self, ticket: RefreshTicket, snapshot: FeedSnapshot) -> CommitOutcome {
        let mut committed = self.committed.lock().expect("feed cache lock");
        match &*committed {
            Some((seq, newer)) if ticket.0 <= *seq => CommitOutcome::Stale(Arc::clone(newer)),
            _ => {
                let snapshot = Arc::new(snapshot);
                *committed = Some((ticket.0, Arc::clone(&snapshot)));
                CommitOutcome::Applied(snapshot)
            }
        }
    }

    pub fn latest(&self) -> Option<Arc<FeedSnapshot>> {
        self.committed
            .lock()
            .expect("feed cache lock")
            .as_ref()
            .map(|(_, snapshot)| Arc::clone(snapshot))
    }
}
