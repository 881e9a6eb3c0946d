//! Change notifications
//!
//! Services publish the kind of entity that changed after every successful
//! mutation. Listeners get no payload; they re-fetch what they display. Each
//! kind also carries a version counter so a caller can poll for changes
//! instead of registering a listener.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// The entity sets a listener can watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Author,
    Book,
    BookCopy,
    Member,
    Loan,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Author => "author",
            Self::Book => "book",
            Self::BookCopy => "copy",
            Self::Member => "member",
            Self::Loan => "loan",
        };
        f.write_str(name)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Callback invoked with the kind of entity that changed
pub type ChangeListener = Arc<dyn Fn(EntityKind) + Send + Sync>;

#[derive(Default)]
struct BusState {
    next_id: u64,
    listeners: Vec<(SubscriptionId, EntityKind, ChangeListener)>,
    versions: HashMap<EntityKind, u64>,
}

/// Listener registry shared by all services of one library
#[derive(Clone, Default)]
pub struct ChangeBus {
    state: Arc<Mutex<BusState>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        // A panicking listener never runs under the lock, so the state is intact
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Registers `listener` for changes to `kind`
    pub fn subscribe(&self, kind: EntityKind, listener: ChangeListener) -> SubscriptionId {
        let mut state = self.lock();
        state.next_id += 1;
        let id = SubscriptionId(state.next_id);
        state.listeners.push((id, kind, listener));
        log::debug!("Subscription {:?} registered for {}", id, kind);
        id
    }

    /// Removes a listener; returns false if `id` was not registered
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.lock();
        let before = state.listeners.len();
        state.listeners.retain(|(sub, _, _)| *sub != id);
        before != state.listeners.len()
    }

    /// Bumps the version of `kind` and calls its listeners
    pub fn publish(&self, kind: EntityKind) {
        let listeners: Vec<ChangeListener> = {
            let mut state = self.lock();
            *state.versions.entry(kind).or_insert(0) += 1;
            state
                .listeners
                .iter()
                .filter(|(_, k, _)| *k == kind)
                .map(|(_, _, listener)| Arc::clone(listener))
                .collect()
        };

        for listener in listeners {
            listener(kind);
        }
    }

    /// Number of changes published for `kind` so far
    pub fn version(&self, kind: EntityKind) -> u64 {
        self.lock().versions.get(&kind).copied().unwrap_or(0)
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
