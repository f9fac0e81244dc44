//! # Vote Ledger
//!
//! Applies plus/minus presses to a session's counters.
//!
//! The client reports, per item, the last time each control was pressed rather than a
//! delta. Direction is inferred by comparing the two times:
//!
//! - Neither time newer than what was already applied: nothing changes
//! - Plus strictly newer than minus: increment
//! - Otherwise: decrement, so minus wins ties
//! - Counts never go below zero
//!
//! After a change the full snapshot is written first, then the session is added to the
//! registry. Registry membership therefore never precedes the session's first snapshot.
use catalog::Catalog;
use tracing::debug;

use crate::{
    error::AppError,
    models::{CounterSnapshot, SessionId, Tally},
    store::SharedStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increment,
    Decrement,
}

impl Direction {
    pub fn resolve(plus: u64, minus: u64) -> Self {
        if plus > minus {
            Direction::Increment
        } else {
            Direction::Decrement
        }
    }
}

impl Tally {
    /// Folds one report into the tally. Returns the applied direction, `None` when neither
    /// time moved past what this tally has already seen.
    pub fn apply(&mut self, plus: Option<u64>, minus: Option<u64>) -> Option<Direction> {
        let plus = plus.unwrap_or(0);
        let minus = minus.unwrap_or(0);

        if plus <= self.last_plus && minus <= self.last_minus {
            return None;
        }

        let direction = Direction::resolve(plus, minus);
        self.count = match direction {
            Direction::Increment => self.count.saturating_add(1),
            Direction::Decrement => self.count.saturating_sub(1),
        };
        self.last_plus = self.last_plus.max(plus);
        self.last_minus = self.last_minus.max(minus);

        Some(direction)
    }
}

pub async fn apply_vote(
    store: &SharedStore,
    catalog: &Catalog,
    session: SessionId,
    item: &str,
    plus: Option<u64>,
    minus: Option<u64>,
) -> Result<u32, AppError> {
    if !catalog.contains(item) {
        return Err(AppError::UnknownItem(item.to_string()));
    }

    let mut snapshot = store
        .snapshot(&session)
        .await?
        .unwrap_or_else(|| CounterSnapshot::new(session));

    let tally = snapshot.tallies.entry(item.to_string()).or_default();
    let Some(direction) = tally.apply(plus, minus) else {
        return Ok(tally.count);
    };

    let count = tally.count;
    debug!("{session} {direction:?} {item} -> {count}");

    store.put_snapshot(&snapshot).await?;
    store.register_session(&session).await?;

    Ok(count)
}

/// The session's counts for every catalog item, in catalog order.
pub async fn session_counts(
    store: &SharedStore,
    catalog: &Catalog,
    session: Option<SessionId>,
) -> Result<Vec<(String, u32)>, AppError> {
    let snapshot = match session {
        Some(session) => store.snapshot(&session).await?,
        None => None,
    };

    Ok(catalog
        .keys()
        .map(|key| {
            let count = snapshot.as_ref().map_or(0, |snapshot| snapshot.count(key));
            (key.to_string(), count)
        })
        .collect())
}
