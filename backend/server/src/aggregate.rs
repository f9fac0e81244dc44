//! # Aggregator
//!
//! Sums every registered session's counters per item.
//!
//! Recomputed from scratch on each report request. The catalog and the number of sessions
//! are both small enough that incremental totals are not worth the bookkeeping.
use catalog::Catalog;
use tracing::debug;

use crate::{error::AppError, models::AggregateReport, store::SharedStore};

pub async fn compute_report(store: &SharedStore, catalog: &Catalog) -> Result<AggregateReport, AppError> {
    let mut counts = vec![0u64; catalog.items().len()];

    for session in store.sessions().await? {
        let Some(snapshot) = store.snapshot(&session).await? else {
            return Err(AppError::MissingSnapshot(session));
        };

        for (key, tally) in &snapshot.tallies {
            match catalog.position(key) {
                Some(index) => counts[index] += u64::from(tally.count),
                None => debug!("Skipping {key} from {session}, not in catalog"),
            }
        }
    }

    Ok(AggregateReport {
        items: catalog.keys().map(str::to_string).collect(),
        counts,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use catalog::Entry;

    use super::*;
    use crate::{
        ledger::apply_vote,
        memory::MemoryStore,
        models::{CounterSnapshot, SessionId, Tally},
    };

    fn catalog() -> Catalog {
        Catalog::from_entries(
            ["A", "B"]
                .into_iter()
                .map(|name| Entry {
                    name: name.into(),
                    description: String::new(),
                })
                .collect(),
        )
        .unwrap()
    }

    async fn seed(store: &SharedStore, counts: &[(&str, u32)]) -> SessionId {
        let session = SessionId::generate();
        let tallies: BTreeMap<String, Tally> = counts
            .iter()
            .map(|(key, count)| {
                (
                    key.to_string(),
                    Tally {
                        count: *count,
                        ..Tally::default()
                    },
                )
            })
            .collect();

        store
            .put_snapshot(&CounterSnapshot { session, tallies })
            .await
            .unwrap();
        store.register_session(&session).await.unwrap();

        session
    }

    #[tokio::test]
    async fn test_empty_report() {
        let store = SharedStore::new(MemoryStore::new());
        let report = compute_report(&store, &catalog()).await.unwrap();

        assert_eq!(report.items, ["A", "B"]);
        assert_eq!(report.counts, [0, 0]);
    }

    #[tokio::test]
    async fn test_sums_sessions() {
        let store = SharedStore::new(MemoryStore::new());
        seed(&store, &[("A", 2), ("B", 0)]).await;
        seed(&store, &[("A", 1), ("B", 3)]).await;

        let report = compute_report(&store, &catalog()).await.unwrap();

        assert_eq!(report.items, ["A", "B"]);
        assert_eq!(report.counts, [3, 3]);
    }

    #[tokio::test]
    async fn test_items_outside_catalog_ignored() {
        let store = SharedStore::new(MemoryStore::new());
        seed(&store, &[("B", 4), ("Retired", 9)]).await;

        let report = compute_report(&store, &catalog()).await.unwrap();

        assert_eq!(report.items, ["A", "B"]);
        assert_eq!(report.counts, [0, 4]);
    }

    #[tokio::test]
    async fn test_missing_snapshot_is_fatal() {
        let store = SharedStore::new(MemoryStore::new());
        seed(&store, &[("A", 1)]).await;
        let orphan = SessionId::generate();
        store.register_session(&orphan).await.unwrap();

        assert!(matches!(
            compute_report(&store, &catalog()).await,
            Err(AppError::MissingSnapshot(session)) if session == orphan
        ));
    }

    #[tokio::test]
    async fn test_concurrent_voters() {
        let store = SharedStore::new(MemoryStore::new());
        let catalog = catalog();

        let handles: Vec<_> = (0..16u64)
            .map(|i| {
                let store = store.clone();
                let catalog = catalog.clone();
                tokio::spawn(async move {
                    let session = SessionId::generate();
                    apply_vote(&store, &catalog, session, "A", Some(i + 1), None).await?;
                    apply_vote(&store, &catalog, session, "B", Some(i + 1), None).await?;
                    apply_vote(&store, &catalog, session, "B", Some(i + 1), Some(i + 2)).await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let report = compute_report(&store, &catalog).await.unwrap();
        assert_eq!(report.counts, [16, 0]);
        assert_eq!(store.sessions().await.unwrap().len(), 16);
    }
}
