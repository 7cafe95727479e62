//! DeletionQueue - 不要になったリモート資産の削除（best-effort）
//!
//! # 方針
//! - 同じ remote id を何度 enqueue しても 1 件（集合）
//! - id がキューから消えるのは、削除を「試行した後」だけ
//! - 失敗した削除はログに残してキューから外す（自動リトライしない）
//! - 1 件の失敗が他の削除や flush 全体を止めることはない

use std::collections::BTreeSet;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::domain::{DeletionOutcome, FlushReport, RemoteId};
use crate::ports::AssetGateway;

/// Set of remote ids pending best-effort deletion.
#[derive(Debug, Clone, Default)]
pub struct DeletionQueue {
    pending: BTreeSet<RemoteId>,
}

impl DeletionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent insert. Returns `false` when the id was already queued.
    pub fn enqueue(&mut self, remote_id: RemoteId) -> bool {
        self.pending.insert(remote_id)
    }

    pub fn contains(&self, remote_id: &RemoteId) -> bool {
        self.pending.contains(remote_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Ids currently queued, without removing them.
    pub fn snapshot(&self) -> Vec<RemoteId> {
        self.pending.iter().cloned().collect()
    }

    /// Drop every id an attempt was issued for, whatever its outcome.
    pub fn settle(&mut self, report: &FlushReport) {
        for outcome in &report.outcomes {
            self.pending.remove(&outcome.remote_id);
        }
    }

    /// Attempt deletion of every queued id and drop them from the queue.
    pub async fn flush(
        &mut self,
        gateway: &dyn AssetGateway,
        max_concurrent: usize,
    ) -> FlushReport {
        let report = delete_all(self.snapshot(), gateway, max_concurrent).await;
        self.settle(&report);
        report
    }
}

/// Issue one `delete` per id, at most `max_concurrent` at a time.
///
/// Every id gets exactly one attempt; failures are logged per id.
pub async fn delete_all(
    remote_ids: Vec<RemoteId>,
    gateway: &dyn AssetGateway,
    max_concurrent: usize,
) -> FlushReport {
    if remote_ids.is_empty() {
        return FlushReport::default();
    }
    let semaphore = Semaphore::new(max_concurrent.max(1));

    let outcomes = join_all(remote_ids.into_iter().map(|remote_id| {
        let semaphore = &semaphore;
        async move {
            let _permit = semaphore.acquire().await.ok();
            match gateway.delete(&remote_id).await {
                Ok(()) => DeletionOutcome::deleted(remote_id),
                Err(e) => {
                    warn!(remote_id = %remote_id, error = %e, "remote asset deletion failed");
                    DeletionOutcome::failed(remote_id, e.to_string())
                }
            }
        }
    }))
    .await;

    let report = FlushReport { outcomes };
    info!(
        deleted = report.deleted().len(),
        failed = report.failed().len(),
        "deletion queue flushed"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemoryAssetGateway;

    #[test]
    fn enqueue_is_idempotent() {
        let mut queue = DeletionQueue::new();
        assert!(queue.enqueue(RemoteId::from("r1")));
        assert!(!queue.enqueue(RemoteId::from("r1")));
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_enqueue_results_in_single_delete() {
        let gateway = InMemoryAssetGateway::new();
        let mut queue = DeletionQueue::new();
        queue.enqueue(RemoteId::from("r1"));
        queue.enqueue(RemoteId::from("r1"));

        let report = queue.flush(&gateway, 4).await;

        assert_eq!(report.outcomes.len(), 1);
        assert_eq!(gateway.delete_calls(), vec![RemoteId::from("r1")]);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn failed_deletions_are_reported_and_dropped() {
        let gateway = InMemoryAssetGateway::new().fail_delete_of("r2");
        let mut queue = DeletionQueue::new();
        for id in ["r1", "r2", "r3"] {
            queue.enqueue(RemoteId::from(id));
        }

        let report = queue.flush(&gateway, 1).await;

        assert_eq!(report.failed(), vec![RemoteId::from("r2")]);
        assert_eq!(
            report.deleted(),
            vec![RemoteId::from("r1"), RemoteId::from("r3")]
        );
        assert_eq!(gateway.delete_calls().len(), 3);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn settle_keeps_ids_enqueued_during_flush() {
        let gateway = InMemoryAssetGateway::new();
        let mut queue = DeletionQueue::new();
        queue.enqueue(RemoteId::from("r1"));

        let report = delete_all(queue.snapshot(), &gateway, 2).await;
        queue.enqueue(RemoteId::from("late"));
        queue.settle(&report);

        assert_eq!(queue.snapshot(), vec![RemoteId::from("late")]);
    }

    #[tokio::test]
    async fn empty_flush_does_not_touch_gateway() {
        let gateway = InMemoryAssetGateway::new();
        let mut queue = DeletionQueue::new();
        let report = queue.flush(&gateway, 2).await;
        assert!(report.outcomes.is_empty());
        assert!(gateway.delete_calls().is_empty());
    }
}
