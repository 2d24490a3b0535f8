//! Handler state-machine tests with mock upstream APIs.
//!
//! These cover the sync engine's idempotence and consistency guarantees
//! without a network: duplicate deliveries, missing mappings, stale replays.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use casebridge_bus::EventHandler;
use casebridge_core::{SyncError, SyncEvent};

use super::{CloudToHelpdeskHandler, HelpdeskToCloudHandler};
use crate::clients::{NewCaseRequest, SupportCaseApi, TicketApi};
use crate::storage::SyncDatabase;

// =============================================================================
// Mock upstream APIs
// =============================================================================

#[derive(Default)]
struct MockCloud {
    /// When set, every call fails with a transient error.
    fail_transient: bool,
    create_calls: AtomicU32,
    communications: Mutex<Vec<(String, String)>>,
    resolved: Mutex<Vec<String>>,
}

#[async_trait]
impl SupportCaseApi for MockCloud {
    async fn create_case(&self, _request: &NewCaseRequest) -> Result<String, SyncError> {
        if self.fail_transient {
            return Err(SyncError::Transient("cloud 503".into()));
        }
        let n = self.create_calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("C{n}"))
    }

    async fn add_communication(&self, case_id: &str, body: &str) -> Result<(), SyncError> {
        if self.fail_transient {
            return Err(SyncError::Transient("cloud 503".into()));
        }
        self.communications
            .lock()
            .unwrap()
            .push((case_id.to_string(), body.to_string()));
        Ok(())
    }

    async fn resolve_case(&self, case_id: &str) -> Result<(), SyncError> {
        if self.fail_transient {
            return Err(SyncError::Transient("cloud 503".into()));
        }
        self.resolved.lock().unwrap().push(case_id.to_string());
        Ok(())
    }
}

#[derive(Default)]
struct MockHelpdesk {
    comments: Mutex<Vec<(String, String)>>,
    solved: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl TicketApi for MockHelpdesk {
    async fn add_comment(&self, ticket_id: &str, comment: &str) -> Result<(), SyncError> {
        self.comments
            .lock()
            .unwrap()
            .push((ticket_id.to_string(), comment.to_string()));
        Ok(())
    }

    async fn solve(&self, ticket_id: &str, comment: &str) -> Result<(), SyncError> {
        self.solved
            .lock()
            .unwrap()
            .push((ticket_id.to_string(), comment.to_string()));
        Ok(())
    }
}

fn ticket_created(ticket_id: &str, occurred_at: i64) -> SyncEvent {
    SyncEvent::TicketCreated {
        ticket_id: ticket_id.into(),
        subject: "Instance degraded".into(),
        severity_code: "low".into(),
        service_code: "ec2".into(),
        category_code: "performance-issue".into(),
        description: "Our instance is slow since this morning".into(),
        requester_email: Some("user@example.com".into()),
        occurred_at,
    }
}

async fn helpdesk_side() -> (SyncDatabase, Arc<MockCloud>, HelpdeskToCloudHandler) {
    let db = SyncDatabase::open_in_memory().await.unwrap();
    let cloud = Arc::new(MockCloud::default());
    let handler =
        HelpdeskToCloudHandler::new(db.clone(), Arc::clone(&cloud) as Arc<dyn SupportCaseApi>);
    (db, cloud, handler)
}

async fn cloud_side() -> (SyncDatabase, Arc<MockHelpdesk>, CloudToHelpdeskHandler) {
    let db = SyncDatabase::open_in_memory().await.unwrap();
    let helpdesk = Arc::new(MockHelpdesk::default());
    let handler =
        CloudToHelpdeskHandler::new(db.clone(), Arc::clone(&helpdesk) as Arc<dyn TicketApi>);
    (db, helpdesk, handler)
}

// =============================================================================
// Helpdesk → cloud
// =============================================================================

#[tokio::test]
async fn ticket_created_opens_case_and_records_mapping() {
    let (db, cloud, handler) = helpdesk_side().await;

    handler.handle(&ticket_created("T1", 100)).await.unwrap();

    assert_eq!(cloud.create_calls.load(Ordering::SeqCst), 1);
    let mapping = db.get_by_helpdesk_id("T1").await.unwrap().unwrap();
    assert_eq!(mapping.cloud_case_id, "C1");
    assert_eq!(mapping.status, "open");
}

#[tokio::test]
async fn duplicate_ticket_created_opens_exactly_one_case() {
    let (db, cloud, handler) = helpdesk_side().await;

    let event = ticket_created("T1", 100);
    handler.handle(&event).await.unwrap();
    handler.handle(&event).await.unwrap();

    assert_eq!(cloud.create_calls.load(Ordering::SeqCst), 1);
    let mapping = db.get_by_helpdesk_id("T1").await.unwrap().unwrap();
    assert_eq!(mapping.cloud_case_id, "C1");
}

#[tokio::test]
async fn transient_cloud_failure_leaves_no_mapping() {
    let db = SyncDatabase::open_in_memory().await.unwrap();
    let cloud = Arc::new(MockCloud {
        fail_transient: true,
        ..MockCloud::default()
    });
    let handler = HelpdeskToCloudHandler::new(db.clone(), cloud as Arc<dyn SupportCaseApi>);

    let err = handler.handle(&ticket_created("T1", 100)).await.unwrap_err();
    assert!(err.is_transient());
    assert!(db.get_by_helpdesk_id("T1").await.unwrap().is_none());
}

#[tokio::test]
async fn ticket_updated_without_mapping_is_consistency_gap() {
    let (db, cloud, handler) = helpdesk_side().await;

    let err = handler
        .handle(&SyncEvent::TicketUpdated {
            ticket_id: "T-unknown".into(),
            comment: "any news?".into(),
            occurred_at: 100,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::ConsistencyGap(_)));
    // No fabricated mapping, no cloud call
    assert!(db.get_by_helpdesk_id("T-unknown").await.unwrap().is_none());
    assert_eq!(cloud.create_calls.load(Ordering::SeqCst), 0);
    assert!(cloud.communications.lock().unwrap().is_empty());
}

#[tokio::test]
async fn ticket_updated_appends_communication() {
    let (db, cloud, handler) = helpdesk_side().await;
    handler.handle(&ticket_created("T1", 100)).await.unwrap();

    handler
        .handle(&SyncEvent::TicketUpdated {
            ticket_id: "T1".into(),
            comment: "customer added logs".into(),
            occurred_at: 150,
        })
        .await
        .unwrap();

    let comms = cloud.communications.lock().unwrap().clone();
    assert_eq!(comms, vec![("C1".to_string(), "customer added logs".to_string())]);
    let mapping = db.get_by_helpdesk_id("T1").await.unwrap().unwrap();
    assert_eq!(mapping.last_synced_at, 150);
}

#[tokio::test]
async fn redelivered_ticket_update_posts_communication_once() {
    let (db, cloud, handler) = helpdesk_side().await;
    handler.handle(&ticket_created("T1", 100)).await.unwrap();

    let update = SyncEvent::TicketUpdated {
        ticket_id: "T1".into(),
        comment: "customer added logs".into(),
        occurred_at: 150,
    };
    handler.handle(&update).await.unwrap();
    handler.handle(&update).await.unwrap();

    assert_eq!(cloud.communications.lock().unwrap().len(), 1);
    assert_eq!(
        db.get_by_helpdesk_id("T1").await.unwrap().unwrap().last_synced_at,
        150
    );
}

#[tokio::test]
async fn ticket_resolved_twice_resolves_case_once() {
    let (db, cloud, handler) = helpdesk_side().await;
    handler.handle(&ticket_created("T1", 100)).await.unwrap();

    let resolve = SyncEvent::TicketResolved {
        ticket_id: "T1".into(),
        comment: None,
        occurred_at: 200,
    };
    handler.handle(&resolve).await.unwrap();
    handler.handle(&resolve).await.unwrap();

    assert_eq!(cloud.resolved.lock().unwrap().len(), 1);
    let mapping = db.get_by_helpdesk_id("T1").await.unwrap().unwrap();
    assert!(mapping.is_resolved());
}

#[tokio::test]
async fn ticket_resolved_without_mapping_is_noop() {
    let (_db, cloud, handler) = helpdesk_side().await;

    handler
        .handle(&SyncEvent::TicketResolved {
            ticket_id: "T-unknown".into(),
            comment: None,
            occurred_at: 100,
        })
        .await
        .unwrap();

    assert!(cloud.resolved.lock().unwrap().is_empty());
}

// =============================================================================
// Cloud → helpdesk
// =============================================================================

#[tokio::test]
async fn unmapped_case_events_are_noops() {
    let (_db, helpdesk, handler) = cloud_side().await;

    handler
        .handle(&SyncEvent::CaseStatusChanged {
            case_id: "C-foreign".into(),
            status: "pending".into(),
            message: "looking into it".into(),
            occurred_at: 100,
        })
        .await
        .unwrap();
    handler
        .handle(&SyncEvent::CaseResolved {
            case_id: "C-foreign".into(),
            message: None,
            occurred_at: 100,
        })
        .await
        .unwrap();

    assert!(helpdesk.comments.lock().unwrap().is_empty());
    assert!(helpdesk.solved.lock().unwrap().is_empty());
}

#[tokio::test]
async fn status_change_posts_comment_and_advances_cursor() {
    let (db, helpdesk, handler) = cloud_side().await;
    db.insert_mapping("T1", "C1", 100).await.unwrap();

    handler
        .handle(&SyncEvent::CaseStatusChanged {
            case_id: "C1".into(),
            status: "pending-customer-action".into(),
            message: "please confirm".into(),
            occurred_at: 150,
        })
        .await
        .unwrap();

    let comments = helpdesk.comments.lock().unwrap().clone();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].0, "T1");
    assert!(comments[0].1.contains("pending-customer-action"));
    assert_eq!(
        db.get_by_helpdesk_id("T1").await.unwrap().unwrap().last_synced_at,
        150
    );
}

#[tokio::test]
async fn replayed_status_change_does_not_duplicate_comment() {
    let (db, helpdesk, handler) = cloud_side().await;
    db.insert_mapping("T1", "C1", 100).await.unwrap();

    let event = SyncEvent::CaseStatusChanged {
        case_id: "C1".into(),
        status: "work-in-progress".into(),
        message: "engineer assigned".into(),
        occurred_at: 150,
    };
    handler.handle(&event).await.unwrap();
    handler.handle(&event).await.unwrap();

    assert_eq!(helpdesk.comments.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn stale_case_event_is_skipped() {
    let (db, helpdesk, handler) = cloud_side().await;
    db.insert_mapping("T1", "C1", 200).await.unwrap();

    handler
        .handle(&SyncEvent::CaseStatusChanged {
            case_id: "C1".into(),
            status: "pending".into(),
            message: "old news".into(),
            occurred_at: 200,
        })
        .await
        .unwrap();

    assert!(helpdesk.comments.lock().unwrap().is_empty());
}

#[tokio::test]
async fn case_resolved_solves_ticket_and_marks_mapping() {
    let (db, helpdesk, handler) = cloud_side().await;
    db.insert_mapping("T1", "C1", 100).await.unwrap();

    handler
        .handle(&SyncEvent::CaseResolved {
            case_id: "C1".into(),
            message: Some("root cause was a bad deploy".into()),
            occurred_at: 300,
        })
        .await
        .unwrap();

    let solved = helpdesk.solved.lock().unwrap().clone();
    assert_eq!(solved.len(), 1);
    assert_eq!(solved[0].0, "T1");
    assert!(solved[0].1.contains("root cause"));

    let mapping = db.get_by_helpdesk_id("T1").await.unwrap().unwrap();
    assert!(mapping.is_resolved());
    assert_eq!(mapping.last_synced_at, 300);
}

#[tokio::test]
async fn case_opened_only_advances_cursor() {
    let (db, helpdesk, handler) = cloud_side().await;
    db.insert_mapping("T1", "C1", 100).await.unwrap();

    handler
        .handle(&SyncEvent::CaseOpened {
            case_id: "C1".into(),
            occurred_at: 120,
        })
        .await
        .unwrap();

    assert!(helpdesk.comments.lock().unwrap().is_empty());
    assert_eq!(
        db.get_by_helpdesk_id("T1").await.unwrap().unwrap().last_synced_at,
        120
    );
}
