//! Storage layer tests for the CaseBridge sync server.

use casebridge_bus::DeadLetter;
use casebridge_core::{SyncError, SyncEvent};

use super::db::SyncDatabase;
use super::models::MappingStatus;

async fn test_db() -> SyncDatabase {
    SyncDatabase::open_in_memory().await.unwrap()
}

// === Identity map tests ===

#[tokio::test]
async fn insert_and_lookup_both_directions() {
    let db = test_db().await;
    assert!(db.insert_mapping("T1", "C1", 100).await.unwrap());

    let forward = db.get_by_helpdesk_id("T1").await.unwrap().unwrap();
    assert_eq!(forward.cloud_case_id, "C1");
    assert_eq!(forward.status, "open");
    assert_eq!(forward.last_synced_at, 100);

    let reverse = db.get_by_cloud_case_id("C1").await.unwrap().unwrap();
    assert_eq!(reverse.helpdesk_ticket_id, "T1");

    assert!(db.get_by_helpdesk_id("T2").await.unwrap().is_none());
    assert!(db.get_by_cloud_case_id("C2").await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_insert_is_rejected_without_error() {
    let db = test_db().await;
    assert!(db.insert_mapping("T1", "C1", 100).await.unwrap());
    assert!(!db.insert_mapping("T1", "C99", 200).await.unwrap());

    // First writer wins; the row is untouched
    let mapping = db.get_by_helpdesk_id("T1").await.unwrap().unwrap();
    assert_eq!(mapping.cloud_case_id, "C1");
    assert_eq!(mapping.last_synced_at, 100);
}

#[tokio::test]
async fn update_status_requires_strictly_newer_timestamp() {
    let db = test_db().await;
    db.insert_mapping("T1", "C1", 100).await.unwrap();

    // Older timestamp: no-op
    assert!(
        !db.update_status("T1", MappingStatus::Resolved, 50)
            .await
            .unwrap()
    );
    // Equal timestamp: no-op
    assert!(
        !db.update_status("T1", MappingStatus::Resolved, 100)
            .await
            .unwrap()
    );
    let mapping = db.get_by_helpdesk_id("T1").await.unwrap().unwrap();
    assert_eq!(mapping.status, "open");
    assert_eq!(mapping.last_synced_at, 100);

    // Strictly newer: applied
    assert!(
        db.update_status("T1", MappingStatus::Resolved, 101)
            .await
            .unwrap()
    );
    let mapping = db.get_by_helpdesk_id("T1").await.unwrap().unwrap();
    assert!(mapping.is_resolved());
    assert_eq!(mapping.last_synced_at, 101);
}

#[tokio::test]
async fn update_status_on_missing_mapping_is_noop() {
    let db = test_db().await;
    assert!(
        !db.update_status("nope", MappingStatus::Resolved, 100)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn touch_synced_follows_newer_wins_rule() {
    let db = test_db().await;
    db.insert_mapping("T1", "C1", 100).await.unwrap();

    assert!(db.touch_synced("T1", 150).await.unwrap());
    assert!(!db.touch_synced("T1", 150).await.unwrap());
    assert!(!db.touch_synced("T1", 120).await.unwrap());

    let mapping = db.get_by_helpdesk_id("T1").await.unwrap().unwrap();
    assert_eq!(mapping.last_synced_at, 150);
    // Touch never changes status
    assert_eq!(mapping.status, "open");
}

#[tokio::test]
async fn put_mapping_overwrites_by_key() {
    let db = test_db().await;
    db.insert_mapping("T1", "C1", 100).await.unwrap();

    let mut mapping = db.get_by_helpdesk_id("T1").await.unwrap().unwrap();
    mapping.status = MappingStatus::Resolved.as_str().to_string();
    mapping.last_synced_at = 500;
    db.put_mapping(&mapping).await.unwrap();

    let stored = db.get_by_helpdesk_id("T1").await.unwrap().unwrap();
    assert!(stored.is_resolved());
    assert_eq!(stored.last_synced_at, 500);
}

// === Dead-letter tests ===

#[tokio::test]
async fn record_and_list_dead_letters() {
    let db = test_db().await;

    let event = SyncEvent::TicketUpdated {
        ticket_id: "T1".into(),
        comment: "still broken".into(),
        occurred_at: 1_700_000_000,
    };
    let err = SyncError::ConsistencyGap("no mapping for ticket T1".into());
    let dead = DeadLetter::new("helpdesk-to-cloud", event, 3, &err);
    db.record_dead_letter(&dead).await.unwrap();

    let rows = db.list_dead_letters(10).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].handler, "helpdesk-to-cloud");
    assert_eq!(rows[0].attempts, 3);
    assert_eq!(rows[0].classification, "consistency_gap");

    // Payload round-trips to the original event
    let stored: SyncEvent = serde_json::from_str(&rows[0].payload).unwrap();
    assert_eq!(stored.native_id(), "T1");
    assert_eq!(stored.kind(), "ticket_updated");
}

#[tokio::test]
async fn list_dead_letters_respects_limit() {
    let db = test_db().await;

    for i in 0..5 {
        let event = SyncEvent::CaseResolved {
            case_id: format!("C{i}"),
            message: None,
            occurred_at: 1_700_000_000 + i,
        };
        let err = SyncError::Transient("timeout".into());
        db.record_dead_letter(&DeadLetter::new("cloud-to-helpdesk", event, 3, &err))
            .await
            .unwrap();
    }

    assert_eq!(db.list_dead_letters(3).await.unwrap().len(), 3);
    assert_eq!(db.list_dead_letters(10).await.unwrap().len(), 5);
}
