//! Lifecycle properties against the document repository, including parallel
//! approvals on a file-backed pool.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;

use compliance_tracker::blob::{LocalBlobStore, MemoryBlobStore};
use compliance_tracker::clock::{ManualClock, SystemClock};
use compliance_tracker::db::{DatabaseConfig, DbPool};
use compliance_tracker::document::{ApprovalStatus, DocumentError, DocumentRepository, NewFile};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()
}

fn memory_repo(clock: Arc<ManualClock>) -> DocumentRepository {
    DocumentRepository::new(
        DbPool::open_in_memory().unwrap(),
        Arc::new(MemoryBlobStore::new()),
        clock,
    )
}

#[tokio::test]
async fn test_first_approval_timestamp_is_permanent() {
    let clock = Arc::new(ManualClock::new(start()));
    let repo = memory_repo(clock.clone());
    let id = repo.create("Data Policy", "IT", None).await.unwrap();

    let first = repo.approve(id).await.unwrap();
    let approved_at = first.summary.document_approved.unwrap();

    for _ in 0..5 {
        let again = repo.approve(id).await.unwrap();
        assert_eq!(again.summary.document_approved, Some(approved_at));
        assert_eq!(again.summary.approval_status, ApprovalStatus::Approved);
    }
}

#[tokio::test]
async fn test_last_review_never_decreases() {
    let clock = Arc::new(ManualClock::new(start()));
    let repo = memory_repo(clock.clone());
    let id = repo.create("Retention", "Legal", None).await.unwrap();

    let mut previous = None;
    for step in 0..8 {
        // Jump the clock backwards every third call
        if step % 3 == 2 {
            clock.set(start() - Duration::days(1));
        }
        let detail = if step % 2 == 0 {
            repo.review(id).await.unwrap()
        } else {
            repo.approve(id).await.unwrap()
        };
        let current = detail.summary.last_review;
        assert!(current.is_some());
        assert!(current >= previous, "last_review went backwards at step {step}");
        previous = current;
    }
}

#[tokio::test]
async fn test_approve_without_review_sets_both_fields() {
    let clock = Arc::new(ManualClock::new(start()));
    let repo = memory_repo(clock.clone());
    let id = repo.create("Access Control", "Security", None).await.unwrap();

    let expected = clock.peek();
    let detail = repo.approve(id).await.unwrap();
    assert_eq!(detail.summary.last_review, Some(expected));
    assert_eq!(detail.summary.document_approved, Some(expected));
}

#[tokio::test]
async fn test_review_keeps_approval_fields() {
    let clock = Arc::new(ManualClock::new(start()));
    let repo = memory_repo(clock.clone());

    let pending = repo.create("Pending Doc", "HR", None).await.unwrap();
    let detail = repo.review(pending).await.unwrap();
    assert_eq!(detail.summary.approval_status, ApprovalStatus::Pending);
    assert_eq!(detail.summary.document_approved, None);

    let approved = repo.create("Approved Doc", "HR", None).await.unwrap();
    let before = repo.approve(approved).await.unwrap();
    let after = repo.review(approved).await.unwrap();
    assert_eq!(after.summary.approval_status, ApprovalStatus::Approved);
    assert_eq!(after.summary.document_approved, before.summary.document_approved);
    assert!(after.summary.last_review > before.summary.last_review);
}

#[tokio::test]
async fn test_unknown_document() {
    let repo = memory_repo(Arc::new(ManualClock::new(start())));
    let missing = uuid::Uuid::new_v4();

    assert!(matches!(repo.review(missing).await, Err(DocumentError::NotFound(_))));
    assert!(matches!(repo.approve(missing).await, Err(DocumentError::NotFound(_))));
    assert!(matches!(repo.get(missing).await, Err(DocumentError::NotFound(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_approvals_agree_on_first_timestamp() {
    let temp = TempDir::new().unwrap();
    let config = DatabaseConfig {
        path: temp.path().join("compliance.db").display().to_string(),
        pool_size: 4,
        ..Default::default()
    };
    let pool = DbPool::open(&config).unwrap();
    let blobs = Arc::new(LocalBlobStore::open(temp.path().join("uploads")).unwrap());
    let repo = DocumentRepository::new(pool.clone(), blobs, Arc::new(SystemClock));

    let id = repo.create("Concurrency", "Ops", None).await.unwrap();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let repo = repo.clone();
        tasks.push(tokio::spawn(async move { repo.approve(id).await }));
    }

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap().unwrap());
    }

    let stored = repo.get(id).await.unwrap();
    let approved_at = stored.document_approved.unwrap();
    let latest_review = results
        .iter()
        .filter_map(|d| d.summary.last_review)
        .max()
        .unwrap();

    // Every caller saw the same first approval
    for detail in &results {
        assert_eq!(detail.summary.document_approved, Some(approved_at));
        assert!(detail.summary.last_review.unwrap() >= approved_at);
    }
    // ...and it is the time of the approval that committed first
    assert_eq!(
        Some(approved_at),
        results.iter().filter_map(|d| d.summary.last_review).min()
    );
    assert_eq!(stored.last_review, Some(latest_review));

    pool.close();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reviews_and_approvals_keep_latest_review() {
    let temp = TempDir::new().unwrap();
    let config = DatabaseConfig {
        path: temp.path().join("compliance.db").display().to_string(),
        pool_size: 4,
        ..Default::default()
    };
    let pool = DbPool::open(&config).unwrap();
    let repo = DocumentRepository::new(
        pool.clone(),
        Arc::new(MemoryBlobStore::new()),
        Arc::new(SystemClock),
    );

    let id = repo.create("Mixed Traffic", "Ops", None).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..10 {
        let repo = repo.clone();
        tasks.push(tokio::spawn(async move {
            let approving = i % 2 == 0;
            let detail = if approving {
                repo.approve(id).await
            } else {
                repo.review(id).await
            };
            (approving, detail.unwrap())
        }));
    }

    let mut results = Vec::new();
    for task in tasks {
        results.push(task.await.unwrap());
    }

    let stored = repo.get(id).await.unwrap();
    let latest_review = results
        .iter()
        .filter_map(|(_, d)| d.summary.last_review)
        .max();
    assert_eq!(stored.last_review, latest_review);
    assert_eq!(stored.approval_status, ApprovalStatus::Approved);

    let approvals: Vec<_> = results
        .iter()
        .filter(|(approving, _)| *approving)
        .map(|(_, d)| d)
        .collect();
    for detail in &approvals {
        assert_eq!(detail.summary.document_approved, stored.document_approved);
    }
    assert_eq!(
        stored.document_approved,
        approvals.iter().filter_map(|d| d.summary.last_review).min()
    );

    pool.close();
}

#[tokio::test]
async fn test_abandoned_query_does_not_break_later_requests() {
    let pool = DbPool::open_in_memory().unwrap();
    let repo = DocumentRepository::new(
        pool.clone(),
        Arc::new(MemoryBlobStore::new()),
        Arc::new(ManualClock::new(start())),
    );
    let id = repo.create("Data Policy", "IT", None).await.unwrap();

    let slow = pool.run(|_| {
        std::thread::sleep(std::time::Duration::from_millis(200));
        Ok(())
    });
    assert!(tokio::time::timeout(std::time::Duration::from_millis(20), slow)
        .await
        .is_err());

    let approved = repo.approve(id).await.unwrap();
    assert_eq!(approved.summary.approval_status, ApprovalStatus::Approved);
    assert_eq!(
        repo.get(id).await.unwrap().document_approved,
        approved.summary.document_approved
    );
}

#[tokio::test]
async fn test_file_round_trip_on_disk() {
    let temp = TempDir::new().unwrap();
    let repo = DocumentRepository::new(
        DbPool::open_in_memory().unwrap(),
        Arc::new(LocalBlobStore::open(temp.path().join("uploads")).unwrap()),
        Arc::new(SystemClock),
    );

    let data: Vec<u8> = (0..=255u8).cycle().take(10_000).collect();
    let id = repo
        .create(
            "Binary Policy",
            "IT",
            Some(NewFile {
                file_name: "policy scan.pdf".into(),
                data: data.clone(),
            }),
        )
        .await
        .unwrap();

    let content = repo.get_content(id).await.unwrap();
    assert_eq!(content.file_name, "policy scan.pdf");
    assert_eq!(content.data, data);
}
