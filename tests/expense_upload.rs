mod util;

use async_trait::async_trait;
use autovault::commands::{self, AttachmentInput, NewExpense, NewVehicle};
use autovault::remote::{BlobStore, CancelFlag, LocalBlobStore, ProgressFn};
use autovault::store::{Filter, SortOrder};
use autovault::{AppError, AppResult, Store};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Succeeds for `allow` uploads, then fails.
struct FlakyBlobStore {
    allow: usize,
    attempts: AtomicUsize,
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn upload(
        &self,
        path: &str,
        _bytes: &[u8],
        _progress: Option<ProgressFn>,
        _cancel: &CancelFlag,
    ) -> AppResult<String> {
        let n = self.attempts.fetch_add(1, Ordering::SeqCst);
        if n < self.allow {
            Ok(format!("mock://{path}"))
        } else {
            Err(AppError::new("HTTP/CONNECT", "storage unreachable"))
        }
    }
}

async fn setup() -> (Store, String, String) {
    let pool = util::memory_pool().await;
    let owner = util::seed_user(&pool, "owner@example.com", "user").await;
    let store = Store::new(pool);
    let vehicle = commands::add_vehicle(
        &store,
        &owner,
        NewVehicle {
            make: "Toyota".into(),
            model: "Hilux".into(),
            year: 2020,
            ..NewVehicle::default()
        },
    )
    .await
    .unwrap();
    (store, owner, vehicle.id)
}

fn receipt_expense(vehicle_id: &str) -> NewExpense {
    NewExpense {
        vehicle_id: vehicle_id.to_string(),
        amount: 300.0,
        amount_secondary: None,
        date: "2024-02-20".into(),
        category: "DISC_RENEWAL".into(),
        description: "annual disc".into(),
    }
}

fn attachments() -> Vec<AttachmentInput> {
    vec![
        AttachmentInput {
            filename: "front.pdf".into(),
            bytes: b"a".to_vec(),
        },
        AttachmentInput {
            filename: "back.pdf".into(),
            bytes: b"b".to_vec(),
        },
    ]
}

#[tokio::test]
async fn failed_upload_batch_writes_nothing() {
    let (store, owner, vehicle_id) = setup().await;
    let blob = FlakyBlobStore {
        allow: 1,
        attempts: AtomicUsize::new(0),
    };

    let err = commands::add_expense(&store, &blob, &owner, receipt_expense(&vehicle_id), attachments())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "UPLOAD/BATCH");
    assert_eq!(err.cause().unwrap().code(), "HTTP/CONNECT");

    let expenses = commands::list_expenses(store.pool(), &owner, &Filter::default(), SortOrder::KeyAsc)
        .await
        .unwrap();
    assert!(expenses.is_empty());
    let documents = commands::list_documents(store.pool(), &owner, &Filter::default(), SortOrder::KeyAsc)
        .await
        .unwrap();
    assert!(documents.is_empty());
}

#[tokio::test]
async fn successful_batch_stores_expense_and_documents_together() {
    let (store, owner, vehicle_id) = setup().await;
    let dir = tempfile::tempdir().unwrap();
    let blob = LocalBlobStore::new(dir.path());

    let expense = commands::add_expense(&store, &blob, &owner, receipt_expense(&vehicle_id), attachments())
        .await
        .unwrap();

    let documents = commands::list_documents(store.pool(), &owner, &Filter::default(), SortOrder::KeyAsc)
        .await
        .unwrap();
    assert_eq!(documents.len(), 2);
    assert!(documents
        .iter()
        .all(|d| d.expense_id.as_deref() == Some(expense.id.as_str())));

    // The blobs really landed under the store root.
    for document in &documents {
        let path = document.file_url.strip_prefix("file://").unwrap();
        assert!(std::path::Path::new(path).exists());
    }
}

#[tokio::test]
async fn expense_without_attachments_needs_no_blob_calls() {
    let (store, owner, vehicle_id) = setup().await;
    let blob = FlakyBlobStore {
        allow: 0,
        attempts: AtomicUsize::new(0),
    };

    commands::add_expense(&store, &blob, &owner, receipt_expense(&vehicle_id), vec![])
        .await
        .unwrap();
    assert_eq!(blob.attempts.load(Ordering::SeqCst), 0);
}
