//! Performance benchmarks for NoteSpace core operations
//!
//! Run with: `cargo bench -p notespace-core`
//!
//! These benchmarks measure the critical paths:
//! - Note creation (validation + insert)
//! - Deep cursor pagination over a populated table

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use notespace_core::db::{DatabaseService, TursoStore};
use notespace_core::models::{CreateNoteInput, ListNotesQuery};
use notespace_core::services::NoteService;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::runtime::Runtime;

/// Setup a service with a fresh database
async fn setup_test_service() -> (NoteService, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("bench.db");

    let db = Arc::new(DatabaseService::new(db_path).await.unwrap());
    let store = Arc::new(TursoStore::new(db).await.unwrap());
    (NoteService::new(store), temp_dir)
}

fn bench_create_note(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (service, _temp_dir) = rt.block_on(setup_test_service());

    c.bench_function("create_note", |b| {
        b.to_async(&rt).iter(|| async {
            let note = service
                .create_note(
                    "bench",
                    CreateNoteInput::new("Benchmark note", "Some body text"),
                )
                .await
                .unwrap();
            black_box(note);
        });
    });
}

fn bench_paginate_all(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (service, _temp_dir) = rt.block_on(async {
        let (service, temp_dir) = setup_test_service().await;
        for i in 0..1_000 {
            service
                .create_note("bench", CreateNoteInput::new(format!("note {}", i), "body"))
                .await
                .unwrap();
        }
        (service, temp_dir)
    });

    c.bench_function("paginate_1000_notes_limit_50", |b| {
        b.to_async(&rt).iter(|| async {
            let mut query = ListNotesQuery::first_page(50);
            let mut seen = 0;
            loop {
                let page = service.list_notes("bench", &query).await.unwrap();
                seen += page.notes.len();
                match page.next_cursor {
                    Some(cursor) if page.has_more => query = ListNotesQuery::after(cursor, 50),
                    _ => break,
                }
            }
            black_box(seen);
        });
    });
}

criterion_group!(benches, bench_create_note, bench_paginate_all);
criterion_main!(benches);
