use super::*;
use crate::test_support::FakeNoteApi;
use chrono::Duration;

fn placeholder(title: &str, created_at: DateTime<Utc>) -> Note {
    Note {
        id: NoteId::new(),
        title: title.to_string(),
        content: "pending".to_string(),
        created_at,
    }
}

fn titles(data: &PagedNotes) -> Vec<Vec<String>> {
    data.pages()
        .iter()
        .map(|page| page.iter().map(|n| n.title.clone()).collect())
        .collect()
}

#[tokio::test]
async fn test_pages_concatenate_newest_first() {
    let api = FakeNoteApi::new();
    let expected = api.seed_many(5);
    let cache = NoteCache::new(2);

    assert_eq!(cache.fetch_next_page(&api).await.unwrap(), FetchOutcome::Applied);
    assert_eq!(cache.fetch_next_page(&api).await.unwrap(), FetchOutcome::Applied);
    assert_eq!(cache.fetch_next_page(&api).await.unwrap(), FetchOutcome::Applied);
    assert_eq!(
        cache.fetch_next_page(&api).await.unwrap(),
        FetchOutcome::NoMorePages
    );

    let data = cache.data().await.unwrap();
    assert_eq!(data.page_count(), 3);
    assert!(!data.has_more());
    assert_eq!(cache.notes().await, expected);
    assert_eq!(api.list_calls(), 3);

    // Cursors recorded per page
    assert_eq!(data.page_cursors()[0], None);
    assert_eq!(data.page_cursors()[1], Some(expected[1].created_at));
}

#[tokio::test]
async fn test_exact_multiple_stops_without_extra_call() {
    let api = FakeNoteApi::new();
    api.seed_many(4);
    let cache = NoteCache::new(2);

    cache.fetch_first_page(&api).await.unwrap();
    cache.fetch_next_page(&api).await.unwrap();
    assert_eq!(
        cache.fetch_next_page(&api).await.unwrap(),
        FetchOutcome::NoMorePages
    );
    assert_eq!(api.list_calls(), 2);
}

#[tokio::test]
async fn test_fetch_failure_leaves_cache_untouched() {
    let api = FakeNoteApi::new();
    api.seed_many(3);
    let cache = NoteCache::new(2);
    cache.fetch_first_page(&api).await.unwrap();
    let before = cache.snapshot().await;

    api.fail_next_lists(vec![ClientError::Transport("down".into())]);
    let err = cache.fetch_next_page(&api).await.unwrap_err();

    assert!(err.is_retryable());
    assert_eq!(cache.snapshot().await, before);
}

#[tokio::test]
async fn test_cancelled_fetch_is_discarded() {
    let api = FakeNoteApi::new();
    api.seed_many(3);
    let cache = NoteCache::new(2);
    let gate = api.gate_lists();

    let fetch = {
        let cache = cache.clone();
        let api = api.clone();
        tokio::spawn(async move { cache.fetch_first_page(&api).await })
    };

    // Wait until the fetch is parked on the gate
    while api.list_calls() == 0 {
        tokio::task::yield_now().await;
    }
    cache.cancel_refetch();
    gate.add_permits(1);

    assert_eq!(fetch.await.unwrap().unwrap(), FetchOutcome::Discarded);
    assert!(!cache.is_loaded().await);
}

#[tokio::test]
async fn test_spawn_refetch_reloads_all_loaded_pages() {
    let api = FakeNoteApi::new();
    api.seed_many(5);
    let cache = NoteCache::new(2);
    cache.fetch_first_page(&api).await.unwrap();
    cache.fetch_next_page(&api).await.unwrap();

    let newest = api.seed("fresh", "body");
    let outcome = cache
        .spawn_refetch(Arc::new(api.clone()))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome, FetchOutcome::Applied);
    let data = cache.data().await.unwrap();
    assert_eq!(data.page_count(), 2);
    assert_eq!(data.len(), 4);
    assert_eq!(data.pages()[0][0], newest);
}

#[tokio::test]
async fn test_cancel_aborts_background_refetch() {
    let api = FakeNoteApi::new();
    api.seed_many(2);
    let cache = NoteCache::new(2);
    let _gate = api.gate_lists();

    let handle = cache.spawn_refetch(Arc::new(api.clone()));
    cache.cancel_refetch();

    let err = handle.await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(!cache.is_loaded().await);
}

#[test]
fn test_placeholder_spills_across_pages() {
    let now = Utc::now();
    let mut data = PagedNotes::default();
    data.pages = vec![
        vec![placeholder("a", now), placeholder("b", now)],
        vec![placeholder("c", now), placeholder("d", now)],
    ];
    data.page_cursors = vec![None, Some(now)];
    data.has_more = true;

    data.insert_placeholder(placeholder("new", now + Duration::seconds(1)), 2);

    assert_eq!(
        titles(&data),
        vec![vec!["new", "a"], vec!["b", "c"], vec!["d"]]
    );
    assert_eq!(data.len(), 5);
    assert!(data.pages().iter().all(|page| page.len() <= 2));
}

#[test]
fn test_placeholder_into_short_page_does_not_spill() {
    let now = Utc::now();
    let mut data = PagedNotes::from_first_page(NotePage {
        notes: vec![placeholder("a", now)],
        has_more: false,
        next_cursor: None,
    });

    let note = placeholder("new", now);
    let id = note.id;
    data.insert_placeholder(note, 20);

    assert_eq!(titles(&data), vec![vec!["new", "a"]]);
    assert!(data.is_pending(&id));
}

#[test]
fn test_confirm_keeps_position_and_created_at() {
    let now = Utc::now();
    let mut data = PagedNotes::from_first_page(NotePage {
        notes: vec![placeholder("a", now)],
        has_more: false,
        next_cursor: None,
    });
    let local = placeholder("draft", now + Duration::seconds(5));
    let local_id = local.id;
    data.insert_placeholder(local.clone(), 20);

    let server = Note {
        id: NoteId::new(),
        title: "draft".to_string(),
        content: "pending".to_string(),
        created_at: now + Duration::seconds(7),
    };
    assert!(data.confirm_placeholder(&local_id, server.clone()));

    let first = &data.pages()[0][0];
    assert_eq!(first.id, server.id);
    assert_eq!(first.created_at, local.created_at);
    assert!(!data.contains(&local_id));
    assert!(!data.is_pending(&server.id));
    assert_eq!(data.len(), 2);
}

#[test]
fn test_confirm_drops_placeholder_when_server_note_already_cached() {
    let now = Utc::now();
    let server = placeholder("draft", now);
    let mut data = PagedNotes::from_first_page(NotePage {
        notes: vec![server.clone()],
        has_more: false,
        next_cursor: None,
    });
    let local = placeholder("draft", now);
    let local_id = local.id;
    data.insert_placeholder(local, 20);

    data.confirm_placeholder(&local_id, server.clone());

    assert_eq!(data.notes().cloned().collect::<Vec<_>>(), vec![server]);
}

#[test]
fn test_push_page_skips_duplicates() {
    let now = Utc::now();
    let shared = placeholder("shared", now);
    let mut data = PagedNotes::from_first_page(NotePage {
        notes: vec![shared.clone()],
        has_more: true,
        next_cursor: Some(now),
    });

    data.push_page(
        Some(now),
        NotePage {
            notes: vec![shared, placeholder("older", now - Duration::seconds(1))],
            has_more: false,
            next_cursor: None,
        },
    );

    assert_eq!(titles(&data), vec![vec!["shared"], vec!["older"]]);
    assert!(!data.has_more());
}

#[test]
fn test_remove_filters_every_page() {
    let now = Utc::now();
    let target = placeholder("target", now);
    let mut data = PagedNotes::from_first_page(NotePage {
        notes: vec![placeholder("a", now), target.clone()],
        has_more: false,
        next_cursor: None,
    });

    assert!(data.remove(&target.id));
    assert!(!data.remove(&target.id));
    assert_eq!(data.len(), 1);
}
