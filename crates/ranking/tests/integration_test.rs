//! Integration tests for the ranking crate.
//!
//! These drive the service end to end: real `.npy` and CSV files on disk,
//! lazy loading through the store, and a session paging through results.

use data_loader::{ItemId, ScoreMatrix};
use ranking::{
    ModelKind, RankingConfig, RankingError, RecommendationContext, RecommendationService, Session,
};
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

const N_USERS: usize = 4;
const N_ITEMS: usize = 23;

fn score(user: usize, item: usize, salt: usize) -> f64 {
    // Distinct within a row because 5 and N_ITEMS are coprime
    ((item * 5 + user + salt) % N_ITEMS) as f64 / N_ITEMS as f64
}

fn npy_bytes(salt: usize) -> Vec<u8> {
    let mut header = format!(
        "{{'descr': '<f8', 'fortran_order': False, 'shape': ({}, {}), }}",
        N_USERS, N_ITEMS
    );
    while (10 + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');

    let mut bytes = b"\x93NUMPY".to_vec();
    bytes.extend_from_slice(&[1, 0]);
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    for user in 0..N_USERS {
        for item in 0..N_ITEMS {
            bytes.extend_from_slice(&score(user, item, salt).to_le_bytes());
        }
    }
    bytes
}

fn in_memory_matrix(salt: usize) -> ScoreMatrix {
    let rows = (0..N_USERS)
        .map(|u| (0..N_ITEMS).map(|i| score(u, i, salt)).collect())
        .collect();
    ScoreMatrix::from_rows(rows).unwrap()
}

/// Write a data directory with all model files, removed when dropped
fn create_test_data_dir() -> TempDir {
    let temp = TempDir::new().unwrap();
    let dir = temp.path();

    fs::write(dir.join("score_cf_normalized.npy"), npy_bytes(0)).unwrap();
    fs::write(dir.join("score_semantic_normalized.npy"), npy_bytes(7)).unwrap();
    fs::write(dir.join("score_hybrid_full.npy"), npy_bytes(11)).unwrap();
    fs::write(
        dir.join("seq_pred.csv"),
        "user_id,recommendation\n0,\"[21, 5]\"\n1,\"[3, 3]\"\n",
    )
    .unwrap();
    temp
}

/// Service over a fresh data directory; keep the directory alive while
/// the service loads files lazily
fn test_service() -> (TempDir, RecommendationService) {
    let dir = create_test_data_dir();
    let config = RankingConfig {
        sequence_user_threshold: 2,
        ..RankingConfig::with_data_dir(dir.path())
    };
    (dir, RecommendationService::new(config).unwrap())
}

#[test]
fn test_session_pages_through_all_items() {
    let (_dir, service) = test_service();
    let expected = in_memory_matrix(0).ranked_items(1).unwrap();

    let mut session = Session::new();
    session.login(1);

    let mut seen: Vec<ItemId> = Vec::new();
    loop {
        let page = service.recommend(&session.context().unwrap()).unwrap();
        if page.is_empty() {
            break;
        }
        assert!(page.len() <= service.page_size());
        seen.extend(&page.items);
        session.show_more(service.page_size()).unwrap();
    }

    // 23 items: pages of 10, 10, 3, then an empty page
    assert_eq!(seen, expected);
    assert_eq!(session.context().unwrap().start_pos, 30);
}

#[test]
fn test_model_switch_restarts_from_top() {
    let (_dir, service) = test_service();
    let mut session = Session::new();
    session.login(2);
    session.show_more(10).unwrap();

    session.select_model(ModelKind::SemanticEmbedding);
    let page = service.recommend(&session.context().unwrap()).unwrap();

    assert_eq!(page.start_pos, 0);
    assert_eq!(page.items, in_memory_matrix(7).top_items(2, 10).unwrap());
}

#[test]
fn test_hybrid_with_sequence_first_page() {
    let (_dir, service) = test_service();
    let hybrid = in_memory_matrix(11);

    let page = service.first_page(0, ModelKind::HybridWithSequence).unwrap();
    let mut expected = vec![21, 5];
    expected.extend(hybrid.top_items(0, 8).unwrap());
    assert_eq!(page.items, expected);

    // Duplicates inside the sequence list pass through untouched
    let page = service.first_page(1, ModelKind::HybridWithSequence).unwrap();
    assert_eq!(&page.items[..2], &[3, 3]);
    assert_eq!(page.len(), 10);

    // Later pages and users outside the cohort fall back to Hybrid
    for ctx in [
        RecommendationContext::new(0, ModelKind::HybridWithSequence).with_start_pos(10),
        RecommendationContext::new(3, ModelKind::HybridWithSequence),
    ] {
        let hybrid_ctx = RecommendationContext {
            model: Some(ModelKind::Hybrid),
            ..ctx.clone()
        };
        assert_eq!(
            service.recommend(&ctx).unwrap(),
            service.recommend(&hybrid_ctx).unwrap()
        );
    }

    // Hybrid and Hybrid with Sequence share one matrix
    assert_eq!(service.store().loaded_count(), 1);
}

#[test]
fn test_preload_loads_three_distinct_files() {
    let (_dir, service) = test_service();

    service.store().preload().unwrap();
    assert_eq!(service.store().loaded_count(), 3);
    assert!(service.store().get(ModelKind::HybridWithSequence).is_ok());
}

#[test]
fn test_unknown_model_and_user() {
    let (_dir, service) = test_service();

    let err = "Popularity".parse::<ModelKind>().unwrap_err();
    assert!(err.is_configuration());

    let err = service
        .first_page(N_USERS as u32, ModelKind::CollaborativeFiltering)
        .unwrap_err();
    assert!(matches!(err, RankingError::UserOutOfRange { .. }));
}

#[test]
fn test_concurrent_requests_share_matrices() {
    let (_dir, service) = test_service();
    let service = Arc::new(service);
    let expected = service.first_page(0, ModelKind::Hybrid).unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = service.clone();
            thread::spawn(move || service.first_page(0, ModelKind::Hybrid).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
    assert_eq!(service.store().loaded_count(), 1);
}
