use std::sync::Arc;

use media_list::core::ordering::is_dense;
use media_list::{
    InMemoryCatalog, InMemoryListItemStore, ListError, ListItemId, ListKind, ListService,
    MediaKind, UserId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_test::{assert_err, assert_ok};

type Service = ListService<InMemoryListItemStore, InMemoryCatalog>;

const CODES: [&str; 8] = [
    "tt0111161", "tt0068646", "tt0468569", "tt0071562", "tt0050083", "tt0108052", "tt0167260",
    "tt0110912",
];

fn service() -> Service {
    let catalog = InMemoryCatalog::new();
    for code in CODES {
        catalog.allow(code, MediaKind::Movie);
    }
    ListService::new(InMemoryListItemStore::new(), catalog)
}

async fn assert_dense(service: &Service, owner: UserId) {
    let items = service.get_ordered(owner, ListKind::Movie).await.unwrap();
    assert!(
        is_dense(&items),
        "ranks of user {} are not dense: {:?}",
        owner,
        items.iter().map(|i| i.rank).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn test_ranks_stay_dense_under_random_operations() {
    let service = service();
    let users = [UserId(1), UserId(2), UserId(3)];
    let mut rng = StdRng::seed_from_u64(20240611);

    for _ in 0..400 {
        let owner = users[rng.random_range(0..users.len())];
        let items = service.get_ordered(owner, ListKind::Movie).await.unwrap();

        match rng.random_range(0..3) {
            0 => {
                let code = CODES[rng.random_range(0..CODES.len())];
                let already = service
                    .is_already_in_list(owner, code, MediaKind::Movie)
                    .await
                    .unwrap();
                let result = service.add(owner, code, MediaKind::Movie).await;
                if already {
                    assert!(matches!(result, Err(ListError::DuplicateEntry)));
                } else {
                    assert_eq!(result.unwrap().rank as usize, items.len() + 1);
                }
            }
            1 if !items.is_empty() => {
                let victim = &items[rng.random_range(0..items.len())];
                service.delete_by_id(owner, victim.id).await.unwrap();
                let remaining = service.get_ordered(owner, ListKind::Movie).await.unwrap();
                assert_eq!(remaining.len(), items.len() - 1);
            }
            2 if !items.is_empty() => {
                let moved = &items[rng.random_range(0..items.len())];
                let target = rng.random_range(1..=items.len() as u32);
                let reordered = service.reorder(owner, moved.id, target).await.unwrap();
                let position = reordered.iter().position(|i| i.id == moved.id).unwrap();
                assert_eq!(reordered[position].rank, target);
            }
            _ => {}
        }

        for user in users {
            assert_dense(&service, user).await;
        }
    }
}

#[tokio::test]
async fn test_reorder_round_trip_restores_order() {
    let service = service();
    let owner = UserId(1);
    for code in &CODES[..5] {
        service.add(owner, code, MediaKind::Movie).await.unwrap();
    }
    let original = service.get_ordered(owner, ListKind::Movie).await.unwrap();

    let moved = &original[3];
    service.reorder(owner, moved.id, 1).await.unwrap();
    service.reorder(owner, moved.id, moved.rank).await.unwrap();

    assert_eq!(service.get_ordered(owner, ListKind::Movie).await.unwrap(), original);
}

#[tokio::test]
async fn test_documented_examples() {
    let service = service();
    let owner = UserId(1);
    let a = service.add(owner, CODES[0], MediaKind::Movie).await.unwrap();
    let b = service.add(owner, CODES[1], MediaKind::Movie).await.unwrap();
    let c = service.add(owner, CODES[2], MediaKind::Movie).await.unwrap();

    // [A:1, B:2, C:3], C -> 1
    let reordered = service.reorder(owner, c.id, 1).await.unwrap();
    let ids: Vec<ListItemId> = reordered.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![c.id, a.id, b.id]);

    // back to [A:1, B:2, C:3], then delete A
    service.reorder(owner, c.id, 3).await.unwrap();
    service.delete_by_id(owner, a.id).await.unwrap();
    let remaining: Vec<(ListItemId, u32)> = service
        .get_ordered(owner, ListKind::Movie)
        .await
        .unwrap()
        .iter()
        .map(|i| (i.id, i.rank))
        .collect();
    assert_eq!(remaining, vec![(b.id, 1), (c.id, 2)]);

    let mut rng = StdRng::seed_from_u64(1);
    let empty = assert_ok!(service.get_random(UserId(99), ListKind::Movie, &mut rng).await);
    assert!(empty.is_none());
}

#[tokio::test]
async fn test_catalog_cleanup_only_for_last_reference() {
    let service = service();
    let mine = service.add(UserId(1), CODES[0], MediaKind::Movie).await.unwrap();
    let theirs = service.add(UserId(2), CODES[0], MediaKind::Movie).await.unwrap();
    assert_eq!(mine.catalog, theirs.catalog);

    service.delete_by_id(UserId(1), mine.id).await.unwrap();
    assert!(service.catalog().is_registered(mine.catalog));

    service.delete_by_id(UserId(2), theirs.id).await.unwrap();
    assert!(!service.catalog().is_registered(mine.catalog));
}

#[tokio::test]
async fn test_unavailable_catalog_during_cleanup_is_reported() {
    let service = service();
    let item = service.add(UserId(1), CODES[0], MediaKind::Movie).await.unwrap();

    service.catalog().set_available(false);
    let result = service.delete_by_id(UserId(1), item.id).await;
    assert!(matches!(result, Err(ListError::Unavailable { .. })));

    // the list change itself is committed
    assert!(service.get_ordered(UserId(1), ListKind::Movie).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_rank_leaves_list_untouched() {
    let service = service();
    let owner = UserId(1);
    for code in &CODES[..3] {
        service.add(owner, code, MediaKind::Movie).await.unwrap();
    }
    let before = service.get_ordered(owner, ListKind::Movie).await.unwrap();

    assert_err!(service.reorder(owner, before[0].id, 0).await);
    assert_err!(service.reorder(owner, before[0].id, 4).await);
    assert_eq!(service.get_ordered(owner, ListKind::Movie).await.unwrap(), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reorders_keep_ranks_dense() {
    let service = Arc::new(service());
    let owner = UserId(1);
    for code in CODES {
        service.add(owner, code, MediaKind::Movie).await.unwrap();
    }
    let items = service.get_ordered(owner, ListKind::Movie).await.unwrap();

    let mut handles = Vec::new();
    for (task, item) in items.iter().enumerate() {
        let service = Arc::clone(&service);
        let id = item.id;
        handles.push(tokio::spawn(async move {
            for step in 0..20u32 {
                let target = (task as u32 + step) % CODES.len() as u32 + 1;
                service.reorder(owner, id, target).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_dense(&service, owner).await;
    assert_eq!(service.get_ordered(owner, ListKind::Movie).await.unwrap().len(), CODES.len());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_of_same_entry_insert_once() {
    let service = Arc::new(service());
    let owner = UserId(5);

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service.add(owner, CODES[0], MediaKind::Movie).await
        }));
    }

    let mut added = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => added += 1,
            Err(ListError::DuplicateEntry) => {}
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(added, 1);
    assert_eq!(service.get_ordered(owner, ListKind::Movie).await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cleanup_never_drops_an_entity_another_user_is_adding() {
    let service = Arc::new(service());
    let (leaving, joining) = (UserId(1), UserId(2));

    for _ in 0..50 {
        let item = service.add(leaving, CODES[0], MediaKind::Movie).await.unwrap();

        let delete = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.delete_by_id(leaving, item.id).await })
        };
        let add = {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.add(joining, CODES[0], MediaKind::Movie).await })
        };
        assert_ok!(delete.await.unwrap());
        let added = assert_ok!(add.await.unwrap());

        assert!(
            service.catalog().is_registered(added.catalog),
            "{} was cleaned up while still in a list",
            added.catalog
        );
        assert_ok!(service.delete_by_id(joining, added.id).await);
        assert_eq!(service.catalog().registered_count(), 0);
    }
}
