use charger_finder::db::DbClient;
use charger_finder::favorites::{FavoriteSet, FavoritesStore, Identity, SqliteFavoritesStore};
use std::sync::Arc;

fn open_store(dir: &tempfile::TempDir) -> Arc<SqliteFavoritesStore> {
    let path = dir.path().join("favorites.db");
    let client = DbClient::new(path.to_string_lossy().into_owned()).expect("open db");
    client.initialize().expect("init schema");
    Arc::new(SqliteFavoritesStore::new(Arc::new(client)))
}

#[tokio::test]
async fn test_sqlite_store_add_remove_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let alice = Identity::from("alice");

    assert!(store.list(&alice).await.unwrap().is_empty());

    assert_eq!(
        store.set_favorite(&alice, 3, true).await.unwrap(),
        FavoriteSet::from([3])
    );
    assert_eq!(
        store.set_favorite(&alice, 3, true).await.unwrap(),
        FavoriteSet::from([3])
    );
    assert_eq!(store.list(&alice).await.unwrap(), FavoriteSet::from([3]));

    assert!(store.set_favorite(&alice, 3, false).await.unwrap().is_empty());
    assert!(store.set_favorite(&alice, 3, false).await.unwrap().is_empty());
    assert!(store.list(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sqlite_store_isolates_identities() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let alice = Identity::from("alice");
    let bob = Identity::from("bob");

    store.set_favorite(&bob, 7, true).await.unwrap();
    store.set_favorite(&alice, 1, true).await.unwrap();
    store.set_favorite(&alice, 7, false).await.unwrap();

    assert_eq!(store.list(&bob).await.unwrap(), FavoriteSet::from([7]));
    assert_eq!(store.list(&alice).await.unwrap(), FavoriteSet::from([1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sqlite_store_concurrent_writes_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);
    let alice = Identity::from("alice");

    let tasks: Vec<_> = (0..32)
        .map(|id| {
            let store = store.clone();
            let alice = alice.clone();
            tokio::spawn(async move { store.set_favorite(&alice, id, true).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let expected: FavoriteSet = (0..32).collect();
    assert_eq!(store.list(&alice).await.unwrap(), expected);

    // Interleave removals of the even ids with re-adds of the odd ones.
    let tasks: Vec<_> = (0..32)
        .map(|id| {
            let store = store.clone();
            let alice = alice.clone();
            tokio::spawn(async move { store.set_favorite(&alice, id, id % 2 == 1).await })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let odd: FavoriteSet = (0..32).filter(|id| id % 2 == 1).collect();
    assert_eq!(store.list(&alice).await.unwrap(), odd);
}

#[tokio::test]
async fn test_sqlite_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let alice = Identity::from("alice");

    {
        let store = open_store(&dir);
        store.set_favorite(&alice, 11, true).await.unwrap();
    }

    let store = open_store(&dir);
    assert_eq!(store.list(&alice).await.unwrap(), FavoriteSet::from([11]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sqlite_store_writes_for_many_identities_interleave() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(&dir);

    let tasks: Vec<_> = (0..16)
        .flat_map(|user| (0..4).map(move |id| (user, id)))
        .map(|(user, id)| {
            let store = store.clone();
            tokio::spawn(async move {
                let identity = Identity::from(format!("user-{user}"));
                store.set_favorite(&identity, id, true).await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    for user in 0..16 {
        let identity = Identity::from(format!("user-{user}"));
        assert_eq!(
            store.list(&identity).await.unwrap(),
            FavoriteSet::from([0, 1, 2, 3])
        );
    }
}
