// ==============================
// tests/unit/storage_tests.rs
// ==============================
//! Unit tests for the flat-file user store
use docsmith_backend_lib::error::AppError;
use docsmith_backend_lib::storage::{FlatFileUserStore, UserStore};
use docsmith_common::{Role, UserRecord};
use tempfile::TempDir;
use uuid::Uuid;

fn setup() -> (FlatFileUserStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = FlatFileUserStore::new(temp_dir.path()).unwrap();
    (store, temp_dir)
}

#[tokio::test]
async fn test_create_and_find_by_email() {
    let (store, _temp_dir) = setup();
    let user = UserRecord::new("Writer@X.Test", Some("Writer".into()), None, Role::Client);
    store.create_user(&user).await.unwrap();

    // Lookup is case-insensitive; the record is stored lowercased
    let found = store.find_by_email("writer@x.test").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.email, "writer@x.test");

    let found = store.find_by_email("WRITER@x.test").await.unwrap().unwrap();
    assert_eq!(found.id, user.id);
}

#[tokio::test]
async fn test_find_by_id() {
    let (store, _temp_dir) = setup();
    let user = UserRecord::new("writer@x.test", None, None, Role::Client);
    store.create_user(&user).await.unwrap();

    let found = store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(found.email, "writer@x.test");

    assert!(store.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let (store, _temp_dir) = setup();
    let user = UserRecord::new("writer@x.test", None, None, Role::Client);
    store.create_user(&user).await.unwrap();

    let duplicate = UserRecord::new("WRITER@x.test", None, None, Role::Client);
    let err = store.create_user(&duplicate).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_set_password_hash_persists() {
    let (store, _temp_dir) = setup();
    let user = UserRecord::new("writer@x.test", None, None, Role::Client);
    store.create_user(&user).await.unwrap();

    store
        .set_password_hash("writer@x.test", "$scrypt$fake-hash")
        .await
        .unwrap();

    let found = store.find_by_email("writer@x.test").await.unwrap().unwrap();
    assert_eq!(found.password_hash.as_deref(), Some("$scrypt$fake-hash"));

    let err = store
        .set_password_hash("nobody@x.test", "$scrypt$fake-hash")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UnknownPrincipal));
}

#[tokio::test]
async fn test_missing_user_is_none_not_error() {
    let (store, _temp_dir) = setup();
    assert!(store.find_by_email("nobody@x.test").await.unwrap().is_none());
}
