//! Test utilities (available with the `test-utils` feature).

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use bytes::Bytes;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::api::models::users::CurrentUser;
use crate::auth::{password, session};
use crate::config::{Config, StorageConfig};
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse};
use crate::storage::{CleanupQueue, CleanupWorker, ObjectStore, ObjectUrls, StorageError};
use crate::{AppState, build_router};

/// A call made against [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    PresignPut {
        key: String,
        content_type: String,
        cache_control: String,
        expires_in: Duration,
    },
    PresignGet {
        key: String,
        expires_in: Duration,
    },
    Put {
        key: String,
        size: usize,
        content_type: String,
        cache_control: String,
    },
    Delete {
        key: String,
    },
}

/// In-memory [`ObjectStore`] that records every call and produces deterministic URLs.
#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<StoreCall>>,
    fail_presign: AtomicBool,
    fail_put: AtomicBool,
    fail_delete: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().expect("store mutex poisoned").clone()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Delete { key } => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn put_keys(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StoreCall::Put { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    pub fn fail_presign(&self, fail: bool) {
        self.fail_presign.store(fail, Ordering::SeqCst);
    }

    pub fn fail_put(&self, fail: bool) {
        self.fail_put.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// URL returned by `presign_get` for `key`.
    pub fn signed_get_url(key: &str) -> String {
        format!("https://signed.test/{key}?X-Amz-Signature=get")
    }

    /// URL returned by `presign_put` for `key`.
    pub fn signed_put_url(key: &str) -> String {
        format!("https://signed.test/{key}?X-Amz-Signature=put")
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().expect("store mutex poisoned").push(call);
    }

    fn injected(&self, flag: &AtomicBool, operation: &str) -> Result<(), StorageError> {
        if flag.load(Ordering::SeqCst) {
            Err(StorageError::Request {
                operation: operation.to_string(),
                message: "injected failure".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait::async_trait]
impl ObjectStore for RecordingStore {
    async fn presign_put(&self, key: &str, content_type: &str, cache_control: &str, expires_in: Duration) -> Result<String, StorageError> {
        self.record(StoreCall::PresignPut {
            key: key.to_string(),
            content_type: content_type.to_string(),
            cache_control: cache_control.to_string(),
            expires_in,
        });
        self.injected(&self.fail_presign, "presign put")?;
        Ok(Self::signed_put_url(key))
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        self.record(StoreCall::PresignGet {
            key: key.to_string(),
            expires_in,
        });
        self.injected(&self.fail_presign, "presign get")?;
        Ok(Self::signed_get_url(key))
    }

    async fn put_object(&self, key: &str, body: Bytes, content_type: &str, cache_control: &str) -> Result<(), StorageError> {
        self.record(StoreCall::Put {
            key: key.to_string(),
            size: body.len(),
            content_type: content_type.to_string(),
            cache_control: cache_control.to_string(),
        });
        self.injected(&self.fail_put, "put object")
    }

    async fn delete_object(&self, key: &str) -> Result<(), StorageError> {
        self.record(StoreCall::Delete { key: key.to_string() });
        self.injected(&self.fail_delete, "delete object")
    }
}

/// Private endpoint host used throughout the tests.
pub const TEST_PRIVATE_BASE: &str = "https://acct.r2.cloudflarestorage.com/studio-media";

/// Public base used throughout the tests.
pub const TEST_PUBLIC_BASE: &str = "https://media.example.com";

pub fn test_object_urls() -> ObjectUrls {
    ObjectUrls::new(
        "studio-media",
        vec!["acct.r2.cloudflarestorage.com".to_string()],
        TEST_PUBLIC_BASE,
    )
}

pub fn create_test_config() -> Config {
    let mut config = Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        admin_email: "admin@test.com".to_string(),
        secret_key: Some("test-secret-key-for-testing-only".to_string()),
        storage: StorageConfig {
            endpoint: "https://acct.r2.cloudflarestorage.com".to_string(),
            bucket: "studio-media".to_string(),
            public_base_url: Some(TEST_PUBLIC_BASE.to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    // Keep hashing cheap in tests
    config.auth.password.argon2_memory_kib = 1024;
    config.auth.password.argon2_iterations = 1;
    config
}

/// Everything a handler test needs to observe side effects.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<RecordingStore>,
    pub worker: CleanupWorker,
}

impl TestContext {
    /// Process every deletion scheduled so far and return the keys the store was asked to delete.
    pub async fn drain_cleanup(self) -> Vec<String> {
        let shutdown = tokio_util::sync::CancellationToken::new();
        shutdown.cancel();
        self.worker.run(shutdown).await;
        self.store.deleted_keys()
    }
}

pub fn create_test_state(pool: PgPool) -> TestContext {
    create_test_state_with_config(pool, create_test_config())
}

pub fn create_test_state_with_config(pool: PgPool, config: Config) -> TestContext {
    let store = Arc::new(RecordingStore::new());
    let (cleanup, worker) = CleanupQueue::new(store.clone());
    let state = AppState::from_parts(pool, config, store.clone(), Arc::new(test_object_urls()), cleanup);
    TestContext { state, store, worker }
}

/// A pool that never connects; for tests whose routes do not touch the database.
pub fn lazy_pool() -> PgPool {
    PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy("postgres://localhost:1/unused")
        .expect("lazy pool options are valid")
}

pub fn create_test_server(state: &AppState) -> TestServer {
    let router = build_router(state).expect("router builds");
    TestServer::new(router).expect("test server starts")
}

pub async fn create_test_admin(pool: &PgPool, email: &str, password: &str) -> UserDBResponse {
    let hash = password::hash_string_with_params(password, Some(password::Argon2Params::cheap_for_tests())).expect("hash password");
    let mut conn = pool.acquire().await.expect("acquire connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            display_name: Some("Test Admin".to_string()),
            password_hash: Some(hash),
        })
        .await
        .expect("create admin")
}

/// A `Cookie` header value carrying a valid session for `user`.
pub fn session_cookie(config: &Config, user: &CurrentUser) -> String {
    let token = session::create_session_token(user, config).expect("create session token");
    format!("{}={}", config.auth.session.cookie_name, token)
}

/// Session cookie for an admin who does not need to exist in the database.
pub fn admin_cookie(config: &Config) -> String {
    session_cookie(
        config,
        &CurrentUser {
            id: uuid::Uuid::new_v4(),
            email: "admin@test.com".to_string(),
            display_name: None,
        },
    )
}
