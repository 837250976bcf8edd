//! Shared helpers for router tests: an in-memory SQLite repository, an
//! in-memory object store and multipart request builders.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, header},
};
use bytes::Bytes;
use http_body_util::BodyExt;
use photo_gallery::{
    PhotoService, router,
    services::{
        object_store::{ObjectStore, StorageError, StorageResult},
        photo_repository::{SqlitePhotoRepository, run_migrations},
    },
};
use sqlx::sqlite::SqlitePoolOptions;
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
    time::Duration,
};

pub const BOUNDARY: &str = "gallery-test-boundary";
pub const BODY_LIMIT: usize = 12 * 1024 * 1024;

#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<HashMap<String, Bytes>>,
    pub calls: Mutex<Vec<String>>,
    pub fail_put: bool,
    pub fail_delete: bool,
    pub fail_presign_for: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, op: &str, key: &str) {
        self.calls.lock().unwrap().push(format!("{op} {key}"));
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        body: Bytes,
        _content_type: &str,
        _size: u64,
        _metadata: HashMap<String, String>,
    ) -> StorageResult<()> {
        self.record("put", key);
        if self.fail_put {
            return Err(StorageError::Put {
                key: key.into(),
                reason: "bucket unavailable".into(),
            });
        }
        self.objects.lock().unwrap().insert(key.into(), body);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.record("delete", key);
        if self.fail_delete {
            return Err(StorageError::Delete {
                key: key.into(),
                reason: "bucket unavailable".into(),
            });
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn head_exists(&self, key: &str) -> StorageResult<bool> {
        self.record("head", key);
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    async fn presign_get(&self, key: &str, _ttl: Duration) -> StorageResult<String> {
        self.record("presign", key);
        if self.fail_presign_for.lock().unwrap().contains(key) {
            return Err(StorageError::Presign {
                key: key.into(),
                reason: "signer offline".into(),
            });
        }
        Ok(format!("https://signed.test/{key}"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub repo: Arc<SqlitePhotoRepository>,
}

pub async fn memory_repository() -> SqlitePhotoRepository {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    SqlitePhotoRepository::new(Arc::new(pool))
}

pub async fn test_app_with(store: MemoryStore) -> TestApp {
    let store = Arc::new(store);
    let repo = Arc::new(memory_repository().await);
    let service = PhotoService::new(repo.clone(), store.clone());
    TestApp {
        router: router(BODY_LIMIT).with_state(service),
        store,
        repo,
    }
}

pub async fn test_app() -> TestApp {
    test_app_with(MemoryStore::default()).await
}

/// A `multipart/form-data` part.
pub enum Part<'a> {
    File {
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    upload_request(uri, Body::from(multipart_body(parts)))
}

/// Same body as `multipart_request`, delivered in `chunk_size` frames the way
/// a client streams a large upload.
pub fn streamed_multipart_request(uri: &str, parts: &[Part<'_>], chunk_size: usize) -> Request<Body> {
    let frames: Vec<Result<Bytes, std::io::Error>> = multipart_body(parts)
        .chunks(chunk_size)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    upload_request(uri, Body::from_stream(futures::stream::iter(frames)))
}

fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::File {
                filename,
                content_type,
                data,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                         Content-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                        .as_bytes(),
                );
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(uri: &str, body: Body) -> Request<Body> {
    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_to_json(body: Body) -> serde_json::Value {
    serde_json::from_str(&body_to_string(body).await).unwrap()
}
