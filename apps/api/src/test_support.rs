// In-memory doubles for the external capabilities, injected into AppState in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Request, StatusCode};
use tower::ServiceExt;

use crate::config::Config;
use crate::llm_client::{Completer, LlmError};
use crate::mailer::{EmailMessage, MailError, Mailer};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{ReportStore, StoreError};

// =============================================================================
// Store
// =============================================================================

/// Key → (ttl seconds, value). `expire` simulates the store dropping a key.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, (u64, String)>>,
}

impl MemoryStore {
    pub fn insert(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (86_400, value.to_string()));
    }

    pub fn expire(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    pub fn entry(&self, key: &str) -> Option<(u64, String)> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn set_ex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<(), StoreError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (ttl_seconds, value.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entry(key).map(|(_, value)| value))
    }
}

// =============================================================================
// Mailer
// =============================================================================

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    failure_status: Mutex<Option<u16>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Every later send is rejected with this status.
    pub fn fail_with(&self, status: u16) {
        *self.failure_status.lock().unwrap() = Some(status);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), MailError> {
        if let Some(status) = *self.failure_status.lock().unwrap() {
            return Err(MailError::Rejected {
                status,
                detail: "rejected by test mailer".to_string(),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

// =============================================================================
// Completer
// =============================================================================

pub struct StubCompleter {
    reply: Result<String, (u16, String)>,
    calls: AtomicUsize,
}

impl StubCompleter {
    pub fn text(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn upstream_error(status: u16, body: &str) -> Self {
        Self {
            reply: Err((status, body.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Completer for StubCompleter {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err((status, body)) => Err(LlmError::Api {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct TestHarness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub completer: Arc<StubCompleter>,
}

impl TestHarness {
    pub fn new(completer: StubCompleter) -> Self {
        let store = Arc::new(MemoryStore::default());
        let mailer = Arc::new(RecordingMailer::default());
        let completer = Arc::new(completer);
        let state = AppState {
            config: Config::for_tests(),
            completer: Some(completer.clone()),
            store: Some(store.clone()),
            mailer: Some(mailer.clone()),
        };
        Self {
            state,
            store,
            mailer,
            completer,
        }
    }

    /// Sends one request through the full router.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, HeaderMap, String) {
        let app = build_router(self.state.clone());
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.unwrap_or_default().to_string()))
            .expect("request should build");

        let resp = app.oneshot(req).await.expect("router is infallible");
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body should read");
        (status, headers, String::from_utf8_lossy(&bytes).into_owned())
    }
}
