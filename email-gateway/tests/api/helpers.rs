use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Response;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use email_gateway::auth::{SecretStore, SecretStoreError};
use email_gateway::queue::{MessageQueue, QueueError};
use email_gateway::web::{router, AppState};
use email_gateway::{Authenticator, Dispatcher, Gateway};

pub const TOKEN: &str = "s3cret-token";
pub const TOKEN_PARAM: &str = "/myapp/token";
pub const QUEUE: &str = "email_notifications";
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Secret store double that counts lookups.
pub struct FakeSecretStore {
    value: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl FakeSecretStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self) {
        *self.value.lock().unwrap() = None;
    }
}

#[async_trait]
impl SecretStore for FakeSecretStore {
    async fn get_parameter(
        &self,
        name: &str,
        _with_decryption: bool,
    ) -> Result<String, SecretStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.value
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SecretStoreError::NotFound(name.to_string()))
    }
}

/// Queue double that records every enqueue attempt.
#[derive(Default)]
pub struct FakeQueue {
    bodies: Mutex<Vec<(String, Vec<u8>)>>,
    fail: AtomicBool,
}

impl FakeQueue {
    pub fn calls(&self) -> usize {
        self.bodies.lock().unwrap().len()
    }

    pub fn fail_with_transport_fault(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn last_body(&self) -> Value {
        let bodies = self.bodies.lock().unwrap();
        let (_, body) = bodies.last().expect("No message enqueued");
        serde_json::from_slice(body).expect("Queue body is not JSON")
    }

    pub fn last_queue(&self) -> String {
        self.bodies.lock().unwrap().last().expect("No message enqueued").0.clone()
    }
}

#[async_trait]
impl MessageQueue for FakeQueue {
    async fn enqueue(&self, queue: &str, body: &[u8]) -> Result<(), QueueError> {
        self.bodies
            .lock()
            .unwrap()
            .push((queue.to_string(), body.to_vec()));
        if self.fail.load(Ordering::SeqCst) {
            return Err(QueueError::Rejected {
                queue: queue.to_string(),
            });
        }
        Ok(())
    }
}

pub struct TestApp {
    pub address: String,
    pub secret_store: Arc<FakeSecretStore>,
    pub queue: Arc<FakeQueue>,
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn post_publish(&self, body: &Value) -> Response {
        self.api_client
            .post(format!("{}/publish", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute Request")
    }

    pub async fn post_publish_raw(&self, body: &'static str) -> Response {
        self.api_client
            .post(format!("{}/publish", self.address))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute Request")
    }

    pub async fn get_health(&self) -> Response {
        self.api_client
            .get(format!("{}/health", self.address))
            .send()
            .await
            .expect("Failed to execute Request")
    }
}

pub fn valid_data() -> Value {
    json!({
        "email_subject": "hi",
        "email_sender": "a@x.com",
        "email_timestream": "2024-01-01T00:00:00Z",
        "email_content": "body"
    })
}

pub async fn spawn_app() -> TestApp {
    let secret_store = Arc::new(FakeSecretStore {
        value: Mutex::new(Some(TOKEN.to_string())),
        calls: AtomicUsize::new(0),
    });
    let queue = Arc::new(FakeQueue::default());

    let address = spawn_with(secret_store.clone(), queue.clone()).await;

    TestApp {
        address,
        secret_store,
        queue,
        api_client: reqwest::Client::new(),
    }
}

/// Serve the real router over a random local port with the given collaborators.
pub async fn spawn_with(
    secret_store: Arc<dyn SecretStore>,
    queue: Arc<dyn MessageQueue>,
) -> String {
    let gateway = Gateway::new(
        Authenticator::new(secret_store, TOKEN_PARAM),
        Dispatcher::new(queue, QUEUE),
    );
    let app = router(AppState::new(gateway), MAX_BODY_BYTES);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move { axum::serve(listener, app).await });

    format!("http://127.0.0.1:{}", port)
}
