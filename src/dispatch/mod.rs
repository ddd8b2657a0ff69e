use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::{Item, Note};

/// Fire-and-forget boundary consumed by the form on submit/delete. No
/// outcome flows back; failures stay on this side of the seam.
pub trait NoteDispatch {
    fn create(&self, note: &Note, items: &[Item]);
    fn update(&self, note: &Note, items: &[Item]);
    fn delete(&self, note: &Note);
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid notes API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("notes API request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notes API returned {status}: {body}")]
    Api { status: u16, body: String },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Synchronous HTTP surface of the notes service.
pub trait NotesApi {
    fn create(&self, note: &Note, items: &[Item]) -> ApiResult<()>;
    fn update(&self, note: &Note, items: &[Item]) -> ApiResult<()>;
    fn delete(&self, note: &Note) -> ApiResult<()>;
    fn fetch(&self, note_id: i64) -> ApiResult<(Note, Vec<Item>)>;
}

/// Note flattened with its checklist, the body shape for create/update
/// and the response shape for fetch.
#[derive(Debug, Serialize, Deserialize)]
struct NotePayload {
    id: i64,
    title: String,
    timestamp: i64,
    #[serde(default)]
    items: Vec<Item>,
}

impl NotePayload {
    fn new(note: &Note, items: &[Item]) -> Self {
        Self {
            id: note.id,
            title: note.title.clone(),
            timestamp: note.timestamp,
            items: items.to_vec(),
        }
    }

    fn split(self) -> (Note, Vec<Item>) {
        (
            Note {
                id: self.id,
                title: self.title,
                timestamp: self.timestamp,
            },
            self.items,
        )
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }
        let http = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: trimmed.to_string(),
            http,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/api/v1/notes", self.base_url)
    }

    fn note_url(&self, note_id: i64) -> String {
        format!("{}/api/v1/notes/{}", self.base_url, note_id)
    }

    fn check(response: reqwest::blocking::Response) -> ApiResult<reqwest::blocking::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().unwrap_or_default();
        Err(ApiError::Api {
            status,
            body: body.trim().to_string(),
        })
    }
}

impl NotesApi for ApiClient {
    fn create(&self, note: &Note, items: &[Item]) -> ApiResult<()> {
        let response = self
            .http
            .post(self.collection_url())
            .json(&NotePayload::new(note, items))
            .send()?;
        Self::check(response).map(|_| ())
    }

    fn update(&self, note: &Note, items: &[Item]) -> ApiResult<()> {
        let response = self
            .http
            .put(self.note_url(note.id))
            .json(&NotePayload::new(note, items))
            .send()?;
        Self::check(response).map(|_| ())
    }

    fn delete(&self, note: &Note) -> ApiResult<()> {
        let response = self.http.delete(self.note_url(note.id)).send()?;
        Self::check(response).map(|_| ())
    }

    fn fetch(&self, note_id: i64) -> ApiResult<(Note, Vec<Item>)> {
        let response = self.http.get(self.note_url(note_id)).send()?;
        let payload = Self::check(response)?.json::<NotePayload>()?;
        Ok(payload.split())
    }
}

enum Job {
    Create { note: Note, items: Vec<Item> },
    Update { note: Note, items: Vec<Item> },
    Delete { note: Note },
}

impl Job {
    fn kind(&self) -> &'static str {
        match self {
            Job::Create { .. } => "create",
            Job::Update { .. } => "update",
            Job::Delete { .. } => "delete",
        }
    }

    fn note_id(&self) -> i64 {
        match self {
            Job::Create { note, .. } | Job::Update { note, .. } | Job::Delete { note } => note.id,
        }
    }
}

/// Performs dispatched requests on a background thread. The form never
/// waits on an outcome; request failures are logged and dropped.
pub struct HttpDispatcher {
    sender: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl HttpDispatcher {
    pub fn spawn<A>(api: A) -> Result<Self>
    where
        A: NotesApi + Send + 'static,
    {
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let worker = thread::Builder::new()
            .name("noteform-dispatch".into())
            .spawn(move || {
                for job in receiver {
                    let outcome = match &job {
                        Job::Create { note, items } => api.create(note, items),
                        Job::Update { note, items } => api.update(note, items),
                        Job::Delete { note } => api.delete(note),
                    };
                    if let Err(err) = outcome {
                        tracing::warn!(
                            %err,
                            kind = job.kind(),
                            note_id = job.note_id(),
                            "dispatch request failed"
                        );
                    }
                }
            })
            .context("spawning dispatch worker thread")?;
        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }

    /// Disconnects the queue and waits for in-flight requests to finish.
    /// Runs automatically on drop so queued requests outlive the form.
    pub fn shutdown(&mut self) {
        self.sender.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("dispatch worker panicked");
            }
        }
    }

    fn enqueue(&self, job: Job) {
        let Some(sender) = &self.sender else {
            tracing::error!(kind = job.kind(), "dispatcher already shut down; request dropped");
            return;
        };
        if sender.send(job).is_err() {
            tracing::error!("dispatch worker is gone; request dropped");
        }
    }
}

impl Drop for HttpDispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl NoteDispatch for HttpDispatcher {
    fn create(&self, note: &Note, items: &[Item]) {
        self.enqueue(Job::Create {
            note: note.clone(),
            items: items.to_vec(),
        });
    }

    fn update(&self, note: &Note, items: &[Item]) {
        self.enqueue(Job::Update {
            note: note.clone(),
            items: items.to_vec(),
        });
    }

    fn delete(&self, note: &Note) {
        self.enqueue(Job::Delete { note: note.clone() });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::{Arc, Mutex};

    fn note() -> Note {
        Note {
            id: 12,
            title: "Groceries".to_string(),
            timestamp: 555,
        }
    }

    fn items() -> Vec<Item> {
        vec![Item {
            id: 6,
            description: "milk".to_string(),
            is_completed: false,
            note_id: 12,
            timestamp: 5,
        }]
    }

    #[test]
    fn endpoints_follow_the_api_shape() {
        let client =
            ApiClient::new("http://localhost:3001/", Duration::from_secs(5)).expect("client");
        assert_eq!(client.collection_url(), "http://localhost:3001/api/v1/notes");
        assert_eq!(client.note_url(12), "http://localhost:3001/api/v1/notes/12");
    }

    #[test]
    fn base_url_requires_a_scheme() {
        let result = ApiClient::new("localhost:3001", Duration::from_secs(5));
        assert_matches!(result, Err(ApiError::InvalidBaseUrl(_)));
    }

    #[test]
    fn payload_serializes_with_wire_field_names() {
        let payload = NotePayload::new(&note(), &items());
        let value = serde_json::to_value(&payload).expect("json");
        assert_eq!(value["id"], 12);
        assert_eq!(value["title"], "Groceries");
        assert_eq!(value["items"][0]["isCompleted"], false);
        assert_eq!(value["items"][0]["noteID"], 12);
        assert_eq!(value["items"][0]["description"], "milk");
    }

    #[test]
    fn payload_round_trips_through_fetch_shape() {
        let raw = r#"{"id":12,"title":"Groceries","timestamp":555,
                      "items":[{"id":6,"description":"milk","isCompleted":true,
                                "noteID":12,"timestamp":5}]}"#;
        let payload: NotePayload = serde_json::from_str(raw).expect("payload");
        let (fetched_note, fetched_items) = payload.split();
        assert_eq!(fetched_note, note());
        assert_eq!(fetched_items.len(), 1);
        assert!(fetched_items[0].is_completed);
    }

    #[derive(Clone, Default)]
    struct RecordingApi {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl NotesApi for RecordingApi {
        fn create(&self, note: &Note, items: &[Item]) -> ApiResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("create #{} ({} items)", note.id, items.len()));
            Ok(())
        }

        fn update(&self, note: &Note, items: &[Item]) -> ApiResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("update #{} ({} items)", note.id, items.len()));
            Ok(())
        }

        fn delete(&self, note: &Note) -> ApiResult<()> {
            self.calls.lock().unwrap().push(format!("delete #{}", note.id));
            Ok(())
        }

        fn fetch(&self, note_id: i64) -> ApiResult<(Note, Vec<Item>)> {
            Err(ApiError::Api {
                status: 404,
                body: format!("note {note_id} not found"),
            })
        }
    }

    #[test]
    fn dispatcher_drains_jobs_in_order_before_shutdown() {
        let api = RecordingApi::default();
        let calls = api.calls.clone();
        let mut dispatcher = HttpDispatcher::spawn(api).expect("dispatcher");

        dispatcher.create(&note(), &items());
        dispatcher.update(&note(), &items());
        dispatcher.delete(&note());
        dispatcher.shutdown();

        let recorded = calls.lock().unwrap();
        assert_eq!(
            recorded.as_slice(),
            &[
                "create #12 (1 items)".to_string(),
                "update #12 (1 items)".to_string(),
                "delete #12".to_string(),
            ]
        );
    }

    #[test]
    fn dispatch_after_shutdown_is_dropped_quietly() {
        let api = RecordingApi::default();
        let calls = api.calls.clone();
        let mut dispatcher = HttpDispatcher::spawn(api).expect("dispatcher");
        dispatcher.shutdown();

        dispatcher.create(&note(), &items());
        assert!(calls.lock().unwrap().is_empty());
    }
}
