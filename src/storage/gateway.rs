//! The storage gateway: question and recording collections over a
//! [`KeyValueStore`].
//!
//! Every mutation is a read-modify-write of the whole affected collection.
//! A gateway-wide lock keeps those sequences atomic inside one process,
//! since the recording save runs on a worker thread.

use super::backend::{KeyValueStore, MemoryStore};
use super::types::{Question, Recording};
use crate::audio::{to_data_url, AudioClip};
use crate::utils::{pending, Pending};
use crate::{MockerviewError, Result};
use chrono::Utc;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Keys under which the two collections are stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub questions: String,
    pub recordings: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            questions: "questions".to_string(),
            recordings: "recordings".to_string(),
        }
    }
}

struct Inner {
    store: Arc<dyn KeyValueStore>,
    keys: StorageKeys,
    write_lock: Mutex<()>,
}

/// Cheap to clone; clones share the same store and lock
#[derive(Clone)]
pub struct StorageGateway {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for StorageGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageGateway")
            .field("keys", &self.inner.keys)
            .finish()
    }
}

impl StorageGateway {
    pub fn new(store: Arc<dyn KeyValueStore>, keys: StorageKeys) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                keys,
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Gateway over a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), StorageKeys::default())
    }

    pub fn keys(&self) -> &StorageKeys {
        &self.inner.keys
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        match self.inner.store.get(key)? {
            None => Ok(Vec::new()),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                MockerviewError::StorageError(format!("corrupt {:?} collection: {}", key, e))
            }),
        }
    }

    fn save<T: Serialize>(&self, key: &str, items: &[T]) -> Result<()> {
        let raw = serde_json::to_string(items)?;
        self.inner.store.set(key, &raw)
    }

    /// All questions in insertion order
    pub fn list_questions(&self) -> Result<Vec<Question>> {
        self.load(&self.inner.keys.questions)
    }

    /// Append a question. Blank text (after trimming) is ignored.
    pub fn add_question(&self, text: &str) -> Result<Option<Question>> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring blank question");
            return Ok(None);
        }

        let _guard = self.inner.write_lock.lock();
        let mut questions: Vec<Question> = self.load(&self.inner.keys.questions)?;
        let question = Question::new(text);
        questions.push(question.clone());
        self.save(&self.inner.keys.questions, &questions)?;

        info!("Added question {}", question.id);
        Ok(Some(question))
    }

    /// Replace a question's text. Returns `false` when the id is unknown
    /// or the new text is blank after trimming.
    pub fn update_question(&self, id: Uuid, text: &str) -> Result<bool> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring blank text for question {}", id);
            return Ok(false);
        }

        let _guard = self.inner.write_lock.lock();
        let mut questions: Vec<Question> = self.load(&self.inner.keys.questions)?;

        let Some(question) = questions.iter_mut().find(|q| q.id == id) else {
            debug!("Update for unknown question {}", id);
            return Ok(false);
        };
        question.text = text.to_string();
        question.updated_at = Some(Utc::now());

        self.save(&self.inner.keys.questions, &questions)?;
        info!("Updated question {}", id);
        Ok(true)
    }

    /// Remove a question and every recording that answers it.
    /// Returns the number of recordings removed.
    ///
    /// Both collections are read before either is written, so an unreadable
    /// document leaves storage untouched.
    pub fn delete_question(&self, id: Uuid) -> Result<usize> {
        let _guard = self.inner.write_lock.lock();

        let mut questions: Vec<Question> = self.load(&self.inner.keys.questions)?;
        let mut recordings: Vec<Recording> = self.load(&self.inner.keys.recordings)?;

        questions.retain(|q| q.id != id);
        let before = recordings.len();
        recordings.retain(|r| r.question_id != id);
        let removed = before - recordings.len();

        // Recordings first: a failure between the writes leaves the question
        // in place rather than orphaned answers behind
        self.save(&self.inner.keys.recordings, &recordings)?;
        self.save(&self.inner.keys.questions, &questions)?;

        info!("Deleted question {} and {} recording(s)", id, removed);
        Ok(removed)
    }

    pub fn list_recordings(&self) -> Result<Vec<Recording>> {
        self.load(&self.inner.keys.recordings)
    }

    /// Encode and persist a recording on a worker thread.
    ///
    /// The returned completion resolves once with the stored record, or with
    /// an encode/storage error.
    pub fn add_recording(&self, question_id: Uuid, clip: AudioClip) -> Pending<Recording> {
        let (resolver, done) = pending();
        let gateway = self.clone();

        let spawned = thread::Builder::new()
            .name("recording-save".into())
            .spawn(move || {
                let outcome = gateway.store_recording(question_id, &clip);
                if let Err(e) = &outcome {
                    error!("Saving recording failed: {}", e);
                }
                resolver.resolve(outcome);
            });

        match spawned {
            Ok(_) => done,
            Err(e) => Pending::ready(Err(MockerviewError::IOError(format!(
                "failed to start save worker: {}",
                e
            )))),
        }
    }

    fn store_recording(&self, question_id: Uuid, clip: &AudioClip) -> Result<Recording> {
        let audio = to_data_url(clip)?;

        let _guard = self.inner.write_lock.lock();
        let mut recordings: Vec<Recording> = self.load(&self.inner.keys.recordings)?;
        let recording = Recording::new(question_id, audio);
        recordings.push(recording.clone());
        self.save(&self.inner.keys.recordings, &recordings)?;

        info!(
            "Saved recording {} for question {} ({:.1}s)",
            recording.id,
            question_id,
            clip.duration_seconds()
        );
        Ok(recording)
    }

    /// Remove a recording. Returns `false` when the id is unknown.
    pub fn delete_recording(&self, id: Uuid) -> Result<bool> {
        let _guard = self.inner.write_lock.lock();
        let mut recordings: Vec<Recording> = self.load(&self.inner.keys.recordings)?;

        let before = recordings.len();
        recordings.retain(|r| r.id != id);
        if recordings.len() == before {
            return Ok(false);
        }

        self.save(&self.inner.keys.recordings, &recordings)?;
        info!("Deleted recording {}", id);
        Ok(true)
    }

    /// Uniform pick over the catalog, `None` when it is empty
    pub fn random_question(&self) -> Result<Option<Question>> {
        self.random_question_with(&mut rand::thread_rng())
    }

    pub fn random_question_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Option<Question>> {
        let questions = self.list_questions()?;
        Ok(questions.choose(rng).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FileStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::time::Duration;

    fn clip() -> AudioClip {
        AudioClip::mono(vec![0.1; 1600], 16000)
    }

    fn save(gateway: &StorageGateway, question_id: Uuid) -> Recording {
        gateway
            .add_recording(question_id, clip())
            .wait_timeout(Duration::from_secs(10))
            .unwrap()
    }

    #[test]
    fn test_add_trims_and_ignores_blank() {
        let gateway = StorageGateway::in_memory();

        assert!(gateway.add_question("   ").unwrap().is_none());
        let question = gateway.add_question("  Why Rust?  ").unwrap().unwrap();

        assert_eq!(question.text, "Why Rust?");
        assert_eq!(gateway.list_questions().unwrap(), vec![question]);
    }

    #[test]
    fn test_list_keeps_insertion_order() {
        let gateway = StorageGateway::in_memory();
        for text in ["first", "second", "third"] {
            gateway.add_question(text).unwrap();
        }

        let texts: Vec<_> = gateway
            .list_questions()
            .unwrap()
            .into_iter()
            .map(|q| q.text)
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_update_sets_updated_at() {
        let gateway = StorageGateway::in_memory();
        let question = gateway.add_question("Old").unwrap().unwrap();

        assert!(gateway.update_question(question.id, "New").unwrap());
        let stored = &gateway.list_questions().unwrap()[0];
        assert_eq!(stored.text, "New");
        assert!(stored.updated_at.is_some());
        assert_eq!(stored.created_at, question.created_at);

        assert!(!gateway.update_question(Uuid::new_v4(), "Nope").unwrap());
    }

    #[test]
    fn test_update_with_blank_text_is_ignored() {
        let gateway = StorageGateway::in_memory();
        let question = gateway.add_question("Real").unwrap().unwrap();

        assert!(!gateway.update_question(question.id, "   ").unwrap());
        let stored = &gateway.list_questions().unwrap()[0];
        assert_eq!(stored.text, "Real");
        assert!(stored.updated_at.is_none());

        assert!(gateway.update_question(question.id, "  Trimmed  ").unwrap());
        assert_eq!(gateway.list_questions().unwrap()[0].text, "Trimmed");
    }

    #[test]
    fn test_delete_cascades_to_recordings() {
        let gateway = StorageGateway::in_memory();
        let doomed = gateway.add_question("Doomed").unwrap().unwrap();
        let kept = gateway.add_question("Kept").unwrap().unwrap();

        save(&gateway, doomed.id);
        save(&gateway, doomed.id);
        let survivor = save(&gateway, kept.id);

        assert_eq!(gateway.delete_question(doomed.id).unwrap(), 2);
        assert_eq!(gateway.list_recordings().unwrap(), vec![survivor]);
        assert_eq!(gateway.list_questions().unwrap(), vec![kept]);
    }

    #[test]
    fn test_recording_audio_is_self_contained() {
        let gateway = StorageGateway::in_memory();
        let question = gateway.add_question("Q").unwrap().unwrap();
        let recording = save(&gateway, question.id);

        assert_eq!(recording.question_id, question.id);
        let decoded = crate::audio::from_data_url(&recording.audio).unwrap();
        assert_eq!(decoded.samples.len(), 1600);
    }

    #[test]
    fn test_delete_recording_is_noop_when_absent() {
        let gateway = StorageGateway::in_memory();
        let question = gateway.add_question("Q").unwrap().unwrap();
        let recording = save(&gateway, question.id);

        assert!(!gateway.delete_recording(Uuid::new_v4()).unwrap());
        assert!(gateway.delete_recording(recording.id).unwrap());
        assert!(!gateway.delete_recording(recording.id).unwrap());
        assert!(gateway.list_recordings().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_clip_rejects_save() {
        let gateway = StorageGateway::in_memory();
        let outcome = gateway
            .add_recording(Uuid::new_v4(), AudioClip::new(vec![0.0; 8], 0, 1))
            .wait_timeout(Duration::from_secs(10));

        assert!(matches!(outcome, Err(MockerviewError::EncodeError(_))));
        assert!(gateway.list_recordings().unwrap().is_empty());
    }

    #[test]
    fn test_random_question_on_empty_catalog() {
        let gateway = StorageGateway::in_memory();
        assert!(gateway.random_question().unwrap().is_none());
    }

    #[test]
    fn test_random_question_reaches_every_question() {
        let gateway = StorageGateway::in_memory();
        for text in ["a", "b", "c"] {
            gateway.add_question(text).unwrap();
        }

        let mut rng = StdRng::seed_from_u64(42);
        let mut seen: HashMap<String, usize> = HashMap::new();
        for _ in 0..300 {
            let question = gateway.random_question_with(&mut rng).unwrap().unwrap();
            *seen.entry(question.text).or_default() += 1;
        }

        assert_eq!(seen.len(), 3);
        assert!(seen.values().all(|&count| count > 50));
    }

    #[test]
    fn test_corrupt_document_is_reported() {
        let store = Arc::new(MemoryStore::new());
        store.set("questions", "{not json").unwrap();
        let gateway = StorageGateway::new(store.clone(), StorageKeys::default());

        assert!(matches!(
            gateway.list_questions(),
            Err(MockerviewError::StorageError(_))
        ));
        // The damaged document is not overwritten
        assert!(gateway.add_question("x").is_err());
        assert_eq!(store.get("questions").unwrap().as_deref(), Some("{not json"));
    }

    #[test]
    fn test_delete_question_with_corrupt_recordings_changes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let gateway = StorageGateway::new(store.clone(), StorageKeys::default());
        let question = gateway.add_question("Keep me").unwrap().unwrap();
        store.set("recordings", "{corrupt").unwrap();

        assert!(matches!(
            gateway.delete_question(question.id),
            Err(MockerviewError::StorageError(_))
        ));
        assert_eq!(gateway.list_questions().unwrap(), vec![question]);
        assert_eq!(store.get("recordings").unwrap().as_deref(), Some("{corrupt"));
    }

    #[test]
    fn test_file_backed_gateway_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let keys = StorageKeys::default();

        let gateway = StorageGateway::new(Arc::new(FileStore::open(dir.path()).unwrap()), keys.clone());
        let question = gateway.add_question("Persisted").unwrap().unwrap();
        save(&gateway, question.id);

        let reopened = StorageGateway::new(Arc::new(FileStore::open(dir.path()).unwrap()), keys);
        assert_eq!(reopened.list_questions().unwrap(), vec![question]);
        assert_eq!(reopened.list_recordings().unwrap().len(), 1);
    }
}
