//! Storage gateway and grouping properties
//!
//! Random operation sequences are checked against a plain in-memory model.

use chrono::{Duration, FixedOffset, TimeZone, Utc};
use mockerview::recordings::group_by_date_in;
use mockerview::storage::{FileStore, Recording, StorageGateway, StorageKeys};
use proptest::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
enum Op {
    Add(String),
    Update(usize, String),
    Delete(usize),
    Record(usize),
    DeleteRecording(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[ a-zA-Z?]{0,12}".prop_map(Op::Add),
        (0usize..8, "[ a-zA-Z]{0,8}").prop_map(|(i, t)| Op::Update(i, t)),
        (0usize..8).prop_map(Op::Delete),
        (0usize..8).prop_map(Op::Record),
        (0usize..8).prop_map(Op::DeleteRecording),
    ]
}

/// (question id, text) and (recording id, question id)
#[derive(Default)]
struct Model {
    questions: Vec<(Uuid, String)>,
    recordings: Vec<(Uuid, Uuid)>,
}

fn pick<T>(items: &[T], index: usize) -> Option<&T> {
    if items.is_empty() {
        None
    } else {
        items.get(index % items.len())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_gateway_matches_model(ops in proptest::collection::vec(op(), 1..30)) {
        let storage = StorageGateway::in_memory();
        let mut model = Model::default();
        let clip = mockerview::audio::AudioClip::mono(vec![0.1; 160], 16000);

        for op in ops {
            match op {
                Op::Add(text) => {
                    let added = storage.add_question(&text).unwrap();
                    if text.trim().is_empty() {
                        prop_assert!(added.is_none());
                    } else {
                        let question = added.unwrap();
                        prop_assert_eq!(&question.text, text.trim());
                        model.questions.push((question.id, question.text));
                    }
                }
                Op::Update(i, text) => {
                    if let Some((id, _)) = pick(&model.questions, i).cloned() {
                        let updated = storage.update_question(id, &text).unwrap();
                        // Blank text never replaces a question
                        prop_assert_eq!(updated, !text.trim().is_empty());
                        if updated {
                            if let Some(entry) = model.questions.iter_mut().find(|(q, _)| *q == id) {
                                entry.1 = text.trim().to_string();
                            }
                        }
                    }
                }
                Op::Delete(i) => {
                    if let Some((id, _)) = pick(&model.questions, i).cloned() {
                        let expected = model.recordings.iter().filter(|(_, q)| *q == id).count();
                        prop_assert_eq!(storage.delete_question(id).unwrap(), expected);
                        model.questions.retain(|(q, _)| *q != id);
                        model.recordings.retain(|(_, q)| *q != id);
                    }
                }
                Op::Record(i) => {
                    if let Some((id, _)) = pick(&model.questions, i).cloned() {
                        let recording = storage.add_recording(id, clip.clone()).wait().unwrap();
                        model.recordings.push((recording.id, id));
                    }
                }
                Op::DeleteRecording(i) => {
                    if let Some((id, _)) = pick(&model.recordings, i).cloned() {
                        prop_assert!(storage.delete_recording(id).unwrap());
                        prop_assert!(!storage.delete_recording(id).unwrap());
                        model.recordings.retain(|(r, _)| *r != id);
                    }
                }
            }
        }

        let questions: Vec<(Uuid, String)> = storage
            .list_questions()
            .unwrap()
            .into_iter()
            .map(|q| (q.id, q.text))
            .collect();
        prop_assert_eq!(questions, model.questions.clone());

        let recordings: Vec<(Uuid, Uuid)> = storage
            .list_recordings()
            .unwrap()
            .into_iter()
            .map(|r| (r.id, r.question_id))
            .collect();
        prop_assert_eq!(recordings, model.recordings);

        // No dangling references survive a cascade
        let known: Vec<Uuid> = model.questions.iter().map(|(id, _)| *id).collect();
        for recording in storage.list_recordings().unwrap() {
            prop_assert!(known.contains(&recording.question_id));
        }
    }

    #[test]
    fn prop_grouping_is_ordered_and_complete(
        offsets in proptest::collection::vec(0i64..(60 * 24 * 20), 0..40),
        east_hours in -11i32..12,
    ) {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let question = Uuid::new_v4();
        let recordings: Vec<Recording> = offsets
            .iter()
            .map(|minutes| {
                let mut recording = Recording::new(question, String::new());
                recording.created_at = base + Duration::minutes(*minutes);
                recording
            })
            .collect();

        let zone = FixedOffset::east_opt(east_hours * 3600).unwrap();
        let groups = group_by_date_in(&recordings, &zone);

        let total: usize = groups.iter().map(|g| g.recordings.len()).sum();
        prop_assert_eq!(total, recordings.len());

        for pair in groups.windows(2) {
            prop_assert!(pair[0].date > pair[1].date);
        }
        for group in &groups {
            prop_assert!(!group.recordings.is_empty());
            for recording in &group.recordings {
                prop_assert_eq!(recording.created_at.with_timezone(&zone).date_naive(), group.date);
            }
            for pair in group.recordings.windows(2) {
                prop_assert!(pair[0].created_at >= pair[1].created_at);
            }
        }
    }
}

#[test]
fn test_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let keys = StorageKeys::default();

    let question_id = {
        let storage = StorageGateway::new(Arc::new(FileStore::open(dir.path()).unwrap()), keys.clone());
        let question = storage.add_question("Where do you see yourself?").unwrap().unwrap();
        storage
            .add_recording(question.id, mockerview::testing::tone_clip())
            .wait()
            .unwrap();
        question.id
    };

    let storage = StorageGateway::new(Arc::new(FileStore::open(dir.path()).unwrap()), keys);
    let questions = storage.list_questions().unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].id, question_id);

    let recordings = storage.list_recordings().unwrap();
    assert_eq!(recordings.len(), 1);
    let clip = mockerview::audio::from_data_url(&recordings[0].audio).unwrap();
    assert_eq!(clip.sample_rate, 16000);
    assert!(!clip.is_empty());
}

#[test]
fn test_collections_are_independent_keys() {
    let dir = tempfile::tempdir().unwrap();
    let storage = StorageGateway::new(
        Arc::new(FileStore::open(dir.path()).unwrap()),
        StorageKeys::default(),
    );
    storage.add_question("Q").unwrap();

    assert!(dir.path().join("questions.json").exists());
    assert!(!dir.path().join("recordings.json").exists());
    assert!(storage.list_recordings().unwrap().is_empty());
}
