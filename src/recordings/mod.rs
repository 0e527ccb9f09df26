//! Browsing, playing and deleting saved answers

use crate::audio::{from_data_url, AudioSink};
use crate::notice::{Notice, Notices};
use crate::storage::{Question, Recording, RecordingGroup, StorageGateway};
use crate::utils::Pending;
use crate::Result;
use chrono::{Local, TimeZone};
use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

/// Label shown for recordings whose question no longer exists
pub const DELETED_QUESTION: &str = "(deleted question)";

/// Group recordings by local calendar date, newest day first and newest
/// recording first within a day
pub fn group_by_date(recordings: &[Recording]) -> Vec<RecordingGroup> {
    group_by_date_in(recordings, &Local)
}

pub fn group_by_date_in<Tz: TimeZone>(recordings: &[Recording], tz: &Tz) -> Vec<RecordingGroup> {
    let mut sorted = recordings.to_vec();
    sorted.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let mut groups: Vec<RecordingGroup> = Vec::new();
    for recording in sorted {
        let date = recording.created_at.with_timezone(tz).date_naive();
        match groups.last_mut() {
            Some(group) if group.date == date => group.recordings.push(recording),
            _ => groups.push(RecordingGroup {
                date,
                recordings: vec![recording],
            }),
        }
    }
    groups
}

pub struct RecordingsBrowser {
    storage: StorageGateway,
    player: Box<dyn AudioSink>,
    recordings: Vec<Recording>,
    questions: HashMap<Uuid, Question>,
    playing: Option<(Uuid, Pending<()>)>,
    pending_delete: Option<Uuid>,
    notices: Notices,
}

impl RecordingsBrowser {
    pub fn new(storage: StorageGateway, player: Box<dyn AudioSink>) -> Self {
        Self {
            storage,
            player,
            recordings: Vec::new(),
            questions: HashMap::new(),
            playing: None,
            pending_delete: None,
            notices: Notices::default(),
        }
    }

    /// Re-read recordings and questions from storage
    pub fn reload(&mut self) {
        if let Err(e) = self.try_reload() {
            warn!("Could not load recordings: {}", e);
            self.notices.report(&e);
        }
    }

    fn try_reload(&mut self) -> Result<()> {
        let recordings = self.storage.list_recordings()?;
        let questions = self.storage.list_questions()?;

        self.recordings = recordings;
        self.questions = questions.into_iter().map(|q| (q.id, q)).collect();

        // The playing recording may have been removed elsewhere
        if let Some(id) = self.playing_id() {
            if !self.recordings.iter().any(|r| r.id == id) {
                self.stop();
            }
        }
        if let Some(id) = self.pending_delete {
            if !self.recordings.iter().any(|r| r.id == id) {
                self.pending_delete = None;
            }
        }
        debug!("Loaded {} recording(s)", self.recordings.len());
        Ok(())
    }

    pub fn recordings(&self) -> &[Recording] {
        &self.recordings
    }

    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }

    pub fn groups(&self) -> Vec<RecordingGroup> {
        group_by_date(&self.recordings)
    }

    /// Text of the recording's question, or a placeholder when it is gone
    pub fn question_label(&self, recording: &Recording) -> &str {
        self.questions
            .get(&recording.question_id)
            .map(|q| q.text.as_str())
            .unwrap_or(DELETED_QUESTION)
    }

    pub fn playing_id(&self) -> Option<Uuid> {
        self.playing.as_ref().map(|(id, _)| *id)
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    /// Play `id`, or stop it when it is the one already playing.
    /// Starting a recording always stops the previous one.
    pub fn toggle_playback(&mut self, id: Uuid) {
        if self.playing_id() == Some(id) {
            self.stop();
            return;
        }
        self.stop();

        let Some(recording) = self.recordings.iter().find(|r| r.id == id) else {
            return;
        };

        let started = from_data_url(&recording.audio).and_then(|clip| self.player.play(&clip));
        match started {
            Ok(done) => {
                debug!("Playing recording {}", id);
                self.playing = Some((id, done));
            }
            Err(e) => {
                warn!("Playback of {} failed: {}", id, e);
                self.notices.report(&e);
            }
        }
    }

    /// Stop playback; no-op when nothing is playing
    pub fn stop(&mut self) {
        if self.playing.take().is_some() {
            self.player.stop();
        }
    }

    /// Ask for confirmation before deleting `id`
    pub fn request_delete(&mut self, id: Uuid) {
        self.pending_delete = Some(id);
    }

    /// The recording awaiting delete confirmation
    pub fn pending_delete(&self) -> Option<&Recording> {
        let id = self.pending_delete?;
        self.recordings.iter().find(|r| r.id == id)
    }

    pub fn confirm_delete(&mut self) {
        if let Some(id) = self.pending_delete.take() {
            self.delete(id);
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Delete a recording, stopping it first when it is playing
    pub fn delete(&mut self, id: Uuid) {
        if self.playing_id() == Some(id) {
            self.stop();
        }

        match self.storage.delete_recording(id) {
            Ok(true) => {
                self.recordings.retain(|r| r.id != id);
                self.notices.push(Notice::success("Recording deleted"));
            }
            Ok(false) => debug!("Recording {} was already gone", id),
            Err(e) => {
                warn!("Could not delete recording {}: {}", id, e);
                self.notices.report(&e);
            }
        }
    }

    /// Clear the playing slot once the clip has ended
    pub fn poll(&mut self) {
        let finished = match self.playing.as_mut() {
            Some((_, done)) => done.poll(),
            None => None,
        };

        if let Some(outcome) = finished {
            if let Err(e) = outcome {
                warn!("Playback ended with an error: {}", e);
                self.notices.report(&e);
            }
            self.playing = None;
        }
    }
}

impl Drop for RecordingsBrowser {
    fn drop(&mut self) {
        self.stop();
    }
}
