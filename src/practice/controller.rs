//! The practice flow controller
//!
//! Drives [`PracticePhase`] from user actions and from the single-shot
//! completions of the announcer and of recording saves. The UI calls
//! [`PracticeController::poll`] once per frame.

use super::state::{PracticeEvent, PracticePhase};
use crate::audio::Microphone;
use crate::integration::Capabilities;
use crate::notice::{Notice, Notices};
use crate::speech::Announcer;
use crate::storage::{Question, Recording, StorageGateway};
use crate::utils::Pending;
use crate::MockerviewError;
use std::time::Duration;
use tracing::{debug, info, warn};

pub struct PracticeController {
    storage: StorageGateway,
    announcer: Box<dyn Announcer>,
    microphone: Box<dyn Microphone>,
    capabilities: Capabilities,
    locale: String,

    phase: PracticePhase,
    question: Option<Question>,
    announcement: Option<Pending<()>>,
    saves: Vec<Pending<Recording>>,
    speech_reported: bool,
    notices: Notices,
}

impl PracticeController {
    pub fn new(
        storage: StorageGateway,
        announcer: Box<dyn Announcer>,
        microphone: Box<dyn Microphone>,
        capabilities: Capabilities,
        locale: impl Into<String>,
    ) -> Self {
        let mut controller = Self {
            storage,
            announcer,
            microphone,
            capabilities,
            locale: locale.into(),
            phase: PracticePhase::Idle,
            question: None,
            announcement: None,
            saves: Vec::new(),
            speech_reported: false,
            notices: Notices::default(),
        };

        if !capabilities.speech {
            controller.report_speech_unavailable();
        }
        controller
    }

    pub fn phase(&self) -> PracticePhase {
        self.phase
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    pub fn is_announcing(&self) -> bool {
        self.phase.is_announcing()
    }

    pub fn is_recording(&self) -> bool {
        self.phase.is_recording()
    }

    pub fn can_record(&self) -> bool {
        self.capabilities.capture
    }

    /// Saves still being encoded or written
    pub fn pending_saves(&self) -> usize {
        self.saves.len()
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    /// Dispatch an event to the matching operation
    pub fn handle(&mut self, event: PracticeEvent) {
        match event {
            PracticeEvent::Request => self.request_question(),
            PracticeEvent::AnnouncementFinished => self.finish_announcement(),
            PracticeEvent::Replay => self.replay(),
            PracticeEvent::StopAnnouncing => self.stop_announcing(),
            PracticeEvent::StartRecording => self.start_recording(),
            PracticeEvent::StopRecording => self.stop_recording(),
            PracticeEvent::Advance => self.advance(),
        }
    }

    fn transition(&mut self, event: PracticeEvent) -> bool {
        match self.phase.on(event) {
            Some(next) => {
                debug!("Practice: {} --{:?}--> {}", self.phase, event, next);
                self.phase = next;
                true
            }
            None => {
                debug!("Practice: {:?} ignored while {}", event, self.phase);
                false
            }
        }
    }

    /// Pick a first random question and announce it
    pub fn request_question(&mut self) {
        if self.phase.on(PracticeEvent::Request).is_none() {
            return;
        }
        self.fetch_and_announce(PracticeEvent::Request);
    }

    /// Drop the current question (saving any capture in progress) and move on
    pub fn advance(&mut self) {
        if self.phase.is_recording() {
            self.finish_capture();
        }
        self.silence();
        self.fetch_and_announce(PracticeEvent::Advance);
    }

    fn fetch_and_announce(&mut self, event: PracticeEvent) {
        match self.storage.random_question() {
            Ok(Some(question)) => {
                info!("Practising question {}", question.id);
                self.question = Some(question);
                self.transition(event);
                self.announce_current();
            }
            Ok(None) => {
                self.question = None;
                self.phase = PracticePhase::Idle;
                self.notices.report(&MockerviewError::EmptyCatalog);
            }
            Err(e) => {
                warn!("Could not pick a question: {}", e);
                self.notices.report(&e);
                self.phase = if self.question.is_some() {
                    PracticePhase::Ready
                } else {
                    PracticePhase::Idle
                };
            }
        }
    }

    fn announce_current(&mut self) {
        self.silence();

        let Some(text) = self.question.as_ref().map(|q| q.text.clone()) else {
            return;
        };

        if !self.capabilities.speech {
            // Nothing to wait for
            self.transition(PracticeEvent::AnnouncementFinished);
            return;
        }

        match self.announcer.announce(&text, &self.locale) {
            Ok(done) => self.announcement = Some(done),
            Err(e) => {
                self.announcement_failed(e);
                self.transition(PracticeEvent::AnnouncementFinished);
            }
        }
    }

    fn announcement_failed(&mut self, error: MockerviewError) {
        if let MockerviewError::Unsupported(_) = error {
            self.capabilities.speech = false;
            self.report_speech_unavailable();
        } else {
            warn!("Announcement failed: {}", error);
            self.notices.report(&error);
        }
    }

    fn report_speech_unavailable(&mut self) {
        if self.speech_reported {
            return;
        }
        self.speech_reported = true;
        self.notices.push(Notice::info(
            "Speech synthesis is not available. Questions will be shown as text only.",
        ));
    }

    fn finish_announcement(&mut self) {
        self.announcement = None;
        self.transition(PracticeEvent::AnnouncementFinished);
    }

    /// Read the current question again
    pub fn replay(&mut self) {
        if self.transition(PracticeEvent::Replay) {
            self.announce_current();
        }
    }

    /// Cut the announcement short; no-op when nothing is being announced
    pub fn stop_announcing(&mut self) {
        if self.transition(PracticeEvent::StopAnnouncing) {
            self.silence();
        }
    }

    fn silence(&mut self) {
        if self.announcement.take().is_some() {
            self.announcer.cancel();
        }
    }

    /// Open the microphone. Failures are reported and leave the flow in `Ready`.
    pub fn start_recording(&mut self) {
        if self.phase.on(PracticeEvent::StartRecording).is_none() {
            return;
        }
        if !self.capabilities.capture {
            self.notices
                .report(&MockerviewError::Unsupported("Recording".into()));
            return;
        }

        match self.microphone.start() {
            Ok(()) => {
                self.transition(PracticeEvent::StartRecording);
            }
            Err(e) => {
                warn!("Could not start recording: {}", e);
                // Make sure nothing was left half open
                self.microphone.stop();
                self.notices.report(&e);
            }
        }
    }

    /// Close the microphone and save the answer; no-op when not recording
    pub fn stop_recording(&mut self) {
        if self.phase.on(PracticeEvent::StopRecording).is_none() {
            return;
        }
        self.finish_capture();
        self.transition(PracticeEvent::StopRecording);
    }

    fn finish_capture(&mut self) {
        let clip = self.microphone.stop();
        let Some(question_id) = self.question.as_ref().map(|q| q.id) else {
            return;
        };

        match clip {
            Some(clip) if !clip.is_empty() => {
                debug!("Saving {:.1}s answer", clip.duration_seconds());
                self.saves.push(self.storage.add_recording(question_id, clip));
            }
            _ => self.notices.push(Notice::info("Nothing was recorded.")),
        }
    }

    /// Stop whatever is active; used when leaving the practice view
    pub fn pause(&mut self) {
        self.stop_announcing();
        self.stop_recording();
    }

    /// Consume completions that arrived since the last call
    pub fn poll(&mut self) {
        if let Some(outcome) = self.announcement.as_mut().and_then(|done| done.poll()) {
            if let Err(e) = outcome {
                self.announcement_failed(e);
            }
            self.finish_announcement();
        }

        let notices = &mut self.notices;
        self.saves.retain_mut(|save| match save.poll() {
            None => true,
            Some(Ok(recording)) => {
                debug!("Recording {} stored", recording.id);
                notices.push(Notice::success("Recording saved!"));
                false
            }
            Some(Err(e)) => {
                notices.push(Notice::error(format!(
                    "Failed to save the recording. {}",
                    e.user_message()
                )));
                false
            }
        });
    }

    /// Block until every in-flight save resolves (or `timeout` passes for one)
    pub fn flush_saves(&mut self, timeout: Duration) -> usize {
        let mut stored = 0;
        for save in self.saves.drain(..) {
            match save.wait_timeout(timeout) {
                Ok(_) => stored += 1,
                Err(e) => warn!("Recording save did not complete: {}", e),
            }
        }
        stored
    }
}

impl Drop for PracticeController {
    fn drop(&mut self) {
        if self.microphone.is_capturing() {
            self.microphone.stop();
        }
        if self.announcement.is_some() {
            self.announcer.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeAnnouncer, FakeMicrophone};

    fn controller(
        storage: &StorageGateway,
        capabilities: Capabilities,
    ) -> (PracticeController, FakeAnnouncer, FakeMicrophone) {
        let announcer = FakeAnnouncer::new();
        let microphone = FakeMicrophone::new();
        let controller = PracticeController::new(
            storage.clone(),
            Box::new(announcer.clone()),
            Box::new(microphone.clone()),
            capabilities,
            "en-US",
        );
        (controller, announcer, microphone)
    }

    fn settle(controller: &mut PracticeController) {
        for _ in 0..500 {
            controller.poll();
            if controller.pending_saves() == 0 {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("saves never settled");
    }

    #[test]
    fn test_empty_catalog_stays_idle() {
        let storage = StorageGateway::in_memory();
        let (mut controller, announcer, _) = controller(&storage, Capabilities::full());

        controller.request_question();

        assert_eq!(controller.phase(), PracticePhase::Idle);
        assert!(controller.current_question().is_none());
        assert_eq!(announcer.announced().len(), 0);
        let notices = controller.notices_mut().drain();
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message.contains("no questions"));
    }

    #[test]
    fn test_announcement_completion_reaches_ready() {
        let storage = StorageGateway::in_memory();
        storage.add_question("Why us?").unwrap();
        let (mut controller, announcer, _) = controller(&storage, Capabilities::full());

        controller.request_question();
        assert_eq!(controller.phase(), PracticePhase::Speaking);
        assert_eq!(announcer.announced(), vec![("Why us?".to_string(), "en-US".to_string())]);

        controller.poll();
        assert_eq!(controller.phase(), PracticePhase::Speaking);

        announcer.finish();
        controller.poll();
        assert_eq!(controller.phase(), PracticePhase::Ready);
    }

    #[test]
    fn test_missing_speech_completes_immediately() {
        let storage = StorageGateway::in_memory();
        storage.add_question("Strengths?").unwrap();
        let caps = Capabilities {
            speech: false,
            ..Capabilities::full()
        };
        let (mut controller, announcer, _) = controller(&storage, caps);

        // Reported once, up front
        assert_eq!(controller.notices_mut().drain().len(), 1);

        controller.request_question();
        assert_eq!(controller.phase(), PracticePhase::Ready);
        assert!(announcer.announced().is_empty());

        controller.replay();
        assert_eq!(controller.phase(), PracticePhase::Ready);
        assert!(controller.notices_mut().is_empty());
    }

    #[test]
    fn test_unsupported_voice_is_reported_once() {
        let storage = StorageGateway::in_memory();
        storage.add_question("Weaknesses?").unwrap();
        let (mut controller, announcer, _) = controller(&storage, Capabilities::full());
        announcer.fail_with(MockerviewError::Unsupported("Speech synthesis for en-US".into()));

        controller.request_question();
        assert_eq!(controller.phase(), PracticePhase::Ready);
        controller.replay();
        assert_eq!(controller.phase(), PracticePhase::Ready);

        assert_eq!(controller.notices_mut().drain().len(), 1);
    }

    #[test]
    fn test_recording_blocked_while_speaking() {
        let storage = StorageGateway::in_memory();
        storage.add_question("Q").unwrap();
        let (mut controller, _, microphone) = controller(&storage, Capabilities::full());

        controller.request_question();
        controller.start_recording();

        assert_eq!(controller.phase(), PracticePhase::Speaking);
        assert_eq!(microphone.starts(), 0);
    }

    #[test]
    fn test_permission_denied_stays_ready() {
        let storage = StorageGateway::in_memory();
        storage.add_question("Q").unwrap();
        let (mut controller, announcer, microphone) = controller(&storage, Capabilities::full());
        microphone.deny();

        controller.request_question();
        announcer.finish();
        controller.poll();
        controller.start_recording();

        assert_eq!(controller.phase(), PracticePhase::Ready);
        assert!(!microphone.is_open());
        let notices = controller.notices_mut().drain();
        assert!(notices[0].message.contains("Microphone access failed"));
    }

    #[test]
    fn test_stop_recording_saves_and_releases() {
        let storage = StorageGateway::in_memory();
        let question = storage.add_question("Q").unwrap().unwrap();
        let (mut controller, announcer, microphone) = controller(&storage, Capabilities::full());

        controller.request_question();
        announcer.finish();
        controller.poll();
        controller.start_recording();
        assert!(microphone.is_open());

        controller.stop_recording();
        assert!(!microphone.is_open());
        assert_eq!(controller.phase(), PracticePhase::Ready);

        settle(&mut controller);
        let recordings = storage.list_recordings().unwrap();
        assert_eq!(recordings.len(), 1);
        assert_eq!(recordings[0].question_id, question.id);
        assert!(controller
            .notices_mut()
            .drain()
            .iter()
            .any(|n| n.message == "Recording saved!"));
    }

    #[test]
    fn test_advance_while_recording_saves_first() {
        let storage = StorageGateway::in_memory();
        storage.add_question("Q").unwrap();
        let (mut controller, announcer, microphone) = controller(&storage, Capabilities::full());

        controller.request_question();
        announcer.finish();
        controller.poll();
        controller.start_recording();
        controller.advance();

        assert!(!microphone.is_open());
        assert_eq!(controller.phase(), PracticePhase::Speaking);
        assert_eq!(controller.flush_saves(Duration::from_secs(10)), 1);
        assert_eq!(storage.list_recordings().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_capture_is_not_saved() {
        let storage = StorageGateway::in_memory();
        storage.add_question("Q").unwrap();
        let (mut controller, announcer, microphone) = controller(&storage, Capabilities::full());
        microphone.set_clip(crate::audio::AudioClip::mono(Vec::new(), 16000));

        controller.request_question();
        announcer.finish();
        controller.poll();
        controller.start_recording();
        controller.stop_recording();

        assert_eq!(controller.pending_saves(), 0);
        assert!(storage.list_recordings().unwrap().is_empty());
    }

    #[test]
    fn test_stops_are_idempotent() {
        let storage = StorageGateway::in_memory();
        storage.add_question("Q").unwrap();
        let (mut controller, announcer, microphone) = controller(&storage, Capabilities::full());

        controller.stop_announcing();
        controller.stop_recording();
        assert_eq!(controller.phase(), PracticePhase::Idle);

        controller.request_question();
        controller.stop_announcing();
        controller.stop_announcing();
        assert_eq!(controller.phase(), PracticePhase::Ready);
        assert_eq!(announcer.cancels(), 1);

        controller.stop_recording();
        assert_eq!(microphone.stops(), 0);
        assert_eq!(controller.pending_saves(), 0);
    }

    #[test]
    fn test_drop_releases_microphone() {
        let storage = StorageGateway::in_memory();
        storage.add_question("Q").unwrap();
        let (mut controller, announcer, microphone) = controller(&storage, Capabilities::full());

        controller.request_question();
        announcer.finish();
        controller.poll();
        controller.start_recording();
        drop(controller);

        assert!(!microphone.is_open());
    }
}
