//! Practice flow states and the transition table

/// Where a practice session stands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PracticePhase {
    /// No question selected
    #[default]
    Idle,
    /// Question is being read aloud
    Speaking,
    /// Announcement finished, waiting for the user
    Ready,
    /// Microphone capture active
    Recording,
}

/// Inputs to the practice flow, from the user or from platform callbacks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PracticeEvent {
    /// Fetch a first random question
    Request,
    /// The announcer's completion fired
    AnnouncementFinished,
    /// Read the current question again
    Replay,
    /// Cut the announcement short
    StopAnnouncing,
    StartRecording,
    StopRecording,
    /// Drop the current question and fetch another
    Advance,
}

impl PracticePhase {
    /// The transition table. `None` means the event is ignored in this phase.
    ///
    /// Announcing and recording are exclusive: nothing reaches `Recording`
    /// from `Speaking`, and nothing reaches `Speaking` from `Recording`
    /// except `Advance`, which stops the capture first.
    pub fn on(self, event: PracticeEvent) -> Option<PracticePhase> {
        use PracticeEvent::*;
        use PracticePhase::*;

        match (self, event) {
            (Idle, Request) => Some(Speaking),
            (Speaking, AnnouncementFinished) => Some(Ready),
            (Speaking, StopAnnouncing) => Some(Ready),
            (Ready, Replay) => Some(Speaking),
            (Ready, StartRecording) => Some(Recording),
            (Recording, StopRecording) => Some(Ready),
            (_, Advance) => Some(Speaking),
            _ => None,
        }
    }

    pub fn is_announcing(&self) -> bool {
        matches!(self, PracticePhase::Speaking)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self, PracticePhase::Recording)
    }

    pub fn has_question(&self) -> bool {
        !matches!(self, PracticePhase::Idle)
    }
}

impl std::fmt::Display for PracticePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PracticePhase::Idle => write!(f, "Idle"),
            PracticePhase::Speaking => write!(f, "Speaking"),
            PracticePhase::Ready => write!(f, "Ready"),
            PracticePhase::Recording => write!(f, "Recording"),
        }
    }
}
