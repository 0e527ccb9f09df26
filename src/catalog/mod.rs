//! Question catalog management

use crate::notice::{Notice, Notices};
use crate::storage::{Question, StorageGateway};
use tracing::{debug, warn};
use uuid::Uuid;

/// An edit dialog in progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDraft {
    pub id: Uuid,
    pub text: String,
}

pub struct QuestionCatalog {
    storage: StorageGateway,
    questions: Vec<Question>,
    /// Contents of the "new question" field
    pub draft: String,
    editing: Option<EditDraft>,
    pending_delete: Option<Uuid>,
    notices: Notices,
}

impl QuestionCatalog {
    pub fn new(storage: StorageGateway) -> Self {
        Self {
            storage,
            questions: Vec::new(),
            draft: String::new(),
            editing: None,
            pending_delete: None,
            notices: Notices::default(),
        }
    }

    pub fn reload(&mut self) {
        match self.storage.list_questions() {
            Ok(questions) => {
                debug!("Loaded {} question(s)", questions.len());
                self.questions = questions;
            }
            Err(e) => {
                warn!("Could not load questions: {}", e);
                self.notices.report(&e);
            }
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn notices_mut(&mut self) -> &mut Notices {
        &mut self.notices
    }

    /// Store the draft as a new question. Blank drafts are ignored.
    pub fn add_draft(&mut self) {
        match self.storage.add_question(&self.draft) {
            Ok(Some(question)) => {
                self.questions.push(question);
                self.draft.clear();
            }
            Ok(None) => {}
            Err(e) => self.notices.report(&e),
        }
    }

    pub fn editing(&self) -> Option<&EditDraft> {
        self.editing.as_ref()
    }

    pub fn editing_mut(&mut self) -> Option<&mut EditDraft> {
        self.editing.as_mut()
    }

    /// Open the edit dialog on a copy of the question's text
    pub fn begin_edit(&mut self, id: Uuid) {
        if let Some(question) = self.questions.iter().find(|q| q.id == id) {
            self.editing = Some(EditDraft {
                id,
                text: question.text.clone(),
            });
        }
    }

    /// Apply the edit dialog. A blank text keeps the dialog open.
    pub fn commit_edit(&mut self) {
        let Some(edit) = self.editing.as_ref() else {
            return;
        };
        if edit.text.trim().is_empty() {
            return;
        }

        match self.storage.update_question(edit.id, &edit.text) {
            // `false` means it was deleted meanwhile; close the dialog either way
            Ok(_) => {
                self.editing = None;
                self.reload();
            }
            Err(e) => self.notices.report(&e),
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Ask for confirmation before deleting
    pub fn request_delete(&mut self, id: Uuid) {
        self.pending_delete = Some(id);
    }

    /// The question awaiting delete confirmation
    pub fn pending_delete(&self) -> Option<&Question> {
        let id = self.pending_delete?;
        self.questions.iter().find(|q| q.id == id)
    }

    /// Delete the confirmed question together with its recordings
    pub fn confirm_delete(&mut self) {
        let Some(id) = self.pending_delete.take() else {
            return;
        };

        match self.storage.delete_question(id) {
            Ok(removed) => {
                self.questions.retain(|q| q.id != id);
                if self.editing.as_ref().is_some_and(|e| e.id == id) {
                    self.editing = None;
                }
                let message = match removed {
                    0 => "Question deleted".to_string(),
                    1 => "Question deleted along with 1 recording".to_string(),
                    n => format!("Question deleted along with {} recordings", n),
                };
                self.notices.push(Notice::success(message));
            }
            Err(e) => self.notices.report(&e),
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::tone_clip;

    fn catalog() -> (QuestionCatalog, StorageGateway) {
        let storage = StorageGateway::in_memory();
        let mut catalog = QuestionCatalog::new(storage.clone());
        catalog.reload();
        (catalog, storage)
    }

    #[test]
    fn test_add_draft() {
        let (mut catalog, storage) = catalog();
        catalog.draft = "  Why do you want this job?  ".into();
        catalog.add_draft();

        assert!(catalog.draft.is_empty());
        assert_eq!(catalog.questions().len(), 1);
        assert_eq!(storage.list_questions().unwrap()[0].text, "Why do you want this job?");
    }

    #[test]
    fn test_blank_draft_is_ignored() {
        let (mut catalog, storage) = catalog();
        catalog.draft = "   ".into();
        catalog.add_draft();

        assert!(catalog.is_empty());
        assert!(storage.list_questions().unwrap().is_empty());
        assert!(catalog.notices_mut().is_empty());
    }

    #[test]
    fn test_edit_roundtrip() {
        let (mut catalog, storage) = catalog();
        catalog.draft = "Old".into();
        catalog.add_draft();
        let id = catalog.questions()[0].id;

        catalog.begin_edit(id);
        catalog.editing_mut().unwrap().text = "   ".into();
        catalog.commit_edit();
        assert!(catalog.editing().is_some());

        catalog.editing_mut().unwrap().text = "New".into();
        catalog.commit_edit();
        assert!(catalog.editing().is_none());
        assert_eq!(catalog.questions()[0].text, "New");
        assert!(storage.list_questions().unwrap()[0].updated_at.is_some());
    }

    #[test]
    fn test_cancel_edit_keeps_text() {
        let (mut catalog, _) = catalog();
        catalog.draft = "Keep me".into();
        catalog.add_draft();
        let id = catalog.questions()[0].id;

        catalog.begin_edit(id);
        catalog.editing_mut().unwrap().text = "Changed".into();
        catalog.cancel_edit();

        assert_eq!(catalog.questions()[0].text, "Keep me");
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let (mut catalog, storage) = catalog();
        catalog.draft = "Q".into();
        catalog.add_draft();
        let id = catalog.questions()[0].id;

        catalog.request_delete(id);
        assert_eq!(catalog.pending_delete().map(|q| q.id), Some(id));
        catalog.cancel_delete();
        catalog.confirm_delete();
        assert_eq!(storage.list_questions().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_cascade_notice() {
        let (mut catalog, storage) = catalog();
        catalog.draft = "Q".into();
        catalog.add_draft();
        let id = catalog.questions()[0].id;
        for _ in 0..2 {
            storage.add_recording(id, tone_clip()).wait().unwrap();
        }

        catalog.request_delete(id);
        catalog.confirm_delete();

        assert!(catalog.is_empty());
        assert!(storage.list_recordings().unwrap().is_empty());
        let notices = catalog.notices_mut().drain();
        assert_eq!(notices[0].message, "Question deleted along with 2 recordings");
    }
}
