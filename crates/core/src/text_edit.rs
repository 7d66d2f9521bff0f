//! In-place overwrite of document text runs.
//!
//! `Viewing -> Selected (click) -> Editing (double-click) -> Viewing (blur / Enter)`.
//! Escape leaves editing without committing. `original_text` is never
//! modified so any run can be reverted.

use doc_model::{AnnotationId, DocPoint, EditableText, PageAnnotation, PageNumber};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::annotation::AnnotationStore;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum TextEditState {
    #[default]
    Viewing,
    Selected { id: AnnotationId },
    Editing { id: AnnotationId, draft: String },
}

/// Key presses the editing field reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditKey {
    Enter { shift: bool },
    Escape,
}

/// Field contents when editing starts: the current text, fully selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditSeed {
    pub text: String,
    pub selection: std::ops::Range<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct TextEditor {
    runs: AnnotationStore<EditableText>,
    state: TextEditState,
}

impl TextEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a text run extracted from the rendered document.
    pub fn add_run(&mut self, run: EditableText) -> AnnotationId {
        self.runs.insert(run)
    }

    pub fn runs(&self) -> &AnnotationStore<EditableText> {
        &self.runs
    }

    pub fn run(&self, id: AnnotationId) -> Option<&EditableText> {
        self.runs.get(id)
    }

    pub fn state(&self) -> &TextEditState {
        &self.state
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        match &self.state {
            TextEditState::Viewing => None,
            TextEditState::Selected { id } | TextEditState::Editing { id, .. } => Some(*id),
        }
    }

    fn editing(&self) -> Option<AnnotationId> {
        match &self.state {
            TextEditState::Editing { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Run on `page` under `point`.
    pub fn hit(&self, page: PageNumber, point: &DocPoint) -> Option<AnnotationId> {
        self.runs.hit(page, point, 0.0).map(|run| run.id())
    }

    /// Single click selects a run. Clicking another run while editing commits first.
    pub fn click(&mut self, id: AnnotationId) {
        if self.runs.get(id).is_none() {
            return;
        }
        match self.editing() {
            Some(editing) if editing == id => return,
            Some(_) => {
                self.commit();
            }
            None => {}
        }
        self.state = TextEditState::Selected { id };
    }

    /// Clicking empty space commits any edit and clears the selection.
    pub fn click_empty(&mut self) {
        self.commit();
        self.state = TextEditState::Viewing;
    }

    /// Double click enters editing, seeded with the current text.
    pub fn double_click(&mut self, id: AnnotationId) -> Option<EditSeed> {
        let text = self.runs.get(id)?.text.clone();
        if self.editing().is_some_and(|editing| editing != id) {
            self.commit();
        }
        self.state = TextEditState::Editing { id, draft: text.clone() };
        Some(EditSeed { selection: 0..text.len(), text })
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        if let TextEditState::Editing { draft, .. } = &mut self.state {
            *draft = text.into();
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match &self.state {
            TextEditState::Editing { draft, .. } => Some(draft),
            _ => None,
        }
    }

    /// Enter commits, Shift+Enter inserts a newline, Escape reverts the draft.
    pub fn key(&mut self, key: EditKey) {
        match key {
            EditKey::Enter { shift: true } => {
                if let TextEditState::Editing { draft, .. } = &mut self.state {
                    draft.push('\n');
                }
            }
            EditKey::Enter { shift: false } => {
                self.commit();
            }
            EditKey::Escape => {
                if let TextEditState::Editing { id, .. } = self.state {
                    debug!(%id, "text edit cancelled");
                    self.state = TextEditState::Selected { id };
                }
            }
        }
    }

    pub fn blur(&mut self) {
        self.commit();
    }

    /// Writes the draft back if it differs. Returns the committed run id.
    fn commit(&mut self) -> Option<AnnotationId> {
        if !matches!(self.state, TextEditState::Editing { .. }) {
            return None;
        }
        let TextEditState::Editing { id, draft } = std::mem::take(&mut self.state) else {
            return None;
        };

        let run = self.runs.get_mut(id)?;
        if run.text == draft {
            return None;
        }
        run.text = draft;
        run.is_edited = true;
        info!(%id, "text run updated");
        Some(id)
    }

    /// Restores the original document text.
    pub fn revert(&mut self, id: AnnotationId) -> bool {
        if self.editing() == Some(id) {
            self.state = TextEditState::Selected { id };
        }
        let Some(run) = self.runs.get_mut(id) else {
            return false;
        };
        run.text = run.original_text.clone();
        run.is_edited = false;
        true
    }
}
