use doc_model::{now_millis, AnnotationId, Comment, DocPoint};
use tracing::debug;

use super::ToolContext;
use crate::annotation::AnnotationStore;

/// Text being typed for a comment that is not saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentDraft {
    pub anchor: DocPoint,
    pub text: String,
}

/// Click to place, type, then save or cancel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentTool {
    draft: Option<CommentDraft>,
}

impl CommentTool {
    /// Opens an empty draft anchored at `point`, replacing any open draft.
    pub fn open(&mut self, point: DocPoint) {
        self.draft = Some(CommentDraft { anchor: point, text: String::new() });
    }

    /// Replaces the draft text. Ignored when no draft is open.
    pub fn set_text(&mut self, text: impl Into<String>) {
        if let Some(draft) = self.draft.as_mut() {
            draft.text = text.into();
        }
    }

    /// Commits the draft. Blank text keeps the draft open and commits nothing.
    pub fn save(
        &mut self,
        ctx: ToolContext<'_>,
        store: &mut AnnotationStore<Comment>,
    ) -> Option<AnnotationId> {
        let draft = self.draft.as_ref()?;
        let text = draft.text.trim();
        if text.is_empty() {
            debug!("comment save blocked: empty text");
            return None;
        }

        let comment = Comment {
            id: AnnotationId::new(),
            position: draft.anchor,
            text: text.to_owned(),
            color: ctx.config.comment_color,
            page_number: ctx.page,
            timestamp: now_millis(),
        };
        self.draft = None;
        Some(store.insert(comment))
    }

    pub fn cancel(&mut self) {
        self.draft = None;
    }

    pub fn draft(&self) -> Option<&CommentDraft> {
        self.draft.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use doc_model::{PageNumber, Scale};

    #[test]
    fn blank_text_is_not_saved() {
        let config = EditorConfig::default();
        let ctx = ToolContext::new(PageNumber::FIRST, Scale::IDENTITY, &config);
        let mut store = AnnotationStore::new();
        let mut tool = CommentTool::default();

        tool.open(DocPoint::new(20.0, 30.0));
        tool.set_text("   \n ");
        assert_eq!(tool.save(ctx, &mut store), None);
        assert!(tool.draft().is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn cancel_discards_without_touching_store() {
        let config = EditorConfig::default();
        let ctx = ToolContext::new(PageNumber::FIRST, Scale::IDENTITY, &config);
        let mut store = AnnotationStore::new();
        let mut tool = CommentTool::default();

        tool.open(DocPoint::new(1.0, 2.0));
        tool.set_text("draft");
        tool.cancel();
        assert!(tool.draft().is_none());
        assert_eq!(tool.save(ctx, &mut store), None);
        assert!(store.is_empty());
    }

    #[test]
    fn save_trims_and_stamps() {
        let config = EditorConfig::default();
        let ctx = ToolContext::new(PageNumber::FIRST, Scale::IDENTITY, &config);
        let mut store = AnnotationStore::new();
        let mut tool = CommentTool::default();

        tool.open(DocPoint::new(20.0, 30.0));
        tool.set_text("  Review this ");
        let id = tool.save(ctx, &mut store).expect("saved");

        let comment = store.get(id).expect("stored");
        assert_eq!(comment.text, "Review this");
        assert_eq!(comment.position, DocPoint::new(20.0, 30.0));
        assert_eq!(comment.color, config.comment_color);
        assert!(comment.timestamp > 0);
        assert!(tool.draft().is_none());
    }
}
