//! Pointer-driven tool controllers.
//!
//! Each controller is a small state machine over document-space points. On
//! release it either commits a new entity into the matching store or
//! discards the gesture. Controllers never look at which tool is active;
//! the editor only routes events to the one that is.

mod comment;
mod freehand;
mod rect;

pub use comment::{CommentDraft, CommentTool};
pub use freehand::FreehandTool;
pub use rect::{HighlightTool, RectGesture, ShapeTool};

use doc_model::{PageNumber, Scale};

use crate::config::EditorConfig;

/// What a controller needs to filter samples and stamp a committed entity.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    pub page: PageNumber,
    /// Current zoom, for thresholds measured on screen.
    pub scale: Scale,
    pub config: &'a EditorConfig,
}

impl<'a> ToolContext<'a> {
    pub fn new(page: PageNumber, scale: Scale, config: &'a EditorConfig) -> Self {
        Self { page, scale, config }
    }
}
