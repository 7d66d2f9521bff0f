//! qrdeck editor core
//!
//! Annotation stores, pointer tools, inline text editing and snapshot
//! history for the template editor.

pub mod annotation;
pub mod canvas;
pub mod config;
pub mod editor;
pub mod history;
pub mod text_edit;
pub mod tools;

pub use annotation::{AnnotationKind, AnnotationStore, Annotations, PageAnnotations};
pub use canvas::{
    CanvasAction, CanvasEditor, CanvasEvent, CanvasObject, CanvasObjectKind, ObjectCanvas,
};
pub use config::{ConfigError, EditorConfig};
pub use editor::{
    apply_editor_action, ActiveTool, ClickOutcome, EditorAction, EditorSurface, GesturePreview,
    RenderView,
};
pub use history::{
    CanvasHistoryState, CanvasSurface, HistoryManager, HistoryStep, PausedListeners, SurfaceError,
    DEFAULT_HISTORY_DEPTH,
};
pub use text_edit::{EditKey, EditSeed, TextEditState, TextEditor};
pub use tools::{
    CommentDraft, CommentTool, FreehandTool, HighlightTool, RectGesture, ShapeTool, ToolContext,
};
