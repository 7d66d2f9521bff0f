//! Document model shared by the editor, the QR pipeline and storage.

pub mod annotation;
pub mod color;
pub mod geometry;
pub mod records;
pub mod tool;

pub use annotation::{
    now_millis, AnnotationId, Comment, DrawingPath, EditableText, Highlight, InvalidPageNumber,
    PageAnnotation, PageNumber, Shape, ShapeKind,
};
pub use color::{ColorParseError, Rgba, SHAPE_FILL_ALPHA};
pub use geometry::{
    client_to_document, document_to_client, ClientPoint, DocPoint, DocRect, Scale, ScreenPoint,
    ScreenRect, SurfaceRect,
};
pub use records::{Campaign, Project, UserId};
pub use tool::{Tool, UnknownTool};
