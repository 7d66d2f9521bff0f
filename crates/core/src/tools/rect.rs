use doc_model::{AnnotationId, DocPoint, DocRect, Highlight, Shape, ShapeKind};
use tracing::debug;

use super::ToolContext;
use crate::annotation::AnnotationStore;

/// Drag-to-rectangle state machine shared by highlights and shapes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RectGesture {
    #[default]
    Idle,
    Selecting { anchor: DocPoint, preview: DocRect },
}

impl RectGesture {
    pub fn pointer_down(&mut self, point: DocPoint) {
        let preview = DocRect::new(point.x, point.y, 0.0, 0.0);
        *self = RectGesture::Selecting { anchor: point, preview };
    }

    pub fn pointer_move(&mut self, point: DocPoint) {
        if let RectGesture::Selecting { anchor, preview } = self {
            *preview = DocRect::from_corners(*anchor, point);
        }
    }

    /// Ends the gesture and returns the rectangle if it is large enough.
    pub fn pointer_up(&mut self, point: DocPoint, min_size: f32) -> Option<DocRect> {
        let RectGesture::Selecting { anchor, .. } = std::mem::take(self) else {
            return None;
        };
        let rect = DocRect::from_corners(anchor, point);
        if rect.exceeds(min_size) {
            Some(rect)
        } else {
            debug!(
                width = rect.width,
                height = rect.height,
                "rectangle gesture below minimum size"
            );
            None
        }
    }

    pub fn preview(&self) -> Option<DocRect> {
        match self {
            RectGesture::Idle => None,
            RectGesture::Selecting { preview, .. } => Some(*preview),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, RectGesture::Selecting { .. })
    }

    pub fn cancel(&mut self) {
        *self = RectGesture::Idle;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightTool {
    pub gesture: RectGesture,
}

impl HighlightTool {
    pub fn pointer_down(&mut self, point: DocPoint) {
        self.gesture.pointer_down(point);
    }

    pub fn pointer_move(&mut self, point: DocPoint) {
        self.gesture.pointer_move(point);
    }

    pub fn pointer_up(
        &mut self,
        point: DocPoint,
        ctx: ToolContext<'_>,
        store: &mut AnnotationStore<Highlight>,
    ) -> Option<AnnotationId> {
        let bounds = self.gesture.pointer_up(point, ctx.config.min_gesture_size)?;
        Some(store.insert(Highlight {
            id: AnnotationId::new(),
            bounds,
            color: ctx.config.highlight_color,
            page_number: ctx.page,
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShapeTool {
    pub kind: ShapeKind,
    pub gesture: RectGesture,
}

impl ShapeTool {
    pub fn new(kind: ShapeKind) -> Self {
        Self { kind, gesture: RectGesture::Idle }
    }

    pub fn pointer_down(&mut self, point: DocPoint) {
        self.gesture.pointer_down(point);
    }

    pub fn pointer_move(&mut self, point: DocPoint) {
        self.gesture.pointer_move(point);
    }

    pub fn pointer_up(
        &mut self,
        point: DocPoint,
        ctx: ToolContext<'_>,
        store: &mut AnnotationStore<Shape>,
    ) -> Option<AnnotationId> {
        let bounds = self.gesture.pointer_up(point, ctx.config.min_gesture_size)?;
        Some(store.insert(Shape {
            id: AnnotationId::new(),
            kind: self.kind,
            bounds,
            color: ctx.config.shape_color,
            stroke_color: ctx.config.shape_stroke_color,
            stroke_width: ctx.config.shape_stroke_width,
            page_number: ctx.page,
        }))
    }
}
