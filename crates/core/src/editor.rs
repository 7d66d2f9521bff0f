//! The composed editor surface.
//!
//! One [`ActiveTool`] value carries the in-progress gesture of whichever tool
//! is selected. Pointer events are mapped to document space once, here, and
//! dispatched with a single exhaustive match.

use doc_model::{
    client_to_document, AnnotationId, ClientPoint, Comment, DocPoint, DocRect, EditableText,
    PageAnnotation, PageNumber, Rgba, Scale, ScreenPoint, ScreenRect, ShapeKind, SurfaceRect, Tool,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::annotation::{AnnotationKind, Annotations};
use crate::config::EditorConfig;
use crate::text_edit::{EditKey, EditSeed, TextEditor};
use crate::tools::{CommentTool, FreehandTool, HighlightTool, ShapeTool, ToolContext};

/// The selected tool together with its gesture state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ActiveTool {
    #[default]
    Select,
    Highlight(HighlightTool),
    Shape(ShapeTool),
    Freehand(FreehandTool),
    Comment(CommentTool),
    Text,
}

impl ActiveTool {
    /// Fresh, idle controller for `tool`.
    pub fn for_tool(tool: Tool) -> Self {
        match tool {
            Tool::Select => ActiveTool::Select,
            Tool::Highlight => ActiveTool::Highlight(HighlightTool::default()),
            Tool::Shape(kind) => ActiveTool::Shape(ShapeTool::new(kind)),
            Tool::Freehand => ActiveTool::Freehand(FreehandTool::default()),
            Tool::Comment => ActiveTool::Comment(CommentTool::default()),
            Tool::Text => ActiveTool::Text,
        }
    }

    pub fn tool(&self) -> Tool {
        match self {
            ActiveTool::Select => Tool::Select,
            ActiveTool::Highlight(_) => Tool::Highlight,
            ActiveTool::Shape(shape) => Tool::Shape(shape.kind),
            ActiveTool::Freehand(_) => Tool::Freehand,
            ActiveTool::Comment(_) => Tool::Comment,
            ActiveTool::Text => Tool::Text,
        }
    }

    /// Drops any gesture or draft in progress, keeping the tool selected.
    pub fn cancel(&mut self) {
        match self {
            ActiveTool::Select | ActiveTool::Text => {}
            ActiveTool::Highlight(tool) => tool.gesture.cancel(),
            ActiveTool::Shape(tool) => tool.gesture.cancel(),
            ActiveTool::Freehand(tool) => tool.cancel(),
            ActiveTool::Comment(tool) => tool.cancel(),
        }
    }

    pub fn is_busy(&self) -> bool {
        match self {
            ActiveTool::Select | ActiveTool::Text => false,
            ActiveTool::Highlight(tool) => tool.gesture.is_active(),
            ActiveTool::Shape(tool) => tool.gesture.is_active(),
            ActiveTool::Freehand(tool) => tool.is_active(),
            ActiveTool::Comment(tool) => tool.draft().is_some(),
        }
    }
}

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClickOutcome {
    Removed { id: AnnotationId, kind: AnnotationKind },
    CommentOpened { at: DocPoint },
    TextSelected { id: AnnotationId },
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedRect {
    pub id: AnnotationId,
    pub rect: ScreenRect,
    pub fill: Rgba,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Rgba>,
    pub stroke_width: f32,
    /// Fraction of the shorter side used as corner radius.
    pub corner_radius: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPolyline {
    pub id: AnnotationId,
    pub points: Vec<ScreenPoint>,
    pub color: Rgba,
    pub stroke_width: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMarker {
    pub id: AnnotationId,
    pub at: ScreenPoint,
    pub radius: f32,
    pub color: Rgba,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedText {
    pub id: AnnotationId,
    pub rect: ScreenRect,
    pub text: String,
    pub font_size: f32,
    pub is_edited: bool,
    pub selected: bool,
}

/// In-progress gesture feedback.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GesturePreview {
    Rect { rect: ScreenRect, circle: bool },
    Path { points: Vec<ScreenPoint> },
    CommentDraft { at: ScreenPoint, text: String },
}

/// Everything drawn over the current page, in screen space.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderView {
    pub page: PageNumber,
    pub scale: Scale,
    pub highlights: Vec<RenderedRect>,
    pub shapes: Vec<RenderedRect>,
    pub paths: Vec<RenderedPolyline>,
    pub comments: Vec<RenderedMarker>,
    pub texts: Vec<RenderedText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<GesturePreview>,
}

#[derive(Debug, Clone)]
pub struct EditorSurface {
    config: EditorConfig,
    annotations: Annotations,
    text: TextEditor,
    active: ActiveTool,
    page_index: usize,
    surface: SurfaceRect,
    scale: Scale,
}

impl Default for EditorSurface {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSurface {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            annotations: Annotations::new(),
            text: TextEditor::new(),
            active: ActiveTool::Select,
            page_index: 0,
            surface: SurfaceRect::default(),
            scale: Scale::IDENTITY,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    pub fn text_editor(&self) -> &TextEditor {
        &self.text
    }

    pub fn active_tool(&self) -> &ActiveTool {
        &self.active
    }

    pub fn tool(&self) -> Tool {
        self.active.tool()
    }

    pub fn current_page(&self) -> PageNumber {
        PageNumber::from_index(self.page_index)
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    fn to_document(&self, client: ClientPoint) -> DocPoint {
        client_to_document(client, self.surface, self.scale)
    }

    /// Selects `tool`. Any gesture or draft of the previous tool is dropped.
    pub fn set_tool(&mut self, tool: Tool) {
        if self.active.tool() == tool {
            return;
        }
        if matches!(self.active, ActiveTool::Text) {
            self.text.click_empty();
        }
        debug!(from = %self.active.tool(), to = %tool, "tool changed");
        self.active = ActiveTool::for_tool(tool);
    }

    pub fn set_scale(&mut self, scale: f32) {
        self.scale = Scale::new(scale);
    }

    pub fn set_surface_rect(&mut self, surface: SurfaceRect) {
        self.surface = surface;
    }

    /// Moves to the 0-based display page, resetting any gesture in progress.
    pub fn set_page(&mut self, index: usize) {
        if index == self.page_index {
            return;
        }
        self.cancel_gesture();
        self.text.click_empty();
        self.page_index = index;
    }

    pub fn cancel_gesture(&mut self) {
        self.active.cancel();
    }

    pub fn pointer_down(&mut self, client: ClientPoint) {
        let point = self.to_document(client);
        if !point.is_finite() {
            return;
        }
        match &mut self.active {
            ActiveTool::Highlight(tool) => tool.pointer_down(point),
            ActiveTool::Shape(tool) => tool.pointer_down(point),
            ActiveTool::Freehand(tool) => tool.pointer_down(point),
            ActiveTool::Select | ActiveTool::Comment(_) | ActiveTool::Text => {}
        }
    }

    pub fn pointer_move(&mut self, client: ClientPoint) {
        let point = self.to_document(client);
        if !point.is_finite() {
            return;
        }
        match &mut self.active {
            ActiveTool::Highlight(tool) => tool.pointer_move(point),
            ActiveTool::Shape(tool) => tool.pointer_move(point),
            ActiveTool::Freehand(tool) => {
                tool.pointer_move(point, tool_context(&self.config, self.page_index, self.scale))
            }
            ActiveTool::Select | ActiveTool::Comment(_) | ActiveTool::Text => {}
        }
    }

    /// Ends the gesture, returning the id of a committed annotation.
    pub fn pointer_up(&mut self, client: ClientPoint) -> Option<AnnotationId> {
        let point = self.to_document(client);
        let ctx = tool_context(&self.config, self.page_index, self.scale);
        let committed = match &mut self.active {
            ActiveTool::Highlight(tool) => {
                if !point.is_finite() {
                    tool.gesture.cancel();
                    return None;
                }
                tool.pointer_up(point, ctx, &mut self.annotations.highlights)
            }
            ActiveTool::Shape(tool) => {
                if !point.is_finite() {
                    tool.gesture.cancel();
                    return None;
                }
                tool.pointer_up(point, ctx, &mut self.annotations.shapes)
            }
            ActiveTool::Freehand(tool) => tool.pointer_up(ctx, &mut self.annotations.paths),
            ActiveTool::Select | ActiveTool::Comment(_) | ActiveTool::Text => None,
        }?;
        info!(
            id = %committed,
            tool = %self.active.tool(),
            page = %ctx.page,
            "annotation committed"
        );
        Some(committed)
    }

    /// Single click without a drag.
    ///
    /// Drawing tools remove the topmost annotation of their own kind under
    /// the pointer. Select removes any highlight, shape or path. The comment
    /// tool opens a draft and the text tool selects a run.
    pub fn click(&mut self, client: ClientPoint) -> ClickOutcome {
        let point = self.to_document(client);
        if !point.is_finite() {
            return ClickOutcome::Nothing;
        }
        let page = self.current_page();
        let tolerance = self.config.hit_tolerance;

        let target = match &mut self.active {
            ActiveTool::Highlight(_) => {
                self.annotations.hit(AnnotationKind::Highlight, page, &point, 0.0)
            }
            ActiveTool::Shape(tool) => shape_hit(&self.annotations, tool.kind, page, &point),
            ActiveTool::Freehand(_) => {
                self.annotations.hit(AnnotationKind::Path, page, &point, tolerance)
            }
            ActiveTool::Select => {
                [AnnotationKind::Path, AnnotationKind::Shape, AnnotationKind::Highlight]
                    .into_iter()
                    .find_map(|kind| self.annotations.hit(kind, page, &point, tolerance))
            }
            ActiveTool::Comment(tool) => {
                tool.open(point);
                return ClickOutcome::CommentOpened { at: point };
            }
            ActiveTool::Text => {
                return match self.text.hit(page, &point) {
                    Some(id) => {
                        self.text.click(id);
                        ClickOutcome::TextSelected { id }
                    }
                    None => {
                        self.text.click_empty();
                        ClickOutcome::Nothing
                    }
                };
            }
        };

        match target.and_then(|id| self.annotations.remove(id).map(|kind| (id, kind))) {
            Some((id, kind)) => {
                info!(%id, ?kind, "annotation removed");
                ClickOutcome::Removed { id, kind }
            }
            None => ClickOutcome::Nothing,
        }
    }

    /// Double click with the text tool starts editing the run under the pointer.
    pub fn double_click(&mut self, client: ClientPoint) -> Option<EditSeed> {
        if !matches!(self.active, ActiveTool::Text) {
            return None;
        }
        let point = self.to_document(client);
        let id = self.text.hit(self.current_page(), &point)?;
        self.text.double_click(id)
    }

    pub fn set_comment_text(&mut self, text: impl Into<String>) {
        if let ActiveTool::Comment(tool) = &mut self.active {
            tool.set_text(text);
        }
    }

    pub fn save_comment(&mut self) -> Option<AnnotationId> {
        let ctx = tool_context(&self.config, self.page_index, self.scale);
        let ActiveTool::Comment(tool) = &mut self.active else {
            return None;
        };
        let id = tool.save(ctx, &mut self.annotations.comments)?;
        info!(%id, page = %ctx.page, "comment saved");
        Some(id)
    }

    pub fn cancel_comment(&mut self) {
        if let ActiveTool::Comment(tool) = &mut self.active {
            tool.cancel();
        }
    }

    /// Comment whose marker is under the pointer, for the hover card with
    /// its text and delete action.
    pub fn comment_at(&self, client: ClientPoint) -> Option<&Comment> {
        let point = self.to_document(client);
        if !point.is_finite() {
            return None;
        }
        let radius = self.config.comment_marker_radius;
        self.annotations.comments.hit(self.current_page(), &point, radius)
    }

    /// Delete action on a committed comment.
    pub fn remove_comment(&mut self, id: AnnotationId) -> bool {
        self.annotations.comments.remove(id).is_some()
    }

    /// Replaces a committed comment's text. Blank text is ignored.
    pub fn update_comment(&mut self, id: AnnotationId, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        match self.annotations.comments.get_mut(id) {
            Some(comment) => {
                comment.text = text.to_owned();
                true
            }
            None => false,
        }
    }

    /// Removes an annotation of any kind by id.
    pub fn remove(&mut self, id: AnnotationId) -> Option<AnnotationKind> {
        self.annotations.remove(id)
    }

    pub fn clear_all_annotations(&mut self) {
        self.active.cancel();
        self.annotations.clear_all();
        info!("all annotations cleared");
    }

    pub fn add_text_run(&mut self, run: EditableText) -> AnnotationId {
        self.text.add_run(run)
    }

    pub fn set_text_draft(&mut self, text: impl Into<String>) {
        self.text.set_draft(text);
    }

    pub fn text_key(&mut self, key: EditKey) {
        self.text.key(key);
    }

    pub fn text_blur(&mut self) {
        self.text.blur();
    }

    pub fn revert_text(&mut self, id: AnnotationId) -> bool {
        self.text.revert(id)
    }

    /// Screen-space view of the current page.
    pub fn render(&self) -> RenderView {
        let page = self.current_page();
        let scale = self.scale;
        let on_page = self.annotations.page(page);

        let highlights = on_page
            .highlights
            .iter()
            .map(|highlight| RenderedRect {
                id: highlight.id,
                rect: highlight.bounds.to_screen(scale),
                fill: highlight.color,
                stroke: None,
                stroke_width: 0.0,
                corner_radius: 0.0,
            })
            .collect();

        let shapes = on_page
            .shapes
            .iter()
            .map(|shape| RenderedRect {
                id: shape.id,
                rect: shape.bounds.to_screen(scale),
                fill: shape.fill(),
                stroke: Some(shape.stroke_color),
                stroke_width: shape.stroke_width * scale.get(),
                corner_radius: shape.kind.corner_radius_ratio(),
            })
            .collect();

        let paths = on_page
            .paths
            .iter()
            .map(|path| RenderedPolyline {
                id: path.id,
                points: path.points.iter().map(|point| point.to_screen(scale)).collect(),
                color: path.color,
                stroke_width: path.stroke_width * scale.get(),
            })
            .collect();

        let comments = on_page
            .comments
            .iter()
            .map(|comment| RenderedMarker {
                id: comment.id,
                at: comment.position.to_screen(scale),
                radius: self.config.comment_marker_radius * scale.get(),
                color: comment.color,
                text: comment.text.clone(),
            })
            .collect();

        let selected = self.text.selected();
        let texts = self
            .text
            .runs()
            .on_page(page)
            .map(|run| RenderedText {
                id: run.id(),
                rect: run.bounds.to_screen(scale),
                text: run.text.clone(),
                font_size: run.font_size * scale.get(),
                is_edited: run.is_edited,
                selected: selected == Some(run.id()),
            })
            .collect();

        let preview = self.preview();
        RenderView { page, scale, highlights, shapes, paths, comments, texts, preview }
    }

    fn preview(&self) -> Option<GesturePreview> {
        let scale = self.scale;
        match &self.active {
            ActiveTool::Select | ActiveTool::Text => None,
            ActiveTool::Highlight(tool) => tool
                .gesture
                .preview()
                .map(|rect| GesturePreview::Rect { rect: rect.to_screen(scale), circle: false }),
            ActiveTool::Shape(tool) => tool.gesture.preview().map(|rect| GesturePreview::Rect {
                rect: rect.to_screen(scale),
                circle: tool.kind == ShapeKind::Circle,
            }),
            ActiveTool::Freehand(tool) => tool.is_active().then(|| GesturePreview::Path {
                points: tool.preview().iter().map(|p| p.to_screen(scale)).collect(),
            }),
            ActiveTool::Comment(tool) => tool.draft().map(|draft| GesturePreview::CommentDraft {
                at: draft.anchor.to_screen(scale),
                text: draft.text.clone(),
            }),
        }
    }
}

fn tool_context(config: &EditorConfig, page_index: usize, scale: Scale) -> ToolContext<'_> {
    ToolContext::new(PageNumber::from_index(page_index), scale, config)
}

fn shape_hit(
    annotations: &Annotations,
    kind: ShapeKind,
    page: PageNumber,
    point: &DocPoint,
) -> Option<AnnotationId> {
    annotations
        .shapes
        .iter()
        .rev()
        .find(|shape| shape.kind == kind && shape.page_number == page && shape.hit_test(point, 0.0))
        .map(|shape| shape.id)
}

/// One scripted editor event, in client coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EditorAction {
    SetTool { tool: String },
    SetScale { scale: f32 },
    SetSurface { left: f32, top: f32, width: f32, height: f32 },
    SetPage { index: usize },
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp { x: f32, y: f32 },
    /// Down, one move, up.
    Drag { from: ClientPoint, to: ClientPoint },
    Click { x: f32, y: f32 },
    DoubleClick { x: f32, y: f32 },
    CommentText { text: String },
    SaveComment,
    CancelComment,
    RemoveComment { id: AnnotationId },
    UpdateComment { id: AnnotationId, text: String },
    AddTextRun {
        text: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(default = "default_font_size")]
        font_size: f32,
        #[serde(default = "default_page")]
        page: u32,
    },
    TextDraft { text: String },
    TextKey { key: EditKey },
    TextBlur,
    CancelGesture,
    ClearAll,
}

fn default_font_size() -> f32 {
    12.0
}

fn default_page() -> u32 {
    1
}

pub fn apply_editor_action(editor: &mut EditorSurface, action: EditorAction) {
    match action {
        EditorAction::SetTool { tool } => match tool.parse::<Tool>() {
            Ok(tool) => editor.set_tool(tool),
            Err(error) => debug!(%error, "ignoring tool change"),
        },
        EditorAction::SetScale { scale } => editor.set_scale(scale),
        EditorAction::SetSurface { left, top, width, height } => {
            editor.set_surface_rect(SurfaceRect::new(left, top, width, height))
        }
        EditorAction::SetPage { index } => editor.set_page(index),
        EditorAction::PointerDown { x, y } => editor.pointer_down(ClientPoint::new(x, y)),
        EditorAction::PointerMove { x, y } => editor.pointer_move(ClientPoint::new(x, y)),
        EditorAction::PointerUp { x, y } => {
            editor.pointer_up(ClientPoint::new(x, y));
        }
        EditorAction::Drag { from, to } => {
            editor.pointer_down(from);
            editor.pointer_move(to);
            editor.pointer_up(to);
        }
        EditorAction::Click { x, y } => {
            editor.click(ClientPoint::new(x, y));
        }
        EditorAction::DoubleClick { x, y } => {
            editor.double_click(ClientPoint::new(x, y));
        }
        EditorAction::CommentText { text } => editor.set_comment_text(text),
        EditorAction::SaveComment => {
            editor.save_comment();
        }
        EditorAction::CancelComment => editor.cancel_comment(),
        EditorAction::RemoveComment { id } => {
            editor.remove_comment(id);
        }
        EditorAction::UpdateComment { id, text } => {
            editor.update_comment(id, &text);
        }
        EditorAction::AddTextRun { text, x, y, width, height, font_size, page } => {
            let page = PageNumber::new(page).unwrap_or_default();
            let bounds = DocRect::new(x, y, width, height);
            editor.add_text_run(EditableText::new(text, bounds, font_size, page));
        }
        EditorAction::TextDraft { text } => editor.set_text_draft(text),
        EditorAction::TextKey { key } => editor.text_key(key),
        EditorAction::TextBlur => editor.text_blur(),
        EditorAction::CancelGesture => editor.cancel_gesture(),
        EditorAction::ClearAll => editor.clear_all_annotations(),
    }
}
