//! Free-form object canvas with snapshot history.
//!
//! [`ObjectCanvas`] is the in-memory [`CanvasSurface`]: user-placed
//! rectangles, ellipses, text boxes and images. [`CanvasEditor`] records a
//! history snapshot after every change reported while listeners are attached.

use doc_model::{DocRect, Rgba};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::history::{CanvasSurface, HistoryManager, HistoryStep, SurfaceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanvasObjectKind {
    Rect,
    Ellipse,
    Text,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasObject {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: CanvasObjectKind,
    #[serde(flatten)]
    pub bounds: DocRect,
    pub fill: Rgba,
    /// Text content, or the image source URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Change notification raised while listeners are attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasEvent {
    Added(u64),
    Modified(u64),
    Removed(u64),
}

#[derive(Debug, Serialize, Deserialize)]
struct CanvasDocument {
    objects: Vec<CanvasObject>,
}

#[derive(Debug, Clone)]
pub struct ObjectCanvas {
    objects: Vec<CanvasObject>,
    next_id: u64,
    listening: bool,
    disposed: bool,
    events: Vec<CanvasEvent>,
}

impl Default for ObjectCanvas {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            next_id: 1,
            listening: true,
            disposed: false,
            events: Vec::new(),
        }
    }
}

impl ObjectCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    fn emit(&mut self, event: CanvasEvent) {
        if self.listening {
            self.events.push(event);
        }
    }

    fn ensure_live(&self) -> Result<(), SurfaceError> {
        if self.disposed {
            Err(SurfaceError::Disposed)
        } else {
            Ok(())
        }
    }

    pub fn add(
        &mut self,
        kind: CanvasObjectKind,
        bounds: DocRect,
        fill: Rgba,
        content: Option<String>,
    ) -> Result<u64, SurfaceError> {
        self.ensure_live()?;
        let id = self.next_id;
        self.next_id += 1;
        self.objects.push(CanvasObject { id, kind, bounds, fill, content });
        self.emit(CanvasEvent::Added(id));
        Ok(id)
    }

    pub fn remove(&mut self, id: u64) -> Result<CanvasObject, SurfaceError> {
        self.ensure_live()?;
        let index = self
            .objects
            .iter()
            .position(|object| object.id == id)
            .ok_or(SurfaceError::UnknownObject(id))?;
        let object = self.objects.remove(index);
        self.emit(CanvasEvent::Removed(id));
        Ok(object)
    }

    pub fn move_by(&mut self, id: u64, dx: f32, dy: f32) -> Result<(), SurfaceError> {
        self.ensure_live()?;
        let object = self
            .objects
            .iter_mut()
            .find(|object| object.id == id)
            .ok_or(SurfaceError::UnknownObject(id))?;
        object.bounds.x += dx;
        object.bounds.y += dy;
        self.emit(CanvasEvent::Modified(id));
        Ok(())
    }

    pub fn set_fill(&mut self, id: u64, fill: Rgba) -> Result<(), SurfaceError> {
        self.ensure_live()?;
        let object = self
            .objects
            .iter_mut()
            .find(|object| object.id == id)
            .ok_or(SurfaceError::UnknownObject(id))?;
        object.fill = fill;
        self.emit(CanvasEvent::Modified(id));
        Ok(())
    }

    pub fn objects(&self) -> &[CanvasObject] {
        &self.objects
    }

    pub fn object(&self, id: u64) -> Option<&CanvasObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    /// Drains pending change events.
    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Tears the canvas down. Every later mutation fails with
    /// [`SurfaceError::Disposed`].
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.events.clear();
    }
}

impl CanvasSurface for ObjectCanvas {
    fn serialize(&self) -> Result<String, SurfaceError> {
        self.ensure_live()?;
        let document = CanvasDocument { objects: self.objects.clone() };
        Ok(serde_json::to_string(&document)?)
    }

    /// Replaces every object. Each loaded object raises `Added` if
    /// listeners are still attached.
    fn restore(&mut self, json: &str) -> Result<(), SurfaceError> {
        self.ensure_live()?;
        let document: CanvasDocument = serde_json::from_str(json)?;
        let highest = document.objects.iter().map(|object| object.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(highest + 1);
        self.objects = document.objects;

        let ids: Vec<u64> = self.objects.iter().map(|object| object.id).collect();
        for id in ids {
            self.emit(CanvasEvent::Added(id));
        }
        Ok(())
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn set_listening(&mut self, listening: bool) {
        self.listening = listening;
    }
}

/// One scripted canvas operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CanvasAction {
    Add {
        #[serde(rename = "type")]
        kind: CanvasObjectKind,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(default = "default_fill")]
        fill: Rgba,
        #[serde(default)]
        content: Option<String>,
    },
    Remove {
        id: u64,
    },
    Move {
        id: u64,
        dx: f32,
        dy: f32,
    },
    Fill {
        id: u64,
        fill: Rgba,
    },
    Undo,
    Redo,
    Dispose,
}

fn default_fill() -> Rgba {
    Rgba::INK_BLUE
}

/// Canvas plus history, saving a snapshot after each recorded change.
#[derive(Debug, Clone)]
pub struct CanvasEditor {
    canvas: ObjectCanvas,
    history: HistoryManager,
}

impl CanvasEditor {
    /// Starts from a blank canvas whose empty state is the first snapshot.
    pub fn new(history_depth: usize) -> Self {
        let canvas = ObjectCanvas::new();
        let mut history = HistoryManager::new(history_depth);
        history.save_from(&canvas);
        Self { canvas, history }
    }

    pub fn canvas(&self) -> &ObjectCanvas {
        &self.canvas
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Records one snapshot if the canvas reported changes since the last call.
    fn record_changes(&mut self) {
        let events = self.canvas.take_events();
        if !events.is_empty() {
            debug!(changes = events.len(), "saving canvas snapshot");
            self.history.save_from(&self.canvas);
        }
    }

    pub fn add(
        &mut self,
        kind: CanvasObjectKind,
        bounds: DocRect,
        fill: Rgba,
        content: Option<String>,
    ) -> Result<u64, SurfaceError> {
        let id = self.canvas.add(kind, bounds, fill, content)?;
        self.record_changes();
        Ok(id)
    }

    pub fn remove(&mut self, id: u64) -> Result<(), SurfaceError> {
        self.canvas.remove(id)?;
        self.record_changes();
        Ok(())
    }

    pub fn move_by(&mut self, id: u64, dx: f32, dy: f32) -> Result<(), SurfaceError> {
        self.canvas.move_by(id, dx, dy)?;
        self.record_changes();
        Ok(())
    }

    pub fn set_fill(&mut self, id: u64, fill: Rgba) -> Result<(), SurfaceError> {
        self.canvas.set_fill(id, fill)?;
        self.record_changes();
        Ok(())
    }

    pub fn undo(&mut self) -> HistoryStep {
        let step = self.history.undo(&mut self.canvas);
        self.canvas.take_events();
        step
    }

    pub fn redo(&mut self) -> HistoryStep {
        let step = self.history.redo(&mut self.canvas);
        self.canvas.take_events();
        step
    }

    pub fn dispose(&mut self) {
        info!("canvas disposed");
        self.canvas.dispose();
    }

    /// Applies one scripted action. Operations on a disposed canvas or a
    /// missing object are skipped with a debug log.
    pub fn apply(&mut self, action: CanvasAction) -> Option<HistoryStep> {
        let outcome = match action {
            CanvasAction::Add { kind, x, y, width, height, fill, content } => {
                self.add(kind, DocRect::new(x, y, width, height), fill, content).map(|_| ())
            }
            CanvasAction::Remove { id } => self.remove(id),
            CanvasAction::Move { id, dx, dy } => self.move_by(id, dx, dy),
            CanvasAction::Fill { id, fill } => self.set_fill(id, fill),
            CanvasAction::Undo => return Some(self.undo()),
            CanvasAction::Redo => return Some(self.redo()),
            CanvasAction::Dispose => {
                self.dispose();
                Ok(())
            }
        };
        if let Err(error) = outcome {
            debug!(%error, "canvas action skipped");
        }
        None
    }
}

impl Default for CanvasEditor {
    fn default() -> Self {
        Self::new(crate::history::DEFAULT_HISTORY_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f32) -> DocRect {
        DocRect::new(x, 0.0, 20.0, 20.0)
    }

    #[test]
    fn every_edit_saves_a_snapshot() {
        let mut editor = CanvasEditor::default();
        let id = editor.add(CanvasObjectKind::Rect, square(0.0), Rgba::BLACK, None).expect("add");
        editor.move_by(id, 5.0, 5.0).expect("move");

        assert_eq!(editor.history().len(), 3);
        assert!(editor.history().can_undo());
        assert!(!editor.history().can_redo());
    }

    #[test]
    fn two_undos_return_to_first_edit() {
        let mut editor = CanvasEditor::default();
        editor.add(CanvasObjectKind::Rect, square(0.0), Rgba::BLACK, None).expect("add");
        editor.add(CanvasObjectKind::Ellipse, square(30.0), Rgba::WHITE, None).expect("add");
        editor
            .add(CanvasObjectKind::Text, square(60.0), Rgba::BLACK, Some("Scan me".to_owned()))
            .expect("add");

        editor.undo();
        editor.undo();

        let kinds: Vec<_> = editor.canvas().objects().iter().map(|object| object.kind).collect();
        assert_eq!(kinds, [CanvasObjectKind::Rect]);
        assert_eq!(editor.history().len(), 4);
        assert!(editor.history().can_redo());
    }

    #[test]
    fn undo_does_not_feed_back_into_history() {
        let mut editor = CanvasEditor::default();
        editor.add(CanvasObjectKind::Rect, square(0.0), Rgba::BLACK, None).expect("add");
        editor.add(CanvasObjectKind::Rect, square(30.0), Rgba::BLACK, None).expect("add");

        editor.undo();
        editor.redo();
        editor.undo();

        assert_eq!(editor.history().len(), 3);
        assert_eq!(editor.history().index(), 1);
        assert!(editor.canvas().is_listening());
    }

    #[test]
    fn restore_while_listening_raises_events() {
        let mut source = ObjectCanvas::new();
        source
            .add(CanvasObjectKind::Image, square(0.0), Rgba::WHITE, Some("logo.png".to_owned()))
            .expect("add");
        let json = source.serialize().expect("serialize");

        let mut target = ObjectCanvas::new();
        target.restore(&json).expect("restore");
        assert_eq!(target.take_events(), [CanvasEvent::Added(1)]);

        let next =
            target.add(CanvasObjectKind::Rect, square(40.0), Rgba::BLACK, None).expect("add");
        assert_eq!(next, 2);
    }

    #[test]
    fn disposed_canvas_ignores_everything() {
        let mut editor = CanvasEditor::default();
        editor.add(CanvasObjectKind::Rect, square(0.0), Rgba::BLACK, None).expect("add");
        editor.apply(CanvasAction::Dispose);

        assert_eq!(editor.apply(CanvasAction::Undo), Some(HistoryStep::SurfaceDisposed));
        assert_eq!(editor.history().index(), 1);
        assert!(editor.add(CanvasObjectKind::Rect, square(30.0), Rgba::BLACK, None).is_err());
        assert_eq!(editor.history().len(), 2);
    }

    #[test]
    fn scripted_actions_parse_from_json() {
        let actions: Vec<CanvasAction> = serde_json::from_str(
            r##"[
                {"action": "add", "type": "ellipse", "x": 1, "y": 2, "width": 30, "height": 40},
                {"action": "move", "id": 1, "dx": 5, "dy": 0},
                {"action": "undo"}
            ]"##,
        )
        .expect("valid script");

        let mut editor = CanvasEditor::default();
        for action in actions {
            editor.apply(action);
        }
        let object = editor.canvas().object(1).expect("object");
        assert_eq!(object.bounds.x, 1.0);
        assert_eq!(object.fill, Rgba::INK_BLUE);
    }
}
