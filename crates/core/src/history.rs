//! Linear undo/redo over whole-canvas snapshots.
//!
//! The manager only knows the [`CanvasSurface`] contract (serialize, restore,
//! disposed flag, change listeners), not the drawing technology behind it.
//! Saving after an undo discards the redo branch.

use doc_model::now_millis;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use tracing::{debug, warn};

pub const DEFAULT_HISTORY_DEPTH: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("canvas has been disposed")]
    Disposed,
    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("no canvas object with id {0}")]
    UnknownObject(u64),
}

/// A drawing surface whose whole state can be captured and put back.
pub trait CanvasSurface {
    fn serialize(&self) -> Result<String, SurfaceError>;

    fn restore(&mut self, json: &str) -> Result<(), SurfaceError>;

    fn is_disposed(&self) -> bool;

    /// Attaches (`true`) or detaches the change listeners that feed history.
    fn set_listening(&mut self, listening: bool);
}

/// Detaches change listeners for its lifetime so a restore is never
/// recorded as a user edit.
pub struct PausedListeners<'a, S: CanvasSurface + ?Sized> {
    surface: &'a mut S,
}

impl<'a, S: CanvasSurface + ?Sized> PausedListeners<'a, S> {
    pub fn new(surface: &'a mut S) -> Self {
        surface.set_listening(false);
        Self { surface }
    }
}

impl<S: CanvasSurface + ?Sized> Deref for PausedListeners<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: CanvasSurface + ?Sized> DerefMut for PausedListeners<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: CanvasSurface + ?Sized> Drop for PausedListeners<'_, S> {
    fn drop(&mut self) {
        self.surface.set_listening(true);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasHistoryState {
    pub json: String,
    pub timestamp: i64,
}

/// Result of an undo or redo request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    Restored { index: usize },
    /// Nothing further to undo or redo.
    AtBoundary,
    /// The surface is gone; nothing was touched.
    SurfaceDisposed,
    /// The surface rejected the snapshot; the pointer did not move.
    RestoreFailed,
}

#[derive(Debug, Clone)]
pub struct HistoryManager {
    entries: VecDeque<CanvasHistoryState>,
    cursor: Option<usize>,
    max_depth: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl HistoryManager {
    /// `max_depth` of 0 is treated as 1.
    pub fn new(max_depth: usize) -> Self {
        Self { entries: VecDeque::new(), cursor: None, max_depth: max_depth.max(1) }
    }

    /// Appends a snapshot, dropping redo states and evicting the oldest
    /// entries beyond the depth limit.
    pub fn save(&mut self, json: impl Into<String>) {
        let keep = self.cursor.map_or(0, |cursor| cursor + 1);
        self.entries.truncate(keep);
        self.entries.push_back(CanvasHistoryState { json: json.into(), timestamp: now_millis() });

        while self.entries.len() > self.max_depth {
            self.entries.pop_front();
        }
        self.cursor = Some(self.entries.len() - 1);
    }

    /// Snapshots `surface`. A disposed surface is skipped.
    pub fn save_from<S: CanvasSurface + ?Sized>(&mut self, surface: &S) -> bool {
        if surface.is_disposed() {
            debug!("skipping history save: canvas disposed");
            return false;
        }
        match surface.serialize() {
            Ok(json) => {
                self.save(json);
                true
            }
            Err(error) => {
                warn!(%error, "could not snapshot canvas");
                false
            }
        }
    }

    pub fn undo<S: CanvasSurface + ?Sized>(&mut self, surface: &mut S) -> HistoryStep {
        if !self.can_undo() {
            return HistoryStep::AtBoundary;
        }
        let target = self.cursor.map_or(0, |cursor| cursor - 1);
        self.step_to(target, surface)
    }

    pub fn redo<S: CanvasSurface + ?Sized>(&mut self, surface: &mut S) -> HistoryStep {
        if !self.can_redo() {
            return HistoryStep::AtBoundary;
        }
        let target = self.cursor.map_or(0, |cursor| cursor + 1);
        self.step_to(target, surface)
    }

    fn step_to<S>(&mut self, target: usize, surface: &mut S) -> HistoryStep
    where
        S: CanvasSurface + ?Sized,
    {
        if surface.is_disposed() {
            debug!("skipping history step: canvas disposed");
            return HistoryStep::SurfaceDisposed;
        }
        let Some(state) = self.entries.get(target) else {
            return HistoryStep::AtBoundary;
        };

        let restored = {
            let mut paused = PausedListeners::new(surface);
            paused.restore(&state.json)
        };

        match restored {
            Ok(()) => {
                self.cursor = Some(target);
                HistoryStep::Restored { index: target }
            }
            Err(SurfaceError::Disposed) => HistoryStep::SurfaceDisposed,
            Err(error) => {
                warn!(%error, "canvas restore failed");
                HistoryStep::RestoreFailed
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor + 1 < self.entries.len())
    }

    /// Current position; -1 when empty.
    pub fn index(&self) -> isize {
        self.cursor.map_or(-1, |cursor| cursor as isize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn current(&self) -> Option<&CanvasHistoryState> {
        self.cursor.and_then(|cursor| self.entries.get(cursor))
    }

    pub fn entries(&self) -> impl Iterator<Item = &CanvasHistoryState> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Surface holding a single string, counting changes seen while listening.
    #[derive(Default)]
    struct StubSurface {
        content: String,
        listening: bool,
        disposed: bool,
        reject: bool,
        recorded_changes: usize,
    }

    impl StubSurface {
        fn edit(&mut self, content: &str) {
            self.content = content.to_owned();
            if self.listening {
                self.recorded_changes += 1;
            }
        }
    }

    impl CanvasSurface for StubSurface {
        fn serialize(&self) -> Result<String, SurfaceError> {
            Ok(self.content.clone())
        }

        fn restore(&mut self, json: &str) -> Result<(), SurfaceError> {
            if self.reject {
                return Err(SurfaceError::UnknownObject(0));
            }
            self.edit(json);
            Ok(())
        }

        fn is_disposed(&self) -> bool {
            self.disposed
        }

        fn set_listening(&mut self, listening: bool) {
            self.listening = listening;
        }
    }

    fn listening_surface() -> StubSurface {
        StubSurface { listening: true, ..StubSurface::default() }
    }

    #[test]
    fn index_invariants_hold_from_empty() {
        let history = HistoryManager::default();
        assert_eq!(history.index(), -1);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.is_empty());
    }

    #[test]
    fn saves_up_to_depth_are_all_kept() {
        for n in 2..=DEFAULT_HISTORY_DEPTH {
            let mut history = HistoryManager::default();
            for i in 0..n {
                history.save(format!("state-{i}"));
            }
            assert_eq!(history.len(), n);
            assert!(history.can_undo());
            assert!(!history.can_redo());
            assert_eq!(history.index(), n as isize - 1);
        }
    }

    #[test]
    fn overflow_evicts_oldest() {
        let mut history = HistoryManager::default();
        for i in 0..60 {
            history.save(format!("state-{i}"));
        }

        assert_eq!(history.len(), 50);
        assert_eq!(history.index(), 49);
        assert_eq!(history.entries().next().map(|entry| entry.json.as_str()), Some("state-10"));
        assert_eq!(history.current().map(|entry| entry.json.as_str()), Some("state-59"));
    }

    #[test]
    fn save_after_undo_discards_redo_branch() {
        let mut surface = listening_surface();
        let mut history = HistoryManager::default();
        for state in ["a", "b", "c"] {
            surface.edit(state);
            history.save_from(&surface);
        }

        assert_eq!(history.undo(&mut surface), HistoryStep::Restored { index: 1 });
        assert!(history.can_redo());

        surface.edit("d");
        history.save_from(&surface);

        assert!(!history.can_redo());
        assert_eq!(history.len(), 3);
        let states: Vec<_> = history.entries().map(|entry| entry.json.as_str()).collect();
        assert_eq!(states, ["a", "b", "d"]);
        assert_eq!(history.redo(&mut surface), HistoryStep::AtBoundary);
    }

    #[test]
    fn undo_twice_then_redo() {
        let mut surface = listening_surface();
        let mut history = HistoryManager::default();
        for state in ["first", "second", "third"] {
            surface.edit(state);
            history.save_from(&surface);
        }

        history.undo(&mut surface);
        history.undo(&mut surface);
        assert_eq!(surface.content, "first");
        assert_eq!(history.undo(&mut surface), HistoryStep::AtBoundary);

        assert_eq!(history.redo(&mut surface), HistoryStep::Restored { index: 1 });
        assert_eq!(surface.content, "second");
    }

    #[test]
    fn restore_is_not_recorded_as_user_change() {
        let mut surface = listening_surface();
        let mut history = HistoryManager::default();
        surface.edit("one");
        history.save_from(&surface);
        surface.edit("two");
        history.save_from(&surface);
        let before = surface.recorded_changes;

        history.undo(&mut surface);
        history.redo(&mut surface);

        assert_eq!(surface.recorded_changes, before);
        assert!(surface.listening, "listeners must be reattached");
    }

    #[test]
    fn disposed_surface_is_a_no_op() {
        let mut surface = listening_surface();
        let mut history = HistoryManager::default();
        history.save("one");
        history.save("two");
        surface.disposed = true;

        assert_eq!(history.undo(&mut surface), HistoryStep::SurfaceDisposed);
        assert_eq!(history.index(), 1);
        assert!(!history.save_from(&surface));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn failed_restore_keeps_pointer() {
        let mut surface = StubSurface { reject: true, ..listening_surface() };
        let mut history = HistoryManager::default();
        history.save("one");
        history.save("two");

        assert_eq!(history.undo(&mut surface), HistoryStep::RestoreFailed);
        assert_eq!(history.index(), 1);
        assert!(surface.listening);
    }
}
