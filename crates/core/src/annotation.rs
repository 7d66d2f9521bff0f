//! Annotation stores.
//!
//! Four independent collections (highlights, shapes, freehand paths,
//! comments), each keyed by [`AnnotationId`] and kept in insertion order,
//! which is also render order.

use doc_model::{
    AnnotationId, Comment, DocPoint, DrawingPath, Highlight, PageAnnotation, PageNumber, Shape,
};
use serde::{Deserialize, Serialize};

/// Ordered collection of one annotation kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationStore<T> {
    items: Vec<T>,
}

impl<T> Default for AnnotationStore<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: PageAnnotation> AnnotationStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, item: T) -> AnnotationId {
        let id = item.id();
        self.items.push(item);
        id
    }

    /// Removes the entry with `id`; every other entry is untouched.
    pub fn remove(&mut self, id: AnnotationId) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, id: AnnotationId) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn get_mut(&mut self, id: AnnotationId) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Entries on `page`, in render order.
    pub fn on_page(&self, page: PageNumber) -> impl Iterator<Item = &T> {
        self.items.iter().filter(move |item| item.page_number() == page)
    }

    /// Topmost entry on `page` under `point`.
    pub fn hit(&self, page: PageNumber, point: &DocPoint, tolerance: f32) -> Option<&T> {
        self.items
            .iter()
            .rev()
            .find(|item| item.page_number() == page && item.hit_test(point, tolerance))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Which store an annotation lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Highlight,
    Shape,
    Path,
    Comment,
}

/// All four stores of one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Annotations {
    pub highlights: AnnotationStore<Highlight>,
    pub shapes: AnnotationStore<Shape>,
    pub paths: AnnotationStore<DrawingPath>,
    pub comments: AnnotationStore<Comment>,
}

/// Borrowed view of everything on one page.
#[derive(Debug)]
pub struct PageAnnotations<'a> {
    pub highlights: Vec<&'a Highlight>,
    pub shapes: Vec<&'a Shape>,
    pub paths: Vec<&'a DrawingPath>,
    pub comments: Vec<&'a Comment>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.highlights.len() + self.shapes.len() + self.paths.len() + self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empties all four stores. Calling it on empty stores is a no-op.
    pub fn clear_all(&mut self) {
        self.highlights.clear();
        self.shapes.clear();
        self.paths.clear();
        self.comments.clear();
    }

    pub fn page(&self, page: PageNumber) -> PageAnnotations<'_> {
        PageAnnotations {
            highlights: self.highlights.on_page(page).collect(),
            shapes: self.shapes.on_page(page).collect(),
            paths: self.paths.on_page(page).collect(),
            comments: self.comments.on_page(page).collect(),
        }
    }

    /// Finds the store holding `id`.
    pub fn kind_of(&self, id: AnnotationId) -> Option<AnnotationKind> {
        if self.highlights.get(id).is_some() {
            Some(AnnotationKind::Highlight)
        } else if self.shapes.get(id).is_some() {
            Some(AnnotationKind::Shape)
        } else if self.paths.get(id).is_some() {
            Some(AnnotationKind::Path)
        } else if self.comments.get(id).is_some() {
            Some(AnnotationKind::Comment)
        } else {
            None
        }
    }

    /// Removes `id` from whichever store holds it.
    pub fn remove(&mut self, id: AnnotationId) -> Option<AnnotationKind> {
        let kind = self.kind_of(id)?;
        match kind {
            AnnotationKind::Highlight => self.highlights.remove(id).map(|_| kind),
            AnnotationKind::Shape => self.shapes.remove(id).map(|_| kind),
            AnnotationKind::Path => self.paths.remove(id).map(|_| kind),
            AnnotationKind::Comment => self.comments.remove(id).map(|_| kind),
        }
    }

    /// Topmost annotation of the given kind under `point`.
    pub fn hit(
        &self,
        kind: AnnotationKind,
        page: PageNumber,
        point: &DocPoint,
        tolerance: f32,
    ) -> Option<AnnotationId> {
        match kind {
            AnnotationKind::Highlight => self.highlights.hit(page, point, tolerance).map(|h| h.id),
            AnnotationKind::Shape => self.shapes.hit(page, point, tolerance).map(|s| s.id),
            AnnotationKind::Path => self.paths.hit(page, point, tolerance).map(|p| p.id),
            AnnotationKind::Comment => self.comments.hit(page, point, tolerance).map(|c| c.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::{DocRect, Rgba, ShapeKind};

    fn highlight(x: f32, page: u32) -> Highlight {
        Highlight {
            id: AnnotationId::new(),
            bounds: DocRect::new(x, 0.0, 20.0, 20.0),
            color: Rgba::HIGHLIGHT_YELLOW,
            page_number: PageNumber::new(page).expect("page >= 1"),
        }
    }

    fn comment(x: f32, y: f32) -> Comment {
        Comment {
            id: AnnotationId::new(),
            position: DocPoint::new(x, y),
            text: "note".to_owned(),
            color: Rgba::HIGHLIGHT_YELLOW,
            page_number: PageNumber::FIRST,
            timestamp: 0,
        }
    }

    #[test]
    fn page_filter_requires_exact_match() {
        let mut store = AnnotationStore::new();
        store.insert(highlight(0.0, 1));
        store.insert(highlight(30.0, 2));
        store.insert(highlight(60.0, 1));

        let first: Vec<_> = store.on_page(PageNumber::FIRST).collect();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].bounds.x, 0.0);
        assert_eq!(first[1].bounds.x, 60.0);
        assert_eq!(store.on_page(PageNumber::new(3).expect("page")).count(), 0);
    }

    #[test]
    fn remove_only_touches_matching_id() {
        let mut store = AnnotationStore::new();
        let keep = store.insert(highlight(0.0, 1));
        let drop = store.insert(highlight(30.0, 1));

        assert!(store.remove(drop).is_some());
        assert!(store.remove(drop).is_none());
        assert_eq!(store.len(), 1);
        assert!(store.get(keep).is_some());
    }

    #[test]
    fn hit_returns_topmost() {
        let mut store = AnnotationStore::new();
        let below = store.insert(highlight(0.0, 1));
        let above = store.insert(highlight(10.0, 1));

        let point = DocPoint::new(15.0, 5.0);
        assert_eq!(store.hit(PageNumber::FIRST, &point, 0.0).map(|h| h.id), Some(above));
        let corner = DocPoint::new(2.0, 2.0);
        assert_eq!(store.hit(PageNumber::FIRST, &corner, 0.0).map(|h| h.id), Some(below));
        assert!(store.hit(PageNumber::new(2).expect("page"), &point, 0.0).is_none());
    }

    #[test]
    fn clear_all_is_idempotent() {
        let mut annotations = Annotations::new();
        annotations.highlights.insert(highlight(0.0, 1));
        annotations.comments.insert(comment(5.0, 5.0));
        annotations.shapes.insert(Shape {
            id: AnnotationId::new(),
            kind: ShapeKind::Rectangle,
            bounds: DocRect::new(0.0, 0.0, 20.0, 20.0),
            color: Rgba::INK_BLUE,
            stroke_color: Rgba::INK_BLUE,
            stroke_width: 2.0,
            page_number: PageNumber::FIRST,
        });

        annotations.clear_all();
        assert!(annotations.is_empty());
        annotations.clear_all();
        assert!(annotations.is_empty());
        assert_eq!(annotations.highlights.len(), 0);
        assert_eq!(annotations.shapes.len(), 0);
        assert_eq!(annotations.paths.len(), 0);
        assert_eq!(annotations.comments.len(), 0);
    }

    #[test]
    fn comment_marker_hit_and_remove() {
        let mut annotations = Annotations::new();
        annotations.highlights.insert(highlight(0.0, 1));
        let marker = annotations.comments.insert(comment(10.0, 10.0));

        let point = DocPoint::new(11.0, 10.0);
        let hit = annotations.hit(AnnotationKind::Comment, PageNumber::FIRST, &point, 8.0);
        assert_eq!(hit, Some(marker));
        assert_eq!(annotations.remove(marker), Some(AnnotationKind::Comment));
        assert_eq!(annotations.kind_of(marker), None);
    }
}
