//! Annotation entities placed over a rendered template page.
//!
//! All coordinates are document units (see [`crate::geometry`]). Geometry is
//! immutable once committed: moving or resizing is delete + recreate. Only
//! comment text and document text runs are edited in place.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::color::{Rgba, SHAPE_FILL_ALPHA};
use crate::geometry::{point_near_segment, DocPoint, DocRect};

/// Identifier of a committed annotation.
///
/// UUID v7: a millisecond timestamp followed by random bits. Collisions are
/// not checked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnnotationId(Uuid);

impl AnnotationId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AnnotationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 1-based page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct PageNumber(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("page numbers start at 1")]
pub struct InvalidPageNumber;

impl PageNumber {
    pub const FIRST: PageNumber = PageNumber(1);

    /// Returns `None` for 0.
    pub fn new(number: u32) -> Option<Self> {
        (number >= 1).then_some(Self(number))
    }

    /// Page shown at a 0-based display index.
    pub fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX - 1) + 1)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

impl TryFrom<u32> for PageNumber {
    type Error = InvalidPageNumber;

    fn try_from(number: u32) -> Result<Self, Self::Error> {
        Self::new(number).ok_or(InvalidPageNumber)
    }
}

impl From<PageNumber> for u32 {
    fn from(page: PageNumber) -> Self {
        page.0
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Current wall-clock time in unix milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or_default()
}

/// Behaviour shared by every annotation kind held in a store.
pub trait PageAnnotation {
    fn id(&self) -> AnnotationId;

    fn page_number(&self) -> PageNumber;

    /// Whether a click at `point` lands on the rendered annotation.
    fn hit_test(&self, point: &DocPoint, tolerance: f32) -> bool;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: AnnotationId,
    #[serde(flatten)]
    pub bounds: DocRect,
    pub color: Rgba,
    pub page_number: PageNumber,
}

impl PageAnnotation for Highlight {
    fn id(&self) -> AnnotationId {
        self.id
    }

    fn page_number(&self) -> PageNumber {
        self.page_number
    }

    fn hit_test(&self, point: &DocPoint, _tolerance: f32) -> bool {
        self.bounds.contains(point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rectangle,
    Circle,
}

impl ShapeKind {
    /// Corner radius as a fraction of the smaller side; circles are fully rounded.
    pub fn corner_radius_ratio(self) -> f32 {
        match self {
            ShapeKind::Rectangle => 0.0,
            ShapeKind::Circle => 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shape {
    pub id: AnnotationId,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    #[serde(flatten)]
    pub bounds: DocRect,
    pub color: Rgba,
    pub stroke_color: Rgba,
    pub stroke_width: f32,
    pub page_number: PageNumber,
}

impl Shape {
    /// Fill paint: the base color with a fixed translucency.
    pub fn fill(&self) -> Rgba {
        self.color.with_alpha(SHAPE_FILL_ALPHA)
    }
}

impl PageAnnotation for Shape {
    fn id(&self) -> AnnotationId {
        self.id
    }

    fn page_number(&self) -> PageNumber {
        self.page_number
    }

    fn hit_test(&self, point: &DocPoint, _tolerance: f32) -> bool {
        match self.kind {
            ShapeKind::Rectangle => self.bounds.contains(point),
            ShapeKind::Circle => self.bounds.ellipse_contains(point),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingPath {
    pub id: AnnotationId,
    pub points: Vec<DocPoint>,
    pub color: Rgba,
    pub stroke_width: f32,
    pub page_number: PageNumber,
}

impl PageAnnotation for DrawingPath {
    fn id(&self) -> AnnotationId {
        self.id
    }

    fn page_number(&self) -> PageNumber {
        self.page_number
    }

    fn hit_test(&self, point: &DocPoint, tolerance: f32) -> bool {
        let reach = tolerance + self.stroke_width / 2.0;
        self.points
            .windows(2)
            .any(|segment| point_near_segment(point, &segment[0], &segment[1], reach))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: AnnotationId,
    #[serde(flatten)]
    pub position: DocPoint,
    pub text: String,
    pub color: Rgba,
    pub page_number: PageNumber,
    /// Unix milliseconds at save time.
    pub timestamp: i64,
}

impl PageAnnotation for Comment {
    fn id(&self) -> AnnotationId {
        self.id
    }

    fn page_number(&self) -> PageNumber {
        self.page_number
    }

    /// The marker is a small disc centred on the anchor.
    fn hit_test(&self, point: &DocPoint, tolerance: f32) -> bool {
        self.position.distance_to(point) <= tolerance
    }
}

/// A run of document text that can be overwritten in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditableText {
    pub id: AnnotationId,
    pub text: String,
    pub original_text: String,
    #[serde(flatten)]
    pub bounds: DocRect,
    pub font_size: f32,
    pub page_number: PageNumber,
    pub is_edited: bool,
}

impl EditableText {
    pub fn new(
        text: impl Into<String>,
        bounds: DocRect,
        font_size: f32,
        page_number: PageNumber,
    ) -> Self {
        let text = text.into();
        Self {
            id: AnnotationId::new(),
            original_text: text.clone(),
            text,
            bounds,
            font_size,
            page_number,
            is_edited: false,
        }
    }
}

impl PageAnnotation for EditableText {
    fn id(&self) -> AnnotationId {
        self.id
    }

    fn page_number(&self) -> PageNumber {
        self.page_number
    }

    fn hit_test(&self, point: &DocPoint, _tolerance: f32) -> bool {
        self.bounds.contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_maps_display_index() {
        assert_eq!(PageNumber::from_index(0), PageNumber::FIRST);
        assert_eq!(PageNumber::from_index(4).get(), 5);
        assert_eq!(PageNumber::from_index(4).index(), 4);
        assert_eq!(PageNumber::new(0), None);
    }

    #[test]
    fn page_zero_is_rejected_when_deserializing() {
        let page: PageNumber = serde_json::from_str("3").expect("valid page");
        assert_eq!(page.index(), 2);
        assert_eq!(serde_json::to_string(&page).expect("serialize"), "3");

        let err = serde_json::from_str::<PageNumber>("0").expect_err("page 0 rejected");
        assert!(err.to_string().contains("page numbers start at 1"), "{err}");
    }

    #[test]
    fn ids_are_distinct() {
        let ids: std::collections::HashSet<_> = (0..256).map(|_| AnnotationId::new()).collect();
        assert_eq!(ids.len(), 256);
    }

    #[test]
    fn shape_serializes_with_flat_bounds_and_type_tag() {
        let shape = Shape {
            id: AnnotationId::new(),
            kind: ShapeKind::Circle,
            bounds: DocRect::new(1.0, 2.0, 30.0, 40.0),
            color: Rgba::INK_BLUE,
            stroke_color: Rgba::BLACK,
            stroke_width: 2.0,
            page_number: PageNumber::FIRST,
        };

        let value = serde_json::to_value(&shape).expect("serialize");
        assert_eq!(value["type"], "circle");
        assert_eq!(value["x"], 1.0);
        assert_eq!(value["height"], 40.0);
        assert_eq!(value["strokeColor"], "#000000");
        assert_eq!(value["pageNumber"], 1);
    }

    #[test]
    fn path_hit_test_follows_segments() {
        let path = DrawingPath {
            id: AnnotationId::new(),
            points: vec![
                DocPoint::new(0.0, 0.0),
                DocPoint::new(50.0, 0.0),
                DocPoint::new(50.0, 50.0),
            ],
            color: Rgba::BLACK,
            stroke_width: 2.0,
            page_number: PageNumber::FIRST,
        };

        assert!(path.hit_test(&DocPoint::new(25.0, 2.0), 2.0));
        assert!(path.hit_test(&DocPoint::new(52.0, 25.0), 2.0));
        assert!(!path.hit_test(&DocPoint::new(20.0, 30.0), 2.0));
    }

    #[test]
    fn editable_text_starts_unedited() {
        let bounds = DocRect::new(0.0, 0.0, 40.0, 12.0);
        let text = EditableText::new("Hello", bounds, 12.0, PageNumber::FIRST);
        assert_eq!(text.text, text.original_text);
        assert!(!text.is_edited);
    }
}
