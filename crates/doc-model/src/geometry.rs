//! Document-space geometry and the pointer <-> document mapping.
//!
//! Pointer events arrive in client coordinates. Everything that is stored is
//! in document units, which are independent of the current zoom. The mapping
//! is `doc = (client - surface.origin) / scale` and `screen = doc * scale`;
//! capture and render both go through this module so the two never drift.

use serde::{Deserialize, Serialize};

/// Point in document space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DocPoint {
    pub x: f32,
    pub y: f32,
}

impl DocPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &DocPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Position relative to the top-left of the rendered page.
    pub fn to_screen(self, scale: Scale) -> ScreenPoint {
        ScreenPoint { x: self.x * scale.get(), y: self.y * scale.get() }
    }
}

/// Pointer position as reported by the platform (viewport coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientPoint {
    pub x: f32,
    pub y: f32,
}

impl ClientPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Position on the rendered page, in pixels from its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

impl ScreenPoint {
    pub fn to_document(self, scale: Scale) -> DocPoint {
        DocPoint { x: self.x / scale.get(), y: self.y / scale.get() }
    }
}

/// Bounding rectangle of the interactive overlay, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl SurfaceRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self { left, top, width, height }
    }
}

/// Zoom factor between document units and screen pixels.
///
/// Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f32", into = "f32")]
pub struct Scale(f32);

impl Scale {
    pub const IDENTITY: Scale = Scale(1.0);

    /// Non-finite or non-positive factors fall back to 1.0.
    pub fn new(value: f32) -> Self {
        if value.is_finite() && value > 0.0 {
            Self(value)
        } else {
            Self::IDENTITY
        }
    }

    pub fn get(self) -> f32 {
        self.0
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<f32> for Scale {
    fn from(value: f32) -> Self {
        Self::new(value)
    }
}

impl From<Scale> for f32 {
    fn from(value: Scale) -> Self {
        value.0
    }
}

/// Map a pointer position onto the document.
pub fn client_to_document(client: ClientPoint, surface: SurfaceRect, scale: Scale) -> DocPoint {
    DocPoint {
        x: (client.x - surface.left) / scale.get(),
        y: (client.y - surface.top) / scale.get(),
    }
}

/// Inverse of [`client_to_document`].
pub fn document_to_client(point: DocPoint, surface: SurfaceRect, scale: Scale) -> ClientPoint {
    let screen = point.to_screen(scale);
    ClientPoint { x: screen.x + surface.left, y: screen.y + surface.top }
}

/// Axis-aligned rectangle in document space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DocRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl DocRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle spanned by a drag from `anchor` to `current` in any direction.
    pub fn from_corners(anchor: DocPoint, current: DocPoint) -> Self {
        Self {
            x: anchor.x.min(current.x),
            y: anchor.y.min(current.y),
            width: (current.x - anchor.x).abs(),
            height: (current.y - anchor.y).abs(),
        }
    }

    /// Both sides strictly larger than `min`.
    pub fn exceeds(&self, min: f32) -> bool {
        self.width > min && self.height > min
    }

    pub fn contains(&self, point: &DocPoint) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    /// Whether `point` lies inside the ellipse inscribed in this rectangle.
    pub fn ellipse_contains(&self, point: &DocPoint) -> bool {
        let rx = self.width / 2.0;
        let ry = self.height / 2.0;
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        let dx = (point.x - (self.x + rx)) / rx;
        let dy = (point.y - (self.y + ry)) / ry;
        dx * dx + dy * dy <= 1.0
    }

    pub fn center(&self) -> DocPoint {
        DocPoint::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn to_screen(self, scale: Scale) -> ScreenRect {
        let s = scale.get();
        ScreenRect { x: self.x * s, y: self.y * s, width: self.width * s, height: self.height * s }
    }
}

/// Rectangle on the rendered page, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn to_document(self, scale: Scale) -> DocRect {
        let s = scale.get();
        DocRect { x: self.x / s, y: self.y / s, width: self.width / s, height: self.height / s }
    }
}

/// Distance check between a point and a line segment, used for path hit tests.
pub fn point_near_segment(
    point: &DocPoint,
    start: &DocPoint,
    end: &DocPoint,
    tolerance: f32,
) -> bool {
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    let length_sq = dx * dx + dy * dy;

    if length_sq < 1e-6 {
        return point.distance_to(start) <= tolerance;
    }

    let t = (((point.x - start.x) * dx + (point.y - start.y) * dy) / length_sq).clamp(0.0, 1.0);
    let closest = DocPoint::new(start.x + t * dx, start.y + t * dy);
    point.distance_to(&closest) <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn client_point_maps_through_surface_origin_and_scale() {
        let surface = SurfaceRect::new(100.0, 50.0, 800.0, 600.0);
        let doc = client_to_document(ClientPoint::new(300.0, 250.0), surface, Scale::new(2.0));

        assert_eq!(doc, DocPoint::new(100.0, 100.0));
    }

    #[test]
    fn capture_and_render_mapping_round_trip() {
        let surface = SurfaceRect::new(17.5, 42.25, 640.0, 480.0);
        for scale in [0.25_f32, 0.5, 1.0, 1.5, 3.0] {
            let scale = Scale::new(scale);
            for (x, y) in [(0.0, 0.0), (33.3, 12.7), (512.0, 401.9)] {
                let client = ClientPoint::new(x, y);
                let doc = client_to_document(client, surface, scale);
                let back = document_to_client(doc, surface, scale);
                assert!(
                    approx(back.x, client.x) && approx(back.y, client.y),
                    "{scale:?} {client:?}"
                );
            }
        }
    }

    #[test]
    fn invalid_scale_falls_back_to_identity() {
        assert_eq!(Scale::new(0.0), Scale::IDENTITY);
        assert_eq!(Scale::new(-2.0), Scale::IDENTITY);
        assert_eq!(Scale::new(f32::NAN), Scale::IDENTITY);
        assert_eq!(Scale::new(1.25).get(), 1.25);
    }

    #[test]
    fn rect_from_corners_supports_every_drag_direction() {
        let expected = DocRect::new(10.0, 10.0, 100.0, 50.0);
        let corners = [
            (DocPoint::new(10.0, 10.0), DocPoint::new(110.0, 60.0)),
            (DocPoint::new(110.0, 60.0), DocPoint::new(10.0, 10.0)),
            (DocPoint::new(110.0, 10.0), DocPoint::new(10.0, 60.0)),
            (DocPoint::new(10.0, 60.0), DocPoint::new(110.0, 10.0)),
        ];
        for (anchor, current) in corners {
            assert_eq!(DocRect::from_corners(anchor, current), expected);
        }
    }

    #[test]
    fn exceeds_is_strict() {
        assert!(!DocRect::new(0.0, 0.0, 10.0, 50.0).exceeds(10.0));
        assert!(!DocRect::new(0.0, 0.0, 50.0, 10.0).exceeds(10.0));
        assert!(DocRect::new(0.0, 0.0, 10.5, 10.5).exceeds(10.0));
    }

    #[test]
    fn screen_rect_round_trips_to_document() {
        let rect = DocRect::new(12.5, 7.25, 99.0, 33.0);
        let scale = Scale::new(1.75);
        let back = rect.to_screen(scale).to_document(scale);
        assert!(approx(back.x, rect.x));
        assert!(approx(back.y, rect.y));
        assert!(approx(back.width, rect.width));
        assert!(approx(back.height, rect.height));
    }

    #[test]
    fn ellipse_hit_excludes_rect_corners() {
        let rect = DocRect::new(0.0, 0.0, 100.0, 50.0);
        assert!(rect.ellipse_contains(&DocPoint::new(50.0, 25.0)));
        assert!(!rect.ellipse_contains(&DocPoint::new(2.0, 2.0)));
        assert!(rect.contains(&DocPoint::new(2.0, 2.0)));
    }

    #[test]
    fn segment_distance_check() {
        let start = DocPoint::new(0.0, 0.0);
        let end = DocPoint::new(100.0, 0.0);
        assert!(point_near_segment(&DocPoint::new(50.0, 3.0), &start, &end, 4.0));
        assert!(!point_near_segment(&DocPoint::new(50.0, 5.0), &start, &end, 4.0));
        assert!(!point_near_segment(&DocPoint::new(110.0, 0.0), &start, &end, 4.0));
    }
}
