use doc_model::{AnnotationId, DocPoint, DrawingPath};
use tracing::debug;

use super::ToolContext;
use crate::annotation::AnnotationStore;

/// Freehand pen: `Idle -> Drawing -> Idle`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FreehandTool {
    #[default]
    Idle,
    Drawing { points: Vec<DocPoint> },
}

impl FreehandTool {
    pub fn pointer_down(&mut self, point: DocPoint) {
        *self = FreehandTool::Drawing { points: vec![point] };
    }

    /// Appends a sample while drawing.
    ///
    /// Samples whose on-screen distance to the last kept point is below
    /// `min_point_distance` pixels are dropped, and a path stops growing at
    /// `max_points_per_path`.
    pub fn pointer_move(&mut self, point: DocPoint, ctx: ToolContext<'_>) {
        let FreehandTool::Drawing { points } = self else {
            return;
        };
        let config = ctx.config;
        if !point.is_finite() || points.len() >= config.max_points_per_path {
            return;
        }
        if let Some(last) = points.last() {
            let on_screen = last.distance_to(&point) * ctx.scale.get();
            if config.min_point_distance > 0.0 && on_screen < config.min_point_distance {
                return;
            }
        }
        points.push(point);
    }

    /// Commits the path if at least two points were captured.
    pub fn pointer_up(
        &mut self,
        ctx: ToolContext<'_>,
        store: &mut AnnotationStore<DrawingPath>,
    ) -> Option<AnnotationId> {
        let FreehandTool::Drawing { points } = std::mem::take(self) else {
            return None;
        };
        if points.len() < 2 {
            debug!(points = points.len(), "freehand gesture too short");
            return None;
        }
        Some(store.insert(DrawingPath {
            id: AnnotationId::new(),
            points,
            color: ctx.config.pen_color,
            stroke_width: ctx.config.pen_width,
            page_number: ctx.page,
        }))
    }

    pub fn preview(&self) -> &[DocPoint] {
        match self {
            FreehandTool::Idle => &[],
            FreehandTool::Drawing { points } => points,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, FreehandTool::Drawing { .. })
    }

    pub fn cancel(&mut self) {
        *self = FreehandTool::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use doc_model::{PageNumber, Scale};

    fn ctx(config: &EditorConfig) -> ToolContext<'_> {
        ToolContext::new(PageNumber::FIRST, Scale::IDENTITY, config)
    }

    fn draw(tool: &mut FreehandTool, ctx: ToolContext<'_>, samples: &[(f32, f32)]) {
        tool.pointer_down(DocPoint::new(0.0, 0.0));
        for &(x, y) in samples {
            tool.pointer_move(DocPoint::new(x, y), ctx);
        }
    }

    #[test]
    fn single_point_gesture_is_discarded() {
        let config = EditorConfig::default();
        let mut store = AnnotationStore::new();
        let mut tool = FreehandTool::Idle;

        draw(&mut tool, ctx(&config), &[]);
        assert_eq!(tool.pointer_up(ctx(&config), &mut store), None);
        assert!(store.is_empty());
        assert!(!tool.is_active());
    }

    #[test]
    fn point_count_is_moves_plus_anchor() {
        let config = EditorConfig::default();
        let mut store = AnnotationStore::new();

        for moves in 1..6 {
            let mut tool = FreehandTool::Idle;
            let samples: Vec<(f32, f32)> =
                (1..=moves).map(|i| (i as f32 * 3.0, i as f32 * 2.0)).collect();
            draw(&mut tool, ctx(&config), &samples);
            let id = tool.pointer_up(ctx(&config), &mut store).expect("path committed");
            assert_eq!(store.get(id).expect("stored").points.len(), moves + 1);
        }
    }

    #[test]
    fn jitter_below_threshold_is_dropped() {
        let config = EditorConfig::default().with_min_point_distance(1.0);
        let mut tool = FreehandTool::Idle;

        let samples = [(0.2, 0.2), (0.4, 0.1), (5.0, 5.0), (5.3, 5.0), (9.0, 5.0)];
        draw(&mut tool, ctx(&config), &samples);
        assert_eq!(tool.preview().len(), 3);
    }

    #[test]
    fn one_pixel_stroke_commits_at_any_zoom() {
        let config = EditorConfig::default();
        for scale in [1.0, 4.0] {
            let ctx = ToolContext::new(PageNumber::FIRST, Scale::new(scale), &config);
            let mut store = AnnotationStore::new();
            let mut tool = FreehandTool::Idle;

            tool.pointer_down(DocPoint::new(100.0 / scale, 100.0 / scale));
            tool.pointer_move(DocPoint::new(101.0 / scale, 100.0 / scale), ctx);
            assert!(tool.pointer_up(ctx, &mut store).is_some(), "scale {scale}");
        }
    }

    #[test]
    fn path_growth_is_capped() {
        let config = EditorConfig::default().with_max_points_per_path(4);
        let mut tool = FreehandTool::Idle;

        let samples: Vec<(f32, f32)> = (1..20).map(|i| (i as f32 * 10.0, 0.0)).collect();
        draw(&mut tool, ctx(&config), &samples);
        assert_eq!(tool.preview().len(), 4);
    }

    #[test]
    fn moves_while_idle_are_ignored() {
        let config = EditorConfig::default();
        let mut tool = FreehandTool::Idle;
        tool.pointer_move(DocPoint::new(5.0, 5.0), ctx(&config));
        assert_eq!(tool, FreehandTool::Idle);
    }
}
