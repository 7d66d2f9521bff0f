//! Live preview that re-renders only when its inputs change.

use tracing::{debug, warn};

use crate::{QrEngine, QrEngineError, QrOptions, QrcodeEngine, RenderedQr};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PreviewState {
    /// No content entered yet.
    #[default]
    Empty,
    Ready(RenderedQr),
    /// Rendering failed; the message is shown in place of the code.
    Failed(String),
}

#[derive(Debug)]
pub struct QrPreview<E: QrEngine = QrcodeEngine> {
    engine: E,
    inputs: Option<(String, QrOptions)>,
    state: PreviewState,
    renders: usize,
}

impl Default for QrPreview<QrcodeEngine> {
    fn default() -> Self {
        Self::new(QrcodeEngine::new())
    }
}

impl<E: QrEngine> QrPreview<E> {
    pub fn new(engine: E) -> Self {
        Self { engine, inputs: None, state: PreviewState::Empty, renders: 0 }
    }

    /// Feeds the current content and style. Returns whether a new render ran.
    pub fn update(&mut self, content: &str, options: &QrOptions) -> bool {
        if let Some((last_content, last_options)) = &self.inputs {
            if last_content == content && last_options == options {
                return false;
            }
        }
        self.inputs = Some((content.to_owned(), *options));

        if content.trim().is_empty() {
            self.state = PreviewState::Empty;
            return false;
        }

        self.renders += 1;
        self.state = match self.engine.render(content, options) {
            Ok(rendered) => {
                debug!(size = options.size, modules = rendered.modules, "qr preview rendered");
                PreviewState::Ready(rendered)
            }
            Err(error @ (QrEngineError::Encode(_) | QrEngineError::InvalidOptions(_))) => {
                warn!(%error, "qr preview failed");
                PreviewState::Failed(error.to_string())
            }
            Err(error) => {
                warn!(%error, "qr preview failed");
                PreviewState::Failed(format!("could not generate QR code: {error}"))
            }
        };
        true
    }

    pub fn state(&self) -> &PreviewState {
        &self.state
    }

    pub fn rendered(&self) -> Option<&RenderedQr> {
        match &self.state {
            PreviewState::Ready(rendered) => Some(rendered),
            PreviewState::Empty | PreviewState::Failed(_) => None,
        }
    }

    /// Number of renders performed so far.
    pub fn render_count(&self) -> usize {
        self.renders
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorCorrection;

    #[test]
    fn unchanged_inputs_do_not_rerender() {
        let mut preview = QrPreview::default();
        let options = QrOptions::default();

        assert!(preview.update("https://qrdeck.example", &options));
        assert!(!preview.update("https://qrdeck.example", &options));
        assert_eq!(preview.render_count(), 1);

        assert!(preview.update("https://qrdeck.example", &options.with_border(2)));
        assert!(preview.update("https://qrdeck.example/b", &options.with_border(2)));
        assert_eq!(preview.render_count(), 3);
        assert!(preview.rendered().is_some());
    }

    #[test]
    fn failure_is_visible_and_recoverable() {
        let mut preview = QrPreview::default();
        let options = QrOptions::default().with_error_correction(ErrorCorrection::H);

        preview.update(&"x".repeat(3000), &options);
        assert!(matches!(preview.state(), PreviewState::Failed(message) if !message.is_empty()));
        assert!(preview.rendered().is_none());

        preview.update("short", &options);
        assert!(matches!(preview.state(), PreviewState::Ready(_)));
    }

    #[test]
    fn blank_content_clears_preview() {
        let mut preview = QrPreview::default();
        preview.update("hello", &QrOptions::default());
        preview.update("  ", &QrOptions::default());
        assert_eq!(preview.state(), &PreviewState::Empty);
    }
}
