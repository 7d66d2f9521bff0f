use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use doc_model::Rgba;
use image::{ImageBuffer, ImageFormat};
use qrcode::{Color, EcLevel, QrCode};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

pub mod export;
pub mod preview;

pub use export::{
    copy_to_clipboard, download, notice_for, share, ClipboardSink, ExportAction, ExportError,
    Notice, NoticeKind, SharePayload, ShareTarget,
};
pub use preview::{PreviewState, QrPreview};

#[cfg(feature = "clipboard")]
pub use export::SystemClipboard;

pub type RgbaImage = ImageBuffer<image::Rgba<u8>, Vec<u8>>;

/// Largest accepted output edge, in pixels.
pub const MAX_SIZE: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

impl ErrorCorrection {
    fn level(self) -> EcLevel {
        match self {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

impl fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCorrection::L => "L",
            ErrorCorrection::M => "M",
            ErrorCorrection::Q => "Q",
            ErrorCorrection::H => "H",
        };
        f.write_str(name)
    }
}

impl FromStr for ErrorCorrection {
    type Err = QrEngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "L" => Ok(ErrorCorrection::L),
            "M" => Ok(ErrorCorrection::M),
            "Q" => Ok(ErrorCorrection::Q),
            "H" => Ok(ErrorCorrection::H),
            _ => Err(QrEngineError::InvalidOptions(format!(
                "unknown error correction level {value:?}"
            ))),
        }
    }
}

/// Visual style of a rendered code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QrOptions {
    /// Output edge length in pixels.
    pub size: u32,
    /// Quiet zone in modules.
    pub border: u32,
    pub foreground: Rgba,
    pub background: Rgba,
    pub error_correction: ErrorCorrection,
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            size: 256,
            border: 4,
            foreground: Rgba::BLACK,
            background: Rgba::WHITE,
            error_correction: ErrorCorrection::M,
        }
    }
}

impl QrOptions {
    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn with_border(mut self, border: u32) -> Self {
        self.border = border;
        self
    }

    pub fn with_colors(mut self, foreground: Rgba, background: Rgba) -> Self {
        self.foreground = foreground;
        self.background = background;
        self
    }

    pub fn with_error_correction(mut self, level: ErrorCorrection) -> Self {
        self.error_correction = level;
        self
    }

    fn validate(&self) -> Result<(), QrEngineError> {
        if self.size == 0 || self.size > MAX_SIZE {
            return Err(QrEngineError::InvalidOptions(format!(
                "size must be between 1 and {MAX_SIZE}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QrEngineError {
    #[error("nothing to encode")]
    EmptyContent,
    #[error("cannot encode content: {0}")]
    Encode(String),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),
}

/// A rendered code: the bitmap plus its PNG encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQr {
    pub image: RgbaImage,
    pub png: Vec<u8>,
    /// Symbol width in modules, excluding the border.
    pub modules: u32,
}

impl RenderedQr {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// `data:image/png;base64,...` form of the PNG.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.png))
    }
}

pub trait QrEngine {
    fn render(&self, content: &str, options: &QrOptions) -> Result<RenderedQr, QrEngineError>;
}

/// Encodes with the `qrcode` crate and rasterizes by nearest-module sampling.
#[derive(Debug, Clone, Copy, Default)]
pub struct QrcodeEngine;

impl QrcodeEngine {
    pub fn new() -> Self {
        Self
    }

    fn rasterize(code: &QrCode, options: &QrOptions) -> RgbaImage {
        let modules = code.width() as u64;
        let colors = code.to_colors();
        let border = u64::from(options.border);
        let total = modules + 2 * border;
        let size = u64::from(options.size);

        let foreground = image::Rgba(options.foreground.to_array());
        let background = image::Rgba(options.background.to_array());

        RgbaImage::from_fn(options.size, options.size, |px, py| {
            let mx = u64::from(px) * total / size;
            let my = u64::from(py) * total / size;
            let grid = border..border + modules;
            let inside = grid.contains(&mx) && grid.contains(&my);
            if !inside {
                return background;
            }
            let index = ((my - border) * modules + (mx - border)) as usize;
            match colors.get(index) {
                Some(Color::Dark) => foreground,
                _ => background,
            }
        })
    }
}

impl QrEngine for QrcodeEngine {
    fn render(&self, content: &str, options: &QrOptions) -> Result<RenderedQr, QrEngineError> {
        if content.is_empty() {
            return Err(QrEngineError::EmptyContent);
        }
        options.validate()?;

        let level = options.error_correction.level();
        let code = QrCode::with_error_correction_level(content.as_bytes(), level)
            .map_err(|err| QrEngineError::Encode(err.to_string()))?;
        let image = Self::rasterize(&code, options);

        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        Ok(RenderedQr { image, png, modules: code.width() as u32 })
    }
}

pub fn default_engine() -> QrcodeEngine {
    QrcodeEngine::new()
}
