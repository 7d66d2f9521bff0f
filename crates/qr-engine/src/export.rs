//! Download, clipboard and share actions for a rendered code.
//!
//! Each action checks for a render first and fails with
//! [`ExportError::NothingRendered`] otherwise. Outcomes become user-facing
//! [`Notice`]s through [`notice_for`].

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::RenderedQr;

pub const DEFAULT_FILE_STEM: &str = "qr-code";

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no QR code has been generated yet")]
    NothingRendered,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("sharing failed: {0}")]
    Share(String),
    #[error("sharing was cancelled")]
    Cancelled,
}

/// Receives an image copied to the clipboard.
pub trait ClipboardSink {
    fn copy_image(&mut self, rendered: &RenderedQr) -> Result<(), ExportError>;
}

/// What is handed to a native share sheet.
#[derive(Debug, Clone, Copy)]
pub struct SharePayload<'a> {
    pub title: &'a str,
    pub file_name: &'a str,
    pub mime_type: &'a str,
    pub bytes: &'a [u8],
}

pub trait ShareTarget {
    /// Returns [`ExportError::Cancelled`] when the user dismisses the sheet.
    fn share(&mut self, payload: SharePayload<'_>) -> Result<(), ExportError>;
}

fn require(rendered: Option<&RenderedQr>) -> Result<&RenderedQr, ExportError> {
    rendered.ok_or(ExportError::NothingRendered)
}

/// Keeps ASCII letters, digits, `-` and `_`; anything else becomes `-`.
fn file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    let stem = stem.trim_matches('-');
    if stem.is_empty() {
        DEFAULT_FILE_STEM.to_owned()
    } else {
        stem.to_owned()
    }
}

/// Writes `<name>.png` into `dir`.
pub fn download(
    rendered: Option<&RenderedQr>,
    dir: &Path,
    name: &str,
) -> Result<PathBuf, ExportError> {
    let rendered = require(rendered)?;
    let path = dir.join(format!("{}.png", file_stem(name)));
    fs::write(&path, &rendered.png).map_err(|error| {
        warn!(%error, path = %path.display(), "QR download failed");
        ExportError::Io(error)
    })?;
    info!(path = %path.display(), bytes = rendered.png.len(), "QR code saved");
    Ok(path)
}

pub fn copy_to_clipboard(
    rendered: Option<&RenderedQr>,
    sink: &mut dyn ClipboardSink,
) -> Result<(), ExportError> {
    let rendered = require(rendered)?;
    sink.copy_image(rendered)?;
    info!("QR code copied to clipboard");
    Ok(())
}

pub fn share(
    rendered: Option<&RenderedQr>,
    target: &mut dyn ShareTarget,
    title: &str,
) -> Result<(), ExportError> {
    let rendered = require(rendered)?;
    let file_name = format!("{}.png", file_stem(title));
    let payload =
        SharePayload { title, file_name: &file_name, mime_type: "image/png", bytes: &rendered.png };
    match target.share(payload) {
        Ok(()) => {
            info!("QR code shared");
            Ok(())
        }
        Err(ExportError::Cancelled) => Err(ExportError::Cancelled),
        Err(error) => {
            warn!(%error, "QR share failed");
            Err(error)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportAction {
    Download,
    Copy,
    Share,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Info,
    Failure,
}

/// Short message shown to the user after an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, message: message.into() }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Info, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Failure, message: message.into() }
    }
}

pub fn notice_for<T>(action: ExportAction, result: &Result<T, ExportError>) -> Notice {
    match (action, result) {
        (ExportAction::Download, Ok(_)) => Notice::success("QR code downloaded"),
        (ExportAction::Copy, Ok(_)) => Notice::success("QR code copied to clipboard"),
        (ExportAction::Share, Ok(_)) => Notice::success("QR code shared"),
        (_, Err(ExportError::NothingRendered)) => Notice::failure("Generate a QR code first"),
        (_, Err(ExportError::Cancelled)) => Notice::info("Sharing cancelled"),
        (ExportAction::Download, Err(error)) => {
            Notice::failure(format!("Download failed: {error}"))
        }
        (ExportAction::Copy, Err(error)) => Notice::failure(format!("Copy failed: {error}")),
        (ExportAction::Share, Err(error)) => Notice::failure(format!("Share failed: {error}")),
    }
}

#[cfg(feature = "clipboard")]
mod system {
    use super::{ClipboardSink, ExportError};
    use crate::RenderedQr;
    use std::borrow::Cow;

    /// The OS clipboard.
    pub struct SystemClipboard {
        inner: arboard::Clipboard,
    }

    impl SystemClipboard {
        pub fn new() -> Result<Self, ExportError> {
            let inner = arboard::Clipboard::new()
                .map_err(|err| ExportError::Clipboard(err.to_string()))?;
            Ok(Self { inner })
        }
    }

    impl ClipboardSink for SystemClipboard {
        fn copy_image(&mut self, rendered: &RenderedQr) -> Result<(), ExportError> {
            let image = arboard::ImageData {
                width: rendered.width() as usize,
                height: rendered.height() as usize,
                bytes: Cow::Borrowed(rendered.image.as_raw()),
            };
            self.inner.set_image(image).map_err(|err| ExportError::Clipboard(err.to_string()))
        }
    }
}

#[cfg(feature = "clipboard")]
pub use system::SystemClipboard;
