//! Picks the durable URL a project template should be stored under.
//!
//! Candidates are checked in priority order: `pdf_url`, `file_url`,
//! `data_url`. The first http(s) URL wins. Failing that, the first inline
//! `data:` URL is decoded and uploaded. `blob:` URLs only live as long as
//! the page that made them and are skipped. Anything else is rejected.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, info};

use crate::object_store::{ObjectStore, UploadError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateCandidates<'a> {
    pub pdf_url: Option<&'a str>,
    pub file_url: Option<&'a str>,
    pub data_url: Option<&'a str>,
}

impl<'a> TemplateCandidates<'a> {
    fn ordered(&self) -> [(&'static str, Option<&'a str>); 3] {
        [("pdf_url", self.pdf_url), ("file_url", self.file_url), ("data_url", self.data_url)]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTemplate {
    /// An existing http(s) URL, used as is.
    Durable { field: &'static str, url: String },
    /// An inline payload that was uploaded.
    Uploaded { field: &'static str, url: String },
}

impl ResolvedTemplate {
    pub fn url(&self) -> &str {
        match self {
            ResolvedTemplate::Durable { url, .. } | ResolvedTemplate::Uploaded { url, .. } => url,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TemplateUrlError {
    #[error("{field} is not a usable template URL: {reason}")]
    InvalidShape { field: &'static str, reason: String },
    #[error("no durable template URL was provided")]
    NonDurable,
    #[error("template upload failed: {0}")]
    Upload(#[from] UploadError),
}

#[derive(Debug, PartialEq)]
enum Candidate<'a> {
    Http(&'a str),
    Data { content_type: String, payload: Vec<u8> },
    Blob,
}

fn invalid(field: &'static str, reason: impl Into<String>) -> TemplateUrlError {
    TemplateUrlError::InvalidShape { field, reason: reason.into() }
}

fn classify<'a>(field: &'static str, value: &'a str) -> Result<Candidate<'a>, TemplateUrlError> {
    let lower = value.to_ascii_lowercase();

    if let Some(rest) = lower.strip_prefix("https://").or_else(|| lower.strip_prefix("http://")) {
        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() {
            return Err(invalid(field, "URL has no host"));
        }
        if value.chars().any(char::is_whitespace) {
            return Err(invalid(field, "URL contains whitespace"));
        }
        return Ok(Candidate::Http(value));
    }
    if lower.starts_with("blob:") {
        return Ok(Candidate::Blob);
    }
    if lower.starts_with("data:") {
        return parse_data_url(field, &value["data:".len()..]);
    }

    let scheme = value.split_once(':').map(|(scheme, _)| scheme).unwrap_or("");
    if scheme.is_empty() {
        Err(invalid(field, "not an absolute URL"))
    } else {
        Err(invalid(field, format!("unsupported scheme {scheme:?}")))
    }
}

fn parse_data_url<'a>(field: &'static str, rest: &str) -> Result<Candidate<'a>, TemplateUrlError> {
    let (header, data) =
        rest.split_once(',').ok_or_else(|| invalid(field, "data URL has no payload"))?;
    let Some(media) = header.strip_suffix(";base64") else {
        return Err(invalid(field, "data URL must be base64-encoded"));
    };
    let content_type = if media.is_empty() { "application/octet-stream" } else { media };

    let payload = STANDARD
        .decode(data.trim())
        .map_err(|err| invalid(field, format!("bad base64 payload: {err}")))?;
    if payload.is_empty() {
        return Err(invalid(field, "data URL payload is empty"));
    }
    Ok(Candidate::Data { content_type: content_type.to_owned(), payload })
}

fn upload_name(content_type: &str) -> &'static str {
    match content_type {
        "application/pdf" => "template.pdf",
        "image/png" => "template.png",
        "image/jpeg" => "template.jpg",
        _ => "template.bin",
    }
}

/// Resolves the candidates to one durable URL, uploading an inline payload
/// through `store` when no http(s) URL is available.
pub fn resolve_template_url(
    candidates: TemplateCandidates<'_>,
    store: &dyn ObjectStore,
) -> Result<ResolvedTemplate, TemplateUrlError> {
    let mut classified = Vec::new();
    for (field, value) in candidates.ordered() {
        let Some(value) = value.map(str::trim).filter(|value| !value.is_empty()) else {
            continue;
        };
        classified.push((field, classify(field, value)?));
    }

    if let Some((field, url)) = classified.iter().find_map(|(field, candidate)| match candidate {
        Candidate::Http(url) => Some((*field, *url)),
        _ => None,
    }) {
        debug!(field, "using durable template URL");
        return Ok(ResolvedTemplate::Durable { field, url: url.to_owned() });
    }

    for (field, candidate) in &classified {
        let field = *field;
        if let Candidate::Data { content_type, payload } = candidate {
            let url = store.upload(payload, upload_name(content_type), content_type)?;
            info!(field, %url, "inline template uploaded");
            return Ok(ResolvedTemplate::Uploaded { field, url });
        }
    }

    if classified.iter().any(|(_, candidate)| *candidate == Candidate::Blob) {
        debug!("only blob URLs were provided");
    }
    Err(TemplateUrlError::NonDurable)
}
