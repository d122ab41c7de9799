//! Offline QR rendering command.
//!
//! Produces the same image the create page shows, for re-printing a tag
//! without going through the web UI.

use std::path::PathBuf;

use lost_found_core::UniqueCode;
use lost_found_server::config::{parse_base_url, scan_url};
use lost_found_server::qr::{self, QrColor, QrError, QrOptions};

/// Errors that can occur while rendering.
#[derive(Debug, thiserror::Error)]
pub enum QrCommandError {
    #[error("Invalid code: {0}")]
    InvalidCode(#[from] lost_found_core::UniqueCodeError),

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("QR error: {0}")]
    Qr(#[from] QrError),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Parameters of one rendering.
#[derive(Debug, Clone)]
pub struct QrRequest {
    pub code: String,
    pub base_url: String,
    pub out: Option<PathBuf>,
    pub width: u32,
    pub margin: u32,
    pub dark: String,
    pub light: String,
}

/// Render the scan URL of `request.code` and write it as a PNG.
///
/// Returns the path written.
///
/// # Errors
///
/// Returns `QrCommandError` for invalid input or if the file cannot be
/// written.
pub fn render(request: &QrRequest) -> Result<PathBuf, QrCommandError> {
    let code = UniqueCode::parse(&request.code)?;
    let base_url = parse_base_url(&request.base_url).map_err(QrCommandError::InvalidBaseUrl)?;
    let options = QrOptions {
        width: request.width,
        margin: request.margin,
        dark: QrColor::parse(&request.dark)?,
        light: QrColor::parse(&request.light)?,
    };

    let url = scan_url(&base_url, code.as_str());
    tracing::debug!(%url, "Encoding scan URL");
    let image = qr::encode(url.as_str(), &options)?;

    let path = request
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("qr-code-{code}.png")));
    std::fs::write(&path, &image.png).map_err(|source| QrCommandError::Write {
        path: path.clone(),
        source,
    })?;

    Ok(path)
}
