//! Shared helper functions for CLI commands.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::catalog::RepairCatalog;

/// Truncate a string to `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

/// Detect the MIME type of image content, falling back to the file extension.
pub fn detect_mime(content: &[u8], path: &Path) -> String {
    infer::get(content)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| mime_guess::from_path(path).first_or_octet_stream().to_string())
}

/// Encode raw image bytes as a data URL.
pub fn to_data_url(content: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(content))
}

/// Turn an `--image` argument into something the analyzer accepts.
///
/// Data URLs and http(s) URLs pass through; anything else is read as a
/// local file and encoded.
pub async fn resolve_image(arg: &str) -> anyhow::Result<String> {
    if arg.starts_with("data:") || arg.starts_with("http://") || arg.starts_with("https://") {
        return Ok(arg.to_string());
    }

    let expanded = shellexpand::tilde(arg);
    let path = Path::new(expanded.as_ref());
    let content = tokio::fs::read(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read image {}: {}", path.display(), e))?;

    let mime = detect_mime(&content, path);
    if !mime.starts_with("image/") {
        anyhow::bail!("{} is not an image ({})", path.display(), mime);
    }

    tracing::debug!("Encoded {} ({} bytes, {})", path.display(), content.len(), mime);
    Ok(to_data_url(&content, &mime))
}

/// Load the reference catalog, with a friendlier error.
pub async fn load_catalog(path: &Path) -> anyhow::Result<RepairCatalog> {
    RepairCatalog::load(path).await.map_err(|e| {
        anyhow::anyhow!(
            "{} (set FIXO_CATALOG_PATH or pass --catalog to point at repairs.json)",
            e
        )
    })
}
