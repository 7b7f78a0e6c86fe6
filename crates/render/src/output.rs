//! Render entry points: bytes in memory, a file on disk, or the bot-facing
//! `(identifier, session)` call that picks its own output path.

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Utc};
use cotiza_core::config::AppConfig;
use cotiza_core::dates::today_in;
use cotiza_core::naming::clean_name_part;
use cotiza_core::QuoteSession;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::assets::AssetSet;
use crate::error::RenderError;
use crate::input::RenderQuote;
use crate::job::RenderJob;
use crate::layout::layout_document;
use crate::pdf::write_pdf;

/// Lays out `quote` and returns the finished PDF bytes.
pub async fn render(quote: &RenderQuote, job: &RenderJob) -> Result<Vec<u8>, RenderError> {
    let assets = AssetSet::load(&job.assets).await;
    let document = layout_document(quote, job, &assets);
    let bytes = write_pdf(&document, &assets, &job.title)?;

    debug!(
        event_name = "render.document.encoded",
        brand = job.brand.tag(),
        pages = document.pages.len(),
        rows = document.rows.len(),
        bytes = bytes.len(),
        "document encoded"
    );
    Ok(bytes)
}

/// Renders into `path`. The document is written to a sibling temp file and
/// renamed into place once flushed, so `path` never holds a partial file.
pub async fn render_to_file(
    quote: &RenderQuote,
    job: &RenderJob,
    path: &Path,
) -> Result<(), RenderError> {
    let bytes = render(quote, job).await?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| RenderError::CreateDir { path: parent.to_path_buf(), source })?;
    }

    let temp_path = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4()));
    if let Err(source) = write_synced(&temp_path, &bytes).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(RenderError::Write { path: temp_path, source });
    }

    if let Err(source) = tokio::fs::rename(&temp_path, path).await {
        warn!(
            event_name = "render.document.rename_failed",
            path = %path.display(),
            error = %source,
            "failed to move rendered document into place"
        );
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(RenderError::Write { path: path.to_path_buf(), source });
    }

    info!(
        event_name = "render.document.written",
        brand = job.brand.tag(),
        path = %path.display(),
        bytes = bytes.len(),
        "quote document written"
    );
    Ok(())
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

/// Renders bot sessions into a fixed output directory.
#[derive(Clone, Debug)]
pub struct QuoteRenderer {
    output_dir: PathBuf,
    offset: FixedOffset,
}

impl QuoteRenderer {
    pub fn new(output_dir: impl Into<PathBuf>, offset: FixedOffset) -> Self {
        Self { output_dir: output_dir.into(), offset }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.render.output_dir.clone(), config.utc_offset())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// `<dir>/<brand>-quote-<identifier>-<millis>.pdf`. Callers must not run
    /// two renders for the same identifier within the same millisecond.
    pub fn output_path(&self, job: &RenderJob, identifier: &str) -> PathBuf {
        let identifier = clean_name_part(identifier).replace(' ', "_");
        let identifier = if identifier.is_empty() { "anon".to_string() } else { identifier };
        self.output_dir.join(format!(
            "{}-quote-{}-{}.pdf",
            job.brand.slug(),
            identifier,
            Utc::now().timestamp_millis()
        ))
    }

    pub async fn render_session(
        &self,
        identifier: &str,
        session: &QuoteSession,
        job: &RenderJob,
    ) -> Result<PathBuf, RenderError> {
        let quote = RenderQuote::from_session(session, today_in(self.offset));
        let path = self.output_path(job, identifier);
        render_to_file(&quote, job, &path).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use cotiza_core::dates::default_offset;

    use super::QuoteRenderer;
    use crate::job::{Brand, RenderJob};

    #[test]
    fn output_path_uses_the_brand_prefix_and_a_sanitized_identifier() {
        let renderer = QuoteRenderer::new("out", default_offset());
        let job = RenderJob::for_brand(Brand::EcoRural, Path::new("assets"));

        let path = renderer.output_path(&job, "chat 42/x");
        let name = path.file_name().and_then(|name| name.to_str()).expect("file name");

        assert!(path.starts_with("out"));
        assert!(name.starts_with("eco-quote-chat_42x-"), "{name}");
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn blank_identifier_falls_back_to_anon() {
        let renderer = QuoteRenderer::new("out", default_offset());
        let job = RenderJob::for_brand(Brand::Publicom, Path::new("assets"));

        let path = renderer.output_path(&job, "  ");
        let name = path.file_name().and_then(|name| name.to_str()).expect("file name");

        assert!(name.starts_with("publicom-quote-anon-"), "{name}");
    }
}
