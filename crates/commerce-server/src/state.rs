use commerce_core::error::AppError;
use commerce_core::pipeline::read_source;
use commerce_core::{CommercePipeline, PipelineOptions, Rendered};
use commerce_parsers::CatalogParser;

use crate::config::ServerConfig;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub config: ServerConfig,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Regenerate the artifact from the configured source and overwrite it.
    pub fn regenerate(&self) -> Result<Rendered, AppError> {
        let config = &self.config;
        let source = read_source(&config.source)?;

        let pipeline = CommercePipeline::new(CatalogParser::for_kind(config.source_kind))
            .with_options(PipelineOptions {
                skip_policy: config.skip_policy,
                limit: None,
            });
        pipeline.write_markdown(&source, &config.output, Some(&config.title))
    }

    /// The current artifact text.
    ///
    /// Regenerates when the source exists. Without a source the previously
    /// written artifact is served as-is; with neither, `NotFound`.
    pub fn artifact(&self) -> Result<String, AppError> {
        match self.regenerate() {
            Ok(rendered) => Ok(rendered.markdown),
            Err(AppError::NotFound(missing)) => {
                tracing::warn!("Source {missing} missing, serving last written artifact");
                read_source(&self.config.output).map_err(|e| match e {
                    AppError::NotFound(_) => AppError::NotFound(format!(
                        "commerce.txt source {missing} and artifact {} are both missing",
                        self.config.output.display()
                    )),
                    other => other,
                })
            }
            Err(e) => Err(e),
        }
    }
}
