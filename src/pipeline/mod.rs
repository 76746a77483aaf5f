//! Per-URL extraction pipeline
//!
//! One call to [`Pipeline::run`] takes a URL through five ordered stages:
//! discover subpages, extract content, validate, transform (chunked for
//! long documents) and persist. Any stage may end the run early; none of
//! them can abort the surrounding batch. Every run yields exactly one
//! [`PipelineResult`] carrying one [`PipelineOutcome`].

pub mod chunker;
mod traits;
mod transform;
mod validate;

pub use chunker::{combine, split, ChunkSettings, ContentChunk};
pub use traits::{AdapterError, DocumentMetadata, Transformer, TransformedSection, Validator};
pub use transform::MarkdownTransformer;
pub use validate::KeywordValidator;

use crate::config::Config;
use crate::crawler::{FetchAdapter, HttpFetcher};
use crate::executor::{ProcessorFactory, UrlProcessor};
use crate::extract::{ContentExtractor, ExtractError, ExtractedContent, HttpContentExtractor};
use crate::storage::{KnowledgeItem, KnowledgeStore, SqliteKnowledgeStore, UpsertOutcome};
use crate::url::{normalize_url, LinkFilter, SkipWords};
use crate::{ConfigError, HarvestError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Failure classes a pipeline run can end in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Non-200 status, timeout or connection failure while extracting
    TransientFetch,

    /// The transformer produced no usable structure
    TransformFailure,

    /// The knowledge store rejected the write
    PersistFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TransientFetch => f.write_str("transient-fetch"),
            Self::TransformFailure => f.write_str("transform-failure"),
            Self::PersistFailure => f.write_str("persist-failure"),
        }
    }
}

/// How a pipeline run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Persisted; `items` is 0 when the team already had this URL
    Saved { items: usize },

    /// Content was extracted but failed validation
    Rejected,

    /// Content type not supported
    Skipped { reason: String },

    Failed { kind: ErrorKind, message: String },
}

/// Everything one pipeline run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub url: String,

    /// Same-domain links found on the page, filtered and deduplicated
    pub subpages: Vec<String>,

    pub content_extracted: bool,
    pub items_saved: usize,

    /// Number of chunks the document was split into; 0 when not split
    pub chunks: usize,

    pub outcome: PipelineOutcome,
}

impl PipelineResult {
    fn new(url: &str, subpages: Vec<String>) -> Self {
        Self {
            url: url.to_string(),
            subpages,
            content_extracted: false,
            items_saved: 0,
            chunks: 0,
            outcome: PipelineOutcome::Rejected,
        }
    }

    fn with_outcome(mut self, outcome: PipelineOutcome) -> Self {
        if let PipelineOutcome::Saved { items } = outcome {
            self.items_saved = items;
        }
        self.outcome = outcome;
        self
    }

    fn failed(self, kind: ErrorKind, message: impl Into<String>) -> Self {
        self.with_outcome(PipelineOutcome::Failed {
            kind,
            message: message.into(),
        })
    }

    /// Error message for failed runs, `None` otherwise
    pub fn error(&self) -> Option<String> {
        match &self.outcome {
            PipelineOutcome::Failed { kind, message } => Some(format!("{}: {}", kind, message)),
            _ => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, PipelineOutcome::Failed { .. })
    }
}

/// Per-session values every run needs
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub team_id: String,
    pub user_id: Option<String>,
    pub chunks: ChunkSettings,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        let user_id = config.target.user_id.trim();
        Self {
            team_id: config.target.team_id.clone(),
            user_id: (!user_id.is_empty()).then(|| user_id.to_string()),
            chunks: ChunkSettings {
                chunk_size: config.pipeline.chunk_size,
                overlap: config.pipeline.chunk_overlap,
                window: config.pipeline.boundary_window,
            },
        }
    }
}

/// Link filter scoped by the configured skip words
pub fn link_filter_for(config: &Config) -> Result<LinkFilter, ConfigError> {
    let skip_words = SkipWords::new(
        &config.crawler.skip_words,
        &config.target.name,
        &config.target.url,
    );
    LinkFilter::new(skip_words).map_err(|e| ConfigError::InvalidPattern(e.to_string()))
}

/// The extraction pipeline and its collaborators
///
/// Collaborators are shared behind `Arc`, so one pipeline can serve many
/// concurrent runs.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: Arc<dyn FetchAdapter>,
    extractor: Arc<dyn ContentExtractor>,
    validator: Arc<dyn Validator>,
    transformer: Arc<dyn Transformer>,
    store: Arc<dyn KnowledgeStore>,
    filter: Arc<LinkFilter>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        fetcher: Arc<dyn FetchAdapter>,
        extractor: Arc<dyn ContentExtractor>,
        validator: Arc<dyn Validator>,
        transformer: Arc<dyn Transformer>,
        store: Arc<dyn KnowledgeStore>,
        filter: LinkFilter,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            validator,
            transformer,
            store,
            filter: Arc::new(filter),
            settings,
        }
    }

    /// Builds the HTTP-backed pipeline with its own clients and database connection
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        let store = SqliteKnowledgeStore::new(Path::new(&config.storage.database_path))?;
        Self::with_store(config, Arc::new(store))
    }

    /// Builds the HTTP-backed pipeline around an existing store
    pub fn with_store(config: &Config, store: Arc<dyn KnowledgeStore>) -> Result<Self, HarvestError> {
        Ok(Self::new(
            Arc::new(HttpFetcher::from_config(&config.crawler)?),
            Arc::new(HttpContentExtractor::from_config(config)?),
            Arc::new(KeywordValidator::from_config(&config.pipeline)),
            Arc::new(MarkdownTransformer::new()),
            store,
            link_filter_for(config)?,
            PipelineSettings::from_config(config),
        ))
    }

    /// Runs every stage for `url`
    #[tracing::instrument(skip_all, fields(url = %url))]
    pub async fn run(&self, url: &str) -> PipelineResult {
        let subpages = self.discover_subpages(url).await;
        let mut result = PipelineResult::new(url, subpages);

        let content = match self.extractor.extract(url).await {
            Ok(content) => content,
            Err(ExtractError::Unsupported { content_type }) => {
                tracing::debug!("Skipping unsupported content type {}", content_type);
                return result.with_outcome(PipelineOutcome::Skipped {
                    reason: format!("unsupported content type '{}'", content_type),
                });
            }
            Err(e) => {
                tracing::warn!("Extraction failed for {}: {}", url, e);
                return result.failed(ErrorKind::TransientFetch, e.to_string());
            }
        };
        result.content_extracted = true;

        if !self.validator.validate(&content).await {
            tracing::debug!("Content did not pass validation");
            return result.with_outcome(PipelineOutcome::Rejected);
        }

        let (title, body, content_type, author) = if self.settings.chunks.needs_split(&content.text) {
            let chunks = split(&content.text, self.settings.chunks);
            result.chunks = chunks.len();
            match self.transform_chunked(&content, &chunks).await {
                Ok(parts) => parts,
                Err(message) => return result.failed(ErrorKind::TransformFailure, message),
            }
        } else {
            match self.transformer.transform(&content, None).await {
                Ok(Some(section)) => (
                    section.title.unwrap_or_else(|| content.title.clone()),
                    section.body,
                    content.content_type.clone(),
                    content.author.clone(),
                ),
                Ok(None) => {
                    return result.failed(ErrorKind::TransformFailure, "transformer returned no content")
                }
                Err(e) => return result.failed(ErrorKind::TransformFailure, e.to_string()),
            }
        };

        let item = KnowledgeItem {
            source_url: url.to_string(),
            title,
            content: body,
            content_type,
            author,
            user_id: self.settings.user_id.clone(),
        };

        match self.store.upsert(&self.settings.team_id, &item).await {
            Ok(UpsertOutcome::Inserted) => {
                tracing::info!("Saved knowledge item for {}", url);
                result.with_outcome(PipelineOutcome::Saved { items: 1 })
            }
            Ok(UpsertOutcome::Duplicate) => {
                tracing::debug!("Team already has an item for {}", url);
                result.with_outcome(PipelineOutcome::Saved { items: 0 })
            }
            Err(e) => {
                tracing::error!("Failed to persist {}: {}", url, e);
                result.failed(ErrorKind::PersistFailure, e.to_string())
            }
        }
    }

    /// Fetches `url` and keeps the links that pass the filter for its own domain
    async fn discover_subpages(&self, url: &str) -> Vec<String> {
        let page = match self.fetcher.fetch(url).await {
            Ok(page) => page,
            Err(e) => {
                tracing::debug!("Subpage discovery failed for {}: {}", url, e);
                return Vec::new();
            }
        };

        let own = normalize_url(url);
        let mut seen = HashSet::new();
        page.links
            .into_iter()
            .filter(|link| self.filter.accepts(link, url))
            .filter(|link| {
                let normalized = normalize_url(link);
                normalized != own && seen.insert(normalized)
            })
            .collect()
    }

    /// Transforms each chunk under first-chunk metadata and recombines the bodies
    ///
    /// A chunk whose transform fails contributes its raw text; the run fails
    /// only if every chunk does.
    async fn transform_chunked(
        &self,
        content: &ExtractedContent,
        chunks: &[ContentChunk],
    ) -> Result<(String, String, String, Option<String>), String> {
        let Some(first) = chunks.first() else {
            return Err("document produced no chunks".to_string());
        };

        let mut document = content.clone();
        match self.transformer.extract_metadata(content, first).await {
            Ok(Some(metadata)) => {
                if !metadata.title.trim().is_empty() {
                    document.title = metadata.title;
                }
                document.content_type = metadata.content_type;
                document.author = metadata.author.or(document.author);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Metadata extraction failed: {}", e),
        }

        let mut bodies = Vec::with_capacity(chunks.len());
        let mut transformed = 0usize;
        for chunk in chunks {
            match self.transformer.transform(&document, Some(chunk)).await {
                Ok(Some(section)) => {
                    transformed += 1;
                    bodies.push(section.body);
                }
                Ok(None) => {
                    tracing::warn!("Chunk {} produced no content, keeping raw text", chunk.index);
                    bodies.push(chunk.text.clone());
                }
                Err(e) => {
                    tracing::warn!("Chunk {} failed to transform: {}", chunk.index, e);
                    bodies.push(chunk.text.clone());
                }
            }
        }

        if transformed == 0 {
            return Err(format!("all {} chunks failed to transform", chunks.len()));
        }

        tracing::debug!("Transformed {}/{} chunks", transformed, chunks.len());
        Ok((
            document.title,
            combine(&bodies),
            document.content_type,
            document.author,
        ))
    }
}

#[async_trait]
impl UrlProcessor for Pipeline {
    async fn process(&self, url: &str) -> PipelineResult {
        self.run(url).await
    }
}

/// Builds a fresh HTTP pipeline per worker
#[derive(Debug, Clone)]
pub struct HttpPipelineFactory {
    config: Arc<Config>,
}

impl HttpPipelineFactory {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ProcessorFactory for HttpPipelineFactory {
    fn create(&self) -> Result<Box<dyn UrlProcessor>, HarvestError> {
        Ok(Box::new(Pipeline::from_config(&self.config)?))
    }
}
