//! Heuristic content validator

use crate::config::PipelineConfig;
use crate::extract::ExtractedContent;
use crate::pipeline::traits::Validator;
use async_trait::async_trait;

/// Terms that mark content as technical enough to keep
const TECHNICAL_KEYWORDS: &[&str] = &[
    "api",
    "code",
    "programming",
    "development",
    "software",
    "technology",
    "algorithm",
    "database",
    "framework",
    "library",
    "function",
    "class",
    "method",
    "variable",
    "loop",
    "condition",
    "error",
    "debug",
    "test",
    "deploy",
    "server",
    "client",
    "frontend",
    "backend",
    "security",
    "performance",
    "optimization",
    "architecture",
    "design",
];

/// Accepts content that is long enough, titled, and mentions a technical term
#[derive(Debug, Clone)]
pub struct KeywordValidator {
    min_content_length: usize,
    min_title_length: usize,
}

impl KeywordValidator {
    pub fn new(min_content_length: usize, min_title_length: usize) -> Self {
        Self {
            min_content_length,
            min_title_length,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.min_content_length, config.min_title_length)
    }

    /// Synchronous form of [`Validator::validate`]
    pub fn check(&self, content: &ExtractedContent) -> bool {
        if content.text.trim().chars().count() < self.min_content_length {
            return false;
        }
        if content.title.trim().chars().count() < self.min_title_length {
            return false;
        }

        let lowered = content.text.to_lowercase();
        TECHNICAL_KEYWORDS
            .iter()
            .any(|keyword| lowered.contains(keyword))
    }
}

#[async_trait]
impl Validator for KeywordValidator {
    async fn validate(&self, content: &ExtractedContent) -> bool {
        self.check(content)
    }
}
