//! File-hosting indirection
//!
//! Shared Google Drive links point at a viewer page rather than the file.
//! They are rewritten to the direct download endpoint before fetching.

use url::Url;

const DRIVE_BASE: &str = "https://drive.google.com";

/// A Drive-style file host rooted at `base`
#[derive(Debug, Clone)]
pub struct FileHost {
    base: String,
}

impl Default for FileHost {
    fn default() -> Self {
        Self {
            base: DRIVE_BASE.to_string(),
        }
    }
}

impl FileHost {
    /// A host serving the same link layout from another origin
    pub fn at(base: &str) -> Result<Self, url::ParseError> {
        Url::parse(base)?;
        Ok(Self {
            base: base.to_string(),
        })
    }

    fn base(&self) -> Option<Url> {
        Url::parse(&self.base).ok()
    }

    fn serves(&self, url: &Url) -> bool {
        let Some(base) = self.base() else {
            return false;
        };
        url.scheme() == base.scheme()
            && url.host_str().is_some()
            && url.host_str() == base.host_str()
            && url.port_or_known_default() == base.port_or_known_default()
    }

    /// Extracts the file id from a viewer or open link on this host
    pub fn file_id(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        if !self.serves(&parsed) {
            return None;
        }

        let segments: Vec<&str> = parsed.path_segments()?.collect();
        if let ["file", "d", id, ..] = segments.as_slice() {
            if !id.is_empty() {
                return Some(id.to_string());
            }
        }

        if segments.first() == Some(&"open") {
            return parsed
                .query_pairs()
                .find(|(key, value)| key == "id" && !value.is_empty())
                .map(|(_, value)| value.into_owned());
        }

        None
    }

    /// The direct-download URL for a hosted file, `None` for anything else
    pub fn direct_url(&self, url: &str) -> Option<String> {
        let id = self.file_id(url)?;
        let mut direct = self.base()?.join("/uc").ok()?;
        direct
            .query_pairs_mut()
            .append_pair("export", "download")
            .append_pair("id", &id);
        Some(direct.into())
    }
}

/// Extracts the file id from a Drive viewer or open link
pub fn drive_file_id(url: &str) -> Option<String> {
    FileHost::default().file_id(url)
}

/// Returns the direct-download URL for hosted files, `None` for anything else
///
/// # Examples
///
/// ```
/// use knowledge_harvester::extract::resolve_file_hosting;
///
/// assert_eq!(
///     resolve_file_hosting("https://drive.google.com/file/d/abc123/view?usp=sharing").as_deref(),
///     Some("https://drive.google.com/uc?export=download&id=abc123")
/// );
/// assert_eq!(resolve_file_hosting("https://example.com/file/d/abc123/view"), None);
/// ```
pub fn resolve_file_hosting(url: &str) -> Option<String> {
    FileHost::default().direct_url(url)
}
