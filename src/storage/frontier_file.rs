//! Newline-delimited URL lists on disk

use crate::storage::traits::{FrontierStore, StorageResult};
use crate::storage::FrontierList;
use crate::url::{domain_stem, normalize_url, NormalizedUrl};
use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// File-backed [`FrontierStore`]
///
/// The authoritative list lives at the given path; the discovered list sits
/// next to it as `<stem>_subpage<ext>` (`acme.txt` -> `acme_subpage.txt`).
#[derive(Debug, Clone)]
pub struct FileFrontierStore {
    authoritative: PathBuf,
    discovered: PathBuf,
}

impl FileFrontierStore {
    pub fn new(list_path: impl Into<PathBuf>) -> Self {
        let authoritative = list_path.into();
        let discovered = discovered_path(&authoritative);
        Self {
            authoritative,
            discovered,
        }
    }

    /// `<dir>/<domain>.txt` for the target, creating `dir` if needed
    pub fn for_target(dir: impl AsRef<Path>, target_url: &str) -> StorageResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let stem = domain_stem(target_url).unwrap_or_else(|| "target".to_string());
        Ok(Self::new(dir.join(format!("{}.txt", stem))))
    }

    pub fn path(&self, list: FrontierList) -> &Path {
        match list {
            FrontierList::Authoritative => &self.authoritative,
            FrontierList::Discovered => &self.discovered,
        }
    }
}

fn discovered_path(list_path: &Path) -> PathBuf {
    let stem = list_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match list_path.extension() {
        Some(ext) => format!("{}_subpage.{}", stem, ext.to_string_lossy()),
        None => format!("{}_subpage", stem),
    };
    list_path.with_file_name(name)
}

fn read_lines(path: &Path) -> StorageResult<Vec<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

fn ensure_parent(path: &Path) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

impl FrontierStore for FileFrontierStore {
    fn load_set(&self, list: FrontierList) -> StorageResult<Vec<String>> {
        let mut seen: HashSet<NormalizedUrl> = HashSet::new();
        Ok(read_lines(self.path(list))?
            .into_iter()
            .filter(|url| seen.insert(normalize_url(url)))
            .collect())
    }

    fn save_set(&self, list: FrontierList, urls: &[String]) -> StorageResult<()> {
        let path = self.path(list);
        ensure_parent(path)?;

        let mut content = String::new();
        for url in urls {
            content.push_str(url);
            content.push('\n');
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn append_set(&self, list: FrontierList, urls: &[String]) -> StorageResult<usize> {
        let path = self.path(list);
        let mut known: HashSet<NormalizedUrl> = read_lines(path)?
            .iter()
            .map(|url| normalize_url(url))
            .collect();

        let fresh: Vec<&String> = urls
            .iter()
            .filter(|url| !url.trim().is_empty())
            .filter(|url| known.insert(normalize_url(url)))
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        ensure_parent(path)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        for url in &fresh {
            writeln!(file, "{}", url.trim())?;
        }
        Ok(fresh.len())
    }

    fn remove(&self, list: FrontierList) -> StorageResult<()> {
        match fs::remove_file(self.path(list)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
