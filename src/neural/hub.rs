//! Model artifact download from the model hub
//!
//! A snapshot mirrors the remote repository's file tree into a local
//! directory. Transfers go through the `hf_hub` download cache; every
//! fetched file is then placed under `dest` as a regular file, written to
//! `*.part` first and renamed into place. Files already present under their
//! final name are left alone.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use hf_hub::api::sync::{Api, ApiBuilder};
use hf_hub::Repo;

use crate::config::Settings;
use crate::error::{Result, TtsError};
use crate::neural::model::ModelVariant;

/// Directory under the models base directory holding the hub download cache
pub const HUB_CACHE_DIR: &str = ".hf-cache";

/// Fetches every artifact of a repository into a local directory
pub trait ArtifactSource: Send + Sync {
    /// Make `dest` a complete local copy of `repo_id` and return it
    fn snapshot(&self, repo_id: &str, dest: &Path) -> Result<PathBuf>;
}

/// Remote side of a snapshot
pub trait RepoFetcher: Send + Sync {
    /// Repository-relative paths of every file at the main revision
    fn list_files(&self, repo_id: &str) -> Result<Vec<String>>;

    /// Fetch one file and return a readable local path to its contents
    fn fetch_file(&self, repo_id: &str, filename: &str) -> Result<PathBuf>;
}

/// Fetcher backed by the `hf_hub` sync API
pub struct HfFetcher {
    api: Api,
}

impl HfFetcher {
    pub fn new(settings: &Settings) -> Result<Self> {
        let api = ApiBuilder::new()
            .with_endpoint(settings.hub_endpoint.clone())
            .with_token(settings.hub_token.clone())
            .with_cache_dir(settings.models_dir.join(HUB_CACHE_DIR))
            .with_progress(false)
            .build()
            .map_err(|e| {
                TtsError::fetch(
                    &settings.hub_endpoint,
                    format!("cannot configure hub client: {}", e),
                )
            })?;
        Ok(Self { api })
    }
}

impl RepoFetcher for HfFetcher {
    fn list_files(&self, repo_id: &str) -> Result<Vec<String>> {
        let info = self
            .api
            .repo(Repo::model(repo_id.to_string()))
            .info()
            .map_err(|e| TtsError::fetch(repo_id, format!("cannot list repository: {}", e)))?;
        Ok(info.siblings.into_iter().map(|s| s.rfilename).collect())
    }

    fn fetch_file(&self, repo_id: &str, filename: &str) -> Result<PathBuf> {
        tracing::info!("Downloading {}/{}", repo_id, filename);
        self.api
            .repo(Repo::model(repo_id.to_string()))
            .get(filename)
            .map_err(|e| TtsError::fetch(repo_id, format!("cannot download {}: {}", filename, e)))
    }
}

/// Artifact source mirroring hub repositories into plain directories
pub struct HubSource {
    fetcher: Box<dyn RepoFetcher>,
}

impl HubSource {
    /// Source backed by the hub configured in `settings`
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::with_fetcher(Box::new(HfFetcher::new(settings)?)))
    }

    pub fn with_fetcher(fetcher: Box<dyn RepoFetcher>) -> Self {
        Self { fetcher }
    }
}

impl ArtifactSource for HubSource {
    fn snapshot(&self, repo_id: &str, dest: &Path) -> Result<PathBuf> {
        let files = self.fetcher.list_files(repo_id)?;
        if files.is_empty() {
            return Err(TtsError::fetch(repo_id, "repository lists no files"));
        }

        // Validate every path before touching the disk
        let targets = files
            .iter()
            .map(|name| {
                safe_join(dest, name).ok_or_else(|| {
                    TtsError::fetch(repo_id, format!("refusing unsafe file path '{}'", name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        fs::create_dir_all(dest).map_err(|e| {
            TtsError::fetch_with(repo_id, format!("cannot create {}", dest.display()), e)
        })?;

        let mut fetched = 0usize;
        for (name, target) in files.iter().zip(&targets) {
            if is_present(target) {
                tracing::debug!("{} already present, skipping", name);
                continue;
            }

            let cached = self.fetcher.fetch_file(repo_id, name)?;
            mirror_file(&cached, target)
                .map_err(|e| TtsError::fetch_with(repo_id, format!("cannot store {}", name), e))?;
            fetched += 1;
        }

        tracing::info!(
            "Snapshot of {} ready in {} ({} fetched, {} already present)",
            repo_id,
            dest.display(),
            fetched,
            files.len() - fetched
        );
        Ok(dest.to_path_buf())
    }
}

/// Snapshot `variant` into its directory under `models_dir`
pub fn fetch_variant(
    source: &dyn ArtifactSource,
    models_dir: &Path,
    variant: ModelVariant,
) -> Result<PathBuf> {
    let repo_id = variant.repo_id();
    let dir = variant.local_dir(models_dir);
    tracing::info!("Downloading/verifying {} to {}", repo_id, dir.display());
    source.snapshot(&repo_id, &dir)
}

/// Join a repository-relative path onto `dest`, rejecting anything that
/// could land outside it
pub fn safe_join(dest: &Path, relative: &str) -> Option<PathBuf> {
    let rel = Path::new(relative);
    if relative.is_empty() {
        return None;
    }
    if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(dest.join(rel))
}

/// A regular file (not a symlink) under the final name
fn is_present(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// Place the contents of `source` at `target` through a sibling `.part` file.
///
/// The cached blob is hard-linked when possible and copied otherwise; either
/// way `target` ends up a regular file, never a symlink into the cache.
pub fn mirror_file(source: &Path, target: &Path) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut part = target.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);
    let _ = fs::remove_file(&part);

    let result = (|| {
        let blob = fs::canonicalize(source)?;
        if fs::hard_link(&blob, &part).is_err() {
            fs::copy(&blob, &part)?;
        }
        fs::rename(&part, target)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}
