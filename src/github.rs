//! Random code samples from GitHub.
//!
//! Picks one of the most starred repositories for a language, lists its tree,
//! filters it down to reasonably sized source files and downloads one of
//! them. The HTTP side sits behind [`CodeHost`] so the selection logic can be
//! exercised without a network.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, ACCEPT};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::language::Language;
use crate::samples::{sanitize_code, CodeSample, DEFAULT_MAX_CHARS};

const GITHUB_API: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const JSON_MEDIA_TYPE: &str = "application/vnd.github+json";
const RAW_MEDIA_TYPE: &str = "application/vnd.github.raw+json";
const USER_AGENT: &str = concat!("codetype/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "dist",
    "build",
    "generated",
    "test",
    "tests",
    "__tests__",
    "spec",
    "__mocks__",
];

const EXCLUDED_FILE_PATTERNS: &[&str] = &[".min.", ".d.ts", "package-lock", "yarn.lock"];

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("GitHub rate limit exceeded.")]
    RateLimited { retry_after: Option<u64> },
    #[error("Failed to connect to GitHub.")]
    Network,
    #[error("{0}")]
    NotFound(String),
    #[error("No suitable source files found. Try another language.")]
    NoSuitableFiles,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RepoOwner {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Repo {
    pub full_name: String,
    pub owner: RepoOwner,
    pub name: String,
    pub default_branch: String,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub sha: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    items: Vec<Repo>,
}

#[derive(Deserialize)]
struct TreeResponse {
    tree: Vec<TreeEntry>,
}

/// Knobs for picking a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchLimits {
    pub min_file_size: u64,
    pub max_file_size: u64,
    pub max_repo_attempts: usize,
    pub max_chars: usize,
}

impl Default for FetchLimits {
    fn default() -> Self {
        Self {
            min_file_size: 500,
            max_file_size: 5000,
            max_repo_attempts: 3,
            max_chars: DEFAULT_MAX_CHARS,
        }
    }
}

/// Remote code hosting API
pub trait CodeHost {
    fn search_repos(&self, query: &str) -> Result<Vec<Repo>, FetchError>;
    fn repo_tree(&self, owner: &str, repo: &str, branch: &str)
        -> Result<Vec<TreeEntry>, FetchError>;
    fn file_content(&self, owner: &str, repo: &str, path: &str) -> Result<String, FetchError>;
}

/// Blocking client for the GitHub REST API
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::blocking::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Result<Self, FetchError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(network_error)?;

        Ok(Self {
            http,
            base_url: GITHUB_API.to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = Url::parse(&self.base_url).map_err(network_error)?;
        url.path_segments_mut()
            .map_err(|_| FetchError::Network)?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get(&self, url: Url, accept: &str) -> Result<reqwest::blocking::Response, FetchError> {
        debug!(url = url.as_str(), "GET");
        let mut request = self
            .http
            .get(url)
            .header(ACCEPT, accept)
            .header("X-GitHub-Api-Version", API_VERSION);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().map_err(network_error)?;
        check_status(response.status(), response.headers())?;
        Ok(response)
    }
}

impl CodeHost for GitHubClient {
    fn search_repos(&self, query: &str) -> Result<Vec<Repo>, FetchError> {
        let mut url = self.endpoint(&["search", "repositories"])?;
        url.query_pairs_mut()
            .append_pair("q", &format!("language:{query}"))
            .append_pair("sort", "stars")
            .append_pair("order", "desc")
            .append_pair("per_page", "50");

        let body: SearchResponse = self
            .get(url, JSON_MEDIA_TYPE)?
            .json()
            .map_err(network_error)?;
        Ok(body.items)
    }

    fn repo_tree(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<Vec<TreeEntry>, FetchError> {
        let mut url = self.endpoint(&["repos", owner, repo, "git", "trees", branch])?;
        url.query_pairs_mut().append_pair("recursive", "1");

        let body: TreeResponse = self
            .get(url, JSON_MEDIA_TYPE)?
            .json()
            .map_err(network_error)?;
        Ok(body.tree)
    }

    fn file_content(&self, owner: &str, repo: &str, path: &str) -> Result<String, FetchError> {
        let mut segments = vec!["repos", owner, repo, "contents"];
        segments.extend(path.split('/'));
        let url = self.endpoint(&segments)?;

        self.get(url, RAW_MEDIA_TYPE)?
            .text()
            .map_err(network_error)
    }
}

fn network_error<E: std::fmt::Display>(err: E) -> FetchError {
    warn!(error = %err, "request to GitHub failed");
    FetchError::Network
}

/// Map an HTTP status to the fetch error taxonomy.
pub fn check_status(status: StatusCode, headers: &HeaderMap) -> Result<(), FetchError> {
    let remaining = headers
        .get("x-ratelimit-remaining")
        .and_then(|v| v.to_str().ok());

    if status == StatusCode::FORBIDDEN && remaining == Some("0") {
        let retry_after = headers
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok());
        return Err(FetchError::RateLimited { retry_after });
    }

    if !status.is_success() {
        return Err(FetchError::NotFound(format!(
            "GitHub API returned {}",
            status.as_u16()
        )));
    }

    Ok(())
}

/// Paths under vendored, generated or test directories, plus minified and
/// lock files.
pub fn is_excluded_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    let segments: Vec<&str> = lower.split('/').collect();
    let file_name = segments.last().copied().unwrap_or_default();

    segments.iter().any(|seg| EXCLUDED_DIRS.contains(seg))
        || EXCLUDED_FILE_PATTERNS
            .iter()
            .any(|pattern| file_name.contains(pattern))
}

/// Tree entries worth typing: blobs of a sensible size with a matching
/// extension, outside excluded paths.
pub fn filter_source_files<'a, S: AsRef<str>>(
    entries: &'a [TreeEntry],
    extensions: &[S],
    limits: &FetchLimits,
) -> Vec<&'a TreeEntry> {
    entries
        .iter()
        .filter(|entry| entry.kind == EntryKind::Blob)
        .filter(|entry| {
            entry
                .size
                .is_some_and(|size| (limits.min_file_size..=limits.max_file_size).contains(&size))
        })
        .filter(|entry| crate::language::matches_extension(&entry.path, extensions))
        .filter(|entry| !is_excluded_path(&entry.path))
        .collect()
}

/// Fetch a random, typable source file written in `language`.
pub fn fetch_random_code<H, R>(
    host: &H,
    language: &Language,
    rng: &mut R,
    limits: &FetchLimits,
) -> Result<CodeSample, FetchError>
where
    H: CodeHost + ?Sized,
    R: Rng + ?Sized,
{
    let mut repos = host.search_repos(&language.github_query)?;
    if repos.is_empty() {
        return Err(FetchError::NotFound("No repositories found.".to_string()));
    }

    repos.shuffle(rng);
    for repo in repos.iter().take(limits.max_repo_attempts) {
        let tree = match host.repo_tree(&repo.owner.login, &repo.name, &repo.default_branch) {
            Ok(tree) => tree,
            Err(err) => {
                debug!(repo = %repo.full_name, %err, "skipping repository");
                continue;
            }
        };

        let candidates = filter_source_files(&tree, language.extensions.as_slice(), limits);
        let Some(file) = candidates.choose(rng) else {
            debug!(repo = %repo.full_name, "no candidate files");
            continue;
        };

        let raw = match host.file_content(&repo.owner.login, &repo.name, &file.path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(repo = %repo.full_name, path = %file.path, %err, "skipping file");
                continue;
            }
        };

        let sample = CodeSample {
            id: format!("github-{}-{}", repo.full_name, file.path),
            language: language.name.clone(),
            language_id: language.id.clone(),
            title: format!("{} from {}", file.path, repo.full_name),
            code: sanitize_code(&raw, limits.max_chars),
            source_url: Some(format!(
                "https://github.com/{}/blob/{}/{}",
                repo.full_name, repo.default_branch, file.path
            )),
        };
        if !sample.has_typable_content() {
            debug!(repo = %repo.full_name, path = %file.path, "nothing to type");
            continue;
        }

        info!(id = %sample.id, chars = sample.code.chars().count(), "fetched sample");
        return Ok(sample);
    }

    Err(FetchError::NoSuitableFiles)
}
