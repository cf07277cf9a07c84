// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Hosting-platform collaborator: DOI discovery and repository health

use crate::fetch::{FetchClient, FetchError, RetryPolicy};
use crate::types::Project;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tracing::{info, warn};

/// Documentation files whose presence is reported in the project profile
const TRACKED_DOC_FILES: [&str; 5] = [
    "CITATION.cff",
    "CONTRIBUTING.md",
    "GOVERNANCE.md",
    "FUNDING.yml",
    "funding.json",
];

/// Window for recent-activity statistics
const RECENT_DAYS: i64 = 60;

// =============================================================================
// Wire Records
// =============================================================================

#[derive(Debug, Deserialize)]
struct RepoInfo {
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    license: Option<LicenseInfo>,
    stargazers_count: Option<u64>,
    forks_count: Option<u64>,
    subscribers_count: Option<u64>,
    language: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    pushed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct LicenseInfo {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    name: String,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Contributor {
    #[serde(default)]
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    state: Option<String>,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    comments_url: Option<String>,
    // presence marks this "issue" as a pull request
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PullRequest {
    state: Option<String>,
    url: Option<String>,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    comments_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullDetails {
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct Review {
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct IssueComment {
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
    #[serde(default)]
    download_count: u64,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    #[serde(default)]
    author: Option<Contributor>,
}

// =============================================================================
// Client
// =============================================================================

/// Client for the repository hosting platform
pub struct GitHubClient {
    fetch: FetchClient,
    base_url: String,
}

impl GitHubClient {
    /// Build a client; the token, when present, is sent on every request
    pub fn new(
        base_url: &str,
        token: Option<&str>,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let fetch = match token {
            Some(token) => {
                let mut headers = reqwest::header::HeaderMap::new();
                let value = reqwest::header::HeaderValue::from_str(&format!("token {token}"))
                    .context("GitHub token is not a valid header value")?;
                headers.insert(reqwest::header::AUTHORIZATION, value);
                FetchClient::with_default_headers(timeout, policy, headers)?
            }
            None => FetchClient::new(timeout, policy)?,
        };
        Ok(Self {
            fetch,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Look for the repository's citation DOI: CITATION.cff first, then a
    /// DOI pattern anywhere in the README.
    pub fn resolve_doi(&self, owner: &str, repo: &str) -> Result<Option<String>, FetchError> {
        let url = format!("{}/repos/{}/{}/contents", self.base_url, owner, repo);
        let contents: Vec<ContentEntry> = self.fetch.get_json(&url, &[])?;

        for entry in &contents {
            if !entry.name.eq_ignore_ascii_case("citation.cff") {
                continue;
            }
            let Some(download_url) = entry.download_url.as_deref() else {
                continue;
            };
            match self.fetch.get(download_url, &[]) {
                Ok(response) => {
                    if let Ok(body) = response.text() {
                        if let Some(doi) = doi_from_citation_file(&body) {
                            info!("DOI found in CITATION.cff: {}", doi);
                            return Ok(Some(doi));
                        }
                    }
                }
                Err(err) => {
                    warn!("could not fetch CITATION.cff, falling back to README: {}", err);
                }
            }
        }

        for entry in &contents {
            if !entry.name.eq_ignore_ascii_case("readme.md") {
                continue;
            }
            let Some(download_url) = entry.download_url.as_deref() else {
                continue;
            };
            let body = self
                .fetch
                .get(download_url, &[])?
                .text()
                .map_err(|source| FetchError::Decode {
                    url: download_url.to_string(),
                    source,
                })?;
            if let Some(doi) = doi_from_text(&body) {
                info!("DOI found in README.md: {}", doi);
                return Ok(Some(doi));
            }
        }

        warn!("no DOI found in {}/{}", owner, repo);
        Ok(None)
    }

    /// Assemble the repository-health profile for the output document.
    ///
    /// Only the initial details fetch is fatal; every later failure
    /// degrades to partial statistics.
    pub fn collect_project(&self, owner: &str, repo: &str) -> Result<Project> {
        let base = format!("{}/repos/{}/{}", self.base_url, owner, repo);
        info!("collecting repository data for {}/{}", owner, repo);

        let details: RepoInfo = self
            .fetch
            .get_json(&base, &[])
            .context("failed to fetch repository details")?;

        let mut project = Project {
            name: details.name,
            description: details.description,
            license: details.license.and_then(|license| license.name),
            stars: details.stargazers_count,
            forks: details.forks_count,
            watchers: details.subscribers_count,
            main_language: details.language,
            created_at: details.created_at,
            updated_at: details.updated_at,
            pushed_at: details.pushed_at,
            url: format!("https://github.com/{owner}/{repo}"),
            ..Project::default()
        };

        self.scan_documentation(&base, &mut project);
        project.num_contributors = self.count_contributors(&base);
        self.issue_statistics(&base, &mut project);
        self.pull_statistics(&base, &mut project);
        self.language_breakdown(&base, &mut project);
        project.total_downloads = self.release_downloads(&base);
        self.recent_activity(&base, &mut project);

        info!(
            "repository data collected for {}/{} ({} contributors)",
            owner, repo, project.num_contributors
        );
        Ok(project)
    }

    /// Fetch every page of a list endpoint until an empty page or a failure
    fn paginated<T: DeserializeOwned>(&self, url: &str, extra: &[(&'static str, String)]) -> Vec<T> {
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let mut query = vec![("per_page", "100".to_string()), ("page", page.to_string())];
            query.extend_from_slice(extra);
            match self.fetch.get_json::<Vec<T>>(url, &query) {
                Ok(batch) => {
                    if batch.is_empty() {
                        break;
                    }
                    all.extend(batch);
                    page += 1;
                }
                Err(err) => {
                    warn!("pagination of {} stopped: {}", url, err);
                    break;
                }
            }
        }
        all
    }

    fn scan_documentation(&self, base: &str, project: &mut Project) {
        for name in TRACKED_DOC_FILES {
            project.documentation_files.insert(name.to_string(), false);
        }
        let contents: Vec<ContentEntry> =
            match self.fetch.get_json(&format!("{base}/contents"), &[]) {
                Ok(contents) => contents,
                Err(err) => {
                    warn!("failed to list repository contents: {}", err);
                    return;
                }
            };
        for entry in contents {
            let lower = entry.name.to_ascii_lowercase();
            if lower == "readme.md" {
                project.has_readme = true;
            } else if lower == "code_of_conduct.md" {
                project.has_code_of_conduct = true;
            } else if let Some(key) = TRACKED_DOC_FILES
                .iter()
                .find(|key| key.eq_ignore_ascii_case(&entry.name))
            {
                project.documentation_files.insert((*key).to_string(), true);
            }
        }
    }

    fn count_contributors(&self, base: &str) -> usize {
        let contributors: Vec<Contributor> = self.paginated(&format!("{base}/contributors"), &[]);
        let logins: HashSet<String> = contributors
            .into_iter()
            .filter_map(|contributor| contributor.login)
            .collect();
        logins.len()
    }

    fn issue_statistics(&self, base: &str, project: &mut Project) {
        let issues: Vec<Issue> =
            self.paginated(&format!("{base}/issues"), &[("state", "all".to_string())]);
        project.total_issues = issues.len();

        let mut close_hours = Vec::new();
        let mut response_hours = Vec::new();
        for issue in &issues {
            if issue.pull_request.is_some() {
                continue;
            }
            match issue.state.as_deref() {
                Some("open") => project.open_issues += 1,
                Some("closed") => {
                    project.closed_issues += 1;
                    if let (Some(created), Some(closed)) = (issue.created_at, issue.closed_at) {
                        close_hours.push(hours_between(created, closed));
                    }
                    if let (Some(created), Some(comments_url)) =
                        (issue.created_at, issue.comments_url.as_deref())
                    {
                        if let Some(first) = self.first_comment_at(comments_url) {
                            response_hours.push(hours_between(created, first));
                        }
                    }
                }
                _ => {}
            }
        }
        project.avg_time_to_close_issues = mean(&close_hours);
        project.avg_time_to_first_response_issue = mean(&response_hours);
    }

    fn pull_statistics(&self, base: &str, project: &mut Project) {
        let pulls: Vec<PullRequest> =
            self.paginated(&format!("{base}/pulls"), &[("state", "all".to_string())]);
        project.total_pull_requests = pulls.len();

        let mut merge_hours = Vec::new();
        let mut review_hours = Vec::new();
        for pull in &pulls {
            match pull.state.as_deref() {
                Some("open") => project.open_pull_requests += 1,
                Some("closed") => {
                    project.closed_pull_requests += 1;
                    let Some(details_url) = pull.url.as_deref() else {
                        continue;
                    };
                    let Ok(details) = self.fetch.get_json::<PullDetails>(details_url, &[]) else {
                        continue;
                    };
                    let Some(merged_at) = details.merged_at else {
                        continue;
                    };
                    project.merged_pull_requests += 1;
                    if let Some(created) = details.created_at {
                        merge_hours.push(hours_between(created, merged_at));
                        if let Some(first_review) = self.first_review_at(details_url) {
                            review_hours.push(hours_between(created, first_review));
                        }
                    }
                }
                _ => {}
            }
        }
        project.avg_time_to_merge_pr = mean(&merge_hours);
        project.avg_time_to_first_review_pr = mean(&review_hours);
        project.pr_merge_percentage = if project.total_pull_requests > 0 {
            Some(
                project.merged_pull_requests as f64 / project.total_pull_requests as f64 * 100.0,
            )
        } else {
            None
        };

        let mut created_dates: Vec<DateTime<Utc>> =
            pulls.iter().filter_map(|pull| pull.created_at).collect();
        created_dates.sort();
        project.pr_update_frequency = if created_dates.len() > 1 {
            let gaps: Vec<f64> = created_dates
                .windows(2)
                .map(|pair| hours_between(pair[0], pair[1]))
                .collect();
            mean(&gaps)
        } else {
            None
        };

        let mut response_hours = Vec::new();
        for pull in &pulls {
            let (Some(created), Some(comments_url)) = (pull.created_at, pull.comments_url.as_deref())
            else {
                continue;
            };
            if let Some(first) = self.first_comment_at(comments_url) {
                response_hours.push(hours_between(created, first));
            }
        }
        project.avg_time_to_first_response_pr = mean(&response_hours);
    }

    fn language_breakdown(&self, base: &str, project: &mut Project) {
        let languages: BTreeMap<String, u64> =
            match self.fetch.get_json(&format!("{base}/languages"), &[]) {
                Ok(languages) => languages,
                Err(err) => {
                    warn!("failed to fetch languages: {}", err);
                    return;
                }
            };
        let total: u64 = languages.values().sum();
        if total > 0 {
            project.language_percentages = languages
                .iter()
                .map(|(language, bytes)| {
                    (language.clone(), *bytes as f64 / total as f64 * 100.0)
                })
                .collect();
        }
        project.languages = languages;
    }

    fn release_downloads(&self, base: &str) -> u64 {
        let releases: Vec<Release> = match self.fetch.get_json(&format!("{base}/releases"), &[]) {
            Ok(releases) => releases,
            Err(err) => {
                warn!("failed to fetch releases: {}", err);
                return 0;
            }
        };
        releases
            .iter()
            .flat_map(|release| &release.assets)
            .map(|asset| asset.download_count)
            .sum()
    }

    fn recent_activity(&self, base: &str, project: &mut Project) {
        let since = Utc::now() - chrono::Duration::days(RECENT_DAYS);
        let since_param = since.format("%Y-%m-%dT%H:%M:%SZ").to_string();

        let commits: Vec<CommitEntry> = self.paginated(
            &format!("{base}/commits"),
            &[("since", since_param.clone())],
        );
        project.recent_commits = commits.len();
        let authors: HashSet<String> = commits
            .into_iter()
            .filter_map(|commit| commit.author.and_then(|author| author.login))
            .collect();
        project.recent_active_contributors = authors.len();

        let issues: Vec<Issue> = self.paginated(
            &format!("{base}/issues"),
            &[("state", "all".to_string()), ("since", since_param)],
        );
        let opened: Vec<&Issue> = issues
            .iter()
            .filter(|issue| {
                issue.pull_request.is_none()
                    && issue.created_at.is_some_and(|created| created >= since)
            })
            .collect();
        project.recent_issues_opened = opened.len();
        project.recent_issues_closed = opened
            .iter()
            .filter(|issue| issue.closed_at.is_some_and(|closed| closed >= since))
            .count();

        let pulls: Vec<PullRequest> =
            self.paginated(&format!("{base}/pulls"), &[("state", "all".to_string())]);
        let opened_pulls: Vec<&PullRequest> = pulls
            .iter()
            .filter(|pull| pull.created_at.is_some_and(|created| created >= since))
            .collect();
        project.recent_pulls_opened = opened_pulls.len();

        let mut merged = 0usize;
        for pull in &opened_pulls {
            let Some(details_url) = pull.url.as_deref() else {
                continue;
            };
            let Ok(details) = self.fetch.get_json::<PullDetails>(details_url, &[]) else {
                continue;
            };
            if details.merged_at.is_some_and(|merged_at| merged_at >= since) {
                merged += 1;
            }
        }
        project.recent_pulls_merged = merged;
    }

    fn first_comment_at(&self, comments_url: &str) -> Option<DateTime<Utc>> {
        let comments: Vec<IssueComment> = self.fetch.get_json(comments_url, &[]).ok()?;
        comments.first().and_then(|comment| comment.created_at)
    }

    fn first_review_at(&self, pull_url: &str) -> Option<DateTime<Utc>> {
        let reviews: Vec<Review> = self
            .fetch
            .get_json(&format!("{pull_url}/reviews"), &[])
            .ok()?;
        reviews.first().and_then(|review| review.submitted_at)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Parse a repository URL into (owner, name)
pub fn parse_repo_url(url: &str) -> Result<(String, String)> {
    let pattern = Regex::new(r"^https?://github\.com/([^/]+)/([^/]+)")
        .context("invalid repository URL pattern")?;
    let captures = pattern
        .captures(url.trim())
        .with_context(|| format!("not a recognizable GitHub repository URL: {url}"))?;
    let owner = captures[1].to_string();
    let repo = captures[2].trim_end_matches(".git").to_string();
    Ok((owner, repo))
}

/// First `doi:` line of a citation metadata file
fn doi_from_citation_file(content: &str) -> Option<String> {
    for line in content.lines() {
        let lower = line.to_ascii_lowercase();
        if let Some(position) = lower.find("doi:") {
            let value = line[position + 4..].trim().trim_matches('"');
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// First Crossref-shaped DOI anywhere in free text
fn doi_from_text(text: &str) -> Option<String> {
    let pattern = Regex::new(r"(?i)10\.\d{4,9}/[-._;()/:A-Z0-9]+").ok()?;
    pattern.find(text).map(|found| found.as_str().to_string())
}

fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_seconds() as f64 / 3600.0
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
