// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Resolve command - finds the citation DOI for a repository

use crate::config::CrawlConfig;
use crate::github::{parse_repo_url, GitHubClient};
use anyhow::{bail, Result};

/// Print the repository's citation DOI, or fail if none is found
pub fn run(
    repo_url: &str,
    github_base_url: &str,
    github_token: Option<&str>,
    config: &CrawlConfig,
) -> Result<()> {
    let (owner, repo) = parse_repo_url(repo_url)?;
    let github = GitHubClient::new(
        github_base_url,
        github_token,
        config.request_timeout,
        config.retry.clone(),
    )?;

    match github.resolve_doi(&owner, &repo)? {
        Some(doi) => {
            println!("{doi}");
            Ok(())
        }
        None => bail!("no DOI found in {owner}/{repo}"),
    }
}
