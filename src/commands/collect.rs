// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Collect command - builds the citation and contribution graph for one repository

use crate::catalog::CatalogClient;
use crate::config::CrawlConfig;
use crate::crawl::{CancelFlag, CrawlOutcome, Crawler};
use crate::github::{parse_repo_url, GitHubClient};
use crate::normalize::register_work;
use crate::store::EntityStore;
use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Everything the collect pipeline needs
pub struct CollectOptions {
    /// Repository URL (https://github.com/owner/name)
    pub repo_url: String,
    /// Snapshot output path
    pub output: PathBuf,
    /// Hosting-platform API base URL
    pub github_base_url: String,
    /// Hosting-platform access token
    pub github_token: Option<String>,
    /// Crawl tunables
    pub config: CrawlConfig,
}

/// Run the collect command
pub fn run(options: &CollectOptions) -> Result<()> {
    let (owner, repo) = parse_repo_url(&options.repo_url)?;

    let github = GitHubClient::new(
        &options.github_base_url,
        options.github_token.as_deref(),
        options.config.request_timeout,
        options.config.retry.clone(),
    )?;
    let catalog = CatalogClient::new(&options.config)?;

    let project = github
        .collect_project(&owner, &repo)
        .context("failed to collect repository data")?;

    let doi = github
        .resolve_doi(&owner, &repo)
        .context("failed to search the repository for a DOI")?;
    let Some(doi) = doi else {
        bail!("no DOI found in {owner}/{repo}; cannot resolve the associated paper");
    };
    info!("starting from DOI {}", doi);

    let root = catalog
        .work_by_doi(&doi)
        .with_context(|| format!("failed to resolve the paper behind {doi}"))?;
    let root_id = root.id.clone();

    let mut store = EntityStore::new();
    register_work(&mut store, &root);

    let cancel = CancelFlag::new();
    install_interrupt_handler(cancel.clone());

    let outcome = Crawler::new(&catalog, &mut store, &options.config, cancel).run(&root_id);

    let output_path = match outcome {
        CrawlOutcome::Completed => options.output.clone(),
        CrawlOutcome::Cancelled => {
            warn!("crawl interrupted; writing partial snapshot");
            partial_path(&options.output)
        }
    };

    let snapshot = store.into_snapshot(vec![project]);
    let json = serde_json::to_string_pretty(&snapshot).context("failed to serialize snapshot")?;
    fs::write(&output_path, json)
        .with_context(|| format!("failed to write {}", output_path.display()))?;

    match outcome {
        CrawlOutcome::Completed => println!("{}", "Collection complete".green().bold()),
        CrawlOutcome::Cancelled => println!("{}", "Collection interrupted".yellow().bold()),
    }
    println!();
    println!("  papers:       {}", snapshot.papers.len());
    println!("  people:       {}", snapshot.people.len());
    println!("  institutions: {}", snapshot.institutions.len());
    println!("  topics:       {}", snapshot.topics.len());
    println!("  projects:     {}", snapshot.projects.len());
    println!();
    println!("Snapshot written to {}", output_path.display());

    Ok(())
}

/// Wire Ctrl-C to the cooperative cancellation flag; the crawl observes it
/// between work-queue items only.
fn install_interrupt_handler(cancel: CancelFlag) {
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                warn!("could not install interrupt handler: {}", err);
                return;
            }
        };
        if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
            warn!("interrupt received; finishing the current item before stopping");
            cancel.cancel();
        }
    });
}

/// Sibling path used when a cancelled run writes its partial snapshot
fn partial_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("output");
    let mut name = format!("{stem}_partial");
    if let Some(extension) = output.extension().and_then(|extension| extension.to_str()) {
        name.push('.');
        name.push_str(extension);
    }
    output.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_keeps_extension() {
        assert_eq!(
            partial_path(Path::new("output_data.json")),
            PathBuf::from("output_data_partial.json")
        );
        assert_eq!(
            partial_path(Path::new("/tmp/graph")),
            PathBuf::from("/tmp/graph_partial")
        );
    }
}
