// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Repocite library - citation and contribution knowledge graph for your
//! repository ecosystem
//!
//! This crate resolves a repository's associated scholarly paper, walks the
//! citation network around it to a bounded depth, collects repository-health
//! metrics, and emits a single graph snapshot document.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod commands;
pub mod config;
pub mod crawl;
pub mod fetch;
pub mod github;
pub mod normalize;
pub mod store;

/// Core data types for the graph snapshot document
pub mod types {
    use chrono::{DateTime, NaiveDate, Utc};
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    // =========================================================================
    // Catalog Entities
    // =========================================================================

    /// Scholarly paper node
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Paper {
        /// Always "paper"
        #[serde(rename = "type")]
        pub kind: String,
        /// Catalog identifier (opaque, stable)
        pub id: String,
        /// Title as reported by the catalog
        pub title: Option<String>,
        /// DOI, when the catalog knows one
        pub doi: Option<String>,
        /// Publication date
        pub publication_date: Option<NaiveDate>,
        /// Plain text reconstructed from the catalog's inverted abstract index
        #[serde(rename = "abstract")]
        pub abstract_text: Option<String>,
        /// Author identifiers
        #[serde(default)]
        pub authors: Vec<String>,
        /// Topic identifiers
        #[serde(default)]
        pub topics: Vec<String>,
        /// Works this paper cites (outbound)
        #[serde(default)]
        pub references: Vec<String>,
        /// Works citing this paper, as discovered during the crawl (inbound)
        #[serde(default)]
        pub cited_by: Vec<String>,
    }

    /// Person (author) node
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Person {
        /// Always "person"
        #[serde(rename = "type")]
        pub kind: String,
        /// Catalog identifier
        pub id: String,
        /// Display name
        pub name: Option<String>,
        /// External scholar identifier, if known
        pub orcid: Option<String>,
        /// Institution identifiers this person is affiliated with
        #[serde(default)]
        pub affiliations: Vec<String>,
        /// Papers this person authored (grows as papers are discovered)
        #[serde(default)]
        pub papers_authored: Vec<String>,
    }

    /// Institution node
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Institution {
        /// Always "institution"
        #[serde(rename = "type")]
        pub kind: String,
        /// Catalog identifier
        pub id: String,
        /// Display name
        pub name: Option<String>,
    }

    /// Topic (concept) node
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Topic {
        /// Always "topic"
        #[serde(rename = "type")]
        pub kind: String,
        /// Catalog identifier
        pub id: String,
        /// Display name
        pub name: Option<String>,
    }

    // =========================================================================
    // Repository Health Profile
    // =========================================================================

    /// Hosting-platform health profile for the repository under study
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Project {
        /// Repository name
        pub name: Option<String>,
        /// Repository description
        pub description: Option<String>,
        /// License name
        pub license: Option<String>,
        /// Star count
        pub stars: Option<u64>,
        /// Fork count
        pub forks: Option<u64>,
        /// Subscriber (watcher) count
        pub watchers: Option<u64>,
        /// Primary language
        pub main_language: Option<String>,
        /// Creation timestamp
        pub created_at: Option<DateTime<Utc>>,
        /// Last update timestamp
        pub updated_at: Option<DateTime<Utc>>,
        /// Last push timestamp
        pub pushed_at: Option<DateTime<Utc>>,
        /// Whether a README.md is present
        pub has_readme: bool,
        /// Whether a CODE_OF_CONDUCT.md is present
        pub has_code_of_conduct: bool,
        /// Presence of tracked documentation files
        pub documentation_files: BTreeMap<String, bool>,
        /// Distinct contributors
        pub num_contributors: usize,
        /// All issues, pull requests included
        pub total_issues: usize,
        /// Open issues (pull requests excluded)
        pub open_issues: usize,
        /// Closed issues (pull requests excluded)
        pub closed_issues: usize,
        /// Mean hours from issue creation to close
        pub avg_time_to_close_issues: Option<f64>,
        /// Mean hours from issue creation to first comment
        pub avg_time_to_first_response_issue: Option<f64>,
        /// All pull requests
        pub total_pull_requests: usize,
        /// Open pull requests
        pub open_pull_requests: usize,
        /// Closed pull requests
        pub closed_pull_requests: usize,
        /// Merged pull requests
        pub merged_pull_requests: usize,
        /// Mean hours from pull-request creation to merge
        pub avg_time_to_merge_pr: Option<f64>,
        /// Mean hours from pull-request creation to first review
        pub avg_time_to_first_review_pr: Option<f64>,
        /// Merged pull requests as a percentage of all pull requests
        pub pr_merge_percentage: Option<f64>,
        /// Mean hours between consecutive pull-request creations
        pub pr_update_frequency: Option<f64>,
        /// Mean hours from pull-request creation to first comment
        pub avg_time_to_first_response_pr: Option<f64>,
        /// Language byte counts
        pub languages: BTreeMap<String, u64>,
        /// Language shares as percentages of total bytes
        pub language_percentages: BTreeMap<String, f64>,
        /// Download count summed over all release assets
        pub total_downloads: u64,
        /// Commits in the past 60 days
        pub recent_commits: usize,
        /// Distinct commit authors in the past 60 days
        pub recent_active_contributors: usize,
        /// Issues opened in the past 60 days (pull requests excluded)
        pub recent_issues_opened: usize,
        /// Of those, issues also closed in the past 60 days
        pub recent_issues_closed: usize,
        /// Pull requests opened in the past 60 days
        pub recent_pulls_opened: usize,
        /// Of those, pull requests also merged in the past 60 days
        pub recent_pulls_merged: usize,
        /// Repository URL
        pub url: String,
    }

    // =========================================================================
    // Snapshot Document
    // =========================================================================

    /// The complete graph snapshot - the sole persisted artifact of a run
    #[derive(Debug, Clone, Default, Serialize, Deserialize)]
    pub struct Snapshot {
        /// All person nodes
        #[serde(default)]
        pub people: Vec<Person>,
        /// All paper nodes
        #[serde(default)]
        pub papers: Vec<Paper>,
        /// All institution nodes
        #[serde(default)]
        pub institutions: Vec<Institution>,
        /// All topic nodes
        #[serde(default)]
        pub topics: Vec<Topic>,
        /// Repository health profiles
        #[serde(default)]
        pub projects: Vec<Project>,
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
