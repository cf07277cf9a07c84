// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Crawl configuration

use crate::fetch::RetryPolicy;
use std::time::Duration;

/// Tunables shared by the catalog client and the crawler
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Citation catalog API base URL
    pub catalog_base_url: String,
    /// Contact email sent with every catalog request (courtesy identification)
    pub mailto: Option<String>,
    /// Per-call record cap for paginated queries (0 = unbounded)
    pub record_limit: usize,
    /// Citation hops from the root paper that will be expanded
    pub max_depth: u32,
    /// Retry discipline for every remote call
    pub retry: RetryPolicy,
    /// Pause between page fetches of one paginated query
    pub page_delay: Duration,
    /// Per-attempt request timeout
    pub request_timeout: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: "https://api.openalex.org".to_string(),
            mailto: None,
            record_limit: 0,
            max_depth: 2,
            retry: RetryPolicy::default(),
            page_delay: Duration::from_secs(1),
            request_timeout: Duration::from_secs(30),
        }
    }
}
