// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Bounded breadth-first citation discovery

use crate::catalog::CatalogClient;
use crate::config::CrawlConfig;
use crate::normalize::register_work;
use crate::store::EntityStore;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

/// Cooperative cancellation flag, checked between work-queue items
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a flag in the not-cancelled state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// The work queue drained
    Completed,
    /// Operator cancellation observed between queue items
    Cancelled,
}

/// Work-queue driven citation crawler.
///
/// Holds the visited set that guarantees each paper is expanded at most
/// once per run, no matter how many times it is enqueued. The store is
/// injected so tests can inspect exactly what a crawl registered.
pub struct Crawler<'a> {
    catalog: &'a CatalogClient,
    store: &'a mut EntityStore,
    config: &'a CrawlConfig,
    cancel: CancelFlag,
    visited: HashSet<String>,
}

impl<'a> Crawler<'a> {
    /// Create a crawler over the given catalog, store, and configuration
    pub fn new(
        catalog: &'a CatalogClient,
        store: &'a mut EntityStore,
        config: &'a CrawlConfig,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            catalog,
            store,
            config,
            cancel,
            visited: HashSet::new(),
        }
    }

    /// Breadth-first expansion from the root paper out to the depth ceiling.
    ///
    /// Each dequeued paper is fetched if unseen, its authors' other works
    /// are backfilled, and the papers citing it are discovered and enqueued
    /// one hop deeper. Per-item fetch failures are contained: the item is
    /// dropped, everything registered so far stays.
    pub fn run(&mut self, root_id: &str) -> CrawlOutcome {
        let mut queue = VecDeque::new();
        queue.push_back((root_id.to_string(), 1u32));

        while let Some((paper_id, depth)) = queue.pop_front() {
            if self.cancel.is_cancelled() {
                warn!("crawl cancelled, keeping everything registered so far");
                return CrawlOutcome::Cancelled;
            }
            if depth > self.config.max_depth {
                continue;
            }
            if !self.visited.insert(paper_id.clone()) {
                continue;
            }
            info!("expanding paper {} at depth {}", paper_id, depth);

            if !self.store.contains_paper(&paper_id) {
                match self.catalog.work(&paper_id) {
                    Ok(work) => register_work(self.store, &work),
                    Err(err) => {
                        // stays visited, never retried
                        warn!("skipping paper {}: {}", paper_id, err);
                        continue;
                    }
                }
            }

            let authors = self
                .store
                .paper(&paper_id)
                .map(|paper| paper.authors.clone())
                .unwrap_or_default();
            for author_id in &authors {
                self.backfill_author(author_id);
            }

            self.discover_citers(&paper_id, depth, &mut queue);
        }

        CrawlOutcome::Completed
    }

    /// Identifiers expanded so far
    #[must_use]
    pub fn visited(&self) -> &HashSet<String> {
        &self.visited
    }

    /// Register every work the catalog attributes to this author.
    ///
    /// A fetch failure ends the backfill for this author silently; works
    /// normalized from earlier pages stay registered.
    fn backfill_author(&mut self, author_id: &str) {
        let mut page = 1u32;
        let mut retrieved = 0usize;
        loop {
            let works_page = match self.catalog.works_by_author(author_id, page) {
                Ok(works_page) => works_page,
                Err(err) => {
                    warn!("author backfill for {} stopped: {}", author_id, err);
                    return;
                }
            };
            if works_page.results.is_empty() {
                return;
            }
            for work in &works_page.results {
                register_work(self.store, work);
                retrieved += 1;
                if self.config.record_limit != 0 && retrieved >= self.config.record_limit {
                    info!(
                        "record limit {} reached for author {}",
                        self.config.record_limit, author_id
                    );
                    return;
                }
            }
            if !works_page.meta.has_next() {
                return;
            }
            page += 1;
            thread::sleep(self.config.page_delay);
        }
    }

    /// Discover the papers citing `paper_id`, growing its cited-by set and
    /// enqueueing each newcomer one hop deeper. The depth ceiling is not
    /// checked here; that happens at dequeue.
    fn discover_citers(&mut self, paper_id: &str, depth: u32, queue: &mut VecDeque<(String, u32)>) {
        let mut page = 1u32;
        let mut retrieved = 0usize;
        loop {
            let works_page = match self.catalog.works_citing(paper_id, page) {
                Ok(works_page) => works_page,
                Err(err) => {
                    warn!("citing query for {} stopped: {}", paper_id, err);
                    return;
                }
            };
            if works_page.results.is_empty() {
                return;
            }
            for work in &works_page.results {
                if self.visited.contains(&work.id) {
                    continue;
                }
                register_work(self.store, work);
                if let Some(paper) = self.store.paper_mut(paper_id) {
                    if !paper.cited_by.contains(&work.id) {
                        paper.cited_by.push(work.id.clone());
                    }
                }
                queue.push_back((work.id.clone(), depth + 1));
                retrieved += 1;
                if self.config.record_limit != 0 && retrieved >= self.config.record_limit {
                    info!(
                        "record limit {} reached for citers of {}",
                        self.config.record_limit, paper_id
                    );
                    return;
                }
            }
            if !works_page.meta.has_next() {
                return;
            }
            page += 1;
            thread::sleep(self.config.page_delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RetryPolicy;
    use std::time::Duration;

    fn test_config(base_url: String) -> CrawlConfig {
        CrawlConfig {
            catalog_base_url: base_url,
            mailto: None,
            record_limit: 0,
            max_depth: 2,
            retry: RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::ZERO,
            },
            page_delay: Duration::ZERO,
            request_timeout: Duration::from_secs(5),
        }
    }

    fn mock_citers(
        server: &mut mockito::Server,
        work_id: &str,
        body: String,
        hits: usize,
    ) -> mockito::Mock {
        server
            .mock("GET", "/works")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("filter".into(), format!("cites:{work_id}")),
                mockito::Matcher::UrlEncoded("page".into(), "1".into()),
            ]))
            .with_body(body)
            .expect(hits)
            .create()
    }

    #[test]
    fn test_cancellation_preserves_registered_entities() {
        let mut server = mockito::Server::new();
        let config = test_config(server.url());
        let catalog = CatalogClient::new(&config).unwrap();
        let mut store = EntityStore::new();

        let cancel = CancelFlag::new();
        cancel.cancel();

        let outcome = Crawler::new(&catalog, &mut store, &config, cancel).run("W1");
        assert_eq!(outcome, CrawlOutcome::Cancelled);
    }

    #[test]
    fn test_record_limit_applies_per_logical_call() {
        let mut server = mockito::Server::new();
        let mut config = test_config(server.url());
        config.record_limit = 1;
        config.max_depth = 1;

        let root = server
            .mock("GET", "/works/W1")
            .with_body(r#"{"id": "W1"}"#)
            .create();
        let citers = mock_citers(
            &mut server,
            "W1",
            r#"{"results": [{"id": "W2"}, {"id": "W3"}], "meta": {"next_page": 2}}"#.to_string(),
            1,
        );

        let catalog = CatalogClient::new(&config).unwrap();
        let mut store = EntityStore::new();
        let outcome =
            Crawler::new(&catalog, &mut store, &config, CancelFlag::new()).run("W1");

        assert_eq!(outcome, CrawlOutcome::Completed);
        assert!(store.contains_paper("W2"));
        assert!(!store.contains_paper("W3"));
        assert_eq!(store.paper("W1").unwrap().cited_by, vec!["W2"]);
        root.assert();
        citers.assert();
    }

    #[test]
    fn test_cycle_terminates_with_single_expansion() {
        let mut server = mockito::Server::new();
        let config = test_config(server.url());

        let root = server
            .mock("GET", "/works/W1")
            .with_body(r#"{"id": "W1", "referenced_works": ["W2"]}"#)
            .create();
        // W1 and W2 cite each other
        let citers_one = mock_citers(
            &mut server,
            "W1",
            r#"{"results": [{"id": "W2"}], "meta": {}}"#.to_string(),
            1,
        );
        let citers_two = mock_citers(
            &mut server,
            "W2",
            r#"{"results": [{"id": "W1"}], "meta": {}}"#.to_string(),
            1,
        );

        let catalog = CatalogClient::new(&config).unwrap();
        let mut store = EntityStore::new();
        let mut crawler = Crawler::new(&catalog, &mut store, &config, CancelFlag::new());
        let outcome = crawler.run("W1");

        assert_eq!(outcome, CrawlOutcome::Completed);
        assert_eq!(crawler.visited().len(), 2);
        citers_one.assert();
        citers_two.assert();
        root.assert();
    }
}
