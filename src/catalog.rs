// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Citation catalog client (OpenAlex-style works API)

use crate::config::CrawlConfig;
use crate::fetch::{FetchClient, FetchError};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;

/// Catalog maximum page size
pub const PER_PAGE: u32 = 200;

/// Raw work record as returned by the catalog
#[derive(Debug, Clone, Deserialize)]
pub struct Work {
    /// Catalog identifier
    pub id: String,
    /// Title
    #[serde(default)]
    pub title: Option<String>,
    /// DOI
    #[serde(default)]
    pub doi: Option<String>,
    /// Publication date
    #[serde(default)]
    pub publication_date: Option<NaiveDate>,
    /// Word -> zero-based positions at which it occurs
    #[serde(default)]
    pub abstract_inverted_index: Option<HashMap<String, Vec<usize>>>,
    /// Associated concepts
    #[serde(default)]
    pub concepts: Vec<Concept>,
    /// Authorship entries
    #[serde(default)]
    pub authorships: Vec<Authorship>,
    /// Identifiers of works this one cites
    #[serde(default)]
    pub referenced_works: Vec<String>,
}

/// Concept attached to a work
#[derive(Debug, Clone, Deserialize)]
pub struct Concept {
    /// Catalog identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Display name
    #[serde(default)]
    pub display_name: Option<String>,
}

/// One author's contribution to a work
#[derive(Debug, Clone, Deserialize)]
pub struct Authorship {
    /// The author
    #[serde(default)]
    pub author: Option<AuthorRef>,
    /// Institutions listed for this authorship
    #[serde(default)]
    pub institutions: Vec<InstitutionRef>,
}

/// Author sub-document of an authorship entry
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorRef {
    /// Catalog identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Display name
    #[serde(default)]
    pub display_name: Option<String>,
    /// External scholar identifier
    #[serde(default)]
    pub orcid: Option<String>,
}

/// Institution sub-document of an authorship entry
#[derive(Debug, Clone, Deserialize)]
pub struct InstitutionRef {
    /// Catalog identifier
    #[serde(default)]
    pub id: Option<String>,
    /// Display name
    #[serde(default)]
    pub display_name: Option<String>,
}

/// One page of a paginated works query
#[derive(Debug, Clone, Deserialize)]
pub struct WorksPage {
    /// Records on this page
    #[serde(default)]
    pub results: Vec<Work>,
    /// Pagination metadata
    #[serde(default)]
    pub meta: PageMeta,
}

/// Pagination metadata reported by the catalog
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageMeta {
    /// Next page number, when a further page exists
    #[serde(default)]
    pub next_page: Option<u32>,
}

impl PageMeta {
    /// Whether the catalog reports a further page
    #[must_use]
    pub fn has_next(&self) -> bool {
        matches!(self.next_page, Some(page) if page > 0)
    }
}

/// Client for the citation catalog query service
pub struct CatalogClient {
    fetch: FetchClient,
    base_url: String,
    mailto: Option<String>,
}

impl CatalogClient {
    /// Build a catalog client from the crawl configuration
    pub fn new(config: &CrawlConfig) -> Result<Self, FetchError> {
        let fetch = FetchClient::new(config.request_timeout, config.retry.clone())?;
        Ok(Self {
            fetch,
            base_url: config.catalog_base_url.trim_end_matches('/').to_string(),
            mailto: config.mailto.clone(),
        })
    }

    fn courtesy(&self) -> Vec<(&'static str, String)> {
        self.mailto
            .iter()
            .map(|mailto| ("mailto", mailto.clone()))
            .collect()
    }

    /// Fetch a single work record by catalog identifier
    pub fn work(&self, work_id: &str) -> Result<Work, FetchError> {
        let url = format!("{}/works/{}", self.base_url, work_id);
        self.fetch.get_json(&url, &self.courtesy())
    }

    /// Fetch a single work record by DOI
    pub fn work_by_doi(&self, doi: &str) -> Result<Work, FetchError> {
        let url = format!("{}/works/doi:{}", self.base_url, doi);
        self.fetch.get_json(&url, &self.courtesy())
    }

    /// One page of works authored by the given person
    pub fn works_by_author(&self, author_id: &str, page: u32) -> Result<WorksPage, FetchError> {
        self.works_filtered(&format!("authorships.author.id:{author_id}"), page)
    }

    /// One page of works citing the given work
    pub fn works_citing(&self, work_id: &str, page: u32) -> Result<WorksPage, FetchError> {
        self.works_filtered(&format!("cites:{work_id}"), page)
    }

    fn works_filtered(&self, filter: &str, page: u32) -> Result<WorksPage, FetchError> {
        let url = format!("{}/works", self.base_url);
        let mut query = vec![
            ("filter", filter.to_string()),
            ("page", page.to_string()),
            ("per-page", PER_PAGE.to_string()),
        ];
        query.extend(self.courtesy());
        self.fetch.get_json(&url, &query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_meta_next_flag() {
        assert!(!PageMeta { next_page: None }.has_next());
        assert!(!PageMeta { next_page: Some(0) }.has_next());
        assert!(PageMeta { next_page: Some(2) }.has_next());
    }

    #[test]
    fn test_work_record_tolerates_sparse_payloads() {
        let work: Work = serde_json::from_str(r#"{"id": "W1"}"#).unwrap();
        assert_eq!(work.id, "W1");
        assert!(work.title.is_none());
        assert!(work.authorships.is_empty());
        assert!(work.referenced_works.is_empty());
    }

    #[test]
    fn test_works_citing_query_shape() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/works")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("filter".into(), "cites:W1".into()),
                mockito::Matcher::UrlEncoded("page".into(), "1".into()),
                mockito::Matcher::UrlEncoded("per-page".into(), "200".into()),
                mockito::Matcher::UrlEncoded("mailto".into(), "a@b.se".into()),
            ]))
            .with_body(r#"{"results": [{"id": "W2"}], "meta": {"next_page": null}}"#)
            .create();

        let config = CrawlConfig {
            catalog_base_url: server.url(),
            mailto: Some("a@b.se".to_string()),
            ..CrawlConfig::default()
        };
        let client = CatalogClient::new(&config).unwrap();
        let page = client.works_citing("W1", 1).unwrap();

        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].id, "W2");
        assert!(!page.meta.has_next());
        mock.assert();
    }
}
