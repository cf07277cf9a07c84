// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Deduplicating entity registries

use crate::types::{Institution, Paper, Person, Project, Snapshot, Topic};
use std::collections::HashMap;

/// Insertion-ordered registries, one per entity kind.
///
/// Backing vectors keep first-seen order so repeated runs over identical
/// input produce identical output documents; the index maps guarantee a
/// single node per identifier.
#[derive(Debug, Default)]
pub struct EntityStore {
    papers: Vec<Paper>,
    paper_index: HashMap<String, usize>,
    people: Vec<Person>,
    person_index: HashMap<String, usize>,
    institutions: Vec<Institution>,
    institution_index: HashMap<String, usize>,
    topics: Vec<Topic>,
    topic_index: HashMap<String, usize>,
}

impl EntityStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a paper node already exists for this identifier
    #[must_use]
    pub fn contains_paper(&self, id: &str) -> bool {
        self.paper_index.contains_key(id)
    }

    /// Register a finished paper node; no-op if the identifier is taken
    pub fn insert_paper(&mut self, paper: Paper) {
        if self.paper_index.contains_key(&paper.id) {
            return;
        }
        self.paper_index.insert(paper.id.clone(), self.papers.len());
        self.papers.push(paper);
    }

    /// Look up a paper by identifier
    #[must_use]
    pub fn paper(&self, id: &str) -> Option<&Paper> {
        self.paper_index.get(id).map(|&index| &self.papers[index])
    }

    /// Mutable lookup, used to grow a paper's cited-by set
    pub fn paper_mut(&mut self, id: &str) -> Option<&mut Paper> {
        self.paper_index
            .get(id)
            .map(|&index| &mut self.papers[index])
    }

    /// Insert-or-get a person node.
    ///
    /// A new node starts with empty affiliation and authored-papers sets;
    /// an existing node is returned untouched (first-seen name wins) so the
    /// caller can append to its sets.
    pub fn upsert_person(
        &mut self,
        id: &str,
        name: Option<String>,
        orcid: Option<String>,
    ) -> &mut Person {
        if let Some(&index) = self.person_index.get(id) {
            return &mut self.people[index];
        }
        let index = self.people.len();
        self.people.push(Person {
            kind: "person".to_string(),
            id: id.to_string(),
            name,
            orcid,
            affiliations: Vec::new(),
            papers_authored: Vec::new(),
        });
        self.person_index.insert(id.to_string(), index);
        &mut self.people[index]
    }

    /// Insert an institution if absent; first-seen name wins
    pub fn upsert_institution(&mut self, id: &str, name: Option<String>) {
        if self.institution_index.contains_key(id) {
            return;
        }
        self.institution_index
            .insert(id.to_string(), self.institutions.len());
        self.institutions.push(Institution {
            kind: "institution".to_string(),
            id: id.to_string(),
            name,
        });
    }

    /// Insert a topic if absent; first-seen name wins
    pub fn upsert_topic(&mut self, id: &str, name: Option<String>) {
        if self.topic_index.contains_key(id) {
            return;
        }
        self.topic_index.insert(id.to_string(), self.topics.len());
        self.topics.push(Topic {
            kind: "topic".to_string(),
            id: id.to_string(),
            name,
        });
    }

    /// All registered papers, in first-seen order
    #[must_use]
    pub fn papers(&self) -> &[Paper] {
        &self.papers
    }

    /// All registered people, in first-seen order
    #[must_use]
    pub fn people(&self) -> &[Person] {
        &self.people
    }

    /// All registered institutions, in first-seen order
    #[must_use]
    pub fn institutions(&self) -> &[Institution] {
        &self.institutions
    }

    /// All registered topics, in first-seen order
    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Flatten the registries into the output document
    #[must_use]
    pub fn into_snapshot(self, projects: Vec<Project>) -> Snapshot {
        Snapshot {
            people: self.people,
            papers: self.papers,
            institutions: self.institutions,
            topics: self.topics,
            projects,
        }
    }
}
