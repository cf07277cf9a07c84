// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Conversion of raw catalog records into canonical graph entities

use crate::catalog::Work;
use crate::store::EntityStore;
use crate::types::Paper;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Register one raw work record and every entity it mentions.
///
/// Idempotent: a record whose identifier is already present leaves the
/// store untouched, even if the raw payload differs (first seen wins).
/// People picked up from the author list are still appended to on later
/// records; topic and institution nodes are immutable once created.
pub fn register_work(store: &mut EntityStore, work: &Work) {
    if store.contains_paper(&work.id) {
        debug!("paper {} already registered", work.id);
        return;
    }

    let abstract_text = work
        .abstract_inverted_index
        .as_ref()
        .filter(|index| !index.is_empty())
        .map(reconstruct_abstract);

    let mut topics = Vec::new();
    for concept in &work.concepts {
        let Some(topic_id) = concept.id.as_deref() else {
            continue;
        };
        store.upsert_topic(topic_id, concept.display_name.clone());
        topics.push(topic_id.to_string());
    }

    let mut authors = Vec::new();
    for authorship in &work.authorships {
        let Some(author) = authorship.author.as_ref() else {
            continue;
        };
        let Some(author_id) = author.id.as_deref() else {
            continue;
        };

        // institutions first, so the person borrow below stays exclusive
        let mut affiliation_ids = Vec::new();
        for institution in &authorship.institutions {
            let Some(institution_id) = institution.id.as_deref() else {
                continue;
            };
            store.upsert_institution(institution_id, institution.display_name.clone());
            affiliation_ids.push(institution_id.to_string());
        }

        let person = store.upsert_person(
            author_id,
            author.display_name.clone(),
            author.orcid.clone(),
        );
        for affiliation_id in affiliation_ids {
            if !person.affiliations.contains(&affiliation_id) {
                person.affiliations.push(affiliation_id);
            }
        }
        if !person.papers_authored.contains(&work.id) {
            person.papers_authored.push(work.id.clone());
        }
        authors.push(author_id.to_string());
    }

    let mut references = Vec::new();
    for reference in &work.referenced_works {
        if !references.contains(reference) {
            references.push(reference.clone());
        }
    }

    store.insert_paper(Paper {
        kind: "paper".to_string(),
        id: work.id.clone(),
        title: work.title.clone(),
        doi: work.doi.clone(),
        publication_date: work.publication_date,
        abstract_text,
        authors,
        topics,
        references,
        cited_by: Vec::new(),
    });
}

/// Rebuild the plain-text abstract from an inverted index: invert to a
/// position -> word mapping, then join words in ascending position order.
#[must_use]
pub fn reconstruct_abstract(index: &HashMap<String, Vec<usize>>) -> String {
    let mut by_position = BTreeMap::new();
    for (word, positions) in index {
        for &position in positions {
            by_position.insert(position, word.as_str());
        }
    }
    by_position.into_values().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AuthorRef, Authorship, Concept, InstitutionRef};

    fn author(id: &str, name: &str, institutions: &[(&str, &str)]) -> Authorship {
        Authorship {
            author: Some(AuthorRef {
                id: Some(id.to_string()),
                display_name: Some(name.to_string()),
                orcid: None,
            }),
            institutions: institutions
                .iter()
                .map(|(inst_id, inst_name)| InstitutionRef {
                    id: Some(inst_id.to_string()),
                    display_name: Some(inst_name.to_string()),
                })
                .collect(),
        }
    }

    fn work(id: &str, authorships: Vec<Authorship>) -> Work {
        Work {
            id: id.to_string(),
            title: Some(format!("Work {id}")),
            doi: None,
            publication_date: None,
            abstract_inverted_index: None,
            concepts: vec![],
            authorships,
            referenced_works: vec![],
        }
    }

    #[test]
    fn test_reconstruct_abstract_orders_by_position() {
        let index = HashMap::from([
            ("Test".to_string(), vec![1]),
            ("paper".to_string(), vec![2]),
            ("abstract".to_string(), vec![3]),
        ]);
        assert_eq!(reconstruct_abstract(&index), "Test paper abstract");
    }

    #[test]
    fn test_repeated_words_fill_every_position() {
        let index = HashMap::from([
            ("the".to_string(), vec![0, 2]),
            ("graph".to_string(), vec![1, 3]),
        ]);
        assert_eq!(reconstruct_abstract(&index), "the graph the graph");
    }

    #[test]
    fn test_missing_index_means_no_abstract() {
        let mut store = EntityStore::new();
        register_work(&mut store, &work("W1", vec![]));
        assert!(store.paper("W1").unwrap().abstract_text.is_none());

        let mut empty_index = work("W2", vec![]);
        empty_index.abstract_inverted_index = Some(HashMap::new());
        register_work(&mut store, &empty_index);
        assert!(store.paper("W2").unwrap().abstract_text.is_none());
    }

    #[test]
    fn test_registration_is_idempotent() {
        let mut store = EntityStore::new();
        let record = work("W1", vec![author("A1", "Ada", &[])]);

        register_work(&mut store, &record);
        register_work(&mut store, &record);

        assert_eq!(store.papers().len(), 1);
        let person = &store.people()[0];
        assert_eq!(person.papers_authored, vec!["W1"]);
    }

    #[test]
    fn test_shared_author_is_merged_across_works() {
        let mut store = EntityStore::new();
        register_work(
            &mut store,
            &work("W1", vec![author("A1", "Ada", &[("I1", "Inst")])]),
        );
        register_work(
            &mut store,
            &work("W2", vec![author("A1", "Ada", &[("I1", "Inst")])]),
        );

        assert_eq!(store.people().len(), 1);
        assert_eq!(store.institutions().len(), 1);
        let person = &store.people()[0];
        assert_eq!(person.papers_authored, vec!["W1", "W2"]);
        assert_eq!(person.affiliations, vec!["I1"]);
    }

    #[test]
    fn test_bare_record_yields_empty_relationship_sets() {
        let mut store = EntityStore::new();
        register_work(&mut store, &work("W1", vec![]));

        let paper = store.paper("W1").unwrap();
        assert!(paper.authors.is_empty());
        assert!(paper.topics.is_empty());
        assert!(paper.references.is_empty());
        assert!(paper.cited_by.is_empty());
    }

    #[test]
    fn test_topics_and_references_are_deduplicated() {
        let mut store = EntityStore::new();
        let mut record = work("W1", vec![]);
        record.concepts = vec![
            Concept {
                id: Some("T1".to_string()),
                display_name: Some("Graphs".to_string()),
            },
            Concept {
                id: None,
                display_name: Some("skipped".to_string()),
            },
        ];
        record.referenced_works = vec!["W9".to_string(), "W9".to_string()];
        register_work(&mut store, &record);

        let paper = store.paper("W1").unwrap();
        assert_eq!(paper.topics, vec!["T1"]);
        assert_eq!(paper.references, vec!["W9"]);
    }
}
