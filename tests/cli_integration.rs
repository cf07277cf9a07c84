// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Integration tests for the repocite CLI commands

use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

/// Build a repocite command with a clean environment and scratch cwd
fn repocite(work_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("repocite").expect("binary builds");
    cmd.current_dir(work_dir.path())
        .env_remove("GITHUB_TOKEN")
        .env_remove("GITHUB_API_URL")
        .env_remove("OPENALEX_API_URL")
        .env_remove("OPENALEX_EMAIL")
        .env_remove("RECORD_LIMIT")
        .env_remove("MAX_DEPTH");
    cmd
}

#[test]
fn test_completions_generate() {
    let work_dir = TempDir::new().unwrap();
    repocite(&work_dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("repocite"));
}

#[test]
fn test_rejects_unrecognizable_repository_url() {
    let work_dir = TempDir::new().unwrap();
    repocite(&work_dir)
        .args(["resolve", "https://example.com/not/github"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a recognizable"));
}

#[test]
fn test_resolve_prints_doi() {
    let mut server = mockito::Server::new();
    let _contents = server
        .mock("GET", "/repos/o/r/contents")
        .with_body(format!(
            r#"[{{"name": "CITATION.cff", "download_url": "{}/raw/CITATION.cff"}}]"#,
            server.url()
        ))
        .create();
    let _citation = server
        .mock("GET", "/raw/CITATION.cff")
        .with_body("doi: 10.5555/demo\n")
        .create();

    let work_dir = TempDir::new().unwrap();
    repocite(&work_dir)
        .args([
            "resolve",
            "https://github.com/o/r",
            "--github-api",
            &server.url(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("10.5555/demo"));
}

#[test]
fn test_collect_writes_snapshot_document() {
    let mut server = mockito::Server::new();
    let base = server.url();

    // --- hosting platform ---
    let _details = server
        .mock("GET", "/repos/o/r")
        .with_body(
            json!({
                "name": "demo-repo",
                "description": "Demo",
                "license": {"name": "MIT"},
                "stargazers_count": 7,
                "forks_count": 1,
                "subscribers_count": 2,
                "language": "Rust",
                "created_at": "2024-01-01T00:00:00Z",
                "updated_at": "2024-06-01T00:00:00Z",
                "pushed_at": "2024-06-01T00:00:00Z"
            })
            .to_string(),
        )
        .create();
    let _contents = server
        .mock("GET", "/repos/o/r/contents")
        .with_body(format!(
            r#"[
                {{"name": "README.md", "download_url": "{base}/raw/README.md"}},
                {{"name": "CITATION.cff", "download_url": "{base}/raw/CITATION.cff"}}
            ]"#
        ))
        .create();
    let _citation = server
        .mock("GET", "/raw/CITATION.cff")
        .with_body("doi: 10.5555/demo\n")
        .create();
    let _contributors_one = server
        .mock("GET", "/repos/o/r/contributors")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_body(r#"[{"login": "alice"}]"#)
        .create();
    let _contributors_two = server
        .mock("GET", "/repos/o/r/contributors")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_body("[]")
        .create();
    let _issues = server
        .mock("GET", "/repos/o/r/issues")
        .with_body("[]")
        .create();
    let _pulls = server
        .mock("GET", "/repos/o/r/pulls")
        .with_body("[]")
        .create();
    let _languages = server
        .mock("GET", "/repos/o/r/languages")
        .with_body(r#"{"Rust": 1000}"#)
        .create();
    let _releases = server
        .mock("GET", "/repos/o/r/releases")
        .with_body("[]")
        .create();
    let _commits = server
        .mock("GET", "/repos/o/r/commits")
        .with_body("[]")
        .create();

    // --- citation catalog ---
    let _root = server
        .mock("GET", "/works/doi:10.5555/demo")
        .with_body(
            json!({
                "id": "W1",
                "title": "Root paper",
                "doi": "https://doi.org/10.5555/demo",
                "publication_date": "2024-02-01",
                "authorships": [
                    {"author": {"id": "A1", "display_name": "Ada"}, "institutions": []}
                ],
                "concepts": [],
                "referenced_works": []
            })
            .to_string(),
        )
        .create();
    let _backfill = server
        .mock("GET", "/works")
        .match_query(Matcher::UrlEncoded(
            "filter".into(),
            "authorships.author.id:A1".into(),
        ))
        .with_body(
            json!({"results": [{"id": "W1", "title": "Root paper"}], "meta": {"next_page": null}})
                .to_string(),
        )
        .create();
    let _citers = server
        .mock("GET", "/works")
        .match_query(Matcher::UrlEncoded("filter".into(), "cites:W1".into()))
        .with_body(r#"{"results": [], "meta": {"next_page": null}}"#)
        .create();

    let work_dir = TempDir::new().unwrap();
    let output = work_dir.path().join("graph.json");

    repocite(&work_dir)
        .args([
            "collect",
            "https://github.com/o/r",
            "--github-api",
            &base,
            "--catalog-api",
            &base,
            "--output",
            output.to_str().unwrap(),
            "--max-retries",
            "1",
            "--retry-delay",
            "0",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Snapshot written"));

    let document: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();

    for key in ["people", "papers", "institutions", "topics", "projects"] {
        assert!(document.get(key).is_some(), "missing collection {key}");
    }
    assert_eq!(document["papers"][0]["id"], "W1");
    assert_eq!(document["people"][0]["id"], "A1");
    assert_eq!(document["projects"][0]["name"], "demo-repo");
    assert_eq!(document["projects"][0]["num_contributors"], 1);
    assert_eq!(document["projects"][0]["language_percentages"]["Rust"], 100.0);
    assert_eq!(
        document["projects"][0]["documentation_files"]["CITATION.cff"],
        true
    );
}
