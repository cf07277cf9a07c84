// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Repocite CLI - citation and contribution knowledge graph for your
//! repository ecosystem

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use repocite::commands;
use repocite::config::CrawlConfig;
use repocite::fetch::RetryPolicy;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "repocite")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the citation and contribution graph for a repository
    Collect {
        /// GitHub repository URL (https://github.com/<owner>/<name>)
        repo_url: String,

        /// Contact email sent to the citation catalog for courtesy rate limits
        #[arg(long, env = "OPENALEX_EMAIL")]
        email: Option<String>,

        /// Records to retrieve per paginated call (0 = all)
        #[arg(long, env = "RECORD_LIMIT", default_value_t = 0)]
        record_limit: usize,

        /// Maximum depth for citation traversal
        #[arg(long, env = "MAX_DEPTH", default_value_t = 2)]
        max_depth: u32,

        /// Output file for the graph snapshot
        #[arg(short, long, default_value = "output_data.json")]
        output: PathBuf,

        /// GitHub personal access token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,

        /// Citation catalog API base URL
        #[arg(long, env = "OPENALEX_API_URL", default_value = "https://api.openalex.org")]
        catalog_api: String,

        /// GitHub API base URL
        #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
        github_api: String,

        /// Attempts per remote call before giving up
        #[arg(long, default_value_t = 3)]
        max_retries: u32,

        /// Base delay in seconds for exponential backoff
        #[arg(long, default_value_t = 5)]
        retry_delay: u64,
    },

    /// Find the citation DOI for a repository
    Resolve {
        /// GitHub repository URL (https://github.com/<owner>/<name>)
        repo_url: String,

        /// GitHub personal access token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,

        /// GitHub API base URL
        #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
        github_api: String,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Execute command
    match cli.command {
        Commands::Collect {
            repo_url,
            email,
            record_limit,
            max_depth,
            output,
            github_token,
            catalog_api,
            github_api,
            max_retries,
            retry_delay,
        } => {
            let config = CrawlConfig {
                catalog_base_url: catalog_api,
                mailto: email,
                record_limit,
                max_depth,
                retry: RetryPolicy {
                    max_attempts: max_retries,
                    base_delay: Duration::from_secs(retry_delay),
                },
                ..CrawlConfig::default()
            };
            commands::collect::run(&commands::collect::CollectOptions {
                repo_url,
                output,
                github_base_url: github_api,
                github_token,
                config,
            })
        }
        Commands::Resolve {
            repo_url,
            github_token,
            github_api,
        } => commands::resolve::run(
            &repo_url,
            &github_api,
            github_token.as_deref(),
            &CrawlConfig::default(),
        ),
        Commands::Completions { shell } => {
            commands::completions::run(shell, &mut Cli::command())
        }
    }
}
