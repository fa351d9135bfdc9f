//! CLI module - Command-line interface definitions and handlers

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::cache::store::CacheStore;

/// runcache - inspect and maintain the cross-run test cache.
#[derive(Parser, Debug)]
#[command(name = "runcache")]
#[command(
    author,
    version,
    about,
    long_about = r#"runcache stores cross-run test data in a .runcache/ directory under the
project root, found by walking upward from the given start paths toward the
first directory containing a project marker file (Cargo.toml, pyproject.toml,
package.json, setup.py or tox.ini).

Test harnesses embed the library to persist and rerun their last failures;
this binary is the inspection and maintenance surface.

Examples:
    runcache show
    runcache show path/to/project
    runcache clear
    runcache --cache-dir /tmp/.runcache show
"#
)]
pub struct Cli {
    /// Explicit cache directory, bypassing project-root discovery.
    #[arg(
        long,
        global = true,
        value_name = "DIR",
        long_help = "Use DIR as the cache directory instead of resolving it from\n\
project markers. Handy for scripted setups and tests."
    )]
    pub cache_dir: Option<PathBuf>,

    /// Verbose mode (more diagnostics).
    #[arg(
        short,
        long,
        global = true,
        long_help = "Enable more detailed diagnostics on stderr, including\n\
corrupt-entry and root-discovery events."
    )]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump cache contents without touching them.
    #[command(
        long_about = "Print every decodable cache value and every managed file with its\n\
byte length, grouped under labeled sections.\n\n\
An empty cache prints 'cache is empty' and still exits 0.\n\n\
Example:\n\
  runcache show\n"
    )]
    Show {
        /// Start paths for project-root discovery (defaults to the current directory).
        #[arg(value_name = "PATH", num_args = 0..)]
        paths: Vec<PathBuf>,
    },

    /// Wipe the cache directory.
    #[command(
        long_about = "Remove the whole cache directory for the resolved project.\n\
It is recreated lazily on the next write, so this is safe to run at any time\n\
between test sessions.\n\n\
Example:\n\
  runcache clear\n"
    )]
    Clear {
        /// Start paths for project-root discovery (defaults to the current directory).
        #[arg(value_name = "PATH", num_args = 0..)]
        paths: Vec<PathBuf>,
    },
}

/// Initialize the tracing subscriber; `-v` raises the default filter.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "runcache=debug" } else { "runcache=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_store(cache_dir: Option<PathBuf>, paths: &[PathBuf]) -> CacheStore {
    match cache_dir {
        Some(dir) => CacheStore::new(dir),
        None => CacheStore::from_args(paths),
    }
}

/// Run the CLI with parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Show { paths } => {
            let store = open_store(cli.cache_dir, &paths);
            crate::cache::show::run_show(&store)
        }

        Commands::Clear { paths } => {
            let store = open_store(cli.cache_dir, &paths);
            store.clear().with_context(|| {
                format!("failed to clear cache at {}", store.cache_dir().display())
            })?;
            println!("cleared {}", store.cache_dir().display());
            Ok(())
        }
    }
}
