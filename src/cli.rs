//! Implementation of the rigging command-line interface.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::config;
use crate::import::{import_mapped_secrets, import_secret_document};
use crate::resolver::KeyMapping;
use crate::settings::{AppEnv, LocalstackSettings};

/// Command-line arguments for the rigging binary.
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
#[clap(propagate_version = true)]
pub struct Args {
    /// Commands supported by the CLI.
    #[clap(subcommand)]
    pub command: Commands,
}

/// Commands supported by the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve remote secrets into a configuration tree and print it.
    Import {
        /// Hosting environment the import runs as.
        #[clap(long, env = "APP_ENV", default_value = "development")]
        env: AppEnv,

        /// Name of a secret holding a JSON configuration document. Without
        /// it, secrets are imported individually through the mapping.
        #[clap(short, long)]
        secret_name: Option<String>,

        /// Mapping entry `from=to`: alias to secret name or ARN, or raw key
        /// to configuration key. Repeatable.
        #[clap(short, long = "map", value_parser = parse_mapping)]
        map: Vec<(String, String)>,
    },
}

impl Args {
    /// Run the action corresponding to this CLI command.
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Import {
                env,
                secret_name,
                map,
            } => run_import(env, secret_name, map).await,
        }
    }
}

fn parse_mapping(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((from, to)) if !from.is_empty() && !to.is_empty() => {
            Ok((from.to_string(), to.to_string()))
        }
        _ => Err(format!("expected `from=to`, got {raw:?}")),
    }
}

async fn run_import(
    env: AppEnv,
    secret_name: Option<String>,
    map: Vec<(String, String)>,
) -> Result<()> {
    let localstack = LocalstackSettings::from_env()?;
    let mapping: KeyMapping = map.into_iter().collect();

    let entries = match secret_name {
        Some(name) => import_secret_document(env, localstack, &name, mapping).await?,
        None => import_mapped_secrets(env, localstack, mapping).await?,
    };

    let mut tree = Value::Object(Default::default());
    config::apply_entries(&mut tree, &entries);
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}
