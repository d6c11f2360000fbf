// ABOUTME: Command line argument definitions and parsing using Clap
// ABOUTME: Defines the templar CLI structure and its render, check and helpers subcommands

use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "templar")]
#[command(about = "Render Handlebars templates from files or URLs against JSON/YAML data")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Path to configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, help = "Disable colored output")]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a template against a data payload
    Render {
        #[arg(help = "Template path or http(s) URL")]
        template: String,

        #[arg(short, long, help = "Payload file (JSON or YAML), '-' for stdin")]
        data: Option<String>,

        #[arg(
            short = 'V',
            long = "var",
            help = "Set payload values (key=value, dotted keys nest)"
        )]
        vars: Vec<String>,

        #[arg(long, help = "Strip leading and trailing spaces and newlines")]
        trim: bool,

        #[arg(short, long, help = "Write output to a file instead of stdout")]
        output: Option<PathBuf>,

        #[arg(long, help = "Give up after this many seconds")]
        timeout: Option<u64>,
    },

    /// Resolve and compile a template without rendering it
    Check {
        #[arg(help = "Template path or http(s) URL")]
        template: String,
    },

    /// List the registered template helpers
    Helpers,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parse variables from key=value format
    pub fn parse_variables(vars: &[String]) -> anyhow::Result<HashMap<String, String>> {
        let mut variables = HashMap::new();

        for var in vars {
            if let Some((key, value)) = var.split_once('=') {
                if key.is_empty() {
                    return Err(anyhow::anyhow!("Variable name missing in '{}'", var));
                }
                variables.insert(key.to_string(), value.to_string());
            } else {
                return Err(anyhow::anyhow!(
                    "Invalid variable format '{}'. Expected 'key=value'",
                    var
                ));
            }
        }

        Ok(variables)
    }
}
