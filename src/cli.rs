use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// fomod-engine - headless driver for fomod package installers
#[derive(Parser)]
#[command(name = "fomod-engine")]
#[command(about = "Evaluate fomod installer packages and compose their output file trees")]
#[command(version)]
pub struct Cli {
    /// Log engine decisions (flag lookups, skipped steps, placed files)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check a package description and summarize its steps
    Validate {
        /// Path to the package description (JSON)
        model: PathBuf,
    },
    /// Run the wizard without user interaction and print the output tree
    Install {
        /// Path to the package description (JSON)
        model: PathBuf,

        /// Archive listing, one archive path per line
        #[arg(short, long)]
        archive: PathBuf,

        /// Host facts (JSON): file states and versions
        #[arg(long)]
        host: Option<PathBuf>,

        /// Check PLUGIN when step STEP is reached (repeatable)
        #[arg(short, long = "select", value_name = "STEP=PLUGIN", value_parser = parse_selection)]
        selections: Vec<(String, String)>,

        /// Print the install plan as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report whether an archive listing is an installer archive
    Inspect {
        /// Archive listing, one archive path per line
        archive: PathBuf,
    },
}

/// Parse `STEP=PLUGIN`
fn parse_selection(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((step, plugin)) if !step.trim().is_empty() && !plugin.trim().is_empty() => {
            Ok((step.trim().to_string(), plugin.trim().to_string()))
        }
        _ => Err(format!("expected STEP=PLUGIN, got {:?}", value)),
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["fomod-engine"]).is_err());
    }

    #[test]
    fn test_cli_validate_command() {
        let cli = Cli::try_parse_from(["fomod-engine", "validate", "/path/to/model.json"]).unwrap();
        match cli.command {
            Commands::Validate { model } => {
                assert_eq!(model.to_str().unwrap(), "/path/to/model.json");
            }
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_cli_install_with_selections() {
        let cli = Cli::try_parse_from([
            "fomod-engine",
            "install",
            "model.json",
            "--archive",
            "listing.txt",
            "--select",
            "Textures=4K",
            "-s",
            "Patches = Dawnguard Patch",
            "--json",
            "--verbose",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Install { selections, json, host, .. } => {
                assert!(json);
                assert!(host.is_none());
                assert_eq!(
                    selections,
                    vec![
                        ("Textures".to_string(), "4K".to_string()),
                        ("Patches".to_string(), "Dawnguard Patch".to_string()),
                    ]
                );
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_rejects_malformed_selection() {
        let result = Cli::try_parse_from([
            "fomod-engine",
            "install",
            "model.json",
            "--archive",
            "listing.txt",
            "--select",
            "Textures",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_install_requires_archive() {
        assert!(Cli::try_parse_from(["fomod-engine", "install", "model.json"]).is_err());
    }
}
