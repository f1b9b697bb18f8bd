use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod batch;

#[derive(Parser)]
#[command(
    name = "clipper",
    about = "Clipper - Cut, normalize, upload and publish short audio clips from online videos",
    version,
    long_about = "A CLI tool that downloads a time range from a video URL, normalizes its loudness, uploads it to object storage and publishes it to a shared clip catalog. Progress is tracked per clip in a local JSON store."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Catalog token
    #[arg(long, global = true, env = "CLIPPER_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register a new clip without processing it
    New {
        /// Video URL
        url: String,

        /// Start time (`h:mm:ss`)
        #[arg(default_value = crate::clip::DEFAULT_START)]
        start: String,

        /// End time (`h:mm:ss`), until the end of the video if omitted
        end: Option<String>,
    },

    /// Download the time range of a pending clip
    Download {
        uid: String,
    },

    /// Normalize the loudness of a downloaded clip
    Normalize {
        uid: String,
    },

    /// Upload a normalized clip to object storage
    Upload {
        uid: String,
    },

    /// Publish an uploaded clip to the catalog
    Publish {
        uid: String,

        /// Category id, must already exist in the catalog
        category: String,

        /// Localized names as `locale:name`
        #[arg(required = true, value_name = "LOCALE:NAME")]
        names: Vec<String>,
    },

    /// Create, download, normalize and upload a clip in one go
    Generate {
        /// Video URL
        url: String,

        /// Start time (`h:mm:ss`)
        start: String,

        /// End time (`h:mm:ss`)
        end: Option<String>,

        /// Publish to this category afterwards
        #[arg(long, requires = "names")]
        category: Option<String>,

        /// Localized names as `locale:name`, used with --category
        #[arg(long = "name", value_name = "LOCALE:NAME")]
        names: Vec<String>,
    },

    /// Process a batch file, one clip per line
    Batch {
        /// Lines of `<url> <start> <end> <category> <locale:name>...`
        file: PathBuf,
    },

    /// Show one clip
    Info {
        uid: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List all local clips
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Manage catalog categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Show or locate the configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a category or replace its names
    Add {
        id: String,

        /// Localized names as `locale:name`
        #[arg(required = true, value_name = "LOCALE:NAME")]
        names: Vec<String>,
    },

    /// List catalog categories
    List,
}

#[derive(ValueEnum, Clone, Debug)]
pub enum OutputFormat {
    /// Plain text
    Text,
    /// JSON
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_new_defaults_start() {
        let cli = Cli::try_parse_from(["clipper", "new", "https://youtu.be/x"]).unwrap();
        match cli.command {
            Commands::New { start, end, .. } => {
                assert_eq!(start, "0:0:0");
                assert_eq!(end, None);
            }
            _ => panic!("expected new"),
        }
    }

    #[test]
    fn test_publish_requires_names() {
        assert!(Cli::try_parse_from(["clipper", "publish", "abc123", "moe"]).is_err());

        let cli = Cli::try_parse_from(["clipper", "publish", "abc123", "moe", "zh:绝叫", "en:Scary Scream"]).unwrap();
        match cli.command {
            Commands::Publish { names, .. } => assert_eq!(names.len(), 2),
            _ => panic!("expected publish"),
        }
    }

    #[test]
    fn test_generate_category_needs_names() {
        assert!(Cli::try_parse_from([
            "clipper", "generate", "https://youtu.be/x", "0:00:01", "0:00:02", "--category", "moe"
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "clipper", "generate", "https://youtu.be/x", "0:00:01", "0:00:02", "--category", "moe", "--name", "en:Hi",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate { category, names, .. } => {
                assert_eq!(category.as_deref(), Some("moe"));
                assert_eq!(names, vec!["en:Hi".to_string()]);
            }
            _ => panic!("expected generate"),
        }
    }
}
