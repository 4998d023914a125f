//! Command-line definitions and terminal progress rendering

use clap::{Parser, Subcommand, ValueEnum};
use datahub_lib::progress::{format_size, ProgressSink};
use datahub_lib::transfer::DEFAULT_MAX_WORKERS;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Parser)]
#[command(name = "datahub")]
#[command(about = "Manage datasets and transfer their files to object storage")]
#[command(version)]
pub struct Cli {
    /// Log verbosity: debug, info, warn, error (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "warn")]
    pub verbosity: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Log in to the metadata API
    Login {
        /// Prompted for when omitted
        #[arg(short, long)]
        username: Option<String>,

        /// Prompted for without echo when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Remove the stored token
    Logout,

    /// Check login status
    Whoami,

    /// List all datasets
    List,

    /// Show dataset details
    Info { dataset_id: String },

    /// Create a new dataset (metadata only)
    Create {
        name: String,

        /// Author or organization name
        #[arg(short, long)]
        author: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(long = "format", value_enum, default_value_t = DatasetFormat::Lerobot)]
        format: DatasetFormat,

        #[arg(long, default_value = "")]
        robot_type: String,

        #[arg(long, default_value = "")]
        task_type: String,

        #[arg(long, default_value = "MIT")]
        license: String,
    },

    /// Upload a folder to a dataset
    Upload {
        dataset_id: String,
        folder: PathBuf,

        /// Number of parallel upload workers
        #[arg(short, long, default_value_t = DEFAULT_MAX_WORKERS)]
        workers: usize,
    },

    /// Download a dataset into `<output>/<dataset_id>`
    Download {
        dataset_id: String,

        #[arg(default_value = ".")]
        output: PathBuf,

        /// Number of parallel download workers
        #[arg(short, long, default_value_t = DEFAULT_MAX_WORKERS)]
        workers: usize,
    },

    /// Delete a dataset
    Delete {
        dataset_id: String,

        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,

        /// Also delete every stored object of the dataset
        #[arg(long)]
        purge_files: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show or set the API URL
    Api { url: Option<String> },

    /// Configure COS credentials
    Cos {
        /// Prompted for when omitted
        #[arg(long)]
        secret_id: Option<String>,

        /// Prompted for without echo when omitted
        #[arg(long)]
        secret_key: Option<String>,

        #[arg(long, default_value = "ap-shanghai")]
        region: String,

        /// Prompted for when omitted
        #[arg(long)]
        bucket: Option<String>,

        /// Endpoint host, defaults to cos.<region>.myqcloud.com
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Show current configuration
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatasetFormat {
    Lerobot,
    Corobot,
}

impl DatasetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetFormat::Lerobot => "lerobot",
            DatasetFormat::Corobot => "corobot",
        }
    }
}

/// How the progress total is measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressUnit {
    Bytes,
    Files,
}

const BAR_WIDTH: usize = 30;

/// Single-line progress bar on stderr
pub struct ConsoleProgress {
    label: String,
    unit: ProgressUnit,
    line_open: Mutex<bool>,
}

impl ConsoleProgress {
    pub fn new(label: &str, unit: ProgressUnit) -> Self {
        Self {
            label: label.to_string(),
            unit,
            line_open: Mutex::new(false),
        }
    }

    /// End the progress line
    pub fn finish(&self) {
        if let Ok(mut open) = self.line_open.lock() {
            if *open {
                eprintln!();
                *open = false;
            }
        }
    }

    fn amount(&self, value: u64) -> String {
        match self.unit {
            ProgressUnit::Bytes => format_size(value),
            ProgressUnit::Files => value.to_string(),
        }
    }

    /// Print a full line without tearing the bar
    fn print_line(&self, text: &str) {
        if let Ok(mut open) = self.line_open.lock() {
            if *open {
                eprintln!();
                *open = false;
            }
            eprintln!("{}", text);
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn update(&self, completed: u64, total: u64) {
        let ratio = if total == 0 {
            1.0
        } else {
            (completed as f64 / total as f64).min(1.0)
        };
        let filled = (ratio * BAR_WIDTH as f64).round() as usize;
        let bar = format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled));

        if let Ok(mut open) = self.line_open.lock() {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(
                stderr,
                "\r{} [{}] {:>3.0}% {} / {}",
                self.label,
                bar,
                ratio * 100.0,
                self.amount(completed),
                self.amount(total)
            );
            let _ = stderr.flush();
            *open = true;
        }
    }

    fn item_failed(&self, item: &str, error: &str) {
        self.print_line(&format!("Failed: {}: {}", item, error));
    }

    fn message(&self, text: &str) {
        self.print_line(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cos_credentials_may_be_left_for_the_prompt() {
        let cli = Cli::try_parse_from(["datahub", "config", "cos", "--region", "ap-beijing"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommand::Cos {
                secret_id,
                secret_key,
                region,
                bucket,
                endpoint,
            }) => {
                assert!(secret_id.is_none());
                assert!(secret_key.is_none());
                assert!(bucket.is_none());
                assert!(endpoint.is_none());
                assert_eq!(region, "ap-beijing");
            }
            _ => panic!("expected config cos"),
        }
    }

    #[test]
    fn cos_flags_are_still_accepted() {
        let cli = Cli::try_parse_from([
            "datahub",
            "config",
            "cos",
            "--secret-id",
            "AKID",
            "--secret-key",
            "key",
            "--bucket",
            "datahub-1250000000",
        ])
        .unwrap();
        let Commands::Config(ConfigCommand::Cos {
            secret_id,
            secret_key,
            bucket,
            region,
            ..
        }) = cli.command
        else {
            panic!("expected config cos");
        };
        assert_eq!(secret_id.as_deref(), Some("AKID"));
        assert_eq!(secret_key.as_deref(), Some("key"));
        assert_eq!(bucket.as_deref(), Some("datahub-1250000000"));
        assert_eq!(region, "ap-shanghai");
    }

    #[test]
    fn login_password_is_optional() {
        let cli = Cli::try_parse_from(["datahub", "login", "-u", "admin"]).unwrap();
        let Commands::Login { username, password } = cli.command else {
            panic!("expected login");
        };
        assert_eq!(username.as_deref(), Some("admin"));
        assert!(password.is_none());
    }
}
