//! datahub CLI - dataset metadata and bulk file transfer.

mod cli;

use clap::Parser;
use dialoguer::{Confirm, Input, Password};
use cli::{Cli, Commands, ConfigCommand, ConsoleProgress, ProgressUnit};
use datahub_lib::api::{ApiClient, DatasetSummary, NewDataset};
use datahub_lib::config::Settings;
use datahub_lib::cos::CosStore;
use datahub_lib::preview::Previewer;
use datahub_lib::progress::format_size;
use datahub_lib::store::{dataset_prefix, ObjectStore};
use datahub_lib::transfer::{
    download_by_prefix, download_by_url_list, upload_folder, DownloadReport, TransferFailure,
};
use datahub_lib::{DataHubError, Result};
use http_dl::Downloader;
use log::info;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Files listed by `info` before the remainder is summarized
const INFO_FILE_LIMIT: usize = 10;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(&cli.verbosity);

    let settings = Settings::open_default();
    info!("config_dir: {}", settings.dir().display());

    match cli.command {
        Commands::Config(command) => run_config(&settings, command),
        Commands::Login { username, password } => login(&settings, username, password).await,
        Commands::Logout => {
            settings.clear_token()?;
            println!("Logged out.");
            Ok(())
        }
        Commands::Whoami => whoami(&settings).await,
        Commands::List => list_datasets(&settings).await,
        Commands::Info { dataset_id } => dataset_info(&settings, &dataset_id).await,
        Commands::Create {
            name,
            author,
            description,
            format,
            robot_type,
            task_type,
            license,
        } => {
            let mut dataset = NewDataset::named(&name, &author);
            dataset.description = description;
            dataset.dataset_format = format.as_str().to_string();
            dataset.robot_type = robot_type;
            dataset.task_type = task_type;
            dataset.license = license;
            create_dataset(&settings, &dataset).await
        }
        Commands::Upload {
            dataset_id,
            folder,
            workers,
        } => upload(&settings, &dataset_id, &folder, workers).await,
        Commands::Download {
            dataset_id,
            output,
            workers,
        } => download(&settings, &dataset_id, &output, workers).await,
        Commands::Delete {
            dataset_id,
            yes,
            purge_files,
        } => delete(&settings, &dataset_id, yes, purge_files).await,
    }
}

/// `RUST_LOG` wins over `--verbosity`; `log` records are forwarded too.
fn setup_logging(verbosity: &str) {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => "debug",
        "info" => "info",
        "error" => "error",
        _ => "warn",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run_config(settings: &Settings, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Api { url: Some(url) } => {
            settings.set_api_url(&url)?;
            println!("API URL set to: {}", url.trim_end_matches('/'));
        }
        ConfigCommand::Api { url: None } => {
            println!("Current API URL: {}", settings.api_url()?);
        }
        ConfigCommand::Cos {
            secret_id,
            secret_key,
            region,
            bucket,
            endpoint,
        } => {
            let secret_id = value_or_prompt(secret_id, || prompt_text("COS Secret ID"))?;
            let secret_key = value_or_prompt(secret_key, || prompt_secret("COS Secret Key"))?;
            let bucket = value_or_prompt(bucket, || prompt_text("COS Bucket"))?;
            settings.set_cos(&secret_id, &secret_key, &region, &bucket, endpoint.as_deref())?;
            println!("COS configuration saved.");
        }
        ConfigCommand::Show => {
            let cos = settings.cos_config()?;
            let logged_in = settings.token()?.is_some();
            println!("{:<16} {}", "Config Dir", settings.dir().display());
            println!("{:<16} {}", "API URL", settings.api_url()?);
            println!("{:<16} {}", "Logged In", if logged_in { "Yes" } else { "No" });
            println!("{:<16} {}", "COS Region", or_not_set(&cos.region));
            println!("{:<16} {}", "COS Bucket", or_not_set(&cos.bucket));
            println!("{:<16} {}", "COS Endpoint", cos.endpoint_host);
            println!("{:<16} {}", "COS Secret ID", cos.masked_secret_id());
        }
    }
    Ok(())
}

fn or_not_set(value: &str) -> &str {
    if value.is_empty() {
        "(not set)"
    } else {
        value
    }
}

fn api_client(settings: &Settings) -> Result<ApiClient> {
    ApiClient::new(&settings.api_url()?, settings.token()?)
}

fn require_login(settings: &Settings) -> Result<()> {
    match settings.token()? {
        Some(_) => Ok(()),
        None => Err(DataHubError::Configuration(
            "Please login first: datahub login".to_string(),
        )),
    }
}

/// Fetch a dataset, printing `hint` when the API answers 404.
async fn fetch_dataset(client: &ApiClient, dataset_id: &str, hint: &str) -> Result<DatasetSummary> {
    match client.get_dataset(dataset_id).await {
        Ok(dataset) => Ok(dataset),
        Err(e) => {
            if e.is_not_found() {
                eprintln!("Dataset '{}' not found.", dataset_id);
                if !hint.is_empty() {
                    eprintln!("  {}", hint);
                }
            }
            Err(e)
        }
    }
}

fn prompt_error(e: dialoguer::Error) -> DataHubError {
    DataHubError::Io(std::io::Error::other(e.to_string()))
}

/// Use `value` when given, otherwise ask on the terminal
fn value_or_prompt<F>(value: Option<String>, ask: F) -> Result<String>
where
    F: FnOnce() -> Result<String>,
{
    match value {
        Some(value) => Ok(value),
        None => ask(),
    }
}

fn prompt_text(prompt: &str) -> Result<String> {
    Input::<String>::new()
        .with_prompt(prompt)
        .interact_text()
        .map_err(prompt_error)
}

/// Read a secret without echoing it
fn prompt_secret(prompt: &str) -> Result<String> {
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(prompt_error)
}

fn confirm(prompt: &str) -> Result<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(prompt_error)
}

async fn login(settings: &Settings, username: Option<String>, password: Option<String>) -> Result<()> {
    let username = value_or_prompt(username, || prompt_text("Username"))?;
    let password = value_or_prompt(password, || prompt_secret("Password"))?;

    let client = ApiClient::new(&settings.api_url()?, None)?;
    let token = client.login(&username, &password).await?;
    settings.set_token(&token)?;
    println!("Login successful!");
    Ok(())
}

async fn whoami(settings: &Settings) -> Result<()> {
    if settings.token()?.is_none() {
        println!("Not logged in.");
        return Ok(());
    }

    if api_client(settings)?.check_auth().await? {
        println!("Logged in and authenticated.");
    } else {
        println!("Token expired. Please login again.");
        settings.clear_token()?;
    }
    Ok(())
}

async fn list_datasets(settings: &Settings) -> Result<()> {
    let datasets = api_client(settings)?.list_datasets().await?;
    if datasets.is_empty() {
        println!("No datasets found.");
        return Ok(());
    }

    println!("{:<32} {:<32} {:<20} {:>12} {:>10}", "ID", "Name", "Author", "Size", "Downloads");
    for ds in &datasets {
        println!(
            "{:<32} {:<32} {:<20} {:>12} {:>10}",
            ds.id,
            ds.name,
            ds.author,
            ds.size.as_deref().unwrap_or(""),
            ds.downloads.unwrap_or(0)
        );
    }
    Ok(())
}

async fn dataset_info(settings: &Settings, dataset_id: &str) -> Result<()> {
    let client = api_client(settings)?;
    let ds = fetch_dataset(&client, dataset_id, "").await?;

    let description = ds.description.clone().unwrap_or_default();
    let description = if description.chars().count() > 100 {
        format!("{}...", description.chars().take(100).collect::<String>())
    } else {
        description
    };

    let rows = [
        ("ID", ds.id.clone()),
        ("Name", ds.name.clone()),
        ("Author", ds.author.clone()),
        ("Description", description),
        ("Format", ds.extra_text("datasetFormat")),
        ("Robot Type", ds.extra_text("robotType")),
        ("Task Type", ds.extra_text("taskType")),
        ("Size", ds.size.clone().unwrap_or_default()),
        ("Downloads", ds.downloads.unwrap_or(0).to_string()),
        ("Episodes", ds.extra_text("totalEpisodes")),
        ("Frames", ds.extra_text("totalFrames")),
        ("FPS", ds.extra_text("fps")),
        ("License", ds.extra_text("license")),
        ("Updated", ds.updated_at.clone().unwrap_or_default()),
    ];
    for (field, value) in rows {
        println!("{:<12} {}", field, value);
    }

    if !ds.files.is_empty() {
        println!("\nFiles ({}):", ds.files.len());
        for file in ds.files.iter().take(INFO_FILE_LIMIT) {
            println!("  - {}", file.relative_path());
        }
        if ds.files.len() > INFO_FILE_LIMIT {
            println!("  ... and {} more files", ds.files.len() - INFO_FILE_LIMIT);
        }
    }
    Ok(())
}

async fn create_dataset(settings: &Settings, dataset: &NewDataset) -> Result<()> {
    require_login(settings)?;
    let created = api_client(settings)?.create_dataset(dataset).await?;
    let id = if created.id.is_empty() { &dataset.id } else { &created.id };

    println!("Dataset created successfully!");
    println!("Dataset ID: {}", id);
    println!("\nTo upload files, run:\n  datahub upload {} /path/to/folder", id);
    Ok(())
}

fn print_failures(failures: &[TransferFailure]) {
    if failures.is_empty() {
        return;
    }
    eprintln!("{} file(s) failed:", failures.len());
    for failure in failures {
        eprintln!("  - {}: {}", failure.item, failure.error);
    }
}

async fn upload(settings: &Settings, dataset_id: &str, folder: &Path, workers: usize) -> Result<()> {
    require_login(settings)?;
    let cos = settings.cos_config()?;
    cos.validate()?;

    let client = api_client(settings)?;
    fetch_dataset(
        &client,
        dataset_id,
        &format!("Create it first: datahub create \"{}\" --author \"Your Name\"", dataset_id),
    )
    .await?;

    if folder.join(".git").exists() {
        println!("Note: .git directory detected and will be ignored.");
    }
    println!("Scanning folder: {}", folder.display());

    let store: Arc<dyn ObjectStore> = Arc::new(CosStore::new(&cos)?);
    let progress = Arc::new(ConsoleProgress::new("Uploading", ProgressUnit::Bytes));
    let report = upload_folder(
        store,
        Previewer::detect(),
        folder,
        dataset_id,
        workers,
        progress.clone(),
    )
    .await?;
    progress.finish();

    if report.records.is_empty() && report.failures.is_empty() {
        println!("No files found in the folder (after filtering).");
        return Ok(());
    }
    print_failures(&report.failures);

    println!("Updating dataset metadata...");
    client
        .upload_complete(dataset_id, &report.completion_request())
        .await?;

    println!(
        "Uploaded {} files ({} of {} discovered)",
        report.records.len(),
        format_size(report.uploaded_bytes()),
        format_size(report.discovered_bytes)
    );
    println!("View at: {}/datasets/{}", client.base_url(), dataset_id);
    Ok(())
}

async fn download(settings: &Settings, dataset_id: &str, output: &Path, workers: usize) -> Result<()> {
    let cos = settings.cos_config()?;
    let client = api_client(settings)?;
    let ds = fetch_dataset(&client, dataset_id, "").await?;
    println!("Downloading dataset: {}", if ds.name.is_empty() { dataset_id } else { ds.name.as_str() });

    let output_dir = output.join(dataset_id);
    tokio::fs::create_dir_all(&output_dir).await?;

    let report: DownloadReport = if cos.is_configured() {
        println!("Using COS SDK for download");
        let store: Arc<dyn ObjectStore> = Arc::new(CosStore::new(&cos)?);
        let progress = Arc::new(ConsoleProgress::new("Downloading", ProgressUnit::Bytes));
        let report = download_by_prefix(store, dataset_id, &output_dir, workers, progress.clone()).await;
        progress.finish();
        report?
    } else {
        if ds.files.is_empty() {
            println!("No files found for this dataset.");
            return Ok(());
        }
        println!("Using HTTP download (no COS credentials required)");
        let http = Arc::new(Downloader::with_default_timeout()?);
        let progress = Arc::new(ConsoleProgress::new("Downloading", ProgressUnit::Files));
        let report = download_by_url_list(http, ds.files, &output_dir, workers, progress.clone()).await;
        progress.finish();
        report?
    };

    print_failures(&report.failures);
    println!(
        "Downloaded {} files ({}) to: {}",
        report.completed.len(),
        format_size(report.bytes_written()),
        output_dir.display()
    );
    Ok(())
}

async fn delete(settings: &Settings, dataset_id: &str, yes: bool, purge_files: bool) -> Result<()> {
    require_login(settings)?;

    if !yes {
        let confirmed = confirm(&format!(
            "Are you sure you want to delete dataset '{}'?",
            dataset_id
        ))?;
        if !confirmed {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if purge_files {
        let store = CosStore::new(&settings.cos_config()?)?;
        let keys: Vec<String> = store
            .list_objects(&dataset_prefix(dataset_id))
            .await?
            .into_iter()
            .map(|obj| obj.key)
            .collect();
        store.delete_objects(&keys).await?;
        println!("Deleted {} stored objects from {}.", keys.len(), store.bucket());
    }

    api_client(settings)?.delete_dataset(dataset_id).await?;
    println!("Dataset '{}' deleted successfully!", dataset_id);
    Ok(())
}
