use anyhow::Result;
use booknote::config::{Cli, Command, ListTarget, Paths};
use booknote::remote::notion::NotionClient;
use booknote::uploader::UploadError;
use booknote::{SyncError, Workspace};
use clap::{CommandFactory, Parser};
use tracing::debug;

const CREDENTIAL_HINT: &str = "[ERROR] There was an error during the upload, make sure your config \
information is correct by running: booknote list config";

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let paths = Paths::resolve(cli.config_dir.clone(), env_var);
    let mut workspace = Workspace::open(paths)?;

    match cli.command {
        Command::Config { name, value } => workspace.set_config(&name, &value)?,
        Command::SetStyle {
            element,
            variable,
            value,
        } => workspace.set_style(&element, &variable, &value)?,
        Command::Upload { all } => upload(&workspace, all)?,
        Command::List { file } => list(&workspace, &file)?,
    }

    Ok(())
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn upload(workspace: &Workspace, all: bool) -> Result<()> {
    let config = workspace.config(env_var);

    let result = workspace.sync(&config.kindle_location, !all, || {
        NotionClient::connect(&config.notion_token, &config.notion_page)
    });

    match result {
        Ok(outcome) => {
            println!(
                "Uploaded {} of {} highlights ({} new books, {} updated)",
                outcome.report.highlights,
                outcome.found,
                outcome.report.sections_created,
                outcome.report.sections_extended
            );
            Ok(())
        }
        Err(SyncError::Upload(UploadError::Credential(e))) => {
            debug!(error = %e, "Notion connection failed");
            eprintln!("{}", CREDENTIAL_HINT);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

fn list(workspace: &Workspace, file: &str) -> Result<()> {
    let Some(target) = ListTarget::from_name(file) else {
        eprintln!("[ERROR] Target file not valid.");
        let mut command = Cli::command();
        if let Some(list) = command.find_subcommand_mut("list") {
            let _ = list.print_help();
        }
        std::process::exit(1);
    };

    println!("{}", workspace.read_file(target)?);
    Ok(())
}
