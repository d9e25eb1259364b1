use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{generate, Shell};
use livespell::cli::output::{self, OutputFormat};
use livespell::cli::{FileChecker, FileReport};
use livespell::{dict, Config};
use rayon::prelude::*;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "livespell")]
#[command(version, about = "Incremental, multi-language spell checker", long_about = None)]
struct Cli {
    /// Files to check
    #[arg(value_name = "FILES")]
    files: Vec<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Exit with code 0 even if errors are found
    #[arg(long)]
    no_fail: bool,

    /// Languages in priority order, e.g. "en_US;fr_FR" ('#' disables one)
    #[arg(short, long, value_name = "LANGS")]
    languages: Option<String>,

    /// Output format (text, json)
    #[arg(short = 'o', long, default_value = "text")]
    format: OutputFormat,

    /// Add words to personal dictionary
    #[arg(long)]
    add_to_dict: Vec<String>,

    /// Pattern to ignore (regex)
    #[arg(long)]
    ignore_pattern: Vec<String>,

    /// Personal dictionary file
    #[arg(long)]
    personal_dict: Option<PathBuf>,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,

    /// Log analysis passes to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Dictionary management
    Dict {
        #[command(subcommand)]
        action: DictCommands,
    },
}

#[derive(Parser, Debug)]
enum DictCommands {
    /// List installed dictionaries
    List,
    /// Show dictionary info
    Info {
        /// Language code
        language: String,
    },
    /// Import a NetSpell/ISpell .dic file or a plain word list
    Import {
        /// Dictionary source file
        file: PathBuf,
        /// Language code; defaults to the file name
        #[arg(short, long)]
        language: Option<String>,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env("LIVESPELL_LOG")
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Handle shell completion generation
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "livespell", &mut io::stdout());
        return Ok(());
    }

    // Handle subcommands
    if let Some(command) = cli.command {
        return handle_command(command);
    }

    let config = Config::load(
        cli.languages.as_deref(),
        cli.personal_dict.clone(),
        cli.ignore_pattern.clone(),
    )?;

    let checker = FileChecker::new(&config)?;

    for word in &cli.add_to_dict {
        checker.personal_dictionary().add_word(word)?;
    }

    if cli.files.is_empty() {
        if !cli.add_to_dict.is_empty() {
            return Ok(());
        }
        anyhow::bail!("No files specified. Use --help for usage information.");
    }

    let colored = !cli.no_color;
    if !colored {
        colored::control::set_override(false);
    }

    let reports: Vec<FileReport> = cli
        .files
        .par_iter()
        .filter_map(|path| {
            if !path.exists() {
                eprintln!("Error: File not found: {}", path.display());
                return None;
            }
            match checker.check_file(path) {
                Ok(report) => Some(report),
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    None
                }
            }
        })
        .collect();

    let total_errors: usize = reports.iter().map(|r| r.misspellings.len()).sum();

    match cli.format {
        OutputFormat::Text => {
            output::print_reports(&reports, colored);
            output::print_check_summary(total_errors, &cli.files, colored);
        }
        OutputFormat::Json => println!("{}", output::reports_to_json(&reports)?),
    }

    if total_errors > 0 && !cli.no_fail {
        std::process::exit(1);
    }

    Ok(())
}

fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Dict { action } => match action {
            DictCommands::List => {
                dict::manager::list_dictionaries()?;
            }
            DictCommands::Info { language } => {
                dict::manager::show_info(&language)?;
            }
            DictCommands::Import { file, language } => {
                dict::manager::import(&file, language.as_deref())?;
            }
        },
    }
    Ok(())
}
