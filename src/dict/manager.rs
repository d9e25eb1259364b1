use crate::checker::dictionary::{parse_word_list, Dictionary};
use anyhow::{Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Section marker that precedes the word list in NetSpell dictionaries.
const WORDS_SECTION: &str = "[Words]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryInfo {
    pub language: String,
    pub path: PathBuf,
    pub word_count: usize,
    pub size_bytes: u64,
}

fn data_dir() -> Result<PathBuf> {
    crate::config::Config::data_dir().context("Failed to get data directory")
}

/// Installed `.dict` files in `dir`, sorted by language.
pub fn installed_dictionaries(dir: &Path) -> Result<Vec<DictionaryInfo>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) != Some("dict") {
            continue;
        }
        let Some(language) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        found.push(dictionary_info(language, &path)?);
    }

    found.sort_by(|a, b| a.language.cmp(&b.language));
    Ok(found)
}

pub fn dictionary_info(language: &str, path: &Path) -> Result<DictionaryInfo> {
    let size_bytes = fs::metadata(path)
        .with_context(|| format!("Failed to stat dictionary: {}", path.display()))?
        .len();
    let word_count = Dictionary::load_from_path(path)?.len();

    Ok(DictionaryInfo {
        language: language.to_string(),
        path: path.to_path_buf(),
        word_count,
        size_bytes,
    })
}

pub fn list_dictionaries() -> Result<()> {
    let data_dir = data_dir()?;
    let installed = installed_dictionaries(&data_dir)?;

    if installed.is_empty() {
        println!("{}", "No dictionaries installed.".yellow());
        println!(
            "Run {} to import a word list.",
            "livespell dict import FILE --language en_US".cyan()
        );
        return Ok(());
    }

    println!("{}", "Installed dictionaries:".bold());
    println!();

    for info in &installed {
        println!(
            "  {} {} ({}, {})",
            "✓".green(),
            info.language.cyan().bold(),
            format!("{} words", info.word_count).dimmed(),
            format!("{}KB", info.size_bytes / 1024).dimmed()
        );
    }

    println!();
    println!(
        "Data directory: {}",
        data_dir.display().to_string().dimmed()
    );

    Ok(())
}

pub fn show_info(language: &str) -> Result<()> {
    let dict_path = Dictionary::get_dictionary_path(language)?;

    if !dict_path.exists() {
        println!(
            "{} Dictionary for {} not found.",
            "✗".red().bold(),
            language.yellow()
        );
        println!(
            "Run {} to import one.",
            format!("livespell dict import FILE --language {}", language).cyan()
        );
        return Ok(());
    }

    match dictionary_info(language, &dict_path) {
        Ok(info) => {
            println!("{}", format!("Dictionary: {}", language).bold());
            println!("  Path: {}", info.path.display());
            println!("  Size: {} KB", info.size_bytes / 1024);
            println!("  Words: {}", info.word_count.to_string().yellow());
            println!("  Format: FST (Finite State Transducer)");
        }
        Err(e) => {
            println!("  {}: {:#}", "Error loading dictionary".red(), e);
        }
    }

    Ok(())
}

/// Words of a NetSpell/ISpell `.dic` file or a plain word list.
///
/// When a `[Words]` section is present only the lines after it count.
/// Affix flags after `/` are dropped.
pub fn dic_words(content: &str) -> Vec<String> {
    match content.lines().position(|l| l.trim() == WORDS_SECTION) {
        Some(idx) => {
            let rest: Vec<&str> = content.lines().skip(idx + 1).collect();
            parse_word_list(&rest.join("\n"))
        }
        None => parse_word_list(content),
    }
}

/// Imports `file` as an FST dictionary in `out_dir`, named after `language`
/// or else the file stem. Returns the written path.
pub fn import_dic(file: &Path, out_dir: &Path, language: Option<&str>) -> Result<PathBuf> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("Failed to read dictionary source: {}", file.display()))?;

    let name = match language {
        Some(language) => language.to_string(),
        None => file
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.trim_start_matches('_').to_string())
            .context("Cannot derive a language from the file name; pass --language")?,
    };

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .context("Invalid progress template")?,
    );
    pb.set_message("Building dictionary...");

    let words = dic_words(&content);
    debug!(source = %file.display(), words = words.len(), "importing dictionary");

    fs::create_dir_all(out_dir).context("Failed to create data directory")?;
    let dict_path = out_dir.join(format!("{}.dict", name));
    Dictionary::build_from_words(&words, &dict_path)?;

    pb.finish_and_clear();
    Ok(dict_path)
}

/// [`import_dic`] into the data directory, with progress output.
pub fn import(file: &Path, language: Option<&str>) -> Result<()> {
    let dict_path = import_dic(file, &data_dir()?, language)?;
    let info = dictionary_info(
        dict_path.file_stem().and_then(|s| s.to_str()).unwrap_or_default(),
        &dict_path,
    )?;

    println!(
        "{} Dictionary installed: {} ({} words)",
        "✓".green().bold(),
        dict_path.display().to_string().cyan(),
        info.word_count.to_string().yellow()
    );

    Ok(())
}
