use super::{FileReport, ReportedMisspelling};
use anyhow::{Context, Result};
use colored::*;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonMisspelling<'a> {
    file: String,
    #[serde(flatten)]
    misspelling: &'a ReportedMisspelling,
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    files_checked: usize,
    total_errors: usize,
    incomplete_files: Vec<String>,
    errors: Vec<JsonMisspelling<'a>>,
}

/// Prints every report, in order, as text.
pub fn print_reports(reports: &[FileReport], colored_output: bool) {
    for report in reports {
        print_text_report(report, colored_output);
    }
}

fn print_text_report(report: &FileReport, colored_output: bool) {
    if report.misspellings.is_empty() {
        return;
    }

    let file_name = report.path.display().to_string();

    if colored_output {
        println!("\n{}", file_name.bold().underline());
    } else {
        println!("\n{}", file_name);
    }

    for error in &report.misspellings {
        let line_info = format!("{}:{}", error.line, error.column);

        if colored_output {
            println!(
                "  {} {} {} {}",
                line_info.blue().bold(),
                error.word.red().bold(),
                format!("[{}]", error.language).dimmed(),
                format_context(&error.context, &error.word, colored_output)
            );

            if !error.suggestions.is_empty() {
                let suggestions = error
                    .suggestions
                    .iter()
                    .map(|s| s.green().to_string())
                    .collect::<Vec<_>>()
                    .join(&", ".dimmed().to_string());
                println!("    {} {}", "→".dimmed(), suggestions);
            }
        } else {
            println!(
                "  {} {} [{}] {}",
                line_info, error.word, error.language, error.context
            );

            if !error.suggestions.is_empty() {
                println!("    → {}", error.suggestions.join(", "));
            }
        }
    }

    if !report.complete {
        let note = "  (checking timed out, results may be partial)";
        if colored_output {
            println!("{}", note.yellow());
        } else {
            println!("{}", note);
        }
    }
}

/// All reports as one JSON document.
pub fn reports_to_json(reports: &[FileReport]) -> Result<String> {
    let errors: Vec<JsonMisspelling> = reports
        .iter()
        .flat_map(|report| {
            report.misspellings.iter().map(move |misspelling| JsonMisspelling {
                file: report.path.display().to_string(),
                misspelling,
            })
        })
        .collect();

    let output = JsonOutput {
        files_checked: reports.len(),
        total_errors: errors.len(),
        incomplete_files: reports
            .iter()
            .filter(|r| !r.complete)
            .map(|r| r.path.display().to_string())
            .collect(),
        errors,
    };

    serde_json::to_string_pretty(&output).context("Failed to serialize report")
}

fn format_context(context: &str, word: &str, colored: bool) -> String {
    if colored {
        context.replace(word, &word.red().bold().to_string())
    } else {
        context.to_string()
    }
}

pub fn print_check_summary(total_errors: usize, files: &[impl AsRef<Path>], colored: bool) {
    println!();
    if total_errors == 0 {
        if colored {
            println!("{}", "✓ No spelling errors found!".green().bold());
        } else {
            println!("✓ No spelling errors found!");
        }
    } else {
        let error_word = if total_errors == 1 { "error" } else { "errors" };
        let file_word = if files.len() == 1 { "file" } else { "files" };
        if colored {
            println!(
                "{} {} {} found in {} {}",
                "✗".red().bold(),
                total_errors.to_string().red().bold(),
                error_word,
                files.len(),
                file_word
            );
        } else {
            println!(
                "✗ {} {} found in {} {}",
                total_errors,
                error_word,
                files.len(),
                file_word
            );
        }
    }
}
