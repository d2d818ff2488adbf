//! `minutes-md`: print the Markdown rendition of a saved minutes page.

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use minutes_md::{html_to_markdown, ClassStyleSheet, MarkdownSerializer, MinutesError, DEFAULT_CONTAINER_SELECTOR};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Reads an HTML page from FILE (or stdin) and prints its summary as Markdown.
#[derive(Parser, Debug)]
#[command(name = "minutes-md", version, about)]
struct Cli {
    /// CSS selector of the content container
    #[arg(short, long, default_value = DEFAULT_CONTAINER_SELECTOR)]
    selector: String,

    /// Treat elements with CLASS as having font-weight WEIGHT (repeatable)
    #[arg(short, long, value_name = "CLASS=WEIGHT")]
    bold_class: Vec<String>,

    /// Input file; stdin when absent or `-`
    input: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Minutes(#[from] MinutesError),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn read_input(input: Option<&Path>) -> Result<String, CliError> {
    match input.filter(|path| *path != Path::new("-")) {
        Some(path) => std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.display().to_string(),
            source,
        }),
        None => {
            let mut html = String::new();
            std::io::stdin()
                .read_to_string(&mut html)
                .map_err(|source| CliError::Read {
                    path: "stdin".to_string(),
                    source,
                })?;
            Ok(html)
        }
    }
}

fn stylesheet(rules: &[String]) -> Result<ClassStyleSheet, CliError> {
    let mut sheet = ClassStyleSheet::new();
    for rule in rules {
        sheet.parse_rule(rule)?;
    }
    Ok(sheet)
}

fn run(cli: Cli) -> Result<String, CliError> {
    let sheet = stylesheet(&cli.bold_class)?;
    let html = read_input(cli.input.as_deref())?;
    debug!(bytes = html.len(), selector = %cli.selector, "Read page");

    let serializer = MarkdownSerializer::with_resolver(sheet);
    Ok(html_to_markdown(&html, &cli.selector, &serializer)?)
}

fn enable_tracing() {
    tracing_subscriber::fmt()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    enable_tracing();

    match run(cli) {
        Ok(markdown) => {
            println!("{markdown}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("minutes-md: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minutes_md::{Node, StyleResolver};

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["minutes-md"]).unwrap();
        assert_eq!(cli.selector, DEFAULT_CONTAINER_SELECTOR);
        assert!(cli.input.is_none());
        assert!(cli.bold_class.is_empty());
    }

    #[test]
    fn test_bold_class_flag() {
        let cli = Cli::try_parse_from([
            "minutes-md",
            "--selector",
            "#summary",
            "--bold-class",
            "heavy=700",
            "-b",
            "loud=bold",
            "page.html",
        ])
        .unwrap();
        assert_eq!(cli.selector, "#summary");
        assert_eq!(cli.input, Some(PathBuf::from("page.html")));
        assert_eq!(cli.bold_class, vec!["heavy=700", "loud=bold"]);

        let sheet = stylesheet(&cli.bold_class).unwrap();
        assert!(sheet.is_bold(&Node::element_with_attrs("span", vec![("class", "heavy")])));
        assert!(sheet.is_bold(&Node::element_with_attrs("span", vec![("class", "loud")])));
    }

    #[test]
    fn test_parse_errors() {
        assert!(Cli::try_parse_from(["minutes-md", "--selector"]).is_err());
        assert!(Cli::try_parse_from(["minutes-md", "--stylesheet", "a=700"]).is_err());
        assert!(Cli::try_parse_from(["minutes-md", "a.html", "b.html"]).is_err());
    }

    #[test]
    fn test_malformed_bold_class() {
        let cli = Cli::try_parse_from(["minutes-md", "-b", "missing-weight", "page.html"]).unwrap();
        assert!(matches!(
            run(cli),
            Err(CliError::Minutes(MinutesError::InvalidInput(_)))
        ));
    }

    #[test]
    fn test_run_reads_file() {
        let path = std::env::temp_dir().join(format!("minutes-md-{}.html", std::process::id()));
        std::fs::write(
            &path,
            r#"<div id="summary"><div>Title</div><ul><li>one</li></ul></div>"#,
        )
        .unwrap();

        let cli = Cli::try_parse_from([
            "minutes-md",
            "-s",
            "#summary",
            path.to_str().unwrap(),
        ])
        .unwrap();
        let markdown = run(cli).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(markdown, "Title\n- one");
    }

    #[test]
    fn test_run_missing_file() {
        let cli = Cli::try_parse_from(["minutes-md", "/nonexistent/minutes.html"]).unwrap();
        assert!(matches!(run(cli), Err(CliError::Read { .. })));
    }
}
