use anyhow::Context;
use clap::{Parser, ValueEnum};
use regex::Regex;
use serde::Serialize;
use tracing::instrument;
use treestore::{Item, TreeStore};

/// Command arguments for `tstore list`.
#[derive(Debug, Default, Parser)]
#[command(about = "List items in insertion order")]
pub struct List {
    /// Show only top-level items.
    #[arg(long)]
    roots: bool,

    /// Case-insensitive substring match against the label.
    #[arg(long, conflicts_with = "regex")]
    contains: Option<String>,

    /// Regular expression match against the label.
    #[arg(long)]
    regex: Option<String>,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Suppress headers and format rows for scripting.
    #[arg(long)]
    quiet: bool,
}

/// Output formats for item listings.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Clone)]
enum LabelFilter {
    Any,
    Contains(String),
    Regex(Regex),
}

impl LabelFilter {
    fn new(list: &List) -> anyhow::Result<Self> {
        if let Some(pattern) = &list.regex {
            let regex =
                Regex::new(pattern).with_context(|| format!("invalid regex '{pattern}'"))?;
            return Ok(Self::Regex(regex));
        }
        Ok(list
            .contains
            .as_ref()
            .map_or(Self::Any, |needle| Self::Contains(needle.to_lowercase())))
    }

    fn matches(&self, item: &Item) -> bool {
        match self {
            Self::Any => true,
            Self::Contains(needle) => item.label().to_lowercase().contains(needle),
            Self::Regex(regex) => regex.is_match(item.label()),
        }
    }
}

impl List {
    #[instrument(level = "debug", skip_all)]
    pub fn run(self, store: &TreeStore) -> anyhow::Result<()> {
        let filter = LabelFilter::new(&self)?;

        let items: Vec<&Item> = if self.roots {
            store.roots().filter(|item| filter.matches(item)).collect()
        } else {
            store.iter().filter(|item| filter.matches(item)).collect()
        };

        render_items(&items, store, self.output, self.quiet)
    }
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    #[serde(flatten)]
    item: &'a Item,
    children: usize,
}

/// Render a list of items as a table or as JSON.
pub fn render_items(
    items: &[&Item],
    store: &TreeStore,
    output: OutputFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    match output {
        OutputFormat::Table => {
            render_table(items, store, quiet);
            Ok(())
        }
        OutputFormat::Json => render_json(items, store),
    }
}

fn render_table(items: &[&Item], store: &TreeStore, quiet: bool) {
    let data: Vec<Vec<String>> = items
        .iter()
        .map(|item| {
            vec![
                item.id().to_string(),
                item.parent().map(ToString::to_string).unwrap_or_default(),
                item.label().to_string(),
                store.children(item.id()).count().to_string(),
            ]
        })
        .collect();

    if quiet {
        for row in data {
            println!("{}", row.join("\t"));
        }
        return;
    }

    let headers = ["ID", "PARENT", "LABEL", "CHILDREN"];

    // Determine column widths for alignment.
    let widths = headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            data.iter()
                .map(|row| row[idx].len())
                .max()
                .unwrap_or(0)
                .max(header.len())
        })
        .collect::<Vec<_>>();

    for (header, width) in headers.iter().zip(&widths) {
        print!("{header:<width$}  ");
    }
    println!();

    for width in &widths {
        print!("{:-<width$}  ", "");
    }
    println!();

    for row in data {
        for (value, width) in row.iter().zip(&widths) {
            print!("{value:<width$}  ");
        }
        println!();
    }
}

fn render_json(items: &[&Item], store: &TreeStore) -> anyhow::Result<()> {
    let rows: Vec<Row> = items
        .iter()
        .map(|&item| Row {
            item,
            children: store.children(item.id()).count(),
        })
        .collect();

    serde_json::to_writer_pretty(std::io::stdout(), &rows)
        .context("failed to render json output")?;
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(args: &[&str]) -> List {
        List::try_parse_from(std::iter::once("list").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn contains_filter_is_case_insensitive() {
        let filter = LabelFilter::new(&list(&["--contains", "ROOT"])).unwrap();

        assert!(filter.matches(&Item::root(1, "the root node")));
        assert!(!filter.matches(&Item::root(2, "leaf")));
    }

    #[test]
    fn regex_filter_matches_label() {
        let filter = LabelFilter::new(&list(&["--regex", "^Node-[0-9]+$"])).unwrap();

        assert!(filter.matches(&Item::root(1, "Node-12")));
        assert!(!filter.matches(&Item::root(2, "Node-x")));
    }

    #[test]
    fn invalid_regex_is_an_error() {
        assert!(LabelFilter::new(&list(&["--regex", "("])).is_err());
    }

    #[test]
    fn contains_and_regex_conflict() {
        let result = List::try_parse_from(["list", "--contains", "a", "--regex", "b"]);

        assert!(result.is_err());
    }
}
