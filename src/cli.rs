use std::{
    io,
    path::{Path, PathBuf},
};

mod add;
mod children;
mod list;
mod remove;
mod show;
mod terminal;
mod tree;
mod update;
mod validate;

use add::Add;
use anyhow::Context;
use children::Children;
use clap::{ArgAction, ValueEnum};
use list::List;
use remove::Remove;
use serde_json::Value;
use show::Show;
use tracing::instrument;
use tree::Tree;
use treestore::{
    Config, Format, ItemId, TreeStore,
    storage::{load_items, read_items, write_items},
};
use update::Update;
use validate::Validate;

/// Parse an item identifier from a command-line argument.
fn parse_id(s: &str) -> Result<ItemId, String> {
    s.parse().map_err(|e| format!("{e}"))
}

/// Parse a `KEY=VALUE` extension attribute.
///
/// The value is read as JSON when it parses (`3`, `true`, `[1, 2]`) and kept
/// as a plain string otherwise.
fn parse_attribute(s: &str) -> Result<(String, Value), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("missing attribute name in '{s}'"));
    }
    let value =
        serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Serialization of a whole collection written to stdout.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum CollectionFormat {
    #[default]
    Json,
    Yaml,
}

impl CollectionFormat {
    fn print(self, store: &TreeStore) -> anyhow::Result<()> {
        let format = match self {
            Self::Json => Format::Json,
            Self::Yaml => Format::Yaml,
        };
        write_items(std::io::stdout().lock(), &store.get_all(), format)
            .context("failed to write items")
    }
}

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Item collection to load (.json, .yaml or .yml; '-' reads JSON from
    /// stdin)
    #[arg(short, long, default_value = "items.json", global = true)]
    input: PathBuf,

    /// Store configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        let config = self.load_config()?;
        let store = open_store(&self.input, config)?;

        self.command
            .unwrap_or_else(|| Command::List(List::default()))
            .run(store)
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        self.config.as_ref().map_or_else(
            || Ok(Config::default()),
            |path| {
                Config::load(path)
                    .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))
            },
        )
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[instrument(level = "debug")]
fn open_store(input: &Path, config: Config) -> anyhow::Result<TreeStore> {
    let items = if input == Path::new("-") {
        read_items(io::stdin().lock(), Format::Json).context("failed to read items from stdin")?
    } else {
        load_items(input).with_context(|| format!("failed to load {}", input.display()))?
    };
    tracing::info!(count = items.len(), "building store");
    Ok(TreeStore::with_config(items, config))
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// List items (default)
    List(List),

    /// Show a single item with its parent chain and children
    Show(Show),

    /// List the children of an item
    Children(Children),

    /// Render the hierarchy as an indented tree
    Tree(Tree),

    /// Check for dangling parents, duplicate identifiers and cycles
    Validate(Validate),

    /// Add an item and print the resulting collection
    Add(Add),

    /// Update an item in place and print the resulting collection
    Update(Update),

    /// Remove items with their subtrees and print what remains
    Remove(Remove),
}

impl Command {
    fn run(self, store: TreeStore) -> anyhow::Result<()> {
        match self {
            Self::List(command) => command.run(&store)?,
            Self::Show(command) => command.run(&store)?,
            Self::Children(command) => command.run(&store)?,
            Self::Tree(command) => command.run(&store),
            Self::Validate(command) => command.run(&store)?,
            Self::Add(command) => command.run(store)?,
            Self::Update(command) => command.run(store)?,
            Self::Remove(command) => command.run(store)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use serde_json::json;
    use treestore::StoreError;

    use super::*;

    #[test]
    fn parses_integer_and_string_ids() {
        assert_eq!(parse_id("7").unwrap(), ItemId::Int(7));
        assert_eq!(parse_id("seven").unwrap(), ItemId::from("seven"));
    }

    #[test]
    fn defaults_to_list() {
        let cli = Cli::try_parse_from(["tstore", "--input", "tree.yaml"]).unwrap();

        assert_eq!(cli.input, PathBuf::from("tree.yaml"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let cli = Cli::try_parse_from(["tstore", "children", "3", "--all", "-vv"]).unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Some(Command::Children(_))));
    }

    #[test]
    fn attributes_parse_as_json_or_string() {
        assert_eq!(parse_attribute("weight=3").unwrap(), ("weight".to_string(), json!(3)));
        assert_eq!(parse_attribute("tags=[1,2]").unwrap().1, json!([1, 2]));
        assert_eq!(parse_attribute("color=red").unwrap().1, json!("red"));
        assert_eq!(parse_attribute("note=a=b").unwrap().1, json!("a=b"));
        assert!(parse_attribute("novalue").is_err());
        assert!(parse_attribute("=1").is_err());
    }

    #[test]
    fn config_file_governs_mutating_commands() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("items.json");
        std::fs::write(&input, r#"[{"id": 1, "label": "A"}]"#).unwrap();
        let config_path = dir.path().join("store.toml");
        Config::strict().save(&config_path).unwrap();

        let add_dangling = |config: Option<&Path>| {
            let mut args = vec![
                "tstore".to_string(),
                "--input".to_string(),
                input.display().to_string(),
            ];
            if let Some(path) = config {
                args.extend(["--config".to_string(), path.display().to_string()]);
            }
            args.extend(["add", "2", "B", "--parent", "42"].map(String::from));

            let cli = Cli::try_parse_from(args).unwrap();
            let mut store = open_store(&cli.input, cli.load_config().unwrap()).unwrap();
            let Some(Command::Add(add)) = cli.command else {
                panic!("expected the add command");
            };
            add.apply(&mut store).map(|()| store.len())
        };

        assert_eq!(add_dangling(None), Ok(2));
        assert_eq!(
            add_dangling(Some(config_path.as_path())),
            Err(StoreError::ParentNotFound {
                id: ItemId::Int(2),
                parent: ItemId::Int(42),
            })
        );
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::try_parse_from(["tstore", "--config", "/nonexistent/store.toml"]).unwrap();

        assert!(cli.load_config().is_err());
    }
}
