use std::process;

use anyhow::Context;
use clap::Parser;
use serde_json::json;
use tracing::instrument;
use treestore::{Item, ItemId, TreeStore};

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Display detailed information about an item")]
pub struct Show {
    /// Identifier of the item to display
    #[clap(value_parser = super::parse_id)]
    id: ItemId,

    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "pretty")]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

impl Show {
    #[instrument(level = "debug", skip(store))]
    pub fn run(self, store: &TreeStore) -> anyhow::Result<()> {
        let Some(item) = store.get_item(&self.id) else {
            eprintln!("Item {} not found", self.id);
            process::exit(1);
        };

        match self.output {
            OutputFormat::Pretty => Self::output_pretty(store, item),
            OutputFormat::Json => Self::output_json(store, item)?,
        }

        Ok(())
    }

    fn output_pretty(store: &TreeStore, item: &Item) {
        println!("# {}", item.id());
        println!("{}\n", item.label());

        let ancestors = store.ancestors(item.id());
        println!("{}", "Path".dim());
        if ancestors.is_empty() {
            match item.parent() {
                Some(parent) if !store.contains(parent) => {
                    println!("  {} (missing)", parent.to_string().warning());
                }
                Some(parent) => println!("  {} (cycle)", parent.to_string().warning()),
                None => println!("  {}", "(top level)".dim()),
            }
        } else {
            let path: Vec<String> = ancestors
                .iter()
                .rev()
                .map(|ancestor| ancestor.id().to_string())
                .collect();
            println!("  {}", path.join(" > "));
        }

        if !item.attributes().is_empty() {
            println!("\n{}", "Attributes".dim());
            for (name, value) in item.attributes() {
                println!("  {name}: {value}");
            }
        }

        let children: Vec<&Item> = store.children(item.id()).collect();
        println!("\n{} ({})", "Children".dim(), children.len());
        for child in children {
            println!("  {}  {}", child.id(), child.label());
        }
    }

    fn output_json(store: &TreeStore, item: &Item) -> anyhow::Result<()> {
        let ancestors: Vec<&ItemId> = store
            .ancestors(item.id())
            .into_iter()
            .map(Item::id)
            .collect();
        let children: Vec<&ItemId> = store.children(item.id()).map(Item::id).collect();
        let descendants = store.descendants(item.id()).len();

        let output = json!({
            "item": item,
            "ancestors": ancestors,
            "children": children,
            "descendant_count": descendants,
        });

        serde_json::to_writer_pretty(std::io::stdout(), &output)
            .context("failed to render json output")?;
        println!();
        Ok(())
    }
}
