use clap::Parser;
use tracing::instrument;
use treestore::{Item, ItemId, TreeStore};

use super::list::{OutputFormat, render_items};

#[derive(Debug, Parser)]
#[command(about = "List the direct children or all descendants of an item")]
pub struct Children {
    /// Identifier of the parent item
    #[clap(value_parser = super::parse_id)]
    id: ItemId,

    /// Include every descendant, in breadth-first order
    #[arg(long)]
    all: bool,

    /// Output format (default: table).
    #[arg(long, value_enum, default_value_t)]
    output: OutputFormat,

    /// Suppress headers and format rows for scripting.
    #[arg(long)]
    quiet: bool,
}

impl Children {
    #[instrument(level = "debug", skip(store))]
    pub fn run(self, store: &TreeStore) -> anyhow::Result<()> {
        if !store.contains(&self.id) {
            tracing::warn!(id = %self.id, "item not present");
        }

        let items: Vec<&Item> = if self.all {
            store.descendants(&self.id)
        } else {
            store.children(&self.id).collect()
        };

        render_items(&items, store, self.output, self.quiet)
    }
}
