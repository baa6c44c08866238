use clap::Parser;
use tracing::instrument;
use treestore::{ItemId, TreeStore};

use super::{CollectionFormat, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Remove items and their subtrees, then print the remaining items")]
pub struct Remove {
    /// Identifiers of the items to remove
    #[clap(required = true, value_parser = super::parse_id)]
    ids: Vec<ItemId>,

    /// Output format for the remaining items
    #[arg(long, value_enum, default_value_t)]
    format: CollectionFormat,
}

impl Remove {
    #[instrument(level = "debug", skip(store))]
    pub fn run(self, mut store: TreeStore) -> anyhow::Result<()> {
        let mut removed = 0;
        for id in &self.ids {
            let subtree = store.remove_item(id);
            tracing::info!(%id, count = subtree.len(), "removed subtree");
            removed += subtree.len();
        }

        eprintln!("{}", format!("Removed {removed} items").dim());

        self.format.print(&store)
    }
}
