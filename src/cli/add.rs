use clap::Parser;
use serde_json::Value;
use tracing::instrument;
use treestore::{Item, ItemId, StoreError, TreeStore};

use super::{CollectionFormat, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Add an item, then print the resulting collection")]
pub struct Add {
    /// Identifier of the new item
    #[clap(value_parser = super::parse_id)]
    id: ItemId,

    /// Label of the new item
    label: String,

    /// Parent identifier (default: top level)
    #[arg(long, short, value_parser = super::parse_id)]
    parent: Option<ItemId>,

    /// Extra attribute as KEY=VALUE; VALUE is read as JSON when it parses,
    /// otherwise as a string (repeatable)
    #[arg(long = "attr", value_parser = super::parse_attribute)]
    attributes: Vec<(String, Value)>,

    /// Output format for the resulting collection
    #[arg(long, value_enum, default_value_t)]
    format: CollectionFormat,
}

impl Add {
    #[instrument(level = "debug", skip(store))]
    pub fn run(self, mut store: TreeStore) -> anyhow::Result<()> {
        self.apply(&mut store)?;
        eprintln!("{}", format!("Added {}", self.id).success());
        self.format.print(&store)
    }

    pub(super) fn apply(&self, store: &mut TreeStore) -> Result<(), StoreError> {
        let item = self.attributes.iter().fold(
            Item::new(self.id.clone(), self.parent.clone(), self.label.clone()),
            |item, (name, value)| item.with_attribute(name.clone(), value.clone()),
        );
        store.add_item(item)
    }
}
