use clap::Parser;
use serde_json::Value;
use tracing::instrument;
use treestore::{ItemId, ItemUpdate, TreeStore};

use super::{CollectionFormat, terminal::Colorize};

#[derive(Debug, Parser)]
#[command(about = "Update an item in place, then print the resulting collection")]
pub struct Update {
    /// Identifier of the item to update
    #[clap(value_parser = super::parse_id)]
    id: ItemId,

    /// Move the item under this parent
    #[arg(long, short, value_parser = super::parse_id, conflicts_with = "top_level")]
    parent: Option<ItemId>,

    /// Move the item to the top level
    #[arg(long)]
    top_level: bool,

    /// New label
    #[arg(long, short)]
    label: Option<String>,

    /// Extra attribute to set as KEY=VALUE (repeatable)
    #[arg(long = "attr", value_parser = super::parse_attribute)]
    attributes: Vec<(String, Value)>,

    /// Output format for the resulting collection
    #[arg(long, value_enum, default_value_t)]
    format: CollectionFormat,
}

impl Update {
    #[instrument(level = "debug", skip(store))]
    pub fn run(self, mut store: TreeStore) -> anyhow::Result<()> {
        store.update_item(self.to_update())?;
        eprintln!("{}", format!("Updated {}", self.id).success());
        self.format.print(&store)
    }

    fn to_update(&self) -> ItemUpdate {
        let mut update = ItemUpdate::new(self.id.clone());
        if self.top_level {
            update = update.parent(None);
        } else if let Some(parent) = &self.parent {
            update = update.parent(Some(parent.clone()));
        }
        if let Some(label) = &self.label {
            update = update.label(label.clone());
        }
        self.attributes
            .iter()
            .fold(update, |update, (name, value)| {
                update.attribute(name.clone(), value.clone())
            })
    }
}

#[cfg(test)]
mod tests {
    use treestore::{Config, Item, StoreError};

    use super::*;

    fn parse(args: &[&str]) -> Update {
        Update::try_parse_from(std::iter::once("update").chain(args.iter().copied())).unwrap()
    }

    fn store(config: Config) -> TreeStore {
        TreeStore::with_config(
            vec![
                Item::root(1, "A"),
                Item::child(2, 1, "B"),
                Item::child(3, 1, "C"),
            ],
            config,
        )
    }

    fn child_ids(store: &TreeStore, id: i64) -> Vec<ItemId> {
        store
            .children(&ItemId::Int(id))
            .map(|item| item.id().clone())
            .collect()
    }

    #[test]
    fn absent_flags_leave_fields_alone() {
        let update = parse(&["2", "--attr", "done=true"]).to_update();

        assert_eq!(update, ItemUpdate::new(2).attribute("done", true));
    }

    #[test]
    fn top_level_flag_moves_to_root() {
        let mut store = store(Config::default());

        store
            .update_item(parse(&["2", "--top-level"]).to_update())
            .unwrap();

        assert_eq!(store.get_item(&ItemId::Int(2)).unwrap().parent(), None);
        assert_eq!(store.roots().count(), 2);
        assert_eq!(child_ids(&store, 1), vec![ItemId::Int(3)]);
    }

    #[test]
    fn parent_and_top_level_conflict() {
        assert!(Update::try_parse_from(["update", "2", "--parent", "1", "--top-level"]).is_err());
    }

    #[test]
    fn label_reorder_follows_config() {
        let relabel = parse(&["2", "--label", "B2"]);

        let mut reordering = store(Config::default());
        reordering.update_item(relabel.to_update()).unwrap();
        assert_eq!(child_ids(&reordering, 1), vec![ItemId::Int(3), ItemId::Int(2)]);

        let mut stable = store(Config {
            reorder_on_label_change: false,
            ..Config::default()
        });
        stable.update_item(relabel.to_update()).unwrap();
        assert_eq!(child_ids(&stable, 1), vec![ItemId::Int(2), ItemId::Int(3)]);
    }

    #[test]
    fn strict_config_rejects_cycles() {
        let mut store = store(Config::strict());

        assert_eq!(
            store.update_item(parse(&["1", "--parent", "2"]).to_update()),
            Err(StoreError::Cycle {
                id: ItemId::Int(1),
                parent: ItemId::Int(2),
            })
        );
        assert_eq!(store.get_item(&ItemId::Int(1)).unwrap().parent(), None);
    }
}
