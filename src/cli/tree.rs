use std::{collections::HashSet, ptr};

use clap::Parser;
use tracing::instrument;
use treestore::{Item, ItemId, TreeStore};

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Render the hierarchy as an indented tree")]
pub struct Tree {
    /// Render only the subtree below this item (default: all top-level items)
    #[clap(value_parser = super::parse_id)]
    id: Option<ItemId>,

    /// Maximum depth to render (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    depth: usize,
}

impl Tree {
    #[instrument(level = "debug", skip(store))]
    pub fn run(self, store: &TreeStore) {
        let lines = match &self.id {
            Some(id) => match store.get_item(id) {
                Some(item) => render(store, [item], self.depth),
                None => Vec::new(),
            },
            None => render(store, store.roots(), self.depth),
        };

        for (depth, item) in lines {
            let indent = "  ".repeat(depth);
            println!("{indent}{} {}", item.id().to_string().dim(), item.label());
        }
    }
}

/// Depth-first, pre-order lines for the given starting items.
///
/// Records already printed are skipped, so cycles reachable from the starting
/// items do not recurse forever. Records are told apart by identity, not by
/// identifier, so duplicate identifiers each get their own line.
fn render<'a>(
    store: &'a TreeStore,
    starts: impl IntoIterator<Item = &'a Item>,
    max_depth: usize,
) -> Vec<(usize, &'a Item)> {
    let mut lines = Vec::new();
    let mut seen: HashSet<*const Item> = HashSet::new();
    let mut stack: Vec<(usize, &Item)> = starts.into_iter().map(|item| (0, item)).collect();
    stack.reverse();

    while let Some((depth, item)) = stack.pop() {
        if !seen.insert(ptr::from_ref(item)) {
            continue;
        }
        lines.push((depth, item));

        if max_depth != 0 && depth + 1 >= max_depth {
            continue;
        }
        let children: Vec<&Item> = store.children(item.id()).collect();
        for child in children.into_iter().rev() {
            stack.push((depth + 1, child));
        }
    }

    lines
}
