use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::instrument;
use treestore::{ItemId, TreeStore};

use super::terminal::Colorize;

#[derive(Debug, Parser)]
#[command(about = "Validate the structure of the item collection")]
pub struct Validate {
    /// Output format
    #[arg(long, value_name = "FORMAT", default_value = "table")]
    output: OutputFormat,

    /// Suppress all output except errors
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Default, Serialize)]
struct ValidationResult {
    dangling_parents: Vec<DanglingParent>,
    duplicate_ids: Vec<ItemId>,
    cycles: Vec<Vec<ItemId>>,
}

#[derive(Debug, Serialize)]
struct DanglingParent {
    id: ItemId,
    parent: ItemId,
}

impl ValidationResult {
    fn collect(store: &TreeStore) -> Self {
        let dangling_parents = store
            .dangling_parents()
            .into_iter()
            .filter_map(|item| {
                item.parent().map(|parent| DanglingParent {
                    id: item.id().clone(),
                    parent: parent.clone(),
                })
            })
            .collect();

        Self {
            dangling_parents,
            duplicate_ids: store.duplicate_ids().into_iter().cloned().collect(),
            cycles: store.cycles(),
        }
    }

    fn issue_count(&self) -> usize {
        self.dangling_parents.len() + self.duplicate_ids.len() + self.cycles.len()
    }
}

impl Validate {
    #[instrument(level = "debug", skip(store))]
    pub fn run(self, store: &TreeStore) -> anyhow::Result<()> {
        let result = ValidationResult::collect(store);

        match self.output {
            OutputFormat::Table => self.output_table(&result),
            OutputFormat::Json => Self::output_json(&result)?,
        }

        // Exit with appropriate code
        if result.issue_count() > 0 {
            std::process::exit(2);
        }

        Ok(())
    }

    fn output_table(&self, result: &ValidationResult) {
        if self.quiet {
            return;
        }

        if result.issue_count() == 0 {
            println!("{}", "✅ No issues found.".success());
            return;
        }

        println!(
            "{}",
            format!("⚠️  {} issues found:", result.issue_count()).warning()
        );

        for dangling in &result.dangling_parents {
            println!(
                "  {} {} → {}",
                "missing parent".dim(),
                dangling.id,
                dangling.parent
            );
        }

        for id in &result.duplicate_ids {
            println!("  {} {id}", "duplicate id".dim());
        }

        for cycle in &result.cycles {
            let members: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            println!("  {} {}", "cycle".dim(), members.join(", "));
        }
    }

    fn output_json(result: &ValidationResult) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(std::io::stdout(), result)
            .context("failed to render json output")?;
        println!();
        Ok(())
    }
}
