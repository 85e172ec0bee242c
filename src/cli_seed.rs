//! Reseeds the location taxonomy table from the built-in dataset.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

mod cli_style;

use cli_style::{
    get_styles, print_counts, print_done, print_entry, print_failure, print_taxonomy_tree,
    print_title,
};
use location_server::location_store::{SqliteLocationStore, TaxonomyStore};
use location_server::locations::seed_taxonomy;
use location_server::taxonomy::{countries, format_for_display};

#[derive(Parser, Debug)]
#[command(styles=get_styles())]
struct CliArgs {
    /// Path to the SQLite database file. Created when missing.
    #[clap(long, default_value = "locations.db")]
    pub db_path: PathBuf,

    /// Print the seeded entries as a tree instead of one line per key.
    #[clap(long)]
    pub tree: bool,
}

fn run(args: &CliArgs) -> Result<()> {
    let store = SqliteLocationStore::new(&args.db_path)?;
    let previous = store.count_taxonomy()?;
    let entries = seed_taxonomy(&store)?;

    print_title("Location taxonomy");
    if args.tree {
        print_taxonomy_tree(&entries);
    } else {
        for entry in &entries {
            print_entry(&entry.location_key.to_string(), &format_for_display(&entry.location_key));
        }
    }

    print_title("Summary");
    let by_depth = |depth: usize| entries.iter().filter(|e| e.depth() == depth).count();
    print_counts(&[
        ("Countries", countries(&entries).len()),
        ("Cities", by_depth(2)),
        ("Neighborhoods", by_depth(3)),
        ("Replaced entries", previous),
        ("Stored entries", store.count_taxonomy()?),
    ]);
    print_done(&format!("Taxonomy seeded into {:?}", args.db_path));
    Ok(())
}

fn main() {
    let args = CliArgs::parse();
    if let Err(err) = run(&args) {
        print_failure(&format!("{:#}", err));
        std::process::exit(1);
    }
}
