use crate::models::Category;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "lesson-planner")]
#[command(about = "Manage the activity catalog and print lesson plans")]
pub struct Cli {
    /// Project root holding games.json, uploads/ and the logo.
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
    /// YAML configuration file; defaults to <root>/lesson-planner.yaml when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the activity titles of every category.
    Titles,
    /// Print the full catalog, assigning ids to activities that lack one.
    List,
    /// Add an activity to a category.
    Add {
        #[arg(long, value_parser = parse_category)]
        category: Category,
        #[arg(long)]
        title: String,
        /// Explanation line; repeat for several lines.
        #[arg(long = "bullet", required = true)]
        bullets: Vec<String>,
        /// Image file to upload alongside the activity.
        #[arg(long)]
        image: Option<PathBuf>,
    },
    /// Delete an activity by id.
    Delete {
        #[arg(long)]
        category: String,
        #[arg(long)]
        id: String,
    },
    /// Build the lesson plan for one activity per category.
    Generate {
        #[arg(long)]
        warmup: Option<String>,
        #[arg(long)]
        main: Option<String>,
        #[arg(long)]
        cooldown: Option<String>,
        /// Where to write the artifact; defaults to the suggested file name.
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print the assembled document model instead of rendering it.
        #[arg(long, default_value_t = false)]
        model_only: bool,
    },
}

fn parse_category(value: &str) -> Result<Category, String> {
    value.parse()
}
