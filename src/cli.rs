// Skate Labels CLI binary

use std::path::PathBuf;
use clap::{Parser, Subcommand};
use anyhow::Result;

use skate_labels_lib::config::{self, PipelineConfig};
use skate_labels_lib::constants::{DEFAULT_PROJECT, PREVIEW_ELEMENT_LINES};
use skate_labels_lib::db::{label_sets, open_existing_db};
use skate_labels_lib::pipeline::{self, Outcome, PipelineFailure, PipelineReport, Preview, Rollback};

#[derive(Parser)]
#[command(name = "skate-labels")]
#[command(about = "Convert skating label CSVs into mapping files and label set versions", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a label CSV into mapping files and a new label_sets version
    Import {
        /// Path to the labels CSV (id,set_label,element_label[,color])
        csv_path: PathBuf,
        /// Validate and preview without making changes
        #[arg(long)]
        dry_run: bool,
        /// Skip the database update
        #[arg(long)]
        no_db: bool,
        /// Database path (default: backend/data/annotations.db)
        #[arg(long)]
        db_path: Option<PathBuf>,
        /// Directory holding the mapping files (default: mapping)
        #[arg(long)]
        mapping_dir: Option<PathBuf>,
        /// Project name for the database update
        #[arg(long, default_value = DEFAULT_PROJECT)]
        project: String,
        /// List every category
        #[arg(short, long)]
        verbose: bool,
    },

    /// List stored label set versions for a project
    History {
        /// Database path (default: backend/data/annotations.db)
        #[arg(long)]
        db_path: Option<PathBuf>,
        /// Project name
        #[arg(long, default_value = DEFAULT_PROJECT)]
        project: String,
        /// Maximum versions to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Import { csv_path, dry_run, no_db, db_path, mapping_dir, project, verbose } => {
            let config = PipelineConfig {
                csv_path,
                mapping_dir: config::mapping_dir(mapping_dir),
                db_path: config::db_path(db_path),
                project,
                dry_run,
                skip_db: no_db,
            };
            cmd_import(&config, verbose)
        }
        Commands::History { db_path, project, limit } => cmd_history(config::db_path(db_path), &project, limit),
    }
}

fn cmd_import(config: &PipelineConfig, verbose: bool) -> Result<()> {
    println!("Processing CSV: {}", config.csv_path.display());
    println!("{}", "=".repeat(60));

    let report = match pipeline::run(config) {
        Ok(report) => report,
        Err(failure) => {
            print_failure(&failure);
            std::process::exit(1);
        }
    };

    println!("Found {} elements in {} categories", report.elements, report.categories());
    if verbose {
        for set in &report.sets {
            println!("  - {}: {} ({})", set.id, set.name, set.color);
        }
    }

    match &report.outcome {
        Outcome::Preview(preview) => print_preview(preview),
        Outcome::Persisted { .. } => print_persisted(&report),
    }

    Ok(())
}

fn print_failure(failure: &PipelineFailure) {
    println!();
    println!("ERROR during {}:", failure.stage);

    let problems = failure.problems();
    if problems.is_empty() {
        println!("  {}", failure.error);
    } else {
        for problem in problems {
            println!("  - {}", problem);
        }
    }

    match &failure.rollback {
        Rollback::NotNeeded => {}
        Rollback::Restored(touched) if touched.is_empty() => {}
        Rollback::Restored(touched) => {
            println!();
            println!("Rolled back mapping files:");
            for path in touched {
                println!("  {}", path.display());
            }
        }
        Rollback::Failed(failure) => {
            println!();
            println!("Rollback FAILED, mapping files may be inconsistent: {}", failure);
            for (path, e) in &failure.errors {
                println!("  ! {}: {}", path.display(), e);
            }
            for path in &failure.touched {
                println!("  restored {}", path.display());
            }
        }
    }
}

fn print_preview(preview: &Preview) {
    println!();
    println!("{}", "=".repeat(60));
    println!("DRY RUN MODE - No changes will be made");
    println!("{}", "=".repeat(60));

    println!();
    println!("[PREVIEW] {} (first {} lines):", preview.paths.element.display(), PREVIEW_ELEMENT_LINES);
    let (head, remaining) = preview.element_head(PREVIEW_ELEMENT_LINES);
    for line in head {
        println!("  {}", line);
    }
    if remaining > 0 {
        println!("  ... ({} more lines)", remaining);
    }

    println!();
    println!("[PREVIEW] {}:", preview.paths.set.display());
    for line in preview.contents.set.lines() {
        println!("  {}", line);
    }

    if let Some(ref db) = preview.database {
        println!();
        println!("[DRY RUN] Would update database:");
        println!("  Project:     {}", db.project);
        println!("  Items count: {}", db.items);
        println!("  Database:    {}", db.db_path.display());
        if let Some(ref sample) = db.sample_item {
            println!();
            println!("  Sample item:");
            for line in sample.lines() {
                println!("  {}", line);
            }
        }
    }

    println!();
    println!("Dry run completed successfully");
    println!("To apply changes, run without --dry-run");
}

fn print_persisted(report: &PipelineReport) {
    let Outcome::Persisted { paths, backups, db_update } = &report.outcome else {
        return;
    };

    println!();
    if backups.is_empty() {
        println!("No existing files to back up");
    }
    for entry in backups {
        println!("Created backup: {}", entry.backup.display());
    }
    println!("Generated: {}", paths.element.display());
    println!("Generated: {}", paths.set.display());

    match db_update {
        Some(update) => {
            println!();
            println!("Updated database:");
            println!("  Project: {}", update.project);
            println!("  Version: {}", update.version);
            println!("  Items:   {}", update.items);
        }
        None => {
            println!();
            println!("Skipped database update (--no-db)");
        }
    }

    println!();
    println!("{}", "=".repeat(60));
    println!("SUCCESS: Processed {} elements, {} categories", report.elements, report.categories());
    println!("{}", "=".repeat(60));

    if db_update.is_some() {
        println!();
        println!("Next steps:");
        println!("1. Restart the backend server to load new mapping files");
        println!("2. Verify changes in the web UI");
    }
}

fn cmd_history(db_path: PathBuf, project: &str, limit: i64) -> Result<()> {
    let conn = open_existing_db(&db_path)?;
    let versions = label_sets::list_versions(&conn, project, limit)?;

    println!("Project: {} ({})", project, db_path.display());
    println!();

    if versions.is_empty() {
        println!("No label set versions found. Use 'skate-labels import <csv>' to add one.");
        return Ok(());
    }

    println!("{:>7}  {:>6}  {:>20}  {}", "Version", "Items", "Updated by", "Mapping");
    println!("{}", "-".repeat(50));

    for v in versions {
        let items = v.item_count.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
        println!("{:>7}  {:>6}  {:>20}  {}",
            v.version,
            items,
            v.updated_by.as_deref().unwrap_or("-"),
            v.mapping_name.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}
