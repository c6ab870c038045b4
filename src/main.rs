mod fetch;
mod io;
mod parser;
mod record;
mod settings;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use parser::ProfilePage;
use record::UserRecord;
use settings::{RunArgs, TrackerArgs};

#[derive(Parser)]
#[command(
    name = "tracker_profiles",
    about = "Export Jira user profiles (details, sections, avatars) by scraping profile pages"
)]
struct Cli {
    #[command(flatten)]
    tracker: TrackerArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, parse and export every profile in the ID list
    Run(RunArgs),
    /// Parse a saved profile page and print the record as JSON
    Parse {
        /// Saved HTML of a profile page
        file: PathBuf,
        /// User ID the page belongs to
        #[arg(long)]
        id: String,
        /// URL the page came from (default: the profile URL for --id)
        #[arg(long)]
        url: Option<String>,
    },
    /// Print the profile URL that would be fetched for a user ID
    Url { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let timed = reports_timing(&cli.command);

    let result = match cli.command {
        Commands::Run(args) => run(&cli.tracker, args).await,
        Commands::Parse { file, id, url } => {
            let html = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let profile_url = match url {
                Some(u) => u,
                None => fetch::profile_url(&cli.tracker.server, &id)?.to_string(),
            };
            let page = ProfilePage {
                user_id: id,
                profile_url,
                html,
            };
            let record = parser::parse_profile(&page, &cli.tracker.server);
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Url { id } => {
            println!("{}", fetch::profile_url(&cli.tracker.server, &id)?);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if timed && elapsed.as_secs() >= 1 {
        eprintln!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run(tracker: &TrackerArgs, args: RunArgs) -> anyhow::Result<()> {
    let mut user_ids = io::read_user_ids(&args.ids)?;
    if let Some(n) = args.limit {
        user_ids.truncate(n);
    }
    if user_ids.is_empty() {
        println!("No user IDs in {}.", args.ids.display());
        io::write_records(&args.output, &[])?;
        println!("Output saved to: {}", args.output.display());
        return Ok(());
    }

    std::fs::create_dir_all(&args.avatars_dir)
        .with_context(|| format!("Failed to create {}", args.avatars_dir.display()))?;
    let avatars_dir = args
        .avatars_dir
        .canonicalize()
        .unwrap_or_else(|_| args.avatars_dir.clone());
    println!("Avatar directory: {}", avatars_dir.display());
    println!("Found {} user IDs to process\n", user_ids.len());

    let session = fetch::Session::new(&tracker.server, tracker.auth())?;

    // Phase 1: Fetch
    let t_fetch = Instant::now();
    let (pages, stats) = fetch::fetch_profiles(&session, &user_ids, args.delay).await?;
    println!(
        "Fetched {} pages ({} ok, {} auth required, {} errors) in {:.1}s",
        stats.total,
        stats.ok,
        stats.auth_walls,
        stats.errors,
        t_fetch.elapsed().as_secs_f64()
    );

    // Phase 2: Parse
    let t_parse = Instant::now();
    let mut records = parse_pages(&pages, &tracker.server)?;
    println!(
        "Parsed {} profiles in {:.1}s",
        records.len(),
        t_parse.elapsed().as_secs_f64()
    );

    // Phase 3: Avatars
    let saved =
        fetch::download_avatars(&session, &mut records, &avatars_dir, args.delay).await?;
    println!("Downloaded {} avatars", saved);

    io::write_records(&args.output, &records)?;

    println!("\nComplete! Processed {}/{} users", records.len(), user_ids.len());
    println!("Output saved to: {}", args.output.display());
    println!("Avatars saved to: {}", avatars_dir.display());
    Ok(())
}

/// Parse fetched pages on the rayon pool, keeping input order.
fn parse_pages(pages: &[ProfilePage], base_url: &str) -> anyhow::Result<Vec<UserRecord>> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let mut records = Vec::with_capacity(pages.len());
    for chunk in pages.chunks(500) {
        let parsed: Vec<UserRecord> = chunk
            .par_iter()
            .map(|page| parser::parse_profile(page, base_url))
            .collect();
        records.extend(parsed);
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(records)
}

/// `parse` and `url` print machine-readable output on stdout, so only a
/// full run reports its wall time.
fn reports_timing(command: &Commands) -> bool {
    matches!(command, Commands::Run(_))
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

// ── Tests ──
