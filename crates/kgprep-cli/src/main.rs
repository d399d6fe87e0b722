//! kgprep CLI - prepare KG recommender inputs from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Show statistics about a dataset directory
//! kgprep stats data/movie
//!
//! # Split ratings and sample neighbors, writing text outputs
//! kgprep prepare --data-dir data --dataset movie -o out/movie --seed 42
//!
//! # Same, from a JSON config with overrides
//! kgprep prepare --config prep.json --neighbor-sample-size 16 -o out/movie
//!
//! # Pre-build the binary caches (fast loading)
//! kgprep cache data/movie
//! ```

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use indicatif::ProgressBar;
use kgprep_core::loader::{read_ratings_file, read_triples_file, DatasetFiles};
use kgprep_core::ndarray::Array2;
use kgprep_core::{
    count_entities, count_items, count_users, load_data, IsolatedEntityPolicy, KnowledgeGraph,
    PrepConfig, Rating, Triple,
};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kgprep")]
#[command(about = "Knowledge-graph recommender input preparation", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show statistics about a dataset directory
    Stats {
        /// Directory holding ratings_final.txt and kg_final.txt
        dir: PathBuf,
    },

    /// Split ratings and sample entity neighborhoods
    Prepare {
        /// JSON config file (fields not given fall back to defaults)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Root directory holding one directory per dataset
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Dataset directory name
        #[arg(long)]
        dataset: Option<String>,

        /// Train fraction
        #[arg(long)]
        train_ratio: Option<f64>,

        /// Eval fraction
        #[arg(long)]
        eval_ratio: Option<f64>,

        /// Neighbors sampled per entity
        #[arg(short = 'k', long)]
        neighbor_sample_size: Option<usize>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// What to do with entities that have no edges
        #[arg(long)]
        isolated: Option<IsolatedArg>,

        /// Ignore the binary cache
        #[arg(long)]
        no_cache: bool,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Parse text files and write binary caches
    #[cfg(feature = "binary")]
    Cache {
        /// Directory holding ratings_final.txt and kg_final.txt
        dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum IsolatedArg {
    /// Abort on the first entity without edges
    Fail,
    /// Fill its row with entity 0 / relation 0
    Sentinel,
}

impl From<IsolatedArg> for IsolatedEntityPolicy {
    fn from(arg: IsolatedArg) -> Self {
        match arg {
            IsolatedArg::Fail => Self::Fail,
            IsolatedArg::Sentinel => Self::Sentinel,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Stats { dir } => cmd_stats(&dir),
        Commands::Prepare {
            config,
            data_dir,
            dataset,
            train_ratio,
            eval_ratio,
            neighbor_sample_size,
            seed,
            isolated,
            no_cache,
            output,
        } => {
            let mut cfg = match config {
                Some(path) => PrepConfig::from_json_file(&path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?,
                None => PrepConfig::default(),
            };
            if let Some(v) = data_dir {
                cfg.data_dir = v;
            }
            if let Some(v) = dataset {
                cfg.dataset = v;
            }
            if let Some(v) = train_ratio {
                cfg.train_ratio = v;
            }
            if let Some(v) = eval_ratio {
                cfg.eval_ratio = v;
            }
            if let Some(v) = neighbor_sample_size {
                cfg.neighbor_sample_size = v;
            }
            if let Some(v) = seed {
                cfg.seed = Some(v);
            }
            if let Some(v) = isolated {
                cfg.isolated_entity = v.into();
            }
            if no_cache {
                cfg.use_cache = false;
            }
            cmd_prepare(&cfg, &output)
        }
        #[cfg(feature = "binary")]
        Commands::Cache { dir } => cmd_cache(&dir),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_text(dir: &Path) -> Result<(Vec<Rating>, Vec<Triple>)> {
    let files = DatasetFiles::new(dir);
    let start = Instant::now();
    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Loading {}...", dir.display()));

    let ratings = read_ratings_file(files.ratings_text())
        .with_context(|| format!("Failed to load {}", files.ratings_text().display()))?;
    let triples = read_triples_file(files.kg_text())
        .with_context(|| format!("Failed to load {}", files.kg_text().display()))?;

    pb.finish_with_message(format!("Loaded in {:.2?}", start.elapsed()));
    Ok((ratings, triples))
}

fn cmd_stats(dir: &Path) -> Result<()> {
    let (ratings, triples) = load_text(dir)?;
    let entity_count = count_entities(&triples);
    let kg = KnowledgeGraph::from_triples_with_count(&triples, entity_count);
    let stats = kg.stats();
    let positives = ratings.iter().filter(|r| r.label > 0).count();

    println!("Dataset Statistics");
    println!("==================");
    println!("Ratings:        {}", ratings.len());
    println!("Positive:       {}", positives);
    println!("Users:          {}", count_users(&ratings));
    println!("Items:          {}", count_items(&ratings));
    println!("Entities:       {}", entity_count);
    println!("Relations:      {}", kg.relation_count());
    println!("Triples:        {}", stats.triple_count);
    println!("Isolated ids:   {}", kg.isolated_entities(entity_count).len());
    println!("Avg degree:     {:.2}", stats.avg_degree);
    println!("Max degree:     {}", stats.max_degree);

    Ok(())
}

fn cmd_prepare(config: &PrepConfig, output: &Path) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let start = Instant::now();
    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Preparing {}...", config.dataset_dir().display()));
    let data = load_data(config)
        .with_context(|| format!("Failed to prepare {}", config.dataset_dir().display()))?;
    pb.finish_with_message(format!("Prepared in {:.2?}", start.elapsed()));
    info!(summary = %data, "prepared");

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    write_ratings(&output.join("train.txt"), &data.split.train)?;
    write_ratings(&output.join("eval.txt"), &data.split.eval)?;
    write_ratings(&output.join("test.txt"), &data.split.test)?;
    write_matrix(&output.join("adj_entity.txt"), &data.adjacency.entities)?;
    write_matrix(&output.join("adj_relation.txt"), &data.adjacency.relations)?;

    println!("Users:          {}", data.user_count);
    println!("Entities:       {}", data.entity_count);
    println!("Relations:      {}", data.relation_count);
    println!(
        "Split:          {} / {} / {}",
        data.split.train.len(),
        data.split.eval.len(),
        data.split.test.len()
    );
    println!(
        "Adjacency:      {} x {}",
        data.adjacency.entity_count(),
        data.adjacency.sample_size()
    );
    if !data.adjacency.sentinel_rows.is_empty() {
        println!("Sentinel rows:  {}", data.adjacency.sentinel_rows.len());
    }
    println!("Wrote outputs to {}", output.display());
    Ok(())
}

fn write_ratings(path: &Path, ratings: &[Rating]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to write {}", path.display()))?;
    let mut w = BufWriter::new(file);
    for r in ratings {
        writeln!(w, "{}\t{}\t{}", r.user, r.item, r.label)?;
    }
    w.flush()?;
    Ok(())
}

fn write_matrix(path: &Path, matrix: &Array2<u32>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to write {}", path.display()))?;
    let mut w = BufWriter::new(file);
    for row in matrix.rows() {
        let line: Vec<String> = row.iter().map(u32::to_string).collect();
        writeln!(w, "{}", line.join(" "))?;
    }
    w.flush()?;
    Ok(())
}

#[cfg(feature = "binary")]
fn cmd_cache(dir: &Path) -> Result<()> {
    use kgprep_core::loader::cache;

    let (ratings, triples) = load_text(dir)?;
    let files = DatasetFiles::new(dir);

    let start = Instant::now();
    let pb = ProgressBar::new_spinner();
    pb.set_message(format!("Caching {}...", dir.display()));
    cache::write(files.ratings_cache(), &ratings)
        .with_context(|| format!("Failed to write {}", files.ratings_cache().display()))?;
    cache::write(files.kg_cache(), &triples)
        .with_context(|| format!("Failed to write {}", files.kg_cache().display()))?;
    pb.finish_with_message(format!("Cached in {:.2?}", start.elapsed()));

    println!(
        "Cached {} ratings and {} triples in {}",
        ratings.len(),
        triples.len(),
        dir.display()
    );
    Ok(())
}
