#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use longcall::{
    audit, io, load_config_from_file, run_variations,
    model::DailyRoster,
    storage::{JsonStorage, Storage},
    summarize, PreparedBlock, TextSummary,
};
use std::fs;
use std::path::{Path, PathBuf};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI d'attribution des gardes tardives (long call)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Planning de jour : JSON, ou CSV `date,worker,service[,moonlighting][,source]`
    #[arg(long, global = true, default_value = "roster.json")]
    roster: String,

    /// CSV des workers `id,category[,excluded][,moonlighting]` (planning CSV)
    #[arg(long, global = true)]
    workers: Option<String>,

    /// Configuration JSON du bloc
    #[arg(long, global = true, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Produire une ou plusieurs variations
    Run {
        /// N variations, seeds 1..N
        #[arg(long, conflicts_with = "seeds")]
        variations: Option<u64>,
        /// liste "1,7,42"
        #[arg(long)]
        seeds: Option<String>,
        #[arg(long, default_value = "out")]
        out_dir: String,
    },

    /// Vérifier les règles dures d'un run sauvegardé
    Check {
        /// Fichier run-<seed>.json
        #[arg(long)]
        run: String,
        /// Export CSV des violations (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Afficher les stretches et week chunks
    Stretches,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let config = load_config_from_file(&cli.config)?;
    let roster = load_roster(&cli.roster, cli.workers.as_deref())?;
    let block = PreparedBlock::new(&roster, &config)?;

    let code = match cli.cmd {
        Commands::Run {
            variations,
            seeds,
            out_dir,
        } => {
            let seeds = match (variations, seeds) {
                (Some(n), _) => (1..=n).collect(),
                (None, Some(list)) => parse_seeds(&list)?,
                (None, None) => vec![config.seed],
            };
            if seeds.is_empty() {
                bail!("no seed to run");
            }
            let outputs = run_variations(&block, config.options(), &seeds)?;

            let dir = PathBuf::from(out_dir);
            fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
            for output in &outputs {
                let seed = output.seed;
                JsonStorage::for_seed(&dir, seed).save(output)?;
                io::export_assignments_csv(dir.join(format!("assignments-{seed}.csv")), output)?;
                io::export_flags_csv(dir.join(format!("flags-{seed}.csv")), &output.flags)?;
                io::export_stats_csv(dir.join(format!("stats-{seed}.csv")), output)?;
            }
            print!("{}", summarize(&outputs, &TextSummary));
            0
        }
        Commands::Check { run, report } => {
            let output = JsonStorage::open(&run)?.load()?;
            let violations = audit(&block, &config.options(), &output.assignments);
            if violations.is_empty() {
                println!("OK: no violations");
                0
            } else {
                eprintln!("Found {} violation(s)", violations.len());
                for v in &violations {
                    eprintln!("{v}");
                }
                if let Some(path) = report {
                    io::export_violations_csv(path, &violations)?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Stretches => {
            let index = block.stretches();
            for stretch in index.stretches() {
                println!(
                    "{} | {} | {} → {} | {:?}{}",
                    stretch.id,
                    stretch.worker,
                    stretch.start(),
                    stretch.end(),
                    stretch.kind,
                    if stretch.moonlighting { " | moonlighting" } else { "" }
                );
                for chunk in stretch.chunks.iter().map(|c| index.chunk(*c)) {
                    println!("    {} | {} | {} → {}", chunk.id, chunk.week, chunk.start(), chunk.end());
                }
            }
            0
        }
    };

    std::process::exit(code);
}

fn load_roster(path: &str, workers: Option<&str>) -> Result<DailyRoster> {
    let is_csv = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv {
        return io::load_roster_json(path);
    }
    let Some(workers) = workers else {
        bail!("--workers is required with a CSV roster");
    };
    let workers = io::import_workers_csv(workers)?;
    io::import_roster_csv(path, workers)
}

fn parse_seeds(list: &str) -> Result<Vec<u64>> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u64>().with_context(|| format!("invalid seed: {s}")))
        .collect()
}
