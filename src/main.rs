use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use ferrous_ref::{NamingTable, ReferenceIndex, defaults, motif, regions};

#[derive(Parser)]
#[command(name = "ferrous-ref")]
#[command(about = "Random-access reader for Bowtie reference indexes", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbosity: 1=error, 2=warning, 3=message, 4=debug, 5+=trace
    #[arg(short = 'v', long, value_name = "INT", default_value_t = defaults::VERBOSITY, global = true)]
    verbosity: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List references with their sortable ordinal and length
    Names {
        /// Index prefix (PREFIX.1.ebwt, PREFIX.3.ebwt, PREFIX.4.ebwt)
        #[arg(value_name = "PREFIX")]
        index: PathBuf,
    },

    /// Print one stretch of a reference
    Fetch {
        #[arg(value_name = "PREFIX")]
        index: PathBuf,

        /// Reference name, matched exactly
        #[arg(value_name = "NAME")]
        reference: String,

        /// 0-based start offset
        #[arg(value_name = "OFFSET")]
        offset: u64,

        /// Number of bases
        #[arg(value_name = "LENGTH")]
        length: usize,
    },

    /// Print the stretch of every region in a BED-like file
    Regions {
        #[arg(value_name = "PREFIX")]
        index: PathBuf,

        /// Regions as `name start end` (0-based, half-open); .gz accepted
        #[arg(value_name = "REGIONS.BED")]
        regions: PathBuf,

        /// Number of threads
        #[arg(short = 't', long, value_name = "INT", default_value = "1")]
        threads: usize,
    },

    /// Call the splice motif of an intron
    Motif {
        #[arg(value_name = "PREFIX")]
        index: PathBuf,

        #[arg(value_name = "NAME")]
        reference: String,

        /// First intron base (1-based)
        #[arg(value_name = "START")]
        start: u64,

        /// Last intron base (1-based, inclusive)
        #[arg(value_name = "END")]
        end: u64,
    },
}

fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn open_index(prefix: &Path) -> Result<ReferenceIndex> {
    ReferenceIndex::open(prefix)
        .with_context(|| format!("failed to load index {}", prefix.display()))
}

fn configure_threads(requested: usize) {
    let mut num_threads = requested;
    if num_threads < 1 {
        log::warn!("Invalid thread count {}, using 1 thread", num_threads);
        num_threads = 1;
    }
    let max_threads = num_cpus::get() * 2;
    if num_threads > max_threads {
        log::warn!(
            "Thread count {} exceeds recommended maximum {}, capping at {}",
            num_threads,
            max_threads,
            max_threads
        );
        num_threads = max_threads;
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(_) => log::debug!("Rayon thread pool built with {} threads", num_threads),
        Err(e) => log::warn!("Failed to configure thread pool: {}", e),
    }
}

fn run(command: Commands) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match command {
        Commands::Names { index } => {
            let index = open_index(&index)?;
            let naming = NamingTable::new(index.layout());
            for (name, ordinal) in naming.iter() {
                // The unmapped sentinel has no length
                match index.reference_length(name) {
                    Ok(length) => writeln!(out, "{}\t{}\t{}", ordinal, name, length)?,
                    Err(_) => writeln!(out, "{}\t{}\t.", ordinal, name)?,
                }
            }
        }

        Commands::Fetch {
            index,
            reference,
            offset,
            length,
        } => {
            let index = open_index(&index)?;
            let stretch = index.get_stretch(&reference, offset, length)?;
            writeln!(out, "{}", stretch)?;
        }

        Commands::Regions {
            index,
            regions: regions_path,
            threads,
        } => {
            configure_threads(threads);
            let index = open_index(&index)?;
            let reader = regions::open_regions(&regions_path)
                .with_context(|| format!("failed to open {}", regions_path.display()))?;
            let regions = regions::parse_regions(reader)
                .with_context(|| format!("failed to read {}", regions_path.display()))?;
            log::info!("Resolving {} regions", regions.len());

            let stretches = regions::fetch_regions(&index, &regions);
            for (region, stretch) in regions.iter().zip(stretches) {
                let stretch = stretch.with_context(|| {
                    format!("{}:{}-{}", region.name, region.start, region.end)
                })?;
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}",
                    region.name, region.start, region.end, stretch
                )?;
            }
        }

        Commands::Motif {
            index,
            reference,
            start,
            end,
        } => {
            if end < start {
                anyhow::bail!("intron end {} is before start {}", end, start);
            }
            let index = open_index(&index)?;
            let call = motif::junction_motif(&index, &reference, start, end)?;
            let strand = call.strand().map_or_else(|| ".".to_string(), |s| s.to_string());
            writeln!(out, "{}\t{}\t{}", call.left, call.right, strand)?;
        }
    }

    out.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    if let Err(e) = run(cli.command) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
