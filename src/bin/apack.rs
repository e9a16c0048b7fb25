use clap::{Parser, Subcommand};
use std::path::PathBuf;

use apack::archive::{Archive, ArchiveConfig, ReaderOptions};
use apack::format::constants::{COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_ZSTD};
use apack::recovery;

#[derive(Parser)]
#[command(name = "apack", version = "0.1.0", about = "APACK archive format CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an archive from one or more input files
    Create {
        #[arg(short, long)]
        output: PathBuf,
        /// Compression: zstd (default), lz4, none
        #[arg(short, long, default_value = "zstd")]
        compression: String,
        #[arg(short, long, default_value = "3")]
        level: i32,
        /// Maximum chunk size in KiB
        #[arg(long, default_value = "256")]
        chunk_size: i64,
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
    },
    /// Extract every entry from an archive into a directory
    Extract {
        input: PathBuf,
        #[arg(short = 'C', long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// List archive contents
    List { input: PathBuf },
    /// Show file-header metadata
    Info { input: PathBuf },
    /// Forward-scan an archive without trusting its trailer, reporting entry health
    Verify {
        input: PathBuf,
        /// Print per-entry health log
        #[arg(long)]
        verbose: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Commands::Create { output, input, compression, level, chunk_size, } => {
            let config = ArchiveConfig {
                chunk_size: chunk_size * 1024,
                compression_algo_id: parse_compression(&compression),
                compression_level: level,
                ..ArchiveConfig::default()
            };
            let mut archive = Archive::create(&output, config)?;
            for path in &input {
                let data = std::fs::read(path)?;
                let name = path.file_name().unwrap().to_string_lossy();
                archive.add_entry(&name, "application/octet-stream", Vec::new(), data.as_slice())?;
                println!("  added   {} ({} B)", path.display(), data.len());
            }
            archive.finalize()?;
            let size = std::fs::metadata(&output)?.len();
            println!("Created: {}  ({} B on disk)", output.display(), size);
        }

        Commands::Extract { input, output_dir } => {
            std::fs::create_dir_all(&output_dir)?;
            let mut archive = Archive::open(&input, ReaderOptions::default())?;
            for info in archive.list()? {
                let data = archive.read_file_by_id(info.entry_id)?;
                let dest = output_dir.join(&info.name);
                std::fs::write(&dest, &data)?;
                println!("  extracted  {} ({} B)", dest.display(), data.len());
            }
            println!("Extracted to: {}", output_dir.display());
        }

        Commands::List { input } => {
            let mut archive = Archive::open(&input, ReaderOptions::default())?;
            println!("Archive: {}", input.display());
            println!("{:<28} {:>12} {:>12}", "Name", "Size", "Stored");
            for info in archive.list()? {
                println!("{:<28} {:>12} {:>12}", info.name, info.original_size, info.stored_size);
            }
        }

        Commands::Info { input } => {
            let archive = Archive::open(&input, ReaderOptions::default())?;
            let Archive::Read(reader) = &archive else { unreachable!() };
            let header = reader.file_header();
            let file_size = std::fs::metadata(&input)?.len();
            println!("── APACK archive ────────────────────────────────────────");
            println!("  Path            {}", input.display());
            println!("  File size       {} B ({:.2} MiB)", file_size, file_size as f64 / 1_048_576.0);
            println!("  Format version  {}.{}.{}", header.version_major, header.version_minor, header.version_patch);
            println!("  Random access   {}", header.is_random_access());
            println!("  Encrypted       {}", header.is_encrypted());
            println!("  Entry count     {}", header.entry_count);
            println!("  Chunk size      {} B", header.chunk_size);
        }

        Commands::Verify { input, verbose } => {
            let report = recovery::scan_file(&input)?;
            println!("{}", report.summary());
            println!("  Entries scanned:     {}", report.total_scanned);
            println!("  Healthy entries:     {}", report.healthy_entries);
            println!("  Corrupt entries:     {}", report.corrupt_entries);
            println!("  Truncated entries:   {}", report.truncated_entries);
            println!("  Unknown algorithm:   {}", report.unknown_algorithm_entries);

            if verbose {
                println!();
                println!("  ── Entry log ──────────────────────────────────────");
                for (i, entry) in report.entry_log.iter().enumerate() {
                    let name = entry.name.as_deref().unwrap_or("?");
                    println!("  [{i:4}] @{:<10} {name:<24} {:?}", entry.archive_offset, entry.health);
                }
            }
        }
    }

    Ok(())
}

fn parse_compression(s: &str) -> i32 {
    match s.to_ascii_lowercase().as_str() {
        "none" => COMPRESSION_NONE,
        "lz4" => COMPRESSION_LZ4,
        _ => COMPRESSION_ZSTD,
    }
}
