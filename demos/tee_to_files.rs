//! Tee a file into multiple copies while reading it
//!
//! Run with: cargo run --example tee_to_files -- <input> [output_dir]
//!
//! Examples:
//!   cargo run --example tee_to_files -- Cargo.toml            # copies into the current dir
//!   cargo run --example tee_to_files -- input.bin /tmp/out    # copies into /tmp/out
//!
//! The input is read through a `ForkingReader` with two file sinks attached,
//! so each copy is produced as a side effect of the normal read path. Set
//! `RUST_LOG=forkstream=debug` to watch sinks attach, drain, and close.

use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::PathBuf;

use forkstream::ForkingReader;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("forkstream=debug".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let input = match args.next() {
        Some(path) => PathBuf::from(path),
        None => {
            eprintln!("usage: tee_to_files <input> [output_dir]");
            std::process::exit(1);
        }
    };
    let output_dir = args.next().map(PathBuf::from).unwrap_or_else(|| ".".into());

    let stem = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "input".into());
    let copy_paths: Vec<PathBuf> = (1..=2)
        .map(|i| output_dir.join(format!("{}.copy{}", stem, i)))
        .collect();

    let mut reader = ForkingReader::new(File::open(&input)?);
    for path in &copy_paths {
        let sink = BufWriter::new(File::create(path)?);
        if !reader.add_sink(sink) {
            eprintln!("could not attach sink for {}", path.display());
            std::process::exit(1);
        }
    }

    // Ordinary consumption of the stream; the copies fall out of it
    let mut contents = Vec::new();
    reader.read_to_end(&mut contents)?;
    let stats = reader.stats();
    reader.close()?;

    println!("read {} bytes from {}", contents.len(), input.display());
    for path in &copy_paths {
        let copied = std::fs::metadata(path)?.len();
        println!("  {} -> {} bytes", path.display(), copied);
    }
    println!("{}", stats);

    Ok(())
}
