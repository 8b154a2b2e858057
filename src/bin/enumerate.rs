//! Encoding enumerator binary.
//!
//! Expands the instruction catalog into the line-oriented interchange stream
//! consumed by the tablegen stage: one record per concrete encoding, hex byte
//! tokens with `XX` wildcards, `:` and the accept-class label.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;

use mcfi_tablegen::{BuildResult, Catalog};

#[derive(Parser)]
#[command(about = "Enumerate the sanctioned x86-64 encoding space")]
struct Args {
    /// Output path for the interchange stream; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn run(args: &Args) -> BuildResult<()> {
    let catalog = Catalog::build();

    let mut out: BufWriter<Box<dyn Write>> = match &args.output {
        Some(path) => BufWriter::new(Box::new(File::create(path)?)),
        None => BufWriter::new(Box::new(io::stdout())),
    };

    let mut count = 0u64;
    for record in catalog.records() {
        writeln!(out, "{}", record?)?;
        count += 1;
    }
    out.flush()?;

    log::info!("emitted {count} encodings");
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
