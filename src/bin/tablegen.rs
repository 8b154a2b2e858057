//! Table compiler binary.
//!
//! Reads the interchange stream produced by the enumerator, builds and reduces
//! the shared prefix automaton, compiles the dense transition table and writes
//! the C header artifact for the runtime verifier.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process;

use clap::Parser;

use mcfi_tablegen::{table, write_header, BuildResult, Record, Trie};

#[derive(Parser)]
#[command(about = "Compile an encoding list into the verifier transition table")]
struct Args {
    /// Interchange file produced by the enumerator.
    input: PathBuf,

    /// Output path for the generated header.
    #[arg(short, long, default_value = "trie_table.h")]
    output: PathBuf,
}

fn run(args: &Args) -> BuildResult<()> {
    let reader = BufReader::new(File::open(&args.input)?);

    let mut trie = Trie::new();
    let mut records = 0usize;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        trie.insert(&Record::parse(&line, idx + 1)?)?;
        records += 1;
    }
    log::info!("{} records, {} raw nodes", records, trie.len());

    let reduced = trie.reduce();
    let compiled = table::compile(&reduced)?;

    let mut out = BufWriter::new(File::create(&args.output)?);
    write_header(&mut out, &compiled)?;
    out.flush()?;

    log::info!(
        "wrote {} ({} states, start {})",
        args.output.display(),
        compiled.states(),
        compiled.descriptor.start
    );
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
