//! Command-line tool that prints the plain text of legacy Word documents.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example extract_text -- document.doc
//! ```
//!
//! With options and diagnostics:
//! ```sh
//! RUST_LOG=debug cargo run --example extract_text -- --info --encoding windows1252 *.doc
//! ```

use clap::{Parser, ValueEnum};
use doctext::doc::{CompressedEncoding, ExtractOptions, Package};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Extract plain text from Word 97-2003 (.doc) files
#[derive(Parser, Debug)]
#[command(name = "extract_text", version)]
struct Args {
    /// Input file(s)
    #[arg(value_name = "INPUT", required = true)]
    input: Vec<PathBuf>,

    /// Mapping for single-byte pieces
    #[arg(long, value_enum, default_value = "latin1")]
    encoding: EncodingArg,

    /// Reject piece tables with a partial trailing descriptor
    #[arg(long)]
    strict: bool,

    /// Decode pieces in parallel
    #[arg(long)]
    parallel: bool,

    /// Print FIB and piece table details instead of the text
    #[arg(long)]
    info: bool,

    /// Translate paragraph marks (CR) to newlines
    #[arg(long)]
    newlines: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EncodingArg {
    Latin1,
    Windows1252,
}

impl From<EncodingArg> for CompressedEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Latin1 => CompressedEncoding::Latin1,
            EncodingArg::Windows1252 => CompressedEncoding::Windows1252,
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let args = Args::parse();
    let options = ExtractOptions::new()
        .with_compressed_encoding(args.encoding.into())
        .with_strict_piece_table(args.strict)
        .with_parallel(args.parallel);

    let mut failed = false;
    for path in &args.input {
        if let Err(e) = process(path, &args, &options) {
            log::error!("{}: {e}", path.display());
            failed = true;
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn process(
    path: &Path,
    args: &Args,
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut pkg = Package::open(path)?.with_options(options.clone());
    let doc = pkg.document()?;
    let mut out = io::stdout().lock();

    if args.info {
        let fib = doc.fib();
        writeln!(out, "{}", path.display())?;
        writeln!(out, "  nFib:          0x{:04X}", fib.version())?;
        writeln!(out, "  language:      0x{:04X}", fib.language_id())?;
        writeln!(out, "  encrypted:     {}", fib.is_encrypted())?;
        writeln!(out, "  table stream:  {}", fib.table_stream_name())?;
        writeln!(out, "  CP length:     {}", fib.cp_length())?;
        writeln!(out, "  CLX:           {} bytes at {}", fib.lcb_clx(), fib.fc_clx())?;
        for range in doc.piece_table().ranges() {
            let (offset, len) = range.physical_span();
            writeln!(
                out,
                "  piece {:>4}:    CP {}..{} -> {} bytes at {} ({})",
                range.index,
                range.cp_start,
                range.cp_end,
                len,
                offset,
                if range.descriptor.compressed { "8-bit" } else { "UTF-16" }
            )?;
        }
        return Ok(());
    }

    if args.newlines {
        writeln!(out, "{}", doc.text().replace('\r', "\n"))?;
    } else {
        out.write_all(doc.text().as_bytes())?;
    }
    Ok(())
}
