use anyhow::{anyhow, Context, Result};
use clap::Parser;
use jackc::units::{compile_unit, discover, dump_unit_tokens};
use log::{error, info, LevelFilter};
use std::path::PathBuf;

#[derive(Debug, clap::Parser)]
#[clap(author, version, about = "Compiles Jack classes into VM code")]
struct Args {
    /// A .jack file, or a directory whose .jack files are compiled one by one
    path: PathBuf,

    /// Write an XML token listing (FooT.xml) instead of VM code
    #[clap(long)]
    tokens: bool,

    /// Enable debug output
    #[clap(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    simple_logger::SimpleLogger::new()
        .with_level(level)
        .env()
        .init()?;

    let units = discover(&args.path)
        .with_context(|| format!("Failed to read {}", args.path.display()))?;

    let mut failed = 0;
    for unit in units.iter() {
        let result = if args.tokens {
            dump_unit_tokens(unit).map(|_| ())
        } else {
            compile_unit(unit)
        };

        match result.with_context(|| format!("{}", unit.source.display())) {
            Ok(()) => info!("compiled {}", unit.source.display()),
            Err(e) => {
                error!("{:#}", e);
                failed += 1;
            }
        }
    }

    if failed != 0 {
        return Err(anyhow!("{} of {} units failed", failed, units.len()));
    }
    Ok(())
}
