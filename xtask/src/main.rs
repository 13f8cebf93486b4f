mod check;
mod params;
mod tensor;

#[macro_use]
extern crate clap;
use clap::Parser;

fn main() {
    use Commands::*;
    let cli = Cli::parse();
    simple_logger::SimpleLogger::new()
        .with_level(cli.log)
        .init()
        .unwrap();
    match cli.command {
        Params(args) => args.params(),
        Check(args) => args.check(),
    }
}

#[derive(Parser)]
#[clap(name = "quant-utils")]
#[clap(version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
    /// Log level
    #[clap(long, global = true, default_value = "info")]
    log: log::LevelFilter,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate scale and zero point of a raw tensor dump
    Params(params::ParamsArgs),
    /// Quantize and dequantize a raw tensor dump and report the error
    Check(check::CheckArgs),
}

const YES: &str = "✔️  ";
const ERR: &str = "❌  ";
