use std::path::PathBuf;

use clap::Parser;

use crate::pipeline::Mode;

#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// File containing the grammar
    pub file: PathBuf,

    /// How far to normalize the grammar
    #[arg(short, long, value_enum, default_value_t = Mode::Gnf)]
    pub mode: Mode,

    /// Write the log of every stage here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Start symbol (default: the declared one)
    #[arg(short, long, value_name = "SYMBOL")]
    pub start: Option<String>,

    /// Random sentences to generate from the result
    #[arg(short = 'n', long, value_name = "AMOUNT")]
    pub samples: Option<u32>,

    /// List every sentence of the result up to this length
    #[arg(short, long, value_name = "LENGTH")]
    pub enumerate: Option<usize>,

    /// Log each stage as it runs
    #[arg(short, long)]
    pub verbose: bool,
}
