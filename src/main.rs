mod cli;
mod error_handling;
mod generator;
mod grammar;
mod language;
mod normal_form;
mod parser;
mod pipeline;
mod simplify;

use std::process::ExitCode;

use clap::Parser;
use log::info;

use cli::Cli;
use language::render_sentence;

const SAMPLE_DEPTH: usize = 12;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let mut grammar = match parser::parse_file(&cli.file) {
        Ok(grammar) => grammar,
        Err(errors) => {
            for error in errors {
                eprintln!("{}", error);
            }
            return ExitCode::FAILURE;
        }
    };

    if let Some(start) = &cli.start {
        if let Err(error) = parser::override_start(&mut grammar, start, &cli.file) {
            eprintln!("{}", error);
            return ExitCode::FAILURE;
        }
    }

    info!("Loaded {} with {} productions", cli.file.display(), grammar.production_count());
    let normalization = pipeline::run(grammar, cli.mode);

    match &cli.output {
        Some(path) => {
            if let Err(error) = normalization.write_log(path) {
                eprintln!("Could not write {}: {}", path.display(), error);
                return ExitCode::FAILURE;
            }
            print!("{}", normalization.grammar);
        }
        None => print!("{}", normalization.render()),
    }

    if let Some(max_len) = cli.enumerate {
        println!("Sentences up to length {}:", max_len);
        for sentence in language::sentences(&normalization.grammar, max_len) {
            println!("  {}", render_sentence(&sentence));
        }
    }

    if let Some(amount) = cli.samples {
        let mut rng = rand::thread_rng();
        for _ in 0..amount {
            match generator::generate(&normalization.grammar, &mut rng, SAMPLE_DEPTH, cli.file.clone()) {
                Ok(sentence) => println!("{}", render_sentence(&sentence)),
                Err(error) => {
                    eprintln!("{}", error);
                    return ExitCode::FAILURE;
                }
            }
        }
    }

    ExitCode::SUCCESS
}
