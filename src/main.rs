mod args;
mod urna;

use clap::Parser;
use log::{debug, warn};
use std::error::Error;
use std::io;
use std::path::Path;

use crate::args::{Args, Command};
use crate::urna::config_reader::{read_config, Settings, UrnaConfig};
use crate::urna::{run_apuracao, run_results, run_vote, Session, UrnaResult};

fn build_session(args: &Args) -> UrnaResult<Session> {
    let mut config = match &args.config {
        Some(p) => read_config(p)?,
        None => UrnaConfig::default(),
    };
    if let Some(p) = &args.candidates {
        config.candidates_file = Some(p.clone());
    }
    if let Some(p) = &args.voters {
        config.voters_file = Some(p.clone());
    }
    if let Some(p) = &args.ballots {
        config.ballot_log = Some(p.clone());
    }
    if let Command::Vote {
        jurisdiction: Some(j),
    } = &args.command
    {
        config.jurisdiction = Some(j.clone());
    }
    debug!("build_session: {:?}", config);
    let settings = Settings::from_config(&config, args.out_dir.as_deref().map(Path::new))?;
    Session::load(settings)
}

fn run(args: &Args) -> UrnaResult<()> {
    let session = build_session(args)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    match &args.command {
        Command::Vote { .. } => {
            run_vote(&session, &mut input, &mut output)?;
        }
        Command::Apuracao => {
            run_apuracao(&session, &mut output)?;
        }
        Command::Results { reference } => {
            run_results(&session, &mut output, reference.clone())?;
        }
    }
    Ok(())
}

fn main() {
    let args = Args::parse();

    if args.verbose {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    debug!("args: {:?}", args);

    if let Err(e) = run(&args) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        let mut source = e.source();
        while let Some(s) = source {
            eprintln!("  caused by: {}", s);
            source = s.source();
        }
        std::process::exit(1);
    }
}
