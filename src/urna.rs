use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use urna_tally::report::{group_by_office, render, render_boletim, CandidateDirectory};
use urna_tally::*;

use std::fs;
use std::io::{BufRead, Write};

use text_diff::print_diff;

use crate::urna::collect::{ask, collect_ballot, say};
use crate::urna::config_reader::*;
use crate::urna::output::{render_chart, write_text};
use crate::urna::registry::{read_candidates, read_voters, CandidateRegistry, VoterRegistry};
use crate::urna::store::BallotStore;

pub mod collect;
pub mod config_reader;
pub mod output;
pub mod registry;
pub mod store;

#[derive(Debug, Snafu)]
pub enum UrnaError {
    #[snafu(display("Error opening ballot log {path}"))]
    OpeningBallotLog {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing to ballot log {path}"))]
    WritingBallotLog {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading ballot log {path} after line {lineno}"))]
    ReadingBallotLog {
        source: std::io::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error encoding the ballot of voter {voter_id}"))]
    EncodingBallot {
        source: serde_json::Error,
        voter_id: String,
    },
    #[snafu(display("Error reading registry {path}"))]
    OpeningRegistry { source: csv::Error, path: String },
    #[snafu(display("Registry {path} does not contain any valid line"))]
    EmptyRegistry { path: String },
    #[snafu(display("Error writing {path}"))]
    WritingReport {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration {path}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Nothing to tally in {path}"))]
    NoBallots { source: TallyErrors, path: String },
    #[snafu(display("Voter {voter_id} is not registered"))]
    VoterNotFound { voter_id: String },
    #[snafu(display(
        "Voter {voter_id} is registered in {registered}, not in the terminal jurisdiction {jurisdiction}"
    ))]
    VoterWrongJurisdiction {
        voter_id: String,
        registered: String,
        jurisdiction: String,
    },
    #[snafu(display("Invalid ballot"))]
    InvalidBallot { source: BallotErrors },
    #[snafu(display("The input ended before the ballot was complete"))]
    InputClosed {},
    #[snafu(display("Error on the terminal"))]
    TerminalIo { source: std::io::Error },
    #[snafu(display("The candidates and voters registries must be loaded first"))]
    MissingRegistries {},
    #[snafu(display("The terminal jurisdiction is not set"))]
    MissingJurisdiction {},
    #[snafu(display("Error opening reference result file {path}"))]
    OpeningReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Difference detected between the result file and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

impl UrnaError {
    /// The ballot was refused before storage: the operator may go on with the next voter.
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            UrnaError::VoterNotFound { .. } | UrnaError::VoterWrongJurisdiction { .. }
        )
    }
}

pub type UrnaResult<T> = Result<T, UrnaError>;

/// Everything the commands need: the resolved settings and the loaded registries.
pub struct Session {
    pub settings: Settings,
    pub candidates: Option<CandidateRegistry>,
    pub voters: Option<VoterRegistry>,
}

impl Session {
    pub fn new(settings: Settings) -> Session {
        Session {
            settings,
            candidates: None,
            voters: None,
        }
    }

    /// Creates a session and loads the registries named in the settings.
    pub fn load(settings: Settings) -> UrnaResult<Session> {
        let mut session = Session::new(settings);
        if let Some(p) = session.settings.candidates_file.clone() {
            session.load_candidates(&p)?;
        }
        if let Some(p) = session.settings.voters_file.clone() {
            session.load_voters(&p)?;
        }
        Ok(session)
    }

    pub fn load_candidates(&mut self, path: &str) -> UrnaResult<()> {
        let registry = read_candidates(path)?;
        info!(
            "Loaded {} candidates from {} ({} lines skipped)",
            registry.len(),
            path,
            registry.skipped
        );
        self.candidates = Some(registry);
        Ok(())
    }

    pub fn load_voters(&mut self, path: &str) -> UrnaResult<()> {
        let registry = read_voters(path)?;
        info!(
            "Loaded {} voters from {} ({} lines skipped)",
            registry.len(),
            path,
            registry.skipped
        );
        self.voters = Some(registry);
        Ok(())
    }

    pub fn registries(&self) -> UrnaResult<(&CandidateRegistry, &VoterRegistry)> {
        match (&self.candidates, &self.voters) {
            (Some(c), Some(v)) => Ok((c, v)),
            _ => MissingRegistriesSnafu {}.fail(),
        }
    }

    pub fn store(&self) -> BallotStore {
        BallotStore::new(&self.settings.ballot_log)
    }
}

/// Collects ballots at the terminal until the operator stops.
///
/// Returns the number of ballots stored.
pub fn run_vote<R: BufRead, W: Write>(
    session: &Session,
    input: &mut R,
    output: &mut W,
) -> UrnaResult<u64> {
    session.registries()?;
    let jurisdiction = session
        .settings
        .jurisdiction
        .clone()
        .context(MissingJurisdictionSnafu {})?;
    let store = session.store();
    info!(
        "Starting to vote in {} with ballot log {:?}",
        jurisdiction,
        store.path()
    );

    let mut stored: u64 = 0;
    loop {
        match collect_ballot(input, output, session, &jurisdiction) {
            Result::Ok(ballot) => match store.append(&ballot) {
                Result::Ok(()) => {
                    stored += 1;
                    say(output, "Voto salvo com sucesso.")?;
                }
                Result::Err(e) => {
                    warn!("run_vote: ballot of voter {} not saved: {}", ballot.voter_id, e);
                    say(output, &format!("Erro ao salvar o voto: {}", e))?;
                }
            },
            Result::Err(e) if e.is_validation_failure() => {
                warn!("run_vote: ballot refused: {}", e);
                say(output, &format!("{}", e))?;
            }
            Result::Err(e) => return Err(e),
        }
        match ask(input, output, "Registrar novo voto (S ou N)? ")? {
            Some(answer) if answer.eq_ignore_ascii_case("S") => {}
            _ => break,
        }
    }
    info!("run_vote: {} ballots stored", stored);
    Ok(stored)
}

fn tally_store(session: &Session) -> UrnaResult<TallyOutcome> {
    let store = session.store();
    let mut reader = store.read_all()?;
    let ballots: Vec<Ballot> = reader.by_ref().collect::<UrnaResult<Vec<Ballot>>>()?;
    if reader.skipped_records() > 0 {
        warn!(
            "{} unreadable records skipped in {:?}",
            reader.skipped_records(),
            store.path()
        );
    }
    debug!("tally_store: {} ballots read", ballots.len());
    let outcome = run_tally(&ballots).context(NoBallotsSnafu {
        path: store.path().display().to_string(),
    })?;
    if outcome.duplicates_skipped > 0 {
        warn!(
            "{} ballots ignored: their voter had already voted",
            outcome.duplicates_skipped
        );
    }
    Ok(outcome)
}

fn write_result_file(session: &Session, table: &TallyTable) -> UrnaResult<String> {
    let directory: Option<&dyn CandidateDirectory> = session
        .candidates
        .as_ref()
        .map(|c| c as &dyn CandidateDirectory);
    let report = render(table, directory, &session.settings.rules);
    let text = report.to_text();
    write_text(&session.settings.result_file, &text)?;
    info!("Result of the tally saved in {}", session.settings.result_file);
    Ok(text)
}

/// Tallies the stored ballots, prints every bucket and saves the result file.
pub fn run_apuracao<W: Write>(session: &Session, output: &mut W) -> UrnaResult<TallyOutcome> {
    session.registries()?;
    let outcome = tally_store(session)?;
    say(output, "Resultados da Apuração:")?;
    for (key, count) in outcome.table.iter() {
        say(
            output,
            &format!(
                "UF: {}, Cargo: {}, Número: {}, Votos: {}",
                key.jurisdiction, key.office, key.selection, count
            ),
        )?;
    }
    write_result_file(session, &outcome.table)?;
    Ok(outcome)
}

/// Tallies the stored ballots, saves the result file and the bulletin, and displays the
/// votes of each office.
///
/// If a reference result file is provided, the produced result file must match it.
pub fn run_results<W: Write>(
    session: &Session,
    output: &mut W,
    reference_path: Option<String>,
) -> UrnaResult<()> {
    session.registries()?;
    let outcome = tally_store(session)?;
    let text = write_result_file(session, &outcome.table)?;

    write_text(
        &session.settings.boletim_file,
        &render_boletim(&outcome.table),
    )?;
    say(
        output,
        &format!(
            "Boletim de urna gerado com sucesso em {}.",
            session.settings.boletim_file
        ),
    )?;

    let directory: Option<&dyn CandidateDirectory> = session
        .candidates
        .as_ref()
        .map(|c| c as &dyn CandidateDirectory);
    for group in group_by_office(&outcome.table, directory) {
        say(output, &render_chart(&group))?;
    }

    if let Some(p) = reference_path {
        let reference = fs::read_to_string(&p).context(OpeningReferenceSnafu { path: &p })?;
        if reference != text {
            warn!("Found differences with the reference result file");
            print_diff(reference.as_str(), text.as_str(), "\n");
            return ReferenceMismatchSnafu { path: p }.fail();
        }
        info!("The result file matches the reference {}", p);
    }
    Ok(())
}
