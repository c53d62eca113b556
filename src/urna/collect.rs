// Interactive collection of a ballot at the terminal.

use log::debug;
use snafu::prelude::*;
use std::io::{BufRead, Write};

use urna_tally::builder::BallotBuilder;
use urna_tally::{Ballot, Office, Selection};

use crate::urna::registry::CandidateRegistry;
use crate::urna::*;

/// Writes one line to the terminal.
pub fn say<W: Write>(output: &mut W, line: &str) -> UrnaResult<()> {
    writeln!(output, "{}", line).context(TerminalIoSnafu {})
}

/// Asks a question and returns the trimmed answer, or None if the input is closed.
pub fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> UrnaResult<Option<String>> {
    write!(output, "{}", question).context(TerminalIoSnafu {})?;
    output.flush().context(TerminalIoSnafu {})?;
    let mut line = String::new();
    let n = input.read_line(&mut line).context(TerminalIoSnafu {})?;
    if n == 0 {
        Ok(None)
    } else {
        Ok(Some(line.trim().to_string()))
    }
}

fn ask_required<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> UrnaResult<String> {
    ask(input, output, question)?.context(InputClosedSnafu {})
}

fn confirmed(answer: &str) -> bool {
    answer.eq_ignore_ascii_case("S")
}

/// Collects the ballot of one voter at a terminal located in `jurisdiction`.
///
/// The voter must be registered in the same jurisdiction as the terminal.
pub fn collect_ballot<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    session: &Session,
    jurisdiction: &str,
) -> UrnaResult<Ballot> {
    let (candidates, voters) = session.registries()?;

    let voter_id = ask_required(input, output, "Informe o Título de Eleitor: ")?;
    let voter = voters
        .get(&voter_id)
        .context(VoterNotFoundSnafu { voter_id: &voter_id })?;
    ensure!(
        voter.jurisdiction == jurisdiction,
        VoterWrongJurisdictionSnafu {
            voter_id: &voter_id,
            registered: &voter.jurisdiction,
            jurisdiction,
        }
    );
    say(
        output,
        &format!(
            "Eleitor: {}, Documento(rg): {}, Endereço: {} - {}",
            voter.name, voter.document, voter.municipality, voter.jurisdiction
        ),
    )?;

    let mut builder = BallotBuilder::new(jurisdiction, &voter_id).context(InvalidBallotSnafu {})?;
    for office in Office::ALL {
        let selection = ask_selection(input, output, candidates, office, jurisdiction)?;
        debug!("collect_ballot: {:?} -> {:?}", office, selection);
        builder
            .choose(office, selection)
            .context(InvalidBallotSnafu {})?;
    }
    builder.build().context(InvalidBallotSnafu {})
}

fn ask_selection<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    candidates: &CandidateRegistry,
    office: Office,
    jurisdiction: &str,
) -> UrnaResult<Selection> {
    let question = format!(
        "Informe o voto para {} (ou digite 'B' para branco): ",
        office.title()
    );
    loop {
        let answer = ask_required(input, output, &question)?.to_uppercase();
        if answer == "B" {
            return Ok(Selection::Blank);
        }
        match candidates.lookup(&answer, office, jurisdiction) {
            Some(candidate) => {
                say(output, &format!("Candidato: {}", candidate.name))?;
                if confirmed(&ask_required(input, output, "Confirma (S ou N)? ")?) {
                    return Ok(Selection::Candidate(answer));
                }
            }
            None => {
                say(output, "Candidato não encontrado! Deseja votar nulo? (S ou N)")?;
                if confirmed(&ask_required(input, output, "")?) {
                    return Ok(Selection::Null);
                }
                say(output, "Por favor, informe um candidato válido.")?;
            }
        }
    }
}
