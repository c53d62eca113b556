// The ballot log: an append-only file with one ballot per line, in compact JSON.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use urna_tally::{Ballot, Office, Selection};

use crate::urna::*;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
struct BallotRecord {
    jurisdiction: String,
    #[serde(rename = "voterId")]
    voter_id: String,
    /// Office code -> candidate number, `Branco` or `Nulo`.
    choices: BTreeMap<String, String>,
}

impl From<&Ballot> for BallotRecord {
    fn from(ballot: &Ballot) -> Self {
        BallotRecord {
            jurisdiction: ballot.jurisdiction.clone(),
            voter_id: ballot.voter_id.clone(),
            choices: ballot
                .choices
                .iter()
                .map(|(o, s)| (o.code().to_string(), s.label().to_string()))
                .collect(),
        }
    }
}

impl BallotRecord {
    /// None if one of the office codes is unknown.
    fn into_ballot(self) -> Option<Ballot> {
        let mut choices: BTreeMap<Office, Selection> = BTreeMap::new();
        for (code, label) in self.choices.iter() {
            let office = Office::from_code(code)?;
            choices.insert(office, Selection::from_label(label));
        }
        Some(Ballot {
            jurisdiction: self.jurisdiction,
            voter_id: self.voter_id,
            choices,
        })
    }
}

/// The durable log of the ballots cast at the terminal.
///
/// Ballots can only be appended; nothing is ever updated or deleted.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BallotStore {
    path: PathBuf,
}

impl BallotStore {
    pub fn new(path: &str) -> BallotStore {
        BallotStore {
            path: PathBuf::from(path),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn path_str(&self) -> String {
        self.path.display().to_string()
    }

    /// Writes one ballot at the end of the log and syncs it to disk.
    ///
    /// A candidate number spelled like a blank or null vote is refused: it could not be
    /// read back as a candidate.
    pub fn append(&self, ballot: &Ballot) -> UrnaResult<()> {
        let path = self.path_str();
        ballot.check_labels().context(InvalidBallotSnafu {})?;
        let mut line = serde_json::to_string(&BallotRecord::from(ballot)).context(
            EncodingBallotSnafu {
                voter_id: &ballot.voter_id,
            },
        )?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)
            .context(OpeningBallotLogSnafu { path: &path })?;
        // An interrupted write may have left an incomplete last line: close it so that
        // it does not swallow this record.
        if !ends_with_newline(&mut file).context(WritingBallotLogSnafu { path: &path })? {
            warn!("{}: the last record is incomplete", path);
            line.insert(0, '\n');
        }
        file.write_all(line.as_bytes())
            .context(WritingBallotLogSnafu { path: &path })?;
        file.sync_all()
            .context(WritingBallotLogSnafu { path: &path })?;
        debug!("append: ballot of voter {} saved", ballot.voter_id);
        Ok(())
    }

    /// Reads the log from the start. A missing log contains no ballot.
    pub fn read_all(&self) -> UrnaResult<BallotReader> {
        let path = self.path_str();
        let reader = match File::open(&self.path) {
            Result::Ok(f) => Some(BufReader::new(f)),
            Result::Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{}: no ballot log yet", path);
                None
            }
            Result::Err(e) => return Err(e).context(OpeningBallotLogSnafu { path }),
        };
        Ok(BallotReader {
            path,
            reader,
            lineno: 0,
            skipped: 0,
        })
    }
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// The ballots of a log, in the order they were appended.
///
/// Unreadable records are skipped and counted. An incomplete last record ends the
/// sequence.
pub struct BallotReader {
    path: String,
    reader: Option<BufReader<File>>,
    lineno: usize,
    skipped: usize,
}

impl BallotReader {
    /// The number of unreadable records skipped so far.
    pub fn skipped_records(&self) -> usize {
        self.skipped
    }

    fn parse(line: &[u8]) -> Option<Ballot> {
        serde_json::from_slice::<BallotRecord>(line)
            .ok()
            .and_then(|r| r.into_ballot())
    }
}

impl Iterator for BallotReader {
    type Item = UrnaResult<Ballot>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;
        loop {
            let mut buf: Vec<u8> = Vec::new();
            let n = match reader.read_until(b'\n', &mut buf) {
                Result::Ok(n) => n,
                Result::Err(e) => {
                    self.reader = None;
                    return Some(Err(e).context(ReadingBallotLogSnafu {
                        path: &self.path,
                        lineno: self.lineno,
                    }));
                }
            };
            if n == 0 {
                self.reader = None;
                return None;
            }
            self.lineno += 1;
            let complete = buf.ends_with(b"\n");
            if buf.iter().all(|b| b.is_ascii_whitespace()) {
                continue;
            }
            if let Some(ballot) = BallotReader::parse(&buf) {
                return Some(Ok(ballot));
            }
            if !complete {
                debug!(
                    "{}: incomplete record at line {}, end of the log",
                    self.path, self.lineno
                );
                self.reader = None;
                return None;
            }
            warn!(
                "{}: unreadable record at line {} skipped",
                self.path, self.lineno
            );
            self.skipped += 1;
        }
    }
}
