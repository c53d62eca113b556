// Primitives for reading the candidate and voter registries.
//
// Both are comma-separated files without a header and with exactly five columns.

use log::{debug, warn};
use snafu::prelude::*;
use std::collections::HashMap;

use urna_tally::report::CandidateDirectory;
use urna_tally::Office;

use crate::urna::*;

const NUM_COLUMNS: usize = 5;

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateInfo {
    pub name: String,
    pub number: String,
    pub party: String,
    pub jurisdiction: String,
    pub office: Office,
}

/// Identifies a candidate. The jurisdiction is absent for a nationwide office.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct CandidateKey {
    pub number: String,
    pub office: Office,
    pub jurisdiction: Option<String>,
}

impl CandidateKey {
    pub fn new(number: &str, office: Office, jurisdiction: &str) -> CandidateKey {
        CandidateKey {
            number: number.to_string(),
            office,
            jurisdiction: if office.is_nationwide() {
                None
            } else {
                Some(jurisdiction.to_string())
            },
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct CandidateRegistry {
    entries: HashMap<CandidateKey, CandidateInfo>,
    /// Number of malformed lines skipped while loading.
    pub skipped: usize,
}

impl CandidateRegistry {
    /// Adds a candidate, replacing any candidate with the same key.
    pub fn insert(&mut self, candidate: CandidateInfo) {
        let key = CandidateKey::new(
            &candidate.number,
            candidate.office,
            &candidate.jurisdiction,
        );
        if let Some(previous) = self.entries.insert(key, candidate) {
            warn!("duplicate candidate, replacing {:?}", previous);
        }
    }

    pub fn lookup(&self, number: &str, office: Office, jurisdiction: &str) -> Option<&CandidateInfo> {
        self.entries
            .get(&CandidateKey::new(number, office, jurisdiction))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CandidateDirectory for CandidateRegistry {
    fn resolve(&self, number: &str, office: Office, jurisdiction: &str) -> Option<String> {
        self.lookup(number, office, jurisdiction)
            .map(|c| c.name.clone())
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Voter {
    pub name: String,
    /// The identity document (RG).
    pub document: String,
    pub voter_id: String,
    pub municipality: String,
    pub jurisdiction: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct VoterRegistry {
    entries: HashMap<String, Voter>,
    pub skipped: usize,
}

impl VoterRegistry {
    pub fn insert(&mut self, voter: Voter) {
        if let Some(previous) = self.entries.insert(voter.voter_id.clone(), voter) {
            warn!("duplicate voter id, replacing {:?}", previous);
        }
    }

    pub fn get(&self, voter_id: &str) -> Option<&Voter> {
        self.entries.get(voter_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Reads the rows of a registry, skipping the ones that do not have the expected shape.
///
/// Returns the rows with their line number, and the number of skipped lines.
fn get_rows(path: &str) -> UrnaResult<(Vec<(u64, Vec<String>)>, usize)> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context(OpeningRegistrySnafu { path })?;
    let mut rows: Vec<(u64, Vec<String>)> = Vec::new();
    let mut skipped: usize = 0;
    for line_r in rdr.into_records() {
        let line: csv::StringRecord = match line_r {
            Result::Ok(l) => l,
            Result::Err(e) if e.is_io_error() => {
                return Err(e).context(OpeningRegistrySnafu { path });
            }
            Result::Err(e) => {
                warn!("{}: unreadable line skipped: {}", path, e);
                skipped += 1;
                continue;
            }
        };
        let lineno = line.position().map(|p| p.line()).unwrap_or(0);
        if line.len() != NUM_COLUMNS {
            warn!(
                "{}: invalid line {} skipped, expected {} fields: {:?}",
                path, lineno, NUM_COLUMNS, line
            );
            skipped += 1;
            continue;
        }
        rows.push((lineno, line.iter().map(|s| s.to_string()).collect()));
    }
    Ok((rows, skipped))
}

/// Reads the candidates: `name,number,party,jurisdiction,office`.
pub fn read_candidates(path: &str) -> UrnaResult<CandidateRegistry> {
    let (rows, mut skipped) = get_rows(path)?;
    let mut registry = CandidateRegistry::default();
    for (lineno, row) in rows {
        match row.as_slice() {
            [name, number, party, jurisdiction, office_code] => {
                let office = match Office::from_code(office_code) {
                    Some(o) => o,
                    None => {
                        warn!(
                            "{}: invalid line {} skipped, unknown office {:?}",
                            path, lineno, office_code
                        );
                        skipped += 1;
                        continue;
                    }
                };
                registry.insert(CandidateInfo {
                    name: name.clone(),
                    number: number.clone(),
                    party: party.clone(),
                    jurisdiction: jurisdiction.clone(),
                    office,
                });
            }
            _ => {
                skipped += 1;
            }
        }
    }
    debug!("read_candidates: {} candidates", registry.len());
    registry.skipped = skipped;
    Ok(registry)
}

/// Reads the voters: `name,document,voter id,municipality,jurisdiction`.
///
/// A file without any valid voter is an error.
pub fn read_voters(path: &str) -> UrnaResult<VoterRegistry> {
    let (rows, skipped) = get_rows(path)?;
    let mut registry = VoterRegistry::default();
    for (_, row) in rows {
        if let [name, document, voter_id, municipality, jurisdiction] = row.as_slice() {
            registry.insert(Voter {
                name: name.clone(),
                document: document.clone(),
                voter_id: voter_id.clone(),
                municipality: municipality.clone(),
                jurisdiction: jurisdiction.clone(),
            });
        }
    }
    debug!("read_voters: {} voters", registry.len());
    ensure!(!registry.is_empty(), EmptyRegistrySnafu { path });
    registry.skipped = skipped;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_tmp(dir: &tempfile::TempDir, name: &str, contents: &str) -> String {
        let p = dir.path().join(name);
        fs::write(&p, contents).unwrap();
        p.display().to_string()
    }

    #[test]
    fn reads_candidates() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_tmp(
            &dir,
            "candidatos.txt",
            "Ana Souza,1234,PA,SP,F
Beto Lima, 45 ,PB,SP,G
Carla Dias,45,PC,RJ,G
Eva Rocha,13,PC,RJ,P
sem virgulas suficientes
Z,1,P,SP,X
",
        );
        let registry = read_candidates(&p).unwrap();
        assert_eq!(registry.len(), 4);
        assert_eq!(registry.skipped, 2);
        assert_eq!(
            registry.lookup("45", Office::Governor, "SP").map(|c| c.name.as_str()),
            Some("Beto Lima")
        );
        assert_eq!(
            registry.lookup("45", Office::Governor, "RJ").map(|c| c.name.as_str()),
            Some("Carla Dias")
        );
        assert!(registry.lookup("45", Office::Governor, "MG").is_none());
        // Nationwide office: any jurisdiction finds the candidate.
        assert_eq!(
            registry.resolve("13", Office::President, "AM"),
            Some("Eva Rocha".to_string())
        );
        assert_eq!(registry.resolve("1234", Office::StateDeputy, "SP"), None);
    }

    #[test]
    fn keys_do_not_collide() {
        // Concatenated, both keys would read "12SSP".
        let mut registry = CandidateRegistry::default();
        registry.insert(CandidateInfo {
            name: "A".to_string(),
            number: "12".to_string(),
            party: "P".to_string(),
            jurisdiction: "SSP".to_string(),
            office: Office::Senator,
        });
        assert!(registry.lookup("12S", Office::Senator, "SP").is_none());
        assert!(registry.lookup("12", Office::Senator, "SSP").is_some());
    }

    #[test]
    fn reads_voters() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_tmp(
            &dir,
            "eleitores.txt",
            "Joao,111111,1001,Campinas,SP
Maria,222222,1002,Santos
Pedro,333333,2001,Niteroi,RJ
",
        );
        let registry = read_voters(&p).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.skipped, 1);
        let v = registry.get("2001").unwrap();
        assert_eq!(v.name, "Pedro");
        assert_eq!(v.jurisdiction, "RJ");
        assert!(registry.get("1002").is_none());
    }

    #[test]
    fn empty_voters_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = write_tmp(&dir, "eleitores.txt", "only,three,fields\n");
        assert!(matches!(
            read_voters(&p),
            Err(UrnaError::EmptyRegistry { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            read_candidates("/nonexistent/candidatos.txt"),
            Err(UrnaError::OpeningRegistry { .. })
        ));
    }
}
