use log::debug;

use std::collections::BTreeMap;
use std::fmt::Display;

pub use crate::config::*;

/// Maps a candidate number to a display name.
///
/// The directory is owned by the caller: the reports only look names up.
/// For a nationwide office the jurisdiction is expected to be ignored.
pub trait CandidateDirectory {
    fn resolve(&self, number: &str, office: Office, jurisdiction: &str) -> Option<String>;
}

/// One detail line of the report.
#[derive(PartialEq, Debug, Clone)]
pub struct ReportLine {
    pub key: TallyKey,
    /// The candidate name when it could be resolved, the raw selection otherwise.
    pub name: String,
    pub count: u64,
    pub percentage: f64,
}

/// The canonical summary of a tally.
#[derive(PartialEq, Debug, Clone)]
pub struct Report {
    pub total_ballots: u64,
    pub total_nominal: u64,
    pub total_blank: u64,
    pub total_null: u64,
    /// Grouped by office in ballot order, then sorted by key.
    pub lines: Vec<ReportLine>,
}

/// The votes of one office, summed over all the jurisdictions.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct OfficeGroup {
    pub office: Office,
    pub votes: BTreeMap<Selection, u64>,
    pub names: BTreeMap<Selection, String>,
}

fn display_name(
    selection: &Selection,
    office: Office,
    jurisdiction: &str,
    directory: Option<&dyn CandidateDirectory>,
) -> Option<String> {
    match (selection, directory) {
        (Selection::Candidate(number), Some(d)) => d.resolve(number, office, jurisdiction),
        _ => None,
    }
}

/// Builds the report of a tally.
pub fn render(
    table: &TallyTable,
    directory: Option<&dyn CandidateDirectory>,
    rules: &ReportRules,
) -> Report {
    let mut lines: Vec<ReportLine> = Vec::new();
    for office in table.offices() {
        for (key, count) in table.iter().filter(|(k, _)| k.office == office) {
            let name = display_name(&key.selection, office, &key.jurisdiction, directory)
                .unwrap_or_else(|| key.selection.label().to_string());
            lines.push(ReportLine {
                key: key.clone(),
                name,
                count,
                percentage: table.percentage(key, rules.percentage_scope),
            });
        }
    }
    debug!("render: {:?} lines", lines.len());
    Report {
        total_ballots: table.total_ballots(),
        total_nominal: table.total_nominal(),
        total_blank: table.total_blank(),
        total_null: table.total_null(),
        lines,
    }
}

impl Report {
    /// The text of the result file: the four totals, a blank line, then the detail lines.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Eleitores Aptos: {}", self.total_ballots)?;
        writeln!(f, "Total de Votos Nominais: {}", self.total_nominal)?;
        writeln!(f, "Brancos: {}", self.total_blank)?;
        writeln!(f, "Nulos: {}", self.total_null)?;
        writeln!(f)?;
        for l in self.lines.iter() {
            writeln!(
                f,
                "Candidato: {} | Cargo: {} | Estado: {} | Votos: {} ({:.2}%)",
                l.name, l.key.office, l.key.jurisdiction, l.count, l.percentage
            )?;
        }
        Ok(())
    }
}

/// The raw dump of every bucket, sorted by key.
pub fn render_boletim(table: &TallyTable) -> String {
    let mut s = String::from("Boletim de Urna\n\n");
    for (key, count) in table.iter() {
        s.push_str(&format!(
            "UF: {}, Cargo: {}, Número: {}, Votos: {}\n",
            key.jurisdiction, key.office, key.selection, count
        ));
    }
    s
}

/// Regroups the tally by office, ignoring the jurisdictions.
///
/// The name of a candidate is taken from the first jurisdiction (in sorted
/// order) where the directory knows it.
pub fn group_by_office(
    table: &TallyTable,
    directory: Option<&dyn CandidateDirectory>,
) -> Vec<OfficeGroup> {
    let mut res: Vec<OfficeGroup> = Vec::new();
    for office in table.offices() {
        let mut votes: BTreeMap<Selection, u64> = BTreeMap::new();
        let mut names: BTreeMap<Selection, String> = BTreeMap::new();
        for (key, count) in table.iter().filter(|(k, _)| k.office == office) {
            *votes.entry(key.selection.clone()).or_insert(0) += count;
            if !names.contains_key(&key.selection) {
                if let Some(name) =
                    display_name(&key.selection, office, &key.jurisdiction, directory)
                {
                    names.insert(key.selection.clone(), name);
                }
            }
        }
        for selection in votes.keys() {
            if !names.contains_key(selection) {
                names.insert(selection.clone(), selection.label().to_string());
            }
        }
        res.push(OfficeGroup {
            office,
            votes,
            names,
        });
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tally;
    use std::collections::HashMap;

    struct Directory(HashMap<(String, Office, String), String>);

    impl CandidateDirectory for Directory {
        fn resolve(&self, number: &str, office: Office, jurisdiction: &str) -> Option<String> {
            let jurisdiction = if office.is_nationwide() {
                ""
            } else {
                jurisdiction
            };
            self.0
                .get(&(number.to_string(), office, jurisdiction.to_string()))
                .cloned()
        }
    }

    fn directory() -> Directory {
        let mut m = HashMap::new();
        m.insert(
            ("10".to_string(), Office::President, "".to_string()),
            "Ana".to_string(),
        );
        m.insert(
            ("45".to_string(), Office::Governor, "SP".to_string()),
            "Bruno".to_string(),
        );
        Directory(m)
    }

    fn ballot(jurisdiction: &str, voter_id: &str, choices: &[(Office, &str)]) -> Ballot {
        Ballot {
            jurisdiction: jurisdiction.to_string(),
            voter_id: voter_id.to_string(),
            choices: choices
                .iter()
                .map(|(o, s)| (*o, Selection::from_label(s)))
                .collect(),
        }
    }

    fn sample() -> Vec<Ballot> {
        vec![
            ballot("SP", "1", &[(Office::Governor, "45"), (Office::President, "10")]),
            ballot("SP", "2", &[(Office::Governor, "Branco"), (Office::President, "20")]),
            ballot("RJ", "3", &[(Office::Governor, "45"), (Office::President, "10")]),
            ballot("RJ", "4", &[(Office::Governor, "Nulo"), (Office::President, "Branco")]),
            ballot("SP", "1", &[(Office::Governor, "Nulo"), (Office::President, "Nulo")]),
        ]
    }

    #[test]
    fn report_text() {
        let table = tally(&sample());
        let report = render(&table, None, &ReportRules::DEFAULT_RULES);
        let expected = "Eleitores Aptos: 8
Total de Votos Nominais: 5
Brancos: 2
Nulos: 1

Candidato: 45 | Cargo: G | Estado: RJ | Votos: 1 (25.00%)
Candidato: Nulo | Cargo: G | Estado: RJ | Votos: 1 (25.00%)
Candidato: 45 | Cargo: G | Estado: SP | Votos: 1 (25.00%)
Candidato: Branco | Cargo: G | Estado: SP | Votos: 1 (25.00%)
Candidato: 10 | Cargo: P | Estado: RJ | Votos: 1 (25.00%)
Candidato: Branco | Cargo: P | Estado: RJ | Votos: 1 (25.00%)
Candidato: 10 | Cargo: P | Estado: SP | Votos: 1 (25.00%)
Candidato: 20 | Cargo: P | Estado: SP | Votos: 1 (25.00%)
";
        assert_eq!(report.to_text(), expected);
        assert_eq!(format!("{}", report), expected);
    }

    #[test]
    fn report_resolves_names() {
        let table = tally(&sample());
        let d = directory();
        let report = render(&table, Some(&d), &ReportRules::DEFAULT_RULES);
        let names: Vec<&str> = report.lines.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["45", "Nulo", "Bruno", "Branco", "Ana", "Branco", "Ana", "20"]
        );
    }

    #[test]
    fn report_per_jurisdiction_scope() {
        let table = tally(&sample());
        let rules = ReportRules {
            percentage_scope: PercentageScope::JurisdictionOffice,
        };
        let report = render(&table, None, &rules);
        assert!(report.lines.iter().all(|l| l.percentage == 50.0));
    }

    #[test]
    fn report_is_deterministic() {
        let ballots = sample();
        let d = directory();
        let first = render(&tally(&ballots), Some(&d), &ReportRules::DEFAULT_RULES).to_text();
        let second = render(&tally(&ballots), Some(&d), &ReportRules::DEFAULT_RULES).to_text();
        assert_eq!(first, second);
    }

    #[test]
    fn report_two_decimals() {
        let ballots = vec![
            ballot("SP", "1", &[(Office::Senator, "111")]),
            ballot("SP", "2", &[(Office::Senator, "111")]),
            ballot("SP", "3", &[(Office::Senator, "222")]),
        ];
        let report = render(&tally(&ballots), None, &ReportRules::DEFAULT_RULES);
        let text = report.to_text();
        assert!(text.contains("Candidato: 111 | Cargo: S | Estado: SP | Votos: 2 (66.67%)"));
        assert!(text.contains("Candidato: 222 | Cargo: S | Estado: SP | Votos: 1 (33.33%)"));
    }

    #[test]
    fn blank_senator_votes() {
        let ballots = vec![
            ballot("RJ", "1", &[(Office::Senator, "Branco")]),
            ballot("RJ", "2", &[(Office::Senator, "Branco")]),
        ];
        let report = render(&tally(&ballots), None, &ReportRules::DEFAULT_RULES);
        assert_eq!(report.total_blank, 2);
        assert_eq!(
            report.lines.last().map(|l| l.name.clone()),
            Some("Branco".to_string())
        );
        assert!(report
            .to_text()
            .ends_with("Candidato: Branco | Cargo: S | Estado: RJ | Votos: 2 (100.00%)\n"));
    }

    #[test]
    fn boletim_text() {
        let table = tally(&sample());
        let expected = "Boletim de Urna

UF: RJ, Cargo: G, Número: 45, Votos: 1
UF: RJ, Cargo: G, Número: Nulo, Votos: 1
UF: RJ, Cargo: P, Número: 10, Votos: 1
UF: RJ, Cargo: P, Número: Branco, Votos: 1
UF: SP, Cargo: G, Número: 45, Votos: 1
UF: SP, Cargo: G, Número: Branco, Votos: 1
UF: SP, Cargo: P, Número: 10, Votos: 1
UF: SP, Cargo: P, Número: 20, Votos: 1
";
        assert_eq!(render_boletim(&table), expected);
    }

    #[test]
    fn groups_by_office() {
        let table = tally(&sample());
        let d = directory();
        let groups = group_by_office(&table, Some(&d));
        assert_eq!(groups.len(), 2);

        let governor = &groups[0];
        assert_eq!(governor.office, Office::Governor);
        assert_eq!(
            governor.votes.get(&Selection::Candidate("45".to_string())),
            Some(&2)
        );
        // Only known in SP, found even though RJ sorts first.
        assert_eq!(
            governor.names.get(&Selection::Candidate("45".to_string())),
            Some(&"Bruno".to_string())
        );
        assert_eq!(
            governor.names.get(&Selection::Null),
            Some(&"Nulo".to_string())
        );

        let president = &groups[1];
        assert_eq!(president.office, Office::President);
        assert_eq!(president.votes.values().sum::<u64>(), 4);
        assert_eq!(
            president.names.get(&Selection::Candidate("20".to_string())),
            Some(&"20".to_string())
        );
    }

    #[test]
    fn empty_table_report() {
        let report = render(&TallyTable::new(), None, &ReportRules::DEFAULT_RULES);
        assert!(report.lines.is_empty());
        assert_eq!(
            report.to_text(),
            "Eleitores Aptos: 0\nTotal de Votos Nominais: 0\nBrancos: 0\nNulos: 0\n\n"
        );
        assert!(group_by_office(&TallyTable::new(), None).is_empty());
    }
}
