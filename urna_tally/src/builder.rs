pub use crate::config::*;

use std::collections::BTreeMap;

/// A builder for assembling a ballot one office at a time.
///
/// ```
/// use urna_tally::builder::BallotBuilder;
/// use urna_tally::{Office, Selection};
/// # use urna_tally::BallotErrors;
///
/// let mut builder = BallotBuilder::new("SP", "1001")?;
/// for office in Office::ALL {
///     builder.choose(office, Selection::Blank)?;
/// }
/// let ballot = builder.build()?;
/// assert_eq!(ballot.choices.len(), 5);
///
/// # Ok::<(), BallotErrors>(())
/// ```
pub struct BallotBuilder {
    _jurisdiction: String,
    _voter_id: String,
    _choices: BTreeMap<Office, Selection>,
}

impl BallotBuilder {
    pub fn new(jurisdiction: &str, voter_id: &str) -> Result<BallotBuilder, BallotErrors> {
        let jurisdiction = jurisdiction.trim();
        let voter_id = voter_id.trim();
        if jurisdiction.is_empty() {
            return Err(BallotErrors::EmptyJurisdiction);
        }
        if voter_id.is_empty() {
            return Err(BallotErrors::EmptyVoterId);
        }
        Ok(BallotBuilder {
            _jurisdiction: jurisdiction.to_string(),
            _voter_id: voter_id.to_string(),
            _choices: BTreeMap::new(),
        })
    }

    /// Records the selection for an office.
    pub fn choose(&mut self, office: Office, selection: Selection) -> Result<(), BallotErrors> {
        if self._choices.contains_key(&office) {
            return Err(BallotErrors::OfficeAlreadyChosen(office));
        }
        let selection = match selection {
            Selection::Candidate(number) if number.trim().is_empty() => {
                return Err(BallotErrors::EmptyCandidateNumber(office));
            }
            Selection::Candidate(number) => Selection::Candidate(number.trim().to_string()),
            s => s,
        };
        if selection.has_reserved_number() {
            return Err(BallotErrors::ReservedCandidateNumber(office));
        }
        self._choices.insert(office, selection);
        Ok(())
    }

    /// The offices that still have no selection, in ballot order.
    pub fn pending_offices(&self) -> Vec<Office> {
        Office::ALL
            .iter()
            .filter(|o| !self._choices.contains_key(*o))
            .cloned()
            .collect()
    }

    /// Finishes the ballot. Every office must have a selection.
    pub fn build(self) -> Result<Ballot, BallotErrors> {
        if let Some(office) = self.pending_offices().first() {
            return Err(BallotErrors::MissingOffice(*office));
        }
        Ok(Ballot {
            jurisdiction: self._jurisdiction,
            voter_id: self._voter_id,
            choices: self._choices,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_ballot() {
        let mut builder = BallotBuilder::new(" SP ", "42").unwrap();
        builder
            .choose(Office::FederalDeputy, Selection::Candidate(" 1234 ".to_string()))
            .unwrap();
        builder.choose(Office::StateDeputy, Selection::Blank).unwrap();
        builder.choose(Office::Senator, Selection::Null).unwrap();
        builder
            .choose(Office::Governor, Selection::Candidate("45".to_string()))
            .unwrap();
        builder
            .choose(Office::President, Selection::Candidate("13".to_string()))
            .unwrap();
        let ballot = builder.build().unwrap();
        assert_eq!(ballot.jurisdiction, "SP");
        assert_eq!(
            ballot.choices.get(&Office::FederalDeputy),
            Some(&Selection::Candidate("1234".to_string()))
        );
    }

    #[test]
    fn rejects_second_choice_for_office() {
        let mut builder = BallotBuilder::new("SP", "42").unwrap();
        builder.choose(Office::Senator, Selection::Blank).unwrap();
        assert_eq!(
            builder.choose(Office::Senator, Selection::Null),
            Err(BallotErrors::OfficeAlreadyChosen(Office::Senator))
        );
    }

    #[test]
    fn rejects_incomplete_ballot() {
        let mut builder = BallotBuilder::new("SP", "42").unwrap();
        builder.choose(Office::FederalDeputy, Selection::Blank).unwrap();
        assert_eq!(
            builder.pending_offices(),
            vec![
                Office::StateDeputy,
                Office::Senator,
                Office::Governor,
                Office::President
            ]
        );
        assert_eq!(
            builder.build().err(),
            Some(BallotErrors::MissingOffice(Office::StateDeputy))
        );
    }

    #[test]
    fn rejects_missing_identity() {
        assert_eq!(
            BallotBuilder::new("", "42").err(),
            Some(BallotErrors::EmptyJurisdiction)
        );
        assert_eq!(
            BallotBuilder::new("SP", "  ").err(),
            Some(BallotErrors::EmptyVoterId)
        );
        let mut builder = BallotBuilder::new("SP", "42").unwrap();
        assert_eq!(
            builder.choose(Office::Governor, Selection::Candidate("".to_string())),
            Err(BallotErrors::EmptyCandidateNumber(Office::Governor))
        );
    }

    #[test]
    fn rejects_labels_as_candidate_numbers() {
        let mut builder = BallotBuilder::new("SP", "42").unwrap();
        assert_eq!(
            builder.choose(Office::FederalDeputy, Selection::Candidate("Nulo".to_string())),
            Err(BallotErrors::ReservedCandidateNumber(Office::FederalDeputy))
        );
        assert_eq!(
            builder.choose(Office::Senator, Selection::Candidate(" Branco ".to_string())),
            Err(BallotErrors::ReservedCandidateNumber(Office::Senator))
        );
        // The office is still open after a refused selection.
        builder.choose(Office::FederalDeputy, Selection::Null).unwrap();
        assert_eq!(
            builder.choose(Office::StateDeputy, Selection::Candidate("NULO".to_string())),
            Ok(())
        );
    }
}
