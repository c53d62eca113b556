// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;
use std::ops::{Add, AddAssign};

/// The elected positions that appear on every ballot.
///
/// The declaration order is the order in which offices are presented to the
/// voter and the order in which they appear in the reports.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Office {
    FederalDeputy,
    StateDeputy,
    Senator,
    Governor,
    /// The only nationwide office: its candidates are not tied to a jurisdiction.
    President,
}

impl Office {
    pub const ALL: [Office; 5] = [
        Office::FederalDeputy,
        Office::StateDeputy,
        Office::Senator,
        Office::Governor,
        Office::President,
    ];

    /// The one-letter code used in the registry files, the ballot log and the reports.
    pub fn code(&self) -> &'static str {
        match self {
            Office::FederalDeputy => "F",
            Office::StateDeputy => "E",
            Office::Senator => "S",
            Office::Governor => "G",
            Office::President => "P",
        }
    }

    pub fn from_code(code: &str) -> Option<Office> {
        Office::ALL.iter().find(|o| o.code() == code).cloned()
    }

    /// The full name of the office, as shown to voters.
    pub fn title(&self) -> &'static str {
        match self {
            Office::FederalDeputy => "Deputado Federal",
            Office::StateDeputy => "Deputado Estadual",
            Office::Senator => "Senador",
            Office::Governor => "Governador",
            Office::President => "Presidente",
        }
    }

    pub fn is_nationwide(&self) -> bool {
        matches!(self, Office::President)
    }
}

impl Display for Office {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The value recorded on a ballot for one office.
///
/// The variant order gives the natural ordering used in reports: candidate
/// numbers first (compared as text), then blank, then null.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub enum Selection {
    /// The number of a candidate, as typed by the voter.
    Candidate(String),
    Blank,
    /// The voter explicitly chose to void this office.
    Null,
}

pub const BLANK_LABEL: &str = "Branco";
pub const NULL_LABEL: &str = "Nulo";

impl Selection {
    /// The textual form used in files: the candidate number, `Branco` or `Nulo`.
    pub fn label(&self) -> &str {
        match self {
            Selection::Candidate(number) => number.as_str(),
            Selection::Blank => BLANK_LABEL,
            Selection::Null => NULL_LABEL,
        }
    }

    pub fn from_label(label: &str) -> Selection {
        match label {
            BLANK_LABEL => Selection::Blank,
            NULL_LABEL => Selection::Null,
            number => Selection::Candidate(number.to_string()),
        }
    }

    /// True for a vote given to a candidate.
    pub fn is_nominal(&self) -> bool {
        matches!(self, Selection::Candidate(_))
    }

    /// True for a candidate number that reads as `Branco` or `Nulo`, and would be
    /// confused with a blank or a null vote once written.
    pub fn has_reserved_number(&self) -> bool {
        match self {
            Selection::Candidate(number) => number == BLANK_LABEL || number == NULL_LABEL,
            _ => false,
        }
    }
}

impl Display for Selection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One voter's choices, cast in a single session at a terminal.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub jurisdiction: String,
    pub voter_id: String,
    pub choices: BTreeMap<Office, Selection>,
}

impl Ballot {
    /// Checks that every selection keeps its meaning through its textual form.
    pub fn check_labels(&self) -> Result<(), BallotErrors> {
        match self.choices.iter().find(|(_, s)| s.has_reserved_number()) {
            Some((office, _)) => Err(BallotErrors::ReservedCandidateNumber(*office)),
            None => Ok(()),
        }
    }
}

// ******** Output data structures *********

/// Identifies one aggregation bucket.
///
/// The field order defines the ordering of the detail lines in the reports.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct TallyKey {
    pub jurisdiction: String,
    pub office: Office,
    pub selection: Selection,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash, Default)]
pub(crate) struct VoteCount(pub(crate) u64);

impl VoteCount {
    pub(crate) const EMPTY: VoteCount = VoteCount(0);
    pub(crate) const ONE: VoteCount = VoteCount(1);
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self: VoteCount, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0 + rhs.0)
    }
}

/// The vote count of every bucket, produced once per tally run.
///
/// Invariant: the counts sharing one (jurisdiction, office) add up to the
/// number of distinct voters of that jurisdiction who filled that office.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct TallyTable {
    pub(crate) buckets: BTreeMap<TallyKey, VoteCount>,
}

/// The result of a complete tally run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyOutcome {
    pub table: TallyTable,
    /// Number of ballots in the input, duplicates included.
    pub ballots_read: u64,
    /// Number of ballots discarded because their voter had already been counted.
    pub duplicates_skipped: u64,
}

/// Errors that prevent a tally from producing a result.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyErrors {
    /// There is nothing to count. Distinct from a tally that happens to be empty.
    NoBallotsAvailable,
}

impl Error for TallyErrors {}

impl Display for TallyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyErrors::NoBallotsAvailable => write!(f, "no ballots available to tally"),
        }
    }
}

/// Errors raised while assembling a ballot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum BallotErrors {
    EmptyJurisdiction,
    EmptyVoterId,
    EmptyCandidateNumber(Office),
    /// The candidate number is the label of a blank or a null vote.
    ReservedCandidateNumber(Office),
    /// Each office accepts exactly one selection.
    OfficeAlreadyChosen(Office),
    MissingOffice(Office),
}

impl Error for BallotErrors {}

impl Display for BallotErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BallotErrors::EmptyJurisdiction => write!(f, "the ballot has no jurisdiction"),
            BallotErrors::EmptyVoterId => write!(f, "the ballot has no voter id"),
            BallotErrors::EmptyCandidateNumber(o) => {
                write!(f, "empty candidate number for {}", o.title())
            }
            BallotErrors::ReservedCandidateNumber(o) => {
                write!(f, "reserved candidate number for {}", o.title())
            }
            BallotErrors::OfficeAlreadyChosen(o) => {
                write!(f, "a selection was already made for {}", o.title())
            }
            BallotErrors::MissingOffice(o) => write!(f, "no selection made for {}", o.title()),
        }
    }
}

// ********* Configuration **********

/// Which buckets form the denominator of a percentage.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum PercentageScope {
    /// All the buckets of the same office, across every jurisdiction.
    Office,
    /// Only the buckets of the same office within the same jurisdiction.
    JurisdictionOffice,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportRules {
    pub percentage_scope: PercentageScope,
}

impl ReportRules {
    pub const DEFAULT_RULES: ReportRules = ReportRules {
        percentage_scope: PercentageScope::Office,
    };
}

impl Default for ReportRules {
    fn default() -> Self {
        ReportRules::DEFAULT_RULES
    }
}
