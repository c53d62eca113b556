pub mod builder;
mod config;
pub mod manual;
pub mod report;

use log::{debug, info, warn};

use std::{borrow::Borrow, collections::HashSet};

pub use crate::config::*;

/// Counts the ballots into per-bucket totals.
///
/// Ballots are read in order. The first ballot of a given (jurisdiction, voter)
/// pair is authoritative: any later ballot for the same pair is dropped in
/// full, without merging its offices into the first one.
///
/// An empty input gives an empty table. Use [run_tally] to tell both apart.
pub fn tally<B: Borrow<Ballot>>(ballots: impl IntoIterator<Item = B>) -> TallyTable {
    tally_internal(ballots).0
}

/// Runs a complete tally over the stored ballots.
///
/// Returns [TallyErrors::NoBallotsAvailable] when there is nothing to count.
pub fn run_tally(coll: &[Ballot]) -> Result<TallyOutcome, TallyErrors> {
    info!("run_tally: Processing {:?} ballots", coll.len());
    if coll.is_empty() {
        return Err(TallyErrors::NoBallotsAvailable);
    }
    let (table, duplicates_skipped) = tally_internal(coll);
    info!(
        "run_tally: {:?} buckets, {:?} duplicate ballots skipped",
        table.len(),
        duplicates_skipped
    );
    Ok(TallyOutcome {
        table,
        ballots_read: coll.len() as u64,
        duplicates_skipped,
    })
}

fn tally_internal<B: Borrow<Ballot>>(ballots: impl IntoIterator<Item = B>) -> (TallyTable, u64) {
    let mut table = TallyTable::new();
    let mut counted: HashSet<(String, String)> = HashSet::new();
    let mut duplicates: u64 = 0;

    for b in ballots {
        let ballot: &Ballot = b.borrow();
        let voter = (ballot.jurisdiction.clone(), ballot.voter_id.clone());
        if counted.contains(&voter) {
            warn!(
                "tally: voter {} in {} was already counted, skipping ballot",
                ballot.voter_id, ballot.jurisdiction
            );
            duplicates += 1;
            continue;
        }
        counted.insert(voter);

        debug!("tally: ballot {:?}", ballot);
        for (office, selection) in ballot.choices.iter() {
            table.record(TallyKey {
                jurisdiction: ballot.jurisdiction.clone(),
                office: *office,
                selection: selection.clone(),
            });
        }
    }
    (table, duplicates)
}

impl TallyTable {
    pub fn new() -> TallyTable {
        TallyTable::default()
    }

    fn record(&mut self, key: TallyKey) {
        *self.buckets.entry(key).or_insert(VoteCount::EMPTY) += VoteCount::ONE;
    }

    /// The count of a bucket, 0 if nobody voted for it.
    pub fn get(&self, key: &TallyKey) -> u64 {
        self.buckets.get(key).map(|vc| vc.0).unwrap_or(0)
    }

    /// All the buckets, in the natural order of their keys.
    pub fn iter(&self) -> impl Iterator<Item = (&TallyKey, u64)> {
        self.buckets.iter().map(|(k, vc)| (k, vc.0))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The offices that received at least one bucket, in ballot order.
    pub fn offices(&self) -> Vec<Office> {
        Office::ALL
            .iter()
            .filter(|o| self.buckets.keys().any(|k| k.office == **o))
            .cloned()
            .collect()
    }

    /// The distinct jurisdictions, sorted.
    pub fn jurisdictions(&self) -> Vec<&str> {
        let mut res: Vec<&str> = self
            .buckets
            .keys()
            .map(|k| k.jurisdiction.as_str())
            .collect();
        res.dedup();
        res
    }

    fn sum_where(&self, pred: impl Fn(&TallyKey) -> bool) -> u64 {
        let total: VoteCount = self
            .buckets
            .iter()
            .filter(|(k, _)| pred(*k))
            .map(|(_, vc)| *vc)
            .sum();
        total.0
    }

    pub fn total_ballots(&self) -> u64 {
        self.sum_where(|_| true)
    }

    pub fn total_nominal(&self) -> u64 {
        self.sum_where(|k| k.selection.is_nominal())
    }

    pub fn total_blank(&self) -> u64 {
        self.sum_where(|k| k.selection == Selection::Blank)
    }

    pub fn total_null(&self) -> u64 {
        self.sum_where(|k| k.selection == Selection::Null)
    }

    /// Sum of the buckets of an office, restricted to one jurisdiction if provided.
    pub fn office_total(&self, office: Office, jurisdiction: Option<&str>) -> u64 {
        self.sum_where(|k| {
            k.office == office && jurisdiction.map_or(true, |j| k.jurisdiction == j)
        })
    }

    /// Share of the bucket among its office, in percent.
    ///
    /// The result is within [0, 100] and is 0 when the office has no vote.
    pub fn percentage(&self, key: &TallyKey, scope: PercentageScope) -> f64 {
        let denominator = match scope {
            PercentageScope::Office => self.office_total(key.office, None),
            PercentageScope::JurisdictionOffice => {
                self.office_total(key.office, Some(key.jurisdiction.as_str()))
            }
        };
        if denominator == 0 {
            0.0
        } else {
            (self.get(key) as f64 / denominator as f64) * 100.0
        }
    }
}

impl FromIterator<(TallyKey, u64)> for TallyTable {
    fn from_iter<I: IntoIterator<Item = (TallyKey, u64)>>(iter: I) -> Self {
        let mut table = TallyTable::new();
        for (key, count) in iter {
            *table.buckets.entry(key).or_insert(VoteCount::EMPTY) += VoteCount(count);
        }
        table
    }
}
