//! Voting: group candidate attempts by test-prediction fingerprint, rank the
//! groups, and emit up to K final attempts diversity-first.
//!
//! Everything here is a pure function of the input attempts; the result is
//! independent of input ordering up to the documented tiebreaks.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use gridmind_domain::{Attempt, Fingerprint, Grid};

/// Attempts sharing one test-prediction fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionGroup {
    pub fingerprint: Fingerprint,
    /// Members ordered best-representative-first: aggregate score descending,
    /// then iteration index ascending, then expert id.
    pub members: Vec<Attempt>,
    /// Passers, plus failed members with the failed-match hint when the group
    /// contains a passer.
    pub vote_count: u32,
    pub best_aggregate_score: f32,
    pub contains_passer: bool,
    /// Smallest iteration index across members; earlier solutions win ties.
    pub earliest_iteration: usize,
}

/// One emitted attempt, aligned to the puzzle's test inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedAttempt {
    pub predictions: Vec<Option<Grid>>,
    /// Absent on null placeholder attempts.
    pub fingerprint: Option<Fingerprint>,
    pub vote_count: u32,
    pub from_passer: bool,
}

impl RankedAttempt {
    /// Placeholder emitted when no candidate produced any prediction.
    fn null(test_count: usize) -> Self {
        Self {
            predictions: vec![None; test_count],
            fingerprint: None,
            vote_count: 0,
            from_passer: false,
        }
    }
}

/// Group attempts by fingerprint and rank the groups.
///
/// All-null attempts are dropped. Duplicate attempts (same expert id and
/// iteration index) collapse to one member, so replayed input cannot inflate
/// a group's votes. Ranking is lexicographic, descending: contains_passer,
/// vote_count, best_aggregate_score, then ascending earliest iteration, with
/// the fingerprint itself as the final deterministic tiebreak.
pub fn tally_groups(attempts: &[Attempt]) -> Vec<SolutionGroup> {
    let mut by_fingerprint: HashMap<Fingerprint, Vec<&Attempt>> = HashMap::new();
    for attempt in attempts {
        let Some(fingerprint) = Fingerprint::from_predictions(&attempt.test_predictions) else {
            continue;
        };
        let members = by_fingerprint.entry(fingerprint).or_default();
        let duplicate = members.iter().any(|m| {
            m.expert_id == attempt.expert_id && m.iteration_index == attempt.iteration_index
        });
        if !duplicate {
            members.push(attempt);
        }
    }

    let mut groups: Vec<SolutionGroup> = by_fingerprint
        .into_iter()
        .map(|(fingerprint, mut members)| {
            members.sort_by(|a, b| {
                b.aggregate_score
                    .total_cmp(&a.aggregate_score)
                    .then(a.iteration_index.cmp(&b.iteration_index))
                    .then(a.expert_id.cmp(&b.expert_id))
            });

            let contains_passer = members.iter().any(|m| m.all_pass);
            let passers = members.iter().filter(|m| m.all_pass).count();
            let reinforcing = if contains_passer {
                members
                    .iter()
                    .filter(|m| !m.all_pass && m.failed_match_votes)
                    .count()
            } else {
                0
            };
            let best_aggregate_score = members
                .iter()
                .map(|m| m.aggregate_score)
                .fold(0.0_f32, f32::max);
            let earliest_iteration = members
                .iter()
                .map(|m| m.iteration_index)
                .min()
                .unwrap_or(0);

            SolutionGroup {
                fingerprint,
                members: members.into_iter().cloned().collect(),
                vote_count: (passers + reinforcing) as u32,
                best_aggregate_score,
                contains_passer,
                earliest_iteration,
            }
        })
        .collect();

    groups.sort_by(|a, b| {
        b.contains_passer
            .cmp(&a.contains_passer)
            .then(b.vote_count.cmp(&a.vote_count))
            .then(b.best_aggregate_score.total_cmp(&a.best_aggregate_score))
            .then(a.earliest_iteration.cmp(&b.earliest_iteration))
            .then(a.fingerprint.as_str().cmp(b.fingerprint.as_str()))
    });
    groups
}

/// Emit up to `k` attempts, diversity-first.
///
/// Walk the ranked groups taking each group's best member, and only return
/// to a group for its next-best member once every group has contributed one.
/// When no groups exist, emit `k` null attempts.
pub fn select_ranked(groups: &[SolutionGroup], k: usize, test_count: usize) -> Vec<RankedAttempt> {
    if groups.is_empty() {
        return (0..k).map(|_| RankedAttempt::null(test_count)).collect();
    }

    let mut out = Vec::with_capacity(k);
    let mut depth = 0;
    while out.len() < k {
        let mut yielded = false;
        for group in groups {
            if let Some(member) = group.members.get(depth) {
                out.push(RankedAttempt {
                    predictions: member.test_predictions.clone(),
                    fingerprint: Some(group.fingerprint.clone()),
                    vote_count: group.vote_count,
                    from_passer: group.contains_passer,
                });
                yielded = true;
                if out.len() == k {
                    break;
                }
            }
        }
        if !yielded {
            break;
        }
        depth += 1;
    }
    out
}

/// Convenience composition: tally then select.
pub fn vote(attempts: &[Attempt], k: usize, test_count: usize) -> Vec<RankedAttempt> {
    let groups = tally_groups(attempts);
    select_ranked(&groups, k, test_count)
}
