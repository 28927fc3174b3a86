//! Round execution and bracket bookkeeping.
//!
//! [`execute_round`] resolves every match of a round and only returns once all of them have a
//! winner: that return is the round barrier. [`advance_bracket`] then produces a new bracket
//! snapshot with the next round seated; the previous snapshot is never touched.
//!
//! Resolution policy of a match:
//! - one side is a BYE: the other side advances, nothing is played;
//! - two real players: the match function is called; on a draw, or if it fails, player 1
//!   advances;
//! - one empty slot: the other side advances.

use std::future::Future;

use futures_util::{stream, StreamExt};
use serde::Serialize;
use tracing::{trace, warn};

use crate::{
    arbitrator::MatchOutcome,
    bracket::{Bracket, Match, Round},
    error::TournamentError,
    player::Player,
};

/// How a match got its winner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Resolution {
    /// One side was a BYE.
    Bye,
    /// One slot was empty.
    Walkover,
    Played(MatchOutcome),
    /// The match function failed; player 1 advanced.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchRecord {
    #[serde(rename = "match")]
    pub pairing: Match,
    pub result: Resolution,
    pub winner: Player,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundResult {
    pub round: usize,
    pub matches: Vec<MatchRecord>,
}

impl RoundResult {
    /// Winners in match order.
    pub fn winners(&self) -> Vec<Player> {
        self.matches.iter().map(|m| m.winner.clone()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Winners {
    pub winner: Option<Player>,
    pub runner_up: Option<Player>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundInfo {
    pub round: usize,
    pub total_rounds: usize,
    pub is_first: bool,
    pub is_final: bool,
    pub is_semifinal: bool,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percentage: u8,
}

/// Resolves every match of `round`, with at most `max_parallel` matches in flight.
///
/// Results come back in match order whatever the completion order.
pub async fn execute_round<F, Fut>(
    round: &Round,
    max_parallel: usize,
    match_fn: F,
) -> Result<RoundResult, TournamentError>
where
    F: Fn([Player; 2]) -> Fut,
    Fut: Future<Output = anyhow::Result<MatchOutcome>>,
{
    let number = round.round;
    let match_fn = &match_fn;
    let records = stream::iter(round.matches.iter().enumerate())
        .map(|(index, pairing)| resolve_match(number, index, pairing, match_fn))
        .buffered(max_parallel.max(1))
        .collect::<Vec<_>>()
        .await;

    Ok(RoundResult {
        round: number,
        matches: records.into_iter().collect::<Result<_, _>>()?,
    })
}

async fn resolve_match<F, Fut>(
    round: usize,
    index: usize,
    pairing: &Match,
    match_fn: &F,
) -> Result<MatchRecord, TournamentError>
where
    F: Fn([Player; 2]) -> Fut,
    Fut: Future<Output = anyhow::Result<MatchOutcome>>,
{
    let (result, winner) = match (&pairing.player1, &pairing.player2) {
        (Some(p1), Some(p2)) if p1.is_bye || p2.is_bye => {
            // BYE against BYE: a BYE advances and gets eliminated later on
            let winner = if p1.is_bye && !p2.is_bye { p2 } else { p1 };
            trace!(%pairing, %winner, "bye");
            (Resolution::Bye, winner.clone())
        }
        (Some(p1), Some(p2)) => match match_fn([p1.clone(), p2.clone()]).await {
            Ok(outcome) => {
                let winner = match &outcome.winner {
                    Some(w) if w == p1 || w == p2 => w.clone(),
                    Some(w) => {
                        warn!(%pairing, stranger = %w, "winner is not part of the match");
                        p1.clone()
                    }
                    None => p1.clone(),
                };
                (Resolution::Played(outcome), winner)
            }
            Err(e) => {
                let error = format!("{e:#}");
                warn!(%pairing, %error, "match failed, {} advances", p1.name);
                (Resolution::Failed { error }, p1.clone())
            }
        },
        (Some(p), None) | (None, Some(p)) => (Resolution::Walkover, p.clone()),
        (None, None) => return Err(TournamentError::EmptyMatch { round, index }),
    };

    Ok(MatchRecord {
        pairing: pairing.clone(),
        result,
        winner,
    })
}

/// Returns a copy of `bracket` where the round after `round_number` is seated with
/// `winners`, pairwise and in order. The last round has no successor: the copy is unchanged.
pub fn advance_bracket(
    bracket: &Bracket,
    round_number: usize,
    winners: &[Player],
) -> Result<Bracket, TournamentError> {
    let mut next = bracket.clone();
    // 1-based round number == 0-based index of the following round
    let Some(target) = next.rounds.get_mut(round_number) else {
        return Ok(next);
    };

    let expected = target.matches.len() * 2;
    if winners.len() != expected {
        return Err(TournamentError::WinnerCount {
            round: round_number,
            expected,
            got: winners.len(),
        });
    }

    for (slot, pair) in target.matches.iter_mut().zip(winners.chunks_exact(2)) {
        slot.player1 = Some(pair[0].clone());
        slot.player2 = Some(pair[1].clone());
    }
    Ok(next)
}

/// True when the last round is a single, fully seated match.
pub fn is_tournament_complete(bracket: &Bracket) -> bool {
    bracket
        .rounds
        .last()
        .is_some_and(|r| r.matches.len() == 1 && r.matches[0].is_filled())
}

/// Winner and runner-up read from the final's slots: player 1 is the winner, player 2 the
/// runner-up, whatever the final's recorded result says.
///
/// Use [`final_match_winner`] to get the recorded result.
pub fn get_tournament_winners(bracket: &Bracket) -> Winners {
    match bracket.final_match() {
        Some(m) => Winners {
            winner: m.player1.clone(),
            runner_up: m.player2.clone(),
        },
        None => Winners::default(),
    }
}

/// Recorded winner of the last match of the last played round.
pub fn final_match_winner(results: &[RoundResult]) -> Option<&Player> {
    results
        .last()
        .and_then(|r| r.matches.last())
        .map(|m| &m.winner)
}

pub fn get_round_info(round: usize, total_rounds: usize) -> RoundInfo {
    let remaining = total_rounds.saturating_sub(round);
    let name = match remaining {
        0 => "Final".to_string(),
        1 => "Semifinal".to_string(),
        2 => "Cuartos de final".to_string(),
        _ => format!("Ronda {round}"),
    };
    RoundInfo {
        round,
        total_rounds,
        is_first: round == 1,
        is_final: round == total_rounds,
        is_semifinal: total_rounds >= 2 && round + 1 == total_rounds,
        name,
    }
}

/// Share of the bracket's matches already resolved, as a rounded percentage.
pub fn calculate_progress(bracket: &Bracket, completed_matches: usize) -> Progress {
    let total = bracket.total_matches();
    let completed = completed_matches.min(total);
    let percentage = if total == 0 {
        0
    } else {
        ((completed * 100 + total / 2) / total) as u8
    };
    Progress {
        completed,
        total,
        percentage,
    }
}
