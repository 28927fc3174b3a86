//! Bracket construction for single-elimination tournaments.
//!
//! A [`Bracket`] is the ordered list of [`Round`]s of a knockout. Round 1 is fully populated,
//! padded with BYE sentinels when the player count is not a power of two. Later rounds are
//! pre-allocated with empty slots that get filled as earlier rounds resolve
//! (see [`advance_bracket`](crate::round_executor::advance_bracket)).
//!
//! Every function here is pure apart from the randomness source, which is always injected so
//! that seeding can be reproduced.

use std::fmt::Display;

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{error::ValidationError, player::Player};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 12;
pub const MIN_PORT: u16 = 3000;
pub const MAX_PORT: u16 = 9999;

/// Two slots. Either may be empty while the previous round is unresolved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub player1: Option<Player>,
    pub player2: Option<Player>,
}

impl Match {
    pub fn new(player1: Player, player2: Player) -> Self {
        Self {
            player1: Some(player1),
            player2: Some(player2),
        }
    }

    /// Number of BYE sentinels seated in this match.
    pub fn bye_count(&self) -> usize {
        [&self.player1, &self.player2]
            .into_iter()
            .flatten()
            .filter(|p| p.is_bye)
            .count()
    }

    pub fn is_filled(&self) -> bool {
        self.player1.is_some() && self.player2.is_some()
    }
}

impl Display for Match {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = |slot: &Option<Player>| {
            slot.as_ref()
                .map_or_else(|| "?".to_string(), |p| p.name.clone())
        };
        write!(f, "[{} VS {}]", name(&self.player1), name(&self.player2))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// 1-based round number.
    pub round: usize,
    pub matches: Vec<Match>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bracket {
    pub rounds: Vec<Round>,
}

impl Bracket {
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Round by its 1-based number.
    pub fn round(&self, number: usize) -> Option<&Round> {
        number.checked_sub(1).and_then(|i| self.rounds.get(i))
    }

    pub fn final_match(&self) -> Option<&Match> {
        self.rounds.last().and_then(|r| r.matches.last())
    }

    pub fn total_matches(&self) -> usize {
        self.rounds.iter().map(|r| r.matches.len()).sum()
    }
}

/// Checks a typed roster.
///
/// BYE sentinels and human seats are exempt from the port rule: neither is a service.
pub fn validate(players: &[Player]) -> Result<(), ValidationError> {
    check_count(players.len())?;
    for (index, player) in players.iter().enumerate() {
        if player.name.is_empty() {
            return Err(ValidationError::MissingName { index });
        }
        if !player.is_bot() {
            continue;
        }
        match player.port {
            Some(port) if (MIN_PORT..=MAX_PORT).contains(&port) => {}
            port => {
                return Err(ValidationError::InvalidPort {
                    name: player.name.clone(),
                    port: port.map(i64::from),
                    min: MIN_PORT,
                    max: MAX_PORT,
                })
            }
        }
    }
    Ok(())
}

/// Checks an untyped roster (e.g. a JSON file or request body) and converts it.
pub fn parse_roster(value: &Value) -> Result<Vec<Player>, ValidationError> {
    let entries = value.as_array().ok_or(ValidationError::NotAList)?;
    check_count(entries.len())?;

    let mut players = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let object = entry
            .as_object()
            .ok_or(ValidationError::NotAnObject { index })?;

        let name = match object.get("name").and_then(Value::as_str) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(ValidationError::MissingName { index }),
        };

        let flag = |key: &str| object.get(key).and_then(Value::as_bool).unwrap_or(false);
        if !flag("isBye") && !flag("isHuman") {
            let port = object.get("port").and_then(Value::as_i64);
            let in_range = port.is_some_and(|p| (MIN_PORT as i64..=MAX_PORT as i64).contains(&p));
            if !in_range {
                return Err(ValidationError::InvalidPort {
                    name,
                    port,
                    min: MIN_PORT,
                    max: MAX_PORT,
                });
            }
        }

        let player = serde_json::from_value::<Player>(entry.clone()).map_err(|e| {
            ValidationError::Malformed {
                index,
                reason: e.to_string(),
            }
        })?;
        players.push(player);
    }

    validate(&players)?;
    Ok(players)
}

fn check_count(count: usize) -> Result<(), ValidationError> {
    if (MIN_PLAYERS..=MAX_PLAYERS).contains(&count) {
        Ok(())
    } else {
        Err(ValidationError::PlayerCount {
            count,
            min: MIN_PLAYERS,
            max: MAX_PLAYERS,
        })
    }
}

/// Fisher–Yates permutation of `players`. The input is left untouched.
pub fn shuffle<R: Rng + ?Sized>(players: &[Player], rng: &mut R) -> Vec<Player> {
    let mut shuffled = players.to_vec();
    shuffled.shuffle(rng);
    shuffled
}

pub fn is_power_of_two(n: usize) -> bool {
    n > 0 && (n & (n - 1)) == 0
}

/// Builds the full bracket, padding with BYEs when needed.
///
/// `players` is seated in the given order when its length is a power of two, so callers are
/// expected to [`shuffle`] beforehand.
#[instrument(skip_all, fields(players = players.len()))]
pub fn create_bracket<R: Rng + ?Sized>(players: &[Player], rng: &mut R) -> Bracket {
    if is_power_of_two(players.len()) {
        build_rounds(players.to_vec())
    } else {
        create_bracket_with_byes(players, rng)
    }
}

/// Pads `players` to the next power of two with BYE sentinels, shuffles the padded list and
/// seats it.
pub fn create_bracket_with_byes<R: Rng + ?Sized>(players: &[Player], rng: &mut R) -> Bracket {
    let size = players.len().next_power_of_two();
    let mut padded = players.to_vec();
    padded.resize(size, Player::bye());
    debug!(byes = size - players.len(), size, "padding bracket");
    padded.shuffle(rng);
    build_rounds(padded)
}

fn build_rounds(seats: Vec<Player>) -> Bracket {
    let size = seats.len().max(2);
    let total_rounds = size.trailing_zeros() as usize;

    let mut seats = seats.into_iter();
    let first = Round {
        round: 1,
        matches: (0..size / 2)
            .map(|_| Match {
                player1: seats.next(),
                player2: seats.next(),
            })
            .collect(),
    };

    let mut rounds = vec![first];
    let mut match_count = size / 2;
    for round in 2..=total_rounds {
        match_count /= 2;
        rounds.push(Round {
            round,
            matches: vec![Match::default(); match_count],
        });
    }
    Bracket { rounds }
}
