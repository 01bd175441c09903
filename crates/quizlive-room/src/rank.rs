//! The leaderboard ranker: a pure function over a room's player set.
//!
//! Sort key, strictly in this order: score descending, average response
//! time ascending, join order ascending. The last key is a per-room
//! monotonic ordinal, so the full ordering is total and two identical
//! snapshots always rank identically. Ranks are 1-based and sequential —
//! ties share adjacent but still distinct ranks.

use std::collections::HashMap;

use quizlive_protocol::{LeaderboardRow, PlayerId};

use crate::player::Player;

/// Ranks every player in the room.
///
/// Recomputed after every scoring event, at question end, and at game
/// end; the caller broadcasts the result each time.
pub fn rank_players(players: &HashMap<PlayerId, Player>) -> Vec<LeaderboardRow> {
    let mut roster: Vec<&Player> = players.values().collect();
    roster.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.average_response_ms.total_cmp(&b.average_response_ms))
            .then_with(|| a.join_order.cmp(&b.join_order))
    });

    roster
        .into_iter()
        .enumerate()
        .map(|(i, p)| LeaderboardRow {
            rank: i as u32 + 1,
            player_id: p.id,
            display_name: p.display_name.clone(),
            score: p.score,
            streak: p.streak,
            correct_count: p.correct_count,
            average_response_ms: p.average_response_ms,
        })
        .collect()
}
