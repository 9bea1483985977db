use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::constants::STARTING_LEVEL;
use crate::models::User;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelCount {
    pub level: u64,
    pub player_count: u64,
}

/// Aggregate figures over the whole player base
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardStats {
    pub total_players: u64,
    pub highest_score: u64,
    pub highest_level: u64,
    pub average_score: f64,
    pub average_level: f64,
    pub new_players_this_week: u64,
    pub new_players_this_month: u64,
    /// Player count per level, ascending by level
    pub level_distribution: Vec<LevelCount>,
}

/// Compute statistics; an empty user set yields the documented defaults
/// (highest score 0, highest level 1, average score 0, average level 1).
pub fn compute(
    users: &[User],
    week_start: DateTime<Utc>,
    month_start: DateTime<Utc>,
) -> LeaderboardStats {
    let total_players = users.len() as u64;
    let week_start = week_start.timestamp_millis();
    let month_start = month_start.timestamp_millis();

    let mut distribution: BTreeMap<u64, u64> = BTreeMap::new();
    for user in users {
        *distribution.entry(user.level).or_default() += 1;
    }

    let (average_score, average_level) = if users.is_empty() {
        (0.0, STARTING_LEVEL as f64)
    } else {
        let n = users.len() as f64;
        let score_sum: f64 = users.iter().map(|u| u.score as f64).sum();
        let level_sum: f64 = users.iter().map(|u| u.level as f64).sum();
        (round2(score_sum / n), round2(level_sum / n))
    };

    LeaderboardStats {
        total_players,
        highest_score: users.iter().map(|u| u.score).max().unwrap_or(0),
        highest_level: users
            .iter()
            .map(|u| u.level)
            .max()
            .unwrap_or(STARTING_LEVEL),
        average_score,
        average_level,
        new_players_this_week: users.iter().filter(|u| u.created_at >= week_start).count() as u64,
        new_players_this_month: users.iter().filter(|u| u.created_at >= month_start).count()
            as u64,
        level_distribution: distribution
            .into_iter()
            .map(|(level, player_count)| LevelCount {
                level,
                player_count,
            })
            .collect(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::ranking::tests::player;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    #[test]
    fn test_empty_user_set_defaults() {
        let stats = compute(&[], at(0), at(0));

        assert_eq!(stats.total_players, 0);
        assert_eq!(stats.highest_score, 0);
        assert_eq!(stats.highest_level, 1);
        assert_eq!(stats.average_score, 0.0);
        assert_eq!(stats.average_level, 1.0);
        assert!(stats.level_distribution.is_empty());
    }

    #[test]
    fn test_aggregates() {
        let users = vec![
            player(1, 100, 2, 1_000),
            player(2, 50, 1, 5_000),
            player(3, 0, 2, 9_000),
        ];

        let stats = compute(&users, at(5_000), at(2_000));

        assert_eq!(stats.total_players, 3);
        assert_eq!(stats.highest_score, 100);
        assert_eq!(stats.highest_level, 2);
        assert_eq!(stats.average_score, 50.0);
        assert_eq!(stats.average_level, 1.67);
        assert_eq!(stats.new_players_this_week, 2);
        assert_eq!(stats.new_players_this_month, 2);
        assert_eq!(
            stats.level_distribution,
            vec![
                LevelCount {
                    level: 1,
                    player_count: 1
                },
                LevelCount {
                    level: 2,
                    player_count: 2
                },
            ]
        );
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(10.0), 10.0);
    }
}
