use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use super::ranking::{self, rank_of};
use super::stats::{self, LeaderboardStats};
use crate::models::User;

/// One row of the global or by-level leaderboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: u64,
    pub id: u64,
    pub username: String,
    pub avatar: String,
    pub score: u64,
    pub level: u64,
    pub joined_date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub total: u64,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalPage {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyEntry {
    #[serde(flatten)]
    pub entry: LeaderboardEntry,
    pub is_current_user: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentUser {
    pub rank: u64,
    pub id: u64,
    pub username: String,
    pub avatar: String,
    pub score: u64,
    pub level: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearbyView {
    pub current_user: CurrentUser,
    pub nearby_users: Vec<NearbyEntry>,
    pub total_users: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelBoard {
    pub level: u64,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub total_players_at_level: u64,
}

/// One row of an activity-windowed leaderboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityEntry {
    pub rank: u64,
    pub id: u64,
    pub username: String,
    pub avatar: String,
    pub score: u64,
    pub level: u64,
    pub last_active: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodBoard {
    pub period: Period,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub week_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_start: Option<String>,
    pub leaderboard: Vec<ActivityEntry>,
}

/// Read-only leaderboard over one snapshot of the user set
///
/// Users are sorted once by the ranking key. Exact ties keep id order so
/// repeated queries over unchanged data return identical pages.
#[derive(Debug, Clone)]
pub struct Leaderboard {
    ranked: Vec<User>,
    offset: FixedOffset,
}

impl Leaderboard {
    pub fn new(mut users: Vec<User>, offset: FixedOffset) -> Self {
        users.sort_by(|a, b| ranking::compare(a, b).then_with(|| a.id.cmp(&b.id)));
        Self {
            ranked: users,
            offset,
        }
    }

    pub fn total(&self) -> u64 {
        self.ranked.len() as u64
    }

    fn entry(&self, rank: u64, user: &User) -> LeaderboardEntry {
        LeaderboardEntry {
            rank,
            id: user.id,
            username: user.username.clone(),
            avatar: user.avatar.clone(),
            score: user.score,
            level: user.level,
            joined_date: user.joined_date(self.offset),
        }
    }

    /// `rank_of` over the sorted snapshot
    fn shared_rank(&self, user: &User) -> u64 {
        self.ranked
            .partition_point(|other| ranking::precedes(other, user)) as u64
            + 1
    }

    /// Full ranking sliced by offset/limit
    pub fn global(&self, limit: usize, offset: usize) -> GlobalPage {
        let leaderboard = self
            .ranked
            .iter()
            .skip(offset)
            .take(limit)
            .enumerate()
            .map(|(index, user)| self.entry((offset + index + 1) as u64, user))
            .collect();

        let total = self.total();
        GlobalPage {
            leaderboard,
            pagination: Pagination {
                total,
                limit,
                offset,
                has_more: (offset as u64).saturating_add(limit as u64) < total,
            },
        }
    }

    /// Slice of the global ranking centred on a user's position
    ///
    /// Covers `window` players on each side of the user's place in the sorted
    /// snapshot, so the user is inside the slice even when exact ties share a
    /// rank. Rows carry `rank_of` values, so tied players show the same rank.
    /// Returns `None` when the user is not part of this snapshot.
    pub fn nearby(&self, user_id: u64, window: usize) -> Option<NearbyView> {
        let position = self.ranked.iter().position(|u| u.id == user_id)?;
        let user = &self.ranked[position];
        let rank = rank_of(user, &self.ranked);
        let total = self.total();

        let start = position.saturating_sub(window);
        let end = position
            .saturating_add(window)
            .saturating_add(1)
            .min(self.ranked.len());

        let nearby_users = self.ranked[start..end]
            .iter()
            .map(|other| NearbyEntry {
                entry: self.entry(self.shared_rank(other), other),
                is_current_user: other.id == user_id,
            })
            .collect();

        Some(NearbyView {
            current_user: CurrentUser {
                rank,
                id: user.id,
                username: user.username.clone(),
                avatar: user.avatar.clone(),
                score: user.score,
                level: user.level,
            },
            nearby_users,
            total_users: total,
        })
    }

    /// Players at exactly `level`, ranked by score then registration
    ///
    /// Rank restarts at 1 within the level rather than showing global rank.
    pub fn by_level(&self, level: u64, limit: usize) -> LevelBoard {
        // Within a single level the global key reduces to (score desc, created_at asc)
        let at_level: Vec<&User> = self.ranked.iter().filter(|u| u.level == level).collect();

        let leaderboard = at_level
            .iter()
            .take(limit)
            .enumerate()
            .map(|(index, user)| self.entry(index as u64 + 1, user))
            .collect();

        LevelBoard {
            level,
            leaderboard,
            total_players_at_level: at_level.len() as u64,
        }
    }

    /// Players modified at or after `since`, ranked by score then level
    ///
    /// `updated_at` stands in for activity, so any profile change makes a
    /// player eligible. Rank is positional within the filtered set.
    pub fn windowed(&self, since: DateTime<Utc>, limit: usize) -> Vec<ActivityEntry> {
        let since = since.timestamp_millis();

        self.ranked
            .iter()
            .filter(|u| u.updated_at >= since)
            .take(limit)
            .enumerate()
            .map(|(index, user)| ActivityEntry {
                rank: index as u64 + 1,
                id: user.id,
                username: user.username.clone(),
                avatar: user.avatar.clone(),
                score: user.score,
                level: user.level,
                last_active: user.last_active(self.offset),
            })
            .collect()
    }

    /// Windowed view labelled with its period and start date
    pub fn period(&self, period: Period, start: DateTime<Utc>, limit: usize) -> PeriodBoard {
        let start_date = start
            .with_timezone(&self.offset)
            .format("%Y-%m-%d")
            .to_string();
        let (week_start, month_start) = match period {
            Period::Weekly => (Some(start_date), None),
            Period::Monthly => (None, Some(start_date)),
        };

        PeriodBoard {
            period,
            week_start,
            month_start,
            leaderboard: self.windowed(start, limit),
        }
    }

    pub fn stats(&self, week_start: DateTime<Utc>, month_start: DateTime<Utc>) -> LeaderboardStats {
        stats::compute(&self.ranked, week_start, month_start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::ranking::tests::player;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn board(users: Vec<User>) -> Leaderboard {
        Leaderboard::new(users, utc())
    }

    /// Ten players with distinct scores 100, 90, ..., 10 (ids 1..=10)
    fn ten_players() -> Vec<User> {
        (1..=10u64)
            .map(|id| player(id, 110 - id * 10, 1, id as i64))
            .collect()
    }

    #[test]
    fn test_global_orders_by_key() {
        let a = player(1, 100, 5, 2_000);
        let b = player(2, 100, 5, 1_000);
        let c = player(3, 90, 9, 500);

        let page = board(vec![a, b, c]).global(50, 0);
        let ids: Vec<u64> = page.leaderboard.iter().map(|e| e.id).collect();
        let ranks: Vec<u64> = page.leaderboard.iter().map(|e| e.rank).collect();

        assert_eq!(ids, [2, 1, 3]);
        assert_eq!(ranks, [1, 2, 3]);
    }

    #[test]
    fn test_global_pagination() {
        let board = board(ten_players());

        let page = board.global(3, 3);
        let ranks: Vec<u64> = page.leaderboard.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, [4, 5, 6]);
        assert_eq!(page.pagination.total, 10);
        assert!(page.pagination.has_more);

        // offset + limit == total
        let last = board.global(5, 5);
        assert_eq!(last.leaderboard.len(), 5);
        assert!(!last.pagination.has_more);

        let past_end = board.global(5, 20);
        assert!(past_end.leaderboard.is_empty());
        assert!(!past_end.pagination.has_more);
    }

    #[test]
    fn test_global_is_idempotent() {
        let mut users = ten_players();
        users.push(player(11, 50, 1, 6));
        users.push(player(12, 50, 1, 6));
        let board = board(users);

        assert_eq!(board.global(5, 2), board.global(5, 2));
    }

    #[test]
    fn test_exact_ties_keep_id_order() {
        let board = board(vec![player(9, 10, 1, 1), player(3, 10, 1, 1)]);
        let ids: Vec<u64> = board.global(10, 0).leaderboard.iter().map(|e| e.id).collect();
        assert_eq!(ids, [3, 9]);
    }

    #[test]
    fn test_nearby_window_in_middle() {
        let board = board(ten_players());

        // id 6 has score 50 -> rank 6
        let view = board.nearby(6, 2).unwrap();
        let ranks: Vec<u64> = view.nearby_users.iter().map(|e| e.entry.rank).collect();

        assert_eq!(view.current_user.rank, 6);
        assert_eq!(ranks, [4, 5, 6, 7, 8]);
        assert_eq!(view.total_users, 10);
    }

    #[test]
    fn test_nearby_window_clamped_at_edges() {
        let board = board(ten_players());

        let top = board.nearby(1, 5).unwrap();
        let ranks: Vec<u64> = top.nearby_users.iter().map(|e| e.entry.rank).collect();
        assert_eq!(ranks, [1, 2, 3, 4, 5, 6]);

        let bottom = board.nearby(10, 5).unwrap();
        let ranks: Vec<u64> = bottom.nearby_users.iter().map(|e| e.entry.rank).collect();
        assert_eq!(ranks, [5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_nearby_flags_current_user_once() {
        let board = board(ten_players());

        for id in 1..=10 {
            let view = board.nearby(id, 5).unwrap();
            let flagged: Vec<&NearbyEntry> =
                view.nearby_users.iter().filter(|e| e.is_current_user).collect();

            assert_eq!(flagged.len(), 1);
            assert_eq!(flagged[0].entry.id, id);
        }
    }

    #[test]
    fn test_nearby_includes_user_among_exact_ties() {
        let board = board(vec![player(3, 10, 1, 1), player(9, 10, 1, 1)]);

        let view = board.nearby(9, 0).unwrap();

        assert_eq!(view.current_user.rank, 1);
        assert_eq!(view.nearby_users.len(), 1);
        assert_eq!(view.nearby_users[0].entry.id, 9);
        assert_eq!(view.nearby_users[0].entry.rank, 1);
        assert!(view.nearby_users[0].is_current_user);
    }

    #[test]
    fn test_nearby_simultaneous_registrations() {
        // Same score, level and registration millisecond
        let users: Vec<User> = (1..=8u64).map(|id| player(id, 0, 1, 1_000)).collect();
        let board = board(users);

        let view = board.nearby(8, 5).unwrap();
        let ids: Vec<u64> = view.nearby_users.iter().map(|e| e.entry.id).collect();

        assert_eq!(ids, [3, 4, 5, 6, 7, 8]);
        assert!(view.nearby_users.iter().all(|e| e.entry.rank == 1));
        assert_eq!(view.current_user.rank, 1);
    }

    #[test]
    fn test_nearby_with_ties_flags_user_once_at_own_rank() {
        let users = vec![
            player(1, 50, 2, 10),
            player(2, 50, 2, 10),
            player(3, 40, 1, 5),
            player(4, 50, 2, 10),
            player(5, 40, 1, 5),
            player(6, 90, 1, 1),
            player(7, 40, 1, 5),
        ];
        let board = board(users);

        for id in 1..=7 {
            for window in [0, 1, 5] {
                let view = board.nearby(id, window).unwrap();
                let flagged: Vec<&NearbyEntry> =
                    view.nearby_users.iter().filter(|e| e.is_current_user).collect();

                assert_eq!(flagged.len(), 1, "user {} window {}", id, window);
                assert_eq!(flagged[0].entry.id, id);
                assert_eq!(flagged[0].entry.rank, view.current_user.rank);
                assert!(view.nearby_users.len() <= 2 * window + 1);
            }
        }

        // 90 first, three-way tie at 50, three-way tie at 40
        let view = board.nearby(5, 5).unwrap();
        let ranks: Vec<u64> = view.nearby_users.iter().map(|e| e.entry.rank).collect();
        assert_eq!(ranks, [1, 2, 2, 2, 5, 5, 5]);
    }

    #[test]
    fn test_nearby_unknown_user() {
        assert!(board(ten_players()).nearby(99, 5).is_none());
    }

    #[test]
    fn test_by_level_ranks_within_level() {
        let users = vec![
            player(1, 500, 1, 1),
            player(2, 400, 2, 2),
            player(3, 30, 3, 3),
            player(4, 70, 3, 4),
        ];

        let view = board(users).by_level(3, 20);
        let ids: Vec<u64> = view.leaderboard.iter().map(|e| e.id).collect();
        let ranks: Vec<u64> = view.leaderboard.iter().map(|e| e.rank).collect();

        assert_eq!(ids, [4, 3]);
        assert_eq!(ranks, [1, 2]);
        assert_eq!(view.total_players_at_level, 2);
    }

    #[test]
    fn test_by_level_score_tie_goes_to_earlier_registration() {
        let users = vec![player(1, 70, 3, 20), player(2, 70, 3, 10)];

        let view = board(users).by_level(3, 1);
        assert_eq!(view.leaderboard.len(), 1);
        assert_eq!(view.leaderboard[0].id, 2);
        assert_eq!(view.total_players_at_level, 2);
    }

    #[test]
    fn test_windowed_filters_on_updated_at() {
        let since = DateTime::from_timestamp_millis(10_000).unwrap();
        let mut stale = player(1, 999, 9, 1);
        stale.updated_at = 9_999;
        let mut fresh_low = player(2, 10, 1, 1);
        fresh_low.updated_at = 10_000;
        let mut fresh_high = player(3, 20, 1, 1);
        fresh_high.updated_at = 50_000;

        let entries = board(vec![stale, fresh_low, fresh_high]).windowed(since, 20);
        let ids: Vec<u64> = entries.iter().map(|e| e.id).collect();
        let ranks: Vec<u64> = entries.iter().map(|e| e.rank).collect();

        assert_eq!(ids, [3, 2]);
        assert_eq!(ranks, [1, 2]);
    }

    #[test]
    fn test_period_labels() {
        let start = DateTime::from_timestamp_millis(0).unwrap();
        let board = board(ten_players());

        let weekly = serde_json::to_value(board.period(Period::Weekly, start, 3)).unwrap();
        assert_eq!(weekly["period"], "weekly");
        assert_eq!(weekly["week_start"], "1970-01-01");
        assert!(weekly.get("month_start").is_none());
        assert_eq!(weekly["leaderboard"].as_array().unwrap().len(), 3);

        let monthly = serde_json::to_value(board.period(Period::Monthly, start, 30)).unwrap();
        assert_eq!(monthly["period"], "monthly");
        assert_eq!(monthly["month_start"], "1970-01-01");
    }

    #[test]
    fn test_nearby_entry_serializes_flat() {
        let view = board(ten_players()).nearby(1, 0).unwrap();
        let value = serde_json::to_value(&view.nearby_users[0]).unwrap();

        assert_eq!(value["rank"], 1);
        assert_eq!(value["is_current_user"], true);
        assert_eq!(value["joined_date"], "1970-01-01");
    }
}
