//! Leaderboard ranking and query views.
//!
//! Every view is computed in memory from one snapshot of the user set, so a
//! player's rank and the window around it always agree.

pub mod ranking;
pub mod stats;
pub mod views;

pub use ranking::{compare, precedes, rank_of};
pub use stats::{LeaderboardStats, LevelCount};
pub use views::{
    ActivityEntry, CurrentUser, GlobalPage, Leaderboard, LeaderboardEntry, LevelBoard,
    NearbyEntry, NearbyView, Pagination, Period, PeriodBoard,
};
