//! Ordering key and rank computation.
//!
//! Players are ordered by `(score desc, level desc, created_at asc)`: higher
//! score wins, ties go to the higher level, and remaining ties to whoever
//! registered first. Rank is never stored; it is recomputed from the current
//! user set on every query.

use std::cmp::Ordering;

use crate::models::User;

/// Compare two users under the leaderboard ordering key
///
/// `Less` means `a` ranks above `b`. Users equal on all three fields compare
/// `Equal` and share a rank.
pub fn compare(a: &User, b: &User) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.level.cmp(&a.level))
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Whether `a` strictly precedes `b`
pub fn precedes(a: &User, b: &User) -> bool {
    compare(a, b) == Ordering::Less
}

/// 1-based rank of `user` among `all_users`
///
/// Counts the users strictly ahead under the ordering key, plus one. The
/// caller guarantees `user` is a member of `all_users`.
pub fn rank_of(user: &User, all_users: &[User]) -> u64 {
    all_users.iter().filter(|other| precedes(other, user)).count() as u64 + 1
}
