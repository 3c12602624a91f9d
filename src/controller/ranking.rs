//! Ranks catalog candidates by how closely their play time matches a target

use std::time::Duration;

pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_MAX_SUGGESTIONS: usize = 4;

/// Sorts `items` by `|target - duration|` (stable), drops anything at or
/// beyond `tolerance` and keeps at most `max_count`.
pub fn rank_by_duration<T, F>(
    target: Duration,
    items: Vec<T>,
    to_duration: F,
    tolerance: Duration,
    max_count: usize,
) -> Vec<T>
where
    F: Fn(&T) -> Duration,
{
    let mut ranked: Vec<(Duration, T)> = items
        .into_iter()
        .map(|item| (target.abs_diff(to_duration(&item)), item))
        .filter(|(delta, _)| *delta < tolerance)
        .collect();
    ranked.sort_by_key(|(delta, _)| *delta);
    ranked.truncate(max_count);
    ranked.into_iter().map(|(_, item)| item).collect()
}
