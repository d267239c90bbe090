//! Loading and querying the interaction log.
//!
//! The log backs two consumers: offline evaluation groups it into
//! [`GroundTruth`], and the history view lists a user's latest interactions.

use crate::error::Result;
use crate::parser;
use crate::types::*;
use chrono::DateTime;
use chrono_tz::Europe::Zurich;
use std::path::Path;
use tracing::info;

/// How many interactions the history view shows by default
pub const DEFAULT_HISTORY_LENGTH: usize = 10;

/// `strftime` layout of history timestamps
pub const HISTORY_TIME_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Unix seconds as Zurich local time (CET/CEST), e.g. `01.01.1970 01:00:00`.
///
/// Timestamps chrono can't represent come back as `@<seconds>`.
pub fn format_local_timestamp(timestamp: i64) -> String {
    match DateTime::from_timestamp(timestamp, 0) {
        Some(utc) => utc.with_timezone(&Zurich).format(HISTORY_TIME_FORMAT).to_string(),
        None => format!("@{}", timestamp),
    }
}

impl Interaction {
    pub fn local_time(&self) -> String {
        format_local_timestamp(self.timestamp)
    }
}

impl InteractionLog {
    /// Load an interaction log CSV (`u`, `i`, `t` columns)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading interaction log from {:?}", path);

        let log: InteractionLog = parser::parse_interactions(path)?.into_iter().collect();

        let (users, interactions) = log.counts();
        info!("Loaded {} interactions for {} users", interactions, users);
        Ok(log)
    }

    /// Group item ids by user, users ascending, items in file order
    pub fn ground_truth(&self) -> GroundTruth {
        self.user_interactions
            .iter()
            .map(|(&user_id, interactions)| {
                let items = interactions.iter().map(|i| i.item_id).collect();
                (user_id, items)
            })
            .collect()
    }

    /// The user's `max_length` most recent interactions, newest first.
    ///
    /// Interactions with equal timestamps keep file order.
    pub fn user_history(&self, user_id: UserId, max_length: usize) -> Vec<Interaction> {
        let mut history = self.get_user_interactions(user_id).to_vec();
        history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        history.truncate(max_length);
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(user_id: UserId, item_id: ItemId, timestamp: i64) -> Interaction {
        Interaction { user_id, item_id, timestamp }
    }

    fn sample_log() -> InteractionLog {
        vec![
            interaction(2, 30, 100),
            interaction(1, 10, 300),
            interaction(1, 20, 100),
            interaction(1, 10, 200),
            interaction(1, 40, 300),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_ground_truth_groups_by_user() {
        let truth = sample_log().ground_truth();

        let users: Vec<UserId> = truth.keys().copied().collect();
        assert_eq!(users, vec![1, 2]);
        // Duplicated interactions stay, so the list length counts them
        assert_eq!(truth[&1], vec![10, 20, 10, 40]);
        assert_eq!(truth[&2], vec![30]);
    }

    #[test]
    fn test_user_history_newest_first() {
        let history = sample_log().user_history(1, 3);

        let items: Vec<ItemId> = history.iter().map(|i| i.item_id).collect();
        assert_eq!(items, vec![10, 40, 10]);
        assert_eq!(history[2].timestamp, 200);
    }

    #[test]
    fn test_user_history_unknown_user() {
        assert!(sample_log().user_history(99, DEFAULT_HISTORY_LENGTH).is_empty());
    }

    #[test]
    fn test_local_time_winter_and_summer() {
        // CET, UTC+1
        assert_eq!(format_local_timestamp(0), "01.01.1970 01:00:00");
        assert_eq!(format_local_timestamp(1_700_000_000), "14.11.2023 23:13:20");
        // CEST, UTC+2
        assert_eq!(format_local_timestamp(1_688_212_800), "01.07.2023 14:00:00");
        assert_eq!(interaction(1, 5, 1_688_212_800).local_time(), "01.07.2023 14:00:00");
    }

    #[test]
    fn test_local_time_out_of_range() {
        assert_eq!(format_local_timestamp(i64::MAX), format!("@{}", i64::MAX));
    }

    #[test]
    fn test_counts() {
        assert_eq!(sample_log().counts(), (2, 5));
    }
}
