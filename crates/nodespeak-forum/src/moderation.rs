//! Moderation bookkeeping
//!
//! The contract is the source of truth for bans and deactivations; this log
//! is the admin panel's session-local audit trail of what a moderator did
//! through this client. It lives and dies with the session object.

use std::sync::Mutex;

use chrono::Utc;
use nodespeak_core::Address;
use serde::{Deserialize, Serialize};

/// A moderation action taken through this client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModerationAction {
    /// Banned an account from a community.
    BanUser { community: u64, account: Address },
    /// Lifted a ban.
    UnbanUser { community: u64, account: Address },
    /// Deactivated a post.
    DeactivatePost { post: u64, community: u64 },
    /// Deactivated a comment.
    DeactivateComment { comment: u64, community: u64 },
    /// Deactivated a whole community.
    DeactivateCommunity { community: u64 },
}

impl ModerationAction {
    /// The community the action applies to.
    pub fn community(&self) -> u64 {
        match self {
            ModerationAction::BanUser { community, .. }
            | ModerationAction::UnbanUser { community, .. }
            | ModerationAction::DeactivatePost { community, .. }
            | ModerationAction::DeactivateComment { community, .. }
            | ModerationAction::DeactivateCommunity { community } => *community,
        }
    }
}

/// One logged moderation event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationRecord {
    /// What was done.
    pub action: ModerationAction,
    /// Who did it (the client's caller account).
    pub moderator: Address,
    /// When, unix seconds.
    pub at: i64,
}

/// Session-local, append-only moderation audit log.
#[derive(Debug, Default)]
pub struct ModerationLog {
    records: Mutex<Vec<ModerationRecord>>,
}

impl ModerationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an action.
    pub fn record(&self, action: ModerationAction, moderator: Address) {
        let record = ModerationRecord {
            action,
            moderator,
            at: Utc::now().timestamp(),
        };
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
    }

    /// All records, in append order.
    pub fn all(&self) -> Vec<ModerationRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    /// Records touching one community, in append order.
    pub fn for_community(&self, community: u64) -> Vec<ModerationRecord> {
        self.all()
            .into_iter()
            .filter(|r| r.action.community() == community)
            .collect()
    }

    /// Number of logged actions.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// True when nothing has been logged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moderator() -> Address {
        Address::new([9u8; 20])
    }

    #[test]
    fn test_records_append_in_order() {
        let log = ModerationLog::new();

        log.record(
            ModerationAction::BanUser {
                community: 1,
                account: Address::new([2u8; 20]),
            },
            moderator(),
        );
        log.record(
            ModerationAction::DeactivatePost {
                post: 10,
                community: 1,
            },
            moderator(),
        );

        let all = log.all();
        assert_eq!(all.len(), 2);
        assert!(matches!(all[0].action, ModerationAction::BanUser { .. }));
        assert!(matches!(
            all[1].action,
            ModerationAction::DeactivatePost { .. }
        ));
    }

    #[test]
    fn test_filter_by_community() {
        let log = ModerationLog::new();

        log.record(ModerationAction::DeactivateCommunity { community: 1 }, moderator());
        log.record(ModerationAction::DeactivateCommunity { community: 2 }, moderator());
        log.record(
            ModerationAction::DeactivatePost {
                post: 5,
                community: 2,
            },
            moderator(),
        );

        assert_eq!(log.for_community(1).len(), 1);
        assert_eq!(log.for_community(2).len(), 2);
        assert!(log.for_community(3).is_empty());
    }

    #[test]
    fn test_empty_log() {
        let log = ModerationLog::new();
        assert!(log.is_empty());
        assert!(log.all().is_empty());
    }
}
