//! Teleport lock.
//!
//! A player can lock the bot with a reason. The holder unlocks at once;
//! anyone else has to ask twice.

use std::collections::HashSet;

/// Result of a lock attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockOutcome {
    /// The bot is now locked.
    Locked,
    /// Someone already holds the lock.
    AlreadyLocked { by: String, reason: String },
}

/// Result of an unlock attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockOutcome {
    NotLocked,
    Unlocked,
    /// First attempt by someone other than the holder; repeat to confirm.
    ConfirmationRequired { by: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockState {
    locked: bool,
    reason: String,
    locked_by: String,
    pending_unlock: HashSet<String>,
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn locked_by(&self) -> &str {
        &self.locked_by
    }

    /// Whether `user` has an unconfirmed unlock request.
    pub fn is_pending(&self, user: &str) -> bool {
        self.pending_unlock.contains(user)
    }

    pub fn lock(&mut self, user: &str, reason: &str) -> LockOutcome {
        if self.locked {
            return LockOutcome::AlreadyLocked {
                by: self.locked_by.clone(),
                reason: self.reason.clone(),
            };
        }
        self.locked = true;
        self.reason = reason.to_string();
        self.locked_by = user.to_string();
        self.pending_unlock.clear();
        LockOutcome::Locked
    }

    pub fn request_unlock(&mut self, user: &str) -> UnlockOutcome {
        if !self.locked {
            return UnlockOutcome::NotLocked;
        }
        if user == self.locked_by || self.pending_unlock.contains(user) {
            self.reset();
            return UnlockOutcome::Unlocked;
        }
        self.pending_unlock.insert(user.to_string());
        UnlockOutcome::ConfirmationRequired {
            by: self.locked_by.clone(),
            reason: self.reason.clone(),
        }
    }

    /// Back to unlocked, forgetting every pending confirmation.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_lock_reports_holder() {
        let mut lock = LockState::default();
        assert_eq!(lock.lock("alice", "building"), LockOutcome::Locked);
        assert_eq!(
            lock.lock("bob", "mine"),
            LockOutcome::AlreadyLocked {
                by: "alice".into(),
                reason: "building".into()
            }
        );
        assert_eq!(lock.locked_by(), "alice");
    }

    #[test]
    fn holder_unlocks_immediately() {
        let mut lock = LockState::default();
        lock.lock("alice", "afk");
        assert_eq!(lock.request_unlock("alice"), UnlockOutcome::Unlocked);
        assert!(!lock.is_locked());
    }

    #[test]
    fn other_user_must_confirm() {
        let mut lock = LockState::default();
        lock.lock("alice", "afk");

        assert_eq!(
            lock.request_unlock("bob"),
            UnlockOutcome::ConfirmationRequired {
                by: "alice".into(),
                reason: "afk".into()
            }
        );
        assert!(lock.is_locked());
        assert!(lock.is_pending("bob"));

        // A third user's request does not ride on bob's.
        assert!(matches!(
            lock.request_unlock("carol"),
            UnlockOutcome::ConfirmationRequired { .. }
        ));

        assert_eq!(lock.request_unlock("bob"), UnlockOutcome::Unlocked);
        assert!(!lock.is_locked());
        assert!(!lock.is_pending("carol"));
    }

    #[test]
    fn relock_clears_stale_confirmations() {
        let mut lock = LockState::default();
        lock.lock("alice", "afk");
        lock.request_unlock("bob");
        lock.request_unlock("alice");
        lock.lock("alice", "again");

        assert!(matches!(
            lock.request_unlock("bob"),
            UnlockOutcome::ConfirmationRequired { .. }
        ));
    }

    #[test]
    fn unlocking_an_unlocked_bot() {
        let mut lock = LockState::default();
        assert_eq!(lock.request_unlock("bob"), UnlockOutcome::NotLocked);
    }
}
