//! In-memory [`CoreApi`] implementation.
//!
//! [`StatusBoard`] validates logins against the configured accounts and
//! serves whatever status and progress snapshots were last published to
//! it by the job engine.

use parking_lot::RwLock;

use super::{CoreApi, ProgressInfo, ServerStatus};
use crate::config::AccountConfig;
use crate::domain::Principal;

#[derive(Debug)]
struct Account {
    principal: Principal,
    password: String,
}

/// Accounts plus the latest published snapshots.
#[derive(Debug, Default)]
pub struct StatusBoard {
    accounts: Vec<Account>,
    status: RwLock<ServerStatus>,
    progress: RwLock<Vec<ProgressInfo>>,
}

impl StatusBoard {
    /// Creates a board for `accounts`; uids are assigned from 1 in order.
    #[must_use]
    pub fn new(accounts: &[AccountConfig]) -> Self {
        let accounts = accounts
            .iter()
            .zip(1u32..)
            .map(|(cfg, uid)| Account {
                principal: Principal::new(uid, cfg.name.clone(), cfg.role),
                password: cfg.password.clone(),
            })
            .collect();
        Self {
            accounts,
            ..Self::default()
        }
    }

    /// Replaces the status snapshot.
    pub fn set_status(&self, status: ServerStatus) {
        *self.status.write() = status;
    }

    /// Replaces the progress snapshots.
    pub fn set_progress(&self, progress: Vec<ProgressInfo>) {
        *self.progress.write() = progress;
    }
}

impl CoreApi for StatusBoard {
    fn check_auth(&self, username: &str, password: &str) -> Option<Principal> {
        self.accounts
            .iter()
            .find(|a| a.principal.name == username && a.password == password)
            .map(|a| a.principal.clone())
    }

    fn status_info(&self, _principal: &Principal) -> ServerStatus {
        self.status.read().clone()
    }

    fn progress_info(&self, principal: &Principal) -> Vec<ProgressInfo> {
        let progress = self.progress.read();
        if principal.is_admin() {
            return progress.clone();
        }
        progress
            .iter()
            .filter(|p| p.owner == principal.uid)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{Role, UserId};

    fn board() -> StatusBoard {
        StatusBoard::new(&[
            AccountConfig {
                name: "root".into(),
                password: "toor".into(),
                role: Role::Admin,
            },
            AccountConfig {
                name: "alice".into(),
                password: "pw".into(),
                role: Role::User,
            },
        ])
    }

    fn progress(name: &str, owner: u32) -> ProgressInfo {
        ProgressInfo {
            plugin: "BasePlugin".into(),
            name: name.into(),
            status_msg: "downloading".into(),
            eta: Some(30),
            done: 10,
            total: 100,
            owner: UserId::new(owner),
        }
    }

    #[test]
    fn check_auth_accepts_valid_credentials() {
        let board = board();
        let principal = board.check_auth("alice", "pw");
        assert_eq!(principal.map(|p| p.uid), Some(UserId::new(2)));
        assert!(board.check_auth("root", "toor").is_some_and(|p| p.is_admin()));
    }

    #[test]
    fn check_auth_rejects_bad_credentials() {
        let board = board();
        assert!(board.check_auth("alice", "nope").is_none());
        assert!(board.check_auth("mallory", "pw").is_none());
    }

    #[test]
    fn status_reflects_latest_publish() {
        let board = board();
        board.set_status(ServerStatus {
            active: 2,
            queue: 5,
            ..ServerStatus::default()
        });
        let Some(alice) = board.check_auth("alice", "pw") else {
            panic!("alice is configured");
        };
        assert_eq!(board.status_info(&alice).active, 2);
        assert_eq!(board.status_info(&alice).queue, 5);
    }

    #[test]
    fn progress_is_scoped_to_owner() {
        let board = board();
        board.set_progress(vec![progress("a.bin", 2), progress("b.bin", 3)]);
        let alice = Principal::new(2, "alice", Role::User);
        let root = Principal::new(1, "root", Role::Admin);

        let mine: Vec<_> = board.progress_info(&alice).into_iter().map(|p| p.name).collect();
        assert_eq!(mine, vec!["a.bin"]);
        assert_eq!(board.progress_info(&root).len(), 2);
    }
}
