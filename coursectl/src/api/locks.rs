use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::errors::{Error, Result};
use crate::types::GroupId;

/// In-process mutual exclusion for operations on a single group.
///
/// Two provisioning runs for the same group could both miss the repository in the listing and
/// both create it. Holding the guard for the whole run prevents that within one process; a
/// second caller is turned away with `Conflict` rather than queued.
#[derive(Clone, Default)]
pub struct GroupLocks {
    locks: Arc<DashMap<GroupId, Arc<Mutex<()>>>>,
}

impl GroupLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the guard for `group_id`, failing if another operation holds it
    pub fn try_acquire(&self, group_id: GroupId) -> Result<GroupGuard> {
        let lock = self.locks.entry(group_id).or_default().clone();
        match lock.try_lock_owned() {
            Ok(guard) => Ok(GroupGuard {
                guard: Some(guard),
                group_id,
                locks: self.locks.clone(),
            }),
            Err(_) => {
                forget_if_unused(&self.locks, group_id);
                Err(Error::Conflict {
                    message: format!("Group {group_id} is already being modified"),
                })
            }
        }
    }
}

fn forget_if_unused(locks: &DashMap<GroupId, Arc<Mutex<()>>>, group_id: GroupId) {
    locks.remove_if(&group_id, |_, lock| Arc::strong_count(lock) == 1);
}

/// Held for the duration of an operation on one group. Dropping it releases the group and
/// forgets its entry once nobody else refers to it.
pub struct GroupGuard {
    guard: Option<OwnedMutexGuard<()>>,
    group_id: GroupId,
    locks: Arc<DashMap<GroupId, Arc<Mutex<()>>>>,
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        // Release first, so the entry's only remaining reference is the map's own
        drop(self.guard.take());
        forget_if_unused(&self.locks, self.group_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_conflicts_until_release() {
        let locks = GroupLocks::new();
        let guard = locks.try_acquire(1).unwrap();

        assert!(matches!(locks.try_acquire(1), Err(Error::Conflict { .. })));
        assert!(locks.try_acquire(2).is_ok());

        drop(guard);
        assert!(locks.try_acquire(1).is_ok());
    }

    #[test]
    fn test_released_groups_are_forgotten() {
        let locks = GroupLocks::new();
        let first = locks.try_acquire(1).unwrap();
        let _second = locks.try_acquire(2).unwrap();
        assert_eq!(locks.locks.len(), 2);

        drop(first);
        assert_eq!(locks.locks.len(), 1);

        // A failed attempt leaves the holder's entry in place
        assert!(locks.try_acquire(2).is_err());
        assert_eq!(locks.locks.len(), 1);
    }
}
