use super::TransactionId;
use crate::mapper::Params;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// What a cached statement is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementRole {
    Select,
    Insert,
    Update,
    Batch,
}

impl StatementRole {
    pub fn is_write(self) -> bool {
        !matches!(self, Self::Select)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Batch => "batch",
        }
    }
}

impl Display for StatementRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a statement cached inside one transaction.
///
/// Cheap to copy; only meaningful for the transaction that issued it and only
/// while that transaction is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementHandle {
    pub(crate) transaction: TransactionId,
    pub(crate) role: StatementRole,
    pub(crate) slot: usize,
}

impl StatementHandle {
    pub fn transaction(&self) -> TransactionId {
        self.transaction
    }

    pub fn role(&self) -> StatementRole {
        self.role
    }
}

#[derive(Debug)]
pub(crate) struct CachedStatement {
    pub(crate) role: StatementRole,
    pub(crate) sql: String,
    pub(crate) pending: Vec<Params>,
}

/// Registration-ordered statement slots indexed by role and SQL text.
#[derive(Debug, Default)]
pub(crate) struct StatementCache {
    entries: Vec<CachedStatement>,
    index: HashMap<StatementRole, HashMap<String, usize>>,
}

impl StatementCache {
    pub(crate) fn lookup(&self, role: StatementRole, sql: &str) -> Option<usize> {
        self.index.get(&role).and_then(|by_sql| by_sql.get(sql)).copied()
    }

    pub(crate) fn register(&mut self, role: StatementRole, sql: &str) -> usize {
        if let Some(slot) = self.lookup(role, sql) {
            return slot;
        }
        let slot = self.entries.len();
        self.entries.push(CachedStatement {
            role,
            sql: sql.to_string(),
            pending: Vec::new(),
        });
        self.index
            .entry(role)
            .or_default()
            .insert(sql.to_string(), slot);
        slot
    }

    pub(crate) fn get(&self, slot: usize) -> Option<&CachedStatement> {
        self.entries.get(slot)
    }

    pub(crate) fn get_mut(&mut self, slot: usize) -> Option<&mut CachedStatement> {
        self.entries.get_mut(slot)
    }

    /// Drains pending batch sets in first-registration order.
    pub(crate) fn take_batches(&mut self) -> Vec<(String, Vec<Params>)> {
        self.entries
            .iter_mut()
            .filter(|entry| entry.role == StatementRole::Batch && !entry.pending.is_empty())
            .map(|entry| (entry.sql.clone(), std::mem::take(&mut entry.pending)))
            .collect()
    }

    pub(crate) fn pending_batch_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.pending.len()).sum()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Forgets every statement, returning how many were released.
    pub(crate) fn clear(&mut self) -> usize {
        let released = self.entries.len();
        self.entries.clear();
        self.index.clear();
        released
    }
}

#[cfg(test)]
mod tests {
    use super::{StatementCache, StatementRole};
    use crate::mapper::Params;

    #[test]
    fn same_sql_and_role_reuses_slot_while_roles_stay_separate() {
        let mut cache = StatementCache::default();
        let first = cache.register(StatementRole::Insert, "INSERT INTO `t` (`id`) VALUES (?)");
        let again = cache.register(StatementRole::Insert, "INSERT INTO `t` (`id`) VALUES (?)");
        let batch = cache.register(StatementRole::Batch, "INSERT INTO `t` (`id`) VALUES (?)");
        assert_eq!(first, again);
        assert_ne!(first, batch);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn take_batches_preserves_registration_order_and_clears() {
        let mut cache = StatementCache::default();
        let second_sql = "INSERT INTO `b` (`id`) VALUES (?)";
        let first = cache.register(StatementRole::Batch, "INSERT INTO `a` (`id`) VALUES (?)");
        let second = cache.register(StatementRole::Batch, second_sql);
        cache.get_mut(second).unwrap().pending.push(Params::new());
        cache.get_mut(first).unwrap().pending.push(Params::new());
        cache.get_mut(first).unwrap().pending.push(Params::new());

        let batches = cache.take_batches();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].1.len(), 2);
        assert_eq!(batches[1].0, second_sql);
        assert_eq!(cache.pending_batch_count(), 0);
    }
}
