//! Rule chains: the ordered list of method entries attached to a variable.
//!
//! Entries have no identity beyond their position. After every structural
//! change `execution_order` is renumbered so it runs `1..=N` with no gaps.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// One step of a rule chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleChainEntry {
    /// Catalog method this entry uses; `None` until the user picks one.
    pub method_id: Option<DbId>,
    /// Raw parameter text. Its shape is only checked by the compiler.
    #[serde(default)]
    pub value: String,
    /// 1-based position within the chain.
    pub execution_order: u32,
}

/// An ordered chain of entries plus the message shown when it rejects a value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleChain {
    #[serde(default)]
    pub entries: Vec<RuleChainEntry>,
    #[serde(default)]
    pub error_message: String,
}

/// Persisted form of a single entry, as exchanged with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEntryRecord {
    pub method_id: DbId,
    #[serde(default)]
    pub value: Option<String>,
    pub execution_order: i32,
}

/// Persisted form of a whole chain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRecord {
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub entries: Vec<ChainEntryRecord>,
}

impl RuleChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate a chain from its stored form.
    ///
    /// Entries are sorted by their stored order (ties keep storage order)
    /// and then renumbered, so gaps or duplicates in old data are repaired.
    pub fn from_record(record: ValidationRecord) -> Self {
        let mut stored = record.entries;
        stored.sort_by_key(|e| e.execution_order);

        let mut chain = Self {
            entries: stored
                .into_iter()
                .map(|e| RuleChainEntry {
                    method_id: Some(e.method_id),
                    value: e.value.unwrap_or_default(),
                    execution_order: 0,
                })
                .collect(),
            error_message: record.error_message,
        };
        chain.renumber();
        chain
    }

    /// Build the save payload.
    ///
    /// Entries without a method cannot be stored, so they are dropped and
    /// the remaining entries renumbered.
    pub fn to_record(&self) -> ValidationRecord {
        let entries = self
            .entries
            .iter()
            .filter_map(|e| e.method_id.map(|id| (id, e)))
            .enumerate()
            .map(|(idx, (method_id, e))| ChainEntryRecord {
                method_id,
                value: if e.value.is_empty() {
                    None
                } else {
                    Some(e.value.clone())
                },
                execution_order: idx as i32 + 1,
            })
            .collect();

        ValidationRecord {
            error_message: self.error_message.clone(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -- Mutations ------------------------------------------------------------

    /// Append an empty entry at the end of the chain.
    pub fn add_entry(&mut self) {
        self.entries.push(RuleChainEntry {
            method_id: None,
            value: String::new(),
            execution_order: self.entries.len() as u32 + 1,
        });
    }

    /// Remove the entry at `index` and close the gap.
    pub fn remove_entry(&mut self, index: usize) -> Result<(), CoreError> {
        self.check_index(index)?;
        self.entries.remove(index);
        self.renumber();
        Ok(())
    }

    /// Bind the entry at `index` to a catalog method.
    ///
    /// Any previous parameter is cleared since its meaning depends on the method.
    pub fn select_method(&mut self, index: usize, method_id: DbId) -> Result<(), CoreError> {
        self.check_index(index)?;
        let entry = &mut self.entries[index];
        entry.method_id = Some(method_id);
        entry.value.clear();
        Ok(())
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<String>) -> Result<(), CoreError> {
        self.check_index(index)?;
        self.entries[index].value = value.into();
        Ok(())
    }

    /// Swap the entry at `index` with its predecessor. No-op for the first entry.
    pub fn move_up(&mut self, index: usize) -> Result<(), CoreError> {
        self.check_index(index)?;
        if index > 0 {
            self.entries.swap(index - 1, index);
            self.renumber();
        }
        Ok(())
    }

    /// Swap the entry at `index` with its successor. No-op for the last entry.
    pub fn move_down(&mut self, index: usize) -> Result<(), CoreError> {
        self.check_index(index)?;
        if index + 1 < self.entries.len() {
            self.entries.swap(index, index + 1);
            self.renumber();
        }
        Ok(())
    }

    pub fn set_error_message(&mut self, text: impl Into<String>) {
        self.error_message = text.into();
    }

    fn check_index(&self, index: usize) -> Result<(), CoreError> {
        if index >= self.entries.len() {
            return Err(CoreError::Validation(format!(
                "Entry index {index} is out of range (chain has {} entries)",
                self.entries.len()
            )));
        }
        Ok(())
    }

    fn renumber(&mut self) {
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            entry.execution_order = idx as u32 + 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn orders(chain: &RuleChain) -> Vec<u32> {
        chain.entries.iter().map(|e| e.execution_order).collect()
    }

    fn methods(chain: &RuleChain) -> Vec<Option<DbId>> {
        chain.entries.iter().map(|e| e.method_id).collect()
    }

    fn chain_of(ids: &[DbId]) -> RuleChain {
        let mut chain = RuleChain::new();
        for (idx, id) in ids.iter().enumerate() {
            chain.add_entry();
            chain.select_method(idx, *id).unwrap();
        }
        chain
    }

    #[test]
    fn add_entry_appends_unbound_entry() {
        let mut chain = RuleChain::new();
        chain.add_entry();
        chain.add_entry();
        assert_eq!(orders(&chain), vec![1, 2]);
        assert_eq!(chain.entries[1].method_id, None);
        assert!(chain.entries[1].value.is_empty());
    }

    #[test]
    fn remove_entry_renumbers_contiguously() {
        let mut chain = chain_of(&[1, 2, 3, 4]);
        chain.remove_entry(1).unwrap();
        assert_eq!(methods(&chain), vec![Some(1), Some(3), Some(4)]);
        assert_eq!(orders(&chain), vec![1, 2, 3]);

        chain.remove_entry(0).unwrap();
        assert_eq!(orders(&chain), vec![1, 2]);
    }

    #[test]
    fn out_of_range_index_is_rejected_without_change() {
        let mut chain = chain_of(&[1]);
        let before = chain.clone();
        assert_matches!(chain.remove_entry(3), Err(CoreError::Validation(_)));
        assert_matches!(chain.set_value(1, "8"), Err(CoreError::Validation(_)));
        assert_matches!(chain.move_down(2), Err(CoreError::Validation(_)));
        assert_eq!(chain, before);
    }

    #[test]
    fn select_method_clears_previous_value() {
        let mut chain = chain_of(&[6]);
        chain.set_value(0, "8").unwrap();
        chain.select_method(0, 7).unwrap();
        assert_eq!(chain.entries[0].method_id, Some(7));
        assert!(chain.entries[0].value.is_empty());
    }

    #[test]
    fn move_up_and_down_swap_and_renumber() {
        let mut chain = chain_of(&[1, 2, 3]);
        chain.move_up(2).unwrap();
        assert_eq!(methods(&chain), vec![Some(1), Some(3), Some(2)]);
        assert_eq!(orders(&chain), vec![1, 2, 3]);

        chain.move_down(0).unwrap();
        assert_eq!(methods(&chain), vec![Some(3), Some(1), Some(2)]);
        assert_eq!(orders(&chain), vec![1, 2, 3]);
    }

    #[test]
    fn moves_at_the_edges_are_no_ops() {
        let mut chain = chain_of(&[1, 2]);
        chain.move_up(0).unwrap();
        chain.move_down(1).unwrap();
        assert_eq!(methods(&chain), vec![Some(1), Some(2)]);
    }

    #[test]
    fn from_record_sorts_and_repairs_gaps() {
        let record = ValidationRecord {
            error_message: "Solo 8 dígitos".to_string(),
            entries: vec![
                ChainEntryRecord {
                    method_id: 6,
                    value: Some("8".to_string()),
                    execution_order: 7,
                },
                ChainEntryRecord {
                    method_id: 1,
                    value: None,
                    execution_order: 2,
                },
            ],
        };
        let chain = RuleChain::from_record(record);
        assert_eq!(methods(&chain), vec![Some(1), Some(6)]);
        assert_eq!(orders(&chain), vec![1, 2]);
        assert_eq!(chain.entries[1].value, "8");
        assert_eq!(chain.error_message, "Solo 8 dígitos");
    }

    #[test]
    fn to_record_drops_unbound_entries() {
        let mut chain = chain_of(&[1]);
        chain.add_entry();
        chain.add_entry();
        chain.select_method(2, 6).unwrap();
        chain.set_value(2, "8").unwrap();

        let record = chain.to_record();
        assert_eq!(record.entries.len(), 2);
        assert_eq!(record.entries[0].value, None);
        assert_eq!(record.entries[1].method_id, 6);
        assert_eq!(record.entries[1].value.as_deref(), Some("8"));
        assert_eq!(record.entries[1].execution_order, 2);
    }
}
