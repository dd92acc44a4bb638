//! Per-import key maps.
//!
//! Every reconstruction builds its maps from scratch and drops them with the
//! call; nothing here touches storage or survives an import.

use std::collections::HashMap;

use uuid::Uuid;

use crate::snapshot::RowId;

/// Original-to-minted key map for one entity kind.
#[derive(Debug, Default)]
pub(crate) struct KeyMap {
    entries: HashMap<RowId, Uuid>,
}

impl KeyMap {
    pub(crate) fn record(&mut self, original: RowId, minted: Uuid) {
        self.entries.insert(original, minted);
    }

    pub(crate) fn resolve(&self, original: &RowId) -> Option<Uuid> {
        self.entries.get(original).copied()
    }
}

/// All key maps one reconstruction needs.
///
/// Income keys are mapped like the others even though nothing references
/// income today.
#[derive(Debug, Default)]
pub(crate) struct SnapshotRemap {
    pub(crate) accounts: KeyMap,
    pub(crate) tags: KeyMap,
    pub(crate) income: KeyMap,
    pub(crate) expenses: KeyMap,
}
