//! Explicit view state for the validation workflow.

use std::collections::BTreeSet;

use crate::error::CoreError;
use crate::model::{AdministrationId, ReconciledRow};
use crate::validation::is_bulk_eligible;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: BTreeSet<AdministrationId>,
    active: Option<AdministrationId>,
    bulk_mode: bool,
    refresh_map: bool,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Vec<AdministrationId> {
        self.selected.iter().copied().collect()
    }

    pub fn is_selected(&self, id: AdministrationId) -> bool {
        self.selected.contains(&id)
    }

    pub fn reset(&mut self) {
        self.selected.clear();
    }

    pub fn add(&mut self, id: AdministrationId) {
        self.selected.insert(id);
    }

    pub fn remove(&mut self, id: AdministrationId) {
        self.selected.remove(&id);
    }

    /// Entering bulk mode selects every eligible row; leaving it clears.
    pub fn set_bulk_mode(&mut self, on: bool, rows: &[ReconciledRow]) {
        self.bulk_mode = on;
        self.selected.clear();
        if on {
            self.selected.extend(
                rows.iter()
                    .filter(|r| is_bulk_eligible(r))
                    .map(|r| r.administration_id),
            );
        }
    }

    /// Select ids that pass the bulk precondition.
    ///
    /// Nothing is added when any id is ineligible or absent from `rows`.
    pub fn add_eligible(
        &mut self,
        ids: &[AdministrationId],
        rows: &[ReconciledRow],
    ) -> Result<(), CoreError> {
        let rejected: Vec<AdministrationId> = ids
            .iter()
            .copied()
            .filter(|id| {
                !rows
                    .iter()
                    .any(|r| r.administration_id == *id && is_bulk_eligible(r))
            })
            .collect();
        if !rejected.is_empty() {
            return Err(CoreError::NotBulkEligible(rejected));
        }
        self.selected.extend(ids.iter().copied());
        Ok(())
    }

    pub fn set_active(&mut self, id: AdministrationId) {
        self.active = Some(id);
    }

    pub fn is_highlighted(&self, id: AdministrationId) -> bool {
        self.bulk_mode || self.is_selected(id) || self.active == Some(id)
    }

    pub fn request_map_refresh(&mut self) {
        self.refresh_map = true;
    }

    /// Returns whether a refresh was pending and clears the flag.
    pub fn take_map_refresh(&mut self) -> bool {
        std::mem::take(&mut self.refresh_map)
    }
}
