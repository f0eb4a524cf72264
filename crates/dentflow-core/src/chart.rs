//! Dental chart editing.
//!
//! Stored charts may be sparse. Editing always starts from
//! [`DentalChart::with_defaults`], so every one of the 32 positions is present
//! before anything is displayed or changed.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{DentalChart, ToothEntry, ToothId, ToothStatus, TreatmentDefinition};

/// Editing session over one patient's chart.
#[derive(Debug, Clone)]
pub struct ChartEditor {
    chart: DentalChart,
    selection: BTreeSet<ToothId>,
    multi_select: bool,
}

impl ChartEditor {
    /// Start editing from stored (possibly sparse) chart data.
    pub fn open(stored: &DentalChart) -> Self {
        Self {
            chart: stored.with_defaults(),
            selection: BTreeSet::new(),
            multi_select: false,
        }
    }

    pub fn chart(&self) -> &DentalChart {
        &self.chart
    }

    pub fn into_chart(self) -> DentalChart {
        self.chart
    }

    /// Replace status and notes of one tooth.
    pub fn edit_tooth(&mut self, id: ToothId, status: ToothStatus, notes: impl Into<String>) {
        self.chart.set(id, ToothEntry::new(status, notes));
    }

    pub fn is_multi_select(&self) -> bool {
        self.multi_select
    }

    /// Turning multi-select off drops the current selection.
    pub fn set_multi_select(&mut self, enabled: bool) {
        self.multi_select = enabled;
        if !enabled {
            self.selection.clear();
        }
    }

    /// Select or deselect a tooth. Outside multi-select mode the selection
    /// holds at most one tooth. Returns whether the tooth is now selected.
    pub fn toggle(&mut self, id: ToothId) -> bool {
        if self.selection.remove(&id) {
            return false;
        }
        if !self.multi_select {
            self.selection.clear();
        }
        self.selection.insert(id);
        true
    }

    pub fn selection(&self) -> impl Iterator<Item = &ToothId> {
        self.selection.iter()
    }

    /// Apply one status and notes to every selected tooth, then clear the
    /// selection and leave multi-select mode. Returns the number of teeth set.
    pub fn apply_to_selection(&mut self, status: ToothStatus, notes: &str) -> usize {
        let ids: Vec<ToothId> = std::mem::take(&mut self.selection).into_iter().collect();
        self.chart = apply_bulk(&self.chart, &ids, status, notes);
        self.multi_select = false;
        ids.len()
    }
}

/// Copy of `chart` (with defaults) where exactly `ids` are set to
/// `{status, notes}`. Repeated ids are harmless.
pub fn apply_bulk(chart: &DentalChart, ids: &[ToothId], status: ToothStatus, notes: &str) -> DentalChart {
    let mut updated = chart.with_defaults();
    for id in ids {
        updated.set(*id, ToothEntry::new(status, notes));
    }
    updated
}

/// Set the status of `teeth` after a treatment, keeping their notes.
pub fn apply_treatment_status(chart: &mut DentalChart, teeth: &[ToothId], status: ToothStatus) {
    let mut updated = chart.with_defaults();
    for id in teeth {
        let notes = updated.get(id).map(|e| e.notes.clone()).unwrap_or_default();
        updated.set(*id, ToothEntry::new(status, notes));
    }
    *chart = updated;
}

/// Resolves which chart status a treatment definition implies.
///
/// Lookup order: configured override for the definition id, then the
/// definition's own `chart_status`. Anything else means "no change".
#[derive(Debug, Clone, Copy)]
pub struct StatusMapping<'a> {
    overrides: &'a BTreeMap<String, ToothStatus>,
}

impl<'a> StatusMapping<'a> {
    pub fn new(overrides: &'a BTreeMap<String, ToothStatus>) -> Self {
        Self { overrides }
    }

    pub fn status_for(&self, definition: &TreatmentDefinition) -> Option<ToothStatus> {
        self.overrides
            .get(&definition.id)
            .copied()
            .or(definition.chart_status)
    }
}
