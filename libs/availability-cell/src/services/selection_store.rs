use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::error::AvailabilityError;
use crate::models::{
    DayConfig, MacroPeriodUnit, Selection, SelectionBlock, SelectionKey, UnitProgress, UnitSelections,
};

/// Working copy of a session's selections, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    selections: Vec<Selection>,
}

impl SelectionStore {
    pub fn new(selections: Vec<Selection>) -> Self {
        Self { selections }
    }

    pub fn as_slice(&self) -> &[Selection] {
        &self.selections
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Replaces the whole working copy, e.g. after a reload from the backend.
    pub fn replace(&mut self, selections: Vec<Selection>) {
        self.selections = selections;
    }

    pub fn add_block(&mut self, block: Vec<Selection>) {
        info!(
            "Adding block {} with {} selection(s)",
            block.first().and_then(|s| s.block_id.as_deref()).unwrap_or("-"),
            block.len()
        );
        self.selections.extend(block);
    }

    /// Removes every selection tagged with `block_id` and nothing else.
    pub fn remove_block(&mut self, block_id: &str, can_edit: bool) -> Result<usize, AvailabilityError> {
        if !can_edit {
            warn!("Refusing to remove block {}: period locked", block_id);
            return Err(AvailabilityError::EditLocked);
        }

        let before = self.selections.len();
        self.selections.retain(|s| s.block_id.as_deref() != Some(block_id));
        let removed = before - self.selections.len();

        if removed == 0 {
            return Err(AvailabilityError::BlockNotFound(block_id.to_string()));
        }

        info!("Removed block {} ({} selection(s))", block_id, removed);
        Ok(removed)
    }

    /// Rewrites the part of day (and custom range) of the matching selection(s).
    pub fn edit_day(&mut self, target: &SelectionKey, config: DayConfig, can_edit: bool) -> Result<usize, AvailabilityError> {
        if !can_edit {
            warn!("Refusing to edit {} for unit {}: period locked", target.date, target.macro_period_unit_id);
            return Err(AvailabilityError::EditLocked);
        }

        let config = config.normalized();
        config
            .validate()
            .map_err(|reason| AvailabilityError::InvalidCustomRange { date: target.date, reason })?;

        let mut edited = 0;
        for selection in self.selections.iter_mut().filter(|s| target.matches(s)) {
            selection.apply(config);
            edited += 1;
        }

        if edited == 0 {
            return Err(AvailabilityError::SelectionNotFound);
        }

        debug!("Edited {} selection(s) on {} to {:?}", edited, target.date, config.part_of_day);
        Ok(edited)
    }

    /// A unit's selections split into blocks (first-seen order) and block-less items.
    pub fn group_by_unit(&self, unit_id: i64) -> UnitSelections {
        let mut blocks: Vec<SelectionBlock> = Vec::new();
        let mut standalone = Vec::new();

        for selection in self.selections.iter().filter(|s| s.macro_period_unit_id == unit_id) {
            match &selection.block_id {
                Some(block_id) => match blocks.iter_mut().find(|b| &b.block_id == block_id) {
                    Some(block) => block.selections.push(selection.clone()),
                    None => blocks.push(SelectionBlock {
                        block_id: block_id.clone(),
                        selections: vec![selection.clone()],
                    }),
                },
                None => standalone.push(selection.clone()),
            }
        }

        UnitSelections {
            unit_id,
            blocks,
            standalone,
        }
    }

    pub fn unique_dates(&self, unit_id: i64) -> BTreeSet<NaiveDate> {
        self.selections
            .iter()
            .filter(|s| s.macro_period_unit_id == unit_id)
            .map(|s| s.date)
            .collect()
    }

    pub fn unique_day_count(&self, unit_id: i64) -> usize {
        self.unique_dates(unit_id).len()
    }

    pub fn progress(&self, units: &[MacroPeriodUnit]) -> Vec<UnitProgress> {
        units
            .iter()
            .map(|unit| {
                let selected_days = self.unique_day_count(unit.id);
                UnitProgress {
                    unit_id: unit.id,
                    unit_name: unit.unit_name.clone(),
                    selected_days,
                    total_days: unit.total_days,
                    is_complete: selected_days == unit.total_days as usize,
                }
            })
            .collect()
    }
}
