use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::AvailabilityError;
use crate::models::{
    AvailabilityByDate, CalendarFeed, Conflict, DayConfig, MacroPeriodPublicView, MacroPeriodStatus,
    MacroPeriodUnit, PartOfDay, Selection, SelectionKey, SubmissionKind, SubmitOutcome, UnitProgress,
    UnitSelections,
};
use crate::services::calendar::{map_block, PeriodRange};
use crate::services::conflict::ConflictDetector;
use crate::services::period_config::{available_periods_for, PeriodConfigBuilder};
use crate::services::public_api::MacroPeriodGateway;
use crate::services::selection_store::SelectionStore;
use crate::services::submission::SubmissionValidator;

/// State of one doctor's response session for a single token.
///
/// Committed conflicts are recomputed after every store mutation and pending
/// conflicts after every builder change, so both accessors are always current.
pub struct ResponseController {
    gateway: Arc<dyn MacroPeriodGateway>,
    token: String,
    period: MacroPeriodPublicView,
    store: SelectionStore,
    conflicts: Vec<Conflict>,
    builder: Option<PeriodConfigBuilder>,
    pending_conflicts: Vec<Conflict>,
}

impl ResponseController {
    /// Fetches the period by token. Failure here means the link is unusable.
    pub async fn load(gateway: Arc<dyn MacroPeriodGateway>, token: impl Into<String>) -> Result<Self, AvailabilityError> {
        let token = token.into();
        let mut period = gateway.load(&token).await.map_err(|e| {
            error!("Failed to load macro period: {}", e);
            e
        })?;

        let selections = std::mem::take(&mut period.selections);
        info!(
            "Loaded macro period {} ({} unit(s), {} selection(s), status {})",
            period.id,
            period.units.len(),
            selections.len(),
            period.status
        );

        let mut controller = Self {
            gateway,
            token,
            period,
            store: SelectionStore::new(selections),
            conflicts: Vec::new(),
            builder: None,
            pending_conflicts: Vec::new(),
        };
        controller.refresh_conflicts();
        Ok(controller)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Period header and units. Its `selections` field is always empty; the
    /// working copy lives in [`Self::selections`].
    pub fn period(&self) -> &MacroPeriodPublicView {
        &self.period
    }

    pub fn units(&self) -> &[MacroPeriodUnit] {
        &self.period.units
    }

    pub fn can_edit(&self) -> bool {
        self.period.can_edit
    }

    pub fn selections(&self) -> &[Selection] {
        self.store.as_slice()
    }

    pub fn conflicts(&self) -> &[Conflict] {
        &self.conflicts
    }

    pub fn pending(&self) -> Option<&PeriodConfigBuilder> {
        self.builder.as_ref()
    }

    pub fn pending_conflicts(&self) -> &[Conflict] {
        &self.pending_conflicts
    }

    pub fn pending_availability(&self) -> Option<AvailabilityByDate> {
        self.builder.as_ref().map(|b| b.availability(self.store.as_slice()))
    }

    pub fn available_periods(&self, unit_id: i64, date: NaiveDate) -> Vec<PartOfDay> {
        available_periods_for(date, unit_id, self.store.as_slice())
    }

    pub fn progress(&self) -> Vec<UnitProgress> {
        self.store.progress(&self.period.units)
    }

    pub fn unit_selections(&self, unit_id: i64) -> Result<UnitSelections, AvailabilityError> {
        self.period.unit(unit_id).ok_or(AvailabilityError::UnknownUnit(unit_id))?;
        Ok(self.store.group_by_unit(unit_id))
    }

    // ==========================================================================
    // BLOCK SELECTION
    // ==========================================================================

    /// Day click for `unit_id`: maps the block and opens its configuration.
    /// Any block already being configured is replaced.
    pub fn begin_block(&mut self, unit_id: i64, clicked: NaiveDate) -> Result<&PeriodConfigBuilder, AvailabilityError> {
        let unit = self.period.unit(unit_id).ok_or(AvailabilityError::UnknownUnit(unit_id))?;
        let dates = map_block(clicked, &PeriodRange::of(&self.period), unit.total_days, self.period.can_edit)?;

        debug!("Opened block {}..={} for unit {}", clicked, dates.last().copied().unwrap_or(clicked), unit_id);
        self.builder = Some(PeriodConfigBuilder::new(unit_id, dates));
        self.refresh_pending();

        self.builder.as_ref().ok_or(AvailabilityError::NoPendingBlock)
    }

    pub fn set_mark_all_full_day(&mut self, enabled: bool) -> Result<&[Conflict], AvailabilityError> {
        let builder = self.builder.as_mut().ok_or(AvailabilityError::NoPendingBlock)?;
        builder.set_mark_all_full_day(enabled);
        self.refresh_pending();
        Ok(self.pending_conflicts.as_slice())
    }

    pub fn set_pending_day(&mut self, date: NaiveDate, config: DayConfig) -> Result<&[Conflict], AvailabilityError> {
        let builder = self.builder.as_mut().ok_or(AvailabilityError::NoPendingBlock)?;
        builder.set_day(date, config)?;
        self.refresh_pending();
        Ok(self.pending_conflicts.as_slice())
    }

    /// Commits the pending block under a fresh block id and returns that id.
    pub fn confirm_block(&mut self) -> Result<String, AvailabilityError> {
        let builder = self.builder.as_ref().ok_or(AvailabilityError::NoPendingBlock)?;
        if !self.period.can_edit {
            return Err(AvailabilityError::EditLocked);
        }

        let block_id = Uuid::new_v4().to_string();
        let block = builder.finalize(self.store.as_slice(), &self.period.units, &block_id)?;

        self.store.add_block(block);
        self.builder = None;
        self.pending_conflicts.clear();
        self.refresh_conflicts();
        Ok(block_id)
    }

    /// Drops the pending block without touching committed selections.
    pub fn cancel_block(&mut self) -> bool {
        self.pending_conflicts.clear();
        self.builder.take().is_some()
    }

    // ==========================================================================
    // COMMITTED SELECTIONS
    // ==========================================================================

    pub fn remove_block(&mut self, block_id: &str) -> Result<usize, AvailabilityError> {
        let removed = self.store.remove_block(block_id, self.period.can_edit)?;
        self.refresh_conflicts();
        self.refresh_pending();
        Ok(removed)
    }

    pub fn edit_day(&mut self, target: &SelectionKey, config: DayConfig) -> Result<usize, AvailabilityError> {
        let edited = self.store.edit_day(target, config, self.period.can_edit)?;
        self.refresh_conflicts();
        self.refresh_pending();
        Ok(edited)
    }

    // ==========================================================================
    // NETWORK
    // ==========================================================================

    /// Validates locally, then sends the full selection set.
    ///
    /// A confirm-submit first returns [`SubmitOutcome::ReviewRequired`] and
    /// only reaches the backend once called again with `reviewed = true`.
    /// On backend failure the working copy is left untouched.
    pub async fn submit(&mut self, kind: SubmissionKind, reviewed: bool) -> Result<SubmitOutcome, AvailabilityError> {
        if !self.period.can_edit {
            warn!("Submission refused: period {} is locked", self.period.id);
            return Err(AvailabilityError::EditLocked);
        }

        let validator = SubmissionValidator::new(&self.period.units);
        validator.validate(&self.store, kind)?;

        if kind.is_confirm() && !reviewed {
            return Ok(SubmitOutcome::ReviewRequired {
                review: validator.review(&self.store),
            });
        }

        let request = SubmissionValidator::build_request(&self.store, kind);
        let receipt = self.gateway.submit(&self.token, &request).await.map_err(|e| {
            error!("Submission for period {} failed: {}", self.period.id, e);
            e
        })?;
        info!("Period {} submitted as {:?}", self.period.id, kind);

        if let Err(e) = self.reload().await {
            warn!("Reload after submission failed, keeping local copy: {}", e);
            if let Some(status) = receipt.status {
                self.apply_status(status);
            }
        }

        Ok(SubmitOutcome::Submitted { kind, receipt })
    }

    /// Replaces period and working copy with the backend's current state.
    pub async fn reload(&mut self) -> Result<(), AvailabilityError> {
        let mut period = self.gateway.load(&self.token).await?;
        let selections = std::mem::take(&mut period.selections);

        self.period = period;
        self.store.replace(selections);
        self.builder = None;
        self.pending_conflicts.clear();
        self.refresh_conflicts();
        Ok(())
    }

    pub async fn calendar_feed(&self) -> Result<CalendarFeed, AvailabilityError> {
        Ok(self.gateway.calendar_feed(&self.token).await?)
    }

    fn apply_status(&mut self, status: MacroPeriodStatus) {
        self.period.status = status;
        self.period.can_edit = status.allows_doctor_edit();
    }

    fn refresh_conflicts(&mut self) {
        self.conflicts = ConflictDetector::new(&self.period.units).detect(self.store.as_slice());
    }

    fn refresh_pending(&mut self) {
        self.pending_conflicts = match &self.builder {
            Some(builder) => builder.pending_conflicts(self.store.as_slice(), &self.period.units),
            None => Vec::new(),
        };
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            period: PeriodHeader {
                id: self.period.id,
                doctor_name: self.period.doctor_name.clone(),
                start_date: self.period.start_date,
                end_date: self.period.end_date,
                status: self.period.status,
                can_edit: self.period.can_edit,
                closed: self.period.status.is_terminal(),
            },
            units: self.period.units.clone(),
            selections: self.store.as_slice().to_vec(),
            conflicts: self.conflicts.clone(),
            progress: self.progress(),
            pending: self.builder.as_ref().map(|builder| PendingSnapshot {
                unit_id: builder.unit_id(),
                dates: builder.block().dates.clone(),
                configs: builder.configs().clone(),
                mark_all_full_day: builder.mark_all_full_day(),
                conflicts: self.pending_conflicts.clone(),
                availability: builder.availability(self.store.as_slice()),
            }),
        }
    }
}

// ==============================================================================
// SNAPSHOTS
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PeriodHeader {
    pub id: i64,
    pub doctor_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: MacroPeriodStatus,
    pub can_edit: bool,
    /// Confirmed, cancelled or expired: no further response is expected.
    pub closed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PendingSnapshot {
    pub unit_id: i64,
    pub dates: Vec<NaiveDate>,
    pub configs: BTreeMap<NaiveDate, DayConfig>,
    pub mark_all_full_day: bool,
    pub conflicts: Vec<Conflict>,
    pub availability: AvailabilityByDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub period: PeriodHeader,
    pub units: Vec<MacroPeriodUnit>,
    pub selections: Vec<Selection>,
    pub conflicts: Vec<Conflict>,
    pub progress: Vec<UnitProgress>,
    pub pending: Option<PendingSnapshot>,
}
