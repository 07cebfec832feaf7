//! The match dialog: one imported row, its candidate list, the operator's
//! selection, and the commit that closes it.

use crate::clients::{ContributionConfirmer, GraphqlClient, OrdersLookup, RowUpdater};
use crate::config::DialogConfig;
use crate::models::{CandidateOrder, ImportedRow, OrderRef, TransactionsImport};
use crate::services::cache::{EntityCache, EntityKey};
use crate::services::candidate_query::{CandidateFilters, CandidateQueryAdapter, QueryState};
use crate::services::committer::ReconciliationCommitter;
use crate::services::notifier::{Notifier, Toast};
use crate::services::raw_values::displayable_raw_values;
use crate::services::selection::{PrimaryAction, SelectionEvent, SelectionState};
use recon_core::error::AppError;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Everything outside the dialog it needs to talk to.
#[derive(Clone)]
pub struct Collaborators {
    pub orders: Arc<dyn OrdersLookup>,
    pub confirmer: Arc<dyn ContributionConfirmer>,
    pub row_updater: Arc<dyn RowUpdater>,
    pub cache: Arc<EntityCache>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    /// Wire every remote collaborator to the same API client.
    pub fn from_client(
        client: Arc<GraphqlClient>,
        cache: Arc<EntityCache>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            orders: client.clone(),
            confirmer: client.clone(),
            row_updater: client,
            cache,
            notifier,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Confirmed(CandidateOrder),
    Linked { order_id: String },
    LinkFailed { message: String },
    Cancelled,
}

pub struct MatchDialog {
    row: ImportedRow,
    import: TransactionsImport,
    filters: CandidateFilters,
    results: QueryState,
    state: SelectionState,
    adapter: CandidateQueryAdapter,
    committer: ReconciliationCommitter,
    notifier: Arc<dyn Notifier>,
    settings: DialogConfig,
    outcome: Option<DialogOutcome>,
}

impl MatchDialog {
    /// Open a dialog for `row`. Fails if the row does not belong to `import`
    /// or its amount is not positive.
    #[instrument(skip_all, fields(row_id = %row.id, import_id = %import.id))]
    pub fn open(
        collaborators: Collaborators,
        settings: DialogConfig,
        import: TransactionsImport,
        row: ImportedRow,
    ) -> Result<Self, AppError> {
        if row.import_id != import.id {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Row {} does not belong to import {}",
                row.id,
                import.id
            )));
        }

        let filters = CandidateFilters::for_row(&row, settings.page_size)?;

        // Parent views own these entries; only seed them when absent.
        let cache = collaborators.cache;
        if !cache.contains(&EntityKey::import(&import.id)) {
            cache.put_import(&import)?;
        }
        if !cache.contains(&EntityKey::row(&row.id)) {
            cache.put_row(&row)?;
        }

        let adapter = CandidateQueryAdapter::new(
            collaborators.orders,
            import.account.clone(),
            &row.amount.currency,
        );
        let committer = ReconciliationCommitter::new(
            collaborators.confirmer,
            collaborators.row_updater,
            cache,
        );

        info!(amount = row.amount.value_in_cents, "Match dialog opened");

        Ok(Self {
            row,
            import,
            filters,
            results: QueryState::NotLoaded,
            state: SelectionState::new(),
            adapter,
            committer,
            notifier: collaborators.notifier,
            settings,
            outcome: None,
        })
    }

    pub fn row(&self) -> &ImportedRow {
        &self.row
    }

    pub fn import(&self) -> &TransactionsImport {
        &self.import
    }

    pub fn filters(&self) -> &CandidateFilters {
        &self.filters
    }

    pub fn results(&self) -> &QueryState {
        &self.results
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn outcome(&self) -> Option<&DialogOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_closed()
    }

    pub fn primary_action(&self) -> Option<PrimaryAction> {
        self.state.primary_action()
    }

    pub fn raw_values(&self) -> Vec<(&str, &str)> {
        displayable_raw_values(&self.row, self.import.csv_config.as_ref())
    }

    fn transition(&mut self, event: SelectionEvent) {
        let before = self.state.stage();
        self.state = std::mem::take(&mut self.state).apply(event);
        if before != self.state.stage() {
            debug!(
                from = before.as_str(),
                to = self.state.stage().as_str(),
                "Dialog stage changed"
            );
        }
    }

    // =========================================================================
    // Candidates
    // =========================================================================

    pub async fn refresh(&mut self) -> &QueryState {
        self.results = self.adapter.fetch(&self.filters).await;
        &self.results
    }

    /// Replace the filters and reload from the first page.
    pub async fn apply_filters(&mut self, filters: CandidateFilters) -> &QueryState {
        self.filters = CandidateFilters {
            offset: 0,
            ..filters
        };
        self.refresh().await
    }

    pub async fn next_page(&mut self) -> &QueryState {
        self.filters = self.filters.next_page();
        self.refresh().await
    }

    pub async fn previous_page(&mut self) -> &QueryState {
        self.filters = self.filters.previous_page();
        self.refresh().await
    }

    // =========================================================================
    // Selection
    // =========================================================================

    pub fn select(&mut self, order: CandidateOrder) {
        self.transition(SelectionEvent::Select(order));
    }

    /// Select a candidate from the currently loaded page.
    pub fn select_by_id(&mut self, order_id: &str) -> Result<(), AppError> {
        let order = self
            .results
            .page()
            .and_then(|page| page.find(order_id))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Order {} is not in the results", order_id))
            })?;
        self.select(order);
        Ok(())
    }

    /// Move to the confirmation form. Returns false when the button would be
    /// disabled (nothing selected, or the selection is not pending).
    pub fn next(&mut self) -> bool {
        if !self.state.can_advance() {
            return false;
        }
        self.transition(SelectionEvent::Next);
        true
    }

    pub fn back(&mut self) {
        self.transition(SelectionEvent::Back);
    }

    pub fn cancel(&mut self) -> DialogOutcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        self.transition(SelectionEvent::Cancel);
        self.outcome = Some(DialogOutcome::Cancelled);
        DialogOutcome::Cancelled
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Submit the confirmation form for the selected pending order.
    ///
    /// On failure the dialog stays open on the form and the error is returned
    /// for the form to display.
    #[instrument(skip(self), fields(row_id = %self.row.id))]
    pub async fn confirm(&mut self) -> Result<DialogOutcome, AppError> {
        if !self.state.is_confirming() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Select a pending contribution and continue before confirming"
            )));
        }
        if self.state.is_submitting() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "A submission is already in progress"
            )));
        }
        let order = self.state.selected().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Confirming without a selection"))
        })?;

        self.transition(SelectionEvent::SubmitStarted);
        match self.committer.confirm_pending(&self.row, &order).await {
            Ok(confirmed) => {
                self.row.order = Some(OrderRef::from(&confirmed));
                self.notifier.notify(Toast::success(
                    "Contribution confirmed",
                    format!("Contribution #{} was marked as paid", confirmed.legacy_id),
                ));
                self.transition(SelectionEvent::SubmitSucceeded);
                let outcome = DialogOutcome::Confirmed(confirmed);
                self.outcome = Some(outcome.clone());
                Ok(outcome)
            }
            Err(e) => {
                self.transition(SelectionEvent::SubmitFailed);
                Err(e)
            }
        }
    }

    /// Link the row to the selected, already settled order.
    ///
    /// A failed update is reported through the notifier. With
    /// `close_on_link_failure` the dialog then closes anyway and the outcome is
    /// `LinkFailed`; otherwise it stays open and the error is returned.
    #[instrument(skip(self), fields(row_id = %self.row.id))]
    pub async fn save(&mut self) -> Result<DialogOutcome, AppError> {
        if !self.state.can_save() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Select an already paid contribution before saving"
            )));
        }
        let order = self.state.selected().cloned().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!("Saving without a selection"))
        })?;

        self.transition(SelectionEvent::SubmitStarted);
        match self.committer.link_existing(&self.row, &order).await {
            Ok(()) => {
                self.row.order = Some(OrderRef::from(&order));
                self.notifier.notify(Toast::success(
                    "Transaction matched",
                    format!("The transaction was linked to contribution #{}", order.legacy_id),
                ));
                self.transition(SelectionEvent::SubmitSucceeded);
                let outcome = DialogOutcome::Linked { order_id: order.id };
                self.outcome = Some(outcome.clone());
                Ok(outcome)
            }
            Err(e) => {
                let message = e.display_message();
                self.notifier
                    .notify(Toast::error("Error while matching the transaction", message.as_str()));

                if self.settings.close_on_link_failure {
                    self.transition(SelectionEvent::Cancel);
                    let outcome = DialogOutcome::LinkFailed { message };
                    self.outcome = Some(outcome.clone());
                    Ok(outcome)
                } else {
                    self.transition(SelectionEvent::SubmitFailed);
                    Err(e)
                }
            }
        }
    }
}
