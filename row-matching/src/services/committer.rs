//! Finalization of a match: confirm a pending order or link a settled one.

use crate::clients::{ConfirmContributionRequest, ContributionConfirmer, IdRef, RowUpdateRequest, RowUpdater};
use crate::models::{Amount, CandidateOrder, ImportedRow, OrderRef};
use crate::services::cache::EntityCache;
use crate::services::metrics::{record_commit, record_error};
use recon_core::error::AppError;
use std::sync::Arc;
use tracing::{error, info, instrument};

pub const PATH_CONFIRM: &str = "confirm";
pub const PATH_LINK: &str = "link";

pub struct ReconciliationCommitter {
    confirmer: Arc<dyn ContributionConfirmer>,
    row_updater: Arc<dyn RowUpdater>,
    cache: Arc<EntityCache>,
}

impl ReconciliationCommitter {
    pub fn new(
        confirmer: Arc<dyn ContributionConfirmer>,
        row_updater: Arc<dyn RowUpdater>,
        cache: Arc<EntityCache>,
    ) -> Self {
        Self {
            confirmer,
            row_updater,
            cache,
        }
    }

    /// Payment details pre-filled from the bank row.
    pub fn confirmation_request(
        row: &ImportedRow,
        order: &CandidateOrder,
    ) -> ConfirmContributionRequest {
        ConfirmContributionRequest {
            order_id: order.id.clone(),
            amount_received: row.amount.clone(),
            payment_processor_fee: Amount::new(0, row.amount.currency.as_str()),
            platform_tip: order
                .platform_tip_amount
                .clone()
                .unwrap_or_else(|| Amount::new(0, order.total_amount.currency.as_str())),
            processed_at: row.processed_on(),
            transactions_import_row: IdRef { id: row.id.clone() },
        }
    }

    /// Record the row as the payment of a pending order.
    ///
    /// The cache is updated before returning so the caller can close the
    /// dialog and have parent views show fresh counts.
    #[instrument(skip(self, row, order), fields(row_id = %row.id, order_id = %order.id))]
    pub async fn confirm_pending(
        &self,
        row: &ImportedRow,
        order: &CandidateOrder,
    ) -> Result<CandidateOrder, AppError> {
        if !order.requires_confirmation() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Order {} is not pending and cannot be confirmed",
                order.legacy_id
            )));
        }

        let request = Self::confirmation_request(row, order);
        let confirmed = match self.confirmer.confirm_contribution(&request).await {
            Ok(confirmed) => confirmed,
            Err(e) => {
                let err = AppError::from(e);
                record_commit(PATH_CONFIRM, "failure");
                record_error(err.kind());
                error!(error = %err, "Failed to confirm contribution");
                return Err(err);
            }
        };

        self.cache.put_order(&confirmed)?;
        self.cache
            .link_row_order(&row.id, &OrderRef::from(&confirmed))?;
        self.cache.increment_import_stats(&row.import_id);

        record_commit(PATH_CONFIRM, "success");
        info!(
            import_id = %row.import_id,
            amount_received = row.amount.value_in_cents,
            "Contribution confirmed from imported row"
        );

        Ok(confirmed)
    }

    /// Associate the row with an order that is already settled.
    ///
    /// The cached import stats are bumped locally the same way as for a
    /// confirmation; server-side counts are not refetched.
    #[instrument(skip(self, row, order), fields(row_id = %row.id, order_id = %order.id))]
    pub async fn link_existing(
        &self,
        row: &ImportedRow,
        order: &CandidateOrder,
    ) -> Result<(), AppError> {
        if order.requires_confirmation() {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "Order {} is pending and must be confirmed instead",
                order.legacy_id
            )));
        }

        let request = RowUpdateRequest::link_single(&row.import_id, &row.id, &order.id);
        let updated = match self.row_updater.update_rows(&request).await {
            Ok(updated) => updated,
            Err(e) => {
                let err = AppError::from(e);
                record_commit(PATH_LINK, "failure");
                record_error(err.kind());
                error!(error = %err, "Failed to link row to order");
                return Err(err);
            }
        };

        // Prefer what the server says the row now points at.
        let order_ref = updated
            .iter()
            .find(|r| r.id == row.id)
            .and_then(|r| r.order.clone())
            .unwrap_or_else(|| OrderRef::from(order));
        self.cache.link_row_order(&row.id, &order_ref)?;
        self.cache.increment_import_stats(&row.import_id);

        record_commit(PATH_LINK, "success");
        info!(import_id = %row.import_id, "Imported row linked to existing order");

        Ok(())
    }
}
