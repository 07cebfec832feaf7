//! Tolerance window used to pre-filter candidate contributions by amount.

use recon_core::error::AppError;
use serde::{Deserialize, Serialize};

/// Inclusive amount window in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountRange {
    pub gte: i64,
    pub lte: i64,
}

impl AmountRange {
    pub fn contains(&self, value_in_cents: i64) -> bool {
        self.gte <= value_in_cents && value_in_cents <= self.lte
    }
}

/// Compute the window that should contain the true amount of a contribution
/// observed as `value_in_cents` on a bank statement.
///
/// Bounds snap to the amount's leading decade (123 snaps to hundreds, 123456
/// to hundred-thousands). The upper bound is 120% rounded up. The lower bound
/// is 80% rounded to the nearest step, capped at the amount rounded down so
/// the window always contains the amount.
pub fn amount_range_filter(value_in_cents: i64) -> Result<AmountRange, AppError> {
    if value_in_cents <= 0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Amount must be positive to estimate a match range, got {}",
            value_in_cents
        )));
    }

    let step = 10_i64.pow(value_in_cents.ilog10());
    let overflow =
        || AppError::BadRequest(anyhow::anyhow!("Amount {} is too large", value_in_cents));

    // Work in tenths of a step so the 0.8 and 1.2 factors stay integral.
    let tenth_steps = step.checked_mul(10).ok_or_else(overflow)?;
    let lower_scaled = value_in_cents.checked_mul(8).ok_or_else(overflow)?;
    let upper_scaled = value_in_cents.checked_mul(12).ok_or_else(overflow)?;

    let lower_nearest = lower_scaled
        .checked_add(tenth_steps / 2)
        .ok_or_else(overflow)?
        / tenth_steps
        * step;
    let floor_of_value = value_in_cents / step * step;
    let gte = lower_nearest.min(floor_of_value);

    let lte = upper_scaled
        .checked_add(tenth_steps - 1)
        .ok_or_else(overflow)?
        / tenth_steps
        * step;

    Ok(AmountRange { gte, lte })
}
