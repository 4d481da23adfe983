//! Small calculations over exchange metadata.

use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

use crate::types::{ExchangeInfo, MaintenanceWindow};

/// Instant withdrawal fee rate for `amount`.
///
/// Picks the tier with the highest threshold not above `amount`; amounts below every
/// threshold pay the lowest tier's rate. `None` when the exchange publishes no tiers.
#[must_use]
pub fn withdrawal_fee_for_amount(info: &ExchangeInfo, amount: Decimal) -> Option<Decimal> {
    let mut tiers = info.fee_config.instant_withdrawal_fees.clone();
    tiers.sort_by(|a, b| b.0.cmp(&a.0));

    tiers
        .iter()
        .find(|(threshold, _)| amount >= *threshold)
        .or_else(|| tiers.last())
        .map(|(_, fee)| *fee)
}

/// Earliest maintenance window starting after `now`.
#[must_use]
pub fn next_maintenance_window(
    info: &ExchangeInfo,
    now: DateTime<Utc>,
) -> Option<&MaintenanceWindow> {
    info.maintenance_windows
        .iter()
        .filter(|window| window.begin > now)
        .min_by_key(|window| window.begin)
}

#[must_use]
pub fn format_maintenance_window(window: Option<&MaintenanceWindow>, now: DateTime<Utc>) -> String {
    let Some(window) = window else {
        return "No upcoming maintenance windows scheduled.".to_owned();
    };

    let until = (window.begin - now).max(TimeDelta::zero());
    let days = until.num_days();
    let hours = until.num_hours() % 24;
    let minutes = until.num_minutes() % 60;

    let duration_minutes = (window.end - window.begin).num_minutes();
    let duration = if duration_minutes < 60 {
        format!("{duration_minutes} minutes")
    } else {
        let hours = duration_minutes / 60;
        let plural = if duration_minutes == 60 { "" } else { "s" };
        format!("{hours} hour{plural}")
    };

    format!(
        "The next maintenance window starts in {days}d{hours}h{minutes}m on {} for a duration of {duration}. Reason: {}.",
        window.begin.format("%d %B %Y at %H:%M"),
        window.note
    )
}
