use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::util::{days_remaining, days_to_millis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubscriptionStatus {
    PendingPayment,
    Active,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Unpaid,
}

/// Stored billing window of a shop. Status fields are derived, see [`SubscriptionView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub shop_id: String,
    pub subscription_start: Option<i64>,
    pub subscription_end: Option<i64>,
    pub last_payment_date: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Subscription {
    pub fn status_at(&self, now: i64) -> SubscriptionStatus {
        match (self.last_payment_date, self.subscription_end) {
            (None, _) | (_, None) => SubscriptionStatus::PendingPayment,
            (Some(_), Some(end)) if now >= end => SubscriptionStatus::Expired,
            (Some(_), Some(_)) => SubscriptionStatus::Active,
        }
    }

    /// Paid means paid for the period covering `now`.
    pub fn payment_status_at(&self, now: i64) -> PaymentStatus {
        match self.status_at(now) {
            SubscriptionStatus::Active => PaymentStatus::Paid,
            _ => PaymentStatus::Unpaid,
        }
    }

    pub fn days_remaining_at(&self, now: i64) -> Option<i64> {
        days_remaining(self.subscription_end, now)
    }

    /// End of the window after one more paid period.
    ///
    /// Counted from the later of `now` and the current end: renewing early
    /// keeps the unused time, renewing late does not back-date.
    pub fn extended_end(&self, now: i64, period_days: i64) -> i64 {
        let base = self.subscription_end.map_or(now, |end| end.max(now));
        base + days_to_millis(period_days)
    }

    pub fn view_at(self, now: i64) -> SubscriptionView {
        SubscriptionView {
            status: self.status_at(now),
            payment_status: self.payment_status_at(now),
            days_remaining: self.days_remaining_at(now),
            subscription: self,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub status: SubscriptionStatus,
    pub payment_status: PaymentStatus,
    pub days_remaining: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionWithShop {
    #[serde(flatten)]
    pub subscription: SubscriptionView,
    pub shop_name: String,
    pub owner_name: String,
    pub owner_surname: String,
    pub phone_number: String,
}
