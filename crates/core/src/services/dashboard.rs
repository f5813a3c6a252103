//! Dashboard aggregation service.
//!
//! The messaging core owns only the unread-notification figure; balances,
//! vouchers, treatments and appointments come from external collaborators
//! behind [`BenefitsProvider`].

use std::sync::Arc;

use mutuelle_common::AppResult;
use mutuelle_db::repositories::NotificationRepository;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;

/// Voucher counters supplied by the voucher collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoucherCounts {
    pub active: u64,
    pub total: u64,
}

/// External membership/voucher/treatment figures.
#[async_trait::async_trait]
pub trait BenefitsProvider: Send + Sync {
    /// Current account balance of the member.
    async fn balance(&self, user_id: &str) -> AppResult<f64>;

    /// Active and total care voucher counts.
    async fn voucher_counts(&self, user_id: &str) -> AppResult<VoucherCounts>;

    /// Treatments awaiting processing.
    async fn pending_treatments(&self, user_id: &str) -> AppResult<u64>;

    /// Next scheduled appointment, if any.
    async fn next_appointment(&self, user_id: &str) -> AppResult<Option<DateTimeWithTimeZone>>;
}

/// Provider for deployments without the benefits collaborators wired in.
pub struct NoBenefits;

#[async_trait::async_trait]
impl BenefitsProvider for NoBenefits {
    async fn balance(&self, _user_id: &str) -> AppResult<f64> {
        Ok(0.0)
    }

    async fn voucher_counts(&self, _user_id: &str) -> AppResult<VoucherCounts> {
        Ok(VoucherCounts::default())
    }

    async fn pending_treatments(&self, _user_id: &str) -> AppResult<u64> {
        Ok(0)
    }

    async fn next_appointment(&self, _user_id: &str) -> AppResult<Option<DateTimeWithTimeZone>> {
        Ok(None)
    }
}

/// Per-user dashboard summary.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub balance: f64,
    pub active_vouchers: u64,
    pub total_vouchers: u64,
    pub pending_treatments: u64,
    pub unread_notifications: u64,
    pub next_appointment: Option<DateTimeWithTimeZone>,
}

/// Dashboard service.
#[derive(Clone)]
pub struct DashboardService {
    notification_repo: NotificationRepository,
    benefits: Arc<dyn BenefitsProvider>,
}

impl DashboardService {
    /// Create a new dashboard service.
    #[must_use]
    pub fn new(
        notification_repo: NotificationRepository,
        benefits: Arc<dyn BenefitsProvider>,
    ) -> Self {
        Self {
            notification_repo,
            benefits,
        }
    }

    /// Compute the dashboard summary for a user.
    pub async fn summary(&self, user_id: &str) -> AppResult<DashboardSummary> {
        let unread_notifications = self.notification_repo.count_unread(user_id).await?;
        let balance = self.benefits.balance(user_id).await?;
        let vouchers = self.benefits.voucher_counts(user_id).await?;
        let pending_treatments = self.benefits.pending_treatments(user_id).await?;
        let next_appointment = self.benefits.next_appointment(user_id).await?;

        Ok(DashboardSummary {
            balance,
            active_vouchers: vouchers.active,
            total_vouchers: vouchers.total,
            pending_treatments,
            unread_notifications,
            next_appointment,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_benefits_returns_zeroes() {
        let provider = NoBenefits;

        assert_eq!(provider.balance("usr1").await.unwrap(), 0.0);
        let vouchers = provider.voucher_counts("usr1").await.unwrap();
        assert_eq!(vouchers.active, 0);
        assert_eq!(vouchers.total, 0);
        assert!(provider.next_appointment("usr1").await.unwrap().is_none());
    }
}
