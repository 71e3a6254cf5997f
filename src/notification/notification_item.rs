//! Notification records as they are kept in memory and persisted

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The fixed set of notification kinds. At most one notification per kind is
/// kept for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKey {
    OverAllocate,
    OverAllocateNextEra,
    OutdatedAllocation,
    UnhealthyAllocation,
    UnlockWithdrawal,
    UnlockCommission,
    UnclaimedRewards,
    LowBillingBalance,
    LowControllerBalance,
    InactiveOperator,
    MisConfiguredProjects,
    CommissionChanged,
    ExpiredStateChannel,
}

impl NotificationKey {
    pub const ALL: [NotificationKey; 13] = [
        NotificationKey::OverAllocate,
        NotificationKey::OverAllocateNextEra,
        NotificationKey::OutdatedAllocation,
        NotificationKey::UnhealthyAllocation,
        NotificationKey::UnlockWithdrawal,
        NotificationKey::UnlockCommission,
        NotificationKey::UnclaimedRewards,
        NotificationKey::LowBillingBalance,
        NotificationKey::LowControllerBalance,
        NotificationKey::InactiveOperator,
        NotificationKey::MisConfiguredProjects,
        NotificationKey::CommissionChanged,
        NotificationKey::ExpiredStateChannel,
    ];

    /// Wire name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKey::OverAllocate => "overAllocate",
            NotificationKey::OverAllocateNextEra => "overAllocateNextEra",
            NotificationKey::OutdatedAllocation => "outdatedAllocation",
            NotificationKey::UnhealthyAllocation => "unhealthyAllocation",
            NotificationKey::UnlockWithdrawal => "unlockWithdrawal",
            NotificationKey::UnlockCommission => "unlockCommission",
            NotificationKey::UnclaimedRewards => "unclaimedRewards",
            NotificationKey::LowBillingBalance => "lowBillingBalance",
            NotificationKey::LowControllerBalance => "lowControllerBalance",
            NotificationKey::InactiveOperator => "inactiveOperator",
            NotificationKey::MisConfiguredProjects => "misConfiguredProjects",
            NotificationKey::CommissionChanged => "commissionChanged",
            NotificationKey::ExpiredStateChannel => "expiredStateChannel",
        }
    }
}

impl fmt::Display for NotificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown notification key '{}'", s))
    }
}

/// Priority of a notification. Critical ones are always listed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    #[default]
    Info,
    Critical,
}

impl NotificationLevel {
    /// Sort rank, lower first.
    pub fn rank(self) -> u8 {
        match self {
            NotificationLevel::Critical => 0,
            NotificationLevel::Info => 1,
        }
    }
}

impl FromStr for NotificationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(NotificationLevel::Info),
            "critical" => Ok(NotificationLevel::Critical),
            other => Err(format!("unknown level '{}', expected info or critical", other)),
        }
    }
}

/// Call-to-action attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonProps {
    pub label: String,
    pub navigate_href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationItem {
    pub key: NotificationKey,
    pub level: NotificationLevel,
    pub message: String,
    pub title: String,
    /// Epoch millis
    pub created_at: i64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub can_be_dismissed: bool,
    /// Hidden until this epoch millis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss_to: Option<i64>,
    /// When the user last dismissed it, epoch millis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismiss_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub button_props: Option<ButtonProps>,
}

impl NotificationItem {
    /// Creates a dismissable notification stamped with the current time.
    pub fn new(
        key: NotificationKey,
        level: NotificationLevel,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            key,
            level,
            message: message.into(),
            title: title.into(),
            created_at: now_millis(),
            kind: None,
            can_be_dismissed: true,
            dismiss_to: None,
            dismiss_time: None,
            button_props: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_button(mut self, label: impl Into<String>, navigate_href: impl Into<String>) -> Self {
        self.button_props = Some(ButtonProps {
            label: label.into(),
            navigate_href: navigate_href.into(),
        });
        self
    }

    pub fn not_dismissable(mut self) -> Self {
        self.can_be_dismissed = false;
        self
    }

    /// Validates one persisted record.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// True while a dismissal is in effect at `now` (epoch millis).
    pub fn is_suppressed(&self, now: i64) -> bool {
        self.dismiss_to.is_some_and(|until| until > now)
    }
}

/// Current wall-clock time in epoch millis.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
