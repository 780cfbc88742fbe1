//! Order status.

use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
///
/// The well-known values get their own variants; the admin surface may set
/// any other lower-case word, which is kept verbatim in [`OrderStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OrderStatus {
    /// Freshly created, not yet handled by the shop.
    #[default]
    Pending,
    /// Accepted by the shop.
    Confirmed,
    /// Handed over to the customer.
    Delivered,
    /// Cancelled by the shop.
    Cancelled,
    /// Any other status label set by an admin.
    Other(String),
}

impl OrderStatus {
    /// Maximum length of a status label.
    pub const MAX_LENGTH: usize = 32;

    /// Status label as stored and serialized.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Other(label) => label,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_lowercase();
        match label.as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "delivered" => Ok(Self::Delivered),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            "" => Err("order status cannot be empty".to_string()),
            other if other.len() > Self::MAX_LENGTH => Err(format!(
                "order status must be at most {} characters",
                Self::MAX_LENGTH
            )),
            other
                if other
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c == '_' || c == '-') =>
            {
                Ok(Self::Other(other.to_string()))
            }
            other => Err(format!("invalid order status: {other}")),
        }
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        status.as_str().to_string()
    }
}
