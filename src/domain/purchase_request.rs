use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ProductId, RequestId, UserId};
use crate::error::{MarketError, MarketResult};

/// Status of a purchase request. Every request starts `Pending`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestStatus::Pending)
    }
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// A buyer's offer to purchase one product.
///
/// Requests are never deleted; only arbitration changes `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub id: RequestId,
    pub product_id: ProductId,
    pub buyer_id: UserId,
    pub status: RequestStatus,
    pub message: Option<String>,
    /// Display ordering only.
    pub created_at: DateTime<Utc>,
}

/// Normalize a buyer's free-text message: trimmed, empty becomes `None`.
pub fn normalize_message(message: Option<String>, max_len: usize) -> MarketResult<Option<String>> {
    let Some(message) = message else {
        return Ok(None);
    };
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(MarketError::validation(format!(
            "message is {} characters, limit is {}",
            len, max_len
        )));
    }
    Ok(Some(trimmed.to_string()))
}
