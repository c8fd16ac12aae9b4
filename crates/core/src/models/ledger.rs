//! Balance audit trail, inventory, and message records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LedgerEntryType {
    Deposit,
    Withdrawal,
}

/// One balance change, with the coupon that caused it when applicable
///
/// The coupon id is what makes redemption retries deduplicable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: String,
    pub entry_type: LedgerEntryType,
    pub reason: String,
    pub amount: u64,
    #[serde(default)]
    pub coupon_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// A deposit caused by redeeming `coupon_id`
    pub fn coupon_deposit(
        reason: &str,
        amount: u64,
        coupon_id: &str,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            entry_type: LedgerEntryType::Deposit,
            reason: reason.to_string(),
            amount,
            coupon_id: Some(coupon_id.to_string()),
            recorded_at,
        }
    }
}

/// An item granted to the student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: String,
    pub item: String,
    pub quantity: u32,
    #[serde(default)]
    pub coupon_id: Option<String>,
    pub granted_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn from_coupon(
        item: &str,
        quantity: u32,
        coupon_id: &str,
        granted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            item: item.to_string(),
            quantity,
            coupon_id: Some(coupon_id.to_string()),
            granted_at,
        }
    }
}

/// Who authored a message record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MessageSender {
    System,
    Teacher,
    Student,
}

/// A message visible to the student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub from: MessageSender,
    pub body: String,
    #[serde(default)]
    pub coupon_id: Option<String>,
    pub sent_at: DateTime<Utc>,
}

impl Message {
    /// A system-authored message caused by redeeming `coupon_id`
    pub fn system_gift(body: &str, coupon_id: &str, sent_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            from: MessageSender::System,
            body: body.to_string(),
            coupon_id: Some(coupon_id.to_string()),
            sent_at,
        }
    }
}
