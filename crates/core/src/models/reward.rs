//! Reward catalog - the fixed list of drawable reward kinds and effects

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// What redeeming a coupon for this reward actually does
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RewardEffect {
    /// Deposit a fixed amount of virtual currency
    CurrencyGrant { amount: u64 },
    /// Add an item to the student's inventory
    ItemGrant { item: String, quantity: u32 },
    /// Deliver a system-authored message to the student
    SocialGift { message: String },
}

/// One drawable reward kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardEntry {
    pub key: String,
    pub display_label: String,
    /// Relative draw probability, used only by the weighted draw policy
    pub weight: u32,
    pub effect: RewardEffect,
}

/// The fixed, non-persisted catalog of drawable rewards
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardCatalog {
    entries: Vec<RewardEntry>,
}

impl RewardCatalog {
    /// Build a catalog, validating entries
    ///
    /// Rejects an empty catalog, duplicate keys, and zero weights (a zero
    /// weight would make the weighted policy unsamplable).
    pub fn new(entries: Vec<RewardEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(Error::InvalidData("Reward catalog is empty".to_string()));
        }
        for (i, entry) in entries.iter().enumerate() {
            if entry.weight == 0 {
                return Err(Error::InvalidData(format!(
                    "Reward '{}' has zero weight",
                    entry.key
                )));
            }
            if entries[..i].iter().any(|e| e.key == entry.key) {
                return Err(Error::InvalidData(format!(
                    "Duplicate reward key '{}'",
                    entry.key
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[RewardEntry] {
        &self.entries
    }

    pub fn get(&self, key: &str) -> Option<&RewardEntry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// The stock classroom catalog
    pub fn classroom_default() -> Self {
        let entry = |key: &str, label: &str, weight: u32, effect: RewardEffect| RewardEntry {
            key: key.to_string(),
            display_label: label.to_string(),
            weight,
            effect,
        };
        // Weights are defined for every entry even though the default draw
        // policy samples uniformly; see DrawPolicy.
        Self {
            entries: vec![
                entry(
                    "bonus-points-small",
                    "Bonus Points (+50)",
                    40,
                    RewardEffect::CurrencyGrant { amount: 50 },
                ),
                entry(
                    "bonus-points-large",
                    "Bonus Points (+200)",
                    10,
                    RewardEffect::CurrencyGrant { amount: 200 },
                ),
                entry(
                    "homework-pass",
                    "Homework Pass",
                    20,
                    RewardEffect::ItemGrant {
                        item: "Homework Pass".to_string(),
                        quantity: 1,
                    },
                ),
                entry(
                    "snack-voucher",
                    "Snack Voucher",
                    15,
                    RewardEffect::ItemGrant {
                        item: "Snack Voucher".to_string(),
                        quantity: 1,
                    },
                ),
                entry(
                    "praise-note",
                    "Praise Note",
                    15,
                    RewardEffect::SocialGift {
                        message: "Your teacher sent you a praise note. Great work!".to_string(),
                    },
                ),
            ],
        }
    }
}

impl Default for RewardCatalog {
    fn default() -> Self {
        Self::classroom_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = RewardCatalog::classroom_default();
        assert!(RewardCatalog::new(catalog.entries().to_vec()).is_ok());
        assert!(catalog.get("homework-pass").is_some());
        assert!(catalog.get("no-such-reward").is_none());
    }

    #[test]
    fn test_rejects_empty_catalog() {
        assert!(RewardCatalog::new(vec![]).is_err());
    }

    #[test]
    fn test_rejects_duplicate_keys_and_zero_weights() {
        let base = RewardCatalog::classroom_default().entries()[0].clone();
        let mut dup = base.clone();
        dup.weight = 5;
        assert!(RewardCatalog::new(vec![base.clone(), dup]).is_err());

        let mut zero = base;
        zero.key = "zero".to_string();
        zero.weight = 0;
        assert!(RewardCatalog::new(vec![zero]).is_err());
    }

    #[test]
    fn test_effect_serializes_tagged() {
        let effect = RewardEffect::CurrencyGrant { amount: 50 };
        let v = serde_json::to_value(&effect).unwrap();
        assert_eq!(v["kind"], "currencyGrant");
        assert_eq!(v["amount"], 50);
    }
}
