//! Credit card purchase model
//!
//! One row per installment. A purchase split into N installments produces N
//! rows sharing vendor, card and owner, each charged to its own billing cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::PurchaseId;
use super::money::Money;
use super::period::MonthPeriod;

/// Card names whose cutoff is the first Thursday of the month
const THURSDAY_CUTOFF_CARDS: [&str; 2] = ["visa", "amex"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditCardPurchase {
    pub id: PurchaseId,
    pub owner_id: String,
    #[serde(default)]
    pub owner_name: Option<String>,
    /// Amount charged in this installment
    pub amount: Money,
    pub vendor: String,
    #[serde(default)]
    pub card_name: Option<String>,
    pub billing_cycle: MonthPeriod,
    /// 1-based position of this row within its purchase
    #[serde(default = "default_installment")]
    pub installment: u32,
    /// Number of installments of the whole purchase
    #[serde(default = "default_installment")]
    pub installments: u32,
    pub purchased_at: DateTime<Utc>,
}

fn default_installment() -> u32 {
    1
}

impl CreditCardPurchase {
    /// `vendor` or `vendor (card)`
    pub fn label(&self) -> String {
        match &self.card_name {
            Some(card) => format!("{} ({})", self.vendor, card),
            None => self.vendor.clone(),
        }
    }

    pub fn is_installment_plan(&self) -> bool {
        self.installments > 1
    }
}

/// Whether a card name uses the first-Thursday cutoff
pub fn uses_thursday_cutoff(card_name: Option<&str>) -> bool {
    card_name
        .map(|name| {
            let name = name.to_lowercase();
            THURSDAY_CUTOFF_CARDS.contains(&name.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thursday_cutoff_cards() {
        assert!(uses_thursday_cutoff(Some("visa")));
        assert!(uses_thursday_cutoff(Some("AMEX")));
        assert!(!uses_thursday_cutoff(Some("master")));
        assert!(!uses_thursday_cutoff(None));
    }

    #[test]
    fn test_label() {
        let mut purchase = CreditCardPurchase {
            id: PurchaseId::new(),
            owner_id: "123".into(),
            owner_name: None,
            amount: Money::from_units(100),
            vendor: "amazon".into(),
            card_name: None,
            billing_cycle: MonthPeriod::new(2025, 5).unwrap(),
            installment: 1,
            installments: 1,
            purchased_at: Utc::now(),
        };
        assert_eq!(purchase.label(), "amazon");
        assert!(!purchase.is_installment_plan());

        purchase.card_name = Some("visa".into());
        assert_eq!(purchase.label(), "amazon (visa)");
    }
}
