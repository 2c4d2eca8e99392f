//! Static drug cost estimates.
//!
//! Pure lookup, no I/O. Names are matched after trimming and lowercasing;
//! anything not in the table gets the default estimate.

use serde::{Deserialize, Serialize};

/// Weekly / monthly / yearly estimate in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEstimate {
    pub weekly: u32,
    pub monthly: u32,
    pub yearly: u32,
}

/// Estimate for a named drug, echoing the name as entered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugPricing {
    pub drug_name: String,
    pub weekly: u32,
    pub monthly: u32,
    pub yearly: u32,
}

impl DrugPricing {
    pub fn estimate(&self) -> PriceEstimate {
        PriceEstimate {
            weekly: self.weekly,
            monthly: self.monthly,
            yearly: self.yearly,
        }
    }
}

pub const DEFAULT_ESTIMATE: PriceEstimate = PriceEstimate {
    weekly: 10,
    monthly: 40,
    yearly: 400,
};

/// (display name, estimate). Keys are the lowercased display names.
const PRICE_TABLE: [(&str, PriceEstimate); 10] = [
    ("Aspirin", PriceEstimate { weekly: 5, monthly: 20, yearly: 200 }),
    ("Ibuprofen", PriceEstimate { weekly: 8, monthly: 30, yearly: 300 }),
    ("Metformin", PriceEstimate { weekly: 15, monthly: 60, yearly: 600 }),
    ("Lisinopril", PriceEstimate { weekly: 12, monthly: 45, yearly: 450 }),
    ("Atorvastatin", PriceEstimate { weekly: 20, monthly: 75, yearly: 750 }),
    ("Omeprazole", PriceEstimate { weekly: 10, monthly: 40, yearly: 400 }),
    ("Losartan", PriceEstimate { weekly: 18, monthly: 70, yearly: 700 }),
    ("Amlodipine", PriceEstimate { weekly: 14, monthly: 55, yearly: 550 }),
    ("Metoprolol", PriceEstimate { weekly: 16, monthly: 65, yearly: 650 }),
    ("Albuterol", PriceEstimate { weekly: 25, monthly: 95, yearly: 950 }),
];

/// Looks up the estimate for a normalized name.
pub fn estimate_for(drug_name: &str) -> PriceEstimate {
    let normalized = drug_name.trim().to_lowercase();
    PRICE_TABLE
        .iter()
        .find(|(name, _)| name.to_lowercase() == normalized)
        .map(|(_, estimate)| *estimate)
        .unwrap_or(DEFAULT_ESTIMATE)
}

pub fn price_for(drug_name: &str) -> DrugPricing {
    let estimate = estimate_for(drug_name);
    DrugPricing {
        drug_name: drug_name.to_string(),
        weekly: estimate.weekly,
        monthly: estimate.monthly,
        yearly: estimate.yearly,
    }
}

/// Drug names offered by the selector, in display order.
pub fn common_drugs() -> Vec<&'static str> {
    PRICE_TABLE.iter().map(|(name, _)| *name).collect()
}
