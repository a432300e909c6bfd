//! Merchant to spend-category lookup

use std::collections::HashMap;

/// Category for merchants not in the directory
pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone)]
pub struct MerchantDirectory {
    categories: HashMap<String, String>,
}

impl Default for MerchantDirectory {
    fn default() -> Self {
        let known = [
            ("Swiggy", "Food & Dining"),
            ("Zomato", "Food & Dining"),
            ("Dominos", "Food & Dining"),
            ("Amazon", "Shopping"),
            ("Flipkart", "Shopping"),
            ("PayTM Mall", "Shopping"),
            ("Uber", "Transportation"),
            ("BookMyShow", "Entertainment"),
            ("BigBasket", "Groceries"),
            ("Myntra", "Fashion"),
        ];
        Self {
            categories: known
                .into_iter()
                .map(|(merchant, category)| (merchant.to_string(), category.to_string()))
                .collect(),
        }
    }
}

impl MerchantDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact, case-sensitive lookup
    pub fn category_for(&self, merchant: &str) -> &str {
        self.categories
            .get(merchant)
            .map(String::as_str)
            .unwrap_or(DEFAULT_CATEGORY)
    }

    pub fn insert(&mut self, merchant: impl Into<String>, category: impl Into<String>) {
        self.categories.insert(merchant.into(), category.into());
    }
}
