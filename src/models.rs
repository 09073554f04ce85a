use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category tags known to the backend's `Category` enum.
pub const CATEGORIES: [&str; 5] = ["FOOD", "ENTERTAINMENT", "TRAVEL", "SHOPPING", "OTHER"];

/// A single expense row as the backend returns it. The `id` is
/// server-assigned; it is absent on create payloads.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: Option<i64>,
    pub amount: f64,
    pub category: String,
    pub date: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRecord {
    pub amount: f64,
    pub date: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Per-account budget configuration. Replaced wholesale on update; the
/// category map is a `BTreeMap` so alert output has a stable order.
#[derive(Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BudgetConfig {
    pub monthly_limit: f64,
    pub category_limits: BTreeMap<String, f64>,
}

/// Server-computed spending summary for the current (or requested) month.
#[derive(Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SpendingSummary {
    pub per_category_totals: BTreeMap<String, f64>,
    pub total_spent: f64,
    pub budget_exceeded: bool,
}

/// Raw per-month totals from `/api/expenses/trends/{year}`: parallel arrays
/// where `months` holds calendar month numbers (1..=12).
#[derive(Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrendsResponse {
    pub months: Vec<u32>,
    pub expenses: Vec<f64>,
    pub incomes: Vec<f64>,
}

/// Derived year series, always 12 slots Jan..Dec, aligned by index.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct TrendSeries {
    pub months: Vec<String>,
    pub expenses: Vec<f64>,
    pub incomes: Vec<f64>,
}

#[derive(Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IncomeVsExpense {
    pub income: f64,
    pub expense: f64,
}
