//! Pure aggregation over already-fetched totals. No I/O in this module, so
//! everything here runs under plain `cargo test` without a browser.

use std::collections::BTreeMap;

use crate::models::{BudgetConfig, SpendingSummary, TrendSeries, TrendsResponse};

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Qualitative status for a category, tiered by spent/limit ratio.
/// Ordered by severity so tiers compare with `<`/`>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UsageTier {
    OnTrack,
    HalfUsed,
    Warning,
    Exceeded,
}

impl UsageTier {
    pub fn label(self) -> &'static str {
        match self {
            UsageTier::OnTrack => "On track",
            UsageTier::HalfUsed => "50% used",
            UsageTier::Warning => "Warning",
            UsageTier::Exceeded => "Exceeded",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            UsageTier::OnTrack => "text-green-600",
            UsageTier::HalfUsed => "text-yellow-600",
            UsageTier::Warning => "text-orange-600",
            UsageTier::Exceeded => "text-red-600",
        }
    }
}

/// Sum of all category totals; an empty map yields 0.
pub fn total_of(per_category: &BTreeMap<String, f64>) -> f64 {
    per_category.values().sum()
}

/// Monthly limit minus total spent. Negative means over budget, which is a
/// meaningful result and not an error.
pub fn remaining(budget: &BudgetConfig, summary: &SpendingSummary) -> f64 {
    budget.monthly_limit - summary.total_spent
}

/// Percentage of the limit spent. A zero limit reads as 0% by policy, so
/// unconfigured categories never divide by zero; this is the single source
/// for both the tier boundaries and the percentages shown in the UI.
pub fn usage_percent(spent: f64, limit: f64) -> f64 {
    if limit > 0.0 {
        spent / limit * 100.0
    } else {
        0.0
    }
}

/// Tier boundaries sit at 50%, 80%, and 100% of the limit.
pub fn usage_status(spent: f64, limit: f64) -> UsageTier {
    let percent = usage_percent(spent, limit);
    if percent >= 100.0 {
        UsageTier::Exceeded
    } else if percent >= 80.0 {
        UsageTier::Warning
    } else if percent >= 50.0 {
        UsageTier::HalfUsed
    } else {
        UsageTier::OnTrack
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryAlert {
    pub category: String,
    pub message: String,
}

/// One alert per category whose spend is strictly over its limit, in the
/// iteration order of the limits map.
pub fn category_alerts(
    summary: &SpendingSummary,
    category_limits: &BTreeMap<String, f64>,
) -> Vec<CategoryAlert> {
    category_limits
        .iter()
        .filter_map(|(category, limit)| {
            let spent = summary
                .per_category_totals
                .get(category)
                .copied()
                .unwrap_or(0.0);
            (spent > *limit).then(|| CategoryAlert {
                category: category.clone(),
                message: format!("{} category budget exceeded!", category),
            })
        })
        .collect()
}

/// Spreads the per-month totals of one year's trends response into fixed
/// 12-slot series. The year itself is bound when the response is requested;
/// months missing from the response stay at 0 and month numbers outside
/// 1..=12 are ignored.
pub fn trend_for(raw: &TrendsResponse) -> TrendSeries {
    let mut expenses = vec![0.0; 12];
    let mut incomes = vec![0.0; 12];
    for (i, month) in raw.months.iter().enumerate() {
        if !(1..=12).contains(month) {
            continue;
        }
        let slot = (month - 1) as usize;
        expenses[slot] += raw.expenses.get(i).copied().unwrap_or(0.0);
        incomes[slot] += raw.incomes.get(i).copied().unwrap_or(0.0);
    }
    TrendSeries {
        months: MONTH_LABELS.iter().map(|m| m.to_string()).collect(),
        expenses,
        incomes,
    }
}

/// A concrete calendar month, labelled for chart axes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthRef {
    pub year: i32,
    pub month: u32,
    pub label: String,
}

/// The trailing `n` calendar months ending at the center month, oldest
/// first. Month index 0 or below wraps to December of the previous year.
pub fn trailing_months(center_year: i32, center_month: u32, n: u32) -> Vec<MonthRef> {
    let mut out = Vec::with_capacity(n as usize);
    for i in 0..n as i32 {
        let mut year = center_year;
        let mut adjusted = center_month as i32 - i;
        while adjusted <= 0 {
            adjusted += 12;
            year -= 1;
        }
        out.push(MonthRef {
            year,
            month: adjusted as u32,
            label: format!("{} {}", MONTH_LABELS[(adjusted - 1) as usize], year),
        });
    }
    out.reverse();
    out
}

/// Fixed two-decimal currency string, the display convention across the UI
/// and chart tooltips.
pub fn format_usd(amount: f64) -> String {
    if amount < 0.0 {
        format!("-${:.2}", -amount)
    } else {
        format!("${:.2}", amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(entries: &[(&str, f64)]) -> BTreeMap<String, f64> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn total_of_empty_map_is_zero() {
        assert_eq!(total_of(&BTreeMap::new()), 0.0);
    }

    #[test]
    fn total_of_sums_all_categories() {
        let map = totals(&[("FOOD", 12.5), ("TRAVEL", 7.5)]);
        assert_eq!(total_of(&map), 20.0);
    }

    #[test]
    fn zero_limit_is_always_on_track() {
        assert_eq!(usage_status(0.0, 0.0), UsageTier::OnTrack);
        assert_eq!(usage_status(500.0, 0.0), UsageTier::OnTrack);
    }

    #[test]
    fn usage_percent_matches_the_zero_limit_policy() {
        assert_eq!(usage_percent(50.0, 100.0), 50.0);
        assert_eq!(usage_percent(150.0, 100.0), 150.0);
        assert_eq!(usage_percent(500.0, 0.0), 0.0);
    }

    #[test]
    fn tier_boundaries_are_exact() {
        assert_eq!(usage_status(49.99, 100.0), UsageTier::OnTrack);
        assert_eq!(usage_status(50.0, 100.0), UsageTier::HalfUsed);
        assert_eq!(usage_status(79.99, 100.0), UsageTier::HalfUsed);
        assert_eq!(usage_status(80.0, 100.0), UsageTier::Warning);
        assert_eq!(usage_status(99.99, 100.0), UsageTier::Warning);
        assert_eq!(usage_status(100.0, 100.0), UsageTier::Exceeded);
        assert_eq!(usage_status(250.0, 100.0), UsageTier::Exceeded);
    }

    #[test]
    fn tier_severity_is_monotonic_in_spend() {
        let spends = [10.0, 49.0, 55.0, 81.0, 99.0, 120.0];
        let tiers: Vec<UsageTier> = spends.iter().map(|s| usage_status(*s, 100.0)).collect();
        for pair in tiers.windows(2) {
            assert!(pair[0] <= pair[1], "severity regressed: {:?}", pair);
        }
    }

    #[test]
    fn remaining_can_go_negative() {
        let budget = BudgetConfig {
            monthly_limit: 100.0,
            ..Default::default()
        };
        let summary = SpendingSummary {
            total_spent: 150.0,
            ..Default::default()
        };
        assert_eq!(remaining(&budget, &summary), -50.0);
    }

    #[test]
    fn alerts_fire_only_above_limit_in_map_order() {
        let summary = SpendingSummary {
            per_category_totals: totals(&[("FOOD", 50.0), ("SHOPPING", 90.0), ("TRAVEL", 10.0)]),
            total_spent: 150.0,
            budget_exceeded: false,
        };
        let limits = totals(&[("FOOD", 40.0), ("SHOPPING", 90.0), ("TRAVEL", 20.0)]);
        let alerts = category_alerts(&summary, &limits);
        // SHOPPING is exactly at its limit, not over it.
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].category, "FOOD");
        assert_eq!(alerts[0].message, "FOOD category budget exceeded!");
    }

    #[test]
    fn alerts_skip_categories_with_no_spend() {
        let summary = SpendingSummary::default();
        let limits = totals(&[("FOOD", 40.0)]);
        assert!(category_alerts(&summary, &limits).is_empty());
    }

    #[test]
    fn trend_fills_twelve_slots_and_ignores_bad_months() {
        let raw = TrendsResponse {
            months: vec![1, 3, 13, 0],
            expenses: vec![10.0, 30.0, 99.0, 99.0],
            incomes: vec![100.0, 300.0, 99.0, 99.0],
        };
        let series = trend_for(&raw);
        assert_eq!(series.months.len(), 12);
        assert_eq!(series.months[0], "Jan");
        assert_eq!(series.months[11], "Dec");
        assert_eq!(series.expenses[0], 10.0);
        assert_eq!(series.expenses[1], 0.0);
        assert_eq!(series.expenses[2], 30.0);
        assert_eq!(series.incomes[2], 300.0);
        assert_eq!(series.expenses.iter().sum::<f64>(), 40.0);
    }

    #[test]
    fn trailing_months_roll_over_january() {
        let months = trailing_months(2024, 1, 3);
        let labels: Vec<&str> = months.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["Nov 2023", "Dec 2023", "Jan 2024"]);
        assert_eq!(months[0].year, 2023);
        assert_eq!(months[0].month, 11);
        assert_eq!(months[2].year, 2024);
        assert_eq!(months[2].month, 1);
    }

    #[test]
    fn trailing_months_without_rollover() {
        let months = trailing_months(2024, 6, 3);
        let labels: Vec<&str> = months.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["Apr 2024", "May 2024", "Jun 2024"]);
    }

    #[test]
    fn trailing_months_can_cross_more_than_one_year() {
        let months = trailing_months(2024, 2, 15);
        assert_eq!(months.first().unwrap().label, "Dec 2022");
        assert_eq!(months.last().unwrap().label, "Feb 2024");
        assert_eq!(months.len(), 15);
    }

    #[test]
    fn currency_formatting_keeps_two_decimals() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(1234.5), "$1234.50");
        assert_eq!(format_usd(-12.0), "-$12.00");
    }
}
