use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::artifacts::{round_to_increment, Confidence, LoanSummaryData};
use crate::benchmarks;

/// The nine input categories every estimate is split across. Shares are
/// percentages and must sum to exactly 100.
pub const CATEGORY_WEIGHTS: &[(&str, u32)] = &[
    ("seeds", 12),
    ("fertilizer", 25),
    ("pesticide", 10),
    ("labor", 25),
    ("irrigation", 8),
    ("land_prep", 8),
    ("harvest", 7),
    ("logistics", 3),
    ("misc", 2),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl CostRange {
    pub fn midpoint(&self) -> Decimal {
        (self.min + self.max) / Decimal::from(2)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub category: String,
    pub amount: Decimal,
    pub share_pct: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdownData {
    pub crop: Option<String>,
    pub hectares: Option<Decimal>,
    pub benchmark_per_ha: Option<CostRange>,
    pub total: Option<CostRange>,
    pub lines: Vec<CostLine>,
    pub confidence: Confidence,
}

/// Estimate season production costs from the benchmark table. Totals are
/// rounded to the nearest 10 pesos; category lines split the midpoint.
pub fn build(summary: &LoanSummaryData) -> CostBreakdownData {
    let benchmark = summary.crop.as_deref().and_then(benchmarks::find);
    let hectares = summary.hectares.filter(|hectares| *hectares > Decimal::ZERO);

    let ten = Decimal::from(10);
    let benchmark_per_ha =
        benchmark.map(|benchmark| CostRange { min: benchmark.low(), max: benchmark.high() });

    let total = match (benchmark, hectares) {
        (Some(benchmark), Some(hectares)) => Some(CostRange {
            min: round_to_increment(benchmark.low() * hectares, ten),
            max: round_to_increment(benchmark.high() * hectares, ten),
        }),
        _ => None,
    };

    let lines = total
        .map(|total| {
            let midpoint = total.midpoint();
            CATEGORY_WEIGHTS
                .iter()
                .map(|(category, share_pct)| CostLine {
                    category: (*category).to_owned(),
                    amount: midpoint * Decimal::from(*share_pct) / Decimal::from(100),
                    share_pct: *share_pct,
                })
                .collect()
        })
        .unwrap_or_default();

    let confidence = if total.is_some() { Confidence::High } else { Confidence::Low };

    CostBreakdownData {
        crop: summary.crop.clone(),
        hectares: summary.hectares,
        benchmark_per_ha,
        total,
        lines,
        confidence,
    }
}
