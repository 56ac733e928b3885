//! Per-crop production cost benchmarks, PHP per hectare per cropping season.
//!
//! Low/high bounds bracket typical regional spreads; the average feeds the
//! loan-suggestion base amount when no full cost breakdown is available.

use rust_decimal::Decimal;

#[derive(Clone, Copy, Debug)]
pub struct CropBenchmark {
    pub crop: &'static str,
    pub aliases: &'static [&'static str],
    pub low_per_ha: i64,
    pub high_per_ha: i64,
}

impl CropBenchmark {
    pub fn low(&self) -> Decimal {
        Decimal::from(self.low_per_ha)
    }

    pub fn high(&self) -> Decimal {
        Decimal::from(self.high_per_ha)
    }

    pub fn avg(&self) -> Decimal {
        (self.low() + self.high()) / Decimal::from(2)
    }
}

pub const CROP_BENCHMARKS: &[CropBenchmark] = &[
    CropBenchmark { crop: "rice", aliases: &["palay", "bigas"], low_per_ha: 40_000, high_per_ha: 50_000 },
    CropBenchmark { crop: "corn", aliases: &["mais", "maize"], low_per_ha: 32_000, high_per_ha: 42_000 },
    CropBenchmark { crop: "sugarcane", aliases: &["tubo"], low_per_ha: 55_000, high_per_ha: 70_000 },
    CropBenchmark { crop: "coconut", aliases: &["niyog", "copra"], low_per_ha: 20_000, high_per_ha: 30_000 },
    CropBenchmark { crop: "banana", aliases: &["saging"], low_per_ha: 45_000, high_per_ha: 60_000 },
    CropBenchmark { crop: "vegetables", aliases: &["gulay", "vegetable"], low_per_ha: 60_000, high_per_ha: 80_000 },
    CropBenchmark { crop: "cassava", aliases: &["kamoteng kahoy", "balinghoy"], low_per_ha: 25_000, high_per_ha: 35_000 },
    CropBenchmark { crop: "onion", aliases: &["sibuyas"], low_per_ha: 100_000, high_per_ha: 140_000 },
];

/// Look up a benchmark for a stated crop value. The stated value may be an
/// alias ("palay") or carry qualifiers ("hybrid palay"), so matching is
/// bidirectional containment over the normalized text.
pub fn find(crop_text: &str) -> Option<&'static CropBenchmark> {
    let normalized = crop_text.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return None;
    }

    CROP_BENCHMARKS.iter().find(|benchmark| {
        let names = std::iter::once(benchmark.crop).chain(benchmark.aliases.iter().copied());
        names.into_iter().any(|name| normalized.contains(name) || name.contains(normalized.as_str()))
    })
}

/// Scan free text for the first crop mention, in table declaration order.
pub fn match_in_text(text: &str) -> Option<&'static CropBenchmark> {
    let normalized = text.to_ascii_lowercase();
    CROP_BENCHMARKS.iter().find(|benchmark| {
        std::iter::once(benchmark.crop)
            .chain(benchmark.aliases.iter().copied())
            .any(|name| normalized.contains(name))
    })
}
