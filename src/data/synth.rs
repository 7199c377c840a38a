use std::ops::RangeInclusive;

use rand::Rng;

use super::model::{
    round1, round2, EnrollmentRecord, Level, LiteracyRecord, SchoolPerformanceRecord, Tables,
};

const REGIONS: [&str; 7] = [
    "Punjab",
    "Sindh",
    "Khyber Pakhtunkhwa",
    "Balochistan",
    "Gilgit-Baltistan",
    "AJK",
    "Islamabad",
];

const PERFORMANCE_REGIONS: [&str; 4] = ["Punjab", "Sindh", "Khyber Pakhtunkhwa", "Balochistan"];

// Literacy curve: rates climb by `LITERACY_DECAY` points per year towards
// `LITERACY_BASELINE` in the last year of the range.
const LITERACY_BASELINE: f64 = 70.0;
const LITERACY_DECAY: f64 = 0.2;
const LITERACY_NOISE: f64 = 3.0;
const LITERACY_SPREAD: f64 = 5.0;

const SCORE_MEAN: f64 = 60.0;
const SCORE_TREND: f64 = 1.5;
const SCORE_SPREAD: f64 = 12.0;

/// Shape of the synthesized tables.
#[derive(Debug, Clone)]
pub struct SynthParams {
    pub literacy_years: RangeInclusive<i32>,
    pub enrollment_years: RangeInclusive<i32>,
    pub performance_years: Vec<i32>,
    pub regions: Vec<String>,
    /// Region whose enrollment base is drawn from the higher range.
    pub large_region: String,
    pub performance_regions: Vec<String>,
    pub district_count: usize,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            literacy_years: 2008..=2024,
            enrollment_years: 2015..=2024,
            performance_years: (2019..=2023).collect(),
            regions: REGIONS.iter().map(|r| r.to_string()).collect(),
            large_region: "Punjab".to_string(),
            performance_regions: PERFORMANCE_REGIONS.iter().map(|r| r.to_string()).collect(),
            district_count: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// SampleSynthesizer
// ---------------------------------------------------------------------------

/// Produces plausible sample tables from an injected random source.
///
/// Pass a seeded generator (`StdRng::seed_from_u64`) for reproducible output:
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use edu_dashboard::data::synth::SampleSynthesizer;
///
/// let mut synth = SampleSynthesizer::new(StdRng::seed_from_u64(7));
/// let literacy = synth.literacy();
/// assert_eq!(literacy.len(), 17 * 7);
/// ```
pub struct SampleSynthesizer<R> {
    rng: R,
    params: SynthParams,
}

impl<R: Rng> SampleSynthesizer<R> {
    pub fn new(rng: R) -> Self {
        Self::with_params(rng, SynthParams::default())
    }

    pub fn with_params(rng: R, params: SynthParams) -> Self {
        Self { rng, params }
    }

    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    /// All three tables, drawn in a fixed order from the same source.
    pub fn tables(&mut self) -> Tables {
        Tables {
            literacy: self.literacy(),
            enrollment: self.enrollment(),
            performance: self.school_performance(),
        }
    }

    /// One row per (year, region).  `female <= male` holds by construction.
    pub fn literacy(&mut self) -> Vec<LiteracyRecord> {
        let last_year = *self.params.literacy_years.end();
        let mut rows = Vec::with_capacity(
            self.params.literacy_years.clone().count() * self.params.regions.len(),
        );

        for year in self.params.literacy_years.clone() {
            for region in &self.params.regions {
                let centre = LITERACY_BASELINE - LITERACY_DECAY * (last_year - year) as f64
                    + self.rng.random_range(-LITERACY_NOISE..LITERACY_NOISE);
                let male = gauss(&mut self.rng, centre, LITERACY_SPREAD).clamp(40.0, 90.0);
                let female = (male - self.rng.random_range(2.0..12.0)).clamp(25.0, 85.0);

                let male = round1(male);
                let female = round1(female);
                rows.push(LiteracyRecord {
                    year,
                    province: region.clone(),
                    male_literacy: male,
                    female_literacy: female,
                    overall_literacy: round1((male + female) / 2.0),
                });
            }
        }
        rows
    }

    /// Four rows (one per level) per (year, region).  Higher levels shrink in
    /// expectation only: each level draws its own multiplier.
    pub fn enrollment(&mut self) -> Vec<EnrollmentRecord> {
        let mut rows = Vec::new();

        for year in self.params.enrollment_years.clone() {
            for region in &self.params.regions {
                let base: u64 = if *region == self.params.large_region {
                    self.rng.random_range(300_000..3_000_000)
                } else {
                    self.rng.random_range(50_000..800_000)
                };
                for level in Level::ALL {
                    let factor = self.rng.random_range(0.6..1.4)
                        * (1.0 - level.index() as f64 * 0.15);
                    rows.push(EnrollmentRecord {
                        year,
                        province: region.clone(),
                        level,
                        enrollment: (base as f64 * factor).floor() as u64,
                    });
                }
            }
        }
        rows
    }

    /// One row per (year, district).  Each district's province is redrawn
    /// every year.
    pub fn school_performance(&mut self) -> Vec<SchoolPerformanceRecord> {
        let mut rows = Vec::new();
        let regions = &self.params.performance_regions;

        for (year_idx, &year) in self.params.performance_years.iter().enumerate() {
            let mean = SCORE_MEAN + (year_idx as f64 - 2.0) * SCORE_TREND;
            for district_no in 1..=self.params.district_count {
                let province = if regions.is_empty() {
                    String::new()
                } else {
                    regions[self.rng.random_range(0..regions.len())].clone()
                };
                let avg = gauss(&mut self.rng, mean, SCORE_SPREAD).clamp(25.0, 95.0);
                let pass_rate = gauss(&mut self.rng, 0.7 + (avg - SCORE_MEAN) / 200.0, 0.12)
                    .clamp(0.2, 0.99);
                let num_students: u32 = self.rng.random_range(500..20_000);

                rows.push(SchoolPerformanceRecord {
                    year,
                    district: format!("District {district_no}"),
                    province,
                    avg_score: round1(avg),
                    pass_rate: round2(pass_rate),
                    num_students,
                });
            }
        }
        rows
    }
}

/// Box-Muller transform for normal distribution
fn gauss<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let u1 = rng.random::<f64>().max(1e-15);
    let u2 = rng.random::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * z
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn synth(seed: u64) -> SampleSynthesizer<StdRng> {
        SampleSynthesizer::new(StdRng::seed_from_u64(seed))
    }

    #[test]
    fn literacy_rows_respect_bounds() {
        let rows = synth(1).literacy();
        assert_eq!(rows.len(), 17 * 7);
        for r in &rows {
            assert!(25.0 <= r.female_literacy, "{r:?}");
            assert!(r.female_literacy <= r.male_literacy, "{r:?}");
            assert!(r.male_literacy <= 90.0, "{r:?}");
            assert!(r.male_literacy >= 40.0, "{r:?}");
            assert_eq!(r.overall_literacy, round1((r.male_literacy + r.female_literacy) / 2.0));
        }
    }

    #[test]
    fn literacy_covers_every_year_and_region() {
        let rows = synth(2).literacy();
        let keys: BTreeSet<(i32, &str)> =
            rows.iter().map(|r| (r.year, r.province.as_str())).collect();
        assert_eq!(keys.len(), rows.len());
        assert_eq!(rows.first().map(|r| r.year), Some(2008));
        assert_eq!(rows.last().map(|r| r.year), Some(2024));
    }

    #[test]
    fn enrollment_has_four_levels_per_region_year() {
        let rows = synth(3).enrollment();
        assert_eq!(rows.len(), 10 * 7 * 4);
        for chunk in rows.chunks(4) {
            let levels: Vec<Level> = chunk.iter().map(|r| r.level).collect();
            assert_eq!(levels, Level::ALL.to_vec());
            assert!(chunk.iter().all(|r| r.province == chunk[0].province));
        }
        // Upper bound of the large region's draw: 3M * 1.4.
        assert!(rows.iter().all(|r| r.enrollment < 4_200_000));
    }

    #[test]
    fn large_region_dominates_enrollment() {
        let rows = synth(4).enrollment();
        let total = |p: &str| -> u64 {
            rows.iter()
                .filter(|r| r.province == p)
                .map(|r| r.enrollment)
                .sum()
        };
        assert!(total("Punjab") > total("Islamabad"));
    }

    #[test]
    fn performance_rows_respect_bounds() {
        let rows = synth(5).school_performance();
        assert_eq!(rows.len(), 5 * 64);
        for r in &rows {
            assert!((25.0..=95.0).contains(&r.avg_score), "{r:?}");
            assert!((0.2..=0.99).contains(&r.pass_rate), "{r:?}");
            assert!((500..=20_000).contains(&r.num_students), "{r:?}");
            assert!(PERFORMANCE_REGIONS.contains(&r.province.as_str()));
        }
        let districts: BTreeSet<&str> = rows.iter().map(|r| r.district.as_str()).collect();
        assert_eq!(districts.len(), 64);
        assert!(districts.contains("District 64"));
    }

    #[test]
    fn seeded_sources_are_reproducible() {
        assert_eq!(synth(42).tables(), synth(42).tables());
        assert_ne!(synth(42).literacy(), synth(43).literacy());
    }

    #[test]
    fn custom_params_change_shape() {
        let params = SynthParams {
            literacy_years: 2020..=2021,
            regions: vec!["North".into(), "South".into()],
            ..SynthParams::default()
        };
        let mut s = SampleSynthesizer::with_params(StdRng::seed_from_u64(9), params);
        assert_eq!(s.literacy().len(), 4);
        assert_eq!(s.params().regions.len(), 2);
    }
}
