use std::collections::{BTreeMap, BTreeSet};

use super::model::{EnrollmentRecord, Level, LiteracyRecord, SchoolPerformanceRecord};

// ---------------------------------------------------------------------------
// Filter state: the user's current selection
// ---------------------------------------------------------------------------

/// Selected provinces.  An empty set means "no filter" (show all).
pub type RegionSet = BTreeSet<String>;

/// Year, region subset and minimum district size chosen in the side panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub year: i32,
    pub regions: RegionSet,
    pub min_students: u32,
}

fn region_matches(regions: &RegionSet, province: &str) -> bool {
    regions.is_empty() || regions.contains(province)
}

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct TrendPoint {
    pub year: i32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceLiteracy {
    pub province: String,
    pub overall_literacy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenderPoint {
    pub year: i32,
    pub male: f64,
    pub female: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrollmentTotal {
    pub province: String,
    pub level: Level,
    pub total: u64,
}

/// The performance table had no row for the requested year, so the latest
/// year present was shown instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearSubstitution {
    pub requested: i32,
    pub used: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceSnapshot {
    /// Year the records belong to; `None` for an empty table.
    pub year: Option<i32>,
    pub substitution: Option<YearSubstitution>,
    pub records: Vec<SchoolPerformanceRecord>,
}

// ---------------------------------------------------------------------------
// Literacy
// ---------------------------------------------------------------------------

/// Mean overall literacy per year, ascending by year.
pub fn national_literacy_trend(table: &[LiteracyRecord]) -> Vec<TrendPoint> {
    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for r in table {
        let acc = by_year.entry(r.year).or_default();
        acc.0 += r.overall_literacy;
        acc.1 += 1;
    }
    by_year
        .into_iter()
        .map(|(year, (sum, n))| TrendPoint {
            year,
            value: sum / n as f64,
        })
        .collect()
}

/// Overall literacy of each selected province in `year`, lowest first.
pub fn province_snapshot(
    table: &[LiteracyRecord],
    year: i32,
    regions: &RegionSet,
) -> Vec<ProvinceLiteracy> {
    let mut rows: Vec<ProvinceLiteracy> = table
        .iter()
        .filter(|r| r.year == year && region_matches(regions, &r.province))
        .map(|r| ProvinceLiteracy {
            province: r.province.clone(),
            overall_literacy: r.overall_literacy,
        })
        .collect();
    rows.sort_by(|a, b| a.overall_literacy.total_cmp(&b.overall_literacy));
    rows
}

/// Mean male and female literacy per year, ascending by year.
pub fn gender_gap_trend(table: &[LiteracyRecord]) -> Vec<GenderPoint> {
    let mut by_year: BTreeMap<i32, (f64, f64, usize)> = BTreeMap::new();
    for r in table {
        let acc = by_year.entry(r.year).or_default();
        acc.0 += r.male_literacy;
        acc.1 += r.female_literacy;
        acc.2 += 1;
    }
    by_year
        .into_iter()
        .map(|(year, (male, female, n))| GenderPoint {
            year,
            male: male / n as f64,
            female: female / n as f64,
        })
        .collect()
}

/// Average of the per-row (male - female) gap over rows of `year`.
pub fn gender_gap_for_year(table: &[LiteracyRecord], year: i32) -> Option<f64> {
    let gaps: Vec<f64> = table
        .iter()
        .filter(|r| r.year == year)
        .map(|r| r.male_literacy - r.female_literacy)
        .collect();
    if gaps.is_empty() {
        return None;
    }
    Some(gaps.iter().sum::<f64>() / gaps.len() as f64)
}

pub fn filter_literacy_by_regions(
    table: &[LiteracyRecord],
    regions: &RegionSet,
) -> Vec<LiteracyRecord> {
    table
        .iter()
        .filter(|r| region_matches(regions, &r.province))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// Enrollment
// ---------------------------------------------------------------------------

/// Enrollment rows for `year` in the selected provinces.
pub fn enrollment_snapshot(
    table: &[EnrollmentRecord],
    year: i32,
    regions: &RegionSet,
) -> Vec<EnrollmentRecord> {
    table
        .iter()
        .filter(|r| r.year == year && region_matches(regions, &r.province))
        .cloned()
        .collect()
}

/// Total enrollment per (province, level) for `year`, ordered by province
/// then level.
pub fn enrollment_by_province_level(
    table: &[EnrollmentRecord],
    year: i32,
    regions: &RegionSet,
) -> Vec<EnrollmentTotal> {
    let mut totals: BTreeMap<(&str, Level), u64> = BTreeMap::new();
    for r in table
        .iter()
        .filter(|r| r.year == year && region_matches(regions, &r.province))
    {
        *totals.entry((r.province.as_str(), r.level)).or_default() += r.enrollment;
    }
    totals
        .into_iter()
        .map(|((province, level), total)| EnrollmentTotal {
            province: province.to_string(),
            level,
            total,
        })
        .collect()
}

pub fn filter_enrollment_by_regions(
    table: &[EnrollmentRecord],
    regions: &RegionSet,
) -> Vec<EnrollmentRecord> {
    table
        .iter()
        .filter(|r| region_matches(regions, &r.province))
        .cloned()
        .collect()
}

// ---------------------------------------------------------------------------
// School performance
// ---------------------------------------------------------------------------

/// District rows for `year` (or the latest year present when `year` is
/// missing) in the selected provinces with at least `min_students` students.
/// Source order is kept.
pub fn performance_snapshot(
    table: &[SchoolPerformanceRecord],
    year: i32,
    regions: &RegionSet,
    min_students: u32,
) -> PerformanceSnapshot {
    let (used, substitution) = if table.iter().any(|r| r.year == year) {
        (year, None)
    } else {
        match table.iter().map(|r| r.year).max() {
            Some(latest) => (
                latest,
                Some(YearSubstitution {
                    requested: year,
                    used: latest,
                }),
            ),
            None => return PerformanceSnapshot::default(),
        }
    };

    let records = table
        .iter()
        .filter(|r| {
            r.year == used
                && region_matches(regions, &r.province)
                && r.num_students >= min_students
        })
        .cloned()
        .collect();

    PerformanceSnapshot {
        year: Some(used),
        substitution,
        records,
    }
}

/// Best `n` districts (highest score first) and worst `n` (lowest first).
/// Ties keep source order.  With fewer than `2n` records the two lists share
/// entries.
pub fn top_and_bottom(
    records: &[SchoolPerformanceRecord],
    n: usize,
) -> (Vec<SchoolPerformanceRecord>, Vec<SchoolPerformanceRecord>) {
    let mut top = records.to_vec();
    top.sort_by(|a, b| b.avg_score.total_cmp(&a.avg_score));
    top.truncate(n);

    let mut bottom = records.to_vec();
    bottom.sort_by(|a, b| a.avg_score.total_cmp(&b.avg_score));
    bottom.truncate(n);

    (top, bottom)
}

// ---------------------------------------------------------------------------
// Control bounds
// ---------------------------------------------------------------------------

/// Distinct years, latest first (the year selector's order).
pub fn available_years(table: &[LiteracyRecord]) -> Vec<i32> {
    let years: BTreeSet<i32> = table.iter().map(|r| r.year).collect();
    years.into_iter().rev().collect()
}

/// Distinct provinces, sorted.
pub fn province_choices(table: &[LiteracyRecord]) -> Vec<String> {
    let provinces: BTreeSet<&str> = table.iter().map(|r| r.province.as_str()).collect();
    provinces.into_iter().map(str::to_string).collect()
}

/// Upper bound for the minimum-students control.
pub fn max_students(table: &[SchoolPerformanceRecord]) -> u32 {
    table.iter().map(|r| r.num_students).max().unwrap_or(0)
}
