use std::collections::BTreeSet;

use super::model::{EnrollmentRecord, Level, SchoolPerformanceRecord, Tables};

/// Headline numbers under the enrollment chart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrollmentSummary {
    pub total: u64,
    /// Share of `total` enrolled at primary level, in percent.
    pub primary_pct: f64,
    pub provinces: usize,
    pub avg_per_province: f64,
}

impl EnrollmentSummary {
    pub fn from_rows(rows: &[EnrollmentRecord]) -> Self {
        let total: u64 = rows.iter().map(|r| r.enrollment).sum();
        let primary: u64 = rows
            .iter()
            .filter(|r| r.level == Level::Primary)
            .map(|r| r.enrollment)
            .sum();
        let provinces = rows
            .iter()
            .map(|r| r.province.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            total,
            primary_pct: if total > 0 {
                primary as f64 * 100.0 / total as f64
            } else {
                0.0
            },
            provinces,
            avg_per_province: if provinces > 0 {
                total as f64 / provinces as f64
            } else {
                0.0
            },
        }
    }
}

/// Headline numbers for the district rankings.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSummary {
    pub avg_score: f64,
    /// Mean pass rate, in percent.
    pub avg_pass_pct: f64,
    pub total_students: u64,
    pub districts: usize,
}

impl PerformanceSummary {
    /// `None` when there are no records to summarize.
    pub fn from_records(records: &[SchoolPerformanceRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }
        let n = records.len() as f64;
        Some(Self {
            avg_score: records.iter().map(|r| r.avg_score).sum::<f64>() / n,
            avg_pass_pct: records.iter().map(|r| r.pass_rate).sum::<f64>() * 100.0 / n,
            total_students: records.iter().map(|r| r.num_students as u64).sum(),
            districts: records
                .iter()
                .map(|r| r.district.as_str())
                .collect::<BTreeSet<_>>()
                .len(),
        })
    }
}

/// Size of the loaded dataset, shown above the export buttons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetOverview {
    pub literacy_years: Option<(i32, i32)>,
    pub enrollment_records: usize,
    pub district_records: usize,
}

impl DatasetOverview {
    pub fn from_tables(tables: &Tables) -> Self {
        let years = tables.literacy.iter().map(|r| r.year);
        let literacy_years = years.clone().min().zip(years.max());
        Self {
            literacy_years,
            enrollment_records: tables.enrollment.len(),
            district_records: tables.performance.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::LiteracyRecord;

    fn enr(province: &str, level: Level, enrollment: u64) -> EnrollmentRecord {
        EnrollmentRecord {
            year: 2020,
            province: province.to_string(),
            level,
            enrollment,
        }
    }

    #[test]
    fn enrollment_summary_shares() {
        let rows = vec![
            enr("Punjab", Level::Primary, 600),
            enr("Punjab", Level::Higher, 200),
            enr("Sindh", Level::Primary, 200),
        ];
        let s = EnrollmentSummary::from_rows(&rows);
        assert_eq!(s.total, 1000);
        assert_eq!(s.primary_pct, 80.0);
        assert_eq!(s.provinces, 2);
        assert_eq!(s.avg_per_province, 500.0);
    }

    #[test]
    fn empty_enrollment_summary_is_zero() {
        assert_eq!(EnrollmentSummary::from_rows(&[]), EnrollmentSummary::default());
    }

    #[test]
    fn performance_summary() {
        let rec = |district: &str, score: f64, pass: f64, n: u32| SchoolPerformanceRecord {
            year: 2023,
            district: district.to_string(),
            province: "Sindh".to_string(),
            avg_score: score,
            pass_rate: pass,
            num_students: n,
        };
        assert_eq!(PerformanceSummary::from_records(&[]), None);

        let records = [rec("A", 50.0, 0.5, 1000), rec("B", 70.0, 0.75, 3000)];
        let s = PerformanceSummary::from_records(&records).unwrap();
        assert_eq!(s.avg_score, 60.0);
        assert_eq!(s.avg_pass_pct, 62.5);
        assert_eq!(s.total_students, 4000);
        assert_eq!(s.districts, 2);
    }

    #[test]
    fn overview_reports_year_range() {
        let lit = |year| LiteracyRecord {
            year,
            province: "Sindh".into(),
            male_literacy: 60.0,
            female_literacy: 50.0,
            overall_literacy: 55.0,
        };
        let tables = Tables {
            literacy: vec![lit(2012), lit(2008), lit(2024)],
            ..Tables::default()
        };
        let o = DatasetOverview::from_tables(&tables);
        assert_eq!(o.literacy_years, Some((2008, 2024)));
        assert_eq!(o.enrollment_records, 0);
        assert_eq!(DatasetOverview::from_tables(&Tables::default()).literacy_years, None);
    }
}
