use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use super::filter::{
    filter_enrollment_by_regions, filter_literacy_by_regions, performance_snapshot, FilterState,
};
use super::model::{EnrollmentRecord, LiteracyRecord, SchoolPerformanceRecord, Tables};

/// A record type that can be written as a CSV row under a fixed header.
pub trait TableRow: Serialize {
    const COLUMNS: &'static [&'static str];
}

impl TableRow for LiteracyRecord {
    const COLUMNS: &'static [&'static str] = &[
        "year",
        "province",
        "male_literacy",
        "female_literacy",
        "overall_literacy",
    ];
}

impl TableRow for EnrollmentRecord {
    const COLUMNS: &'static [&'static str] = &["year", "province", "level", "enrollment"];
}

impl TableRow for SchoolPerformanceRecord {
    const COLUMNS: &'static [&'static str] = &[
        "year",
        "district",
        "province",
        "avg_score",
        "pass_rate",
        "num_students",
    ];
}

/// Write `records` as CSV.  The header row is always written, even for an
/// empty slice.
pub fn write_csv<T: TableRow, W: Write>(records: &[T], writer: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(T::COLUMNS).context("writing CSV header")?;
    for (i, rec) in records.iter().enumerate() {
        wtr.serialize(rec).with_context(|| format!("writing CSV row {i}"))?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

pub fn write_csv_file<T: TableRow>(records: &[T], path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    write_csv(records, file).with_context(|| format!("writing {}", path.display()))
}

pub fn to_csv_bytes<T: TableRow>(records: &[T]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(records, &mut buf)?;
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Filtered export bundle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Literacy,
    Enrollment,
    Districts,
}

/// `literacy_filtered_2024.csv` and friends.
pub fn export_file_name(kind: ExportKind, year: i32) -> String {
    let stem = match kind {
        ExportKind::Literacy => "literacy",
        ExportKind::Enrollment => "enrollment",
        ExportKind::Districts => "districts",
    };
    format!("{stem}_filtered_{year}.csv")
}

/// The three views offered for download.  Literacy and enrollment keep every
/// year and are restricted by province only; districts are the performance
/// snapshot currently on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportBundle {
    pub literacy: Vec<LiteracyRecord>,
    pub enrollment: Vec<EnrollmentRecord>,
    pub districts: Vec<SchoolPerformanceRecord>,
}

impl ExportBundle {
    pub fn build(tables: &Tables, filter: &FilterState) -> Self {
        Self {
            literacy: filter_literacy_by_regions(&tables.literacy, &filter.regions),
            enrollment: filter_enrollment_by_regions(&tables.enrollment, &filter.regions),
            districts: performance_snapshot(
                &tables.performance,
                filter.year,
                &filter.regions,
                filter.min_students,
            )
            .records,
        }
    }

    /// Write all three files into `dir`, returning their paths.
    pub fn write_to_dir(&self, dir: &Path, year: i32) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating export directory {}", dir.display()))?;

        let literacy = dir.join(export_file_name(ExportKind::Literacy, year));
        write_csv_file(&self.literacy, &literacy)?;
        let enrollment = dir.join(export_file_name(ExportKind::Enrollment, year));
        write_csv_file(&self.enrollment, &enrollment)?;
        let districts = dir.join(export_file_name(ExportKind::Districts, year));
        write_csv_file(&self.districts, &districts)?;

        log::info!("Exported filtered views for {year} to {}", dir.display());
        Ok(vec![literacy, enrollment, districts])
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    use super::*;
    use crate::data::filter::RegionSet;
    use crate::data::loader::{load_enrollment, load_literacy, load_performance};
    use crate::data::synth::SampleSynthesizer;

    fn sample_tables() -> Tables {
        SampleSynthesizer::new(StdRng::seed_from_u64(11)).tables()
    }

    #[test]
    fn file_names_embed_year() {
        assert_eq!(export_file_name(ExportKind::Literacy, 2024), "literacy_filtered_2024.csv");
        assert_eq!(export_file_name(ExportKind::Districts, 2019), "districts_filtered_2019.csv");
    }

    #[test]
    fn empty_export_still_has_header() {
        let bytes = to_csv_bytes::<EnrollmentRecord>(&[]).unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "year,province,level,enrollment\n");
    }

    #[test]
    fn rows_follow_header_order() {
        let rec = LiteracyRecord {
            year: 2020,
            province: "Sindh".into(),
            male_literacy: 60.5,
            female_literacy: 50.0,
            overall_literacy: 55.3,
        };
        let text = String::from_utf8(to_csv_bytes(&[rec]).unwrap()).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("year,province,male_literacy,female_literacy,overall_literacy")
        );
        assert_eq!(lines.next(), Some("2020,Sindh,60.5,50.0,55.3"));
    }

    #[test]
    fn exported_views_parse_back_unchanged() {
        let tables = sample_tables();
        let filter = FilterState {
            year: 2022,
            regions: ["Sindh", "Khyber Pakhtunkhwa"].iter().map(|s| s.to_string()).collect(),
            min_students: 2_000,
        };
        let bundle = ExportBundle::build(&tables, &filter);
        assert!(!bundle.literacy.is_empty());
        assert!(bundle.literacy.iter().all(|r| filter.regions.contains(&r.province)));
        assert!(bundle.districts.iter().all(|r| r.year == 2022 && r.num_students >= 2_000));

        let dir = TempDir::new().unwrap();
        let paths = bundle.write_to_dir(dir.path(), filter.year).unwrap();
        assert_eq!(paths.len(), 3);

        assert_eq!(load_literacy(&paths[0]).unwrap(), bundle.literacy);
        assert_eq!(load_enrollment(&paths[1]).unwrap(), bundle.enrollment);
        assert_eq!(load_performance(&paths[2]).unwrap(), bundle.districts);
    }

    #[test]
    fn numeric_looking_labels_survive_export() {
        let districts = vec![SchoolPerformanceRecord {
            year: 2023,
            district: "007".into(),
            province: "1e3".into(),
            avg_score: 60.0,
            pass_rate: 0.7,
            num_students: 1000,
        }];
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(export_file_name(ExportKind::Districts, 2023));
        write_csv_file(&districts, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("2023,007,1e3,60.0,0.7,1000"), "{text}");
        assert_eq!(load_performance(&path).unwrap(), districts);
    }

    #[test]
    fn unrestricted_bundle_keeps_all_years() {
        let tables = sample_tables();
        let filter = FilterState {
            year: 2024,
            regions: RegionSet::new(),
            min_students: 0,
        };
        let bundle = ExportBundle::build(&tables, &filter);
        assert_eq!(bundle.literacy.len(), tables.literacy.len());
        assert_eq!(bundle.enrollment.len(), tables.enrollment.len());
        // 2024 is past the performance range, so the latest year is exported.
        assert!(bundle.districts.iter().all(|r| r.year == 2023));
        assert_eq!(bundle.districts.len(), 64);
    }
}
