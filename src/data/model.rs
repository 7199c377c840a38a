use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DataError;

// ---------------------------------------------------------------------------
// CellValue – a single cell in a raw table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell as read from a persisted table, before it is
/// converted into one of the typed records below.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Interpret the value as an `f64`.  Integers widen; text (as read from
    /// CSV) is parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Interpret the value as an integer. Floats with no fractional part are
    /// accepted since some writers emit `2020.0` for integer columns.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) => integral(*v),
            CellValue::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
            _ => None,
        }
    }

    /// Text rendering for label columns; `None` for nulls.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

fn integral(v: f64) -> Option<i64> {
    (v.fract() == 0.0 && v.is_finite()).then_some(v as i64)
}

// ---------------------------------------------------------------------------
// RawTable – header + rows, as parsed from disk
// ---------------------------------------------------------------------------

/// A parsed table whose column types have not been checked yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl RawTable {
    /// Trim and lower-case every column name.
    pub fn normalize_columns(&mut self) {
        for col in &mut self.columns {
            *col = col.trim().to_lowercase();
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize, DataError> {
        self.column_index(name)
            .ok_or_else(|| DataError::MissingColumn(name.to_string()))
    }

    /// Cell at (`row`, `col`); short rows read as null.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&CellValue::Null)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Typed records
// ---------------------------------------------------------------------------

/// Literacy rates for one province in one year, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiteracyRecord {
    pub year: i32,
    pub province: String,
    pub male_literacy: f64,
    pub female_literacy: f64,
    pub overall_literacy: f64,
}

/// Education level, ordered from first to last stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Primary,
    Middle,
    Secondary,
    Higher,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Primary, Level::Middle, Level::Secondary, Level::Higher];

    /// Position in [`Level::ALL`].
    pub fn index(self) -> usize {
        match self {
            Level::Primary => 0,
            Level::Middle => 1,
            Level::Secondary => 2,
            Level::Higher => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Primary => "primary",
            Level::Middle => "middle",
            Level::Secondary => "secondary",
            Level::Higher => "higher",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Level::Primary),
            "middle" => Ok(Level::Middle),
            "secondary" => Ok(Level::Secondary),
            "higher" => Ok(Level::Higher),
            other => Err(format!("unknown education level '{other}'")),
        }
    }
}

/// Headcount for one (year, province, level).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentRecord {
    pub year: i32,
    pub province: String,
    pub level: Level,
    pub enrollment: u64,
}

/// Exam results for one district in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolPerformanceRecord {
    pub year: i32,
    pub district: String,
    pub province: String,
    pub avg_score: f64,
    pub pass_rate: f64,
    pub num_students: u32,
}

// ---------------------------------------------------------------------------
// Tables – the three snapshots held for the session
// ---------------------------------------------------------------------------

/// The complete set of source tables. Never mutated once built; views are
/// derived through [`crate::data::filter`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    pub literacy: Vec<LiteracyRecord>,
    pub enrollment: Vec<EnrollmentRecord>,
    pub performance: Vec<SchoolPerformanceRecord>,
}

/// Round to one decimal place.
pub fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Round to two decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_columns_trims_and_lowercases() {
        let mut t = RawTable {
            columns: vec![" Year".into(), "PROVINCE ".into(), "Male_Literacy".into()],
            rows: vec![],
        };
        t.normalize_columns();
        assert_eq!(t.columns, vec!["year", "province", "male_literacy"]);
        assert_eq!(t.column_index("province"), Some(1));
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let t = RawTable::default();
        let err = t.require_column("year").unwrap_err();
        assert_eq!(err.to_string(), "missing column 'year'");
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("Secondary".parse::<Level>().unwrap(), Level::Secondary);
        assert!("tertiary".parse::<Level>().is_err());
        assert!(Level::Primary < Level::Higher);
    }

    #[test]
    fn integral_floats_read_as_integers() {
        assert_eq!(CellValue::Float(2020.0).as_i64(), Some(2020));
        assert_eq!(CellValue::Float(2020.5).as_i64(), None);
        assert_eq!(CellValue::Integer(7).as_text().as_deref(), Some("7"));
        assert_eq!(CellValue::Null.as_text(), None);
    }

    #[test]
    fn text_cells_parse_on_demand_and_keep_their_text() {
        let code = CellValue::String("007".into());
        assert_eq!(code.as_text().as_deref(), Some("007"));
        assert_eq!(code.as_i64(), Some(7));

        assert_eq!(CellValue::String(" 2020.0 ".into()).as_i64(), Some(2020));
        assert_eq!(CellValue::String("61.5".into()).as_f64(), Some(61.5));
        assert_eq!(CellValue::String("61.5".into()).as_i64(), None);
        assert_eq!(CellValue::String("Sindh".into()).as_f64(), None);
    }
}
