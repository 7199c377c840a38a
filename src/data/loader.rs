use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, AsArray};
use arrow::datatypes::{
    DataType, Float32Type, Float64Type, Int32Type, Int64Type, UInt32Type, UInt64Type,
};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::DataError;
use super::model::{
    CellValue, EnrollmentRecord, Level, LiteracyRecord, RawTable, SchoolPerformanceRecord,
};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a raw table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one record per line (the native format)
/// * `.json`    – `[{ "year": 2020, "province": "Sindh", ... }, ...]`
/// * `.parquet` – flat columns of strings, integers, floats or booleans
///
/// Column names are normalized (trimmed, lower-cased) whatever the source.
pub fn load_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let mut table = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    table.normalize_columns();
    Ok(table)
}

pub fn load_literacy(path: &Path) -> Result<Vec<LiteracyRecord>> {
    let raw = load_table(path)?;
    literacy_from_raw(&raw).with_context(|| format!("reading literacy table {}", path.display()))
}

pub fn load_enrollment(path: &Path) -> Result<Vec<EnrollmentRecord>> {
    let raw = load_table(path)?;
    enrollment_from_raw(&raw)
        .with_context(|| format!("reading enrollment table {}", path.display()))
}

pub fn load_performance(path: &Path) -> Result<Vec<SchoolPerformanceRecord>> {
    let raw = load_table(path)?;
    performance_from_raw(&raw)
        .with_context(|| format!("reading school performance table {}", path.display()))
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let columns: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(csv_cell).collect());
    }

    Ok(RawTable { columns, rows })
}

/// CSV carries no types: cells stay text and are parsed per column when the
/// typed records are built.
fn csv_cell(s: &str) -> CellValue {
    if s.trim().is_empty() {
        CellValue::Null
    } else {
        CellValue::String(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (`df.to_json(orient='records')`).  Columns are the
/// union of keys in first-seen order; missing keys read as null.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .filter_map(|rec| rec.as_object())
        .map(|obj| {
            columns
                .iter()
                .map(|col| obj.get(col).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect()
        })
        .collect();

    Ok(RawTable { columns, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let cells = (0..batch.num_columns())
                .map(|col_idx| extract_cell(batch.column(col_idx), row))
                .collect();
            rows.push(cells);
        }
    }

    Ok(RawTable { columns, rows })
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => CellValue::String(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => CellValue::Integer(col.as_primitive::<Int32Type>().value(row) as i64),
        DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
        DataType::UInt32 => CellValue::Integer(col.as_primitive::<UInt32Type>().value(row) as i64),
        DataType::UInt64 => CellValue::Integer(col.as_primitive::<UInt64Type>().value(row) as i64),
        DataType::Float32 => {
            CellValue::Float(col.as_primitive::<Float32Type>().value(row) as f64)
        }
        DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
        DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
        other => CellValue::String(format!("{other:?}")),
    }
}

// ---------------------------------------------------------------------------
// Raw table → typed records
// ---------------------------------------------------------------------------

fn int_cell(table: &RawTable, row: usize, col: usize) -> Result<i64, DataError> {
    let cell = table.cell(row, col);
    cell.as_i64().ok_or_else(|| {
        DataError::invalid(row, &table.columns[col], format!("expected integer, got {cell}"))
    })
}

fn float_cell(table: &RawTable, row: usize, col: usize) -> Result<f64, DataError> {
    let cell = table.cell(row, col);
    cell.as_f64().ok_or_else(|| {
        DataError::invalid(row, &table.columns[col], format!("expected number, got {cell}"))
    })
}

fn text_cell(table: &RawTable, row: usize, col: usize) -> Result<String, DataError> {
    table
        .cell(row, col)
        .as_text()
        .ok_or_else(|| DataError::invalid(row, &table.columns[col], "empty value"))
}

fn year_cell(table: &RawTable, row: usize, col: usize) -> Result<i32, DataError> {
    let v = int_cell(table, row, col)?;
    i32::try_from(v).map_err(|_| {
        DataError::invalid(row, &table.columns[col], format!("year {v} out of range"))
    })
}

/// Build literacy records.  When `overall_literacy` is absent (or a cell is
/// empty) it is derived as the mean of the male and female rates.
pub fn literacy_from_raw(table: &RawTable) -> Result<Vec<LiteracyRecord>, DataError> {
    let year = table.require_column("year")?;
    let province = table.require_column("province")?;
    let male = table.require_column("male_literacy")?;
    let female = table.require_column("female_literacy")?;
    let overall = table.column_index("overall_literacy");

    (0..table.len())
        .map(|row| {
            let male_literacy = float_cell(table, row, male)?;
            let female_literacy = float_cell(table, row, female)?;
            let overall_literacy = match overall {
                Some(col) if *table.cell(row, col) != CellValue::Null => {
                    float_cell(table, row, col)?
                }
                _ => (male_literacy + female_literacy) / 2.0,
            };
            Ok(LiteracyRecord {
                year: year_cell(table, row, year)?,
                province: text_cell(table, row, province)?,
                male_literacy,
                female_literacy,
                overall_literacy,
            })
        })
        .collect()
}

pub fn enrollment_from_raw(table: &RawTable) -> Result<Vec<EnrollmentRecord>, DataError> {
    let year = table.require_column("year")?;
    let province = table.require_column("province")?;
    let level = table.require_column("level")?;
    let enrollment = table.require_column("enrollment")?;

    (0..table.len())
        .map(|row| {
            let level_text = text_cell(table, row, level)?;
            let parsed_level: Level = level_text
                .parse()
                .map_err(|e: String| DataError::invalid(row, "level", e))?;
            let count = int_cell(table, row, enrollment)?;
            let count = u64::try_from(count).map_err(|_| {
                DataError::invalid(row, "enrollment", format!("negative count {count}"))
            })?;
            Ok(EnrollmentRecord {
                year: year_cell(table, row, year)?,
                province: text_cell(table, row, province)?,
                level: parsed_level,
                enrollment: count,
            })
        })
        .collect()
}

pub fn performance_from_raw(table: &RawTable) -> Result<Vec<SchoolPerformanceRecord>, DataError> {
    let year = table.require_column("year")?;
    let district = table.require_column("district")?;
    let province = table.require_column("province")?;
    let avg_score = table.require_column("avg_score")?;
    let pass_rate = table.require_column("pass_rate")?;
    let num_students = table.require_column("num_students")?;

    (0..table.len())
        .map(|row| {
            let students = int_cell(table, row, num_students)?;
            let students = u32::try_from(students).map_err(|_| {
                DataError::invalid(row, "num_students", format!("{students} is not a valid count"))
            })?;
            Ok(SchoolPerformanceRecord {
                year: year_cell(table, row, year)?,
                district: text_cell(table, row, district)?,
                province: text_cell(table, row, province)?,
                avg_score: float_cell(table, row, avg_score)?,
                pass_rate: float_cell(table, row, pass_rate)?,
                num_students: students,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn csv_headers_are_normalized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("literacy.csv");
        fs::write(
            &path,
            " Year ,PROVINCE,Male_Literacy,Female_Literacy,Overall_Literacy\n\
             2020,Punjab,80,70,75\n",
        )
        .unwrap();

        let raw = load_table(&path).unwrap();
        assert_eq!(
            raw.columns,
            vec!["year", "province", "male_literacy", "female_literacy", "overall_literacy"]
        );
        let records = literacy_from_raw(&raw).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].province, "Punjab");
        assert_eq!(records[0].overall_literacy, 75.0);
    }

    #[test]
    fn missing_overall_column_is_derived() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("literacy.csv");
        fs::write(
            &path,
            "year,province,male_literacy,female_literacy\n2020,Sindh,60.0,50.0\n",
        )
        .unwrap();

        let records = load_literacy(&path).unwrap();
        assert_eq!(records[0].overall_literacy, 55.0);

        // A present but empty overall cell is derived the same way.
        fs::write(
            &path,
            "year,province,male_literacy,female_literacy,overall_literacy\n\
             2020,Sindh,60,50,\n\
             2021,Sindh,62,52,57.5\n",
        )
        .unwrap();
        let records = load_literacy(&path).unwrap();
        assert_eq!(records[0].overall_literacy, 55.0);
        assert_eq!(records[1].overall_literacy, 57.5);
    }

    #[test]
    fn csv_text_columns_are_kept_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("school_performance.csv");
        fs::write(
            &path,
            "year,district,province,avg_score,pass_rate,num_students\n\
             2023,007,1e3,60.0,0.7,1000\n",
        )
        .unwrap();

        let records = load_performance(&path).unwrap();
        assert_eq!(records[0].district, "007");
        assert_eq!(records[0].province, "1e3");
        assert_eq!(records[0].avg_score, 60.0);
        assert_eq!(records[0].num_students, 1000);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enrollment.csv");
        fs::write(&path, "year,province,level,enrollment\n2020,Sindh,primary,-4\n").unwrap();
        assert!(load_enrollment(&path).is_err());

        fs::write(&path, "year,province,level,enrollment\n2020,Sindh,college,4\n").unwrap();
        let err = load_enrollment(&path).unwrap_err();
        assert!(format!("{err:#}").contains("unknown education level"));
    }

    #[test]
    fn missing_required_column_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("school_performance.csv");
        fs::write(&path, "year,district,province\n2020,District 1,Sindh\n").unwrap();
        let err = load_performance(&path).unwrap_err();
        assert!(format!("{err:#}").contains("missing column 'avg_score'"));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        assert!(load_table(Path::new("data/literacy.xlsx")).is_err());
    }

    #[test]
    fn json_records_are_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("enrollment.json");
        fs::write(
            &path,
            r#"[{"Year": 2020, "province": "Sindh", "level": "middle", "enrollment": 1200},
                {"Year": 2021, "province": "Sindh", "level": "Higher", "enrollment": 300}]"#,
        )
        .unwrap();

        let records = load_enrollment(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, Level::Middle);
        assert_eq!(records[0].enrollment, 1200);
        assert_eq!(records[1].year, 2021);
        assert_eq!(records[1].level, Level::Higher);
    }

    #[test]
    fn parquet_tables_are_loaded() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("school_performance.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("year", DataType::Int64, false),
            Field::new("district", DataType::Utf8, false),
            Field::new("province", DataType::Utf8, false),
            Field::new("avg_score", DataType::Float64, false),
            Field::new("pass_rate", DataType::Float64, false),
            Field::new("num_students", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![2022, 2023])),
                Arc::new(StringArray::from(vec!["District 1", "District 2"])),
                Arc::new(StringArray::from(vec!["Punjab", "Sindh"])),
                Arc::new(Float64Array::from(vec![61.5, 48.0])),
                Arc::new(Float64Array::from(vec![0.72, 0.55])),
                Arc::new(Int64Array::from(vec![1500, 9000])),
            ],
        )
        .unwrap();
        let file = fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let records = load_performance(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].district, "District 2");
        assert_eq!(records[1].num_students, 9000);
        assert_eq!(records[0].avg_score, 61.5);
    }
}
