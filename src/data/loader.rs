//! Surveillance Dataset Loader
//! Reads the weekly ILI CSV with Polars, drops rows without a metric value and
//! numbers each state's weeks in input order.

use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Name of the derived per-group sequence index column.
pub const WEEKS_COL: &str = "weeks";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Source unavailable: {path}: {source}")]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Required column '{column}' is missing from {path}")]
    SchemaError { path: PathBuf, column: String },
    #[error("Failed to parse CSV: {0}")]
    Parse(#[from] PolarsError),
}

/// Column names of the input file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSchema {
    pub group_col: String,
    pub time_col: String,
    pub value_col: String,
}

impl Default for TableSchema {
    fn default() -> Self {
        Self {
            group_col: "state".to_string(),
            time_col: "epiweek".to_string(),
            value_col: "ili".to_string(),
        }
    }
}

impl TableSchema {
    fn required_columns(&self) -> [&str; 3] {
        [&self.group_col, &self.time_col, &self.value_col]
    }
}

/// Loaded, filtered and indexed surveillance records.
///
/// The frame always carries four columns, in this order: group key (String),
/// time marker (String), metric value (Float64) and [`WEEKS_COL`] (UInt32).
/// Instances are shared behind an `Arc` and never mutated after loading.
#[derive(Debug, Clone)]
pub struct SurveillanceTable {
    df: DataFrame,
    schema: TableSchema,
    source_rows: usize,
}

impl SurveillanceTable {
    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Rows kept after dropping missing metric values.
    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// Rows present in the source before filtering.
    pub fn source_rows(&self) -> usize {
        self.source_rows
    }

    /// Rows discarded because their metric value was missing.
    pub fn dropped_rows(&self) -> usize {
        self.source_rows - self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }
}

/// Handles CSV loading with Polars.
pub struct DatasetLoader;

impl DatasetLoader {
    /// Load a surveillance CSV using the default `state`/`epiweek`/`ili` columns.
    pub fn load(path: impl AsRef<Path>) -> Result<SurveillanceTable, LoaderError> {
        Self::load_with_schema(path, &TableSchema::default())
    }

    /// Load a surveillance CSV with explicit column names.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn load_with_schema(
        path: impl AsRef<Path>,
        schema: &TableSchema,
    ) -> Result<SurveillanceTable, LoaderError> {
        let path = path.as_ref();
        Self::check_source(path)?;

        // Every column is read as text so key codes keep their spelling
        // ("06" stays "06") and the metric is parsed per cell in `prepare`.
        let header = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect_schema()?;

        let mut text_columns = Schema::with_capacity(3);
        for column in schema.required_columns() {
            if !header.contains(column) {
                return Err(LoaderError::SchemaError {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                });
            }
            text_columns.with_column(column.into(), DataType::String);
        }

        let raw = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(0))
            .with_dtype_overwrite(Some(Arc::new(text_columns)))
            .finish()?
            .collect()?;

        let df = Self::prepare(&raw, schema)?;
        let table = SurveillanceTable {
            df,
            schema: schema.clone(),
            source_rows: raw.height(),
        };

        info!(
            rows = table.height(),
            dropped = table.dropped_rows(),
            "loaded surveillance table"
        );
        Ok(table)
    }

    /// Polars reports a missing file or a directory as a generic compute
    /// error, so both are caught here with their io context.
    fn check_source(path: &Path) -> Result<(), LoaderError> {
        let unavailable = |source| LoaderError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        };

        if !fs::metadata(path).map_err(unavailable)?.is_file() {
            return Err(unavailable(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        File::open(path).map_err(unavailable)?;
        Ok(())
    }

    /// Drop missing metric rows and assign the per-group week counter.
    ///
    /// The counter follows the row order of the source, not the time marker.
    fn prepare(raw: &DataFrame, schema: &TableSchema) -> Result<DataFrame, LoaderError> {
        let group_str = raw.column(&schema.group_col)?.cast(&DataType::String)?;
        let time_str = raw.column(&schema.time_col)?.cast(&DataType::String)?;
        let value_str = raw.column(&schema.value_col)?.cast(&DataType::String)?;

        let group_ca = group_str.str()?;
        let time_ca = time_str.str()?;
        let value_ca = value_str.str()?;

        let mut groups: Vec<String> = Vec::with_capacity(raw.height());
        let mut times: Vec<String> = Vec::with_capacity(raw.height());
        let mut values: Vec<f64> = Vec::with_capacity(raw.height());
        let mut weeks: Vec<u32> = Vec::with_capacity(raw.height());
        let mut counters: HashMap<String, u32> = HashMap::new();

        for ((g, t), v) in group_ca
            .into_iter()
            .zip(time_ca.into_iter())
            .zip(value_ca.into_iter())
        {
            let Some(v) = v.and_then(parse_metric) else {
                continue;
            };

            let g = g.unwrap_or_default().to_string();
            let counter = counters.entry(g.clone()).or_insert(0);
            weeks.push(*counter);
            *counter += 1;

            groups.push(g);
            times.push(t.unwrap_or_default().to_string());
            values.push(v);
        }

        debug!(groups = counters.len(), "assigned week counters");

        let df = DataFrame::new(vec![
            Column::new(schema.group_col.as_str().into(), groups),
            Column::new(schema.time_col.as_str().into(), times),
            Column::new(schema.value_col.as_str().into(), values),
            Column::new(WEEKS_COL.into(), weeks),
        ])?;

        Ok(df)
    }
}

/// Blank, unparsable and NaN cells all count as missing.
fn parse_metric(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn weeks_for(table: &SurveillanceTable, group: &str) -> Vec<u32> {
        let df = table.dataframe();
        let groups = df.column("state").unwrap().str().unwrap();
        let weeks = df.column(WEEKS_COL).unwrap().u32().unwrap();
        groups
            .into_iter()
            .zip(weeks.into_iter())
            .filter(|(g, _)| *g == Some(group))
            .filter_map(|(_, w)| w)
            .collect()
    }

    #[test]
    fn drops_rows_with_missing_ili() {
        let file = write_csv(
            "epiweek,state,ili\n\
             201040,ca,1.5\n\
             201040,ny,\n\
             201041,ca,2.0\n\
             201041,ny,0.8\n",
        );

        let table = DatasetLoader::load(file.path()).unwrap();
        assert_eq!(table.source_rows(), 4);
        assert_eq!(table.height(), 3);
        assert_eq!(table.dropped_rows(), 1);
    }

    #[test]
    fn numbers_weeks_per_state_in_input_order() {
        let file = write_csv(
            "epiweek,state,ili\n\
             201040,ca,1.0\n\
             201040,ny,2.0\n\
             201041,ca,\n\
             201042,ca,3.0\n\
             201041,ny,4.0\n\
             201039,ca,5.0\n",
        );

        let table = DatasetLoader::load(file.path()).unwrap();
        assert_eq!(weeks_for(&table, "ca"), vec![0, 1, 2]);
        assert_eq!(weeks_for(&table, "ny"), vec![0, 1]);
    }

    #[test]
    fn output_has_four_typed_columns() {
        let file = write_csv("epiweek,state,ili\n201040,ca,1.0\n");
        let table = DatasetLoader::load(file.path()).unwrap();
        let df = table.dataframe();

        assert_eq!(df.width(), 4);
        assert_eq!(df.column("epiweek").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("ili").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column(WEEKS_COL).unwrap().dtype(), &DataType::UInt32);
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = DatasetLoader::load(dir.path().join("ilidata.csv")).unwrap_err();
        assert!(matches!(err, LoaderError::SourceUnavailable { .. }));
    }

    #[test]
    fn missing_column_is_schema_error() {
        let file = write_csv("epiweek,region,ili\n201040,ca,1.0\n");
        let err = DatasetLoader::load(file.path()).unwrap_err();
        match err {
            LoaderError::SchemaError { column, .. } => assert_eq!(column, "state"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_schema_names_are_respected() {
        let file = write_csv("week,region,wili\nw1,r1,1.0\nw2,r1,2.0\n");
        let schema = TableSchema {
            group_col: "region".to_string(),
            time_col: "week".to_string(),
            value_col: "wili".to_string(),
        };

        let table = DatasetLoader::load_with_schema(file.path(), &schema).unwrap();
        assert_eq!(table.height(), 2);
        assert_eq!(table.schema(), &schema);
    }

    fn groups_of(table: &SurveillanceTable) -> Vec<String> {
        crate::data::DataProcessor::get_groups(table)
    }

    #[test]
    fn decimal_after_long_integer_prefix_is_kept() {
        let mut csv = String::from("epiweek,state,ili\n");
        for week in 0..10_001 {
            csv.push_str(&format!("{week},ca,1\n"));
        }
        csv.push_str("99999,ca,2.5\n");
        let file = write_csv(&csv);

        let table = DatasetLoader::load(file.path()).unwrap();
        assert_eq!(table.source_rows(), 10_002);
        assert_eq!(table.dropped_rows(), 0);

        let values = crate::data::DataProcessor::get_values_for_group(&table, "ca");
        assert_eq!(values.last(), Some(&2.5));
    }

    #[test]
    fn numeric_looking_keys_keep_their_spelling() {
        let file = write_csv(
            "epiweek,state,ili\n\
             00123,06,1.0\n\
             00124,36,2.0\n\
             00125,06,3.0\n",
        );

        let table = DatasetLoader::load(file.path()).unwrap();
        assert_eq!(groups_of(&table), vec!["06", "36"]);
        assert_eq!(weeks_for(&table, "06"), vec![0, 1]);

        let times = table.dataframe().column("epiweek").unwrap().str().unwrap();
        assert_eq!(times.get(0), Some("00123"));
    }

    #[test]
    fn text_key_after_numeric_keys_stays_its_own_group() {
        let mut csv = String::from("epiweek,state,ili\n");
        for row in 0..10_001 {
            csv.push_str(&format!("{row},{},1.0\n", row % 3));
        }
        csv.push_str("99999,ca,2.0\n");
        let file = write_csv(&csv);

        let table = DatasetLoader::load(file.path()).unwrap();
        assert_eq!(groups_of(&table), vec!["0", "1", "2", "ca"]);
        assert_eq!(weeks_for(&table, "ca"), vec![0]);
    }

    #[test]
    fn unparsable_metric_counts_as_missing() {
        let file = write_csv(
            "epiweek,state,ili\n\
             201040,ca,n/a\n\
             201041,ca,NaN\n\
             201042,ca, 1.5 \n",
        );

        let table = DatasetLoader::load(file.path()).unwrap();
        assert_eq!(table.height(), 1);
        assert_eq!(table.dropped_rows(), 2);
        assert_eq!(weeks_for(&table, "ca"), vec![0]);
    }

    #[test]
    fn directory_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = DatasetLoader::load(dir.path()).unwrap_err();
        assert!(matches!(err, LoaderError::SourceUnavailable { .. }));
    }
}
