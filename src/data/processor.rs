//! Data Processor Module
//! Per-state selections over a loaded surveillance table.

use crate::data::loader::{SurveillanceTable, WEEKS_COL};
use polars::prelude::*;

/// Read-only queries over a [`SurveillanceTable`].
pub struct DataProcessor;

impl DataProcessor {
    /// Sorted distinct group keys, for the selection dropdown.
    pub fn get_groups(table: &SurveillanceTable) -> Vec<String> {
        table
            .dataframe()
            .column(&table.schema().group_col)
            .ok()
            .and_then(|col| col.unique().ok())
            .and_then(|unique| {
                unique.str().ok().map(|ca| {
                    let mut groups: Vec<String> =
                        ca.into_iter().flatten().map(str::to_string).collect();
                    groups.sort();
                    groups
                })
            })
            .unwrap_or_default()
    }

    /// Rows for one group key, in table order.
    pub fn filter_by_group(
        table: &SurveillanceTable,
        group: &str,
    ) -> Result<DataFrame, PolarsError> {
        table
            .dataframe()
            .clone()
            .lazy()
            .filter(col(table.schema().group_col.as_str()).eq(lit(group)))
            .collect()
    }

    /// Metric values for one group key, in table order.
    pub fn get_values_for_group(table: &SurveillanceTable, group: &str) -> Vec<f64> {
        Self::filter_by_group(table, group)
            .ok()
            .and_then(|df| {
                df.column(&table.schema().value_col)
                    .ok()
                    .and_then(|col| col.f64().ok().map(|ca| ca.into_iter().flatten().collect()))
            })
            .unwrap_or_default()
    }

    /// (week index, metric value) pairs for one group key, in table order.
    pub fn get_indexed_values_for_group(
        table: &SurveillanceTable,
        group: &str,
    ) -> Vec<(u32, f64)> {
        let Ok(df) = Self::filter_by_group(table, group) else {
            return Vec::new();
        };

        let (Ok(weeks), Ok(values)) = (df.column(WEEKS_COL), df.column(&table.schema().value_col))
        else {
            return Vec::new();
        };

        match (weeks.u32(), values.f64()) {
            (Ok(weeks), Ok(values)) => weeks
                .into_iter()
                .zip(values.into_iter())
                .filter_map(|(w, v)| Some((w?, v?)))
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DatasetLoader;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn load(contents: &str) -> SurveillanceTable {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        DatasetLoader::load(file.path()).unwrap()
    }

    #[test]
    fn groups_are_sorted_and_distinct() {
        let table = load(
            "epiweek,state,ili\n\
             201040,ny,1.0\n\
             201040,ca,1.0\n\
             201040,ak,1.0\n\
             201041,ny,2.0\n",
        );
        assert_eq!(DataProcessor::get_groups(&table), vec!["ak", "ca", "ny"]);
    }

    #[test]
    fn values_keep_table_order() {
        let table = load(
            "epiweek,state,ili\n\
             201040,ca,3.0\n\
             201040,ny,9.0\n\
             201041,ca,1.0\n\
             201042,ca,2.0\n",
        );
        assert_eq!(
            DataProcessor::get_values_for_group(&table, "ca"),
            vec![3.0, 1.0, 2.0]
        );
        assert_eq!(
            DataProcessor::get_indexed_values_for_group(&table, "ca"),
            vec![(0, 3.0), (1, 1.0), (2, 2.0)]
        );
    }

    #[test]
    fn unknown_group_yields_nothing() {
        let table = load("epiweek,state,ili\n201040,ca,3.0\n");
        assert!(DataProcessor::get_values_for_group(&table, "zz").is_empty());
        assert!(DataProcessor::get_indexed_values_for_group(&table, "zz").is_empty());
    }
}
