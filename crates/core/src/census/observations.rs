//! Observation rows.

use super::CensusDb;
use super::row_key::compute_row_key;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Number of columns the data endpoint returns for each row.
pub const DATA_COLUMNS: usize = 12;

/// One observation row: the year and dataset it was loaded for, followed by
/// the columns of the data endpoint's CSV in select order.
///
/// Empty CSV fields are stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusRow {
    pub year: i32,
    pub table_id: String,
    pub table_name: String,
    pub date_name: Option<String>,
    pub geography_name: Option<String>,
    pub geography_code: Option<String>,
    pub geography_type: Option<String>,
    pub geography_typecode: Option<String>,
    pub cell: Option<String>,
    pub cell_name: Option<String>,
    pub cell_type: Option<String>,
    pub measures: Option<String>,
    pub measures_name: Option<String>,
    pub obs_value: Option<String>,
    pub obs_status_name: Option<String>,
}

impl CensusRow {
    /// Build a row from the data columns of one CSV record.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidResponse` unless exactly [`DATA_COLUMNS`] fields are given.
    pub fn from_fields(
        year: i32, table_id: &str, table_name: &str, fields: Vec<Option<String>>,
    ) -> Result<Self, Error> {
        let [
            date_name,
            geography_name,
            geography_code,
            geography_type,
            geography_typecode,
            cell,
            cell_name,
            cell_type,
            measures,
            measures_name,
            obs_value,
            obs_status_name,
        ]: [Option<String>; DATA_COLUMNS] = fields.try_into().map_err(|f: Vec<Option<String>>| {
            Error::InvalidResponse(format!("expected {DATA_COLUMNS} columns in data row, got {}", f.len()))
        })?;

        Ok(Self {
            year,
            table_id: table_id.to_string(),
            table_name: table_name.to_string(),
            date_name,
            geography_name,
            geography_code,
            geography_type,
            geography_typecode,
            cell,
            cell_name,
            cell_type,
            measures,
            measures_name,
            obs_value,
            obs_status_name,
        })
    }

    /// Key over the full column tuple; identical rows share a key.
    pub fn row_key(&self) -> String {
        let year = self.year.to_string();
        let fixed = [Some(year.as_str()), Some(self.table_id.as_str()), Some(self.table_name.as_str())];
        let data = [
            &self.date_name,
            &self.geography_name,
            &self.geography_code,
            &self.geography_type,
            &self.geography_typecode,
            &self.cell,
            &self.cell_name,
            &self.cell_type,
            &self.measures,
            &self.measures_name,
            &self.obs_value,
            &self.obs_status_name,
        ];
        compute_row_key(fixed.into_iter().chain(data.into_iter().map(|c| c.as_deref())))
    }
}

impl CensusDb {
    /// Insert a batch of rows in one transaction, ignoring rows already present.
    ///
    /// Returns the number of rows actually inserted.
    pub async fn insert_rows(&self, rows: Vec<CensusRow>) -> Result<u64, Error> {
        if rows.is_empty() {
            return Ok(0);
        }
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let mut inserted = 0u64;
                {
                    let mut stmt = tx.prepare_cached(
                        "INSERT OR IGNORE INTO observations (
                        row_key, year, table_id, table_name, date_name,
                        geography_name, geography_code, geography_type, geography_typecode,
                        cell, cell_name, cell_type, measures, measures_name,
                        obs_value, obs_status_name
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                              ?11, ?12, ?13, ?14, ?15, ?16)",
                    )?;
                    for row in &rows {
                        inserted += stmt.execute(params![
                            row.row_key(),
                            row.year,
                            &row.table_id,
                            &row.table_name,
                            &row.date_name,
                            &row.geography_name,
                            &row.geography_code,
                            &row.geography_type,
                            &row.geography_typecode,
                            &row.cell,
                            &row.cell_name,
                            &row.cell_type,
                            &row.measures,
                            &row.measures_name,
                            &row.obs_value,
                            &row.obs_status_name,
                        ])? as u64;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
            .await
            .map_err(Error::from)
    }

    /// All rows stored for a dataset and year, in insertion order.
    pub async fn rows_for(&self, year: i32, table_id: &str) -> Result<Vec<CensusRow>, Error> {
        let table_id = table_id.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CensusRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT year, table_id, table_name, date_name,
                        geography_name, geography_code, geography_type, geography_typecode,
                        cell, cell_name, cell_type, measures, measures_name,
                        obs_value, obs_status_name
                    FROM observations WHERE year = ?1 AND table_id = ?2 ORDER BY rowid",
                )?;
                let rows = stmt
                    .query_map(params![year, table_id], |row| {
                        Ok(CensusRow {
                            year: row.get(0)?,
                            table_id: row.get(1)?,
                            table_name: row.get(2)?,
                            date_name: row.get(3)?,
                            geography_name: row.get(4)?,
                            geography_code: row.get(5)?,
                            geography_type: row.get(6)?,
                            geography_typecode: row.get(7)?,
                            cell: row.get(8)?,
                            cell_name: row.get(9)?,
                            cell_type: row.get(10)?,
                            measures: row.get(11)?,
                            measures_name: row.get(12)?,
                            obs_value: row.get(13)?,
                            obs_status_name: row.get(14)?,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)
    }
}
