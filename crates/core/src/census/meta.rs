//! Table and cell reference records.

use super::CensusDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A dataset loaded for a given census year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    pub table_id: String,
    pub table_name: String,
    pub year: i32,
}

/// One cell code of a dataset's variable dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellMeta {
    pub table_id: String,
    pub cell_id: String,
    pub cell_name: Option<String>,
}

impl CensusDb {
    /// Record a table. Returns `true` if it was new.
    pub async fn insert_table(&self, table: &TableMeta) -> Result<bool, Error> {
        let table = table.clone();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO tables (table_id, table_name, year) VALUES (?1, ?2, ?3)",
                    params![table.table_id, table.table_name, table.year],
                )?;
                Ok(inserted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Record a batch of cells in one transaction. Returns how many were new.
    pub async fn insert_cells(&self, cells: Vec<CellMeta>) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                let mut inserted = 0u64;
                {
                    let mut stmt = tx.prepare_cached(
                        "INSERT OR IGNORE INTO cells (table_id, cell_id, cell_name) VALUES (?1, ?2, ?3)",
                    )?;
                    for cell in &cells {
                        inserted += stmt.execute(params![cell.table_id, cell.cell_id, cell.cell_name])? as u64;
                    }
                }
                tx.commit()?;
                Ok(inserted)
            })
            .await
            .map_err(Error::from)
    }

    /// Cells recorded for a table, in code order as inserted.
    pub async fn cells_for(&self, table_id: &str) -> Result<Vec<CellMeta>, Error> {
        let table_id = table_id.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CellMeta>, Error> {
                let mut stmt =
                    conn.prepare("SELECT table_id, cell_id, cell_name FROM cells WHERE table_id = ?1 ORDER BY rowid")?;
                let cells = stmt
                    .query_map(params![table_id], |row| {
                        Ok(CellMeta { table_id: row.get(0)?, cell_id: row.get(1)?, cell_name: row.get(2)? })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(cells)
            })
            .await
            .map_err(Error::from)
    }
}
