use crate::errors::DataSourceError;
use crate::population::{ImperviousSurface, PopulationSource, SurfaceMapEntry};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Double, Nullable};
use diesel::sqlite::SqliteConnection;
use std::path::Path;
use tracing::{debug, warn};

const IMPERVIOUS_SURFACE_QUERY: &str = "SELECT id, CAST(nr_of_inhabitants AS REAL) AS nr_of_inhabitants \
     FROM v2_impervious_surface \
     ORDER BY id";

const SURFACE_MAP_QUERY: &str = "SELECT impervious_surface_id, connection_node_id \
     FROM v2_impervious_surface_map \
     WHERE impervious_surface_id IS NOT NULL \
     ORDER BY id";

#[derive(QueryableByName)]
struct SurfaceRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
    #[diesel(sql_type = Nullable<Double>)]
    nr_of_inhabitants: Option<f64>,
}

#[derive(QueryableByName)]
struct SurfaceMapRow {
    #[diesel(sql_type = BigInt)]
    impervious_surface_id: i64,
    #[diesel(sql_type = Nullable<BigInt>)]
    connection_node_id: Option<i64>,
}

/// Read-only connection to a model schematisation (Spatialite/SQLite file).
pub struct SpatialiteSchema {
    connection: SqliteConnection,
}

impl SpatialiteSchema {
    pub fn open(path: &Path) -> Result<Self, DataSourceError> {
        if !path.is_file() {
            return Err(DataSourceError::MissingFile(path.to_path_buf()));
        }
        debug!("opening schema {}", path.display());
        let connection = SqliteConnection::establish(&read_only_uri(path))?;
        Ok(SpatialiteSchema { connection })
    }
}

impl PopulationSource for SpatialiteSchema {
    fn impervious_surfaces(&mut self) -> Result<Vec<ImperviousSurface>, DataSourceError> {
        let rows: Vec<SurfaceRow> =
            sql_query(IMPERVIOUS_SURFACE_QUERY).load(&mut self.connection)?;
        Ok(rows
            .into_iter()
            .map(|row| ImperviousSurface {
                id: row.id,
                nr_of_inhabitants: row.nr_of_inhabitants,
            })
            .collect())
    }

    fn surface_map(&mut self) -> Result<Vec<SurfaceMapEntry>, DataSourceError> {
        let rows: Vec<SurfaceMapRow> = sql_query(SURFACE_MAP_QUERY).load(&mut self.connection)?;
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            match row.connection_node_id {
                Some(connection_node_id) => entries.push(SurfaceMapEntry {
                    impervious_surface_id: row.impervious_surface_id,
                    connection_node_id,
                }),
                None => warn!(
                    "impervious surface {} has a map entry without connection node",
                    row.impervious_surface_id
                ),
            }
        }
        Ok(entries)
    }
}

/// SQLite URI that opens `path` read-only and never creates it.
fn read_only_uri(path: &Path) -> String {
    let mut uri = String::from("file:");
    for c in path.to_string_lossy().chars() {
        match c {
            '%' => uri.push_str("%25"),
            '?' => uri.push_str("%3F"),
            '#' => uri.push_str("%23"),
            _ => uri.push(c),
        }
    }
    uri.push_str("?mode=ro");
    uri
}
