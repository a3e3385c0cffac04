//! SQLite Config Store
//!
//! File-based persistent storage. A single connection is shared behind a
//! mutex; every multi-statement write runs in one transaction.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::schema;
use crate::domain::models::{
    CatalogSeed, ComponentId, ConfigUpdate, NewRegion, NomenclatureId, NomenclatureImport,
    ParamTypeId, ParamValue, PartTypeId, RegionId, RegionParamRow, RegionPartRow, RegionRow,
    RegionTypeId,
};
use crate::domain::ports::{
    CatalogBootstrap, CompatibilityStore, DeclaredValue, RegionConfigStore, RegionConfigWriter,
    RegionRepository,
};
use crate::{Result, StorageError};

/// SQLite-based config store
#[derive(Clone)]
pub struct SqliteConfigStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteConfigStore {
    /// Open (or create) the database at `db_path`
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path)?;
        schema::init_or_check(&conn)?;
        info!(path = %db_path.display(), "opened config database");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory SQLite store (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::init_or_check(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run raw SQL against the underlying connection
    #[doc(hidden)]
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let conn = self.conn.lock();
        Ok(f(&conn)?)
    }

    fn region_exists(conn: &Connection, region: RegionId) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM region WHERE id = ?1",
            params![region.0],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

impl CompatibilityStore for SqliteConfigStore {
    fn declared_values(&self, param_type: ParamTypeId) -> Result<Vec<DeclaredValue>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT value, label FROM tparamvalue WHERE tparam_id = ?1 ORDER BY id")?;
        let values = stmt
            .query_map(params![param_type.0], |row| {
                Ok(DeclaredValue {
                    value: ParamValue::new(row.get(0)?),
                    label: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(values)
    }

    fn dependent_values(
        &self,
        param_type: ParamTypeId,
        value: ParamValue,
        dependent_type: ParamTypeId,
    ) -> Result<Vec<ParamValue>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT dependent_value FROM cn_tparamvalue_tparamvalue
             WHERE tparam_id = ?1 AND value = ?2 AND dependent_tparam_id = ?3
             ORDER BY dependent_value",
        )?;
        let values = stmt
            .query_map(params![param_type.0, value.get(), dependent_type.0], |row| {
                Ok(ParamValue::new(row.get(0)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(values)
    }

    fn part_nomenclature(&self, part_type: PartTypeId) -> Result<Vec<Option<NomenclatureId>>> {
        let conn = self.conn.lock();
        // NULLs sort first in ascending order
        let mut stmt = conn.prepare(
            "SELECT nomenclature_id FROM cn_tpart_nomenclature
             WHERE tpart_id = ?1 ORDER BY nomenclature_id",
        )?;
        let ids = stmt
            .query_map(params![part_type.0], |row| {
                Ok(row.get::<_, Option<i64>>(0)?.map(NomenclatureId))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    fn nomenclature_for_param(
        &self,
        param_type: ParamTypeId,
        value: ParamValue,
        part_type: PartTypeId,
    ) -> Result<Vec<NomenclatureId>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT cn.nomenclature_id
             FROM cn_tparamvalue_nomenclature cn
             JOIN cn_tparam_tpart tp ON tp.tparam_id = cn.tparam_id
             WHERE cn.tparam_id = ?1 AND cn.value = ?2 AND tp.tpart_id = ?3
             ORDER BY cn.nomenclature_id",
        )?;
        let ids = stmt
            .query_map(params![param_type.0, value.get(), part_type.0], |row| {
                Ok(NomenclatureId(row.get(0)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }
}

impl RegionConfigStore for SqliteConfigStore {
    fn region(&self, region: RegionId) -> Result<Option<RegionRow>> {
        let conn = self.conn.lock();
        let result = conn
            .query_row(
                "SELECT id, project_id, tregion_id, description, nr, created_at
                 FROM region WHERE id = ?1",
                params![region.0],
                |row| {
                    Ok(RegionRow {
                        id: RegionId(row.get(0)?),
                        project_id: row.get(1)?,
                        region_type: RegionTypeId(row.get(2)?),
                        description: row.get(3)?,
                        nr: row.get(4)?,
                        created_at: DateTime::from_timestamp(row.get(5)?, 0).unwrap_or_default(),
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    fn region_params(&self, region: RegionId) -> Result<Vec<RegionParamRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT p.tparam_id, t.prio, p.value
             FROM param p JOIN tparam t ON t.id = p.tparam_id
             WHERE p.region_id = ?1
             ORDER BY t.prio, p.id",
        )?;
        let rows = stmt
            .query_map(params![region.0], |row| {
                Ok(RegionParamRow {
                    param_type: ParamTypeId(row.get(0)?),
                    priority: row.get(1)?,
                    value: ParamValue::new(row.get(2)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn region_parts(&self, region: RegionId) -> Result<Vec<RegionPartRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT pt.tpart_id, pt.component_id, pt.nomenclature_id
             FROM part pt JOIN component c ON c.id = pt.component_id
             WHERE c.region_id = ?1
             ORDER BY pt.id",
        )?;
        let rows = stmt
            .query_map(params![region.0], |row| {
                Ok(RegionPartRow {
                    part_type: PartTypeId(row.get(0)?),
                    component: ComponentId(row.get(1)?),
                    nomenclature: row.get::<_, Option<i64>>(2)?.map(NomenclatureId),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}

impl RegionConfigWriter for SqliteConfigStore {
    fn apply_update(&self, region: RegionId, update: &ConfigUpdate) -> Result<()> {
        let conn = self.conn.lock();
        // Dropping `tx` on an early return rolls back
        let tx = conn.unchecked_transaction()?;

        for (param_type, value) in &update.params {
            let changed = tx.execute(
                "UPDATE param SET value = ?1 WHERE region_id = ?2 AND tparam_id = ?3",
                params![value.get(), region.0, param_type.0],
            )?;
            if changed == 0 {
                return Err(StorageError::integrity(format!(
                    "no param row for region {}, param type {}",
                    region, param_type
                )));
            }
        }

        for (part_type, nomenclature) in &update.parts {
            let changed = tx.execute(
                "UPDATE part SET nomenclature_id = ?1
                 WHERE tpart_id = ?2
                   AND component_id IN (SELECT id FROM component WHERE region_id = ?3)",
                params![nomenclature.map(|n| n.0), part_type.0, region.0],
            )?;
            if changed == 0 {
                return Err(StorageError::integrity(format!(
                    "no part row for region {}, part type {}",
                    region, part_type
                )));
            }
        }

        tx.commit().map_err(|e| {
            StorageError::transaction(format!("commit failed for region {}", region)).with_source(e)
        })?;
        debug!(
            region = region.0,
            params = update.params.len(),
            parts = update.parts.len(),
            "applied config update"
        );
        Ok(())
    }
}

impl RegionRepository for SqliteConfigStore {
    fn create_region(&self, new: &NewRegion) -> Result<RegionId> {
        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction()?;

        let known: i64 = tx.query_row(
            "SELECT count(*) FROM tregion WHERE id = ?1",
            params![new.region_type.0],
            |row| row.get(0),
        )?;
        if known == 0 {
            return Err(StorageError::not_found("region type", new.region_type));
        }

        tx.execute(
            "INSERT INTO region (project_id, tregion_id, description, nr, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                new.project_id,
                new.region_type.0,
                &new.description,
                new.nr,
                Utc::now().timestamp()
            ],
        )?;
        let region = RegionId(tx.last_insert_rowid());

        // Smallest declared value, 0 when none declared
        tx.execute(
            "INSERT INTO param (region_id, tparam_id, value)
             SELECT ?1, tr.tparam_id,
                    ifnull((SELECT min(v.value) FROM tparamvalue v WHERE v.tparam_id = tr.tparam_id), 0)
             FROM cn_tparam_tregion tr
             WHERE tr.tregion_id = ?2
             ORDER BY tr.tparam_id",
            params![region.0, new.region_type.0],
        )?;

        let component_types = {
            let mut stmt = tx.prepare(
                "SELECT tcomponent_id FROM cn_tregion_tcomponent
                 WHERE tregion_id = ?1 ORDER BY id",
            )?;
            let ids = stmt
                .query_map(params![new.region_type.0], |row| row.get::<_, i64>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            ids
        };

        for component_type in component_types {
            tx.execute(
                "INSERT INTO component (region_id, tcomponent_id) VALUES (?1, ?2)",
                params![region.0, component_type],
            )?;
            let component = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO part (component_id, tpart_id, nomenclature_id)
                 SELECT ?1, p.id,
                        (SELECT min(cn.nomenclature_id) FROM cn_tpart_nomenclature cn
                         WHERE cn.tpart_id = p.id)
                 FROM tpart p
                 WHERE p.tcomponent_id = ?2
                 ORDER BY p.id",
                params![component, component_type],
            )?;
        }

        tx.commit()?;
        debug!(region = region.0, project = new.project_id, "created region rows");
        Ok(region)
    }

    fn delete_region(&self, region: RegionId) -> Result<bool> {
        let conn = self.conn.lock();
        if !Self::region_exists(&conn, region)? {
            return Ok(false);
        }
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM part WHERE component_id IN (SELECT id FROM component WHERE region_id = ?1)",
            params![region.0],
        )?;
        tx.execute("DELETE FROM component WHERE region_id = ?1", params![region.0])?;
        tx.execute("DELETE FROM param WHERE region_id = ?1", params![region.0])?;
        tx.execute("DELETE FROM region WHERE id = ?1", params![region.0])?;
        tx.commit()?;
        Ok(true)
    }

    fn count_regions(&self, project_id: i64, region_type: RegionTypeId) -> Result<usize> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row(
            "SELECT count(*) FROM region WHERE project_id = ?1 AND tregion_id = ?2",
            params![project_id, region_type.0],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn nomenclature_names(
        &self,
        ids: &[NomenclatureId],
    ) -> Result<HashMap<NomenclatureId, String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name FROM nomenclature WHERE id = ?1")?;
        let mut names = HashMap::new();
        for id in ids {
            let name: Option<String> = stmt.query_row(params![id.0], |row| row.get(0)).optional()?;
            if let Some(name) = name {
                names.insert(*id, name);
            }
        }
        Ok(names)
    }
}

impl CatalogBootstrap for SqliteConfigStore {
    fn is_bootstrapped(&self) -> Result<bool> {
        let conn = self.conn.lock();
        let count: i64 = conn.query_row("SELECT count(*) FROM tparam", [], |row| row.get(0))?;
        Ok(count > 0)
    }

    fn bootstrap(&self, seed: &CatalogSeed) -> Result<()> {
        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction()?;

        let existing: i64 = tx.query_row("SELECT count(*) FROM tparam", [], |row| row.get(0))?;
        if existing > 0 {
            return Err(StorageError::integrity("catalog is already bootstrapped"));
        }

        for row in &seed.region_types {
            tx.execute(
                "INSERT INTO tregion (id, name) VALUES (?1, ?2)",
                params![row.id.0, &row.name],
            )?;
        }
        for row in &seed.param_types {
            tx.execute(
                "INSERT INTO tparam (id, prio, name, description) VALUES (?1, ?2, ?3, ?4)",
                params![row.id.0, row.priority, &row.name, &row.description],
            )?;
        }
        for row in &seed.param_values {
            tx.execute(
                "INSERT INTO tparamvalue (tparam_id, value, label) VALUES (?1, ?2, ?3)",
                params![row.param_type.0, row.value.get(), &row.label],
            )?;
        }
        for (param_type, region_type) in &seed.param_regions {
            tx.execute(
                "INSERT INTO cn_tparam_tregion (tparam_id, tregion_id) VALUES (?1, ?2)",
                params![param_type.0, region_type.0],
            )?;
        }
        for edge in &seed.param_edges {
            tx.execute(
                "INSERT OR IGNORE INTO cn_tparamvalue_tparamvalue
                 (tparam_id, value, dependent_tparam_id, dependent_value)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    edge.param_type.0,
                    edge.value.get(),
                    edge.dependent_type.0,
                    edge.dependent_value.get()
                ],
            )?;
        }
        for row in &seed.component_types {
            tx.execute(
                "INSERT INTO tcomponent (id, name) VALUES (?1, ?2)",
                params![row.id.0, &row.name],
            )?;
        }
        for row in &seed.part_types {
            tx.execute(
                "INSERT INTO tpart (id, tcomponent_id, name) VALUES (?1, ?2, ?3)",
                params![row.id.0, row.component_type.0, &row.name],
            )?;
        }
        for (region_type, component_type) in &seed.region_components {
            tx.execute(
                "INSERT INTO cn_tregion_tcomponent (tregion_id, tcomponent_id) VALUES (?1, ?2)",
                params![region_type.0, component_type.0],
            )?;
        }
        for (param_type, part_type) in &seed.param_parts {
            tx.execute(
                "INSERT INTO cn_tparam_tpart (tparam_id, tpart_id) VALUES (?1, ?2)",
                params![param_type.0, part_type.0],
            )?;
        }
        tx.execute(
            "INSERT OR REPLACE INTO meta (key, value) VALUES ('bootstrapped_at', ?1)",
            params![Utc::now().to_rfc3339()],
        )?;

        tx.commit()?;
        info!(
            param_types = seed.param_types.len(),
            values = seed.param_values.len(),
            edges = seed.param_edges.len(),
            "bootstrapped catalog"
        );
        Ok(())
    }

    fn import_nomenclature(&self, import: &NomenclatureImport) -> Result<()> {
        let conn = self.conn.lock();
        let tx = conn.unchecked_transaction()?;

        for row in &import.nomenclature {
            tx.execute(
                "INSERT OR REPLACE INTO nomenclature (id, name, vendor_code) VALUES (?1, ?2, ?3)",
                params![row.id.0, &row.name, &row.vendor_code],
            )?;
        }

        let part_known = |part_type: PartTypeId| -> Result<bool> {
            let count: i64 = tx.query_row(
                "SELECT count(*) FROM tpart WHERE id = ?1",
                params![part_type.0],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        };
        let nomenclature_known = |id: NomenclatureId| -> Result<bool> {
            let count: i64 = tx.query_row(
                "SELECT count(*) FROM nomenclature WHERE id = ?1",
                params![id.0],
                |row| row.get(0),
            )?;
            Ok(count > 0)
        };

        for (part_type, nomenclature) in &import.part_nomenclature {
            if !part_known(*part_type)? {
                return Err(StorageError::not_found("part type", part_type));
            }
            if let Some(id) = nomenclature {
                if !nomenclature_known(*id)? {
                    return Err(StorageError::not_found("nomenclature", id));
                }
            }
            tx.execute(
                "INSERT INTO cn_tpart_nomenclature (tpart_id, nomenclature_id) VALUES (?1, ?2)",
                params![part_type.0, nomenclature.map(|n| n.0)],
            )?;
        }

        for edge in &import.param_nomenclature {
            if !nomenclature_known(edge.nomenclature)? {
                return Err(StorageError::not_found("nomenclature", edge.nomenclature));
            }
            tx.execute(
                "INSERT OR IGNORE INTO cn_tparamvalue_nomenclature (tparam_id, value, nomenclature_id)
                 VALUES (?1, ?2, ?3)",
                params![edge.param_type.0, edge.value.get(), edge.nomenclature.0],
            )?;
        }

        tx.commit()?;
        info!(
            items = import.nomenclature.len(),
            part_links = import.part_nomenclature.len(),
            param_links = import.param_nomenclature.len(),
            "imported nomenclature"
        );
        Ok(())
    }
}
