use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::{Result, StorageError};

/// Version written to `meta.schema_version` on creation
pub const SCHEMA_VERSION: &str = "1";

const SCHEMA: &str = "
CREATE TABLE meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Catalog
CREATE TABLE tregion (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE tparam (
    id INTEGER PRIMARY KEY,
    prio INTEGER NOT NULL,
    name TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE tparamvalue (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tparam_id INTEGER NOT NULL REFERENCES tparam(id),
    value REAL NOT NULL,
    label TEXT NOT NULL DEFAULT '',
    UNIQUE (tparam_id, value)
);

CREATE TABLE cn_tparam_tregion (
    tparam_id INTEGER NOT NULL REFERENCES tparam(id),
    tregion_id INTEGER NOT NULL REFERENCES tregion(id),
    PRIMARY KEY (tparam_id, tregion_id)
);

CREATE TABLE cn_tparamvalue_tparamvalue (
    tparam_id INTEGER NOT NULL REFERENCES tparam(id),
    value REAL NOT NULL,
    dependent_tparam_id INTEGER NOT NULL REFERENCES tparam(id),
    dependent_value REAL NOT NULL,
    UNIQUE (tparam_id, value, dependent_tparam_id, dependent_value)
);

CREATE INDEX idx_cn_tparamvalue_source
    ON cn_tparamvalue_tparamvalue(tparam_id, value, dependent_tparam_id);

CREATE TABLE tcomponent (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE tpart (
    id INTEGER PRIMARY KEY,
    tcomponent_id INTEGER NOT NULL REFERENCES tcomponent(id),
    name TEXT NOT NULL
);

CREATE TABLE cn_tregion_tcomponent (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tregion_id INTEGER NOT NULL REFERENCES tregion(id),
    tcomponent_id INTEGER NOT NULL REFERENCES tcomponent(id)
);

CREATE TABLE cn_tparam_tpart (
    tparam_id INTEGER NOT NULL REFERENCES tparam(id),
    tpart_id INTEGER NOT NULL REFERENCES tpart(id),
    PRIMARY KEY (tparam_id, tpart_id)
);

-- Nomenclature
CREATE TABLE nomenclature (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    vendor_code TEXT NOT NULL DEFAULT ''
);

CREATE TABLE cn_tpart_nomenclature (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    tpart_id INTEGER NOT NULL REFERENCES tpart(id),
    nomenclature_id INTEGER REFERENCES nomenclature(id)
);

CREATE INDEX idx_cn_tpart_nomenclature_part ON cn_tpart_nomenclature(tpart_id);

CREATE TABLE cn_tparamvalue_nomenclature (
    tparam_id INTEGER NOT NULL REFERENCES tparam(id),
    value REAL NOT NULL,
    nomenclature_id INTEGER NOT NULL REFERENCES nomenclature(id),
    UNIQUE (tparam_id, value, nomenclature_id)
);

-- Regions
CREATE TABLE region (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    tregion_id INTEGER NOT NULL REFERENCES tregion(id),
    description TEXT NOT NULL DEFAULT '',
    nr INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL
);

CREATE INDEX idx_region_project ON region(project_id, tregion_id);

CREATE TABLE param (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    region_id INTEGER NOT NULL REFERENCES region(id),
    tparam_id INTEGER NOT NULL REFERENCES tparam(id),
    value REAL NOT NULL,
    UNIQUE (region_id, tparam_id)
);

CREATE TABLE component (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    region_id INTEGER NOT NULL REFERENCES region(id),
    tcomponent_id INTEGER NOT NULL REFERENCES tcomponent(id)
);

CREATE INDEX idx_component_region ON component(region_id);

CREATE TABLE part (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    component_id INTEGER NOT NULL REFERENCES component(id),
    tpart_id INTEGER NOT NULL REFERENCES tpart(id),
    nomenclature_id INTEGER REFERENCES nomenclature(id)
);

CREATE INDEX idx_part_component ON part(component_id, tpart_id);
";

/// Create the schema on an empty database, or verify the stored version
pub(super) fn init_or_check(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;

    let has_meta: i64 = conn.query_row(
        "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'meta'",
        [],
        |row| row.get(0),
    )?;

    if has_meta == 0 {
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(SCHEMA)?;
        tx.execute(
            "INSERT INTO meta (key, value) VALUES ('schema_version', ?1)",
            params![SCHEMA_VERSION],
        )?;
        tx.commit()?;
        info!(version = SCHEMA_VERSION, "created database schema");
        return Ok(());
    }

    let found: Option<String> = conn
        .query_row(
            "SELECT value FROM meta WHERE key = 'schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    match found {
        Some(version) if version == SCHEMA_VERSION => Ok(()),
        Some(version) => Err(StorageError::schema_version(&version, SCHEMA_VERSION)),
        None => Err(StorageError::schema_version("none", SCHEMA_VERSION)),
    }
}
