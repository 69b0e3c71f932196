use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row, Transaction};
use std::path::Path;
use tracing::debug;

use crate::error::Result;
use crate::models::{Category, Dye, Spectrum, SpectrumData, Subtype, UpsertOutcome};
use crate::spectrum::data_digest;

const SCHEMA: &str = r#"
    PRAGMA foreign_keys=ON;
    CREATE TABLE IF NOT EXISTS dye (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        name          TEXT NOT NULL UNIQUE,
        slug          TEXT NOT NULL UNIQUE,
        manufacturer  TEXT NOT NULL DEFAULT '',
        url           TEXT NOT NULL DEFAULT '',
        created       TEXT NOT NULL,
        modified      TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS dye_manufacturer ON dye (manufacturer);
    CREATE TABLE IF NOT EXISTS spectrum (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_dye_id  INTEGER NOT NULL REFERENCES dye (id) ON DELETE CASCADE,
        subtype       TEXT NOT NULL,
        category      TEXT NOT NULL,
        data          TEXT NOT NULL,
        data_sha256   TEXT NOT NULL,
        created       TEXT NOT NULL,
        modified      TEXT NOT NULL,
        UNIQUE (owner_dye_id, subtype, category)
    );
"#;

const DYE_COLUMNS: &str = "id, name, slug, manufacturer, url, created, modified";

/// Persistence for dyes and their spectra
pub trait DyeStore {
    fn dye_by_name(&self, name: &str) -> Result<Option<Dye>>;
    fn dye_by_slug(&self, slug: &str) -> Result<Option<Dye>>;
    fn dyes_by_manufacturer(&self, manufacturer: &str) -> Result<Vec<Dye>>;
    /// Inserts a dye without an id, updates one with an id.
    fn save_dye(&self, dye: &mut Dye) -> Result<()>;
    /// Creates or replaces the spectrum keyed by (dye, subtype, category).
    fn upsert_spectrum(
        &self,
        dye_id: i64,
        subtype: Subtype,
        category: Category,
        data: &SpectrumData,
    ) -> Result<UpsertOutcome>;
    /// Removes the spectrum keyed by (dye, subtype, category); `false` when
    /// there was none.
    fn delete_spectrum(&self, dye_id: i64, subtype: Subtype, category: Category) -> Result<bool>;
    fn spectra_for_dye(&self, dye_id: i64) -> Result<Vec<Spectrum>>;
}

/// SQLite database holding the `dye` and `spectrum` tables.
pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Starts the transaction a whole import runs in. Dropping it without
    /// `commit` rolls every change back.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }
}

fn parse_time(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn dye_from_row(row: &Row) -> rusqlite::Result<Dye> {
    Ok(Dye {
        id: Some(row.get(0)?),
        name: row.get(1)?,
        slug: row.get(2)?,
        manufacturer: row.get(3)?,
        url: row.get(4)?,
        created: parse_time(row, 5)?,
        modified: parse_time(row, 6)?,
    })
}

fn unknown_code(idx: usize, code: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        Type::Text,
        format!("unknown code '{}'", code).into(),
    )
}

fn spectrum_from_row(row: &Row) -> rusqlite::Result<Spectrum> {
    let subtype: String = row.get(2)?;
    let category: String = row.get(3)?;
    let data: String = row.get(4)?;
    Ok(Spectrum {
        id: Some(row.get(0)?),
        owner_dye_id: row.get(1)?,
        subtype: Subtype::from_code(&subtype).ok_or_else(|| unknown_code(2, subtype))?,
        category: Category::from_code(&category).ok_or_else(|| unknown_code(3, category))?,
        data: serde_json::from_str(&data)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
    })
}

// A transaction derefs to its connection, so both get these methods.
impl DyeStore for Connection {
    fn dye_by_name(&self, name: &str) -> Result<Option<Dye>> {
        let sql = format!("SELECT {} FROM dye WHERE name = ?1", DYE_COLUMNS);
        let mut stmt = self.prepare(&sql)?;
        let mut rows = stmt.query(params![name])?;
        match rows.next()? {
            Some(row) => Ok(Some(dye_from_row(row)?)),
            None => Ok(None),
        }
    }

    fn dye_by_slug(&self, slug: &str) -> Result<Option<Dye>> {
        let sql = format!("SELECT {} FROM dye WHERE slug = ?1", DYE_COLUMNS);
        let mut stmt = self.prepare(&sql)?;
        let mut rows = stmt.query(params![slug])?;
        match rows.next()? {
            Some(row) => Ok(Some(dye_from_row(row)?)),
            None => Ok(None),
        }
    }

    fn dyes_by_manufacturer(&self, manufacturer: &str) -> Result<Vec<Dye>> {
        let sql = format!(
            "SELECT {} FROM dye WHERE manufacturer = ?1 ORDER BY name",
            DYE_COLUMNS
        );
        let mut stmt = self.prepare(&sql)?;
        let dyes = stmt
            .query_map(params![manufacturer], dye_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(dyes)
    }

    fn save_dye(&self, dye: &mut Dye) -> Result<()> {
        dye.modified = Utc::now();
        match dye.id {
            Some(id) => {
                self.execute(
                    "UPDATE dye SET name = ?1, slug = ?2, manufacturer = ?3, url = ?4, modified = ?5
                     WHERE id = ?6",
                    params![
                        dye.name,
                        dye.slug,
                        dye.manufacturer,
                        dye.url,
                        dye.modified.to_rfc3339(),
                        id
                    ],
                )?;
                debug!(id, name = %dye.name, "Updated dye");
            }
            None => {
                self.execute(
                    "INSERT INTO dye (name, slug, manufacturer, url, created, modified)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        dye.name,
                        dye.slug,
                        dye.manufacturer,
                        dye.url,
                        dye.created.to_rfc3339(),
                        dye.modified.to_rfc3339()
                    ],
                )?;
                let id = self.last_insert_rowid();
                dye.id = Some(id);
                debug!(id, name = %dye.name, "Inserted dye");
            }
        }
        Ok(())
    }

    fn upsert_spectrum(
        &self,
        dye_id: i64,
        subtype: Subtype,
        category: Category,
        data: &SpectrumData,
    ) -> Result<UpsertOutcome> {
        let digest = data_digest(data)?;
        let json = serde_json::to_string(data)?;
        let now = Utc::now().to_rfc3339();

        let existing = {
            let mut stmt = self.prepare(
                "SELECT id, data_sha256 FROM spectrum
                 WHERE owner_dye_id = ?1 AND subtype = ?2 AND category = ?3",
            )?;
            let mut rows = stmt.query(params![dye_id, subtype.as_str(), category.as_str()])?;
            match rows.next()? {
                Some(row) => Some((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
                None => None,
            }
        };

        let outcome = match existing {
            Some((_, stored)) if stored == digest => UpsertOutcome::Unchanged,
            Some((id, _)) => {
                self.execute(
                    "UPDATE spectrum SET data = ?1, data_sha256 = ?2, modified = ?3 WHERE id = ?4",
                    params![json, digest, now, id],
                )?;
                UpsertOutcome::Updated
            }
            None => {
                self.execute(
                    "INSERT INTO spectrum
                        (owner_dye_id, subtype, category, data, data_sha256, created, modified)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
                    params![dye_id, subtype.as_str(), category.as_str(), json, digest, now],
                )?;
                UpsertOutcome::Created
            }
        };
        debug!(dye_id, subtype = %subtype, ?outcome, points = data.len(), "Upserted spectrum");
        Ok(outcome)
    }

    fn delete_spectrum(&self, dye_id: i64, subtype: Subtype, category: Category) -> Result<bool> {
        let deleted = self.execute(
            "DELETE FROM spectrum WHERE owner_dye_id = ?1 AND subtype = ?2 AND category = ?3",
            params![dye_id, subtype.as_str(), category.as_str()],
        )?;
        debug!(dye_id, subtype = %subtype, deleted, "Deleted spectrum");
        Ok(deleted > 0)
    }

    fn spectra_for_dye(&self, dye_id: i64) -> Result<Vec<Spectrum>> {
        let mut stmt = self.prepare(
            "SELECT id, owner_dye_id, subtype, category, data FROM spectrum
             WHERE owner_dye_id = ?1 ORDER BY subtype, category",
        )?;
        let spectra = stmt
            .query_map(params![dye_id], spectrum_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(spectra)
    }
}
