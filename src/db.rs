use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{AdvisorError, Result};
use crate::models::{Member, NameField, Offer, ParsedRecord, Sender};
use crate::store::RecordStore;

pub const DB_FILE: &str = "cashback.db";

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS collectives (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_by INTEGER NOT NULL,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS members (
    user_id INTEGER PRIMARY KEY,
    user_name TEXT NOT NULL,
    collective TEXT NOT NULL,
    joined_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (collective) REFERENCES collectives(name)
);

CREATE TABLE IF NOT EXISTS offers (
    id INTEGER PRIMARY KEY,
    collective TEXT NOT NULL,
    bank_name TEXT NOT NULL,
    category TEXT NOT NULL,
    percent REAL NOT NULL,
    cap REAL NOT NULL,
    expiry TEXT NOT NULL,
    author_id INTEGER NOT NULL,
    author_name TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (collective) REFERENCES collectives(name)
);

CREATE INDEX IF NOT EXISTS idx_offers_collective ON offers(collective);
";

const DATE_FORMAT: &str = "%Y-%m-%d";
const OFFER_COLUMNS: &str =
    "id, collective, bank_name, category, percent, cap, expiry, author_id, author_name";

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

fn row_to_offer(row: &Row<'_>) -> rusqlite::Result<Offer> {
    let expiry: String = row.get(6)?;
    let expiry = NaiveDate::parse_from_str(&expiry, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, Box::new(e)))?;
    Ok(Offer {
        id: row.get(0)?,
        collective: row.get(1)?,
        bank_name: row.get(2)?,
        category: row.get(3)?,
        percent: row.get(4)?,
        cap: row.get(5)?,
        expiry,
        author_id: row.get(7)?,
        author_name: row.get(8)?,
    })
}

fn validate(record: &ParsedRecord) -> Result<()> {
    if record.bank_name.trim().is_empty() || record.category.trim().is_empty() {
        return Err(AdvisorError::Validation("bank and category are required".into()));
    }
    if !(0.0..=100.0).contains(&record.percent) {
        return Err(AdvisorError::Validation(format!(
            "percent must be within 0-100, got {}",
            record.percent
        )));
    }
    if record.cap < 0.0 {
        return Err(AdvisorError::Validation(format!("cap cannot be negative, got {}", record.cap)));
    }
    Ok(())
}

/// [`RecordStore`] on a single SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn: Mutex::new(conn) }
    }

    /// Opens the database file and makes sure the schema exists.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self::new(conn))
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AdvisorError::Backend("database connection lost after a panic".into()))
    }

    fn fetch(conn: &Connection, id: i64) -> Result<Option<Offer>> {
        let sql = format!("SELECT {OFFER_COLUMNS} FROM offers WHERE id = ?1");
        Ok(conn.query_row(&sql, [id], row_to_offer).optional()?)
    }
}

impl RecordStore for SqliteStore {
    fn candidate_names(&self, collective: &str, field: NameField) -> Result<Vec<String>> {
        let column = field.column();
        let sql = format!(
            "SELECT DISTINCT {column} FROM offers WHERE collective = ?1 ORDER BY {column}"
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let names = stmt
            .query_map([collective], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        debug!(collective, column, count = names.len(), "fetched candidate names");
        Ok(names)
    }

    fn create_record(&self, collective: &str, record: &ParsedRecord, author: &Sender, force: bool) -> Result<Offer> {
        validate(record)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO offers (collective, bank_name, category, percent, cap, expiry, author_id, author_name)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                collective,
                record.bank_name,
                record.category,
                record.percent,
                record.cap,
                record.expiry.format(DATE_FORMAT).to_string(),
                author.id,
                author.name,
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(id, collective, bank = %record.bank_name, category = %record.category, force, "offer saved");
        Self::fetch(&conn, id)?.ok_or_else(|| AdvisorError::NotFound(format!("cashback {id}")))
    }

    fn lookup_record(&self, id: i64) -> Result<Option<Offer>> {
        let conn = self.conn()?;
        Self::fetch(&conn, id)
    }

    fn update_record(&self, id: i64, record: &ParsedRecord) -> Result<Offer> {
        validate(record)?;
        let conn = self.conn()?;
        let changed = conn.execute(
            "UPDATE offers SET bank_name = ?1, category = ?2, percent = ?3, cap = ?4, expiry = ?5 WHERE id = ?6",
            params![
                record.bank_name,
                record.category,
                record.percent,
                record.cap,
                record.expiry.format(DATE_FORMAT).to_string(),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(AdvisorError::NotFound(format!("cashback {id}")));
        }
        info!(id, "offer updated");
        Self::fetch(&conn, id)?.ok_or_else(|| AdvisorError::NotFound(format!("cashback {id}")))
    }

    fn delete_record(&self, id: i64) -> Result<()> {
        let changed = self.conn()?.execute("DELETE FROM offers WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(AdvisorError::NotFound(format!("cashback {id}")));
        }
        info!(id, "offer deleted");
        Ok(())
    }

    fn list_records(&self, collective: &str) -> Result<Vec<Offer>> {
        let sql = format!("SELECT {OFFER_COLUMNS} FROM offers WHERE collective = ?1 ORDER BY id");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let offers = stmt
            .query_map([collective], row_to_offer)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(offers)
    }

    fn user_collective(&self, user: i64) -> Result<Option<String>> {
        Ok(self
            .conn()?
            .query_row("SELECT collective FROM members WHERE user_id = ?1", [user], |row| row.get(0))
            .optional()?)
    }

    fn create_collective(&self, name: &str, creator: &Sender) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let exists: i64 = tx.query_row(
            "SELECT count(*) FROM collectives WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;
        if exists > 0 {
            return Err(AdvisorError::Validation(format!("group \"{name}\" already exists")));
        }
        tx.execute(
            "INSERT INTO collectives (name, created_by) VALUES (?1, ?2)",
            params![name, creator.id],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO members (user_id, user_name, collective) VALUES (?1, ?2, ?3)",
            params![creator.id, creator.name, name],
        )?;
        tx.commit()?;
        info!(name, creator = creator.id, "group created");
        Ok(())
    }

    fn join_collective(&self, user: &Sender, name: &str) -> Result<()> {
        let conn = self.conn()?;
        let exists: i64 = conn.query_row(
            "SELECT count(*) FROM collectives WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(AdvisorError::NotFound(format!("group \"{name}\"")));
        }
        conn.execute(
            "INSERT OR REPLACE INTO members (user_id, user_name, collective) VALUES (?1, ?2, ?3)",
            params![user.id, user.name, name],
        )?;
        info!(name, user = user.id, "joined group");
        Ok(())
    }

    fn collective_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn()?.query_row(
            "SELECT count(*) FROM collectives WHERE name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn group_members(&self, collective: &str) -> Result<Vec<Member>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT user_id, user_name FROM members WHERE collective = ?1 ORDER BY joined_at, user_id",
        )?;
        let members = stmt
            .query_map([collective], |row| {
                Ok(Member {
                    user_id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(members)
    }
}
