//! SQLite-backed record store for users and their measurements.
//!
//! Every operation opens its own connection, runs to completion and drops the
//! connection before returning. Uniqueness of user names is enforced by the
//! schema, not checked ahead of the insert.

use crate::{BmiReading, Category, Error, Measurement, Result, User};
use chrono::{Local, NaiveDateTime, SubsecRound};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};

/// Format of the `date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE
    );

    CREATE TABLE IF NOT EXISTS bmi_records (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        weight REAL NOT NULL,
        height REAL NOT NULL,
        bmi REAL NOT NULL,
        category TEXT NOT NULL,
        date TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_bmi_records_user_date ON bmi_records(user_id, date);
";

/// Source of the timestamps the store stamps onto new measurements
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Durable store of users and their measurements
#[derive(Debug)]
pub struct RecordStore<C: Clock = SystemClock> {
    path: PathBuf,
    clock: C,
}

impl RecordStore<SystemClock> {
    /// Open (or create) the database at `path`, stamping records with local time.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_clock(path, SystemClock)
    }
}

impl<C: Clock> RecordStore<C> {
    /// Open (or create) the database at `path` with a custom clock.
    pub fn with_clock(path: impl Into<PathBuf>, clock: C) -> Result<Self> {
        let store = Self {
            path: path.into(),
            clock,
        };

        if let Some(parent) = store.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = store.connect()?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!("Opened record store at {:?}", store.path);
        Ok(store)
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All known users, ordered by name
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT id, name FROM users ORDER BY name")?;
        let rows = stmt
            .query_map([], UserRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!("Listed {} users", users.len());
        Ok(users)
    }

    /// Add a user. Fails with [`Error::AlreadyExists`] if the name is taken.
    pub fn add_user(&self, name: &str) -> Result<User> {
        if name.trim().is_empty() {
            return Err(Error::InvalidInput("user name must not be empty".into()));
        }

        let conn = self.connect()?;
        match conn.execute("INSERT INTO users (name) VALUES (?1)", params![name]) {
            Ok(_) => {
                let user = User {
                    id: conn.last_insert_rowid(),
                    name: name.to_string(),
                };
                tracing::info!("Added user {:?} (id {})", user.name, user.id);
                Ok(user)
            }
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                tracing::debug!("Rejected duplicate user {:?}", name);
                Err(Error::AlreadyExists(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Save a reading for an existing user, stamped with the store's clock.
    ///
    /// The stamp never precedes the user's previous record, so history order
    /// matches save order even if the wall clock steps back. Nothing is
    /// written when the user is unknown.
    pub fn record_measurement(&self, name: &str, reading: &BmiReading) -> Result<Measurement> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        let user = lookup_user(&tx, name)?.ok_or_else(|| Error::UnknownUser(name.to_string()))?;
        let now = self.clock.now().trunc_subsecs(0);
        let recorded_at = match last_recorded_at(&tx, user.id)? {
            Some(last) if last > now => {
                tracing::warn!("Clock is behind last record ({} < {}), reusing its time", now, last);
                last
            }
            _ => now,
        };

        tx.execute(
            "INSERT INTO bmi_records (user_id, weight, height, bmi, category, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user.id,
                reading.weight_kg,
                reading.height_cm,
                reading.bmi,
                reading.category.as_str(),
                recorded_at.format(DATE_FORMAT).to_string(),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::info!(
            "Recorded BMI {} ({}) for {:?} at {}",
            reading.bmi,
            reading.category,
            name,
            recorded_at
        );

        Ok(Measurement {
            id,
            user_id: user.id,
            weight_kg: reading.weight_kg,
            height_cm: reading.height_cm,
            bmi: reading.bmi,
            category: reading.category,
            recorded_at,
        })
    }

    /// A user's measurements, newest first.
    pub fn get_history(&self, name: &str) -> Result<Vec<Measurement>> {
        self.query_history(name, None)
    }

    /// The most recent measurement for a user, if any
    pub fn latest_measurement(&self, name: &str) -> Result<Option<Measurement>> {
        Ok(self.query_history(name, Some(1))?.into_iter().next())
    }

    fn query_history(&self, name: &str, limit: Option<u32>) -> Result<Vec<Measurement>> {
        let conn = self.connect()?;
        let user = lookup_user(&conn, name)?.ok_or_else(|| Error::UnknownUser(name.to_string()))?;

        // Same-second entries fall back to insertion order
        let mut stmt = conn.prepare(
            "SELECT id, user_id, weight, height, bmi, category, date FROM bmi_records
             WHERE user_id = ?1
             ORDER BY date DESC, id DESC
             LIMIT ?2",
        )?;
        let limit = limit.map(i64::from).unwrap_or(-1);
        let rows = stmt
            .query_map(params![user.id, limit], RecordRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let history = rows
            .into_iter()
            .map(Measurement::try_from)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!("Loaded {} measurements for {:?}", history.len(), name);
        Ok(history)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }
}

fn lookup_user(conn: &Connection, name: &str) -> Result<Option<User>> {
    let row = conn
        .query_row(
            "SELECT id, name FROM users WHERE name = ?1",
            params![name],
            UserRow::from_row,
        )
        .optional()?;
    row.map(User::try_from).transpose()
}

fn last_recorded_at(conn: &Connection, user_id: i64) -> Result<Option<NaiveDateTime>> {
    let last: Option<String> = conn.query_row(
        "SELECT MAX(date) FROM bmi_records WHERE user_id = ?1",
        params![user_id],
        |row| row.get(0),
    )?;
    last.map(|date| parse_date(&date, "latest record")).transpose()
}

fn parse_date(date: &str, what: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| Error::CorruptRecord(format!("{} has invalid date {:?}: {}", what, date, e)))
}

/// Raw `users` row; legacy databases allow a NULL name
struct UserRow {
    id: i64,
    name: Value,
}

impl UserRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            name: text_column(&format!("user {}", row.id), "name", row.name)?,
        })
    }
}

/// Raw `bmi_records` row, columns undecoded
///
/// Legacy databases declare every column nullable, so nothing but the key is
/// trusted until `TryFrom` has checked it.
struct RecordRow {
    id: i64,
    user_id: i64,
    weight: Value,
    height: Value,
    bmi: Value,
    category: Value,
    date: Value,
}

impl RecordRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            weight: row.get(2)?,
            height: row.get(3)?,
            bmi: row.get(4)?,
            category: row.get(5)?,
            date: row.get(6)?,
        })
    }
}

impl TryFrom<RecordRow> for Measurement {
    type Error = Error;

    fn try_from(row: RecordRow) -> Result<Self> {
        let what = format!("record {}", row.id);
        let category: Category = text_column(&what, "category", row.category)?.parse()?;
        let recorded_at = parse_date(&text_column(&what, "date", row.date)?, &what)?;

        Ok(Measurement {
            id: row.id,
            user_id: row.user_id,
            weight_kg: real_column(&what, "weight", row.weight)?,
            height_cm: real_column(&what, "height", row.height)?,
            bmi: real_column(&what, "bmi", row.bmi)?,
            category,
            recorded_at,
        })
    }
}

fn real_column(what: &str, column: &str, value: Value) -> Result<f64> {
    match value {
        Value::Real(v) => Ok(v),
        Value::Integer(v) => Ok(v as f64),
        other => Err(Error::CorruptRecord(format!(
            "{} has non-numeric {}: {:?}",
            what, column, other
        ))),
    }
}

fn text_column(what: &str, column: &str, value: Value) -> Result<String> {
    match value {
        Value::Text(v) => Ok(v),
        other => Err(Error::CorruptRecord(format!(
            "{} has non-text {}: {:?}",
            what, column, other
        ))),
    }
}
