//! Relational storage backend (SQLite)
//!
//! Tables: `profiles`, `transactions` and the `transaction_tags` relation.
//! A single connection sits behind a mutex; [`TransactionRepository::atomically`]
//! runs its work inside one SQLite transaction.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params, Connection, DatabaseName, ErrorCode, OptionalExtension};
use tracing::debug;

use crate::error::{FinanceError, FinanceResult, ResultExt};
use crate::models::{Profile, ProfileId, Transaction, TransactionId};

use super::repository::{ProfileRepository, TransactionRepository, Work};

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: [Migration; 1] = [Migration {
    version: 1,
    name: "profiles_transactions_tags",
    sql: r#"
CREATE TABLE IF NOT EXISTS profiles (
    id VARCHAR(255) PRIMARY KEY,
    name VARCHAR(255) NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS profiles_name ON profiles (name);

CREATE TABLE IF NOT EXISTS transactions (
    id VARCHAR(255) PRIMARY KEY,
    profile_id VARCHAR(255) NOT NULL REFERENCES profiles (id),
    label VARCHAR(255) NOT NULL,
    amount INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS transactions_profile_id ON transactions (profile_id);
CREATE INDEX IF NOT EXISTS transactions_label ON transactions (label);
CREATE INDEX IF NOT EXISTS transactions_amount ON transactions (amount);

CREATE TABLE IF NOT EXISTS transaction_tags (
    transaction_id VARCHAR(255) NOT NULL REFERENCES transactions (id),
    tag VARCHAR(255) NOT NULL,
    PRIMARY KEY (transaction_id, tag)
);
CREATE INDEX IF NOT EXISTS transaction_tags_tag ON transaction_tags (tag);
"#,
}];

/// SQLite-backed profile and transaction repository
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database at `path` and bring its schema up to date
    pub fn open(path: impl AsRef<Path>) -> FinanceResult<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .context(&format!("could not open sqlite db {}: ", path.display()))?;
        conn.pragma_update(None::<DatabaseName>, "journal_mode", "WAL")
            .context("could not configure sqlite db: ")?;
        Self::from_connection(conn)
    }

    /// Private in-memory database, mostly for tests
    pub fn open_in_memory() -> FinanceResult<Self> {
        let conn = Connection::open_in_memory().context("could not open sqlite db: ")?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> FinanceResult<Self> {
        conn.pragma_update(None::<DatabaseName>, "foreign_keys", "ON")
            .context("could not configure sqlite db: ")?;
        conn.busy_timeout(Duration::from_millis(5000))
            .context("could not configure sqlite db: ")?;
        apply_migrations(&mut conn).context("could not create tables: ")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the connection, returning an error if the mutex is poisoned
    fn lock_conn(&self) -> FinanceResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| FinanceError::Storage("sqlite connection poisoned".to_string()))
    }
}

fn apply_migrations(conn: &mut Connection) -> rusqlite::Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(
        r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);
"#,
    )?;

    for migration in MIGRATIONS {
        let already_applied: Option<i64> = tx
            .query_row(
                "SELECT version FROM schema_migrations WHERE version = ?1",
                params![migration.version],
                |row| row.get(0),
            )
            .optional()?;

        if already_applied.is_some() {
            continue;
        }

        debug!(version = migration.version, name = migration.name, "applying migration");
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
            params![migration.version, migration.name],
        )?;
    }

    tx.commit()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
    )
}

// === Profile queries ===

fn select_profile(conn: &Connection, column: &str, value: &str) -> FinanceResult<Option<Profile>> {
    let query = format!("SELECT id, name FROM profiles WHERE {} = ?1", column);
    conn.query_row(&query, params![value], |row| {
        Ok(Profile {
            id: ProfileId::from(row.get::<_, String>(0)?),
            name: row.get(1)?,
            ..Profile::default()
        })
    })
    .optional()
    .context("could not scan row: ")
}

fn profile_exists(conn: &Connection, id: &ProfileId) -> FinanceResult<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM profiles WHERE id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )
        .optional()
        .context("could not query profiles: ")?;
    Ok(found.is_some())
}

fn insert_profile(conn: &Connection, profile: &Profile) -> FinanceResult<()> {
    match conn.execute(
        "INSERT INTO profiles (id, name) VALUES (?1, ?2)",
        params![profile.id.as_str(), profile.name],
    ) {
        Ok(_) => Ok(()),
        Err(e) if is_constraint_violation(&e) => Err(FinanceError::duplicate_profile(&profile.name)),
        Err(e) => Err(FinanceError::from(e).context("could not insert row: ")),
    }
}

fn update_profile(conn: &Connection, profile: &Profile) -> FinanceResult<()> {
    let changed = match conn.execute(
        "UPDATE profiles SET name = ?1 WHERE id = ?2",
        params![profile.name, profile.id.as_str()],
    ) {
        Ok(changed) => changed,
        Err(e) if is_constraint_violation(&e) => {
            return Err(FinanceError::duplicate_profile(&profile.name))
        }
        Err(e) => return Err(FinanceError::from(e).context("could not update row: ")),
    };
    if changed == 0 {
        return Err(FinanceError::unknown_profile(&profile.id));
    }
    Ok(())
}

// === Transaction queries ===

fn row_to_transaction(row: &rusqlite::Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: TransactionId::from(row.get::<_, String>(0)?),
        profile_id: ProfileId::from(row.get::<_, String>(1)?),
        label: row.get(2)?,
        amount: row.get(3)?,
        tags: Vec::new(),
    })
}

fn select_transaction(conn: &Connection, id: &TransactionId) -> FinanceResult<Transaction> {
    conn.query_row(
        "SELECT id, profile_id, label, amount FROM transactions WHERE id = ?1",
        params![id.as_str()],
        row_to_transaction,
    )
    .optional()
    .context("could not scan row: ")?
    .ok_or_else(|| FinanceError::unknown_transaction(id))
}

fn ensure_transaction_exists(conn: &Connection, id: &TransactionId) -> FinanceResult<()> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM transactions WHERE id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        )
        .optional()
        .context("could not query transactions: ")?;
    match found {
        Some(_) => Ok(()),
        None => Err(FinanceError::unknown_transaction(id)),
    }
}

fn select_transactions_for_profile(
    conn: &Connection,
    profile_id: &ProfileId,
) -> FinanceResult<Vec<Transaction>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, profile_id, label, amount FROM transactions
             WHERE profile_id = ?1 ORDER BY rowid",
        )
        .context("could not query transactions: ")?;
    let rows = stmt
        .query_map(params![profile_id.as_str()], row_to_transaction)
        .context("could not query transactions: ")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("could not scan row: ")
}

fn insert_transaction(conn: &Connection, transaction: &Transaction) -> FinanceResult<()> {
    if !profile_exists(conn, &transaction.profile_id)? {
        return Err(FinanceError::unknown_profile(&transaction.profile_id));
    }
    conn.execute(
        "INSERT INTO transactions (id, profile_id, label, amount) VALUES (?1, ?2, ?3, ?4)",
        params![
            transaction.id.as_str(),
            transaction.profile_id.as_str(),
            transaction.label,
            transaction.amount
        ],
    )
    .context("could not insert row: ")?;
    Ok(())
}

fn update_transaction(conn: &Connection, transaction: &Transaction) -> FinanceResult<()> {
    if !profile_exists(conn, &transaction.profile_id)? {
        return Err(FinanceError::unknown_profile(&transaction.profile_id));
    }
    let changed = conn
        .execute(
            "UPDATE transactions SET profile_id = ?1, label = ?2, amount = ?3 WHERE id = ?4",
            params![
                transaction.profile_id.as_str(),
                transaction.label,
                transaction.amount,
                transaction.id.as_str()
            ],
        )
        .context("could not update row: ")?;
    if changed == 0 {
        return Err(FinanceError::unknown_transaction(&transaction.id));
    }
    Ok(())
}

fn select_tags(conn: &Connection, id: &TransactionId) -> FinanceResult<Vec<String>> {
    ensure_transaction_exists(conn, id)?;
    let mut stmt = conn
        .prepare("SELECT tag FROM transaction_tags WHERE transaction_id = ?1 ORDER BY rowid")
        .context("could not query transaction tags: ")?;
    let rows = stmt
        .query_map(params![id.as_str()], |row| row.get::<_, String>(0))
        .context("could not query transaction tags: ")?;
    rows.collect::<rusqlite::Result<Vec<_>>>()
        .context("could not scan tag: ")
}

fn insert_tags(conn: &Connection, id: &TransactionId, tags: &[String]) -> FinanceResult<()> {
    if tags.is_empty() {
        return Ok(());
    }
    ensure_transaction_exists(conn, id)?;
    let mut stmt = conn
        .prepare("INSERT OR IGNORE INTO transaction_tags (transaction_id, tag) VALUES (?1, ?2)")
        .context("could not prepare add tag stmt: ")?;
    for tag in tags {
        stmt.execute(params![id.as_str(), tag])
            .context("could not exec add tag stmt: ")?;
    }
    Ok(())
}

fn delete_tags(conn: &Connection, id: &TransactionId) -> FinanceResult<()> {
    ensure_transaction_exists(conn, id)?;
    conn.execute(
        "DELETE FROM transaction_tags WHERE transaction_id = ?1",
        params![id.as_str()],
    )
    .context("could not delete transaction tags: ")?;
    Ok(())
}

impl ProfileRepository for SqliteStorage {
    fn load_by_id(&self, id: &ProfileId) -> FinanceResult<Profile> {
        debug!(profile_id = %id, "sqlite: load profile by id");
        let conn = self.lock_conn()?;
        select_profile(&conn, "id", id.as_str())?.ok_or_else(|| FinanceError::unknown_profile(id))
    }

    fn load_by_name(&self, name: &str) -> FinanceResult<Profile> {
        debug!(profile = name, "sqlite: load profile by name");
        let conn = self.lock_conn()?;
        select_profile(&conn, "name", name)?.ok_or_else(|| FinanceError::unknown_profile(name))
    }

    fn create(&self, profile: &Profile) -> FinanceResult<()> {
        debug!(profile_id = %profile.id, profile = %profile.name, "sqlite: create profile");
        insert_profile(&*self.lock_conn()?, profile)
    }

    fn update(&self, profile: &Profile) -> FinanceResult<()> {
        debug!(profile_id = %profile.id, profile = %profile.name, "sqlite: update profile");
        update_profile(&*self.lock_conn()?, profile)
    }
}

impl TransactionRepository for SqliteStorage {
    fn load_by_id(&self, id: &TransactionId) -> FinanceResult<Transaction> {
        debug!(transaction_id = %id, "sqlite: load transaction");
        select_transaction(&*self.lock_conn()?, id)
    }

    fn load_all_for_profile(&self, profile_id: &ProfileId) -> FinanceResult<Vec<Transaction>> {
        debug!(profile_id = %profile_id, "sqlite: load transactions for profile");
        select_transactions_for_profile(&*self.lock_conn()?, profile_id)
    }

    fn create(&self, transaction: &Transaction) -> FinanceResult<()> {
        insert_transaction(&*self.lock_conn()?, transaction)
    }

    fn update(&self, transaction: &Transaction) -> FinanceResult<()> {
        update_transaction(&*self.lock_conn()?, transaction)
    }

    fn load_tags(&self, id: &TransactionId) -> FinanceResult<Vec<String>> {
        select_tags(&*self.lock_conn()?, id)
    }

    fn add_tags(&self, id: &TransactionId, tags: &[String]) -> FinanceResult<()> {
        insert_tags(&*self.lock_conn()?, id, tags)
    }

    fn clear_tags(&self, id: &TransactionId) -> FinanceResult<()> {
        delete_tags(&*self.lock_conn()?, id)
    }

    fn atomically(&self, work: &mut Work<'_>) -> FinanceResult<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction().context("could not begin transaction: ")?;
        work(&SqliteUnitOfWork { conn: &tx })?;
        tx.commit().context("could not commit transaction: ")?;
        debug!("sqlite: unit of work committed");
        Ok(())
    }
}

/// Transaction-scoped view handed to units of work. Dropping the surrounding
/// SQLite transaction without committing rolls every write back.
struct SqliteUnitOfWork<'c> {
    conn: &'c Connection,
}

impl TransactionRepository for SqliteUnitOfWork<'_> {
    fn load_by_id(&self, id: &TransactionId) -> FinanceResult<Transaction> {
        select_transaction(self.conn, id)
    }

    fn load_all_for_profile(&self, profile_id: &ProfileId) -> FinanceResult<Vec<Transaction>> {
        select_transactions_for_profile(self.conn, profile_id)
    }

    fn create(&self, transaction: &Transaction) -> FinanceResult<()> {
        insert_transaction(self.conn, transaction)
    }

    fn update(&self, transaction: &Transaction) -> FinanceResult<()> {
        update_transaction(self.conn, transaction)
    }

    fn load_tags(&self, id: &TransactionId) -> FinanceResult<Vec<String>> {
        select_tags(self.conn, id)
    }

    fn add_tags(&self, id: &TransactionId, tags: &[String]) -> FinanceResult<()> {
        insert_tags(self.conn, id, tags)
    }

    fn clear_tags(&self, id: &TransactionId) -> FinanceResult<()> {
        delete_tags(self.conn, id)
    }

    fn atomically(&self, work: &mut Work<'_>) -> FinanceResult<()> {
        // Already inside a unit of work
        work(self)
    }
}
