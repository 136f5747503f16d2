//! redb-based document storage
//!
//! Each aggregate (cart, order ledger, queue book) is one JSON document. Every
//! mutation runs inside a single redb write transaction, and redb admits one
//! writer at a time, so read-modify-write of a document is atomic. A
//! transaction may touch several documents, which is how checkout appends the
//! order, clears the vendor group and issues the ticket together.
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `documents` | document key | JSON bytes | Aggregate documents |
//!
//! # Fallback policy
//!
//! A document that is missing or fails to decode is read as its `Default`
//! value and a warning is logged. Availability wins over strict durability:
//! a corrupt cart becomes an empty cart instead of a crash.

use redb::{
    Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Table for aggregate documents: key = document key, value = JSON bytes
const DOCUMENTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");

/// Customer cart document
pub const CART_KEY: &str = "cart";
/// Order ledger document (newest first)
pub const ORDERS_KEY: &str = "orders";
/// Queue book document (all stall queues)
pub const QUEUE_KEY: &str = "queue";

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Document storage backed by redb
#[derive(Clone)]
pub struct EngineStorage {
    db: Arc<Database>,
}

impl std::fmt::Debug for EngineStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineStorage").finish_non_exhaustive()
    }
}

impl EngineStorage {
    /// Open or create the database at the given path
    ///
    /// redb commits are durable as soon as `commit()` returns and the file is
    /// always left in a consistent state (copy-on-write with atomic swap).
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an in-memory database (tests, demos)
    pub fn open_in_memory() -> StorageResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> StorageResult<Self> {
        // Create all tables if they don't exist
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DOCUMENTS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    // ========== Reads ==========

    /// Read a document, falling back to `T::default()` when missing or corrupt
    pub fn load<T>(&self, key: &str) -> StorageResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        let doc = match table.get(key)? {
            Some(value) => decode_or_default(key, value.value()),
            None => T::default(),
        };
        Ok(doc)
    }

    /// Read a document, swallowing storage errors (logged) into the default
    pub fn load_or_default<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        self.load(key).unwrap_or_else(|e| {
            tracing::error!(key, error = %e, "Failed to read document, using default");
            T::default()
        })
    }

    // ========== Writes ==========

    /// Run `f` inside one write transaction; commits on `Ok`, aborts on `Err`
    pub fn transact<R>(
        &self,
        f: impl FnOnce(&DocumentTxn<'_>) -> StorageResult<R>,
    ) -> StorageResult<R> {
        let txn = self.db.begin_write()?;
        let result = f(&DocumentTxn { txn: &txn });
        match result {
            Ok(value) => {
                txn.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(abort_err) = txn.abort() {
                    tracing::error!(error = %abort_err, "Failed to abort write transaction");
                }
                Err(e)
            }
        }
    }

    /// Atomic read-modify-write of one document
    ///
    /// Nothing is written when `f` leaves the document unchanged.
    pub fn update<T, R>(&self, key: &str, f: impl FnOnce(&mut T) -> R) -> StorageResult<R>
    where
        T: Serialize + DeserializeOwned + Default,
    {
        self.transact(|txn| {
            let mut doc: T = txn.load(key)?;
            let before = serde_json::to_vec(&doc)?;
            let out = f(&mut doc);
            let after = serde_json::to_vec(&doc)?;
            if after != before {
                txn.put(key, &after)?;
            }
            Ok(out)
        })
    }

    /// Overwrite a document with raw bytes (corruption tests)
    #[cfg(test)]
    pub(crate) fn put_raw(&self, key: &str, bytes: &[u8]) -> StorageResult<()> {
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(DOCUMENTS_TABLE)?;
            table.insert(key, bytes)?;
        }
        txn.commit()?;
        Ok(())
    }

    /// Stored bytes of a document, as written
    #[cfg(test)]
    pub(crate) fn get_raw(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DOCUMENTS_TABLE)?;
        Ok(table.get(key)?.map(|v| v.value().to_vec()))
    }
}

/// Documents visible inside one write transaction
pub struct DocumentTxn<'a> {
    txn: &'a WriteTransaction,
}

impl DocumentTxn<'_> {
    /// Read a document, falling back to `T::default()` when missing or corrupt
    pub fn load<T>(&self, key: &str) -> StorageResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let table = self.txn.open_table(DOCUMENTS_TABLE)?;
        let doc = match table.get(key)? {
            Some(value) => decode_or_default(key, value.value()),
            None => T::default(),
        };
        Ok(doc)
    }

    /// Replace a document
    pub fn save<T: Serialize>(&self, key: &str, doc: &T) -> StorageResult<()> {
        let value = serde_json::to_vec(doc)?;
        self.put(key, &value)
    }

    fn put(&self, key: &str, value: &[u8]) -> StorageResult<()> {
        let mut table = self.txn.open_table(DOCUMENTS_TABLE)?;
        table.insert(key, value)?;
        Ok(())
    }
}

fn decode_or_default<T>(key: &str, bytes: &[u8]) -> T
where
    T: DeserializeOwned + Default,
{
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "Corrupt document, falling back to default");
        T::default()
    })
}
