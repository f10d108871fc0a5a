use std::path::Path;
use std::sync::{Arc, Mutex};

use log::{debug, info};
use rusqlite::Connection;

use super::schema;
use crate::config::IN_MEMORY_DATABASE;
use crate::core::error::{MensableError, Result};

/// Shared SQLite connection
///
/// One connection serves the whole process; every caller holds the lock for
/// one statement or one transaction.
#[derive(Clone)]
pub struct Database {
    connection: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the store at `path`, or a private in-memory store for `:memory:`
    pub fn open(path: &str) -> Result<Self> {
        if path == IN_MEMORY_DATABASE {
            return Self::open_in_memory();
        }

        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    MensableError::Config(format!("Failed to create database directory {:?}: {}", parent, e))
                })?;
            }
        }

        info!("Opening database at: {}", path);
        let conn = Connection::open(path)?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        debug!("Creating in-memory database");
        let conn = Connection::open_in_memory()?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` with exclusive access to the connection
    pub fn execute<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self
            .connection
            .lock()
            .map_err(|_| MensableError::LockPoisoned)?;
        f(&mut conn)
    }
}
