use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use waypost_engine::EngineConfig;
use waypost_model::{Fence, FenceRepository, User, UserRepository};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Key under which the engine configuration is kept in the settings table.
const ENGINE_CONFIG_KEY: &str = "engine";

/// SQLite-backed persistence.
///
/// The engine itself never touches this; the embedding host hydrates the
/// user store and fence registry at startup and writes snapshots back on
/// whatever cadence it chooses.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                user_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS fences (
                name TEXT PRIMARY KEY,
                lat REAL NOT NULL,
                lon REAL NOT NULL,
                radius REAL NOT NULL,
                timestamp INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_users_updated_at ON users(updated_at);
            "#,
        )?;
        Ok(())
    }

    /// Stored engine configuration, if a host ever saved one.
    pub fn load_config(&self) -> Result<Option<EngineConfig>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let json: Option<String> = conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                [ENGINE_CONFIG_KEY],
                |row| row.get(0),
            )
            .map(Some)
            .or_else(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => Ok(None),
                other => Err(other),
            })?;
        match json {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save_config(&self, config: &EngineConfig) -> Result<()> {
        let json = serde_json::to_string(config)?;
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value) VALUES (?1, ?2)",
            (ENGINE_CONFIG_KEY, json),
        )?;
        Ok(())
    }
}

impl UserRepository for Database {
    type Error = StorageError;

    fn save(&self, user: &User) -> Result<()> {
        let json = serde_json::to_string(user)?;
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO users (user_id, user_json, updated_at) VALUES (?1, ?2, ?3)",
            (
                &user.user_id,
                json,
                chrono::Utc::now().timestamp(),
            ),
        )?;
        Ok(())
    }

    fn get(&self, user_id: &str) -> Result<User> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let json: String = conn
            .query_row(
                "SELECT user_json FROM users WHERE user_id = ?1",
                [user_id],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    StorageError::NotFound(format!("user {user_id}"))
                }
                other => StorageError::DatabaseError(other),
            })?;
        Ok(serde_json::from_str(&json)?)
    }

    fn list(&self) -> Result<Vec<User>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let mut stmt = conn.prepare("SELECT user_json FROM users ORDER BY user_id")?;
        let rows = stmt.query_map([], |row| {
            let json: String = row.get(0)?;
            Ok(json)
        })?;

        let mut users = Vec::new();
        for row in rows {
            let json = row?;
            users.push(serde_json::from_str(&json)?);
        }
        Ok(users)
    }

    fn purge(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute("DELETE FROM users", [])?;
        Ok(())
    }
}

impl FenceRepository for Database {
    type Error = StorageError;

    fn save(&self, fence: &Fence) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO fences (name, lat, lon, radius, timestamp) VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &fence.name,
                fence.lat,
                fence.lon,
                fence.radius,
                fence.timestamp,
            ),
        )?;
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Fence> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        conn.query_row(
            "SELECT name, lat, lon, radius, timestamp FROM fences WHERE name = ?1",
            [name],
            |row| {
                Ok(Fence {
                    name: row.get(0)?,
                    lat: row.get(1)?,
                    lon: row.get(2)?,
                    radius: row.get(3)?,
                    timestamp: row.get(4)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::NotFound(format!("fence {name}")),
            other => StorageError::DatabaseError(other),
        })
    }

    fn list(&self) -> Result<Vec<Fence>> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let mut stmt =
            conn.prepare("SELECT name, lat, lon, radius, timestamp FROM fences ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Fence {
                name: row.get(0)?,
                lat: row.get(1)?,
                lon: row.get(2)?,
                radius: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?;

        let mut fences = Vec::new();
        for row in rows {
            fences.push(row?);
        }
        Ok(fences)
    }

    fn delete(&self, name: &str) -> Result<()> {
        let conn = self.conn.lock().expect("database mutex poisoned");
        let affected = conn.execute("DELETE FROM fences WHERE name = ?1", [name])?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("fence {name}")));
        }
        Ok(())
    }
}
