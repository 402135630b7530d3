//! rf-persistence
//!
//! Backend Postgres (Diesel) de los stores del Rules Framework, con paridad
//! respecto a `InMemoryRfStore`: mismas semánticas de ids, orden por id y
//! atomicidad.
//!
//! Módulos:
//! - `pg`: pool, proveedor de conexiones y `PgRfStore`.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde .env.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, ConnectionProvider, PgPool, PgRfStore, PoolProvider};
