#![allow(dead_code)]

use std::time::{SystemTime, UNIX_EPOCH};

use once_cell::sync::Lazy;
use rf_persistence::config::DbConfig;
use rf_persistence::pg::{build_pool, PgPool, PgRfStore, PoolProvider};

pub static TEST_POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    let cfg = DbConfig::from_env().ok()?;
    match build_pool(&cfg.url, 1, 2) {
        Ok(p) => Some(p),
        Err(e) => {
            eprintln!("No se pudo construir pool de test: {e}");
            None
        }
    }
});

/// Store sobre el pool de test; `None` si no hay `DATABASE_URL`.
pub fn store() -> Option<PgRfStore<PoolProvider>> {
    let pool = TEST_POOL.as_ref()?;
    Some(PgRfStore::connect(PoolProvider { pool: pool.clone() }).expect("connect"))
}

/// Sufijo único para códigos de negocio, así los tests no chocan entre sí.
pub fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or_default();
    format!("{prefix}_{nanos}")
}
