//! `PgRfStore`: `DefinitionStore` + `TrackedObjectStore` sobre Postgres.
//!
//! El mapeo fila ↔ registro es genérico: se lee con `to_jsonb(t)` y se
//! escribe con `jsonb_populate_record`, usando como lista de columnas las
//! claves serializadas del registro. Sólo se interpolan identificadores
//! validados (nombres de tabla fijos, columnas del modelo y elementos
//! `tabla.columna`); todos los valores viajan como parámetros.

use std::cell::RefCell;

use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{Array, BigInt, Jsonb, Nullable};
use log::{debug, error};
use rf_core::model::element::checked_identifier;
use rf_core::{ChildObject, DefinitionStore, ElementRef, Record, StoreError, TrackedObjectStore};
use serde_json::Value;

use super::{with_retry, ConnectionProvider, PgPooledConnection};
use crate::error::PersistenceError;

#[derive(QueryableByName)]
struct DocRow {
    #[diesel(sql_type = Jsonb)]
    doc: Value,
}

#[derive(QueryableByName)]
struct IdRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
}

#[derive(QueryableByName)]
struct ValueRow {
    #[diesel(sql_type = Nullable<BigInt>)]
    value: Option<i64>,
}

#[derive(QueryableByName)]
struct ChildRow {
    #[diesel(sql_type = BigInt)]
    id: i64,
    #[diesel(sql_type = Nullable<BigInt>)]
    id_parent: Option<i64>,
    #[diesel(sql_type = Nullable<BigInt>)]
    id_base: Option<i64>,
    #[diesel(sql_type = Nullable<BigInt>)]
    transition_id: Option<i64>,
}

/// Columnas no-id de un registro serializado, en el orden de serde.
fn record_columns(value: &Value) -> Result<String, StoreError> {
    let object = value.as_object()
                      .ok_or_else(|| StoreError::Serialization("record did not serialize to an object".into()))?;
    let columns = object.keys()
                        .filter(|k| k.as_str() != "id")
                        .map(|k| checked_identifier(k))
                        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns.join(", "))
}

fn decode_rows<R: Record>(rows: Vec<DocRow>) -> Result<Vec<R>, StoreError> {
    rows.into_iter()
        .map(|row| serde_json::from_value::<R>(row.doc).map_err(StoreError::from))
        .collect()
}

/// Re-valida una referencia de elemento antes de interpolarla.
fn element_parts(element: &ElementRef) -> Result<(&str, &str), StoreError> {
    Ok((checked_identifier(&element.table)?, checked_identifier(&element.column)?))
}

/// Store Postgres sobre una conexión del pool, retenida mientras viva el
/// store. Las lecturas necesitan `&mut` sobre la conexión, de ahí el
/// `RefCell`; el store no es `Sync`.
pub struct PgRfStore<P: ConnectionProvider> {
    provider: P,
    conn: RefCell<PgPooledConnection>,
}

impl<P: ConnectionProvider> PgRfStore<P> {
    /// Toma una conexión del proveedor (con reintentos).
    pub fn connect(provider: P) -> Result<Self, PersistenceError> {
        let conn = with_retry(|| provider.connection())?;
        debug!("PgRfStore: connection checked out");
        Ok(Self { provider, conn: RefCell::new(conn) })
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Ejecuta SQL arbitrario (DDL de tablas del host, fixtures).
    pub fn batch_execute(&self, sql: &str) -> Result<(), StoreError> {
        self.run(|conn| diesel::connection::SimpleConnection::batch_execute(conn, sql))
    }

    /// Crea un objeto raíz (sin padre) en una tabla del host.
    pub fn create_object(&mut self, table: &str) -> Result<i64, StoreError> {
        let table = checked_identifier(table)?;
        let sql = format!("INSERT INTO {table} DEFAULT VALUES RETURNING id");
        let row: IdRow = self.run(|conn| diesel::sql_query(sql).get_result(conn))?;
        Ok(row.id)
    }

    fn run<T, F>(&self, f: F) -> Result<T, StoreError>
        where F: FnOnce(&mut PgConnection) -> QueryResult<T>
    {
        let mut conn = self.conn.borrow_mut();
        f(&mut **conn).map_err(|e| StoreError::from(PersistenceError::from(e)))
    }
}

impl<P: ConnectionProvider> DefinitionStore for PgRfStore<P> {
    fn load<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let table = R::TABLE.table_name();
        let sql = format!("SELECT to_jsonb(t) AS doc FROM {table} t ORDER BY t.id");
        let rows: Vec<DocRow> = self.run(|conn| diesel::sql_query(sql).load(conn))?;
        decode_rows(rows)
    }

    fn find<R: Record>(&self, id: i64) -> Result<Option<R>, StoreError> {
        let table = R::TABLE.table_name();
        let sql = format!("SELECT to_jsonb(t) AS doc FROM {table} t WHERE t.id = $1");
        let row: Option<DocRow> =
            self.run(|conn| diesel::sql_query(sql).bind::<BigInt, _>(id).get_result(conn).optional())?;
        row.map(|r| serde_json::from_value::<R>(r.doc).map_err(StoreError::from)).transpose()
    }

    fn load_by<R: Record>(&self, column: &str, value: i64) -> Result<Vec<R>, StoreError> {
        let table = R::TABLE.table_name();
        let column = checked_identifier(column)?;
        let sql = format!("SELECT to_jsonb(t) AS doc FROM {table} t WHERE t.{column} = $1 ORDER BY t.id");
        let rows: Vec<DocRow> = self.run(|conn| diesel::sql_query(sql).bind::<BigInt, _>(value).load(conn))?;
        decode_rows(rows)
    }

    fn insert<R: Record>(&mut self, row: R) -> Result<i64, StoreError> {
        let table = R::TABLE.table_name();
        let value = serde_json::to_value(&row)?;
        let columns = record_columns(&value)?;
        let sql = format!("INSERT INTO {table} ({columns}) \
                           SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) RETURNING id");
        let inserted: IdRow = self.run(|conn| diesel::sql_query(sql).bind::<Jsonb, _>(value).get_result(conn))?;
        debug!("insert {table} id={}", inserted.id);
        Ok(inserted.id)
    }

    fn update<R: Record>(&mut self, row: &R) -> Result<(), StoreError> {
        let table = R::TABLE.table_name();
        let value = serde_json::to_value(row)?;
        let columns = record_columns(&value)?;
        let sql = format!("UPDATE {table} SET ({columns}) = \
                           (SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1)) WHERE id = $2");
        let id = row.id();
        let touched = self.run(|conn| {
                              diesel::sql_query(sql).bind::<Jsonb, _>(value).bind::<BigInt, _>(id).execute(conn)
                          })?;
        if touched == 0 {
            return Err(StoreError::NotFound { table: table.to_string(), id });
        }
        Ok(())
    }

    fn delete<R: Record>(&mut self, ids: &[i64]) -> Result<usize, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let table = R::TABLE.table_name();
        let sql = format!("DELETE FROM {table} WHERE id = ANY($1)");
        let ids = ids.to_vec();
        let removed = self.run(|conn| diesel::sql_query(sql).bind::<Array<BigInt>, _>(ids).execute(conn))?;
        debug!("delete {table} rows={removed}");
        Ok(removed)
    }

    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
        where F: FnOnce(&mut Self) -> Result<T, E>,
              E: From<StoreError>
    {
        self.run(<AnsiTransactionManager as TransactionManager<PgConnection>>::begin_transaction)?;
        match f(self) {
            Ok(value) => {
                self.run(<AnsiTransactionManager as TransactionManager<PgConnection>>::commit_transaction)?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) =
                    self.run(<AnsiTransactionManager as TransactionManager<PgConnection>>::rollback_transaction)
                {
                    error!("rollback failed: {rollback}");
                }
                Err(err)
            }
        }
    }
}

impl<P: ConnectionProvider> TrackedObjectStore for PgRfStore<P> {
    fn current_state(&self, element: &ElementRef, parent_id: i64) -> Result<Option<i64>, StoreError> {
        let (table, column) = element_parts(element)?;
        let sql = format!("SELECT {column} AS value FROM {table} WHERE id = $1");
        let row: Option<ValueRow> =
            self.run(|conn| diesel::sql_query(sql).bind::<BigInt, _>(parent_id).get_result(conn).optional())?;
        row.map(|r| r.value).ok_or_else(|| StoreError::NotFound { table: table.to_string(), id: parent_id })
    }

    fn write_state(&mut self, element: &ElementRef, parent_id: i64, state_id: Option<i64>) -> Result<(), StoreError> {
        let (table, column) = element_parts(element)?;
        let sql = format!("UPDATE {table} SET {column} = $1 WHERE id = $2");
        let touched = self.run(|conn| {
                              diesel::sql_query(sql).bind::<Nullable<BigInt>, _>(state_id)
                                                    .bind::<BigInt, _>(parent_id)
                                                    .execute(conn)
                          })?;
        if touched == 0 {
            return Err(StoreError::NotFound { table: table.to_string(), id: parent_id });
        }
        Ok(())
    }

    fn child(&self, element: &ElementRef, child_id: i64) -> Result<ChildObject, StoreError> {
        let (table, column) = element_parts(element)?;
        let sql = format!("SELECT id, id_parent, id_base, {column} AS transition_id FROM {table} WHERE id = $1");
        let row: Option<ChildRow> =
            self.run(|conn| diesel::sql_query(sql).bind::<BigInt, _>(child_id).get_result(conn).optional())?;
        let row = row.ok_or_else(|| StoreError::NotFound { table: table.to_string(), id: child_id })?;
        let missing = || StoreError::Backend(format!("{table} row {child_id} is not a child object"));
        Ok(ChildObject { id: row.id,
                         parent_id: row.id_parent.ok_or_else(missing)?,
                         base_id: row.id_base.ok_or_else(missing)?,
                         transition_id: row.transition_id })
    }

    fn insert_child(&mut self,
                    element: &ElementRef,
                    parent_table: &str,
                    parent_id: i64,
                    transition_id: i64)
                    -> Result<i64, StoreError> {
        let (table, column) = element_parts(element)?;
        let parent_table = checked_identifier(parent_table)?;
        let base_sql = format!("SELECT COALESCE(id_base, id) AS value FROM {parent_table} WHERE id = $1");
        let base: Option<ValueRow> =
            self.run(|conn| diesel::sql_query(base_sql).bind::<BigInt, _>(parent_id).get_result(conn).optional())?;
        let base_id = base.and_then(|r| r.value)
                          .ok_or_else(|| StoreError::NotFound { table: parent_table.to_string(), id: parent_id })?;
        let sql = format!("INSERT INTO {table} (id_parent, id_base, {column}) VALUES ($1, $2, $3) RETURNING id");
        let inserted: IdRow = self.run(|conn| {
                                      diesel::sql_query(sql).bind::<BigInt, _>(parent_id)
                                                            .bind::<BigInt, _>(base_id)
                                                            .bind::<BigInt, _>(transition_id)
                                                            .get_result(conn)
                                  })?;
        debug!("insert_child {table} id={} parent={parent_id} base={base_id}", inserted.id);
        Ok(inserted.id)
    }
}
