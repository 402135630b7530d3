//! Backend en memoria. Paridad con el backend Postgres: mismas semánticas
//! de ids, orden por id y atomicidad (snapshot + restore).

use std::collections::BTreeMap;

use serde_json::Value;

use super::types::{ChildObject, DefinitionStore, Record, RfTable, TrackedObjectStore};
use crate::errors::StoreError;
use crate::model::ElementRef;

#[derive(Debug, Clone, Default)]
struct TrackedRow {
    id_parent: Option<i64>,
    id_base: Option<i64>,
    columns: BTreeMap<String, Option<i64>>,
}

/// Store en memoria; una única secuencia de ids para todas las tablas.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRfStore {
    tables: BTreeMap<RfTable, BTreeMap<i64, Value>>,
    objects: BTreeMap<String, BTreeMap<i64, TrackedRow>>,
    last_id: i64,
}

impl InMemoryRfStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store cuya secuencia arranca después de `seed`; útil para simular
    /// otro entorno con claves subrogadas distintas.
    pub fn with_id_seed(seed: i64) -> Self {
        Self { last_id: seed, ..Self::default() }
    }

    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    /// Crea un objeto raíz (sin padre) en `table`.
    pub fn create_object(&mut self, table: &str) -> i64 {
        let id = self.next_id();
        self.objects.entry(table.to_string()).or_default().insert(id, TrackedRow::default());
        id
    }

    /// Lee una columna de un objeto rastreado.
    pub fn object_column(&self, table: &str, id: i64, column: &str) -> Option<i64> {
        self.objects.get(table)?.get(&id)?.columns.get(column).copied().flatten()
    }

    /// Hijos de `parent_id` en `table`, por id.
    pub fn children_of(&self, table: &str, parent_id: i64) -> Vec<i64> {
        self.objects
            .get(table)
            .map(|rows| rows.iter().filter(|(_, r)| r.id_parent == Some(parent_id)).map(|(id, _)| *id).collect())
            .unwrap_or_default()
    }

    pub fn row_count(&self, table: RfTable) -> usize {
        self.tables.get(&table).map_or(0, BTreeMap::len)
    }

    fn object(&self, table: &str, id: i64) -> Result<&TrackedRow, StoreError> {
        self.objects
            .get(table)
            .and_then(|rows| rows.get(&id))
            .ok_or_else(|| StoreError::NotFound { table: table.to_string(), id })
    }
}

impl DefinitionStore for InMemoryRfStore {
    fn load<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        match self.tables.get(&R::TABLE) {
            Some(rows) => rows.values().map(|v| serde_json::from_value::<R>(v.clone()).map_err(StoreError::from)).collect(),
            None => Ok(Vec::new()),
        }
    }

    fn insert<R: Record>(&mut self, mut row: R) -> Result<i64, StoreError> {
        let id = self.next_id();
        row.set_id(id);
        let value = serde_json::to_value(&row)?;
        self.tables.entry(R::TABLE).or_default().insert(id, value);
        Ok(id)
    }

    fn update<R: Record>(&mut self, row: &R) -> Result<(), StoreError> {
        let value = serde_json::to_value(row)?;
        let slot = self.tables
                       .get_mut(&R::TABLE)
                       .and_then(|rows| rows.get_mut(&row.id()))
                       .ok_or_else(|| StoreError::NotFound { table: R::TABLE.table_name().to_string(), id: row.id() })?;
        *slot = value;
        Ok(())
    }

    fn delete<R: Record>(&mut self, ids: &[i64]) -> Result<usize, StoreError> {
        let Some(rows) = self.tables.get_mut(&R::TABLE) else {
            return Ok(0);
        };
        Ok(ids.iter().filter(|id| rows.remove(*id).is_some()).count())
    }

    fn atomically<T, E, F>(&mut self, f: F) -> Result<T, E>
        where F: FnOnce(&mut Self) -> Result<T, E>,
              E: From<StoreError>
    {
        let snapshot = self.clone();
        let result = f(self);
        if result.is_err() {
            *self = snapshot;
        }
        result
    }
}

impl TrackedObjectStore for InMemoryRfStore {
    fn current_state(&self, element: &ElementRef, parent_id: i64) -> Result<Option<i64>, StoreError> {
        let row = self.object(&element.table, parent_id)?;
        Ok(row.columns.get(&element.column).copied().flatten())
    }

    fn write_state(&mut self, element: &ElementRef, parent_id: i64, state_id: Option<i64>) -> Result<(), StoreError> {
        let row = self.objects
                      .get_mut(&element.table)
                      .and_then(|rows| rows.get_mut(&parent_id))
                      .ok_or_else(|| StoreError::NotFound { table: element.table.clone(), id: parent_id })?;
        row.columns.insert(element.column.clone(), state_id);
        Ok(())
    }

    fn child(&self, element: &ElementRef, child_id: i64) -> Result<ChildObject, StoreError> {
        let row = self.object(&element.table, child_id)?;
        let missing = || StoreError::Backend(format!("{} row {child_id} is not a child object", element.table));
        Ok(ChildObject { id: child_id,
                         parent_id: row.id_parent.ok_or_else(missing)?,
                         base_id: row.id_base.ok_or_else(missing)?,
                         transition_id: row.columns.get(&element.column).copied().flatten() })
    }

    fn insert_child(&mut self,
                    element: &ElementRef,
                    parent_table: &str,
                    parent_id: i64,
                    transition_id: i64)
                    -> Result<i64, StoreError> {
        let base_id = self.object(parent_table, parent_id)?.id_base.unwrap_or(parent_id);
        let id = self.next_id();
        let mut columns = BTreeMap::new();
        columns.insert(element.column.clone(), Some(transition_id));
        self.objects
            .entry(element.table.clone())
            .or_default()
            .insert(id, TrackedRow { id_parent: Some(parent_id), id_base: Some(base_id), columns });
        Ok(id)
    }
}
