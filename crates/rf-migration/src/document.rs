//! Documento portable: grupos con nombre, cada uno una lista de filas
//! planas `columna -> texto`. Es el contrato entre export e import.
//!
//! Las referencias cruzadas dentro del documento usan las claves subrogadas
//! del entorno de origen; el import las traduce a claves de negocio usando
//! sólo el propio documento.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::columns::{DATE_FORMAT, ID, ROLE_ID};
use crate::error::MigrationError;
use crate::hashing::{hash_str, to_canonical_json};

/// Fila plana. Los valores nulos no se emiten; una columna ausente y una
/// vacía significan lo mismo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentRow(BTreeMap<String, String>);

impl DocumentRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl ToString) -> Self {
        self.0.insert(column.to_string(), value.to_string());
        self
    }

    pub fn with_opt<V: ToString>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.with(column, v),
            None => self,
        }
    }

    pub fn with_flag(self, column: &str, value: bool) -> Self {
        self.with(column, if value { "1" } else { "0" })
    }

    pub fn with_date(self, column: &str, value: Option<NaiveDate>) -> Self {
        self.with_opt(column, value.map(|d| d.format(DATE_FORMAT).to_string()))
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str).filter(|v| !v.is_empty())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Fila más el nombre de su grupo, para errores con contexto.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    pub group: &'a str,
    pub row: &'a DocumentRow,
}

impl<'a> RowView<'a> {
    /// Clave subrogada de la fila en el documento (`ID` o `ROLE_ID`).
    pub fn key(&self) -> &'a str {
        self.row.get(ID).or_else(|| self.row.get(ROLE_ID)).unwrap_or("?")
    }

    fn missing(&self, column: &str) -> MigrationError {
        MigrationError::MissingColumn { group: self.group.to_string(),
                                        row: self.key().to_string(),
                                        column: column.to_string() }
    }

    fn invalid(&self, column: &str, value: &str) -> MigrationError {
        MigrationError::InvalidValue { group: self.group.to_string(),
                                       row: self.key().to_string(),
                                       column: column.to_string(),
                                       value: value.to_string() }
    }

    pub fn opt_text(&self, column: &str) -> Option<&'a str> {
        self.row.get(column)
    }

    pub fn text(&self, column: &str) -> Result<&'a str, MigrationError> {
        self.opt_text(column).ok_or_else(|| self.missing(column))
    }

    /// Texto o cadena vacía.
    pub fn string(&self, column: &str) -> String {
        self.opt_text(column).unwrap_or_default().to_string()
    }

    pub fn opt_string(&self, column: &str) -> Option<String> {
        self.opt_text(column).map(str::to_string)
    }

    pub fn opt_int(&self, column: &str) -> Result<Option<i64>, MigrationError> {
        self.opt_text(column)
            .map(|v| v.trim().parse::<i64>().map_err(|_| self.invalid(column, v)))
            .transpose()
    }

    pub fn int(&self, column: &str) -> Result<i64, MigrationError> {
        self.opt_int(column)?.ok_or_else(|| self.missing(column))
    }

    /// `1`/`0` (también `true`/`false`, `Y`/`N`); ausente = `false`.
    pub fn flag(&self, column: &str) -> Result<bool, MigrationError> {
        match self.opt_text(column).map(str::trim) {
            None => Ok(false),
            Some("1") | Some("true") | Some("Y") => Ok(true),
            Some("0") | Some("false") | Some("N") => Ok(false),
            Some(other) => Err(self.invalid(column, other)),
        }
    }

    pub fn date(&self, column: &str) -> Result<Option<NaiveDate>, MigrationError> {
        self.opt_text(column)
            .map(|v| NaiveDate::parse_from_str(v.trim(), DATE_FORMAT).map_err(|_| self.invalid(column, v)))
            .transpose()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortableDocument {
    pub format_version: u32,
    pub groups: IndexMap<String, Vec<DocumentRow>>,
}

impl Default for PortableDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PortableDocument {
    pub const FORMAT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self { format_version: Self::FORMAT_VERSION, groups: IndexMap::new() }
    }

    pub fn push_group(&mut self, group: &str, rows: Vec<DocumentRow>) {
        self.groups.insert(group.to_string(), rows);
    }

    /// Filas de un grupo; un grupo ausente se lee como vacío.
    pub fn group(&self, group: &str) -> &[DocumentRow] {
        self.groups.get(group).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rows<'a>(&'a self, group: &'a str) -> impl Iterator<Item = RowView<'a>> + 'a {
        self.group(group).iter().map(move |row| RowView { group, row })
    }

    /// Primera fila del grupo con `column == key`.
    pub fn find<'a>(&'a self, group: &'a str, column: &str, key: &str) -> Option<RowView<'a>> {
        self.rows(group).find(|r| r.opt_text(column) == Some(key))
    }

    /// Como `find`, pero la ausencia es un error del documento.
    pub fn resolve<'a>(&'a self, group: &'a str, column: &str, key: &str) -> Result<RowView<'a>, MigrationError> {
        self.find(group, column, key)
            .ok_or_else(|| MigrationError::UnresolvedReference { group: group.to_string(),
                                                                 column: column.to_string(),
                                                                 key: key.to_string() })
    }

    /// Valor de `value_column` en la fila del grupo con `column == key`.
    pub fn lookup_value<'a>(&'a self, group: &'a str, column: &str, key: &str, value_column: &str) -> Option<&'a str> {
        self.find(group, column, key).and_then(|r| r.opt_text(value_column))
    }

    pub fn row_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn to_json_pretty(&self) -> Result<String, MigrationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, MigrationError> {
        Self::checked(serde_json::from_str(text)?)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), MigrationError> {
        Ok(serde_json::to_writer_pretty(writer, self)?)
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self, MigrationError> {
        Self::checked(serde_json::from_reader(reader)?)
    }

    fn checked(doc: Self) -> Result<Self, MigrationError> {
        if doc.format_version != Self::FORMAT_VERSION {
            return Err(MigrationError::Malformed(format!("unsupported format_version {}", doc.format_version)));
        }
        Ok(doc)
    }

    /// Huella estable del contenido (JSON canónico + blake3).
    pub fn fingerprint(&self) -> Result<String, MigrationError> {
        let value = serde_json::to_value(self)?;
        Ok(hash_str(&to_canonical_json(&value)))
    }
}
