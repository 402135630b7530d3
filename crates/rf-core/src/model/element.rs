//! Referencias `tabla.columna` a los objetos rastreados del host.

use std::fmt;

use crate::errors::{RfError, StoreError};

/// Columna concreta de una tabla del host. Ambos identificadores se validan
/// como identificadores SQL simples; son los únicos que se interpolan en SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    pub table: String,
    pub column: String,
}

impl ElementRef {
    pub fn new(table: &str, column: &str) -> Result<Self, StoreError> {
        Ok(Self { table: checked_identifier(table)?.to_string(), column: checked_identifier(column)?.to_string() })
    }

    /// Parsea `tabla.columna`.
    pub fn parse(raw: &str) -> Result<Self, RfError> {
        let (table, column) = raw.trim().split_once('.').ok_or_else(|| RfError::InvalidElement(raw.to_string()))?;
        Self::new(table, column).map_err(|_| RfError::InvalidElement(raw.to_string()))
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Acepta `[A-Za-z_][A-Za-z0-9_]*`.
pub fn checked_identifier(ident: &str) -> Result<&str, StoreError> {
    let mut chars = ident.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(ident)
    } else {
        Err(StoreError::InvalidIdentifier(ident.to_string()))
    }
}
