//! Valores con nombre, simples o múltiples según su declaración.

use std::collections::BTreeMap;

use crate::errors::EffectError;

/// Contrato: un código desconocido devuelve `None` en `get_single` y una
/// lista vacía en `get_multiple`; nunca falla.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterValues {
    singles: BTreeMap<String, Option<String>>,
    multiples: BTreeMap<String, Vec<String>>,
}

impl ParameterValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declara todos los parámetros (vacíos) y luego aplica los valores
    /// configurados en el orden recibido.
    pub fn build<'a, D, V>(declarations: D, values: V) -> Self
        where D: IntoIterator<Item = (&'a str, bool)>,
              V: IntoIterator<Item = (&'a str, Option<String>)>
    {
        let mut out = Self::new();
        for (code, allow_multiple) in declarations {
            out.declare(code, allow_multiple);
        }
        for (code, value) in values {
            out.push(code, value);
        }
        out
    }

    pub fn declare(&mut self, code: &str, allow_multiple: bool) {
        if allow_multiple {
            self.multiples.entry(code.to_string()).or_default();
        } else {
            self.singles.entry(code.to_string()).or_insert(None);
        }
    }

    /// Añade un valor. En un parámetro múltiple se acumula; en uno simple el
    /// último gana. Un código no declarado se trata como simple.
    pub fn push(&mut self, code: &str, value: Option<String>) {
        if let Some(list) = self.multiples.get_mut(code) {
            list.extend(value);
        } else {
            self.singles.insert(code.to_string(), value);
        }
    }

    pub fn get_single(&self, code: &str) -> Option<&str> {
        self.singles.get(code).and_then(|v| v.as_deref())
    }

    pub fn get_multiple(&self, code: &str) -> &[String] {
        self.multiples.get(code).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn require_single(&self, code: &str) -> Result<&str, EffectError> {
        self.get_single(code).ok_or_else(|| EffectError::MissingParameter(code.to_string()))
    }

    pub fn is_declared(&self, code: &str) -> bool {
        self.singles.contains_key(code) || self.multiples.contains_key(code)
    }
}
