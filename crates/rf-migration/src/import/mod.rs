//! `perform_import`: reconcilia un entorno destino con un documento
//! portable, por claves de negocio.
//!
//! Fases, en este orden y dentro de una sola unidad atómica del store:
//! clean, borrado de huérfanos, clean, upsert de entidades, reemplazo de
//! bindings y valores, clean final. Cualquier error aborta todo y sale
//! envuelto en `MigrationError::Phase`.

mod bindings;
mod orphans;
mod plan;
mod upsert;

use std::collections::BTreeMap;

use log::{debug, info};
use rf_core::{DefinitionStore, Record};

use crate::clean::{clean, CleanReport};
use crate::document::PortableDocument;
use crate::error::{ImportPhase, MigrationError};

/// Binding de rol omitido porque el rol no existe en el destino.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRole {
    pub workflow: String,
    pub transition: String,
    pub role: String,
}

/// Conteos por grupo del documento.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub inserted: BTreeMap<&'static str, usize>,
    pub updated: BTreeMap<&'static str, usize>,
    pub unchanged: BTreeMap<&'static str, usize>,
    pub deleted: BTreeMap<&'static str, usize>,
    pub skipped_roles: Vec<SkippedRole>,
    pub cleaned: CleanReport,
}

fn count(map: &BTreeMap<&'static str, usize>, group: &str) -> usize {
    map.get(group).copied().unwrap_or_default()
}

impl ImportReport {
    pub fn inserted_in(&self, group: &str) -> usize {
        count(&self.inserted, group)
    }

    pub fn updated_in(&self, group: &str) -> usize {
        count(&self.updated, group)
    }

    pub fn unchanged_in(&self, group: &str) -> usize {
        count(&self.unchanged, group)
    }

    pub fn deleted_in(&self, group: &str) -> usize {
        count(&self.deleted, group)
    }

    fn bump(map: &mut BTreeMap<&'static str, usize>, group: &'static str, n: usize) {
        if n > 0 {
            *map.entry(group).or_default() += n;
        }
    }
}

fn in_phase<T, F>(phase: ImportPhase, f: F) -> Result<T, MigrationError>
    where F: FnOnce() -> Result<T, MigrationError>
{
    debug!("import: {phase}");
    f().map_err(|source| MigrationError::Phase { phase, source: Box::new(source) })
}

/// Fila única de `R` que cumple `pred`; `None` si no hay ninguna.
pub(crate) fn unique_by<S, R, F>(store: &S, entity: &'static str, code: &str, pred: F) -> Result<Option<R>, MigrationError>
    where S: DefinitionStore,
          R: Record,
          F: Fn(&R) -> bool
{
    let mut rows = store.load_where::<R, F>(pred)?;
    match rows.len() {
        0 | 1 => Ok(rows.pop()),
        found => Err(MigrationError::NotUnique { entity, code: code.to_string(), found }),
    }
}

/// Borra las filas de `R` que cumplen `pred` y lo anota en `deleted`.
pub(crate) fn delete_where<S, R, F>(store: &mut S,
                                    report: &mut ImportReport,
                                    group: &'static str,
                                    pred: F)
                                    -> Result<usize, MigrationError>
    where S: DefinitionStore,
          R: Record,
          F: Fn(&R) -> bool
{
    let ids: Vec<i64> = store.load_where::<R, F>(pred)?.iter().map(|r| r.id()).collect();
    if ids.is_empty() {
        return Ok(0);
    }
    let n = store.delete::<R>(&ids)?;
    ImportReport::bump(&mut report.deleted, group, n);
    Ok(n)
}

fn apply<S: DefinitionStore>(store: &mut S, plan: &plan::ImportPlan) -> Result<ImportReport, MigrationError> {
    let mut report = ImportReport::default();

    let cleaned = in_phase(ImportPhase::Clean, || Ok(clean(store)?))?;
    report.cleaned.absorb(cleaned);

    in_phase(ImportPhase::DeleteOrphans, || orphans::delete_orphans(store, plan, &mut report))?;

    let cleaned = in_phase(ImportPhase::CleanAfterDelete, || Ok(clean(store)?))?;
    report.cleaned.absorb(cleaned);

    let targets = in_phase(ImportPhase::UpsertEntities, || upsert::upsert_entities(store, plan, &mut report))?;

    in_phase(ImportPhase::UpsertBindings, || bindings::replace_bindings(store, plan, &targets, &mut report))?;

    let cleaned = in_phase(ImportPhase::FinalClean, || Ok(clean(store)?))?;
    report.cleaned.absorb(cleaned);

    Ok(report)
}

/// Importa `doc` en `store`. Si algo falla no queda nada escrito.
pub fn perform_import<S: DefinitionStore>(store: &mut S, doc: &PortableDocument) -> Result<ImportReport, MigrationError> {
    let plan = in_phase(ImportPhase::ReadDocument, || plan::read_plan(doc))?;
    let report = store.atomically(|store| apply(store, &plan))?;
    info!("import: {} workflow(s); inserted {}, updated {}, unchanged {}, deleted {}, skipped {} role binding(s)",
          plan.workflows.len(),
          report.inserted.values().sum::<usize>(),
          report.updated.values().sum::<usize>(),
          report.unchanged.values().sum::<usize>(),
          report.deleted.values().sum::<usize>(),
          report.skipped_roles.len());
    Ok(report)
}
