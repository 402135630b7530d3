//! Implementación de los subcomandos, genérica sobre el store para poder
//! probarla con `InMemoryRfStore`.

use std::io::{Read, Write};

use anyhow::{bail, Context, Result};
use log::info;
use rf_core::{validate_workflow, EffectContext, EffectError, HostContext, RfDao, RfStore, RulesEngine,
              RulesFrameworkParameters};
use rf_migration::{clean, generate_export_document, perform_import, ImportReport, PortableDocument,
                   WorkflowSelection};

/// Script de efecto que sólo registra lo que recibe. El CLI lo registra
/// bajo los `script_object` pedidos con `--echo-script`.
pub fn echo_effect<S>(_ctx: &mut EffectContext<'_, S>, params: &RulesFrameworkParameters<'_>)
                      -> Result<(), EffectError> {
    info!("effect {} on {} via {} (child {}, parent {}): transition={:?} custom={:?}",
          params.effect.code,
          params.defaults.workflow_code(),
          params.defaults.transition_code(),
          params.child_tracking_id(),
          params.parent_tracking_id(),
          params.transition,
          params.custom);
    Ok(())
}

pub fn engine<S: RfStore + 'static, H: HostContext>(store: S, host: H, echo_scripts: &[String]) -> RulesEngine<S, H> {
    echo_scripts.iter()
                .fold(RulesEngine::builder(store, host), |b, object| b.script_fn(object, echo_effect::<S>))
                .build()
}

pub fn export<S: RfStore, W: Write>(store: &mut S, workflow_codes: &[String], out: W) -> Result<usize> {
    let selection = if workflow_codes.is_empty() {
        WorkflowSelection::All
    } else {
        let dao = RfDao::new(&*store);
        let ids = workflow_codes.iter()
                                .map(|code| dao.workflow_by_code(code).map(|w| w.id))
                                .collect::<Result<Vec<_>, _>>()?;
        WorkflowSelection::ids(ids)
    };
    let doc = generate_export_document(store, &selection).context("export failed")?;
    doc.write_to(out)?;
    Ok(doc.row_count())
}

pub fn import<S: RfStore, R: Read>(store: &mut S, input: R) -> Result<ImportReport> {
    let doc = PortableDocument::read_from(input).context("could not read document")?;
    info!("importing document {} ({} rows)", doc.fingerprint()?, doc.row_count());
    Ok(perform_import(store, &doc)?)
}

pub fn write_import_report<W: Write>(report: &ImportReport, mut out: W) -> Result<()> {
    for (label, counts) in [("inserted", &report.inserted),
                            ("updated", &report.updated),
                            ("unchanged", &report.unchanged),
                            ("deleted", &report.deleted)]
    {
        for (group, n) in counts.iter().filter(|(_, n)| **n > 0) {
            writeln!(out, "{label:>9} {n:>5}  {group}")?;
        }
    }
    for skipped in &report.skipped_roles {
        writeln!(out,
                 "  skipped role {} on {}.{}",
                 skipped.role, skipped.workflow, skipped.transition)?;
    }
    if !report.cleaned.is_empty() {
        writeln!(out,
                 "  cleaned {} rows, nulled {} references",
                 report.cleaned.removed_total(),
                 report.cleaned.nulled_total())?;
    }
    Ok(())
}

pub fn run_clean<S: RfStore, W: Write>(store: &mut S, mut out: W) -> Result<()> {
    let report = clean(store)?;
    for (table, n) in &report.removed {
        writeln!(out, "removed {n:>5}  {table}")?;
    }
    for (table, n) in &report.nulled {
        writeln!(out, " nulled {n:>5}  {table}")?;
    }
    Ok(())
}

/// Escribe los problemas encontrados; falla si hay alguno.
pub fn validate<S: RfStore, W: Write>(store: &S, workflow_code: &str, scripts: &[String], mut out: W) -> Result<()> {
    let registered = |object: &str| scripts.iter().any(|s| s == object);
    let check: Option<&dyn Fn(&str) -> bool> = if scripts.is_empty() { None } else { Some(&registered) };
    let issues = validate_workflow(store, workflow_code, check)?;
    for issue in &issues {
        writeln!(out, "{workflow_code}: {issue}")?;
    }
    if !issues.is_empty() {
        bail!("workflow {workflow_code} has {} issue(s)", issues.len());
    }
    writeln!(out, "{workflow_code}: ok")?;
    Ok(())
}

/// Transiciones que el rol actual puede tomar, una por línea
/// (`code\tname`). Por defecto incluye las que no mueven el estado;
/// `state_changing` se queda sólo con las que tienen destino.
pub fn write_transitions<S: RfStore + 'static, H: HostContext, W: Write>(engine: &RulesEngine<S, H>,
                                                                        workflow_code: &str,
                                                                        parent_id: i64,
                                                                        child_id: Option<i64>,
                                                                        state_changing: bool,
                                                                        mut out: W)
                                                                        -> Result<()> {
    let choices = if state_changing {
        engine.parent_transition_choices(workflow_code, parent_id)?
    } else {
        engine.child_transition_choices(workflow_code, parent_id, child_id)?
    };
    for t in &choices {
        writeln!(out, "{}\t{}", t.code, t.name)?;
    }
    Ok(())
}
