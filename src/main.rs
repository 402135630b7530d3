//! Demo en memoria: siembra un workflow, lo recorre con el motor y lo
//! migra a un segundo entorno.

use anyhow::{Context, Result};
use chrono::Local;
use log::info;
use rf_core::model::Role;
use rf_core::{DefinitionStore, InMemoryRfStore, RulesEngine, StaticHost};
use rf_migration::{generate_export_document, perform_import, WorkflowSelection};
use rulesflow::demo::{demo_registry, seed_purchase_workflow, PARENT_TABLE, PURCHASE};

fn seed_roles(store: &mut InMemoryRfStore, keys: &[&str]) -> Result<()> {
    for key in keys {
        store.insert(Role { business_key: key.to_string(), name: key.to_lowercase(), ..Default::default() })?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let today = Local::now().date_naive();

    let mut source = InMemoryRfStore::new();
    let ids = seed_purchase_workflow(&mut source)?;
    let request = source.create_object(PARENT_TABLE);

    // El solicitante abre la compra, el aprobador la aprueba.
    let requester = StaticHost::new(ids.role("REQUESTER"), today);
    let mut engine = RulesEngine::new(source, requester, demo_registry());
    engine.start_workflow(PURCHASE, request)?;
    engine.host_mut().role = ids.role("APPROVER");
    let offered: Vec<String> = engine.parent_transition_choices(PURCHASE, request)?
                                     .into_iter()
                                     .map(|t| t.code)
                                     .collect();
    println!("approver may take: {}", offered.join(", "));
    let child = engine.insert_child_workflow(PURCHASE, request, "APPROVE")?;
    println!("purchase {request} approved by child {child}");

    let mut source = engine.into_store();
    let doc = generate_export_document(&mut source, &WorkflowSelection::All)?;
    println!("exported {} rows, fingerprint {}", doc.row_count(), doc.fingerprint()?);

    // Destino sin REQUESTER: sus bindings se omiten con aviso.
    let mut target = InMemoryRfStore::with_id_seed(10_000);
    seed_roles(&mut target, &["APPROVER"])?;
    let report = perform_import(&mut target, &doc).context("import into demo target failed")?;
    info!("import report: {report:?}");
    println!("imported: {} rows inserted, {} role bindings skipped",
             report.inserted.values().sum::<usize>(),
             report.skipped_roles.len());
    Ok(())
}
