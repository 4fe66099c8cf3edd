//! `brickyard run`: execute one component of a mod document.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use brickyard_config::Config;
use brickyard_core::{resolve_mod, BrickRegistry, ResolvedModComponent};
use brickyard_protocols::{AbortSignal, BrickError, FrameLocation, SerializedError, TraceRecord};
use brickyard_runtime::{InitialValues, RunOptions};

use crate::register::{
    build_interpreter, build_registry, load_mod, select_component, TraceStore, CLI_TAB,
};

/// Outcome of a single component run.
pub(crate) struct RunReport {
    pub run_id: Uuid,
    pub result: Result<Value, BrickError>,
    pub trace: Vec<TraceRecord>,
}

impl RunReport {
    /// The document printed on stdout.
    pub(crate) fn to_json(&self, with_trace: bool) -> Value {
        let mut report = match &self.result {
            Ok(output) if !with_trace => return output.clone(),
            Ok(output) => json!({ "output": output }),
            Err(err) => json!({ "error": SerializedError::from(err) }),
        };
        report["runId"] = json!(self.run_id);
        if with_trace {
            report["trace"] = json!(self.trace);
        }
        report
    }
}

pub(crate) async fn cmd_run(
    config: &Config,
    mod_path: &Path,
    component: Option<&str>,
    input: &str,
    with_trace: bool,
    brick_dirs: &[PathBuf],
) -> Result<()> {
    let input: Value = serde_json::from_str(input).context("--input is not valid JSON")?;
    let registry = build_registry(&config.registry, brick_dirs);
    let definition = load_mod(mod_path, config.runtime.default_api_version)?;
    let components = resolve_mod(&definition, &registry)?;
    let component = select_component(&components, component)?;

    let abort = AbortSignal::new();
    let ctrl_c = tokio::spawn(cancel_on_ctrl_c(abort.clone()));
    let report = execute(config, registry, component, input, abort).await;
    ctrl_c.abort();
    let report = report?;

    let failed = report.result.is_err();
    if !failed || with_trace {
        println!("{}", serde_json::to_string_pretty(&report.to_json(with_trace))?);
    }
    match report.result {
        Ok(_) => Ok(()),
        Err(err) => Err(anyhow::Error::new(err).context(format!("Component '{}' failed", component.label))),
    }
}

/// Run `component` and collect its trace.
pub(crate) async fn execute(
    config: &Config,
    registry: BrickRegistry,
    component: &ResolvedModComponent,
    input: Value,
    abort: AbortSignal,
) -> Result<RunReport> {
    let trace = TraceStore::open(&config.trace).await?;
    let interpreter = build_interpreter(config, registry, trace.sink());
    let run_id = Uuid::new_v4();
    info!(
        %run_id,
        mod_id = %component.mod_id,
        component = %component.label,
        api_version = %component.api_version,
        "Running component"
    );

    let options = RunOptions::new(component.api_version)
        .with_run_id(run_id)
        .with_mod_component(component.id)
        .with_abort(abort)
        .with_frame(FrameLocation::top(CLI_TAB));
    let result = interpreter
        .run(&component.pipeline, initial_values(component, input), options)
        .await;

    let trace = trace.records_for_run(run_id).await.unwrap_or_else(|e| {
        warn!(error = %e, "Failed to read trace");
        Vec::new()
    });
    Ok(RunReport {
        run_id,
        result,
        trace,
    })
}

/// Input, option values and integration configs of a component.
///
/// Integrations are either a map from output key to config, or a list of
/// configs that each carry an `outputKey`.
fn initial_values(component: &ResolvedModComponent, input: Value) -> InitialValues {
    let initial = InitialValues::new(input).with_options(component.options.clone());
    match &component.integrations {
        Some(Value::Object(map)) => map.iter().fold(initial, |initial, (key, config)| {
            initial.with_integration(key.clone(), config.clone())
        }),
        Some(Value::Array(items)) => items.iter().fold(initial, |initial, item| {
            match item.get("outputKey").and_then(Value::as_str) {
                Some(key) => initial.with_integration(key, item.clone()),
                None => {
                    warn!("Ignoring integration without an outputKey");
                    initial
                }
            }
        }),
        _ => initial,
    }
}

async fn cancel_on_ctrl_c(abort: AbortSignal) {
    if tokio::signal::ctrl_c().await.is_ok() {
        warn!("Interrupted, cancelling the run");
        abort.abort();
    }
}
