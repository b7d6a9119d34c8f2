//! When steps for server verification BDD scenarios.

use super::world::{ServerVerificationWorld, run_async};
use fixhub::server::domain::{ConnectionField, ProbeOutcome};
use rstest_bdd_macros::when;

#[when(r#"the "{field}" is changed to "{value}""#)]
fn change_field(
    world: &mut ServerVerificationWorld,
    field: String,
    value: String,
) -> Result<(), eyre::Report> {
    let server_id = world.server_id()?;
    let connection_field = ConnectionField::try_from(field.as_str())?;

    let result = run_async(
        world
            .management
            .edit_connection(server_id, connection_field, &value),
    );
    if let Err(err) = result {
        world.last_error = Some(err);
    }
    Ok(())
}

#[when(r#"the probe completes as "{outcome}" with output "{output}""#)]
fn probe_completes(
    world: &mut ServerVerificationWorld,
    outcome: String,
    output: String,
) -> Result<(), eyre::Report> {
    let probe_outcome = match outcome.as_str() {
        "successful" => ProbeOutcome::Successful,
        "failed" => ProbeOutcome::Failed,
        other => return Err(eyre::eyre!("unknown probe outcome in scenario: {other}")),
    };
    let probe = world
        .probe
        .take()
        .ok_or_else(|| eyre::eyre!("missing started probe in scenario world"))?;

    let completion = run_async(
        world
            .coordinator
            .complete_verification(probe, probe_outcome, output),
    )?;
    world.last_completion = Some(completion);
    Ok(())
}

#[when("another verification probe is requested")]
fn another_probe_requested(world: &mut ServerVerificationWorld) -> Result<(), eyre::Report> {
    let server_id = world.server_id()?;
    match run_async(world.coordinator.begin_verification(server_id)) {
        Ok(probe) => world.probe = Some(probe),
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}
