//! Then steps for server verification BDD scenarios.

use super::world::ServerVerificationWorld;
use fixhub::server::{
    domain::{ServerDomainError, VerificationStatus},
    services::ServerServiceError,
};
use rstest_bdd_macros::then;

#[then("the completion is discarded as stale")]
fn completion_is_stale(world: &ServerVerificationWorld) -> Result<(), eyre::Report> {
    let completion = world
        .last_completion
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing completion outcome"))?;
    eyre::ensure!(
        completion.is_stale(),
        "expected stale completion, got {completion:?}"
    );
    Ok(())
}

#[then(r#"the server status is "{status}""#)]
fn server_status_is(world: &ServerVerificationWorld, status: String) -> Result<(), eyre::Report> {
    let expected = VerificationStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let server = world.stored_server()?;
    eyre::ensure!(
        server.status() == expected,
        "expected status {expected}, found {}",
        server.status()
    );
    Ok(())
}

#[then("the server version is {version:u64}")]
fn server_version_is(world: &ServerVerificationWorld, version: u64) -> Result<(), eyre::Report> {
    let server = world.stored_server()?;
    eyre::ensure!(
        server.version() == version,
        "expected version {version}, found {}",
        server.version()
    );
    Ok(())
}

#[then(r#"the server output is "{output}""#)]
fn server_output_is(world: &ServerVerificationWorld, output: String) -> Result<(), eyre::Report> {
    let server = world.stored_server()?;
    eyre::ensure!(
        server.output() == Some(output.as_str()),
        "expected output {output:?}, found {:?}",
        server.output()
    );
    Ok(())
}

#[then("the request fails because the server is already testing")]
fn request_fails_already_testing(world: &ServerVerificationWorld) -> Result<(), eyre::Report> {
    let error = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing error from rejected request"))?;
    eyre::ensure!(
        matches!(error, ServerServiceError::AlreadyTesting(_)),
        "expected AlreadyTesting, got {error:?}"
    );
    Ok(())
}

#[then("the edit fails with an invalid field value")]
fn edit_fails_invalid_value(world: &ServerVerificationWorld) -> Result<(), eyre::Report> {
    let error = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing error from rejected edit"))?;
    eyre::ensure!(
        matches!(
            error,
            ServerServiceError::Domain(ServerDomainError::InvalidFieldValue { .. })
        ),
        "expected InvalidFieldValue, got {error:?}"
    );
    Ok(())
}
