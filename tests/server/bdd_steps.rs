//! BDD step definitions for server and backup lifecycle behaviour.

use ddcloud::server::keys;
use ddcloud::test_support::server;
use ddcloud::{
    ResourceData, ResourceLifecycle, ResourceSnapshot, ServerBackupResource, ServerResource,
    backup,
};
use rstest_bdd_macros::{given, then, when};
use serde_json::json;

use super::test_helpers::{
    DATACENTER, LifecycleOutcome, NETWORK_DOMAIN, ServerContext, desired_server, parse_calls,
    runtime, seed_ubuntu_image,
};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

#[given("a network domain with an Ubuntu image")]
fn network_domain_with_image(server_context: ServerContext) -> ServerContext {
    seed_ubuntu_image(&server_context.fake);
    server_context
}

#[given("a desired server \"{name}\" with a {size} GB image disk")]
fn desired_server_step(mut server_context: ServerContext, name: String, size: u32) -> ServerContext {
    server_context.data = desired_server(name.trim(), size);
    server_context
}

#[given("the platform reports \"{operation}\" busy {times} times")]
fn platform_reports_busy(server_context: ServerContext, operation: String, times: u32) -> ServerContext {
    server_context.fake.push_busy(operation.trim(), times);
    server_context
}

#[given("server reboots are allowed")]
fn reboots_allowed(mut server_context: ServerContext) -> ServerContext {
    server_context.settings.allow_server_reboots = true;
    server_context
}

#[given("a running server \"{server_id}\"")]
fn running_server(mut server_context: ServerContext, server_id: String) -> ServerContext {
    let id = server_id.trim();
    server_context
        .fake
        .seed_server(server(id, NETWORK_DOMAIN, DATACENTER));
    let provider = server_context.provider();
    let mut data = ResourceSnapshot::new().with_id(id);
    runtime()
        .block_on(ServerResource.read(&mut data, &provider))
        .unwrap_or_else(|err| panic!("seeded server should be readable: {err}"));
    data.commit();
    server_context.data = data;
    server_context
}

#[given("the server \"{server_id}\" is deleted out of band")]
fn deleted_out_of_band(server_context: ServerContext, server_id: String) -> ServerContext {
    server_context.fake.remove_server(server_id.trim());
    server_context
}

#[given("a desired backup with service plan \"{plan}\"")]
fn desired_backup(mut server_context: ServerContext, plan: String) -> ServerContext {
    let server_id = server_context.data.id().map(str::to_owned).unwrap_or_default();
    server_context.data = ResourceSnapshot::new()
        .with(backup::keys::SERVER_ID, json!(server_id))
        .with(backup::keys::SERVICE_PLAN, json!(plan.trim()));
    server_context
}

#[given("a tracked backup with service plan \"{plan}\"")]
fn tracked_backup(server_context: ServerContext, plan: String) -> ServerContext {
    let mut context = desired_backup(server_context, plan);
    let server_id = context
        .data
        .get(backup::keys::SERVER_ID)
        .and_then(|value| value.as_str())
        .map(str::to_owned);
    context.data.set_id(server_id);
    context.data.commit();
    context
}

#[when("I create the server")]
fn create_server(mut server_context: ServerContext) -> ServerContext {
    let provider = server_context.provider();
    let result = runtime().block_on(ServerResource.create(&mut server_context.data, &provider));
    server_context.record(result)
}

#[when("I change the CPU count to {count}")]
fn change_cpu_count(mut server_context: ServerContext, count: u32) -> ServerContext {
    server_context.data.stage(keys::CPU_COUNT, json!(count));
    let provider = server_context.provider();
    let result = runtime().block_on(ServerResource.update(&mut server_context.data, &provider));
    server_context.record(result)
}

#[when("I delete the server")]
fn delete_server(mut server_context: ServerContext) -> ServerContext {
    let provider = server_context.provider();
    let result = runtime().block_on(ServerResource.delete(&mut server_context.data, &provider));
    server_context.record(result)
}

#[when("I read the server")]
fn read_server(mut server_context: ServerContext) -> ServerContext {
    let provider = server_context.provider();
    let result = runtime().block_on(ServerResource.read(&mut server_context.data, &provider));
    server_context.record(result)
}

#[when("I create the backup")]
fn create_backup(mut server_context: ServerContext) -> ServerContext {
    let provider = server_context.provider();
    let result =
        runtime().block_on(ServerBackupResource.create(&mut server_context.data, &provider));
    server_context.record(result)
}

#[when("I delete the backup")]
fn delete_backup(mut server_context: ServerContext) -> ServerContext {
    let provider = server_context.provider();
    let result =
        runtime().block_on(ServerBackupResource.delete(&mut server_context.data, &provider));
    server_context.record(result)
}

#[then("the lifecycle operation succeeds")]
fn lifecycle_succeeds(server_context: &ServerContext) -> Result<(), StepError> {
    match server_context.outcome {
        Some(LifecycleOutcome::Success) => Ok(()),
        Some(LifecycleOutcome::Failure(ref err)) => Err(StepError::Assertion(format!(
            "expected success, got failure: {err}"
        ))),
        None => Err(StepError::Assertion(String::from(
            "no lifecycle operation was run",
        ))),
    }
}

#[then("the lifecycle operation fails with a validation error")]
fn lifecycle_fails_validation(server_context: &ServerContext) -> Result<(), StepError> {
    match server_context.outcome {
        Some(LifecycleOutcome::Failure(ref err)) if err.is_validation() => Ok(()),
        Some(LifecycleOutcome::Failure(ref err)) => Err(StepError::Assertion(format!(
            "expected a validation error, got: {err}"
        ))),
        Some(LifecycleOutcome::Success) => Err(StepError::Assertion(String::from(
            "expected failure, got success",
        ))),
        None => Err(StepError::Assertion(String::from(
            "no lifecycle operation was run",
        ))),
    }
}

#[then("the server is tracked")]
fn server_is_tracked(server_context: &ServerContext) -> Result<(), StepError> {
    if server_context.data.id().is_some() {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "server identity should be recorded",
        )))
    }
}

#[then("the server is no longer tracked")]
fn server_is_not_tracked(server_context: &ServerContext) -> Result<(), StepError> {
    identity_cleared(server_context)
}

#[then("the backup is no longer tracked")]
fn backup_is_not_tracked(server_context: &ServerContext) -> Result<(), StepError> {
    identity_cleared(server_context)
}

fn identity_cleared(server_context: &ServerContext) -> Result<(), StepError> {
    match server_context.data.id() {
        None => Ok(()),
        Some(id) => Err(StepError::Assertion(format!(
            "identity should be cleared, still '{id}'"
        ))),
    }
}

#[then("the platform calls were \"{calls}\"")]
fn platform_calls_were(server_context: &ServerContext, calls: String) -> Result<(), StepError> {
    let expected = parse_calls(&calls);
    let actual: Vec<String> = server_context
        .fake
        .operations()
        .into_iter()
        .map(str::to_owned)
        .collect();
    if actual == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected calls {expected:?}, got {actual:?}"
        )))
    }
}

#[then("no platform calls were made")]
fn no_platform_calls(server_context: &ServerContext) -> Result<(), StepError> {
    let actual = server_context.fake.operations();
    if actual.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no calls, got {actual:?}"
        )))
    }
}

#[then("backup for \"{server_id}\" uses service plan \"{plan}\"")]
fn backup_uses_plan(
    server_context: &ServerContext,
    server_id: String,
    plan: String,
) -> Result<(), StepError> {
    let details = server_context
        .fake
        .backup(server_id.trim())
        .ok_or_else(|| StepError::Assertion(format!("backup for '{server_id}' not enabled")))?;
    if details.service_plan == plan.trim() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected plan '{plan}', got '{}'",
            details.service_plan
        )))
    }
}
