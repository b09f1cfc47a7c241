//! Scenario bindings for the server and backup feature files.

use rstest_bdd_macros::scenario;

use super::test_helpers::{ServerContext, server_context};

#[scenario(
    path = "tests/features/server_lifecycle.feature",
    name = "Deploy a server and grow its image disk"
)]
fn scenario_deploy_and_grow_disk(server_context: ServerContext) {
    drop(server_context);
}

#[scenario(
    path = "tests/features/server_lifecycle.feature",
    name = "Retry a deployment while the platform is busy"
)]
fn scenario_retry_busy_deployment(server_context: ServerContext) {
    drop(server_context);
}

#[scenario(
    path = "tests/features/server_lifecycle.feature",
    name = "Refuse a CPU change on a running server without reboot permission"
)]
fn scenario_refuse_cpu_change_without_reboots(server_context: ServerContext) {
    drop(server_context);
}

#[scenario(
    path = "tests/features/server_lifecycle.feature",
    name = "Restart a running server around a CPU change"
)]
fn scenario_restart_around_cpu_change(server_context: ServerContext) {
    drop(server_context);
}

#[scenario(
    path = "tests/features/server_lifecycle.feature",
    name = "Delete a running server"
)]
fn scenario_delete_running_server(server_context: ServerContext) {
    drop(server_context);
}

#[scenario(
    path = "tests/features/server_lifecycle.feature",
    name = "Forget a server deleted outside the provider"
)]
fn scenario_forget_deleted_server(server_context: ServerContext) {
    drop(server_context);
}

#[scenario(
    path = "tests/features/server_backup.feature",
    name = "Enable and disable backup for a server"
)]
fn scenario_enable_and_disable_backup(server_context: ServerContext) {
    drop(server_context);
}

#[scenario(
    path = "tests/features/server_backup.feature",
    name = "Treat a missing backup as deleted"
)]
fn scenario_missing_backup_is_deleted(server_context: ServerContext) {
    drop(server_context);
}
