//! Shared fixtures for server lifecycle BDD scenarios.

use ddcloud::compute::ImageKind;
use ddcloud::server::keys;
use ddcloud::test_support::{FakeCompute, fast_provider, fast_settings, image};
use ddcloud::{Provider, ProviderError, ProviderSettings, ResourceSnapshot};
use rstest::fixture;
use serde_json::json;
use tokio::runtime::Runtime;

pub const NETWORK_DOMAIN: &str = "nd-1";
pub const DATACENTER: &str = "AU9";

#[derive(Clone, Debug)]
pub enum LifecycleOutcome {
    Success,
    Failure(ProviderError),
}

#[derive(Clone, Debug)]
pub struct ServerContext {
    pub fake: FakeCompute,
    pub settings: ProviderSettings,
    pub data: ResourceSnapshot,
    pub outcome: Option<LifecycleOutcome>,
}

impl ServerContext {
    pub fn provider(&self) -> Provider<FakeCompute> {
        fast_provider(self.fake.clone(), self.settings.clone())
    }

    /// Records the result of a lifecycle operation.
    pub fn record(mut self, result: Result<(), ProviderError>) -> Self {
        self.outcome = Some(match result {
            Ok(()) => LifecycleOutcome::Success,
            Err(err) => LifecycleOutcome::Failure(err),
        });
        self
    }
}

#[fixture]
pub fn server_context() -> ServerContext {
    ServerContext {
        fake: FakeCompute::new(),
        settings: fast_settings(),
        data: ResourceSnapshot::new(),
        outcome: None,
    }
}

pub fn runtime() -> Runtime {
    Runtime::new().unwrap_or_else(|err| panic!("tokio runtime should start: {err}"))
}

pub fn seed_ubuntu_image(fake: &FakeCompute) {
    fake.seed_network_domain(NETWORK_DOMAIN, DATACENTER);
    fake.seed_image(image(
        "img-ubuntu",
        "Ubuntu 14.04 2 CPU",
        ImageKind::Os,
        DATACENTER,
        "UBUNTU1464",
    ));
}

pub fn desired_server(name: &str, image_disk_gb: u32) -> ResourceSnapshot {
    ResourceSnapshot::new()
        .with(keys::NAME, json!(name))
        .with(keys::ADMIN_PASSWORD, json!("s3cret!"))
        .with(keys::NETWORK_DOMAIN_ID, json!(NETWORK_DOMAIN))
        .with(keys::IMAGE, json!({ "name": "Ubuntu 14.04 2 CPU" }))
        .with(keys::NETWORK_ADAPTER, json!([{ "vlan": "vlan-1" }]))
        .with(keys::AUTO_START, json!(true))
        .with(
            keys::DISK,
            json!([{ "scsi_unit_id": 0, "size_gb": image_disk_gb }]),
        )
}

pub fn parse_calls(calls: &str) -> Vec<String> {
    calls
        .split(',')
        .map(str::trim)
        .filter(|call| !call.is_empty())
        .map(str::to_owned)
        .collect()
}
