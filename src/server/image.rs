//! Image resolution and the administrator-password policy.

use tracing::debug;

use crate::compute::{ComputeApi, Image, ImageKind};
use crate::error::ProviderError;
use crate::models::{ConfiguredImage, ImageSelectorKind};
use crate::provider::Provider;

/// Customer-image OS identifiers that need an initial administrator
/// password, checked in order.
const PASSWORD_REQUIRED_OS_PREFIXES: [(&str, &str); 3] = [
    ("WIN2008", "Windows Server 2008"),
    ("WIN2012R2", "Windows Server 2012 R2"),
    ("WIN2012", "Windows Server 2012"),
];

/// Resolves the configured image against the datacenter's catalogues.
///
/// With [`ImageSelectorKind::Auto`], OS images are searched first and
/// customer images only when no OS image matches.
///
/// # Errors
///
/// Returns [`ProviderError::ImageNotFound`] when nothing matches,
/// [`ProviderError::AmbiguousImage`] when a catalogue holds several
/// matches, and API errors from the listing calls.
pub async fn resolve_server_image<A: ComputeApi>(
    provider: &Provider<A>,
    configured: &ConfiguredImage,
    datacenter_id: &str,
) -> Result<Image, ProviderError> {
    let search_order: &[ImageKind] = match configured.kind {
        ImageSelectorKind::Auto => &[ImageKind::Os, ImageKind::Customer],
        ImageSelectorKind::Os => &[ImageKind::Os],
        ImageSelectorKind::Customer => &[ImageKind::Customer],
    };

    for kind in search_order {
        let candidates = list_images(provider, *kind, datacenter_id).await?;
        if let Some(image) = select_image(configured, candidates, datacenter_id)? {
            debug!(
                image_id = %image.id,
                image_name = %image.name,
                kind = kind.name(),
                datacenter_id,
                "resolved server image"
            );
            return Ok(image);
        }
    }

    Err(ProviderError::ImageNotFound {
        kind: match configured.kind {
            ImageSelectorKind::Auto => "OS or customer",
            ImageSelectorKind::Os => "OS",
            ImageSelectorKind::Customer => "customer",
        },
        selector: configured.describe(),
        datacenter_id: datacenter_id.to_owned(),
    })
}

async fn list_images<A: ComputeApi>(
    provider: &Provider<A>,
    kind: ImageKind,
    datacenter_id: &str,
) -> Result<Vec<Image>, ProviderError> {
    let description = format!("List {} images in datacenter '{datacenter_id}'", kind.name());
    match kind {
        ImageKind::Os => {
            provider
                .retry_action(&description, |api| api.list_os_images(datacenter_id))
                .await
        }
        ImageKind::Customer => {
            provider
                .retry_action(&description, |api| api.list_customer_images(datacenter_id))
                .await
        }
    }
}

fn select_image(
    configured: &ConfiguredImage,
    candidates: Vec<Image>,
    datacenter_id: &str,
) -> Result<Option<Image>, ProviderError> {
    let mut matches: Vec<Image> = candidates
        .into_iter()
        .filter(|image| configured.matches(image))
        .collect();
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        count => Err(ProviderError::AmbiguousImage {
            selector: configured.describe(),
            datacenter_id: datacenter_id.to_owned(),
            count,
        }),
    }
}

/// Checks that an administrator password is supplied where the image
/// needs one.
///
/// OS images always need one. Customer images need one when their OS
/// identifier starts with `WIN2008`, `WIN2012R2` or `WIN2012`.
///
/// # Errors
///
/// Returns [`ProviderError::MissingAdminPassword`] when a required password
/// is empty.
pub fn validate_admin_password(admin_password: &str, image: &Image) -> Result<(), ProviderError> {
    if !admin_password.is_empty() {
        return Ok(());
    }

    match image.kind {
        ImageKind::Os => Err(ProviderError::MissingAdminPassword(String::from(
            "an OS image",
        ))),
        ImageKind::Customer => PASSWORD_REQUIRED_OS_PREFIXES
            .iter()
            .find(|(prefix, _)| image.os.id.starts_with(prefix))
            .map_or(Ok(()), |(_, release)| {
                Err(ProviderError::MissingAdminPassword(format!(
                    "a customer image for {release}"
                )))
            }),
    }
}
