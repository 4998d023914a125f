//! COS client creation and shared helpers

use crate::config::CosConfig;
use crate::error::{DataHubError, Result};
use aws_config::Region;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;

/// Create an S3 client configured for the COS endpoint (virtual-hosted style)
pub fn create_cos_client(config: &CosConfig) -> Result<Client> {
    create_cos_client_at(config, &format!("https://{}", config.endpoint_host), false)
}

/// Create an S3 client against an explicit endpoint URL, e.g. an S3-compatible
/// gateway that only serves path-style requests.
pub fn create_cos_client_at(
    config: &CosConfig,
    endpoint_url: &str,
    force_path_style: bool,
) -> Result<Client> {
    config.validate()?;

    let credentials = Credentials::new(
        &config.secret_id,
        &config.secret_key,
        None,
        None,
        "cos-provider",
    );

    let mut builder = S3ConfigBuilder::new()
        .credentials_provider(credentials)
        .region(Region::new(config.region.clone()))
        .endpoint_url(endpoint_url);

    if force_path_style {
        builder = builder.force_path_style(true);
    }

    Ok(Client::from_conf(builder.build()))
}

/// `https://{bucket}.{endpoint_host}/{key}`
pub fn public_object_url(bucket: &str, endpoint_host: &str, key: &str) -> String {
    format!("https://{}.{}/{}", bucket, endpoint_host, key)
}

/// Keep the full SDK error chain; the bare `Display` of `SdkError` is just "service error".
pub(crate) fn sdk_error<E>(e: E) -> DataHubError
where
    E: std::error::Error,
{
    DataHubError::Storage(format!("{}", DisplayErrorContext(&e)))
}
