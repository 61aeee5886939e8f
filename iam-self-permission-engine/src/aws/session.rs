//! Credential resolution
//!
//! Turns a [`ValidatedConfig`] into an SDK configuration bound to the configured
//! region and endpoint, then resolves the caller identity in a separate step.

use crate::aws::sts::{AwsStsClient, CallerIdentity, CallerIdentityApi};
use crate::config::{CredentialSpec, CredentialStrategy, ResolvedSettings, ValidatedConfig};
use crate::error::{SelfPermissionError, SelfPermissionResult};
use aws_config::ecs::EcsCredentialsProvider;
use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_config::meta::credentials::CredentialsProviderChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_sts::config::Credentials;
use log::{debug, info};

const STATIC_PROVIDER_NAME: &str = "iam-self-permission-static";

/// A working AWS session from which service clients are built
#[derive(Debug, Clone)]
pub struct AwsSession {
    sdk_config: SdkConfig,
}

impl AwsSession {
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.sdk_config
    }

    pub fn iam_client(&self) -> aws_sdk_iam::Client {
        aws_sdk_iam::Client::new(&self.sdk_config)
    }

    pub fn sts_client(&self) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(&self.sdk_config)
    }
}

pub struct CredentialResolver;

impl CredentialResolver {
    /// Build a session for the selected credential strategy.
    ///
    /// No request is sent here; credentials are only exercised by the first call.
    pub async fn build_session(config: &ValidatedConfig) -> AwsSession {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region().to_string()));

        // Explicit strategies pin their provider; only the ambient default uses the
        // SDK chain, where environment keys come first.
        loader = match config.strategy() {
            CredentialStrategy::AmbientDefault => loader,
            CredentialStrategy::MachineRole => loader.credentials_provider(
                CredentialsProviderChain::first_try(
                    "EcsContainer",
                    EcsCredentialsProvider::builder().build(),
                )
                .or_else(
                    "Ec2InstanceMetadata",
                    ImdsCredentialsProvider::builder().build(),
                ),
            ),
            CredentialStrategy::Profile(profile) => loader.profile_name(profile).credentials_provider(
                ProfileFileCredentialsProvider::builder()
                    .profile_name(profile)
                    .build(),
            ),
            CredentialStrategy::StaticKeys(keys) => loader.credentials_provider(Credentials::new(
                keys.access_key_id.clone(),
                keys.secret_access_key.clone(),
                keys.session_token.clone(),
                None,
                STATIC_PROVIDER_NAME,
            )),
        };

        if let Some(endpoint) = config.endpoint_override() {
            loader = loader.endpoint_url(endpoint.as_str().trim_end_matches('/'));
        }

        debug!(
            "Building AWS session in {} with {:?}",
            config.region(),
            config.strategy()
        );
        AwsSession {
            sdk_config: loader.load().await,
        }
    }

    /// Ask who the session belongs to and record it alongside the settings.
    pub async fn resolve_identity(
        sts: &dyn CallerIdentityApi,
        config: ValidatedConfig,
    ) -> SelfPermissionResult<(ResolvedSettings, CallerIdentity)> {
        let caller = sts
            .get_caller_identity()
            .await
            .map_err(SelfPermissionError::Authentication)?;
        info!("Resolved caller identity {}", caller.arn);
        Ok((
            ResolvedSettings {
                config,
                caller_identity: caller.arn.clone(),
            },
            caller,
        ))
    }

    /// Validate, build the session and resolve the caller identity.
    pub async fn resolve(spec: &CredentialSpec) -> SelfPermissionResult<(AwsSession, ResolvedSettings)> {
        let config = spec.validate()?;
        let session = Self::build_session(&config).await;
        let sts = AwsStsClient::new(session.sts_client());
        let (settings, _) = Self::resolve_identity(&sts, config).await?;
        Ok((session, settings))
    }
}
