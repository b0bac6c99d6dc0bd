//! Lookup table from provider name to configured provider client.

use std::collections::HashMap;
use std::sync::Arc;

use log::*;
use url::Url;

use crate::client::{Client, GenericClient, ProviderConfig};
use crate::decoder;
use crate::error::{registry_error, Error, RegistryErrorKind};
use crate::http::{HttpClientBuilder, HttpClientConfig};
use crate::pkce;

/// Settings shared by every provider client the registry builds.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Public base URL of this service, e.g. `https://app.example.com`.
    pub service_domain: String,
    /// Path of the OAuth callback route, e.g. `/oauth/callback`.
    pub callback_path: String,
    /// Outbound HTTP settings. Its TLS toggle is OR-ed with each provider's own.
    pub http: HttpClientConfig,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            service_domain: "http://localhost:8080".to_string(),
            callback_path: "/oauth/callback".to_string(),
            http: HttpClientConfig::default(),
        }
    }
}

/// Provider clients keyed by provider name. Read-only once built.
#[derive(Clone)]
pub struct Registry {
    clients: HashMap<String, Arc<dyn Client>>,
}

impl Registry {
    /// Build one [`GenericClient`] per provider configuration.
    ///
    /// Fails when no provider is configured, a provider name repeats, generator
    /// lengths are out of range, an endpoint URL does not parse or the named
    /// decoder is not registered.
    pub fn build(
        configs: &[ProviderConfig],
        options: &RegistryOptions,
        decoders: &decoder::Registry,
    ) -> Result<Self, Error> {
        if configs.is_empty() {
            return Err(registry_error(
                RegistryErrorKind::NoProviders,
                "no oidc providers configured",
            ));
        }

        let mut clients: HashMap<String, Arc<dyn Client>> = HashMap::new();
        for (index, config) in configs.iter().enumerate() {
            if config.provider_name.is_empty() {
                return Err(registry_error(
                    RegistryErrorKind::InvalidProvider,
                    "provider name is empty",
                )
                .with_field("index", index));
            }
            if clients.contains_key(&config.provider_name) {
                return Err(registry_error(
                    RegistryErrorKind::DuplicateProvider,
                    &format!("provider \"{}\" configured twice", config.provider_name),
                )
                .with_field("providerName", &config.provider_name)
                .with_field("index", index));
            }

            let client = build_client(config, options, decoders).map_err(|e| {
                e.with_field("providerName", &config.provider_name)
                    .with_field("index", index)
            })?;
            debug!(
                "Registered oidc provider {} (state: {}, pkce: {})",
                config.provider_name, config.use_state, config.use_pkce
            );
            clients.insert(config.provider_name.clone(), Arc::new(client));
        }

        info!("Built client registry with {} provider(s)", clients.len());
        Ok(Self { clients })
    }

    /// Wrap already constructed clients, keyed by their own provider names.
    pub fn from_clients(clients: Vec<Arc<dyn Client>>) -> Result<Self, Error> {
        if clients.is_empty() {
            return Err(registry_error(
                RegistryErrorKind::NoProviders,
                "no oidc providers configured",
            ));
        }

        let mut map = HashMap::new();
        for client in clients {
            let name = client.provider_name().to_string();
            if map.insert(name.clone(), client).is_some() {
                return Err(registry_error(
                    RegistryErrorKind::DuplicateProvider,
                    &format!("provider \"{}\" configured twice", name),
                )
                .with_field("providerName", name));
            }
        }
        Ok(Self { clients: map })
    }

    /// Look up the client for `provider_name`.
    pub fn get_client(&self, provider_name: &str) -> Result<Arc<dyn Client>, Error> {
        self.clients.get(provider_name).cloned().ok_or_else(|| {
            registry_error(
                RegistryErrorKind::NotFound,
                &format!("no client for provider \"{}\"", provider_name),
            )
            .with_field("providerName", provider_name)
        })
    }

    pub fn provider_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clients.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

/// Registered redirect URL: `<service_domain><callback_path>?providerName=<name>`.
pub fn redirect_url(options: &RegistryOptions, provider_name: &str) -> Result<Url, Error> {
    let base = format!(
        "{}{}",
        options.service_domain.trim_end_matches('/'),
        options.callback_path
    );
    let mut url = Url::parse(&base).map_err(|e| Error::from(e).with_field("url", &base))?;
    url.query_pairs_mut()
        .append_pair("providerName", provider_name);
    Ok(url)
}

fn build_client(
    config: &ProviderConfig,
    options: &RegistryOptions,
    decoders: &decoder::Registry,
) -> Result<GenericClient, Error> {
    let generator = pkce::new_generator(
        &config.pkce_method,
        config.state_length,
        config.pkce_challenge_length,
    )?;
    let decoder = decoders.get(&config.user_info_decoder)?;
    let http_client = HttpClientBuilder::from_config(options.http.clone())
        .with_disable_tls_verify(options.http.disable_tls_verify || config.disable_tls_verify)
        .build()?;
    if config.disable_tls_verify || options.http.disable_tls_verify {
        warn!(
            "TLS certificate verification disabled for provider {}",
            config.provider_name
        );
    }

    GenericClient::new(
        config,
        redirect_url(options, &config.provider_name)?,
        generator,
        decoder,
        http_client,
    )
}
