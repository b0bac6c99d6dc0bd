use log::{error, info};
use oidc_auth::registry::{redirect_url, RegistryOptions};
use service::{config::Config, logging::Logger};

/// Validates the provider configuration and prints the redirect URL each
/// provider must have registered.
#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config);

    info!(
        "Checking oidc provider configuration for {} [{}]...",
        config.service_domain(),
        config.runtime_env()
    );

    let app_state = match service::AppState::from_config(config) {
        Ok(app_state) => app_state,
        Err(e) => {
            error!("Invalid gateway configuration: {e}");
            std::process::exit(1);
        }
    };

    let options = RegistryOptions {
        service_domain: app_state.config.service_domain().to_string(),
        callback_path: app_state.config.callback_path().to_string(),
        ..RegistryOptions::default()
    };
    for provider_name in app_state.registry_ref().provider_names() {
        match redirect_url(&options, provider_name) {
            Ok(url) => info!("Provider {provider_name}: redirect URL {url}"),
            Err(e) => error!("Provider {provider_name}: {e}"),
        }
    }
}
