//! Generic OAuth 2.0 / OIDC provider client.
//!
//! Talks to any provider exposing standard authorization, token and userinfo
//! endpoints. Client credentials travel in the token request body.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use log::*;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use super::{Client, ProviderConfig, Security, UrlParam, UserInfoMethod};
use crate::decoder::Decoder;
use crate::error::{client_error, ClientErrorKind, Error, ErrorKind};
use crate::pkce::Generator;
use crate::token::{Token, TokenResponse};
use crate::user::User;

/// Query parameter carrying the temporary session id in the redirect URL.
pub const REDIRECT_TOKEN_PARAM: &str = "token";

/// Provider client driven entirely by configuration.
pub struct GenericClient {
    provider_name: String,
    client_id: String,
    client_secret: SecretString,
    auth_url: Url,
    token_url: Url,
    user_info_url: Url,
    user_info_method: UserInfoMethod,
    redirect_url: Url,
    security: Security,
    decoder: Arc<dyn Decoder>,
    http_client: reqwest::Client,
}

impl GenericClient {
    /// Create a client from a provider configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - The provider configuration
    /// * `redirect_url` - Registered redirect URL, without the temp session `token`
    /// * `generator` - State/PKCE generator, kept when state or PKCE is enabled
    /// * `decoder` - Translator of the userinfo payload
    /// * `http_client` - HTTP client with timeout and TLS settings applied
    ///
    /// Fails if any configured endpoint URL does not parse.
    pub fn new(
        config: &ProviderConfig,
        redirect_url: Url,
        generator: Arc<dyn Generator>,
        decoder: Arc<dyn Decoder>,
        http_client: reqwest::Client,
    ) -> Result<Self, Error> {
        let auth_url = parse_endpoint(&config.auth_url, "authUrl")?;
        let token_url = parse_endpoint(&config.token_url, "tokenUrl")?;
        let user_info_url = parse_endpoint(&config.user_info_url, "userInfoUrl")?;

        let security = Security {
            supports_state: config.use_state,
            supports_pkce: config.use_pkce,
            generator: (config.use_state || config.use_pkce).then_some(generator),
        };

        Ok(Self {
            provider_name: config.provider_name.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            auth_url,
            token_url,
            user_info_url,
            user_info_method: config.user_info_method,
            redirect_url,
            security,
            decoder,
            http_client,
        })
    }

    /// Registered redirect URL with the temporary session id appended as `token`.
    fn redirect_url_for(&self, temp_session_id: &str) -> Url {
        let mut redirect_url = self.redirect_url.clone();
        redirect_url
            .query_pairs_mut()
            .append_pair(REDIRECT_TOKEN_PARAM, temp_session_id);
        redirect_url
    }

    /// POST a form to the token endpoint and parse the returned token.
    async fn request_token(
        &self,
        form: Vec<(String, String)>,
        failure: ClientErrorKind,
    ) -> Result<TokenResponse, Error> {
        let response = self
            .http_client
            .post(self.token_url.clone())
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                warn!(
                    "Token request to provider {} failed: {:?}",
                    self.provider_name, e
                );
                Error::from(e).with_field("providerName", &self.provider_name)
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await.map_err(|e| {
            Error::from(e).with_field("providerName", &self.provider_name)
        })?;

        if !status.is_success() {
            debug!(
                "Token endpoint of provider {} answered {}: {}",
                self.provider_name, status, body
            );
            return Err(client_error(
                failure,
                &format!("token endpoint returned status {}", status),
            )
            .with_field("providerName", &self.provider_name)
            .with_field("status", status.as_u16()));
        }

        parse_token_body(&content_type, &body)
            .map_err(|e| e.with_field("providerName", &self.provider_name))
    }
}

#[async_trait]
impl Client for GenericClient {
    fn provider_name(&self) -> &str {
        &self.provider_name
    }

    fn build_auth_url(
        &self,
        state: &str,
        scopes: &[String],
        temp_session_id: &str,
        params: &[UrlParam],
    ) -> Result<Url, Error> {
        // Sorted by name so identical inputs always yield the same URL.
        // Extra params go in first so they never replace a core parameter.
        let mut query: BTreeMap<String, String> = params
            .iter()
            .map(|param| (param.key.clone(), param.value.clone()))
            .collect();
        query.insert("client_id".to_string(), self.client_id.clone());
        query.insert(
            "redirect_uri".to_string(),
            self.redirect_url_for(temp_session_id).to_string(),
        );
        query.insert("response_type".to_string(), "code".to_string());
        if !scopes.is_empty() {
            query.insert("scope".to_string(), scopes.join(" "));
        }
        if !state.is_empty() {
            query.insert("state".to_string(), state.to_string());
        }

        let mut auth_url = self.auth_url.clone();
        auth_url.query_pairs_mut().extend_pairs(query.iter());
        Ok(auth_url)
    }

    async fn fetch_token_by_code(
        &self,
        code: &str,
        temp_session_id: &str,
        params: &[UrlParam],
    ) -> Result<Token, Error> {
        let mut form = vec![
            ("grant_type".to_string(), "authorization_code".to_string()),
            ("code".to_string(), code.to_string()),
            (
                "redirect_uri".to_string(),
                self.redirect_url_for(temp_session_id).to_string(),
            ),
            ("client_id".to_string(), self.client_id.clone()),
            (
                "client_secret".to_string(),
                self.client_secret.expose_secret().clone(),
            ),
        ];
        form.extend(
            params
                .iter()
                .map(|param| (param.key.clone(), param.value.clone())),
        );

        debug!("Exchanging authorization code with provider {}", self.provider_name);

        let token = self
            .request_token(form, ClientErrorKind::TokenExchangeFailed)
            .await?
            .into_token()
            .map_err(|e| e.with_field("providerName", &self.provider_name))?;

        info!(
            "Successfully exchanged authorization code with provider {}",
            self.provider_name
        );
        Ok(token)
    }

    async fn fetch_user_by_token(&self, token: &Token) -> Result<User, Error> {
        if !token.is_valid() {
            return Err(client_error(ClientErrorKind::InvalidToken, "token is invalid")
                .with_field("providerName", &self.provider_name));
        }

        let request = match self.user_info_method {
            UserInfoMethod::Get => self.http_client.get(self.user_info_url.clone()),
            UserInfoMethod::Post => self.http_client.post(self.user_info_url.clone()),
        };

        let response = request
            .bearer_auth(token.access_token())
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                warn!(
                    "Userinfo request to provider {} failed: {:?}",
                    self.provider_name, e
                );
                Error::from(e).with_field("providerName", &self.provider_name)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            Error::from(e).with_field("providerName", &self.provider_name)
        })?;

        if status != StatusCode::OK {
            debug!(
                "Userinfo endpoint of provider {} answered {}: {}",
                self.provider_name,
                status,
                String::from_utf8_lossy(&body)
            );
            return Err(client_error(
                ClientErrorKind::UserInfoFailed,
                &format!("invalid response from oidc server: status {}", status),
            )
            .with_field("providerName", &self.provider_name)
            .with_field("status", status.as_u16()));
        }

        self.decoder
            .decode(&body)
            .map_err(|e| e.with_field("providerName", &self.provider_name))
    }

    async fn refresh_token(&self, token: &Token) -> Result<Token, Error> {
        if !token.is_valid() {
            return Err(client_error(ClientErrorKind::InvalidToken, "token is invalid")
                .with_field("providerName", &self.provider_name));
        }
        let refresh_token = token.refresh_token().ok_or_else(|| {
            client_error(ClientErrorKind::MissingRefreshToken, "refresh token is empty")
                .with_field("providerName", &self.provider_name)
        })?;

        let form = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token.to_string()),
            ("client_id".to_string(), self.client_id.clone()),
            (
                "client_secret".to_string(),
                self.client_secret.expose_secret().clone(),
            ),
        ];

        debug!("Refreshing access token with provider {}", self.provider_name);

        let mut response = self
            .request_token(form, ClientErrorKind::TokenRefreshFailed)
            .await?;
        // Providers that do not rotate refresh tokens omit them from the response.
        if response
            .refresh_token
            .as_deref()
            .map_or(true, str::is_empty)
        {
            response.refresh_token = Some(refresh_token.to_string());
        }

        response
            .into_token()
            .map_err(|e| e.with_field("providerName", &self.provider_name))
    }

    fn security(&self) -> Security {
        self.security.clone()
    }
}

fn parse_endpoint(value: &str, name: &str) -> Result<Url, Error> {
    Url::parse(value).map_err(|e| {
        Error::from(e)
            .with_field("endpoint", name)
            .with_field("url", value)
    })
}

/// Parse a token endpoint body, JSON unless the provider answered form-encoded.
fn parse_token_body(content_type: &str, body: &str) -> Result<TokenResponse, Error> {
    let is_form = content_type.starts_with("application/x-www-form-urlencoded")
        || content_type.starts_with("text/plain");

    if is_form {
        let mut response = TokenResponse {
            access_token: String::new(),
            refresh_token: None,
        };
        for (key, value) in url::form_urlencoded::parse(body.as_bytes()) {
            match key.as_ref() {
                "access_token" => response.access_token = value.into_owned(),
                "refresh_token" => response.refresh_token = Some(value.into_owned()),
                _ => {}
            }
        }
        return Ok(response);
    }

    serde_json::from_str(body).map_err(|e| Error {
        source: Some(Box::new(e)),
        error_kind: ErrorKind::Client(ClientErrorKind::InvalidResponse),
        fields: Vec::new(),
    })
}
