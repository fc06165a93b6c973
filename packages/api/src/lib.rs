#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Client for the RMM vendor REST API.
//!
//! Authentication uses the vendor's OAuth2 password grant: the API key and
//! secret are posted as username and password under the fixed public
//! client credentials, and the returned bearer token authorizes every
//! later request. List endpoints are paged; the client follows
//! `pageDetails.nextPageUrl` until it is absent.

use std::time::Duration;

use rmm_audit_api_models::{
    ApiDevice, DeviceAudit, DevicesPage, PageDetails, Site, SitesPage, TokenResponse,
};
use serde::de::DeserializeOwned;

/// Basic-auth user of the token endpoint.
pub const OAUTH_CLIENT_ID: &str = "public-client";

/// Basic-auth password of the token endpoint.
pub const OAUTH_CLIENT_SECRET: &str = "public";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound on followed pages, guarding against a server that keeps
/// returning the same `nextPageUrl`.
const MAX_PAGES: usize = 500;

/// Errors from the RMM API client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not match the expected payload.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}: {body}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// A request was made before [`RmmClient::authenticate`] succeeded.
    #[error("Client is not authenticated")]
    NotAuthenticated,
}

/// Connection settings for one RMM account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    /// Base URL of the regional API host, without a trailing path.
    pub url: String,
    /// API key (used as the OAuth username).
    pub key: String,
    /// API secret (used as the OAuth password).
    pub secret: String,
}

/// Authenticated client for one RMM account.
pub struct RmmClient {
    base_url: String,
    credentials: ApiCredentials,
    client: reqwest::Client,
    token: Option<String>,
}

impl RmmClient {
    /// Creates an unauthenticated client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client cannot be built.
    pub fn new(credentials: ApiCredentials) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: credentials.url.trim_end_matches('/').to_string(),
            credentials,
            client,
            token: None,
        })
    }

    /// Base URL with any trailing slash removed.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a bearer token has been obtained.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/auth/oauth/token", self.base_url)
    }

    #[must_use]
    pub fn site_devices_url(&self, site_uid: &str) -> String {
        format!("{}/api/v2/site/{site_uid}/devices", self.base_url)
    }

    #[must_use]
    pub fn device_audit_url(&self, device_uid: &str) -> String {
        format!("{}/api/v2/audit/device/{device_uid}", self.base_url)
    }

    #[must_use]
    pub fn sites_url(&self) -> String {
        format!("{}/api/v2/account/sites", self.base_url)
    }

    /// Obtains a bearer token with the password grant.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails or the credentials are
    /// rejected.
    pub async fn authenticate(&mut self) -> Result<(), ApiError> {
        let url = self.token_url();
        log::debug!("Requesting access token from {url}");

        let resp = self
            .client
            .post(&url)
            .basic_auth(OAUTH_CLIENT_ID, Some(OAUTH_CLIENT_SECRET))
            .form(&[
                ("grant_type", "password"),
                ("username", self.credentials.key.as_str()),
                ("password", self.credentials.secret.as_str()),
            ])
            .send()
            .await?;

        let token: TokenResponse = decode_response(&url, resp).await?;
        self.token = Some(token.access_token);

        log::info!("Authenticated against {}", self.base_url);
        Ok(())
    }

    /// Fetches every device of a site, following pagination.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status, or decoding failure. A
    /// device missing `patchManagement` fails the whole page.
    pub async fn site_devices(&self, site_uid: &str) -> Result<Vec<ApiDevice>, ApiError> {
        let mut devices = Vec::new();
        let mut next = Some(self.site_devices_url(site_uid));
        let mut pages = 0;

        while let Some(url) = next.take() {
            let page: DevicesPage = self.get_json(&url).await?;
            pages += 1;

            log::debug!("{url}: {} device(s)", page.devices.len());
            devices.extend(page.devices);

            next = next_page(page.page_details.as_ref(), pages);
        }

        log::info!(
            "Fetched {} device(s) for site {site_uid} in {pages} page(s)",
            devices.len()
        );
        Ok(devices)
    }

    /// Fetches the detailed hardware audit of one device.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status, or decoding failure.
    pub async fn device_audit(&self, device_uid: &str) -> Result<DeviceAudit, ApiError> {
        self.get_json(&self.device_audit_url(device_uid)).await
    }

    /// Lists every site of the account, following pagination.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport, status, or decoding failure.
    pub async fn sites(&self) -> Result<Vec<Site>, ApiError> {
        let mut sites = Vec::new();
        let mut next = Some(self.sites_url());
        let mut pages = 0;

        while let Some(url) = next.take() {
            let page: SitesPage = self.get_json(&url).await?;
            pages += 1;
            sites.extend(page.sites);
            next = next_page(page.page_details.as_ref(), pages);
        }

        log::info!("Fetched {} site(s)", sites.len());
        Ok(sites)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        let token = self.token.as_deref().ok_or(ApiError::NotAuthenticated)?;

        log::debug!("GET {url}");
        let resp = self.client.get(url).bearer_auth(token).send().await?;

        decode_response(url, resp).await
    }
}

async fn decode_response<T: DeserializeOwned>(
    url: &str,
    resp: reqwest::Response,
) -> Result<T, ApiError> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(ApiError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            body,
        });
    }

    Ok(serde_json::from_str(&body)?)
}

fn next_page(details: Option<&PageDetails>, pages_read: usize) -> Option<String> {
    let url = details?.next_page_url.as_deref()?.trim();
    if url.is_empty() {
        return None;
    }
    if pages_read >= MAX_PAGES {
        log::warn!("Stopping after {pages_read} pages; {url} not followed");
        return None;
    }
    Some(url.to_string())
}
