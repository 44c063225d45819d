//! Location of the external generate/edit service.

use crate::error::{GenFormError, Result};
use crate::image::Route;
use reqwest::Url;
use std::time::Duration;

/// Environment variable consulted when no base URL is given explicitly.
pub const SERVICE_URL_ENV: &str = "GENFORM_SERVICE_URL";

/// Base URL used when neither the builder nor the environment supplies one.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";

const DEFAULT_GENERATE_ROUTE: &str = "generate-image";
const DEFAULT_EDIT_ROUTE: &str = "edit-image";
const DEFAULT_HEALTH_ROUTE: &str = "health";

/// Resolved service endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    base_url: Url,
    generate_url: Url,
    edit_url: Url,
    health_url: Url,
    timeout: Option<Duration>,
}

impl ServiceConfig {
    /// Creates a new `ServiceConfigBuilder`.
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::new()
    }

    /// Resolves a config purely from the environment and defaults.
    pub fn from_env() -> Result<Self> {
        Self::builder().build()
    }

    /// The base address all routes are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoint for the given route.
    pub fn route_url(&self, route: Route) -> &Url {
        match route {
            Route::Generate => &self.generate_url,
            Route::Edit => &self.edit_url,
        }
    }

    /// Endpoint used by health checks.
    pub fn health_url(&self) -> &Url {
        &self.health_url
    }

    /// Optional whole-request timeout. `None` leaves it to the transport.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug, Clone)]
pub struct ServiceConfigBuilder {
    base_url: Option<String>,
    generate_route: String,
    edit_route: String,
    health_route: String,
    timeout: Option<Duration>,
}

impl Default for ServiceConfigBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            generate_route: DEFAULT_GENERATE_ROUTE.to_string(),
            edit_route: DEFAULT_EDIT_ROUTE.to_string(),
            health_route: DEFAULT_HEALTH_ROUTE.to_string(),
            timeout: None,
        }
    }
}

impl ServiceConfigBuilder {
    /// Creates a new builder with the default routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL. Falls back to `GENFORM_SERVICE_URL`, then `http://localhost:5000`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the route suffix used when no images are attached.
    pub fn generate_route(mut self, route: impl Into<String>) -> Self {
        self.generate_route = route.into();
        self
    }

    /// Sets the route suffix used when one or more images are attached.
    pub fn edit_route(mut self, route: impl Into<String>) -> Self {
        self.edit_route = route.into();
        self
    }

    /// Sets the route suffix used by health checks.
    pub fn health_route(mut self, route: impl Into<String>) -> Self {
        self.health_route = route.into();
        self
    }

    /// Sets a whole-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the config, resolving the base URL and joining the routes onto it.
    pub fn build(self) -> Result<ServiceConfig> {
        let raw = self
            .base_url
            .or_else(|| std::env::var(SERVICE_URL_ENV).ok())
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_string());

        let mut base_url = Url::parse(raw.trim())
            .map_err(|e| GenFormError::Config(format!("invalid service URL {raw:?}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(GenFormError::Config(format!(
                "service URL must be http(s): {raw}"
            )));
        }

        // Routes are relative to the base path, so it needs a trailing slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(ServiceConfig {
            generate_url: join_route(&base_url, &self.generate_route)?,
            edit_url: join_route(&base_url, &self.edit_route)?,
            health_url: join_route(&base_url, &self.health_route)?,
            base_url,
            timeout: self.timeout,
        })
    }
}

fn join_route(base: &Url, route: &str) -> Result<Url> {
    base.join(route.trim_start_matches('/'))
        .map_err(|e| GenFormError::Config(format!("invalid route {route:?}: {e}")))
}
