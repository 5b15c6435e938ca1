//! Transport abstraction for the dataset downloads.

use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, Response};
use std::io;

use super::TransportError;

/// User agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = "geosweep-fetch/0.1";

/// Base URL of the countries-states-cities JSON listings.
pub const DEFAULT_LISTING_BASE_URL: &str =
    "https://raw.githubusercontent.com/dr5hn/countries-states-cities-database/refs/heads/master/json";

/// Base URL of the GeoNames postal archives.
pub const DEFAULT_POSTAL_BASE_URL: &str = "https://download.geonames.org/export/zip";

/// Where the dataset bytes come from.
#[async_trait(?Send)]
pub trait DatasetSource {
    /// Fetch the raw country listing.
    async fn fetch_country_listing(&self) -> Result<Vec<u8>, TransportError>;
    /// Fetch the raw city listing.
    async fn fetch_city_listing(&self) -> Result<Vec<u8>, TransportError>;
    /// Fetch the named postal archive.
    async fn fetch_postal_archive(&self, archive: &str) -> Result<Vec<u8>, TransportError>;
}

/// HTTP implementation of [`DatasetSource`].
#[derive(Debug)]
pub struct HttpDatasetSource {
    client: Client,
    listing_base: String,
    postal_base: String,
    user_agent: String,
}

impl Default for HttpDatasetSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpDatasetSource {
    /// Construct a source pointing at the default public datasets.
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("client builder only fails with invalid configuration");
        Self {
            client,
            listing_base: DEFAULT_LISTING_BASE_URL.to_owned(),
            postal_base: DEFAULT_POSTAL_BASE_URL.to_owned(),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Override the default user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Override the listing base URL, e.g. to point at a mirror.
    #[must_use]
    pub fn with_listing_base(mut self, base: impl Into<String>) -> Self {
        self.listing_base = trim_trailing_slash(base.into());
        self
    }

    /// Override the postal archive base URL.
    #[must_use]
    pub fn with_postal_base(mut self, base: impl Into<String>) -> Self {
        self.postal_base = trim_trailing_slash(base.into());
        self
    }

    async fn call(&self, url: &str) -> Result<Response, TransportError> {
        self.client
            .get(url)
            .header(USER_AGENT, self.user_agent.as_str())
            .send()
            .await
            .map_err(|err| convert_reqwest_error(err, url))?
            .error_for_status()
            .map_err(|err| convert_reqwest_error(err, url))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let response = self.call(url).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| convert_reqwest_error(err, url))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait(?Send)]
impl DatasetSource for HttpDatasetSource {
    async fn fetch_country_listing(&self) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}/countries.json", self.listing_base);
        self.fetch(&url).await
    }

    async fn fetch_city_listing(&self) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}/cities.json", self.listing_base);
        self.fetch(&url).await
    }

    async fn fetch_postal_archive(&self, archive: &str) -> Result<Vec<u8>, TransportError> {
        let url = format!("{}/{archive}", self.postal_base);
        self.fetch(&url).await
    }
}

fn trim_trailing_slash(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}

fn convert_reqwest_error(error: reqwest::Error, url: &str) -> TransportError {
    if let Some(status) = error.status() {
        return TransportError::Http {
            url: url.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }

    let kind = if error.is_timeout() {
        io::ErrorKind::TimedOut
    } else {
        io::ErrorKind::Other
    };
    TransportError::Network {
        url: url.to_owned(),
        source: io::Error::new(kind, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn base_urls_lose_their_trailing_slash() {
        let source = HttpDatasetSource::new()
            .with_listing_base("https://example.test/json/")
            .with_postal_base("https://example.test/zip//");
        assert_eq!(source.listing_base, "https://example.test/json");
        assert_eq!(source.postal_base, "https://example.test/zip");
    }
}
