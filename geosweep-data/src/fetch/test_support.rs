//! Canned dataset source used by the fetch tests.

use std::collections::HashMap;
use std::io::Write;

use async_trait::async_trait;

use super::source::DatasetSource;
use super::TransportError;

/// A [`DatasetSource`] serving pre-baked bytes.
#[derive(Debug, Default)]
pub(crate) struct StubSource {
    countries: Vec<u8>,
    cities: Vec<u8>,
    archives: HashMap<String, Vec<u8>>,
}

impl StubSource {
    pub(crate) fn new(countries: Vec<u8>, cities: Vec<u8>) -> Self {
        Self {
            countries,
            cities,
            archives: HashMap::new(),
        }
    }

    pub(crate) fn add_archive(&mut self, name: &str, bytes: Vec<u8>) {
        self.archives.insert(name.to_owned(), bytes);
    }

    /// Build an in-memory zip archive holding a single text entry.
    pub(crate) fn zip_archive(entry: &str, content: &str) -> Vec<u8> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default()
                .compression_method(zip::CompressionMethod::Stored);
            writer.start_file(entry, options).expect("start zip entry");
            writer
                .write_all(content.as_bytes())
                .expect("write zip entry");
            writer.finish().expect("finish zip archive");
        }
        buffer.into_inner()
    }
}

#[async_trait(?Send)]
impl DatasetSource for StubSource {
    async fn fetch_country_listing(&self) -> Result<Vec<u8>, TransportError> {
        Ok(self.countries.clone())
    }

    async fn fetch_city_listing(&self) -> Result<Vec<u8>, TransportError> {
        Ok(self.cities.clone())
    }

    async fn fetch_postal_archive(&self, archive: &str) -> Result<Vec<u8>, TransportError> {
        self.archives
            .get(archive)
            .cloned()
            .ok_or_else(|| TransportError::Http {
                url: format!("stub://{archive}"),
                status: 404,
                message: "archive not stubbed".to_owned(),
            })
    }
}
