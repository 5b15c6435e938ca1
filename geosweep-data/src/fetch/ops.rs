//! Assembly of the seed dataset from the remote listings and archives.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use serde::Deserialize;

use geosweep_core::SeedData;

use super::postal::{archive_names, parse_archive_entry};
use super::source::DatasetSource;
use super::{FetchError, TransportError};

#[derive(Debug, Deserialize)]
struct CountryRecord {
    name: String,
    iso2: String,
}

#[derive(Debug, Deserialize)]
struct CityRecord {
    name: String,
    #[serde(default)]
    state_code: String,
    #[serde(default)]
    state_name: String,
    country_code: String,
}

/// Download the geographic listings and postal archives and normalise them
/// into a [`SeedData`].
///
/// Postal codes are fetched for `postal_countries`; countries whose archive
/// cannot be parsed into at least one valid code are left out of the zip
/// map. Cities with a blank state code are skipped, as are cities whose
/// country is absent from the country listing.
pub async fn build_seed_data<S: DatasetSource + ?Sized>(
    source: &S,
    postal_countries: &[String],
) -> Result<SeedData, FetchError> {
    let mut seed = SeedData::default();

    log::info!("downloading country listing");
    let bytes = source
        .fetch_country_listing()
        .await
        .map_err(|source| FetchError::CountryListing { source })?;
    let countries: Vec<CountryRecord> =
        serde_json::from_slice(&bytes).map_err(|source| FetchError::ParseCountries { source })?;
    for country in &countries {
        let key = format!("{}#{}", country.iso2.to_uppercase(), country.name);
        seed.city_data.insert(key, BTreeMap::new());
    }
    log::info!("indexed {} countries", countries.len());

    log::info!("downloading city listing");
    let bytes = source
        .fetch_city_listing()
        .await
        .map_err(|source| FetchError::CityListing { source })?;
    let cities: Vec<CityRecord> =
        serde_json::from_slice(&bytes).map_err(|source| FetchError::ParseCities { source })?;
    merge_cities(&mut seed, &cities);

    for country in postal_countries {
        let (archive, entry) = archive_names(country);
        log::info!("downloading postal codes for {country}");
        let bytes = fetch_archive(source, &archive, country).await?;
        let data = extract_entry(&bytes, &entry, country)?;
        let codes = parse_archive_entry(&data, country);
        log::info!("parsed {} postal codes for {country}", codes.len());
        if !codes.is_empty() {
            seed.zip_data.insert(country.clone(), codes);
        }
    }

    Ok(seed)
}

async fn fetch_archive<S: DatasetSource + ?Sized>(
    source: &S,
    archive: &str,
    country: &str,
) -> Result<Vec<u8>, FetchError> {
    source
        .fetch_postal_archive(archive)
        .await
        .map_err(|source: TransportError| FetchError::PostalArchive {
            country: country.to_owned(),
            source,
        })
}

fn merge_cities(seed: &mut SeedData, cities: &[CityRecord]) {
    for city in cities {
        let country_code = city.country_code.trim().to_uppercase();
        let state_code = city.state_code.trim().to_uppercase();
        if state_code.is_empty() {
            continue;
        }

        let country_prefix = format!("{country_code}#");
        let Some(states) = seed
            .city_data
            .iter_mut()
            .find_map(|(key, states)| key.starts_with(&country_prefix).then_some(states))
        else {
            continue;
        };

        let state_prefix = format!("{state_code}##");
        let state_key = states
            .keys()
            .find(|key| key.starts_with(&state_prefix))
            .cloned()
            .unwrap_or_else(|| format!("{state_code}##{}", city.state_name));
        states.entry(state_key).or_default().push(city.name.clone());
    }
}

fn extract_entry(bytes: &[u8], entry: &str, country: &str) -> Result<String, FetchError> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(bytes)).map_err(|source| FetchError::OpenArchive {
            country: country.to_owned(),
            source,
        })?;
    let mut file = match archive.by_name(entry) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(FetchError::MissingArchiveEntry {
                country: country.to_owned(),
                entry: entry.to_owned(),
            });
        }
        Err(source) => {
            return Err(FetchError::OpenArchive {
                country: country.to_owned(),
                source,
            });
        }
    };
    let mut data = String::new();
    file.read_to_string(&mut data)
        .map_err(|source| FetchError::ReadArchiveEntry {
            country: country.to_owned(),
            entry: entry.to_owned(),
            source,
        })?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::super::StubSource;
    use super::*;
    use rstest::{fixture, rstest};

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_owned()).collect()
    }

    #[fixture]
    fn stub() -> StubSource {
        let countries = br#"[
            {"id": 1, "name": "United States", "iso2": "US", "iso3": "USA"},
            {"id": 2, "name": "Germany", "iso2": "DE", "iso3": "DEU"}
        ]"#
        .to_vec();
        let cities = br#"[
            {"name": "Los Angeles", "state_code": "CA", "state_name": "California", "country_code": "US"},
            {"name": "San Diego", "state_code": "CA", "state_name": "California", "country_code": "US"},
            {"name": "Stateless", "state_code": "", "state_name": "", "country_code": "US"},
            {"name": "Berlin", "state_code": "BE", "state_name": "Berlin", "country_code": "DE"},
            {"name": "Atlantis", "state_code": "AT", "state_name": "Atlantis", "country_code": "XX"}
        ]"#
        .to_vec();
        let mut stub = StubSource::new(countries, cities);
        stub.add_archive(
            "US.zip",
            StubSource::zip_archive("US.txt", "US\t90001\tLos Angeles\nUS\t90001\tdup\n"),
        );
        stub
    }

    #[rstest]
    fn assembles_the_seed_dataset(stub: StubSource) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("build runtime");
        let seed = runtime
            .block_on(build_seed_data(&stub, &owned(&["US"])))
            .expect("build seed data");

        let states = seed
            .city_data
            .get("US#United States")
            .expect("US entry exists");
        assert_eq!(
            states.get("CA##California").map(Vec::as_slice),
            Some(&["Los Angeles".to_owned(), "San Diego".to_owned()][..])
        );
        // The stateless city and the unknown country were skipped.
        assert_eq!(states.len(), 1);
        assert!(seed.city_data.contains_key("DE#Germany"));

        assert_eq!(
            seed.zip_data.get("US").map(Vec::as_slice),
            Some(&["90001".to_owned()][..])
        );
    }

    #[rstest]
    fn missing_archive_entry_is_an_error(mut stub: StubSource) {
        stub.add_archive(
            "DE.zip",
            StubSource::zip_archive("WRONG.txt", "DE\t10115\tBerlin\n"),
        );
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("build runtime");
        let err = runtime
            .block_on(build_seed_data(&stub, &owned(&["DE"])))
            .expect_err("missing entry should fail");
        assert!(matches!(err, FetchError::MissingArchiveEntry { .. }));
    }

    #[rstest]
    fn corrupt_archive_is_an_error(mut stub: StubSource) {
        stub.add_archive("DE.zip", b"not a zip".to_vec());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("build runtime");
        let err = runtime
            .block_on(build_seed_data(&stub, &owned(&["DE"])))
            .expect_err("corrupt archive should fail");
        assert!(matches!(err, FetchError::OpenArchive { .. }));
    }

    #[rstest]
    fn malformed_listing_is_an_error() {
        let broken = StubSource::new(b"not json".to_vec(), Vec::new());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .build()
            .expect("build runtime");
        let err = runtime
            .block_on(build_seed_data(&broken, &[]))
            .expect_err("malformed listing should fail");
        assert!(matches!(err, FetchError::ParseCountries { .. }));
    }
}
