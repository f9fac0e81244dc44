use anyhow::Error;
use reqwest::get;

use crate::{Catalog, get_catalog, get_catalog_file};

pub async fn get_catalog_remote(url: &str) -> Result<Catalog, Error> {
    let response = get(url).await?.error_for_status()?;
    let text = response.text().await?;

    Ok(Catalog::from_json(&text)?)
}

/// Resolves a catalog source: `None` is the embedded default, `http(s)://` is fetched,
/// anything else is read as a file path.
pub async fn load_catalog(source: Option<&str>) -> Result<Catalog, Error> {
    match source {
        None => Ok(get_catalog()?),
        Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
            get_catalog_remote(url).await
        }
        Some(path) => get_catalog_file(path),
    }
}
