//! Map rendering and publishing
//!
//! A [`MapPresenter`] turns a coordinate into a self-contained Leaflet HTML
//! document with one marker. An [`ArtifactHost`] makes that document loadable
//! by a browser and hands back its address.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::AirMapError;
use crate::config::{AirMapConfig, MapConfig};
use crate::models::Coordinate;

/// Path prefix under which published maps are served
pub const MAPS_ROUTE: &str = "/maps";

const MAP_TEMPLATE: &str = include_str!("../assets/map.html");

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A rendered map document centered on one coordinate with one marker
#[derive(Debug, Clone, PartialEq)]
pub struct MapArtifact {
    pub center: Coordinate,
    pub zoom: u8,
    pub marker_label: String,
    pub document: String,
    pub generated_at: DateTime<Utc>,
}

/// Where a published map can be found
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedMap {
    /// File on disk
    pub file: PathBuf,
    /// Address a browser can load
    pub url: String,
}

/// Produces map documents for coordinates
pub trait MapPresenter: Send + Sync {
    fn render(&self, center: Coordinate) -> Result<MapArtifact, AirMapError>;
}

/// Makes rendered maps reachable
#[async_trait]
pub trait ArtifactHost: Send + Sync {
    async fn publish(&self, artifact: &MapArtifact) -> Result<PublishedMap, AirMapError>;
}

/// Renders maps as Leaflet documents using OpenStreetMap tiles
#[derive(Debug, Clone)]
pub struct LeafletMapPresenter {
    zoom: u8,
    marker_label: String,
}

impl LeafletMapPresenter {
    #[must_use]
    pub fn new(zoom: u8, marker_label: impl Into<String>) -> Self {
        Self {
            zoom,
            marker_label: marker_label.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &MapConfig) -> Self {
        Self::new(config.zoom, config.marker_label.clone())
    }
}

impl MapPresenter for LeafletMapPresenter {
    fn render(&self, center: Coordinate) -> Result<MapArtifact, AirMapError> {
        // JSON string literals are valid JS literals; "</" would still end the script block
        let label = serde_json::to_string(&self.marker_label)
            .map_err(|e| AirMapError::render(format!("Failed to encode marker label: {e}")))?
            .replace("</", "<\\/");

        let document = MAP_TEMPLATE
            .replace("{{TITLE}}", &format!("Air quality map - {}", center.format_coordinates()))
            .replace("{{LATITUDE}}", &center.latitude().to_string())
            .replace("{{LONGITUDE}}", &center.longitude().to_string())
            .replace("{{ZOOM}}", &self.zoom.to_string())
            .replace("{{MARKER_LABEL}}", &label);

        debug!(
            "Rendered map centered on {} ({} bytes)",
            center.format_coordinates(),
            document.len()
        );

        Ok(MapArtifact {
            center,
            zoom: self.zoom,
            marker_label: self.marker_label.clone(),
            document,
            generated_at: Utc::now(),
        })
    }
}

/// Writes map documents into a directory served by the web layer
#[derive(Debug, Clone)]
pub struct DirectoryHost {
    output_dir: PathBuf,
    file_name: String,
    base_url: String,
}

impl DirectoryHost {
    #[must_use]
    pub fn new(output_dir: PathBuf, file_name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            output_dir,
            file_name: file_name.into(),
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &AirMapConfig) -> Self {
        Self::new(
            config.map.output_dir.clone(),
            config.map.file_name.clone(),
            config.server.public_url(),
        )
    }

    /// File name for a map centered on `center`, e.g. `map_45.9432_24.9668.html`.
    ///
    /// Each coordinate gets its own file so a report never points at a map
    /// another lookup wrote in the meantime.
    #[must_use]
    pub fn file_name_for(&self, center: Coordinate) -> String {
        let configured = Path::new(&self.file_name);
        let stem = configured
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("map");
        let extension = configured
            .extension()
            .and_then(|extension| extension.to_str())
            .unwrap_or("html");
        format!(
            "{stem}_{}_{}.{extension}",
            center.latitude(),
            center.longitude()
        )
    }

    /// Write through a temporary file and rename, so readers never see a half-written map
    async fn write_atomically(&self, file: &Path, document: &str) -> Result<(), AirMapError> {
        let sequence = TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        let temp = self.output_dir.join(format!(".{}.{sequence}.tmp", std::process::id()));
        tokio::fs::write(&temp, document.as_bytes()).await?;
        tokio::fs::rename(&temp, file).await?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactHost for DirectoryHost {
    #[instrument(skip_all, fields(dir = %self.output_dir.display()))]
    async fn publish(&self, artifact: &MapArtifact) -> Result<PublishedMap, AirMapError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        let file_name = self.file_name_for(artifact.center);
        let file = self.output_dir.join(&file_name);
        self.write_atomically(&file, &artifact.document).await?;

        // The configured name always holds the latest map, e.g. for the index page
        let latest = self.output_dir.join(&self.file_name);
        self.write_atomically(&latest, &artifact.document).await?;

        // The query string makes embedded views reload instead of showing a cached map
        let url = format!(
            "{}{}/{}?t={}",
            self.base_url,
            MAPS_ROUTE,
            urlencoding::encode(&file_name),
            artifact.generated_at.timestamp_millis()
        );

        info!("Published map for {} at {}", artifact.center.format_coordinates(), url);
        Ok(PublishedMap { file, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn romania() -> Coordinate {
        Coordinate::new(45.9432, 24.9668).unwrap()
    }

    #[test]
    fn test_render_centers_map_and_marker() {
        let artifact = LeafletMapPresenter::new(6, "Selected location")
            .render(romania())
            .unwrap();

        assert_eq!(artifact.center, romania());
        assert_eq!(artifact.zoom, 6);
        assert!(artifact.document.contains("var center = [45.9432, 24.9668];"));
        assert!(artifact.document.contains("setView(center, 6)"));
        assert!(artifact.document.contains(r#"bindPopup("Selected location")"#));
        assert_eq!(artifact.document.matches("L.marker(").count(), 1);
        assert!(!artifact.document.contains("{{"));
    }

    #[test]
    fn test_render_escapes_marker_label() {
        let artifact = LeafletMapPresenter::new(3, "a \"quoted\" </script> label")
            .render(romania())
            .unwrap();
        assert!(artifact.document.contains(r#""a \"quoted\" <\/script> label""#));
        assert_eq!(artifact.document.matches("</script>").count(), 2);
    }

    #[test]
    fn test_render_regenerates_for_each_call() {
        let presenter = LeafletMapPresenter::new(6, "here");
        let first = presenter.render(romania()).unwrap();
        let second = presenter
            .render(Coordinate::new(-33.8688, 151.2093).unwrap())
            .unwrap();
        assert!(second.document.contains("[-33.8688, 151.2093]"));
        assert!(!second.document.contains("45.9432"));
        assert_ne!(first.document, second.document);
    }

    #[tokio::test]
    async fn test_directory_host_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let host = DirectoryHost::new(dir.path().join("maps"), "map.html", "http://localhost:8000");
        let artifact = LeafletMapPresenter::new(6, "here").render(romania()).unwrap();

        let published = host.publish(&artifact).await.unwrap();

        assert_eq!(published.file, dir.path().join("maps").join("map_45.9432_24.9668.html"));
        let written = std::fs::read_to_string(&published.file).unwrap();
        assert_eq!(written, artifact.document);
        assert!(
            published
                .url
                .starts_with("http://localhost:8000/maps/map_45.9432_24.9668.html?t=")
        );

        let latest = std::fs::read_to_string(dir.path().join("maps").join("map.html")).unwrap();
        assert_eq!(latest, artifact.document);
    }

    #[tokio::test]
    async fn test_directory_host_keeps_each_lookup_on_its_own_file() {
        let dir = tempfile::tempdir().unwrap();
        let host = DirectoryHost::new(dir.path().to_path_buf(), "map.html", "http://localhost:8000");
        let presenter = LeafletMapPresenter::new(6, "here");
        let first = presenter.render(Coordinate::new(10.0, 20.0).unwrap()).unwrap();
        let second = presenter.render(Coordinate::new(30.0, 40.0).unwrap()).unwrap();

        let (first_map, second_map) = tokio::join!(host.publish(&first), host.publish(&second));
        let (first_map, second_map) = (first_map.unwrap(), second_map.unwrap());

        assert_ne!(first_map.file, second_map.file);
        assert!(std::fs::read_to_string(&first_map.file).unwrap().contains("[10, 20]"));
        assert!(std::fs::read_to_string(&second_map.file).unwrap().contains("[30, 40]"));
    }

    #[test]
    fn test_file_name_for_uses_configured_stem() {
        let host = DirectoryHost::new(PathBuf::from("out"), "airmap.htm", "http://localhost:8000");
        let center = Coordinate::new(-33.8688, 151.2093).unwrap();
        assert_eq!(host.file_name_for(center), "airmap_-33.8688_151.2093.htm");
    }
}
