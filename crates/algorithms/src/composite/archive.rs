//! Scene archives
//!
//! A [`SceneArchive`] serves the raw scenes of one Landsat sensor. The
//! composite builder queries one archive per sensor and merges the
//! results. Two archives are provided: an in-memory one for tests and
//! small jobs, and one backed by a JSON manifest of single-band GeoTIFFs.

use super::scene::{Scene, SceneMetadata, SceneQuery};
use crate::landsat::Sensor;
use huctrend_core::io::read_band_geotiff;
use huctrend_core::{Error, Image, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source of raw scenes for one sensor
pub trait SceneArchive: Send + Sync {
    /// Sensor whose scenes this archive holds
    fn sensor(&self) -> Sensor;

    /// Number of scenes in the archive
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load every scene matching `query`, in archive order.
    fn select(&self, query: &SceneQuery) -> Result<Vec<Scene>>;
}

// ---------------------------------------------------------------------------
// In-memory archive
// ---------------------------------------------------------------------------

/// Scenes held in memory
#[derive(Debug, Clone)]
pub struct InMemoryArchive {
    sensor: Sensor,
    scenes: Vec<Scene>,
}

impl InMemoryArchive {
    pub fn new(sensor: Sensor) -> Self {
        Self {
            sensor,
            scenes: Vec::new(),
        }
    }

    /// Add a scene; its metadata must name this archive's sensor.
    pub fn push(&mut self, scene: Scene) -> Result<()> {
        if scene.metadata.sensor != self.sensor {
            return Err(Error::InvalidParameter {
                name: "scene",
                value: scene.metadata.id,
                reason: format!("is {} but the archive holds {}", scene.metadata.sensor, self.sensor),
            });
        }
        self.scenes.push(scene);
        Ok(())
    }

    pub fn with_scene(mut self, scene: Scene) -> Result<Self> {
        self.push(scene)?;
        Ok(self)
    }
}

impl SceneArchive for InMemoryArchive {
    fn sensor(&self) -> Sensor {
        self.sensor
    }

    fn len(&self) -> usize {
        self.scenes.len()
    }

    fn select(&self, query: &SceneQuery) -> Result<Vec<Scene>> {
        Ok(self
            .scenes
            .iter()
            .filter(|s| query.matches(&s.metadata))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Manifest-backed archive
// ---------------------------------------------------------------------------

/// One scene in a manifest: metadata plus a GeoTIFF path per native band
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    #[serde(flatten)]
    pub metadata: SceneMetadata,
    /// Native band name to file, relative to the manifest directory
    pub bands: BTreeMap<String, PathBuf>,
    /// Fill value of the band files, when they carry no GDAL_NODATA tag
    #[serde(default)]
    pub nodata: Option<f64>,
}

/// A JSON list of scenes:
///
/// ```json
/// { "scenes": [ { "id": "LC08_035034_20170712", "sensor": "LC08",
///                 "acquired": "2017-07-12",
///                 "footprint": { "min_x": 0, "min_y": 0, "max_x": 1, "max_y": 1 },
///                 "nodata": -9999,
///                 "bands": { "B2": "LC08_035034_20170712/B2.tif", ... } } ] }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneManifest {
    pub scenes: Vec<ManifestEntry>,
}

impl SceneManifest {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Split the manifest into one archive per sensor. Relative band
    /// paths resolve against `root`.
    pub fn into_archives(self, root: impl AsRef<Path>) -> ArchiveSet {
        let root = root.as_ref();
        let mut set = ArchiveSet::new();
        for sensor in Sensor::ALL {
            let entries: Vec<ManifestEntry> = self
                .scenes
                .iter()
                .filter(|e| e.metadata.sensor == sensor)
                .cloned()
                .collect();
            debug!(sensor = %sensor, scenes = entries.len(), "manifest archive");
            set.push(Box::new(ManifestArchive {
                sensor,
                root: root.to_path_buf(),
                entries,
            }));
        }
        set
    }
}

/// Scenes of one sensor, read from GeoTIFF files on demand
#[derive(Debug, Clone)]
pub struct ManifestArchive {
    sensor: Sensor,
    root: PathBuf,
    entries: Vec<ManifestEntry>,
}

impl ManifestArchive {
    fn load(&self, entry: &ManifestEntry) -> Result<Scene> {
        let mut bands = Vec::with_capacity(entry.bands.len());
        for (name, file) in &entry.bands {
            let path = if file.is_absolute() {
                file.clone()
            } else {
                self.root.join(file)
            };
            bands.push((name.clone(), read_band_geotiff(&path, entry.nodata)?));
        }
        let image = Image::from_bands(bands)?;
        Ok(Scene::new(entry.metadata.clone(), image))
    }
}

impl SceneArchive for ManifestArchive {
    fn sensor(&self) -> Sensor {
        self.sensor
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn select(&self, query: &SceneQuery) -> Result<Vec<Scene>> {
        self.entries
            .iter()
            .filter(|e| query.matches(&e.metadata))
            .map(|e| self.load(e))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Archive set
// ---------------------------------------------------------------------------

/// The archives merged into one composite
#[derive(Default)]
pub struct ArchiveSet {
    archives: Vec<Box<dyn SceneArchive>>,
}

impl ArchiveSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a manifest file; band paths resolve against its directory.
    pub fn from_manifest_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let manifest = SceneManifest::from_json_file(path)?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        info!(path = %path.display(), scenes = manifest.scenes.len(), "loaded scene manifest");
        Ok(manifest.into_archives(root))
    }

    pub fn push(&mut self, archive: Box<dyn SceneArchive>) {
        self.archives.push(archive);
    }

    pub fn with(mut self, archive: impl SceneArchive + 'static) -> Self {
        self.push(Box::new(archive));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn SceneArchive> {
        self.archives.iter().map(|a| a.as_ref())
    }

    pub fn len(&self) -> usize {
        self.archives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    /// Total scene count over every archive
    pub fn scene_count(&self) -> usize {
        self.archives.iter().map(|a| a.len()).sum()
    }
}

impl std::fmt::Debug for ArchiveSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.archives.iter().map(|a| (a.sensor(), a.len())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::SeasonWindow;
    use huctrend_core::io::write_band_geotiff_to_buffer;
    use huctrend_core::{BBox, Boundary, GeoTransform, HucCode, Raster};

    fn basin() -> Boundary {
        Boundary::from_bbox(HucCode::parse("150701").unwrap(), BBox::new(0.0, 0.0, 60.0, 60.0))
    }

    fn scene(sensor: Sensor, date: &str) -> Scene {
        let image = Image::new(2, 2, GeoTransform::new(0.0, 60.0, 30.0, -30.0))
            .with_band("B5", Raster::filled(2, 2, 3000.0))
            .unwrap();
        Scene::new(
            SceneMetadata {
                id: format!("{}_{}", sensor, date),
                sensor,
                acquired: date.parse().unwrap(),
                footprint: BBox::new(0.0, 0.0, 60.0, 60.0),
            },
            image,
        )
    }

    #[test]
    fn test_in_memory_select() {
        let archive = InMemoryArchive::new(Sensor::Landsat8)
            .with_scene(scene(Sensor::Landsat8, "2017-07-12"))
            .unwrap()
            .with_scene(scene(Sensor::Landsat8, "2017-11-02"))
            .unwrap();

        let query = SceneQuery::new(2017, SeasonWindow::default(), &basin());
        let picked = archive.select(&query).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].metadata.id, "LC08_2017-07-12");
    }

    #[test]
    fn test_in_memory_rejects_other_sensor() {
        let mut archive = InMemoryArchive::new(Sensor::Landsat8);
        assert!(archive.push(scene(Sensor::Landsat5, "1990-07-01")).is_err());
    }

    #[test]
    fn test_manifest_archive_reads_geotiffs() {
        let dir = tempfile::tempdir().unwrap();
        let mut band = Raster::filled(2, 2, 3000.0);
        band.set_transform(GeoTransform::new(0.0, 60.0, 30.0, -30.0));
        fs::write(dir.path().join("b5.tif"), write_band_geotiff_to_buffer(&band).unwrap()).unwrap();

        let manifest = r#"{
          "scenes": [{
            "id": "LC08_test", "sensor": "LC08", "acquired": "2017-07-12",
            "footprint": { "min_x": 0, "min_y": 0, "max_x": 60, "max_y": 60 },
            "bands": { "B5": "b5.tif" }
          }]
        }"#;
        let path = dir.path().join("scenes.json");
        fs::write(&path, manifest).unwrap();

        let set = ArchiveSet::from_manifest_file(&path).unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.scene_count(), 1);

        let query = SceneQuery::new(2017, SeasonWindow::default(), &basin());
        let oli = set.iter().find(|a| a.sensor() == Sensor::Landsat8).unwrap();
        let scenes = oli.select(&query).unwrap();
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].image.band("B5").unwrap().get(1, 1).unwrap(), 3000.0);
        assert_eq!(scenes[0].image.transform().origin_y, 60.0);
    }
}
