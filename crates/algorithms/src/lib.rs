//! # huctrend Algorithms
//!
//! The processing stages behind the annual watershed tables.
//!
//! ## Modules
//!
//! - **landsat**: band normalization, cloud masking, ETM+ to OLI harmonization
//! - **imagery**: spectral indices and band math
//! - **composite**: scene archives, annual median composites
//! - **statistics**: zonal means over sub-watershed polygons

pub mod composite;
pub mod imagery;
pub mod landsat;
pub mod statistics;

pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::composite::{
        make_annual, median_composite, AnnualComposite, AnnualParams, ArchiveSet, CompositeGrid,
        InMemoryArchive, Scene, SceneArchive, SceneManifest, SceneMetadata, SceneQuery,
        SeasonWindow, LANDSAT_YEARS,
    };
    pub use crate::imagery::{
        add_spectral_indices, evi, msavi, nbr, nbr2, ndmi, ndvi, savi, EviParams, SaviParams,
        SpectralIndex,
    };
    pub use crate::landsat::{
        mask_clouds, normalize, prepare, CanonicalImage, EtmScale, HarmonizationCoefficients,
        OliScale, PrepareScene, Sensor, SensorFamily, CANONICAL_BANDS,
    };
    pub use crate::statistics::{zonal_means, StatsTable, ZonalMean, ZonalParams, ZoneRow};
    pub use huctrend_core::prelude::*;
}
