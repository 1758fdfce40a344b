//! Imagery algorithms
//!
//! - Spectral indices: NDVI, NDMI, EVI, SAVI, MSAVI, NBR, NBR2
//! - Band math: per-cell functions that keep no-data

mod band_math;
mod indices;

pub use band_math::band_math;
pub use indices::{
    add_spectral_indices, evi, msavi, nbr, nbr2, ndmi, ndvi, normalized_difference, savi,
    EviParams, SaviParams, SpectralIndex,
};
