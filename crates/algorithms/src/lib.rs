//! # TerraStat Algorithms
//!
//! Spatial statistics over vector feature collections.
//!
//! ## Available algorithm categories
//!
//! - **weights**: Queen/rook contiguity, KNN and distance-band neighbor graphs
//! - **autocorrelation**: Global and local Moran's I
//! - **correlation**: Pearson, Spearman and Kendall correlation matrices
//! - **diversity**: Entropy diversity index over attribute series
//! - **quotient**: Location quotient
//! - **dummies**: Dummy-variable encoding of categorical attributes

pub mod autocorrelation;
pub mod correlation;
pub mod diversity;
pub mod dummies;
pub mod quotient;
pub mod weights;

mod maybe_rayon;
mod rng;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::autocorrelation::{
        global_morans_i, local_morans_i, GlobalMoranResult, LocalMoranParams, LocalMoranResult,
        Quadrant,
    };
    pub use crate::correlation::{
        correlation_matrix, kendall, pearson, spearman, CorrelationMatrix, CorrelationMethod,
    };
    pub use crate::diversity::entropy_index;
    pub use crate::dummies::{dummy_variables, DummyEncoding};
    pub use crate::quotient::location_quotient;
    pub use crate::weights::{build_weights, WeightsGraph, WeightsMethod};
    pub use terrastat_core::prelude::*;
}
