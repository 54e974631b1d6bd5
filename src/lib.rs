pub mod config;
pub mod data;
pub mod distance;
pub mod error;
pub mod features;
pub mod groups;
pub mod logging;
pub mod neighbors;
pub mod output;
pub mod overlap;
pub mod pipeline;
pub mod recluster;
pub mod selection;
pub mod stats;

pub const TARGET_DATA: &str = "data";
pub const TARGET_DISTANCE: &str = "distance";
pub const TARGET_NEIGHBORS: &str = "neighbors";
pub const TARGET_OVERLAP: &str = "overlap";
pub const TARGET_SELECTION: &str = "selection";
pub const TARGET_RECLUSTER: &str = "recluster";
pub const TARGET_FEATURES: &str = "features";
pub const TARGET_OUTPUT: &str = "output";
pub const TARGET_PIPELINE: &str = "pipeline";

/// Every tracing target this crate logs under
pub const TARGETS: [&str; 9] = [
    TARGET_DATA,
    TARGET_DISTANCE,
    TARGET_NEIGHBORS,
    TARGET_OVERLAP,
    TARGET_SELECTION,
    TARGET_RECLUSTER,
    TARGET_FEATURES,
    TARGET_OUTPUT,
    TARGET_PIPELINE,
];

pub use error::{CongaError, CongaResult};
