//! Archiving pipeline components.
//!
//! - **discovery**: Find source images under the scan root
//! - **metadata**: Read embedded tags through an external reader
//! - **sidecar**: Classify tags and write the sidecar next to the image
//! - **convert**: Encode the archival artifact through an external encoder
//! - **relocate**: Move verified originals into the review tree
//! - **paths**: Collision-free path allocation
//! - **processor**: Runs one file through every stage
//! - **scheduler**: Bounded concurrent batch driver

pub mod convert;
pub mod discovery;
pub mod metadata;
pub mod paths;
pub mod processor;
pub mod relocate;
pub mod scheduler;
pub mod sidecar;

pub use convert::{Encoder, FormatConverter, MagickEncoder};
pub use discovery::FileDiscovery;
pub use metadata::{ExifToolReader, MetadataExtractor, MetadataReader};
pub use paths::{allocate_unique, artifact_path};
pub use processor::FilePipeline;
pub use relocate::relocate;
pub use scheduler::{BatchRunner, Progress, StopSignal};
pub use sidecar::{SidecarPlan, SidecarWriter};
