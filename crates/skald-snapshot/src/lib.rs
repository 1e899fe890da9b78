pub mod build;
pub mod checksum;
pub mod cluster;
pub mod project;
pub mod retrieval;

pub use build::{build, BuildInputs};
pub use checksum::{compute_checksum, finalize, load_snapshot, save_snapshot, verify};
pub use cluster::cluster_concepts;
pub use project::ProjectMeta;
pub use retrieval::{intent_for_file, render_context, search_decisions};
