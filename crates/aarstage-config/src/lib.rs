//! Parse and validate `aarstage.toml`, the `graph.toml` resolution snapshot,
//! and the per-library prepare stamps.

pub mod graph;
pub mod settings;
pub mod stamp;

pub use graph::GraphFile;
pub use settings::Settings;
pub use stamp::PrepareStamp;
