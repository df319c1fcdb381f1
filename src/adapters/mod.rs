// Adapters: concrete record sources. Storage backends live under config.

pub mod sources;

pub use sources::{
    load_feature_collection, sample_claims, ConfiguredSource, HttpSource, JsonFileSource,
    SourceSpec, StaticSource,
};
