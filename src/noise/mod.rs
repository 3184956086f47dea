//! Noise clip catalog — records, storage, selection and maintenance.
//!
//! * [`NoiseRecord`] — one catalog entry (`fileName` relative to the asset root).
//! * [`NoiseRepository`] — async storage trait; [`InMemoryNoiseRepository`]
//!   and [`JsonNoiseRepository`] implement it.
//! * [`NoiseSelector`] — tag → random usable clip, deleting stale records.
//! * [`purge_unsafe_records`] / [`reconcile_catalog`] — maintenance passes.

pub mod maintenance;
pub mod record;
pub mod repository;
pub mod selector;

pub use maintenance::{purge_unsafe_records, reconcile_catalog, CatalogReport, MissingFile};
pub use record::{normalize_tags, parse_tag_list, NoiseRecord};
pub use repository::{
    InMemoryNoiseRepository, JsonNoiseRepository, NoiseRepository, RepositoryError,
};
pub use selector::{NoiseSelection, NoiseSelector};
