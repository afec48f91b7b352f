//! Persistence adapters for the allocation repository ports.

pub mod catalog;
pub mod memory;

pub use catalog::{CatalogImportError, CatalogImporter};
pub use memory::{
    InMemoryApplicantRepository, InMemoryApplicationRepository, InMemoryProjectRepository,
};
