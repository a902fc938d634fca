//! Release domain: services, stands, tags and the versioning rules.

pub mod batch;
pub mod changelog;
pub mod service;
pub mod stand;
pub mod tag;
pub mod tags;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchOutcome, run_batch};
pub use service::{BranchServices, GroupServices, Service, Services};
pub use stand::{ReleaseStands, Stand, Stands};
pub use tag::Tag;
pub use tags::Tags;
