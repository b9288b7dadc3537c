//! The capability every persisted entity exposes to generic repositories.

use serde::{de::DeserializeOwned, Serialize};
use std::fmt::{Debug, Display};
use std::hash::Hash;

/// An entity with a stable identifier that can be serialized into a cache
/// blob and patched in place.
///
/// Repositories and stores are generic over this trait rather than over a
/// closed set of entity types.
pub trait Record: Clone + Debug + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Identifier type (primary key)
    type Id: Copy + Eq + Hash + Debug + Display + Send + Sync + 'static;

    /// Partial update applied by `update_by_id`
    type Patch: Debug + Send + Sync + 'static;

    /// Human readable entity name used in diagnostics
    const NAME: &'static str;

    /// Current identifier
    fn id(&self) -> Self::Id;

    /// Replace the identifier (used by stores that assign keys on insert)
    fn assign_id(&mut self, id: Self::Id);

    /// Apply a partial update in place
    fn merge(&mut self, patch: Self::Patch);
}
