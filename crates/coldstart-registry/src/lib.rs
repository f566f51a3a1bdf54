//! Campaign registry for the ColdStart engine.
//!
//! The registry is the single owner of [`Campaign`] records: creation,
//! lookup, ordered listing, and the cached `amount_raised` aggregate.
//! It has no lifecycle opinions of its own: status changes and aggregate
//! deltas are applied only on instruction from the lifecycle engine,
//! through the [`CampaignMutator`] boundary.

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{RegistryError, Result};
pub use memory::InMemoryRegistry;
pub use traits::{CampaignIter, CampaignMutator, CampaignStore};
pub use types::Campaign;
