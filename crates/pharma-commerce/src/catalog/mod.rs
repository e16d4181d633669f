//! Read-only catalog snapshots, and the draft admins edit them through.
//!
//! The remote catalog owns ground truth; these are copies with no freshness
//! guarantee beyond the fetch that produced them.

mod draft;
mod item;

pub use draft::MedicineDraft;
pub use item::CatalogItem;
