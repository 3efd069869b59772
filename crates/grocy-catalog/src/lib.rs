pub mod builder;
pub mod categorize;
pub mod diff;
pub mod error;
pub mod identity;
pub mod memory;
pub mod reconcile;
pub mod search;
pub mod store;

pub use builder::build_record;
pub use categorize::{vote, CategorizeSummary, Categorizer};
pub use diff::{carry_forward, diff, FieldChange, RecordDiff};
pub use error::{ReconcileError, StoreError};
pub use identity::resolve_identity;
pub use memory::MemoryCatalogStore;
pub use reconcile::{FeedSummary, Outcome, Reconciler};
pub use search::{Candidate, CandidateSearch, ReferenceIndex};
pub use store::{CatalogStore, CategoryFilter, RecordFilter, StoredId, StoredRecord};
