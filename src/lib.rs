//! Backend-driven option selectors and subscription filter checks for a Jira
//! chat plugin. Rendering and transport belong to the host; this crate holds
//! the state and the rules.

pub mod attach;
pub mod config;
pub mod conflicts;
pub mod error;
pub mod jira;
pub mod metadata;
pub mod pickers;
pub mod selector;
pub mod subscription;

pub use conflicts::{compute_conflicts, ConflictReport, FieldConflict};
pub use error::SelectorError;
pub use metadata::{FieldMetadataEntry, IssueMetadata, IssueType};
pub use selector::{AsyncOptionSelector, NarrowBy, SelectedValue};
