//! musiclists - merge and dedup "top albums" lists from different sources.
//!
//! The interesting part is the record-linkage core: canonical id derivation
//! ([`ident`]), fuzzy pairwise scoring ([`similarity`]), ranked candidate
//! matching ([`matching`]), the interactive resolution session ([`resolve`])
//! and the persistent ledger of confirmed duplicates ([`ledger`]). Everything
//! else ferries tabular records in and out.

pub mod collection;
pub mod config;
pub mod dedup;
pub mod ident;
pub mod ledger;
pub mod matching;
pub mod progress;
pub mod record;
pub mod resolve;
pub mod scan;
pub mod similarity;
pub mod store;
