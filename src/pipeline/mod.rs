// src/pipeline/mod.rs
//! Corpus-level batch processing

pub mod corpus;
pub mod driver;
pub mod report;

pub use corpus::{discover, entries_of, CorpusEntry, CorpusIndex};
pub use driver::{run_batch, BatchDriver};
pub use report::{BatchReport, UnitFailure};
