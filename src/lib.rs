pub mod changeset;
pub mod cli;
pub mod compare;
pub mod config;
pub mod diff;
pub mod error;
pub mod filter;
pub mod group;
pub mod ingest;
pub mod model;
pub mod parsers;
pub mod threshold;
