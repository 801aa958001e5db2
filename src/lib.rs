//! MediaSage - multimedia content analysis with a durable local history.
//!
//! Heterogeneous content (plain text, PDF and DOCX documents, images) is
//! classified, extracted, run through an external analysis service, and
//! stored in a searchable, exportable local history.

pub mod cli;
pub mod config;
pub mod ingest;
pub mod llm;
pub mod models;
pub mod repository;
pub mod services;
pub mod utils;
