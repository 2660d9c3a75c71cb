// src/lib.rs

pub mod config;
pub mod ingest;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod review;
pub mod vocabulary;
