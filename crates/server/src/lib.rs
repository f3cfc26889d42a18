//! HTTP prediction service for the bioink printability model

pub mod api;
pub mod config;
