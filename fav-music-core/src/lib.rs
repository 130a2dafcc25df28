#![doc = "fav-music-core: pipeline library for the fav-music widget job."]

//! This crate holds the data models, the collaborator traits and the pipeline
//! stages: playlist fetching, track enrichment, widget rendering and publishing.
//! The CLI crate only wires configuration and the FTP client into it.

pub mod cache;
pub mod config;
pub mod contract;
pub mod enrich;
pub mod media;
pub mod playlist;
pub mod publish;
pub mod render;
pub mod songlink;
pub mod synchronise;
pub mod transcode;
