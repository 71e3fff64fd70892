//! # vk2yadisk
//!
//! A command-line tool that exports VK profile photos to a Yandex.Disk folder.
//!
//! Each photo is uploaded in its largest available size and named after its
//! like count (`"12.jpg"`). Files already present in the destination folder
//! are skipped, so repeated runs only upload new photos.
//!
//! ## Features
//!
//! - Picks the highest-resolution variant of every photo
//! - Deterministic, popularity-based file names, with a legacy-compatible
//!   naming policy and a collision-free one
//! - Plans uploads against the current folder listing and skips existing files
//! - Disk fetches each photo by URL; nothing is downloaded locally
//! - Per-file error reporting; one failed upload never stops the run
//! - Optional JSON manifest of every exported photo

pub mod config;
pub mod disk;
pub mod error;
pub mod export;
pub mod manifest;
pub mod mock;
pub mod naming;
pub mod photo;
pub mod plan;
pub mod store;
pub mod sync;
pub mod upload;
pub mod vk;
