//! Popularity-based file naming.
//!
//! Every photo is named after its like count. Photos that share a like count
//! form a group, and how members of a group are told apart is decided by the
//! [`NamingPolicy`]:
//!
//! - `Compatible` reproduces the names written by the legacy exporter, where
//!   every member of a group gets `"<likes> <likes>.jpg"`. Those names collide,
//!   so only the last member of the group survives in the export set.
//! - `Indexed` numbers the members of a group from 1: `"<likes> 1.jpg"`,
//!   `"<likes> 2.jpg"`, ... Names are always unique.
//!
//! Singleton groups are `"<likes>.jpg"` under both policies.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ExportError;
use crate::photo::{ExportedFile, Photo, select_best};

/// How photos sharing a like count are named
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingPolicy {
    /// Legacy names; members of a multi-photo group share one name
    #[default]
    Compatible,
    /// Members of a multi-photo group get a 1-based sequence number
    Indexed,
}

/// File name for the photo at `group_index` (0-based) in a group of
/// `group_size` photos that all have `like_count` likes.
pub fn file_name(
    like_count: u64,
    group_size: usize,
    group_index: usize,
    policy: NamingPolicy,
) -> String {
    if group_size <= 1 {
        return format!("{like_count}.jpg");
    }

    match policy {
        NamingPolicy::Compatible => format!("{like_count} {like_count}.jpg"),
        NamingPolicy::Indexed => format!("{like_count} {}.jpg", group_index + 1),
    }
}

/// Names every photo in `photos`.
///
/// The result has one entry per input photo, in input order. Photos without
/// any size variant come back as `Err` and are left out of grouping, so they
/// never affect the names of their valid neighbours.
pub fn assign_names(
    photos: &[Photo],
    policy: NamingPolicy,
) -> Vec<Result<ExportedFile, ExportError>> {
    // Group sizes and each photo's index within its group, in one pass
    let mut group_sizes: HashMap<u64, usize> = HashMap::new();
    let mut slots = Vec::with_capacity(photos.len());

    for (position, photo) in photos.iter().enumerate() {
        match select_best(&photo.variants, position) {
            Ok(variant) => {
                let size = group_sizes.entry(photo.like_count).or_insert(0);
                slots.push(Ok((photo.like_count, *size, variant)));
                *size += 1;
            }
            Err(e) => slots.push(Err(e)),
        }
    }

    slots
        .into_iter()
        .map(|slot| {
            let (like_count, group_index, variant) = slot?;
            let group_size = group_sizes[&like_count];
            let name = file_name(like_count, group_size, group_index, policy);
            debug!(
                "Named photo with {like_count} likes as {name} ({}x{}, size {})",
                variant.width, variant.height, variant.size_tag
            );
            Ok(ExportedFile {
                file_name: name,
                source_url: variant.url.clone(),
                size_tag: variant.size_tag.clone(),
            })
        })
        .collect()
}
