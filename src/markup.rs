//! Recovery of resource ids from editor markup.
//!
//! The rich-text editor embeds repository objects as `<img>` or `<a>` tags carrying the
//! `edusharing_atto` class; their `src`/`href` holds a `resourceId=<id>&…` query fragment.

// std
use std::{collections::BTreeSet, sync::LazyLock};
// crates.io
use regex::Regex;
// self
use crate::auth::ResourceId;

const RESOURCE_ID_MARKER: &str = "resourceId=";

static IMAGE_EMBED: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?is)<img.*?class=".*?edusharing_atto.*?".*?>"#)
		.expect("Image embed pattern should compile.")
});
static LINK_EMBED: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?is)<a.*?class=".*?edusharing_atto.*?">.*?</a>"#)
		.expect("Link embed pattern should compile.")
});

/// Returns the ids of every embedded resource found in `text`.
///
/// Tags without a `resourceId=` parameter terminated by `&`, or with a non-numeric id, are
/// skipped.
pub fn extract_resource_ids(text: &str) -> BTreeSet<ResourceId> {
	[&*IMAGE_EMBED, &*LINK_EMBED]
		.into_iter()
		.flat_map(|pattern| pattern.find_iter(text))
		.filter_map(|tag| resource_id_of(tag.as_str()))
		.collect()
}

fn resource_id_of(tag: &str) -> Option<ResourceId> {
	let start = tag.find(RESOURCE_ID_MARKER)? + RESOURCE_ID_MARKER.len();
	let rest = &tag[start..];
	let end = rest.find('&')?;

	rest[..end].parse().ok()
}
