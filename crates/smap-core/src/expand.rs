//! Expansion of virtual children advertised by a page.
//!
//! Runs right after the parent's own entry has been emitted. Each advertised
//! suffix becomes `{parent}/{suffix}/` on the parent's canonical URL, takes one
//! unit of budget, and is recorded without a duplicate check.

use crate::state::GenerationState;
use crate::types::{LanguageVariant, SitemapEntry};
use crate::Result;
use tracing::debug;

/// Whether traversal may continue after a pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep walking.
    Continue,
    /// The cap was reached; stop the whole traversal.
    Stop,
}

/// Append entries for `variant`'s virtual children to `entries`.
///
/// Variants without the capability cost nothing. Stops at the first child that
/// cannot get budget and reports [`Flow::Stop`].
pub fn expand_virtual_children(
    variant: &LanguageVariant,
    parent_url: &str,
    state: &mut GenerationState,
    entries: &mut Vec<SitemapEntry>,
) -> Result<Flow> {
    let Some(provider) = variant.virtual_child_provider() else {
        return Ok(Flow::Continue);
    };

    let children = provider.virtual_children()?;
    debug!(
        node = %variant.node,
        language = %variant.language,
        count = children.len(),
        "Expanding virtual children"
    );

    for child in children {
        if !state.try_reserve() {
            debug!(node = %variant.node, "Entry cap reached during virtual expansion");
            return Ok(Flow::Stop);
        }

        let url = virtual_url(parent_url, &child.suffix);
        state.add_unchecked(url.clone());
        entries.push(SitemapEntry {
            url,
            lastmod_override: child.lastmod,
            variant: variant.clone(),
        });
    }

    Ok(Flow::Continue)
}

/// Join a suffix onto a parent URL with exactly one slash between them and a
/// trailing slash at the end.
#[must_use]
pub fn virtual_url(parent_url: &str, suffix: &str) -> String {
    format!(
        "{}/{}/",
        parent_url.trim_end_matches('/'),
        suffix.trim_matches('/')
    )
}
