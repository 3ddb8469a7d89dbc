//! Visibility filtering by `private` flag and tags.

use moondoc_model::{Annotated, ClassDoc};

/// Drop functions, properties and types hidden by `--show-private` / `--filter`.
///
/// By default, private items are excluded. Use `show_private` to include them.
/// Filters support inclusion (e.g. "core") and exclusion (e.g. "!deprecated")
/// by tag. The special tag "private" maps to the `private` annotation.
pub fn apply(doc: &mut ClassDoc, show_private: bool, filters: &[String]) {
    doc.functions.retain(|f| is_visible(f, show_private, filters));
    doc.properties.retain(|p| is_visible(p, show_private, filters));
    doc.types.retain(|t| is_visible(t, show_private, filters));
}

fn is_visible<T: Annotated>(item: &T, show_private: bool, filters: &[String]) -> bool {
    if item.is_private() && !show_private && !filters.iter().any(|f| f == "private") {
        return false;
    }

    for filter in filters {
        if filter == "private" {
            // Handled above (inclusion)
            continue;
        }
        if let Some(excluded) = filter.strip_prefix('!') {
            let hit = match excluded {
                "private" => item.is_private(),
                "deprecated" => item.is_deprecated(),
                "unreleased" => item.is_unreleased(),
                tag => item.tags().iter().any(|t| t == tag),
            };
            if hit {
                return false;
            }
        } else if !item.tags().iter().any(|t| t == filter) {
            return false;
        }
    }

    true
}
