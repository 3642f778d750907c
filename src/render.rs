//! Gallery markup for an artifact set.
//!
//! Paths in an [`ArtifactSet`] are relative to the public root, which is
//! served at `/`. Maud escapes every interpolated value, so titles typed into
//! the admin form are safe to use as alt text.

use crate::upload::ArtifactSet;
use maud::{Markup, html};

/// Full-size `<picture>`: WebP `<source>` when the set has one, with the
/// main image as the `<img>` fallback.
pub fn picture(set: &ArtifactSet, alt: &str) -> Markup {
    html! {
        picture {
            @if let Some(webp) = &set.webp_path {
                source type="image/webp" srcset=(public_url(webp));
            }
            img src=(public_url(&set.original_path))
                width=(set.width)
                height=(set.height)
                alt=(alt)
                loading="lazy";
        }
    }
}

/// Grid thumbnail linking to `href`.
///
/// There is no thumbnail-sized WebP variant, so this is a plain `<img>`.
pub fn thumbnail(set: &ArtifactSet, alt: &str, href: &str) -> Markup {
    html! {
        a.thumb href=(href) {
            img src=(public_url(&set.thumbnail_path))
                width=(set.thumbnail_width)
                height=(set.thumbnail_height)
                alt=(alt)
                loading="lazy";
        }
    }
}

fn public_url(relative: &str) -> String {
    format!("/{}", relative.trim_start_matches('/'))
}
