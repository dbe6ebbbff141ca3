//! HTML vocabulary
//!
//! Tag and attribute sets that change how elements are compiled.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Elements which may not have content or an end tag.
static VOID_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "area", "base", "basefont", "br", "col", "command", "embed", "frame", "hr", "img", "input",
        "isindex", "keygen", "link", "meta", "param", "source", "track", "wbr",
    ]
    .into_iter()
    .collect()
});

/// Elements whose URL attributes are routed through the link interceptor.
static LINK_TAGS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "area", "audio", "base", "blockquote", "body", "del", "embed", "form", "frame",
        "head", "html", "iframe", "img", "input", "ins", "link", "object", "q", "script",
        "source", "track", "video",
    ]
    .into_iter()
    .collect()
});

static LINK_ATTRS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "action", "background", "cite", "codebase", "data", "href", "longdesc", "manifest",
        "poster", "profile", "src", "usemap",
    ]
    .into_iter()
    .collect()
});

/// Attributes rendered by presence when truthy and omitted otherwise.
static BOOL_ATTRS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "async", "autofocus", "autoplay", "checked", "controls", "default", "defer", "disabled",
        "formnovalidate", "hidden", "ismap", "loop", "multiple", "muted", "novalidate", "open",
        "readonly", "required", "reversed", "scoped", "seamless", "selected",
    ]
    .into_iter()
    .collect()
});

/// `<meta>` properties whose `content` holds a URL, keyed to the attribute naming them.
static META_LINK_PROPERTIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        // Open Graph
        ("og:url", "property"),
        ("og:image", "property"),
        ("og:image:url", "property"),
        ("og:image:secure_url", "property"),
        ("og:video", "property"),
        ("og:video:url", "property"),
        ("og:video:secure_url", "property"),
        ("og:audio", "property"),
        ("og:audio:url", "property"),
        ("og:audio:secure_url", "property"),
        // schema.org microdata
        ("image", "itemprop"),
        // Twitter cards
        ("twitter:image", "name"),
        ("twitter:image:src", "name"),
        ("twitter:image0", "name"),
        ("twitter:image1", "name"),
        ("twitter:image2", "name"),
        ("twitter:image3", "name"),
        ("twitter:player", "name"),
        ("twitter:player:stream", "name"),
    ]
    .into_iter()
    .collect()
});

pub fn is_void_tag(tag: &str) -> bool {
    VOID_TAGS.contains(tag.to_ascii_lowercase().as_str())
}

pub fn is_link_tag(tag: &str) -> bool {
    LINK_TAGS.contains(tag.to_ascii_lowercase().as_str())
}

pub fn is_link_attr(attr: &str) -> bool {
    LINK_ATTRS.contains(attr.to_ascii_lowercase().as_str())
}

pub fn is_bool_attr(attr: &str) -> bool {
    BOOL_ATTRS.contains(attr.to_ascii_lowercase().as_str())
}

/// The key attribute (`name`, `property` or `itemprop`) that marks `property` as a URL.
pub fn meta_link_key(property: &str) -> Option<&'static str> {
    META_LINK_PROPERTIES.get(property).copied()
}
