//! Per-build data model: routes, their resolved metadata, and the shared
//! asset manifest.

use crate::config::{Layout, RouteConfig, SiteConfig, SiteSectionConfig, Strategy};
use crate::core::{RoutePath, RoutePathError};

// ============================================================================
// MetadataRecord
// ============================================================================

/// Per-route SEO metadata.
///
/// Every field is optional. After [`MetadataRecord::resolve`], a `None`
/// means "leave the document's tag alone".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical: Option<String>,
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_url: Option<String>,
}

impl MetadataRecord {
    /// Values declared on a route entry, trimmed, blanks dropped.
    pub fn from_route(entry: &RouteConfig) -> Self {
        let clean = |v: &Option<String>| non_empty(v.as_deref());
        Self {
            title: clean(&entry.title),
            description: clean(&entry.description),
            canonical: clean(&entry.canonical),
            og_title: clean(&entry.og_title),
            og_description: clean(&entry.og_description),
            og_url: clean(&entry.og_url),
        }
    }

    /// Fill unset fields from site-wide defaults.
    ///
    /// - `title`, `description`: `[site]` values
    /// - `canonical`: `site.url` joined with the route path
    /// - `og_title`, `og_description`, `og_url`: the resolved title,
    ///   description and canonical
    pub fn resolve(&self, site: &SiteSectionConfig, route: &RoutePath) -> Self {
        let title = self.title.clone().or_else(|| non_empty(Some(&site.title)));
        let description = self
            .description
            .clone()
            .or_else(|| non_empty(Some(&site.description)));
        let canonical = self.canonical.clone().or_else(|| {
            site.url
                .as_deref()
                .and_then(|base| non_empty(Some(base)))
                .map(|base| join_site_url(&base, route))
        });

        Self {
            og_title: self.og_title.clone().or_else(|| title.clone()),
            og_description: self.og_description.clone().or_else(|| description.clone()),
            og_url: self.og_url.clone().or_else(|| canonical.clone()),
            title,
            description,
            canonical,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Absolute URL of a route under the site URL.
///
/// `https://example.org` + `/about` → `https://example.org/about`,
/// the root maps to `https://example.org/`.
pub fn join_site_url(base: &str, route: &RoutePath) -> String {
    let base = base.trim_end_matches('/');
    if route.is_root() {
        format!("{base}/")
    } else {
        format!("{base}{}", route.to_encoded())
    }
}

// ============================================================================
// Route
// ============================================================================

/// One route of the build, with metadata already resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: RoutePath,
    pub strategy: Strategy,
    /// Template file name under the templates directory.
    pub template: String,
    pub layout: Layout,
    pub metadata: MetadataRecord,
}

impl Route {
    pub fn from_config(entry: &RouteConfig, site: &SiteSectionConfig) -> Result<Self, RoutePathError> {
        let path = RoutePath::parse(&entry.path)?;
        Ok(Self {
            template: entry.template_name(&path),
            strategy: entry.strategy,
            layout: entry.layout,
            metadata: MetadataRecord::from_route(entry).resolve(site, &path),
            path,
        })
    }

    /// The route table of a validated config.
    pub fn table(config: &SiteConfig) -> Result<Vec<Self>, RoutePathError> {
        config
            .routes
            .iter()
            .map(|entry| Self::from_config(entry, &config.site))
            .collect()
    }
}

// ============================================================================
// AssetManifest
// ============================================================================

/// Kind of an application asset tag, in manifest order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetKind {
    Stylesheet,
    ModulePreload,
    ModuleScript,
}

/// One asset tag as it appears in the reference document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetTag {
    pub kind: AssetKind,
    /// Unescaped `href`/`src` value.
    pub url: String,
    /// Original source text of the tag (for scripts, including `</script>`).
    pub html: String,
}

/// Ordered asset tags every materialized page must carry.
///
/// Stylesheets first, then module preloads, then module scripts; document
/// order within each group. A URL appears at most once: the first tag that
/// references it wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetManifest {
    tags: Vec<AssetTag>,
}

impl AssetManifest {
    /// Build from tags in document order.
    pub fn new(tags: impl IntoIterator<Item = AssetTag>) -> Self {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut tags: Vec<_> = tags
            .into_iter()
            .filter(|tag| seen.insert(tag.url.clone()))
            .collect();
        // Stable: keeps document order inside a group
        tags.sort_by_key(|tag| tag.kind);
        Self { tags }
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetTag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Every URL of this manifest also appears in `other`.
    pub fn is_subset_of(&self, other: &AssetManifest) -> bool {
        self.tags.iter().all(|tag| other.tags.iter().any(|o| o.url == tag.url))
    }
}
