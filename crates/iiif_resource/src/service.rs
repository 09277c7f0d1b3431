//! IIIF Image API service descriptors.

use serde::{Deserialize, Serialize};

use crate::one_or_many::one_or_many;

/// Image API compliance level declared by a service profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ComplianceLevel {
    /// Fixed sizes only; no parametrized size requests.
    Level0,
    Level1,
    Level2,
}

/// One entry of a service `profile`: a URI / bare level name, or a profile
/// description object (Image API 2 style).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileEntry {
    Uri(String),
    Descriptor(serde_json::Value),
}

/// A service attached to an image resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImageService {
    #[serde(alias = "@id")]
    pub id: String,
    /// `ImageService2`, `ImageService3`, ... (v3 `type` or v2 `@type`)
    #[serde(rename = "type", alias = "@type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub profile: Vec<ProfileEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ImageService {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile.push(ProfileEntry::Uri(profile.into()));
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    fn profile_uris(&self) -> impl Iterator<Item = &str> {
        self.profile.iter().filter_map(|entry| match entry {
            ProfileEntry::Uri(uri) => Some(uri.as_str()),
            ProfileEntry::Descriptor(_) => None,
        })
    }

    /// Compliance level from the first profile entry that names one.
    /// `None` means the profile is missing or unrecognized.
    pub fn compliance_level(&self) -> Option<ComplianceLevel> {
        self.profile_uris().find_map(|uri| {
            let uri = uri.to_ascii_lowercase();
            if uri.contains("level2") {
                Some(ComplianceLevel::Level2)
            } else if uri.contains("level1") {
                Some(ComplianceLevel::Level1)
            } else if uri.contains("level0") {
                Some(ComplianceLevel::Level0)
            } else {
                None
            }
        })
    }

    /// Whether this looks like an IIIF Image API service at all (as opposed
    /// to e.g. an auth or search service).
    pub fn is_image_service(&self) -> bool {
        let typed = self
            .kind
            .as_deref()
            .is_some_and(|kind| kind.starts_with("ImageService"));
        typed
            || self.profile_uris().any(|uri| {
                uri.contains("iiif.io/api/image")
                    || uri.contains("iiif/image-api")
                    || matches!(uri, "level0" | "level1" | "level2")
            })
    }

    /// Service id without trailing slashes, ready for URL construction.
    pub fn base_id(&self) -> &str {
        self.id.trim_end_matches('/')
    }
}
