//! Release document parsing and resolution
//!
//! A release document lists every image tag of a release together with the
//! pull spec it was built as. Only `references.spec.tags[].{name,from.name}`
//! is read; everything else in the document is ignored.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::{Error, ImageName, PullReference, ReleaseSource, Result};

/// Mapping of image name to pull spec, ordered by image name.
pub type ReleaseImages = BTreeMap<ImageName, PullReference>;

/// Object reference a tag points at
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectReference {
    pub name: String,
}

/// One declared image tag
#[derive(Debug, Clone, Deserialize)]
pub struct TagReference {
    pub name: String,
    pub from: ObjectReference,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageStreamSpec {
    pub tags: Vec<TagReference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageStream {
    pub spec: ImageStreamSpec,
}

/// Release document as printed by `oc adm release info --pullspecs -o json`
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    pub references: ImageStream,
}

impl ReleaseInfo {
    /// Parse a release document from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::Json)
    }

    /// Collect the declared tags into an image mapping.
    ///
    /// Fails when two tags share a name.
    pub fn images(&self) -> std::result::Result<ReleaseImages, String> {
        let mut images = ReleaseImages::new();
        for tag in &self.references.spec.tags {
            if images
                .insert(tag.name.clone(), tag.from.name.clone())
                .is_some()
            {
                return Err(format!("duplicate image tag '{}'", tag.name));
            }
        }
        Ok(images)
    }
}

/// Resolves release identifiers through a [`ReleaseSource`].
pub struct ReleaseResolver<'a, S: ReleaseSource + ?Sized> {
    source: &'a S,
}

impl<'a, S: ReleaseSource + ?Sized> ReleaseResolver<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Resolve a release into its image mapping.
    ///
    /// Any failure, including a malformed document, is a
    /// [`Error::ReleaseResolution`].
    pub async fn resolve(&self, release: &str) -> Result<ReleaseImages> {
        info!("Inspecting release {}", release);

        let document = self.source.release_info(release).await.map_err(|e| match e {
            Error::ReleaseResolution { .. } => e,
            other => Error::resolution(release, other),
        })?;

        let info = ReleaseInfo::from_json(&document)
            .map_err(|e| Error::resolution(release, format!("malformed release document: {}", e)))?;
        let images = info.images().map_err(|e| Error::resolution(release, e))?;

        debug!("Release {} declares {:?}", release, images.keys());
        info!("Found {} images", images.len());
        Ok(images)
    }
}
