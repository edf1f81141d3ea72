//! Image extraction for picture shapes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use deck_core::{ImageExtractionError, ImageNaming, ImageRecord, ImageStore};
use std::io::{Read, Seek};

use crate::package::{Package, Relationships};
use crate::shapes::PictureRef;

/// Turns picture shapes into image records, persisting their bytes.
#[derive(Debug, Clone, Default)]
pub struct ImageExtractor {
    naming: ImageNaming,
}

impl ImageExtractor {
    pub fn new(naming: ImageNaming) -> Self {
        Self { naming }
    }

    /// Extract one picture.
    ///
    /// The media bytes are written to `store` under the derived file name,
    /// then read back and base64 encoded, so the record always describes
    /// what the store held at that moment.
    pub fn extract<R, S>(
        &self,
        package: &mut Package<R>,
        relationships: &Relationships,
        picture: &PictureRef,
        store: &mut S,
    ) -> Result<ImageRecord, ImageExtractionError>
    where
        R: Read + Seek,
        S: ImageStore + ?Sized,
    {
        let embed = picture
            .embed
            .as_deref()
            .ok_or(ImageExtractionError::MissingEmbed)?;

        let rel = relationships
            .get(embed)
            .ok_or_else(|| ImageExtractionError::UnknownRelationship(embed.to_string()))?;

        if rel.external {
            return Err(ImageExtractionError::ExternalImage(rel.target.clone()));
        }

        let bytes = package
            .read_part(&rel.target)
            .map_err(|e| ImageExtractionError::MissingMedia {
                part: rel.target.clone(),
                reason: e.to_string(),
            })?;

        let name = self.naming.file_name(base_name(&rel.target)?, &bytes);

        store
            .persist(&name, &bytes)
            .map_err(|source| ImageExtractionError::Persist {
                name: name.clone(),
                source,
            })?;

        let stored = store.load(&name).map_err(|source| ImageExtractionError::Load {
            name: name.clone(),
            source,
        })?;

        log::debug!("Extracted {} ({} bytes)", name, stored.len());
        Ok(ImageRecord::new(name, STANDARD.encode(&stored)))
    }
}

/// Last path segment of a media target, e.g. `image1.png`.
pub(crate) fn base_name(target: &str) -> Result<&str, ImageExtractionError> {
    let name = target.rsplit(['/', '\\']).next().unwrap_or(target);
    if name.is_empty() || name == "." || name == ".." {
        return Err(ImageExtractionError::InvalidFileName(target.to_string()));
    }
    Ok(name)
}
