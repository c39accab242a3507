use std::path::Path;

use super::{
    placeholder_image, DecodeError, DecodedImage, ImageDecoder, RasterDecoder, SvgDecoder,
};

/// Set of decoder plugins, selected by file extension.
///
/// When two decoders claim the same extension, the one registered last wins,
/// so applications can override a built-in backend.
pub struct DecoderRegistry {
    decoders: Vec<Box<dyn ImageDecoder>>,
}

impl DecoderRegistry {
    /// A registry with no decoders.
    pub fn empty() -> Self {
        Self {
            decoders: Vec::new(),
        }
    }

    /// A registry with the built-in raster and SVG decoders.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(RasterDecoder);
        registry.register(SvgDecoder);
        registry
    }

    pub fn register<D>(&mut self, decoder: D)
    where
        D: ImageDecoder + 'static,
    {
        log::debug!(
            "registered {} decoder for {:?}",
            decoder.name(),
            decoder.extensions()
        );
        self.decoders.push(Box::new(decoder));
    }

    /// Returns the decoder responsible for `name`, if any.
    pub fn decoder_for(&self, name: &str) -> Option<&dyn ImageDecoder> {
        let ext = extension(name)?;
        self.decoders
            .iter()
            .rev()
            .find(|d| d.extensions().contains(&ext.as_str()))
            .map(|d| d.as_ref())
    }

    /// Whether some registered decoder accepts `name`.
    pub fn can_load(&self, name: &str) -> bool {
        self.decoder_for(name).is_some()
    }

    /// Sorted, deduplicated list of accepted extensions.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut exts: Vec<&'static str> = self
            .decoders
            .iter()
            .flat_map(|d| d.extensions().iter().copied())
            .collect();
        exts.sort_unstable();
        exts.dedup();
        exts
    }

    /// Decodes the image stored at `name`.
    pub fn decode(&self, name: &str) -> Result<DecodedImage, DecodeError> {
        let decoder = self
            .decoder_for(name)
            .ok_or_else(|| DecodeError::Unsupported {
                name: name.to_string(),
            })?;

        log::trace!("decoding {name:?} with the {} decoder", decoder.name());
        decoder.decode(Path::new(name))
    }

    /// Decodes the built-in placeholder image.
    pub fn placeholder(&self) -> DecodedImage {
        DecodedImage::from_rgba(placeholder_image())
    }
}

impl Default for DecoderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}
