//! Translated 2D texture references.
//!
//! A [`TextureData`] ties an image id to the sampler state the source
//! document requested. Only 2D textures exist; source formats declaring
//! other dimensionalities are rejected by the translators.

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest neighbor filtering.
    Nearest,
    /// Linear filtering.
    #[default]
    Linear,
}

/// Mip level selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MipmapMode {
    /// Sample the base level only.
    Base,
    /// Nearest mip level.
    Nearest,
    /// Linear interpolation between mip levels.
    #[default]
    Linear,
}

/// Texture address mode (wrapping behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Clamp to edge.
    ClampToEdge,
    /// Repeat.
    #[default]
    Repeat,
    /// Mirrored repeat.
    MirrorRepeat,
}

/// A translated 2D texture: an image reference plus sampler state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureData {
    /// Referenced image id.
    pub image: u32,
    /// Magnification filter.
    pub mag_filter: FilterMode,
    /// Minification filter.
    pub min_filter: FilterMode,
    /// Mip level selection.
    pub mipmap: MipmapMode,
    /// Address mode for the U coordinate.
    pub address_mode_u: AddressMode,
    /// Address mode for the V coordinate.
    pub address_mode_v: AddressMode,
}

impl TextureData {
    /// Linear/repeat sampler state referencing `image`, the default when
    /// the source declares no sampler.
    pub fn linear_repeat(image: u32) -> Self {
        Self {
            image,
            mag_filter: FilterMode::Linear,
            min_filter: FilterMode::Linear,
            mipmap: MipmapMode::Linear,
            address_mode_u: AddressMode::Repeat,
            address_mode_v: AddressMode::Repeat,
        }
    }
}
