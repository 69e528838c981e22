//! Shared types for the Stable Image (v2beta) endpoints
//!
//! Wire enums serialize to the exact tokens the API expects; all of them are
//! closed, so an unrecognized token from the server fails decoding instead
//! of being silently defaulted.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Largest accepted seed value. The wire range is [0, 4294967294].
pub const SEED_MAX: u64 = 4_294_967_294;

/// Caller-selected representation for image-bearing responses
///
/// Decides the `Accept` header sent with the request and, with it, which
/// [`ImageResult`] variant the call produces. The two always agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Raw encoded image bytes (`Accept: image/*`)
    #[default]
    Image,
    /// JSON envelope with a base64 image and generation metadata
    /// (`Accept: application/json`)
    Json,
}

impl ResponseFormat {
    /// `Accept` header value for this representation
    pub fn accept(self) -> &'static str {
        match self {
            Self::Image => "image/*",
            Self::Json => "application/json",
        }
    }
}

/// Server-reported outcome for a completed generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishReason {
    /// The generation ran to completion
    Success,
    /// The output was replaced or blurred by the content filter
    ContentFiltered,
}

/// JSON envelope returned by image endpoints when JSON output is requested
#[derive(Debug, Clone, Deserialize)]
pub struct ImageArtifact {
    /// Base64-encoded image
    pub image: String,
    /// Generation outcome
    pub finish_reason: FinishReason,
    /// Seed the image was generated with
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ImageArtifact {
    /// Decode the base64 payload into raw image bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.image.as_bytes())
            .map_err(|e| Error::Decode(format!("invalid base64 image payload: {e}")))
    }
}

/// Result of an image-bearing operation
///
/// Exactly one variant is produced per call, matching the
/// [`ResponseFormat`] the caller passed in.
#[derive(Debug, Clone)]
pub enum ImageResult {
    /// Raw encoded image bytes, as returned with `Accept: image/*`
    Bytes(Vec<u8>),
    /// JSON envelope, as returned with `Accept: application/json`
    Json(ImageArtifact),
}

impl ImageResult {
    /// Raw image bytes, decoding the base64 envelope when needed.
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes),
            Self::Json(artifact) => artifact.decode(),
        }
    }

    /// Finish reason, available only for the JSON representation.
    pub fn finish_reason(&self) -> Option<FinishReason> {
        match self {
            Self::Bytes(_) => None,
            Self::Json(artifact) => Some(artifact.finish_reason),
        }
    }

    /// Generation seed, available only for the JSON representation.
    pub fn seed(&self) -> Option<u64> {
        match self {
            Self::Bytes(_) => None,
            Self::Json(artifact) => artifact.seed,
        }
    }
}

/// Output aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[serde(rename = "21:9")]
    TwentyOneByNine,
    #[serde(rename = "16:9")]
    SixteenByNine,
    #[serde(rename = "3:2")]
    ThreeByTwo,
    #[serde(rename = "5:4")]
    FiveByFour,
    #[default]
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "4:5")]
    FourByFive,
    #[serde(rename = "2:3")]
    TwoByThree,
    #[serde(rename = "9:16")]
    NineBySixteen,
    #[serde(rename = "9:21")]
    NineByTwentyOne,
}

impl AspectRatio {
    /// Wire token for this ratio (e.g. `16:9`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwentyOneByNine => "21:9",
            Self::SixteenByNine => "16:9",
            Self::ThreeByTwo => "3:2",
            Self::FiveByFour => "5:4",
            Self::Square => "1:1",
            Self::FourByFive => "4:5",
            Self::TwoByThree => "2:3",
            Self::NineBySixteen => "9:16",
            Self::NineByTwentyOne => "9:21",
        }
    }

    /// Parse a wire token (e.g. `"16:9"`)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "21:9" => Some(Self::TwentyOneByNine),
            "16:9" => Some(Self::SixteenByNine),
            "3:2" => Some(Self::ThreeByTwo),
            "5:4" => Some(Self::FiveByFour),
            "1:1" => Some(Self::Square),
            "4:5" => Some(Self::FourByFive),
            "2:3" => Some(Self::TwoByThree),
            "9:16" => Some(Self::NineBySixteen),
            "9:21" => Some(Self::NineByTwentyOne),
            _ => None,
        }
    }

    /// All defined ratios
    pub fn all() -> [Self; 9] {
        [
            Self::TwentyOneByNine,
            Self::SixteenByNine,
            Self::ThreeByTwo,
            Self::FiveByFour,
            Self::Square,
            Self::FourByFive,
            Self::TwoByThree,
            Self::NineBySixteen,
            Self::NineByTwentyOne,
        ]
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Encoded image output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    /// Wire token for this format
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }

    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    /// Parse a wire token or file extension
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Style preset guiding the image model towards a particular look
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StylePreset {
    #[serde(rename = "3d-model")]
    ThreeDModel,
    AnalogFilm,
    Anime,
    Cinematic,
    ComicBook,
    DigitalArt,
    Enhance,
    FantasyArt,
    Isometric,
    LineArt,
    LowPoly,
    ModelingCompound,
    NeonPunk,
    Origami,
    Photographic,
    PixelArt,
    TileTexture,
}

impl StylePreset {
    /// Wire token for this preset
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ThreeDModel => "3d-model",
            Self::AnalogFilm => "analog-film",
            Self::Anime => "anime",
            Self::Cinematic => "cinematic",
            Self::ComicBook => "comic-book",
            Self::DigitalArt => "digital-art",
            Self::Enhance => "enhance",
            Self::FantasyArt => "fantasy-art",
            Self::Isometric => "isometric",
            Self::LineArt => "line-art",
            Self::LowPoly => "low-poly",
            Self::ModelingCompound => "modeling-compound",
            Self::NeonPunk => "neon-punk",
            Self::Origami => "origami",
            Self::Photographic => "photographic",
            Self::PixelArt => "pixel-art",
            Self::TileTexture => "tile-texture",
        }
    }

    /// Parse a wire token (e.g. `"neon-punk"`)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "3d-model" => Some(Self::ThreeDModel),
            "analog-film" => Some(Self::AnalogFilm),
            "anime" => Some(Self::Anime),
            "cinematic" => Some(Self::Cinematic),
            "comic-book" => Some(Self::ComicBook),
            "digital-art" => Some(Self::DigitalArt),
            "enhance" => Some(Self::Enhance),
            "fantasy-art" => Some(Self::FantasyArt),
            "isometric" => Some(Self::Isometric),
            "line-art" => Some(Self::LineArt),
            "low-poly" => Some(Self::LowPoly),
            "modeling-compound" => Some(Self::ModelingCompound),
            "neon-punk" => Some(Self::NeonPunk),
            "origami" => Some(Self::Origami),
            "photographic" => Some(Self::Photographic),
            "pixel-art" => Some(Self::PixelArt),
            "tile-texture" => Some(Self::TileTexture),
            _ => None,
        }
    }
}

impl std::fmt::Display for StylePreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stable Diffusion 3.5 model variants served by the sd3 endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Sd3Model {
    #[default]
    #[serde(rename = "sd3.5-large")]
    Sd35Large,
    #[serde(rename = "sd3.5-large-turbo")]
    Sd35LargeTurbo,
    #[serde(rename = "sd3.5-medium")]
    Sd35Medium,
}

impl Sd3Model {
    /// Wire token for this model
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sd35Large => "sd3.5-large",
            Self::Sd35LargeTurbo => "sd3.5-large-turbo",
            Self::Sd35Medium => "sd3.5-medium",
        }
    }

    /// Parse a wire token (e.g. `"sd3.5-medium"`)
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sd3.5-large" => Some(Self::Sd35Large),
            "sd3.5-large-turbo" => Some(Self::Sd35LargeTurbo),
            "sd3.5-medium" => Some(Self::Sd35Medium),
            _ => None,
        }
    }
}

impl std::fmt::Display for Sd3Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Check a seed against the accepted wire range.
pub(crate) fn check_seed(seed: u64) -> Result<()> {
    if seed > SEED_MAX {
        return Err(Error::Validation(format!(
            "seed must be in [0, {SEED_MAX}], got {seed}"
        )));
    }
    Ok(())
}

/// Check a floating-point field against an inclusive range.
pub(crate) fn check_range(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if !(min..=max).contains(&value) {
        return Err(Error::Validation(format!(
            "{field} must be in [{min}, {max}], got {value}"
        )));
    }
    Ok(())
}
