use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use sdfatlas_packer::PackerOptions;
use sdfatlas_types::{Charset, DEFAULT_CHARSET, FieldType, OutputFormat};
use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, Result};

pub const DEFAULT_FONT_SIZE: f64 = 42.0;
pub const DEFAULT_TEXTURE_SIZE: TextureSize = TextureSize {
    width: 2048,
    height: 2048,
};
pub const DEFAULT_DISTANCE_RANGE: u32 = 4;
pub const DEFAULT_CONCURRENCY: usize = 15;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RASTERIZER: &str = "msdfgen";

/// Maximum page size, written as `"W,H"` on the command line and as
/// `[W, H]` in persisted settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TextureSizeRepr", into = "[u32; 2]")]
pub struct TextureSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextureSizeRepr {
    Pair([u32; 2]),
    Text(String),
}

impl TryFrom<TextureSizeRepr> for TextureSize {
    type Error = AtlasError;

    fn try_from(repr: TextureSizeRepr) -> Result<Self> {
        match repr {
            TextureSizeRepr::Pair([width, height]) => Self::new(width, height),
            TextureSizeRepr::Text(text) => text.parse(),
        }
    }
}

impl From<TextureSize> for [u32; 2] {
    fn from(size: TextureSize) -> Self {
        [size.width, size.height]
    }
}

impl TextureSize {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(AtlasError::Config(format!(
                "texture size must be positive, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }
}

impl FromStr for TextureSize {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || AtlasError::Config(format!("invalid texture size {s:?}, expected W,H"));
        let (width, height) = s.split_once([',', 'x']).ok_or_else(invalid)?;
        let width = width.trim().parse().map_err(|_| invalid())?;
        let height = height.trim().parse().map_err(|_| invalid())?;
        Self::new(width, height)
    }
}

impl fmt::Display for TextureSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.width, self.height)
    }
}

pub fn parse_field_type(value: &str) -> Result<FieldType> {
    value
        .parse()
        .map_err(|_| AtlasError::Config(format!("unsupported field type {value:?}")))
}

pub fn parse_output_type(value: &str) -> Result<OutputFormat> {
    value
        .parse()
        .map_err(|_| AtlasError::Config(format!("unsupported output type {value:?}")))
}

/// Fully resolved generation options.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasOptions {
    /// Base name of every output file; defaults to the font file stem.
    pub filename: Option<String>,
    pub output_type: OutputFormat,
    pub charset: Charset,
    pub font_size: f64,
    pub texture_size: TextureSize,
    pub texture_padding: u32,
    pub border: u32,
    pub field_type: FieldType,
    pub distance_range: u32,
    pub round_decimal: Option<u32>,
    pub smart_size: bool,
    pub pot: bool,
    pub square: bool,
    pub vector: bool,
    pub tolerance: f64,
    pub rasterizer: PathBuf,
    pub rasterizer_args: Vec<String>,
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for AtlasOptions {
    fn default() -> Self {
        Self {
            filename: None,
            output_type: OutputFormat::default(),
            charset: Charset::from(DEFAULT_CHARSET),
            font_size: DEFAULT_FONT_SIZE,
            texture_size: DEFAULT_TEXTURE_SIZE,
            texture_padding: 1,
            border: 0,
            field_type: FieldType::default(),
            distance_range: DEFAULT_DISTANCE_RANGE,
            round_decimal: None,
            smart_size: false,
            pot: false,
            square: false,
            vector: false,
            tolerance: 0.0,
            rasterizer: PathBuf::from(DEFAULT_RASTERIZER),
            rasterizer_args: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AtlasOptions {
    pub fn validate(&self) -> Result<()> {
        if self.charset.is_empty() {
            return Err(AtlasError::Config(
                "charset is empty after removing control characters".to_string(),
            ));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(AtlasError::Config(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        if self.distance_range == 0 {
            return Err(AtlasError::Config(
                "distance range must be positive".to_string(),
            ));
        }
        if self.concurrency == 0 {
            return Err(AtlasError::Config("concurrency must be positive".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(AtlasError::Config("timeout must be positive".to_string()));
        }
        if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
            return Err(AtlasError::Config(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        let TextureSize { width, height } = self.texture_size;
        if self.border * 2 >= width.min(height) {
            return Err(AtlasError::Config(format!(
                "border {} leaves no room on a {width}x{height} page",
                self.border
            )));
        }
        Ok(())
    }

    /// Half the distance range: the margin around every glyph bitmap.
    pub fn pad(&self) -> u32 {
        self.distance_range / 2
    }

    pub fn packer_options(&self) -> PackerOptions {
        PackerOptions {
            width: self.texture_size.width,
            height: self.texture_size.height,
            padding: self.texture_padding,
            border: self.border,
            smart: self.smart_size,
            pot: self.pot,
            square: self.square,
        }
    }
}

/// One layer of options. Unset fields defer to lower-priority layers.
///
/// This is also the shape of `opt` in a resume file and of the `--config`
/// TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartialOptions {
    pub filename: Option<String>,
    pub output_type: Option<OutputFormat>,
    pub charset: Option<Charset>,
    pub font_size: Option<f64>,
    pub texture_size: Option<TextureSize>,
    pub texture_padding: Option<u32>,
    pub border: Option<u32>,
    pub field_type: Option<FieldType>,
    pub distance_range: Option<u32>,
    pub round_decimal: Option<u32>,
    pub smart_size: Option<bool>,
    pub pot: Option<bool>,
    pub square: Option<bool>,
    pub vector: Option<bool>,
    pub tolerance: Option<f64>,
    pub rasterizer: Option<PathBuf>,
    pub rasterizer_args: Option<Vec<String>>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
}

impl PartialOptions {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|err| AtlasError::Config(err.to_string()))
    }

    pub fn load_toml(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|err| AtlasError::Config(format!("{}: {err}", path.display())))
    }

    /// Field-wise `self.or(lower)`.
    pub fn or(self, lower: PartialOptions) -> PartialOptions {
        PartialOptions {
            filename: self.filename.or(lower.filename),
            output_type: self.output_type.or(lower.output_type),
            charset: self.charset.or(lower.charset),
            font_size: self.font_size.or(lower.font_size),
            texture_size: self.texture_size.or(lower.texture_size),
            texture_padding: self.texture_padding.or(lower.texture_padding),
            border: self.border.or(lower.border),
            field_type: self.field_type.or(lower.field_type),
            distance_range: self.distance_range.or(lower.distance_range),
            round_decimal: self.round_decimal.or(lower.round_decimal),
            smart_size: self.smart_size.or(lower.smart_size),
            pot: self.pot.or(lower.pot),
            square: self.square.or(lower.square),
            vector: self.vector.or(lower.vector),
            tolerance: self.tolerance.or(lower.tolerance),
            rasterizer: self.rasterizer.or(lower.rasterizer),
            rasterizer_args: self.rasterizer_args.or(lower.rasterizer_args),
            concurrency: self.concurrency.or(lower.concurrency),
            timeout_secs: self.timeout_secs.or(lower.timeout_secs),
        }
    }
}

impl From<&AtlasOptions> for PartialOptions {
    fn from(options: &AtlasOptions) -> Self {
        Self {
            filename: options.filename.clone(),
            output_type: Some(options.output_type),
            charset: Some(options.charset.clone()),
            font_size: Some(options.font_size),
            texture_size: Some(options.texture_size),
            texture_padding: Some(options.texture_padding),
            border: Some(options.border),
            field_type: Some(options.field_type),
            distance_range: Some(options.distance_range),
            round_decimal: options.round_decimal,
            smart_size: Some(options.smart_size),
            pot: Some(options.pot),
            square: Some(options.square),
            vector: Some(options.vector),
            tolerance: Some(options.tolerance),
            rasterizer: Some(options.rasterizer.clone()),
            rasterizer_args: Some(options.rasterizer_args.clone()),
            concurrency: Some(options.concurrency),
            timeout_secs: Some(options.timeout_secs),
        }
    }
}

/// Resolves each option from the highest-priority layer that sets it,
/// falling back to built-in defaults.
#[derive(Debug, Clone, Default)]
pub struct OptionResolver {
    layers: Vec<PartialOptions>,
}

impl OptionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a layer below every layer added so far.
    pub fn layer(mut self, options: PartialOptions) -> Self {
        self.layers.push(options);
        self
    }

    pub fn merged(&self) -> PartialOptions {
        self.layers
            .iter()
            .cloned()
            .fold(PartialOptions::default(), PartialOptions::or)
    }

    pub fn resolve(&self) -> Result<AtlasOptions> {
        let merged = self.merged();
        let defaults = AtlasOptions::default();
        let options = AtlasOptions {
            filename: merged.filename.or(defaults.filename),
            output_type: merged.output_type.unwrap_or(defaults.output_type),
            charset: merged.charset.unwrap_or(defaults.charset),
            font_size: merged.font_size.unwrap_or(defaults.font_size),
            texture_size: merged.texture_size.unwrap_or(defaults.texture_size),
            texture_padding: merged.texture_padding.unwrap_or(defaults.texture_padding),
            border: merged.border.unwrap_or(defaults.border),
            field_type: merged.field_type.unwrap_or(defaults.field_type),
            distance_range: merged.distance_range.unwrap_or(defaults.distance_range),
            round_decimal: merged.round_decimal.or(defaults.round_decimal),
            smart_size: merged.smart_size.unwrap_or(defaults.smart_size),
            pot: merged.pot.unwrap_or(defaults.pot),
            square: merged.square.unwrap_or(defaults.square),
            vector: merged.vector.unwrap_or(defaults.vector),
            tolerance: merged.tolerance.unwrap_or(defaults.tolerance),
            rasterizer: merged.rasterizer.unwrap_or(defaults.rasterizer),
            rasterizer_args: merged.rasterizer_args.unwrap_or(defaults.rasterizer_args),
            concurrency: merged.concurrency.unwrap_or(defaults.concurrency),
            timeout_secs: merged.timeout_secs.unwrap_or(defaults.timeout_secs),
        };
        options.validate()?;
        Ok(options)
    }
}
