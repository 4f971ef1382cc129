use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::Parser;
use sdfatlas_font::OutlineFont;
use sdfatlas_types::Charset;
use tracing::info;

use crate::{
    config::{OptionResolver, PartialOptions, TextureSize, parse_field_type, parse_output_type},
    generator::{AtlasGenerator, AtlasOutput, GenerateRequest},
    metadata::ResumeSettings,
    progress::GlyphBar,
    raster::ProcessRasterizer,
    telemetry,
};

#[derive(Parser, Debug)]
#[command(version, about = "Generate distance field font atlases with BMFont metadata")]
pub struct Cli {
    #[arg(value_name = "FONT", help = "TrueType or OpenType font file")]
    pub font: PathBuf,

    #[arg(short = 'o', long, value_name = "FORMAT", help = "Font file format: xml, json or txt")]
    pub output_type: Option<String>,

    #[arg(short = 'f', long, value_name = "NAME", help = "Base name of the output files")]
    pub filename: Option<String>,

    #[arg(short = 's', long, value_name = "PX", help = "Font size for the generated glyphs")]
    pub font_size: Option<f64>,

    #[arg(short = 'i', long, value_name = "FILE", conflicts_with = "charset")]
    pub charset_file: Option<PathBuf>,

    #[arg(long, value_name = "CHARS", help = "Characters to include")]
    pub charset: Option<String>,

    #[arg(short = 'm', long, value_name = "W,H", help = "Maximum page size")]
    pub texture_size: Option<String>,

    #[arg(short = 'p', long, value_name = "PX", help = "Padding between glyphs")]
    pub texture_padding: Option<u32>,

    #[arg(short = 'b', long, value_name = "PX", help = "Space around the page edges")]
    pub border: Option<u32>,

    #[arg(short = 't', long, value_name = "TYPE", help = "Distance field type: msdf, sdf or psdf")]
    pub field_type: Option<String>,

    #[arg(short = 'd', long, value_name = "PX", help = "Distance range of the field")]
    pub distance_range: Option<u32>,

    #[arg(long, value_name = "DIGITS", help = "Round fractional metrics to this many decimals")]
    pub round_decimal: Option<u32>,

    #[arg(long, help = "Shrink pages to fit their glyphs")]
    pub smart_size: bool,

    #[arg(long, help = "Use power-of-two page sizes")]
    pub pot: bool,

    #[arg(long, help = "Use square page sizes")]
    pub square: bool,

    #[arg(short = 'v', long, help = "Also write an SVG outline overlay per page")]
    pub vector: bool,

    #[arg(long, value_name = "PX", help = "Drop contours smaller than this")]
    pub tolerance: Option<f64>,

    #[arg(short = 'u', long, value_name = "FILE", help = "Resume file to extend and update")]
    pub reuse: Option<PathBuf>,

    #[arg(long, value_name = "PATH", help = "msdfgen-compatible rasterizer executable")]
    pub rasterizer: Option<PathBuf>,

    #[arg(long, value_name = "N", help = "Concurrent rasterizer processes")]
    pub concurrency: Option<usize>,

    #[arg(long, value_name = "SECS", help = "Time limit per rasterizer process")]
    pub timeout: Option<u64>,

    #[arg(short = 'c', long, value_name = "FILE", help = "TOML file with default options")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "DIR", default_value = ".", help = "Output directory")]
    pub out_dir: PathBuf,
}

impl Cli {
    /// Options given on the command line. Flags only count when set.
    pub fn explicit_options(&self) -> crate::Result<PartialOptions> {
        let charset = match (&self.charset_file, &self.charset) {
            (Some(path), _) => Some(Charset::from(std::fs::read_to_string(path)?)),
            (None, Some(chars)) => Some(Charset::from(chars.as_str())),
            (None, None) => None,
        };

        Ok(PartialOptions {
            filename: self.filename.clone(),
            output_type: self.output_type.as_deref().map(parse_output_type).transpose()?,
            charset,
            font_size: self.font_size,
            texture_size: self
                .texture_size
                .as_deref()
                .map(str::parse::<TextureSize>)
                .transpose()?,
            texture_padding: self.texture_padding,
            border: self.border,
            field_type: self.field_type.as_deref().map(parse_field_type).transpose()?,
            distance_range: self.distance_range,
            round_decimal: self.round_decimal,
            smart_size: self.smart_size.then_some(true),
            pot: self.pot.then_some(true),
            square: self.square.then_some(true),
            vector: self.vector.then_some(true),
            tolerance: self.tolerance,
            rasterizer: self.rasterizer.clone(),
            rasterizer_args: None,
            concurrency: self.concurrency,
            timeout_secs: self.timeout,
        })
    }
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init()?;

    let output = execute(&cli).await?;
    println!(
        "Generated {} page(s) and {} in {}",
        output.pages.len(),
        output.font_file.filename,
        cli.out_dir.display()
    );
    Ok(())
}

/// Resolves options, generates the atlas and writes every output file.
pub async fn execute(cli: &Cli) -> Result<AtlasOutput> {
    let explicit = cli.explicit_options()?;
    let configured = cli
        .config
        .as_deref()
        .map(PartialOptions::load_toml)
        .transpose()?
        .unwrap_or_default();
    let resume = cli
        .reuse
        .as_deref()
        .map(ResumeSettings::load)
        .transpose()
        .context("failed to read resume file")?
        .flatten();

    let options = OptionResolver::new()
        .layer(explicit)
        .layer(configured)
        .layer(resume.as_ref().map(|r| r.opt.clone()).unwrap_or_default())
        .resolve()?;

    let font = OutlineFont::open(&cli.font)
        .with_context(|| format!("failed to load font {}", cli.font.display()))?;
    let face = cli
        .font
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "font".to_string());

    let generator = AtlasGenerator::new(
        Arc::new(font),
        Arc::new(ProcessRasterizer::from_options(&options)),
    )
    .with_progress(Arc::new(GlyphBar::stderr()));
    let output = generator
        .generate(GenerateRequest {
            options,
            face,
            resume,
            output_dir: cli.out_dir.clone(),
        })
        .await?;

    write_output(&output, &cli.out_dir, cli.reuse.as_deref())?;
    Ok(output)
}

pub fn write_output(output: &AtlasOutput, out_dir: &Path, reuse: Option<&Path>) -> Result<()> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    for page in &output.pages {
        let path = out_dir.join(&page.filename);
        std::fs::write(&path, &page.png)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), width = page.width, height = page.height, "wrote page");
    }
    for vector in &output.vectors {
        std::fs::write(out_dir.join(&vector.filename), &vector.svg)?;
    }

    let font_path = out_dir.join(&output.font_file.filename);
    std::fs::write(&font_path, &output.font_file.data)
        .with_context(|| format!("failed to write {}", font_path.display()))?;
    info!(path = %font_path.display(), "wrote font file");

    if let Some(path) = reuse {
        output
            .font_file
            .settings
            .save(path)
            .with_context(|| format!("failed to write resume file {}", path.display()))?;
        info!(path = %path.display(), "wrote resume file");
    }
    Ok(())
}
