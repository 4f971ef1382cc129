mod support;

use std::sync::Arc;

use clap::Parser;

use sdfatlas::{
    AtlasError, AtlasGenerator, GenerateRequest, OptionResolver, PartialOptions, app::Cli,
};
use sdfatlas_types::{FieldType, FontDescriptor, OutputFormat};
use support::{BoxFont, FakeRasterizer, Reply, options};

fn request(options: sdfatlas::AtlasOptions) -> GenerateRequest {
    GenerateRequest {
        options,
        face: "demo".to_string(),
        resume: None,
        output_dir: std::env::temp_dir(),
    }
}

#[tokio::test]
async fn two_glyphs_fit_one_page() -> anyhow::Result<()> {
    let backend = FakeRasterizer::new();
    let generator = AtlasGenerator::new(Arc::new(BoxFont::default()), backend.clone());

    let output = generator
        .generate(request(options("AB", FieldType::Sdf, 64, 64)))
        .await?;

    assert_eq!(backend.calls(), 2);
    assert_eq!(output.pages.len(), 1);
    assert_eq!(output.pages[0].filename, "demo.png");
    assert_eq!((output.pages[0].width, output.pages[0].height), (64, 64));

    let descriptor = &output.font_file.descriptor;
    assert_eq!(descriptor.chars.len(), 2);
    assert!(descriptor.chars.iter().all(|c| c.page == 0));
    assert_eq!(descriptor.chars[0].ch, "A");
    assert_eq!((descriptor.chars[0].width, descriptor.chars[0].height), (25, 25));
    assert_eq!(descriptor.pages, ["demo.png"]);
    assert_eq!(descriptor.common.scale_w, 64);
    assert_eq!(descriptor.distance_field.field_type, FieldType::Sdf);
    assert_eq!(descriptor.distance_field.distance_range, 4);
    assert_eq!(output.font_file.filename, "demo.fnt");
    assert!(output.vectors.is_empty());
    Ok(())
}

#[tokio::test]
async fn placements_do_not_overlap() -> anyhow::Result<()> {
    let generator = AtlasGenerator::new(Arc::new(BoxFont::default()), FakeRasterizer::new());
    let output = generator
        .generate(request(options("ABCDEFGHIJ", FieldType::Msdf, 128, 128)))
        .await?;

    let chars = &output.font_file.descriptor.chars;
    let padding = 1;
    for (i, a) in chars.iter().enumerate() {
        for b in &chars[i + 1..] {
            if a.page != b.page {
                continue;
            }
            let apart = a.x + a.width + padding <= b.x
                || b.x + b.width + padding <= a.x
                || a.y + a.height + padding <= b.y
                || b.y + b.height + padding <= a.y;
            assert!(apart, "{} and {} overlap", a.ch, b.ch);
        }
    }
    Ok(())
}

#[tokio::test]
async fn control_characters_are_dropped() -> anyhow::Result<()> {
    let generator = AtlasGenerator::new(Arc::new(BoxFont::default()), FakeRasterizer::new());
    let output = generator
        .generate(request(options("A\nB\n", FieldType::Sdf, 64, 64)))
        .await?;

    let ids: Vec<u32> = output.font_file.descriptor.chars.iter().map(|c| c.id).collect();
    assert_eq!(ids, [65, 66]);
    Ok(())
}

#[tokio::test]
async fn blank_glyphs_take_no_space() -> anyhow::Result<()> {
    let backend = FakeRasterizer::with_replies(&[('B', Reply::Fill(0))]);
    let generator = AtlasGenerator::new(Arc::new(BoxFont::default()), backend.clone());
    let output = generator
        .generate(request(options("A B", FieldType::Msdf, 64, 64)))
        .await?;

    // the space has no outline and never reaches the rasterizer
    assert_eq!(backend.calls(), 2);
    let chars = &output.font_file.descriptor.chars;
    assert_eq!(chars.len(), 3);
    for blank in [&chars[1], &chars[2]] {
        assert_eq!((blank.width, blank.height), (0, 0));
        assert!(blank.xadvance > 0.0);
    }
    assert_eq!((chars[0].x, chars[0].y), (0, 0));
    Ok(())
}

#[tokio::test]
async fn kerning_is_scaled_and_sparse() -> anyhow::Result<()> {
    let font = BoxFont::with_kerning(&[('A', 'V', -100.0), ('V', 'V', 20.0)]);
    let generator = AtlasGenerator::new(Arc::new(font), FakeRasterizer::new());
    let output = generator
        .generate(request(options("AVX", FieldType::Sdf, 128, 128)))
        .await?;

    let kernings = &output.font_file.descriptor.kernings;
    assert_eq!(kernings.len(), 2);
    assert_eq!((kernings[0].first, kernings[0].second), (65, 86));
    assert!((kernings[0].amount - (-100.0 * 42.0 / 1000.0)).abs() < 1e-9);
    assert_eq!((kernings[1].first, kernings[1].second), (86, 86));
    assert!((kernings[1].amount - 0.84).abs() < 1e-9);
    Ok(())
}

#[tokio::test]
async fn line_metrics_follow_font() -> anyhow::Result<()> {
    let generator = AtlasGenerator::new(Arc::new(BoxFont::default()), FakeRasterizer::new());
    let output = generator
        .generate(request(options("A", FieldType::Sdf, 64, 64)))
        .await?;

    let common = &output.font_file.descriptor.common;
    assert!((common.line_height - 42.0).abs() < 1e-9);
    assert!((common.base - (800.0 * 0.042 + 2.0)).abs() < 1e-9);

    let a = &output.font_file.descriptor.chars[0];
    assert_eq!(a.xoffset, -2.0);
    assert_eq!(a.yoffset, (800.0f64 * 0.042 - 21.0).round());
    Ok(())
}

#[tokio::test]
async fn rounded_document_survives_json() -> anyhow::Result<()> {
    let mut opts = options("AB", FieldType::Msdf, 64, 64);
    opts.output_type = OutputFormat::Json;
    opts.round_decimal = Some(1);
    opts.font_size = 37.0;

    let generator = AtlasGenerator::new(Arc::new(BoxFont::default()), FakeRasterizer::new());
    let output = generator.generate(request(opts)).await?;
    assert_eq!(output.font_file.filename, "demo.json");

    let parsed: FontDescriptor = serde_json::from_str(&output.font_file.data)?;
    assert_eq!(parsed, output.font_file.descriptor);

    let tenths = |v: f64| ((v * 10.0).round() / 10.0 - v).abs() < 1e-12;
    assert!(tenths(parsed.common.base));
    assert!(tenths(parsed.common.line_height));
    assert!(parsed.chars.iter().all(|c| tenths(c.xadvance)));
    assert_eq!(parsed.chars[0].xadvance, 22.2);
    Ok(())
}

#[tokio::test]
async fn xml_is_the_default_format() -> anyhow::Result<()> {
    let generator = AtlasGenerator::new(Arc::new(BoxFont::default()), FakeRasterizer::new());
    let output = generator
        .generate(request(options("A", FieldType::Sdf, 64, 64)))
        .await?;
    assert!(output.font_file.data.starts_with("<?xml"));
    assert!(output.font_file.data.contains("<char id=\"65\""));
    Ok(())
}

#[tokio::test]
async fn vector_overlay_per_page() -> anyhow::Result<()> {
    let mut opts = options("AB", FieldType::Msdf, 64, 64);
    opts.vector = true;
    let generator = AtlasGenerator::new(Arc::new(BoxFont::default()), FakeRasterizer::new());
    let output = generator.generate(request(opts)).await?;

    assert_eq!(output.vectors.len(), 1);
    assert_eq!(output.vectors[0].filename, "demo.svg");
    assert_eq!(output.vectors[0].svg.matches("<path").count(), 2);
    Ok(())
}

/// Command line to generator, the way the binary wires it.
async fn generate_from_args(
    args: &[&str],
    backend: Arc<FakeRasterizer>,
) -> sdfatlas::Result<sdfatlas::AtlasOutput> {
    let cli = Cli::parse_from(args);
    let options = OptionResolver::new().layer(cli.explicit_options()?).resolve()?;
    AtlasGenerator::new(Arc::new(BoxFont::default()), backend)
        .generate(request(options))
        .await
}

#[tokio::test]
async fn unsupported_field_type_fails_before_rasterizing() -> anyhow::Result<()> {
    let backend = FakeRasterizer::new();
    let result = generate_from_args(
        &["sdfatlas", "demo.ttf", "--charset", "AB", "-t", "foo"],
        backend.clone(),
    )
    .await;
    assert!(matches!(result, Err(AtlasError::Config(message)) if message.contains("foo")));
    assert_eq!(backend.calls(), 0);

    // the same command line with a known type does reach the rasterizer
    generate_from_args(
        &["sdfatlas", "demo.ttf", "--charset", "AB", "-t", "sdf"],
        backend.clone(),
    )
    .await?;
    assert_eq!(backend.calls(), 2);
    Ok(())
}

#[tokio::test]
async fn unsupported_field_type_in_config_is_rejected() {
    let resolved = PartialOptions::from_toml_str("fieldType = \"foo\"")
        .and_then(|layer| OptionResolver::new().layer(layer).resolve());
    assert!(matches!(resolved, Err(AtlasError::Config(_))));
}

#[tokio::test]
async fn invalid_options_fail_before_rasterizing() {
    let backend = FakeRasterizer::new();
    let generator = AtlasGenerator::new(Arc::new(BoxFont::default()), backend.clone());

    let mut opts = options("AB", FieldType::Sdf, 64, 64);
    opts.concurrency = 0;
    let result = generator.generate(request(opts)).await;

    assert!(matches!(result, Err(AtlasError::Config(_))));
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn rasterizer_failure_fails_the_run() {
    let backend = FakeRasterizer::with_replies(&[('C', Reply::Fail)]);
    let generator = AtlasGenerator::new(Arc::new(BoxFont::default()), backend);
    let result = generator
        .generate(request(options("ABCD", FieldType::Sdf, 128, 128)))
        .await;
    assert!(matches!(result, Err(AtlasError::Rasterizer { ch: 'C', .. })));
}

#[tokio::test]
async fn malformed_output_is_reported() {
    let backend = FakeRasterizer::with_replies(&[('A', Reply::Truncated)]);
    let generator = AtlasGenerator::new(Arc::new(BoxFont::default()), backend);
    let result = generator
        .generate(request(options("A", FieldType::Msdf, 64, 64)))
        .await;
    assert!(matches!(
        result,
        Err(AtlasError::MalformedOutput { ch: 'A', width: 25, height: 25, .. })
    ));
}

#[tokio::test]
async fn oversized_glyph_names_the_character() {
    let generator = AtlasGenerator::new(Arc::new(BoxFont::default()), FakeRasterizer::new());
    let result = generator
        .generate(request(options("Q", FieldType::Sdf, 16, 16)))
        .await;
    assert!(matches!(result, Err(AtlasError::Pack { ch: 'Q', .. })));
}
