//! BMFont serializations of a [`FontDescriptor`].

use std::fmt::Write;

use sdfatlas_types::{FontDescriptor, OutputFormat};

use crate::error::Result;

pub fn serialize(descriptor: &FontDescriptor, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Xml => to_xml(descriptor),
        OutputFormat::Json => serde_json::to_string(descriptor)?,
        OutputFormat::Txt => to_txt(descriptor),
    })
}

fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

fn join<T: ToString>(values: &[T]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

pub fn to_xml(d: &FontDescriptor) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<font>\n");
    let info = &d.info;
    let _ = writeln!(
        out,
        "  <info face=\"{}\" size=\"{}\" bold=\"{}\" italic=\"{}\" charset=\"{}\" unicode=\"{}\" stretchH=\"{}\" smooth=\"{}\" aa=\"{}\" padding=\"{}\" spacing=\"{}\"/>",
        escape(&info.face),
        info.size,
        info.bold,
        info.italic,
        escape(&info.charset.to_string()),
        info.unicode,
        info.stretch_h,
        info.smooth,
        info.aa,
        join(&info.padding),
        join(&info.spacing),
    );
    let common = &d.common;
    let _ = writeln!(
        out,
        "  <common lineHeight=\"{}\" base=\"{}\" scaleW=\"{}\" scaleH=\"{}\" pages=\"{}\" packed=\"{}\" alphaChnl=\"{}\" redChnl=\"{}\" greenChnl=\"{}\" blueChnl=\"{}\"/>",
        common.line_height,
        common.base,
        common.scale_w,
        common.scale_h,
        common.pages,
        common.packed,
        common.alpha_chnl,
        common.red_chnl,
        common.green_chnl,
        common.blue_chnl,
    );
    let _ = writeln!(
        out,
        "  <distanceField fieldType=\"{}\" distanceRange=\"{}\"/>",
        d.distance_field.field_type, d.distance_field.distance_range
    );

    out.push_str("  <pages>\n");
    for (id, file) in d.pages.iter().enumerate() {
        let _ = writeln!(out, "    <page id=\"{id}\" file=\"{}\"/>", escape(file));
    }
    out.push_str("  </pages>\n");

    let _ = writeln!(out, "  <chars count=\"{}\">", d.chars.len());
    for c in &d.chars {
        let _ = writeln!(
            out,
            "    <char id=\"{}\" index=\"{}\" char=\"{}\" width=\"{}\" height=\"{}\" xoffset=\"{}\" yoffset=\"{}\" xadvance=\"{}\" chnl=\"{}\" x=\"{}\" y=\"{}\" page=\"{}\"/>",
            c.id,
            c.index,
            escape(&c.ch),
            c.width,
            c.height,
            c.xoffset,
            c.yoffset,
            c.xadvance,
            c.chnl,
            c.x,
            c.y,
            c.page,
        );
    }
    out.push_str("  </chars>\n");

    let _ = writeln!(out, "  <kernings count=\"{}\">", d.kernings.len());
    for k in &d.kernings {
        let _ = writeln!(
            out,
            "    <kerning first=\"{}\" second=\"{}\" amount=\"{}\"/>",
            k.first, k.second, k.amount
        );
    }
    out.push_str("  </kernings>\n</font>\n");
    out
}

/// BMFont text format. The plain-text grammar has no quoting for `"`, so
/// the charset is left empty and records carry no `char` attribute.
pub fn to_txt(d: &FontDescriptor) -> String {
    let mut out = String::new();
    let info = &d.info;
    let _ = writeln!(
        out,
        "info face=\"{}\" size={} bold={} italic={} charset=\"\" unicode={} stretchH={} smooth={} aa={} padding={} spacing={}",
        info.face,
        info.size,
        info.bold,
        info.italic,
        info.unicode,
        info.stretch_h,
        info.smooth,
        info.aa,
        join(&info.padding),
        join(&info.spacing),
    );
    let common = &d.common;
    let _ = writeln!(
        out,
        "common lineHeight={} base={} scaleW={} scaleH={} pages={} packed={} alphaChnl={} redChnl={} greenChnl={} blueChnl={}",
        common.line_height,
        common.base,
        common.scale_w,
        common.scale_h,
        common.pages,
        common.packed,
        common.alpha_chnl,
        common.red_chnl,
        common.green_chnl,
        common.blue_chnl,
    );
    let _ = writeln!(
        out,
        "distanceField fieldType={} distanceRange={}",
        d.distance_field.field_type, d.distance_field.distance_range
    );
    for (id, file) in d.pages.iter().enumerate() {
        let _ = writeln!(out, "page id={id} file=\"{file}\"");
    }
    let _ = writeln!(out, "chars count={}", d.chars.len());
    for c in &d.chars {
        let _ = writeln!(
            out,
            "char id={} index={} width={} height={} xoffset={} yoffset={} xadvance={} chnl={} x={} y={} page={}",
            c.id, c.index, c.width, c.height, c.xoffset, c.yoffset, c.xadvance, c.chnl, c.x, c.y, c.page,
        );
    }
    let _ = writeln!(out, "kernings count={}", d.kernings.len());
    for k in &d.kernings {
        let _ = writeln!(
            out,
            "kerning first={} second={} amount={}",
            k.first, k.second, k.amount
        );
    }
    out
}
