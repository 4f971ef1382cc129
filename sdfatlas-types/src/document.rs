use serde::{Deserialize, Serialize};

use crate::{Charset, FieldType};

/// BMFont-compatible font descriptor. Created once at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontDescriptor {
    pub pages: Vec<String>,
    pub chars: Vec<CharRecord>,
    pub info: InfoBlock,
    pub common: CommonBlock,
    pub distance_field: DistanceField,
    pub kernings: Vec<KerningPair>,
}

/// One glyph record with its final page placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharRecord {
    pub id: u32,
    pub index: u32,
    #[serde(rename = "char")]
    pub ch: String,
    pub width: u32,
    pub height: u32,
    pub xoffset: f64,
    pub yoffset: f64,
    pub xadvance: f64,
    pub chnl: u32,
    pub x: u32,
    pub y: u32,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoBlock {
    pub face: String,
    pub size: f64,
    pub bold: u8,
    pub italic: u8,
    pub charset: Charset,
    pub unicode: u8,
    pub stretch_h: u32,
    pub smooth: u8,
    pub aa: u8,
    pub padding: [u32; 4],
    pub spacing: [u32; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonBlock {
    pub line_height: f64,
    pub base: f64,
    pub scale_w: u32,
    pub scale_h: u32,
    pub pages: u32,
    pub packed: u8,
    pub alpha_chnl: u8,
    pub red_chnl: u8,
    pub green_chnl: u8,
    pub blue_chnl: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistanceField {
    pub field_type: FieldType,
    pub distance_range: u32,
}

/// Advance adjustment between two characters, already scaled to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KerningPair {
    pub first: u32,
    pub second: u32,
    pub amount: f64,
}
