//! VLQ-encoded source maps (spec §4.8/§6): "the industry-standard VLQ-mapped
//! text format; the core guarantees that for any IR node whose original
//! source column differs from that of the preceding IR node on the same
//! generated line, a distinct mapping is emitted."

use serde::Serialize;

const BASE64_ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// One recorded position: where a piece of generated output came from in
/// the original source. `source_file` indexes into [`RawSourceMap::sources`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    pub generated_line: u32,
    pub generated_col: u32,
    pub source_file: u32,
    pub original_line: u32,
    pub original_col: u32,
}

/// The wire representation of a source map: version 3, one `sources` entry
/// per distinct input file, and `mappings` as the VLQ-encoded segment text.
#[derive(Debug, Serialize)]
pub struct RawSourceMap {
    pub version: u32,
    pub file: String,
    pub sources: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

fn encode_vlq(value: i64) -> String {
    let mut value = if value < 0 { ((-value) << 1) | 1 } else { value << 1 } as u64;
    let mut out = String::new();
    loop {
        let mut digit = (value & 0b11111) as u8;
        value >>= 5;
        if value > 0 {
            digit |= 0b100000;
        }
        out.push(BASE64_ALPHABET[digit as usize] as char);
        if value == 0 {
            break;
        }
    }
    out
}

/// Builds the `mappings` string from a list of mappings already in
/// generated-output order. Each segment's fields are encoded relative to the
/// previous segment's, per the VLQ source-map convention; the generated-line
/// counter resets the per-line column/source/original-line/original-col
/// deltas (each line starts counting from the previous line's final state
/// except generated column, which resets to 0 every line).
pub fn encode_mappings(mappings: &[Mapping]) -> String {
    let mut out = String::new();
    let mut prev_generated_line = 0u32;
    let mut prev_generated_col = 0i64;
    let mut prev_source_file = 0i64;
    let mut prev_original_line = 0i64;
    let mut prev_original_col = 0i64;

    for m in mappings {
        while prev_generated_line < m.generated_line {
            out.push(';');
            prev_generated_line += 1;
            prev_generated_col = 0;
        }
        if !out.ends_with(';') && !out.is_empty() {
            out.push(',');
        }
        out.push_str(&encode_vlq(m.generated_col as i64 - prev_generated_col));
        out.push_str(&encode_vlq(m.source_file as i64 - prev_source_file));
        out.push_str(&encode_vlq(m.original_line as i64 - prev_original_line));
        out.push_str(&encode_vlq(m.original_col as i64 - prev_original_col));
        prev_generated_col = m.generated_col as i64;
        prev_source_file = m.source_file as i64;
        prev_original_line = m.original_line as i64;
        prev_original_col = m.original_col as i64;
    }
    out
}

impl RawSourceMap {
    pub fn build(output_file: &str, sources: Vec<String>, mappings: &[Mapping]) -> Self {
        RawSourceMap {
            version: 3,
            file: output_file.to_string(),
            sources,
            names: Vec::new(),
            mappings: encode_mappings(mappings),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("RawSourceMap fields are all directly serializable")
    }
}
