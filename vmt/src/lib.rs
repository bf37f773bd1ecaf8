//! Parser for Source 1 `.vmt` material descriptions.
//!
//! A material is one type token followed by a loosely quoted key-value soup.
//! Braces are not structurally meaningful, so they are skipped over instead of
//! being parsed into blocks.

use std::path::Path;

use indexmap::IndexMap;

mod error;
mod parser;

pub use error::VmtError;
pub use parser::parse_parameter_line;

/// Parameter order is emission order downstream, so the map has to keep
/// file read order.
pub type ParamMap = IndexMap<String, String>;

/// Fallback shader declarations for older DirectX levels. A line naming one of
/// these opens a block that duplicates parameters we already have, so the
/// whole block is skipped.
pub const DX_FALLBACK_SHADERS: &[&str] = &[
    "vertexlitgeneric_hdr_dx9",
    "vertexlitgeneric_dx9",
    "vertexlitgeneric_dx8",
    "vertexlitgeneric_dx7",
    "lightmappedgeneric_hdr_dx9",
    "lightmappedgeneric_dx9",
    "lightmappedgeneric_dx8",
    "lightmappedgeneric_dx7",
    "unlitgeneric_dx7",
    "unlitgeneric_dx6",
];

#[derive(Debug, Clone, PartialEq)]
pub struct VmtMaterial {
    /// Lower-cased material type token from the first meaningful line,
    /// eg "lightmappedgeneric" or "patch".
    pub mat_type: String,
    pub params: ParamMap,
}

fn sanitize_type_token(line: &str) -> String {
    line.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect::<String>()
        .to_lowercase()
}

impl VmtMaterial {
    pub fn from_text(text: &str) -> Self {
        let mut mat_type = String::new();
        let mut params = ParamMap::new();
        let mut skipping_dx_block = false;
        let mut meaningful_rows = 0;

        for line in text.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('/') {
                continue;
            }

            if meaningful_rows < 1 {
                mat_type = sanitize_type_token(line);
            }

            if skipping_dx_block {
                if line.contains(']') || line.contains('}') {
                    skipping_dx_block = false;
                }
            } else {
                parse_parameter_line(line, &mut params);
            }

            let lowered = line.to_lowercase();
            if DX_FALLBACK_SHADERS.iter().any(|s| lowered.contains(s)) {
                skipping_dx_block = true;
            }

            meaningful_rows += 1;
        }

        Self { mat_type, params }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, VmtError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| VmtError::IOError { source })?;

        Ok(Self::from_text(&text))
    }

    /// Patch/include semantics: `base` is read first, then every declaration
    /// of this material is laid on top of it. Keys defined in both keep the
    /// base ordering but take this material's value.
    pub fn merge_over_base(&mut self, base: VmtMaterial) {
        let mut merged = base.params;

        for (key, value) in std::mem::take(&mut self.params) {
            merged.insert(key, value);
        }

        self.params = merged;
    }

    /// Raw values keep their quotes, callers usually want them without.
    pub fn clean_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|v| clean_value(v))
    }

    /// A parameter counts as set when it is present with a non-empty value.
    pub fn has_param(&self, key: &str) -> bool {
        self.clean_param(key).is_some_and(|v| !v.is_empty())
    }
}

/// Strips surrounding whitespace and quoting from a stored raw value.
pub fn clean_value(value: &str) -> &str {
    value.trim_matches(|c: char| c.is_whitespace() || c == '"' || c == '\'')
}
