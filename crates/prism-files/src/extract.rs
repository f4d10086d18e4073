//! Text extraction by media type
//!
//! Each extractor produces a plain-text rendering suitable for prompt
//! context, bounded by the configured limits. Failures return a reason
//! string; the caller renders it as an in-band placeholder instead of
//! failing the request.

use std::sync::OnceLock;

use regex::Regex;

/// Bounds applied during extraction
#[derive(Debug, Clone, Copy)]
pub struct ExtractionLimits {
    /// Max characters of extracted text per file
    pub max_chars_per_file: usize,
    /// Max characters for the whole assembled preamble
    pub max_total_chars: usize,
    /// Data rows shown for tabular files
    pub csv_sample_rows: usize,
}

impl Default for ExtractionLimits {
    fn default() -> Self {
        Self {
            max_chars_per_file: 8_000,
            max_total_chars: 32_000,
            csv_sample_rows: 5,
        }
    }
}

/// Media types with a registered extractor
const TEXT_TYPES: &[&str] = &[
    "text/plain",
    "text/markdown",
    "text/x-python",
    "text/x-rust",
    "application/javascript",
    "text/javascript",
];

/// Whether the media type has a registered extractor
pub fn is_extractable(media_type: &str) -> bool {
    TEXT_TYPES.contains(&media_type)
        || matches!(
            media_type,
            "text/csv" | "application/json" | "application/xml" | "text/xml" | "text/html"
        )
}

/// Extract prompt-ready text from an artifact payload
///
/// # Errors
///
/// Returns a human-readable reason when the payload cannot be processed
pub fn extract_text(media_type: &str, bytes: &[u8], limits: &ExtractionLimits) -> Result<String, String> {
    let text = match media_type {
        "text/csv" => extract_csv(bytes, limits),
        "application/json" => extract_json(bytes)?,
        "application/xml" | "text/xml" => extract_xml(bytes),
        "text/html" => extract_html(bytes),
        t if TEXT_TYPES.contains(&t) => decode(bytes),
        other => return Err(format!("unsupported media type: {other}")),
    };

    Ok(truncate_chars(&text, limits.max_chars_per_file))
}

/// Lossy UTF-8 decode with preserved newlines
fn decode(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Header line plus a bounded sample of data rows
fn extract_csv(bytes: &[u8], limits: &ExtractionLimits) -> String {
    let text = decode(bytes);
    let mut lines = text.lines();

    let Some(header) = lines.next() else {
        return "Empty CSV file".to_owned();
    };

    let rows: Vec<&str> = lines.filter(|l| !l.trim().is_empty()).collect();

    let mut out = Vec::new();
    out.push(format!("CSV with {} data rows", rows.len()));
    out.push(header.to_owned());
    for row in rows.iter().take(limits.csv_sample_rows) {
        out.push((*row).to_owned());
    }
    if rows.len() > limits.csv_sample_rows {
        out.push(format!("... and {} more rows", rows.len() - limits.csv_sample_rows));
    }

    out.join("\n")
}

/// Top-level structure summary followed by a pretty-printed body
fn extract_json(bytes: &[u8]) -> Result<String, String> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| format!("invalid JSON: {e}"))?;

    let mut out = Vec::new();

    if let Some(object) = value.as_object() {
        out.push(format!("JSON object with {} top-level keys:", object.len()));
        for (key, val) in object {
            out.push(format!("  {key}: {}", json_type_name(val)));
        }
        out.push(String::new());
    }

    let pretty = serde_json::to_string_pretty(&value).map_err(|e| format!("serialization failed: {e}"))?;
    out.push(truncate_chars(&pretty, 2_000));

    Ok(out.join("\n"))
}

const fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Root element cue plus tag-stripped text content
fn extract_xml(bytes: &[u8]) -> String {
    let text = decode(bytes);

    let root = root_element_re()
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned());

    let stripped = strip_tags(&text);

    match root {
        Some(root) => format!("XML document with root element <{root}>\n{stripped}"),
        None => stripped,
    }
}

/// Script/style removal, tag stripping, whitespace collapse
fn extract_html(bytes: &[u8]) -> String {
    let text = decode(bytes);
    let without_scripts = script_style_re().replace_all(&text, " ");
    strip_tags(&without_scripts)
}

fn strip_tags(text: &str) -> String {
    let stripped = tag_re().replace_all(text, " ");
    whitespace_re().replace_all(&stripped, " ").trim().to_owned()
}

fn root_element_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<\s*([A-Za-z_][\w.-]*)").expect("must be valid regex"))
}

fn script_style_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>").expect("must be valid regex")
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("must be valid regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("must be valid regex"))
}

/// Truncate at a character boundary, marking the cut in-band
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{cut}\n... (truncated)")
}
