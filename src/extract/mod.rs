//! Extraction strategies: pulling the password and username out of a
//! decrypted pass entry.
//!
//! The strategy for each field is chosen per section through the
//! `password_extractor` and `username_extractor` options:
//!
//! | Strategy        | Password | Username | Options                                  |
//! |-----------------|----------|----------|------------------------------------------|
//! | `specific_line` | yes      | yes      | `line_<field>`, `skip_<field>`           |
//! | `regex_search`  | yes      | yes      | `regex_<field>`, `skip_username`         |
//! | `entry_name`    | no       | yes      |                                          |
//! | `static`        | no       | yes      | `username`                               |

use encoding_rs::Encoding;
use regex::Regex;
use thiserror::Error;
use zeroize::Zeroizing;

use crate::errors::{HelperError, Result};
use crate::mapping::Options;

pub const SPECIFIC_LINE: &str = "specific_line";
pub const REGEX_SEARCH: &str = "regex_search";
pub const ENTRY_NAME: &str = "entry_name";
pub const STATIC: &str = "static";

/// Encoding used when a section does not set `encoding`.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Why a strategy found nothing in an entry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("Entry has no line {line}, it only has {available}")]
    LineNotFound { line: usize, available: usize },

    #[error("No entry line matches regex \"{pattern}\"")]
    NoMatch { pattern: String },

    #[error("Entry is not valid {encoding} text")]
    Decoding { encoding: String },
}

/// The credential field a strategy extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Password,
    Username,
}

impl Field {
    fn as_str(self) -> &'static str {
        match self {
            Field::Password => "password",
            Field::Username => "username",
        }
    }

    /// Option that selects the strategy, e.g. `password_extractor`.
    pub fn extractor_option(self) -> String {
        format!("{}_extractor", self.as_str())
    }

    /// Field-specific option name, e.g. `line` -> `line_password`.
    pub fn option(self, base: &str) -> String {
        format!("{base}_{}", self.as_str())
    }

    fn default_line(self) -> usize {
        match self {
            Field::Password => 0,
            Field::Username => 1,
        }
    }

    fn default_regex(self) -> &'static str {
        match self {
            Field::Password => r"^password: +(.*)$",
            Field::Username => r"^username: +(.*)$",
        }
    }
}

/// A configured strategy.
#[derive(Debug, Clone)]
pub enum Extractor {
    /// Line `line` (zero-based) with `skip` leading characters dropped.
    SpecificLine { line: usize, skip: usize },
    /// First capture group of the first line the regex matches.
    RegexSearch { regex: Regex, skip: usize },
    /// Last path segment of the pass entry name.
    EntryName,
    /// A fixed value from the mapping.
    Static { value: String },
}

impl Extractor {
    /// Build the strategy `options` select for `field`.
    ///
    /// Configuration mistakes (unknown strategy names, malformed
    /// regexes, a `static` username without a value) are reported here,
    /// before any entry is read.
    pub fn configure(field: Field, options: &Options<'_>) -> Result<Self> {
        let option = field.extractor_option();
        let name = options.get_or(&option, SPECIFIC_LINE);

        let extractor = match (name, field) {
            (SPECIFIC_LINE, _) => Extractor::SpecificLine {
                line: options.get_usize(&field.option("line"), field.default_line())?,
                skip: options.get_usize(&field.option("skip"), 0)?,
            },
            (REGEX_SEARCH, _) => Extractor::RegexSearch {
                regex: compile_regex(options.get_or(&field.option("regex"), field.default_regex()))?,
                // Only usernames ever honored a skip after a regex match.
                skip: match field {
                    Field::Password => 0,
                    Field::Username => options.get_usize(&field.option("skip"), 0)?,
                },
            },
            (ENTRY_NAME, Field::Username) => Extractor::EntryName,
            (STATIC, Field::Username) => match options.get("username").filter(|v| !v.is_empty()) {
                Some(value) => Extractor::Static {
                    value: value.to_string(),
                },
                None => return Err(HelperError::missing_option(options.section_name(), "username")),
            },
            _ => return Err(HelperError::unknown_strategy(option, name)),
        };

        tracing::debug!(
            field = field.as_str(),
            strategy = extractor.name(),
            "configured extractor"
        );
        Ok(extractor)
    }

    /// Strategy name as written in the mapping.
    pub fn name(&self) -> &'static str {
        match self {
            Extractor::SpecificLine { .. } => SPECIFIC_LINE,
            Extractor::RegexSearch { .. } => REGEX_SEARCH,
            Extractor::EntryName => ENTRY_NAME,
            Extractor::Static { .. } => STATIC,
        }
    }

    /// Extract the value from entry `entry_name` with content `lines`.
    pub fn extract(
        &self,
        entry_name: &str,
        lines: &[&str],
    ) -> std::result::Result<String, ExtractionError> {
        match self {
            Extractor::SpecificLine { line, skip } => lines
                .get(*line)
                .map(|text| skip_chars(text, *skip))
                .ok_or(ExtractionError::LineNotFound {
                    line: *line,
                    available: lines.len(),
                }),
            Extractor::RegexSearch { regex, skip } => lines
                .iter()
                .find_map(|text| {
                    let captures = regex.captures(text)?;
                    // Matches must start at the beginning of the line.
                    if captures.get(0)?.start() != 0 {
                        return None;
                    }
                    Some(captures.get(1).map_or("", |m| m.as_str()))
                })
                .map(|value| skip_chars(value, *skip))
                .ok_or_else(|| ExtractionError::NoMatch {
                    pattern: regex.as_str().to_string(),
                }),
            Extractor::EntryName => Ok(entry_name
                .rsplit_once('/')
                .map_or(entry_name, |(_, last)| last)
                .to_string()),
            Extractor::Static { value } => Ok(value.clone()),
        }
    }
}

/// Compile a regex and require exactly one capture group.
pub fn compile_regex(pattern: &str) -> Result<Regex> {
    let regex =
        Regex::new(pattern).map_err(|e| HelperError::invalid_pattern(pattern, e.to_string()))?;

    // `captures_len` counts the implicit whole-match group too.
    if regex.captures_len() != 2 {
        return Err(HelperError::invalid_pattern(
            pattern,
            "must contain a single capture group for the value to return.",
        ));
    }

    Ok(regex)
}

/// Drop the first `count` characters; too short yields an empty string.
fn skip_chars(text: &str, count: usize) -> String {
    text.chars().skip(count).collect()
}

/// How entry bytes are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryEncoding {
    /// 7-bit ASCII; any byte above 0x7F is invalid.
    Ascii,
    /// ISO-8859-1: every byte is the code point of the same value.
    Latin1,
    /// Any other label `encoding_rs` knows.
    Labelled(&'static Encoding),
}

impl EntryEncoding {
    pub fn name(&self) -> &'static str {
        match self {
            EntryEncoding::Ascii => "ascii",
            EntryEncoding::Latin1 => "latin-1",
            EntryEncoding::Labelled(encoding) => encoding.name(),
        }
    }
}

/// Resolve an `encoding` option value such as `UTF-8` or `latin1`.
///
/// ASCII and Latin-1 labels are handled here because the WHATWG label
/// table maps both to windows-1252.
pub fn encoding_for(label: &str) -> Result<EntryEncoding> {
    let normalized = label.trim().to_ascii_lowercase().replace('_', "-");

    match normalized.as_str() {
        "ascii" | "us-ascii" | "646" => Ok(EntryEncoding::Ascii),
        "latin1" | "latin-1" | "iso-8859-1" | "iso8859-1" | "8859" | "cp819" | "l1" => {
            Ok(EntryEncoding::Latin1)
        }
        _ => Encoding::for_label(label.trim().as_bytes())
            .or_else(|| Encoding::for_label(normalized.as_bytes()))
            .map(EntryEncoding::Labelled)
            .ok_or_else(|| HelperError::UnknownEncoding(label.to_string())),
    }
}

/// Decode raw entry bytes, rejecting malformed input.
pub fn decode(
    bytes: &[u8],
    encoding: EntryEncoding,
) -> std::result::Result<Zeroizing<String>, ExtractionError> {
    let text = match encoding {
        EntryEncoding::Ascii => bytes
            .is_ascii()
            .then(|| bytes.iter().copied().map(char::from).collect::<String>()),
        EntryEncoding::Latin1 => Some(bytes.iter().copied().map(char::from).collect()),
        EntryEncoding::Labelled(codec) => codec
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned()),
    };

    text.map(Zeroizing::new).ok_or_else(|| ExtractionError::Decoding {
        encoding: encoding.name().to_string(),
    })
}

// ── Tests ────────────────────────────────────────────────────────────
