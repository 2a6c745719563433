//! Mapping file: which pass entry answers which credential request.
//!
//! The mapping is an INI file. Every section header is a glob pattern
//! matched against the request, and the `DEFAULT` section supplies
//! options that sections leave unset:
//!
//! ```ini
//! [DEFAULT]
//! username_extractor = entry_name
//!
//! [github.com*]
//! target = dev/github
//!
//! [*]
//! target = logins/${host}
//! ```
//!
//! This module provides:
//! - `MappingConfig` and `Section`, loaded from disk or a string
//! - Three-tier option lookup through `Options`
//! - Variable substitution for templated options (`substitute`)
//! - First-match-wins section selection (`matcher`)

pub mod matcher;
pub mod substitute;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use ini::{Ini, ParseOption};

use crate::errors::{HelperError, Result};

pub use matcher::{find_section, match_subjects, Subject};
pub use substitute::substitute;

/// Name of the section holding inherited defaults.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Directory below each XDG config dir that holds the mapping.
pub const CONFIG_DIR_NAME: &str = "pass-git-helper";

/// File name of the mapping inside `CONFIG_DIR_NAME`.
pub const CONFIG_FILE_NAME: &str = "git-pass-mapping.ini";

/// One `[pattern]` block of the mapping file.
#[derive(Debug, Clone)]
pub struct Section {
    name: String,
    matcher: GlobMatcher,
    options: HashMap<String, String>,
}

impl Section {
    /// Compile the section header as a shell glob.
    ///
    /// `*` and `?` also match `/`, and the whole subject must match.
    /// Braces and unclosed `[` are literals.
    pub fn new(name: &str, options: HashMap<String, String>) -> Result<Self> {
        let glob = GlobBuilder::new(&shell_glob(name))
            .literal_separator(false)
            .backslash_escape(true)
            .allow_unclosed_class(true)
            .build()
            .map_err(|e| HelperError::InvalidGlob {
                pattern: name.to_string(),
                reason: e.kind().to_string(),
            })?;

        Ok(Self {
            name: name.to_string(),
            matcher: glob.compile_matcher(),
            options,
        })
    }

    /// The raw section header, i.e. the glob pattern.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the pattern is written against `protocol://host` subjects.
    pub fn is_protocol_qualified(&self) -> bool {
        self.name.contains("://")
    }

    /// Test the pattern against a match subject.
    pub fn is_match(&self, subject: &str) -> bool {
        self.matcher.is_match(subject)
    }

    /// Option value set directly in this section.
    pub fn get(&self, option: &str) -> Option<&str> {
        self.options.get(option).map(String::as_str)
    }
}

/// Escape what globset would read beyond a plain shell glob.
///
/// `{a,b}` alternation does not exist in shell globs, so braces outside
/// character classes are escaped. A `[` without a closing `]` is escaped
/// too. A trailing lone backslash matches itself.
fn shell_glob(pattern: &str) -> String {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => match chars.get(i + 1) {
                Some(&next) => {
                    out.push('\\');
                    out.push(next);
                    i += 1;
                }
                None => out.push_str("\\\\"),
            },
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.extend(&chars[i..=end]);
                    i = end;
                }
                None => out.push_str("\\["),
            },
            c @ ('{' | '}') => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
        i += 1;
    }

    out
}

/// Index of the `]` closing the class opened at `start`.
fn class_end(chars: &[char], start: usize) -> Option<usize> {
    let mut first = start + 1;
    if matches!(chars.get(first), Some('!' | '^')) {
        first += 1;
    }
    // A `]` right after the opening is a member.
    if chars.get(first) == Some(&']') {
        first += 1;
    }

    chars
        .get(first..)?
        .iter()
        .position(|&c| c == ']')
        .map(|offset| first + offset)
}

/// The parsed mapping file: ordered sections plus the defaults.
#[derive(Debug, Clone, Default)]
pub struct MappingConfig {
    sections: Vec<Section>,
    defaults: HashMap<String, String>,
}

impl MappingConfig {
    /// Load and parse the mapping file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "parsing mapping file");

        let contents =
            std::fs::read_to_string(path).map_err(|e| HelperError::MappingParse {
                origin: path.display().to_string(),
                reason: e.to_string(),
            })?;

        Self::parse_with_origin(&contents, &path.display().to_string())
    }

    /// Parse mapping text held in memory.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_origin(text, "<string>")
    }

    fn parse_with_origin(text: &str, origin: &str) -> Result<Self> {
        // Regexes and templates must reach us verbatim.
        let opt = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };

        let ini = Ini::load_from_str_opt(text, opt).map_err(|e| HelperError::MappingParse {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;

        let mut config = Self::default();

        for (name, properties) in ini.iter() {
            // Option names are case-insensitive, section names are not.
            let options: HashMap<String, String> = properties
                .iter()
                .map(|(key, value)| (key.to_ascii_lowercase(), value.to_string()))
                .collect();

            match name {
                None if options.is_empty() => {}
                None => {
                    return Err(HelperError::MappingParse {
                        origin: origin.to_string(),
                        reason: "options found before the first section header".into(),
                    });
                }
                Some(DEFAULT_SECTION) => config.defaults.extend(options),
                Some(pattern) => config.sections.push(Section::new(pattern, options)?),
            }
        }

        tracing::debug!(
            sections = config.sections.len(),
            defaults = config.defaults.len(),
            "mapping parsed"
        );

        Ok(config)
    }

    /// Sections in file order, without `DEFAULT`.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Find a section by its exact header.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Option lookup for `section` that falls back to `DEFAULT`.
    pub fn options<'a>(&'a self, section: &'a Section) -> Options<'a> {
        Options {
            section,
            defaults: &self.defaults,
        }
    }

    /// Pick the mapping file to use.
    ///
    /// An explicit path always wins. Otherwise the user config dir is
    /// searched first, then every entry of `$XDG_CONFIG_DIRS`.
    pub fn locate(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            return Ok(path.to_path_buf());
        }

        let found = config_dirs()
            .into_iter()
            .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
            .find(|candidate| candidate.is_file());

        match found {
            Some(path) => Ok(path),
            None => Err(HelperError::MappingNotFound(default_location())),
        }
    }
}

/// Where a user is expected to create the mapping.
pub fn default_location() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join(CONFIG_DIR_NAME)
        .join(CONFIG_FILE_NAME)
}

/// Config directories in lookup order.
fn config_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = dirs::config_dir().into_iter().collect();

    match std::env::var_os("XDG_CONFIG_DIRS").filter(|v| !v.is_empty()) {
        Some(value) => dirs.extend(std::env::split_paths(&value).filter(|p| p.is_absolute())),
        None => dirs.push(PathBuf::from("/etc/xdg")),
    }

    dirs
}

/// Section value, else `DEFAULT` value, else the caller's built-in fallback.
#[derive(Debug, Clone, Copy)]
pub struct Options<'a> {
    section: &'a Section,
    defaults: &'a HashMap<String, String>,
}

impl<'a> Options<'a> {
    /// Header of the section these options belong to.
    pub fn section_name(&self) -> &'a str {
        &self.section.name
    }

    pub fn get(&self, option: &str) -> Option<&'a str> {
        self.section
            .options
            .get(option)
            .or_else(|| self.defaults.get(option))
            .map(String::as_str)
    }

    pub fn get_or(&self, option: &str, fallback: &'a str) -> &'a str {
        self.get(option).unwrap_or(fallback)
    }

    /// Integer option such as `line_password` or `skip_username`.
    pub fn get_usize(&self, option: &str, fallback: usize) -> Result<usize> {
        match self.get(option) {
            None => Ok(fallback),
            Some(raw) => raw.trim().parse().map_err(|_| HelperError::InvalidOption {
                section: self.section.name.clone(),
                option: option.to_string(),
                value: raw.to_string(),
            }),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
