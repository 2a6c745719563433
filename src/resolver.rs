//! Request resolution: from a credential request to a pass entry name,
//! and from the entry's content to a password and username.
//!
//! Resolution happens in two steps so the caller owns the only side
//! effect, reading the entry:
//!
//! 1. `Resolver::resolve` selects the section, expands `target` into
//!    the entry name and configures both extraction strategies.
//! 2. `Resolution::extract` runs the strategies on the entry content.

use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::credential::CredentialRequest;
use crate::errors::{HelperError, Result};
use crate::extract::{self, EntryEncoding, Extractor, Field, DEFAULT_ENCODING};
use crate::mapping::{self, MappingConfig, Section};

/// What a successful extraction produced.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub password: Zeroizing<String>,
    /// `None` when the username strategy found nothing.
    pub username: Option<String>,
}

/// Resolves requests against one mapping.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    mapping: &'a MappingConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(mapping: &'a MappingConfig) -> Self {
        Self { mapping }
    }

    /// Select the section for `request` and prepare extraction.
    ///
    /// Returns `Ok(None)` when no section matches; that is not an error,
    /// the helper simply has no credentials for the request.
    pub fn resolve(
        &self,
        request: &CredentialRequest,
        path_aware: bool,
    ) -> Result<Option<Resolution<'a>>> {
        let Some(section) = mapping::find_section(self.mapping, request, path_aware) else {
            return Ok(None);
        };
        let options = self.mapping.options(section);

        let target = options
            .get("target")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| HelperError::missing_option(section.name(), "target"))?;

        let lookup_key = mapping::substitute(target, request);
        if lookup_key.trim().is_empty() {
            return Err(HelperError::missing_option(section.name(), "target"));
        }

        let store_dir = options
            .get("password_store_dir")
            .filter(|d| !d.is_empty())
            .map(|d| PathBuf::from(shellexpand::tilde(d).into_owned()));

        let encoding = extract::encoding_for(options.get_or("encoding", DEFAULT_ENCODING))?;
        let password = Extractor::configure(Field::Password, &options)?;
        let username = Extractor::configure(Field::Username, &options)?;

        tracing::debug!(
            section = section.name(),
            entry = %lookup_key,
            store_dir = ?store_dir,
            "request resolved"
        );

        Ok(Some(Resolution {
            section,
            lookup_key,
            store_dir,
            encoding,
            password,
            username,
        }))
    }
}

/// A matched section, ready to extract from the entry it names.
#[derive(Debug)]
pub struct Resolution<'a> {
    section: &'a Section,
    lookup_key: String,
    store_dir: Option<PathBuf>,
    encoding: EntryEncoding,
    password: Extractor,
    username: Extractor,
}

impl<'a> Resolution<'a> {
    pub fn section(&self) -> &'a Section {
        self.section
    }

    /// The pass entry to read.
    pub fn lookup_key(&self) -> &str {
        &self.lookup_key
    }

    /// Store directory override from `password_store_dir`.
    pub fn store_dir(&self) -> Option<&std::path::Path> {
        self.store_dir.as_deref()
    }

    /// Extract the credential from the raw entry bytes.
    ///
    /// Decoding or password extraction failures are errors. A username
    /// strategy that finds nothing just leaves the username out.
    pub fn extract(&self, entry: &[u8]) -> Result<ExtractionOutcome> {
        let text = extract::decode(entry, self.encoding)?;
        let lines: Vec<&str> = text.lines().collect();

        let password = Zeroizing::new(self.password.extract(&self.lookup_key, &lines)?);

        let username = match self.username.extract(&self.lookup_key, &lines) {
            Ok(username) => Some(username),
            Err(e) => {
                tracing::debug!(error = %e, "no username extracted");
                None
            }
        };

        Ok(ExtractionOutcome { password, username })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionError;

    fn request(host: &str) -> CredentialRequest {
        CredentialRequest {
            protocol: Some("https".into()),
            host: host.into(),
            ..CredentialRequest::default()
        }
    }

    #[test]
    fn unmatched_request_resolves_to_none() {
        let mapping = MappingConfig::parse("[github.com]\ntarget=dev/github\n").unwrap();
        let resolution = Resolver::new(&mapping).resolve(&request("gitlab.com"), false).unwrap();
        assert!(resolution.is_none());
    }

    #[test]
    fn missing_target_is_a_config_error() {
        let mapping = MappingConfig::parse("[github.com]\nline_password=0\n").unwrap();
        let err = Resolver::new(&mapping).resolve(&request("github.com"), false).unwrap_err();
        assert!(matches!(err, HelperError::MissingOption { ref option, .. } if option == "target"));
    }

    #[test]
    fn target_inherited_from_default() {
        let mapping = MappingConfig::parse("[DEFAULT]\ntarget=web/${host}\n[*]\n").unwrap();
        let resolution = Resolver::new(&mapping)
            .resolve(&request("example.org"), false)
            .unwrap()
            .unwrap();
        assert_eq!(resolution.lookup_key(), "web/example.org");
    }

    #[test]
    fn target_expanding_to_nothing_is_a_config_error() {
        let mapping = MappingConfig::parse("[*]\ntarget=${username}\n").unwrap();
        let err = Resolver::new(&mapping).resolve(&request("example.org"), false).unwrap_err();
        assert!(matches!(err, HelperError::MissingOption { .. }));
    }

    #[test]
    fn store_dir_is_tilde_expanded() {
        let mapping =
            MappingConfig::parse("[*]\ntarget=t\npassword_store_dir=/some/dir\n").unwrap();
        let resolution = Resolver::new(&mapping)
            .resolve(&request("example.org"), false)
            .unwrap()
            .unwrap();
        assert_eq!(resolution.store_dir(), Some(std::path::Path::new("/some/dir")));

        let mapping = MappingConfig::parse("[*]\ntarget=t\npassword_store_dir=~/store\n").unwrap();
        let resolution = Resolver::new(&mapping)
            .resolve(&request("example.org"), false)
            .unwrap()
            .unwrap();
        assert!(!resolution.store_dir().unwrap().starts_with("~"));
    }

    #[test]
    fn no_store_dir_by_default() {
        let mapping = MappingConfig::parse("[*]\ntarget=t\n").unwrap();
        let resolution = Resolver::new(&mapping)
            .resolve(&request("example.org"), false)
            .unwrap()
            .unwrap();
        assert_eq!(resolution.store_dir(), None);
    }

    #[test]
    fn bad_strategy_fails_before_extraction() {
        let mapping =
            MappingConfig::parse("[*]\ntarget=t\nusername_extractor=doesntexist\n").unwrap();
        let err = Resolver::new(&mapping).resolve(&request("example.org"), false).unwrap_err();
        assert!(matches!(err, HelperError::UnknownStrategy { .. }));
    }

    #[test]
    fn password_failure_is_fatal() {
        let mapping = MappingConfig::parse("[*]\ntarget=t\nline_password=5\n").unwrap();
        let resolution = Resolver::new(&mapping)
            .resolve(&request("example.org"), false)
            .unwrap()
            .unwrap();
        let err = resolution.extract(b"pw\nuser\n").unwrap_err();
        assert!(matches!(
            err,
            HelperError::Extraction(ExtractionError::LineNotFound { line: 5, .. })
        ));
    }

    #[test]
    fn username_failure_is_omitted() {
        let mapping = MappingConfig::parse(
            "[*]\ntarget=dev/nouser\nusername_extractor=regex_search\n",
        )
        .unwrap();
        let resolution = Resolver::new(&mapping)
            .resolve(&request("example.org"), false)
            .unwrap()
            .unwrap();
        let outcome = resolution.extract(b"pw\nlogin: bob\n").unwrap();
        assert_eq!(outcome.password.as_str(), "pw");
        assert_eq!(outcome.username, None);
    }

    #[test]
    fn entry_name_username_comes_from_lookup_key() {
        let mapping = MappingConfig::parse(
            "[*]\ntarget=dev/${host}/myuser\nusername_extractor=entry_name\n",
        )
        .unwrap();
        let resolution = Resolver::new(&mapping)
            .resolve(&request("mytest.com"), false)
            .unwrap()
            .unwrap();
        assert_eq!(resolution.lookup_key(), "dev/mytest.com/myuser");
        let outcome = resolution.extract(b"xyz").unwrap();
        assert_eq!(outcome.username.as_deref(), Some("myuser"));
    }

    #[test]
    fn ascii_entry_with_high_bytes_is_a_decoding_error() {
        let mapping = MappingConfig::parse("[*]\ntarget=t\nencoding=ascii\n").unwrap();
        let resolution = Resolver::new(&mapping)
            .resolve(&request("example.org"), false)
            .unwrap()
            .unwrap();
        assert!(matches!(
            resolution.extract(b"p\xe4ss"),
            Err(HelperError::Extraction(ExtractionError::Decoding { .. }))
        ));
    }

    #[test]
    fn latin1_entry_keeps_c1_bytes() {
        let mapping = MappingConfig::parse("[*]\ntarget=t\nencoding=latin1\n").unwrap();
        let resolution = Resolver::new(&mapping)
            .resolve(&request("example.org"), false)
            .unwrap()
            .unwrap();
        let outcome = resolution.extract(b"p\x80").unwrap();
        assert_eq!(outcome.password.as_str(), "p\u{80}");
    }

    #[test]
    fn invalid_bytes_are_a_decoding_error() {
        let mapping = MappingConfig::parse("[*]\ntarget=t\n").unwrap();
        let resolution = Resolver::new(&mapping)
            .resolve(&request("example.org"), false)
            .unwrap()
            .unwrap();
        assert!(matches!(
            resolution.extract(b"\xff\xff"),
            Err(HelperError::Extraction(ExtractionError::Decoding { .. }))
        ));
    }
}
