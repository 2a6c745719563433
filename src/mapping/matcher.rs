//! Section selection: the first section whose pattern matches wins.
//!
//! A request yields several match subjects. Without path-aware matching
//! the subject is the host; with it, `host/path`. When the request names
//! a protocol, a `protocol://…` variant is tried first, but only against
//! patterns that are themselves written with a protocol. Each subject is
//! also tried with a trailing `/` so `[host/dir/*]` covers `host/dir`.

use crate::credential::CredentialRequest;

use super::{MappingConfig, Section};

/// A string section patterns are tested against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub value: String,
    /// Carries a `protocol://` prefix.
    pub qualified: bool,
}

/// Build the subjects for `request` in the order they are tried.
pub fn match_subjects(request: &CredentialRequest, path_aware: bool) -> Vec<Subject> {
    let bare = match request.path.as_deref() {
        Some(path) if path_aware && !path.is_empty() => format!("{}/{}", request.host, path),
        _ => request.host.clone(),
    };

    let mut bases = Vec::with_capacity(2);
    if let Some(protocol) = request.protocol.as_deref().filter(|p| !p.is_empty()) {
        bases.push((format!("{protocol}://{bare}"), true));
    }
    bases.push((bare, false));

    let mut subjects = Vec::with_capacity(bases.len() * 2);
    for (value, qualified) in bases {
        let slashed = (!value.ends_with('/')).then(|| format!("{value}/"));
        subjects.push(Subject { value, qualified });
        if let Some(value) = slashed {
            subjects.push(Subject { value, qualified });
        }
    }

    subjects
}

/// Find the first section, in file order, matching any subject of `request`.
///
/// `None` means the mapping has nothing for this request.
pub fn find_section<'a>(
    config: &'a MappingConfig,
    request: &CredentialRequest,
    path_aware: bool,
) -> Option<&'a Section> {
    let subjects = match_subjects(request, path_aware);
    tracing::debug!(?subjects, "searching mapping sections");

    for section in config.sections() {
        let hit = subjects
            .iter()
            .filter(|subject| !subject.qualified || section.is_protocol_qualified())
            .find(|subject| section.is_match(&subject.value));

        if let Some(subject) = hit {
            tracing::debug!(
                section = section.name(),
                subject = %subject.value,
                "section matches request"
            );
            return Some(section);
        }
    }

    tracing::debug!("no mapping section matches request");
    None
}
