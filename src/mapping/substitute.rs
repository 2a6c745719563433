//! `${variable}` expansion for templated options such as `target`.

use crate::credential::CredentialRequest;

/// Variables understood inside templates.
pub const VARIABLES: [&str; 4] = ["host", "username", "path", "protocol"];

/// Replace every known `${variable}` with the request field.
///
/// Absent fields expand to the empty string. Unknown placeholders are
/// kept as written, and substituted values are never expanded again.
pub fn substitute(template: &str, request: &CredentialRequest) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let expansion = after
            .find('}')
            .and_then(|end| lookup(&after[..end], request).map(|value| (end, value)));

        match expansion {
            Some((end, value)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push_str("${");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn lookup<'r>(name: &str, request: &'r CredentialRequest) -> Option<&'r str> {
    match name {
        "host" => Some(&request.host),
        "username" => Some(request.username.as_deref().unwrap_or_default()),
        "path" => Some(request.path.as_deref().unwrap_or_default()),
        "protocol" => Some(request.protocol.as_deref().unwrap_or_default()),
        _ => None,
    }
}
