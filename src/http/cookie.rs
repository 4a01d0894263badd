//! Cookie handling module
//!
//! Parses the request `Cookie` header and builds the `Set-Cookie` value
//! carrying the session token.

/// Extract a cookie value by name from a `Cookie` header
///
/// The header carries `name=value` pairs separated by `"; "`. Returns the
/// first pair whose name matches.
pub fn get_cookie(header: Option<&str>, name: &str) -> Option<String> {
    let header = header?;
    header.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        if key.trim() == name {
            Some(value.trim().to_string())
        } else {
            None
        }
    })
}

/// Build the `Set-Cookie` value for a session token
///
/// The cookie is host-wide and withheld from script access. No `Max-Age`
/// is set: sessions live only as long as the server process.
pub fn session_cookie(name: &str, token: &str) -> String {
    format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax")
}
