//! JSON pointer (RFC 6901) token escaping and parsing.

use std::borrow::Cow;

use super::PatchError;

/// Escape one reference token: `~` becomes `~0`, `/` becomes `~1`.
fn escape_token(token: &str) -> Cow<'_, str> {
    if token.contains(['~', '/']) {
        Cow::Owned(token.replace('~', "~0").replace('/', "~1"))
    } else {
        Cow::Borrowed(token)
    }
}

/// Append `/token` to `path`, escaping the token.
pub(crate) fn push_token(path: &mut String, token: &str) {
    path.push('/');
    path.push_str(&escape_token(token));
}

/// Split a pointer into unescaped reference tokens.
///
/// The empty string is the document root and yields no tokens.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>, PatchError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }

    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(PatchError::InvalidPointer(pointer.to_string()));
    };

    rest.split('/')
        .map(|token| unescape_token(token).ok_or_else(|| PatchError::InvalidPointer(pointer.to_string())))
        .collect()
}

fn unescape_token(token: &str) -> Option<String> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next()? {
                '0' => out.push('~'),
                '1' => out.push('/'),
                _ => return None,
            }
        } else {
            out.push(c);
        }
    }
    Some(out)
}
