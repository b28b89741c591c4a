//! Email link path codec.
//!
//! Issuance emails carry a link of the form
//! `<base><flow path>/<id>/<code>/<email-b64>` where the id segment is
//! optional and the trailing segment is the recipient email in unpadded
//! url-safe base64 (the url-safe alphabet keeps `/` out of the
//! segment). The validate endpoint parses the same shape back out.

use base64ct::{Base64UrlUnpadded, Encoding};

/// Pieces recovered from (or destined for) a link path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParts {
    pub user: Option<String>,
    pub code: String,
    pub email: Option<String>,
}

/// Build the trailing path segments for an emailed link.
pub fn build_path(id: Option<&str>, code: &str, email: Option<&str>) -> String {
    let mut path = String::new();
    if let Some(id) = id {
        path.push('/');
        path.push_str(&urlencoding::encode(id));
    }
    path.push('/');
    path.push_str(&urlencoding::encode(code));
    if let Some(email) = email {
        path.push('/');
        path.push_str(&Base64UrlUnpadded::encode_string(email.as_bytes()));
    }
    path
}

/// Parse the trailing segments of an incoming link.
///
/// One segment is a bare code, two are user/code, three are
/// user/code/email. Returns `None` on empty input or an email segment
/// that is not valid base64.
pub fn parse_path(path: &str) -> Option<LinkParts> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let decode = |s: &str| urlencoding::decode(s).ok().map(|c| c.into_owned());

    match segments.as_slice() {
        [code] => Some(LinkParts {
            user: None,
            code: decode(code)?,
            email: None,
        }),
        [user, code] => Some(LinkParts {
            user: decode(user),
            code: decode(code)?,
            email: None,
        }),
        [user, code, email] => Some(LinkParts {
            user: decode(user),
            code: decode(code)?,
            email: Some(decode_email(email)?),
        }),
        _ => None,
    }
}

fn decode_email(segment: &str) -> Option<String> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).ok()?;
    String::from_utf8(bytes).ok()
}
