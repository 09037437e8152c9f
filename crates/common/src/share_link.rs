//! Share link encoding
//!
//! A share link looks like `{origin}/s/{id}#key={key}:{iv}`. Everything the
//! reader needs to decrypt lives in the fragment, which user agents never put
//! on the wire, so the relay resolving `/s/{id}` only ever learns the id.
//!
//! Key and IV are standard base64 and may contain `+`, `/` and `=`; both are
//! percent-encoded with the `encodeURIComponent` character set so links stay
//! interoperable with the browser viewer.

use std::str::FromStr;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::{form_urlencoded, Url};

/// Characters `encodeURIComponent` leaves alone
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const KEY_PARAM: &str = "key";

/// The decoded, secret-bearing parts of a share link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub id: String,
    pub key: String,
    pub iv: String,
}

impl ShareLink {
    pub fn new(id: impl Into<String>, key: impl Into<String>, iv: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            iv: iv.into(),
        }
    }

    /// Render this link against `origin`
    pub fn to_url(&self, origin: &str) -> String {
        build_share_url(origin, &self.id, &self.key, &self.iv)
    }
}

impl FromStr for ShareLink {
    type Err = ShareLinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s)?;

        let id = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .ok_or(ShareLinkError::MissingId)?
            .to_string();

        let fragment = url.fragment().unwrap_or_default();
        let param = form_urlencoded::parse(fragment.as_bytes())
            .find(|(name, _)| name == KEY_PARAM)
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();

        let (key, iv) = param.split_once(':').unwrap_or((param.as_str(), ""));
        if key.is_empty() {
            return Err(ShareLinkError::MissingKey);
        }
        if iv.is_empty() {
            return Err(ShareLinkError::MissingIv);
        }

        Ok(Self {
            id,
            key: decode_component(key)?,
            iv: decode_component(iv)?,
        })
    }
}

/// Build `{origin}/s/{id}#key={key}:{iv}`
///
/// A single trailing `/` on `origin` is dropped so `https://h/` and
/// `https://h` render the same link.
pub fn build_share_url(origin: &str, id: &str, key: &str, iv: &str) -> String {
    let origin = origin.strip_suffix('/').unwrap_or(origin);
    format!(
        "{}/s/{}#{}={}:{}",
        origin,
        id,
        KEY_PARAM,
        utf8_percent_encode(key, COMPONENT),
        utf8_percent_encode(iv, COMPONENT)
    )
}

/// Parse a share link, returning `None` if any part is missing or malformed
///
/// Use [`ShareLink::from_str`] to learn why a link was rejected.
pub fn parse_share_url(url: &str) -> Option<ShareLink> {
    url.parse().ok()
}

fn decode_component(value: &str) -> Result<String, ShareLinkError> {
    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| ShareLinkError::InvalidEncoding)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShareLinkError {
    #[error("invalid share url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("share url has no secret id")]
    MissingId,
    #[error("share url has no key")]
    MissingKey,
    #[error("share url has no iv")]
    MissingIv,
    #[error("share url key material is not valid percent-encoded UTF-8")]
    InvalidEncoding,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_share_url() {
        let url = build_share_url("https://h", "abc123", "k+e/y=", "i/v=");
        assert_eq!(url, "https://h/s/abc123#key=k%2Be%2Fy%3D:i%2Fv%3D");
    }

    #[test]
    fn test_build_strips_trailing_slash() {
        assert_eq!(
            build_share_url("https://h/", "id", "k", "v"),
            build_share_url("https://h", "id", "k", "v")
        );
    }

    #[test]
    fn test_round_trip_with_base64_symbols() {
        let url = build_share_url("https://h", "abc123", "k+e/y=", "i/v=");
        let link = parse_share_url(&url).unwrap();
        assert_eq!(link, ShareLink::new("abc123", "k+e/y=", "i/v="));
    }

    #[test]
    fn test_round_trip_real_material() {
        let key = "q83vEjRWeJCrze8SNFZ4kKvN7xI0VniQq83vEjRWeJA=";
        let iv = "/+/+/+/+/+/+/+/+/+/+/w==";
        let link = ShareLink::new("V1StGXR8_Z5jdHi6", key, iv);
        let url = link.to_url("http://localhost:4000/");
        assert_eq!(parse_share_url(&url), Some(link));
    }

    #[test]
    fn test_parse_tolerates_extra_fragment_params() {
        let link = parse_share_url("https://h/s/abc#v=1&key=a%2Bb:c%3D%3D").unwrap();
        assert_eq!(link, ShareLink::new("abc", "a+b", "c=="));
    }

    #[test]
    fn test_parse_splits_once() {
        let link = parse_share_url("https://h/s/abc#key=a:b:c").unwrap();
        assert_eq!(link.key, "a");
        assert_eq!(link.iv, "b:c");
    }

    #[test]
    fn test_parse_failures() {
        assert_eq!(
            "not a url".parse::<ShareLink>(),
            Err(ShareLinkError::InvalidUrl(url::ParseError::RelativeUrlWithoutBase))
        );
        assert_eq!(
            "https://h/s/#key=a:b".parse::<ShareLink>(),
            Err(ShareLinkError::MissingId)
        );
        assert_eq!(
            "https://h/s/abc".parse::<ShareLink>(),
            Err(ShareLinkError::MissingKey)
        );
        assert_eq!(
            "https://h/s/abc#other=1".parse::<ShareLink>(),
            Err(ShareLinkError::MissingKey)
        );
        assert_eq!(
            "https://h/s/abc#key=onlykey".parse::<ShareLink>(),
            Err(ShareLinkError::MissingIv)
        );
        assert_eq!(
            "https://h/s/abc#key=:iv".parse::<ShareLink>(),
            Err(ShareLinkError::MissingKey)
        );
        assert_eq!(
            "https://h/s/abc#key=a%25FF:b".parse::<ShareLink>(),
            Err(ShareLinkError::InvalidEncoding)
        );
        assert!(parse_share_url("https://h/s/abc").is_none());
    }
}
