//! Query parameters of platform-originated requests.
//!
//! [`QueryParams`] keeps every decoded `(name, value)` pair in arrival order,
//! because the request signature covers all of them, not only the ones the
//! flow reads. [`LoginQuery`] and [`CallbackQuery`] pick out the fields each
//! flow step needs while retaining the full set.

use crate::auth::ClientInputError;

/// Decoded query string parameters, in arrival order.
///
/// # Example
///
/// ```rust
/// use shopify_app_auth::auth::oauth::QueryParams;
///
/// let params = QueryParams::parse("?shop=acme.myshopify.com&host=YWRtaW4%3D&x=a+b");
/// assert_eq!(params.get("shop"), Some("acme.myshopify.com"));
/// assert_eq!(params.get("host"), Some("YWRtaW4="));
/// assert_eq!(params.get("x"), Some("a b"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a raw (percent-encoded) query string, with or without a leading `?`.
    ///
    /// `+` decodes to a space. Invalid UTF-8 sequences are replaced rather
    /// than rejected, which makes the signature check fail instead of the parse.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let pairs = raw
            .trim_start_matches('?')
            .split('&')
            .filter(|segment| !segment.is_empty())
            .map(|segment| {
                let (name, value) = segment.split_once('=').unwrap_or((segment, ""));
                (decode_component(name), decode_component(value))
            })
            .collect();
        Self { pairs }
    }

    /// Appends a decoded pair.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((name.into(), value.into()));
    }

    /// Builder-style [`push`](Self::push).
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Replaces every value of `name` with a single `value`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.remove(name);
        self.push(name, value);
    }

    /// Removes every pair named `name`.
    pub fn remove(&mut self, name: &str) {
        self.pairs.retain(|(n, _)| n != name);
    }

    /// Returns the first value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the first non-empty value of `name`.
    #[must_use]
    pub fn get_non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }

    /// Iterates over all pairs in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Returns the number of pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns `true` if there are no pairs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Parameters of a Login request (`/login?shop=...&hmac=...`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoginQuery {
    /// The raw, unvalidated `shop` value.
    pub shop: String,
    /// Whether the platform signed this request.
    pub signed: bool,
    /// Every parameter, as needed for signature validation.
    pub params: QueryParams,
}

impl LoginQuery {
    /// Extracts the Login fields.
    ///
    /// # Errors
    ///
    /// Returns [`ClientInputError::MissingParameter`] if `shop` is absent or empty.
    pub fn from_query(params: QueryParams) -> Result<Self, ClientInputError> {
        let shop = require(&params, "shop")?;
        let signed = params.get_non_empty(super::hmac::SIGNATURE_PARAM).is_some();
        Ok(Self {
            shop,
            signed,
            params,
        })
    }
}

/// Parameters of the OAuth callback (`/auth/callback?shop=...&code=...&hmac=...&state=...&timestamp=...`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallbackQuery {
    /// The raw, unvalidated `shop` value.
    pub shop: String,
    /// The one-time authorization code.
    pub code: String,
    /// The OAuth state nonce echoed by the platform.
    pub state: String,
    /// Every parameter, as needed for signature validation.
    pub params: QueryParams,
}

impl CallbackQuery {
    /// Extracts the callback fields.
    ///
    /// # Errors
    ///
    /// Returns [`ClientInputError::MissingParameter`] if `shop`, `code`,
    /// `hmac` or `state` is absent or empty.
    pub fn from_query(params: QueryParams) -> Result<Self, ClientInputError> {
        let shop = require(&params, "shop")?;
        let code = require(&params, "code")?;
        require(&params, super::hmac::SIGNATURE_PARAM)?;
        let state = require(&params, "state")?;

        Ok(Self {
            shop,
            code,
            state,
            params,
        })
    }
}

fn require(params: &QueryParams, name: &'static str) -> Result<String, ClientInputError> {
    params
        .get_non_empty(name)
        .map(str::to_string)
        .ok_or(ClientInputError::MissingParameter { name })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decodes_and_keeps_order() {
        let params = QueryParams::parse("b=2&a=1&a=%26x&flag&=empty-name");
        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(
            pairs,
            vec![("b", "2"), ("a", "1"), ("a", "&x"), ("flag", ""), ("", "empty-name")]
        );
        assert_eq!(params.get("a"), Some("1"));
    }

    #[test]
    fn test_parse_handles_invalid_utf8() {
        let params = QueryParams::parse("v=%FF");
        assert_eq!(params.get("v"), Some("\u{FFFD}"));
    }

    #[test]
    fn test_set_replaces_all_values() {
        let mut params = QueryParams::parse("a=1&a=2&b=3");
        params.set("a", "9");
        assert_eq!(params.iter().filter(|(n, _)| *n == "a").count(), 1);
        assert_eq!(params.get("a"), Some("9"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_login_query_requires_shop() {
        let err = LoginQuery::from_query(QueryParams::parse("hmac=abc")).unwrap_err();
        assert_eq!(err, ClientInputError::MissingParameter { name: "shop" });

        let err = LoginQuery::from_query(QueryParams::parse("shop=")).unwrap_err();
        assert_eq!(err, ClientInputError::MissingParameter { name: "shop" });
    }

    #[test]
    fn test_login_query_detects_signature() {
        let unsigned = LoginQuery::from_query(QueryParams::parse("shop=a.myshopify.com")).unwrap();
        assert!(!unsigned.signed);

        let signed =
            LoginQuery::from_query(QueryParams::parse("shop=a.myshopify.com&hmac=00")).unwrap();
        assert!(signed.signed);
    }

    #[test]
    fn test_callback_query_requires_all_fields() {
        let full = "shop=a.myshopify.com&code=c&hmac=h&state=s&timestamp=1700000000";
        let query = CallbackQuery::from_query(QueryParams::parse(full)).unwrap();
        assert_eq!(query.code, "c");
        assert_eq!(query.state, "s");
        assert_eq!(query.params.get("timestamp"), Some("1700000000"));

        for (missing, name) in [
            ("code=c&hmac=h&state=s", "shop"),
            ("shop=a.myshopify.com&hmac=h&state=s", "code"),
            ("shop=a.myshopify.com&code=c&state=s", "hmac"),
            ("shop=a.myshopify.com&code=c&hmac=h", "state"),
        ] {
            let err = CallbackQuery::from_query(QueryParams::parse(missing)).unwrap_err();
            assert_eq!(err, ClientInputError::MissingParameter { name });
        }
    }
}
