//! Signature Version 4 request signing with headers.
//!
//! Follows the published algorithm: a canonical request is hashed into a
//! string to sign, which is signed with a key derived from the secret
//! through an HMAC chain over date, region and service.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Method;
use sha2::{Digest, Sha256};

use crate::{Credentials, FunctionError};

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SCOPE_TERMINATOR: &str = "aws4_request";
const DATE_HEADER: &str = "x-amz-date";
const TOKEN_HEADER: &str = "x-amz-security-token";
const CONTENT_SHA256_HEADER: &str = "x-amz-content-sha256";

/// A request about to be signed.
///
/// `path` is used as given and must already be percent-encoded. Query
/// pairs and header values are raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Endpoint host.
    pub host: String,
    /// Encoded path, starting with `/`.
    pub path: String,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// Extra headers to send and sign, with lowercase names.
    pub headers: Vec<(String, String)>,
    /// Payload.
    pub body: Vec<u8>,
}

impl Request {
    /// A request for `path` on `host` without query, headers or body.
    pub fn new(method: Method, host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method,
            host: host.into(),
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Add a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add a header.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    /// Set the payload.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Query string with encoded pairs sorted by key, then value.
    pub fn canonical_query(&self) -> String {
        let mut pairs: Vec<(String, String)> = self
            .query
            .iter()
            .map(|(key, value)| (uri_encode(key, true), uri_encode(value, true)))
            .collect();
        pairs.sort();
        pairs
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// The URL the request is sent to.
    pub fn url(&self) -> String {
        let query = self.canonical_query();
        if query.is_empty() {
            format!("https://{}{}", self.host, self.path)
        } else {
            format!("https://{}{}?{query}", self.host, self.path)
        }
    }
}

/// Signs requests to one service in one region.
#[derive(Debug, Clone)]
pub struct Signer<'a> {
    credentials: &'a Credentials,
    region: &'a str,
    service: &'a str,
}

impl<'a> Signer<'a> {
    /// A signer for `service` in `region`.
    pub fn new(credentials: &'a Credentials, region: &'a str, service: &'a str) -> Self {
        Self {
            credentials,
            region,
            service,
        }
    }

    /// Headers to add to `request` when sending it at `time`: the date, the
    /// session token, the payload hash for object storage and the
    /// authorization. `host` is signed but not returned.
    pub fn sign(
        &self,
        request: &Request,
        time: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>, FunctionError> {
        let timestamp = time.format("%Y%m%dT%H%M%SZ").to_string();
        let date = &timestamp[..8];
        let payload_hash = hex_encode(&Sha256::digest(&request.body));

        let mut headers = request.headers.clone();
        headers.push((DATE_HEADER.to_string(), timestamp.clone()));
        if let Some(token) = &self.credentials.session_token {
            headers.push((TOKEN_HEADER.to_string(), token.clone()));
        }
        if self.service == "s3" {
            headers.push((CONTENT_SHA256_HEADER.to_string(), payload_hash.clone()));
        }

        let mut signed = headers.clone();
        signed.push(("host".to_string(), request.host.clone()));
        signed.sort_by(|a, b| a.0.cmp(&b.0));

        let signed_headers = signed
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let canonical_headers: String = signed
            .iter()
            .map(|(name, value)| format!("{name}:{}\n", value.trim()))
            .collect();

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method.as_str(),
            request.path,
            request.canonical_query(),
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let scope = format!("{date}/{}/{}/{SCOPE_TERMINATOR}", self.region, self.service);
        let string_to_sign = format!(
            "{ALGORITHM}\n{timestamp}\n{scope}\n{}",
            hex_encode(&Sha256::digest(canonical_request.as_bytes()))
        );

        let key = signing_key(
            &self.credentials.secret_access_key,
            date,
            self.region,
            self.service,
        )?;
        let signature = hex_encode(&hmac_sha256(&key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, \
             Signature={signature}",
            self.credentials.access_key_id
        );
        headers.push(("authorization".to_string(), authorization));
        Ok(headers)
    }
}

/// `HMAC(HMAC(HMAC(HMAC("AWS4" + secret, date), region), service), "aws4_request")`
fn signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, FunctionError> {
    let date_key = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let region_key = hmac_sha256(&date_key, region.as_bytes())?;
    let service_key = hmac_sha256(&region_key, service.as_bytes())?;
    hmac_sha256(&service_key, SCOPE_TERMINATOR.as_bytes())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, FunctionError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut hex, byte| {
        let _ = write!(hex, "{byte:02x}");
        hex
    })
}

/// Percent-encode everything but unreserved characters, and `/` unless
/// `encode_slash` is set.
pub fn uri_encode(value: &str, encode_slash: bool) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            b'/' if !encode_slash => encoded.push('/'),
            _ => {
                let _ = write!(encoded, "%{byte:02X}");
            }
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use testresult::TestResult;

    fn example_credentials(session_token: Option<&str>) -> Credentials {
        Credentials {
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".into(),
            session_token: session_token.map(str::to_string),
        }
    }

    fn header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    #[test]
    fn it_derives_the_documented_signing_key() -> TestResult {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        )?;

        assert_eq!(
            hex_encode(&key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
        Ok(())
    }

    #[test]
    fn it_signs_a_plain_get() -> TestResult {
        let credentials = example_credentials(None);
        let signer = Signer::new(&credentials, "us-east-1", "service");
        let request = Request::new(Method::GET, "example.amazonaws.com", "/");
        let time = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).single().ok_or("time")?;

        let headers = signer.sign(&request, time)?;

        assert_eq!(header(&headers, "x-amz-date"), Some("20150830T123600Z"));
        assert_eq!(header(&headers, "host"), None);
        assert_eq!(
            header(&headers, "authorization"),
            Some(
                "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
                 SignedHeaders=host;x-amz-date, \
                 Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
            )
        );
        Ok(())
    }

    #[test]
    fn it_signs_the_session_token_and_object_storage_payload() -> TestResult {
        let credentials = example_credentials(Some("session"));
        let signer = Signer::new(&credentials, "us-east-1", "s3");
        let request = Request::new(Method::POST, "site.s3.us-east-1.amazonaws.com", "/")
            .with_query("delete", "")
            .with_header("Content-MD5", "1B2M2Y8AsgTpgAmY7PhCfg==");
        let time = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).single().ok_or("time")?;

        let headers = signer.sign(&request, time)?;

        assert_eq!(header(&headers, "x-amz-security-token"), Some("session"));
        assert_eq!(
            header(&headers, "x-amz-content-sha256"),
            Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
        let authorization = header(&headers, "authorization").ok_or("unsigned")?;
        assert!(authorization.contains(
            "SignedHeaders=content-md5;host;x-amz-content-sha256;x-amz-date;x-amz-security-token"
        ));
        Ok(())
    }

    #[test]
    fn it_sorts_and_encodes_query_parameters() {
        let request = Request::new(Method::GET, "bucket.s3.eu-west-1.amazonaws.com", "/")
            .with_query("list-type", "2")
            .with_query("continuation-token", "1/a+b=");

        assert_eq!(
            request.canonical_query(),
            "continuation-token=1%2Fa%2Bb%3D&list-type=2"
        );
        assert_eq!(
            request.url(),
            "https://bucket.s3.eu-west-1.amazonaws.com/?continuation-token=1%2Fa%2Bb%3D&list-type=2"
        );
    }

    #[test]
    fn it_keeps_slashes_in_paths_only_when_asked() {
        assert_eq!(uri_encode("logs/a b.json", false), "logs/a%20b.json");
        assert_eq!(uri_encode("logs/a b.json", true), "logs%2Fa%20b.json");
    }
}
