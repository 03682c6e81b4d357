//! AWS Signature Version 4 request signing
//!
//! The discovery service sits behind API Gateway with IAM authorization, so
//! every request carries `x-amz-date` and an `Authorization` header signed for
//! the `execute-api` service.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Url;
use sha2::{Digest, Sha256};
use stackport_core::Credentials;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// API Gateway signing service name
pub const EXECUTE_API: &str = "execute-api";

/// Headers to attach to a signed request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedHeaders {
    pub amz_date: String,
    pub authorization: String,
    pub security_token: Option<String>,
}

/// Sign a request for `execute-api`
pub fn sign(
    method: &str,
    url: &Url,
    body: &[u8],
    credentials: &Credentials,
    region: &str,
    now: DateTime<Utc>,
) -> SignedHeaders {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();

    let mut headers = vec![("host", host_header(url)), ("x-amz-date", amz_date.clone())];
    if let Some(token) = &credentials.session_token {
        headers.push(("x-amz-security-token", token.clone()));
    }
    let signed_headers = headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");

    let request = canonical_request(method, url, &headers, &signed_headers, body);
    let scope = format!("{}/{}/{}/aws4_request", date, region, EXECUTE_API);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex::encode(Sha256::digest(request.as_bytes()))
    );

    let key = signing_key(&credentials.secret_access_key, &date, region, EXECUTE_API);
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes()));

    SignedHeaders {
        amz_date,
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
        ),
        security_token: credentials.session_token.clone(),
    }
}

/// Region encoded in an `<id>.execute-api.<region>.amazonaws.com` host
pub fn region_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    if !host.ends_with(".amazonaws.com") {
        return None;
    }
    let labels: Vec<&str> = host.split('.').collect();
    let index = labels.iter().position(|l| *l == EXECUTE_API)?;
    labels
        .get(index + 1)
        .filter(|r| **r != "amazonaws")
        .map(|r| r.to_string())
}

fn host_header(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Headers must already be lowercase and sorted by name
fn canonical_request(
    method: &str,
    url: &Url,
    headers: &[(&str, String)],
    signed_headers: &str,
    body: &[u8],
) -> String {
    // Url keeps the path percent-encoded once; execute-api expects it encoded twice.
    let path = url
        .path()
        .split('/')
        .map(uri_encode)
        .collect::<Vec<_>>()
        .join("/");
    let path = if path.is_empty() { "/".to_string() } else { path };

    let mut query: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k), uri_encode(&v)))
        .collect();
    query.sort();
    let query = query
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();

    format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        method,
        path,
        query,
        canonical_headers,
        signed_headers,
        hex::encode(Sha256::digest(body))
    )
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac(&k_date, region.as_bytes());
    let k_service = hmac(&k_region, service.as_bytes());
    hmac(&k_service, b"aws4_request")
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// RFC 3986 encoding; only unreserved characters pass through
fn uri_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 45).unwrap()
    }

    #[test]
    fn test_signing_key_matches_aws_example() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode("abc-_.~XYZ09"), "abc-_.~XYZ09");
        assert_eq!(uri_encode("a b/c"), "a%20b%2Fc");
        assert_eq!(uri_encode("%20"), "%2520");
    }

    #[test]
    fn test_canonical_request_sorts_query() {
        let url = Url::parse("https://example.com/dev/catalog/service?StageName=dev&ServiceName=my%20svc").unwrap();
        let headers = vec![
            ("host", "example.com".to_string()),
            ("x-amz-date", "20240301T123045Z".to_string()),
        ];
        let request = canonical_request("GET", &url, &headers, "host;x-amz-date", b"");

        let lines: Vec<&str> = request.split('\n').collect();
        assert_eq!(lines[0], "GET");
        assert_eq!(lines[1], "/dev/catalog/service");
        assert_eq!(lines[2], "ServiceName=my%20svc&StageName=dev");
        assert_eq!(lines[3], "host:example.com");
        assert_eq!(lines[4], "x-amz-date:20240301T123045Z");
        assert_eq!(lines[5], "");
        assert_eq!(lines[6], "host;x-amz-date");
        assert_eq!(
            lines[7],
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_sign_authorization_header() {
        let url = Url::parse("https://abc.execute-api.us-east-1.amazonaws.com/dev/catalog/service").unwrap();
        let creds = Credentials::new("AKIDEXAMPLE", "secret");

        let signed = sign("POST", &url, b"{}", &creds, "us-east-1", now());
        assert_eq!(signed.amz_date, "20240301T123045Z");
        assert!(signed.authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240301/us-east-1/execute-api/aws4_request, SignedHeaders=host;x-amz-date, Signature="
        ));
        assert_eq!(signed.security_token, None);

        let signature = signed.authorization.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);

        // Deterministic for identical input, sensitive to the body
        assert_eq!(sign("POST", &url, b"{}", &creds, "us-east-1", now()), signed);
        assert_ne!(sign("POST", &url, b"{ }", &creds, "us-east-1", now()), signed);
    }

    #[test]
    fn test_sign_with_session_token() {
        let url = Url::parse("https://abc.execute-api.us-east-1.amazonaws.com/dev").unwrap();
        let creds = Credentials::new("AKID", "secret").with_session_token("token");

        let signed = sign("GET", &url, b"", &creds, "us-east-1", now());
        assert!(
            signed
                .authorization
                .contains("SignedHeaders=host;x-amz-date;x-amz-security-token,")
        );
        assert_eq!(signed.security_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_region_from_url() {
        let url = Url::parse("https://abcdefghij.execute-api.eu-west-1.amazonaws.com/dev").unwrap();
        assert_eq!(region_from_url(&url).as_deref(), Some("eu-west-1"));

        let custom = Url::parse("https://discovery.example.com/dev").unwrap();
        assert_eq!(region_from_url(&custom), None);

        let local = Url::parse("http://127.0.0.1:8080").unwrap();
        assert_eq!(region_from_url(&local), None);
    }
}
