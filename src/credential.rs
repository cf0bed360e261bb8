//! Credentials used to reach the cluster.
//!
//! The job service authenticates requests with a proxy certificate, sent base64-encoded in the
//! `PROXY` header. Such a proxy is either fetched beforehand and loaded from a file, or generated
//! on the cluster through an SSH session authenticated by password or private key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// The strategy used to authenticate, selected once when connecting.
#[derive(Clone, PartialEq)]
pub enum Credential {
    /// Open an SSH session with a password.
    Password(String),
    /// Open an SSH session with the private key stored in the given file.
    PrivateKey(PathBuf),
    /// Use the pre-fetched proxy stored in the given file, without any SSH session.
    Proxy(PathBuf),
}

impl Credential {
    /// Check if this credential needs an SSH session.
    pub fn needs_session(&self) -> bool {
        !matches!(self, Credential::Proxy(_))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Credential::Password(_) => formatter.write_str("Password(***)"),
            Credential::PrivateKey(path) => formatter.debug_tuple("PrivateKey").field(path).finish(),
            Credential::Proxy(path) => formatter.debug_tuple("Proxy").field(path).finish(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unable to read proxy file {path}: {source}")]
pub struct CredentialError {
    path: PathBuf,
    source: io::Error,
}

/// A proxy certificate, encoded as expected by the job service.
#[derive(Clone, PartialEq)]
pub struct ProxyCredential {
    encoded: String,
}

impl ProxyCredential {
    /// Create a new proxy credential from the raw content of a proxy file.
    pub fn from_bytes(content: &[u8]) -> ProxyCredential {
        ProxyCredential {
            encoded: STANDARD.encode(content),
        }
    }

    /// Load a proxy credential from the given file.
    pub fn from_file(path: &Path) -> Result<ProxyCredential, CredentialError> {
        match fs::read(path) {
            Ok(content) => Ok(ProxyCredential::from_bytes(&content)),
            Err(error) => Err(CredentialError { path: path.to_path_buf(), source: error }),
        }
    }

    /// Get the value of the `PROXY` header, a single line of base64.
    pub fn get_header_value(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Debug for ProxyCredential {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("ProxyCredential(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_proxy_from_bytes() {
        assert_eq!(ProxyCredential::from_bytes(b"proxy").get_header_value(), "cHJveHk=");
        // Long proxies are never wrapped on multiple lines.
        let long = ProxyCredential::from_bytes(&[b'a'; 200]);
        assert!(!long.get_header_value().contains('\n'));
        assert_eq!(long.get_header_value().len(), 268);
    }

    #[test]
    fn test_proxy_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"-----BEGIN CERTIFICATE-----\nMIIB\n-----END CERTIFICATE-----\n").unwrap();

        let proxy = ProxyCredential::from_file(file.path()).unwrap();
        assert_eq!(
            proxy.get_header_value(),
            "LS0tLS1CRUdJTiBDRVJUSUZJQ0FURS0tLS0tCk1JSUIKLS0tLS1FTkQgQ0VSVElGSUNBVEUtLS0tLQo=",
        );

        let missing = ProxyCredential::from_file(Path::new("/nonexistent/areq/proxy"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_credential_debug_hides_secrets() {
        assert_eq!(format!("{:?}", Credential::Password(String::from("hunter2"))), "Password(***)");
        assert_eq!(format!("{:?}", ProxyCredential::from_bytes(b"secret")), "ProxyCredential(***)");
        assert!(Credential::Password(String::from("p")).needs_session());
        assert!(Credential::PrivateKey(PathBuf::from("id_rsa")).needs_session());
        assert!(!Credential::Proxy(PathBuf::from("proxy")).needs_session());
    }
}
