//! Remote access to the cluster: file transfer and command execution.
//!
//! The [`RemoteSession`] trait abstracts an authenticated session on the cluster's login node.
//! It is used for SFTP uploads and downloads, and once to generate a proxy certificate with
//! `grid-proxy-init` (see [`create_and_download_proxy`]).

#[cfg(feature = "ssh")]
pub mod ssh;

use crate::credential::{CredentialError, ProxyCredential};
use log::{debug, info};
use std::io;
use std::path::Path;

/// The file generated on the cluster, holding the base64-encoded proxy.
const REMOTE_PROXY_FILE: &str = "proxy2";

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// SSH error, raised by the session library.
    #[error("SSH error: {0}")]
    Ssh(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// The host key of the remote host is missing from, or different in, the known hosts.
    #[error("host key verification failed for {0}")]
    UnknownHost(String),
    /// A remote command wrote to its error stream.
    #[error("remote error: {stderr}")]
    Command { command: String, stderr: String },
    /// The connection has no remote session (it uses a pre-fetched proxy).
    #[error("no remote session: connect with a password or a private key")]
    NoSession,
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

/// The captured output of a remote command.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
}

/// An authenticated session on a remote host.
pub trait RemoteSession {
    /// Copy the given local file to the given remote path.
    fn upload(&self, local_path: &Path, remote_path: &Path) -> Result<(), RemoteError>;

    /// Copy the given remote file to the given local path.
    fn download(&self, remote_path: &Path, local_path: &Path) -> Result<(), RemoteError>;

    /// Run the given command in a pseudo-terminal, and capture its output.
    fn execute(&self, command: &str) -> Result<CommandOutput, RemoteError>;
}

/// Run the given command, failing when it writes anything to its error stream.
pub fn execute_checked(session: &dyn RemoteSession, command: &str) -> Result<CommandOutput, RemoteError> {
    let output = session.execute(command)?;

    match output.stderr.is_empty() {
        true => Ok(output),
        false => Err(RemoteError::Command { command: command.to_string(), stderr: output.stderr }),
    }
}

/// Quote the given value for a POSIX shell, between single quotes.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Generate a proxy certificate on the cluster, encode it there, and download it to the given
/// local path. The remote home is the directory where the encoded proxy is written. Return the
/// credential loaded from the downloaded file.
pub fn create_and_download_proxy(
    session: &dyn RemoteSession,
    passphrase: &str,
    remote_home: &Path,
    local_path: &Path,
) -> Result<ProxyCredential, RemoteError> {
    info!("Generating a proxy certificate on the cluster.");
    let generate = format!("echo {} | grid-proxy-init -out ~/proxy -pwstdin", shell_quote(passphrase));
    execute_checked(session, &generate).map_err(|error| match error {
        // The command line holds the passphrase.
        RemoteError::Command { stderr, .. } => RemoteError::Command { command: String::from("grid-proxy-init"), stderr: stderr },
        error => error,
    })?;

    debug!("Encoding the proxy certificate on the cluster.");
    execute_checked(session, &format!("cat ~/proxy| base64 | tr -d '\\n' > {}", REMOTE_PROXY_FILE))?;

    let remote_path = remote_home.join(REMOTE_PROXY_FILE);
    debug!("Downloading {} to {}.", remote_path.display(), local_path.display());
    session.download(&remote_path, local_path)?;
    info!("Proxy certificate downloaded to {}.", local_path.display());

    Ok(ProxyCredential::from_file(local_path)?)
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::testing::{Call, FakeSession};
    use std::path::PathBuf;
    use tempfile::tempdir;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("secret"), "'secret'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn test_create_and_download_proxy() {
        let directory = tempdir().unwrap();
        let local_path = directory.path().join("proxy");
        let session = FakeSession::new(vec![], b"ZW5jb2RlZA==");

        let proxy = create_and_download_proxy(&session, "pass phrase", Path::new("/net/people/plgrid/plguser"), &local_path).unwrap();

        assert_eq!(proxy, crate::credential::ProxyCredential::from_bytes(b"ZW5jb2RlZA=="));
        assert_eq!(
            *session.calls.borrow(),
            vec![
                Call::Execute(String::from("echo 'pass phrase' | grid-proxy-init -out ~/proxy -pwstdin")),
                Call::Execute(String::from("cat ~/proxy| base64 | tr -d '\\n' > proxy2")),
                Call::Download(PathBuf::from("/net/people/plgrid/plguser/proxy2"), local_path.clone()),
            ],
        );
    }

    #[test]
    fn test_create_and_download_proxy_remote_error() {
        let directory = tempdir().unwrap();
        let local_path = directory.path().join("proxy");
        let failure = CommandOutput {
            stdout: String::new(),
            stderr: String::from("ERROR: Couldn't find valid credentials"),
            exit_status: 1,
        };
        let session = FakeSession::new(vec![failure], b"");

        match create_and_download_proxy(&session, "secret", Path::new("/home"), &local_path) {
            Err(RemoteError::Command { command, stderr }) => {
                assert_eq!(command, "grid-proxy-init");
                assert_eq!(stderr, "ERROR: Couldn't find valid credentials");
            },
            other => panic!("unexpected result {:?}", other),
        };
        // The flow stops at the first failing command.
        assert_eq!(session.calls.borrow().len(), 1);
        assert!(!local_path.exists());
    }

    #[test]
    fn test_execute_checked() {
        let session = FakeSession::new(
            vec![
                CommandOutput { stdout: String::from("ok"), stderr: String::new(), exit_status: 0 },
                CommandOutput { stdout: String::new(), stderr: String::from("warning"), exit_status: 0 },
            ],
            b"",
        );

        assert_eq!(execute_checked(&session, "true").unwrap().stdout, "ok");
        assert!(matches!(execute_checked(&session, "noisy"), Err(RemoteError::Command { .. })));
    }
}
