use crate::credential::Credential;
use log::debug;
use ssh2::{CheckResult, KnownHostFileKind, Session};
use std::fs::File;
use std::io::{self, Read};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use super::{CommandOutput, RemoteError, RemoteSession};

impl From<ssh2::Error> for RemoteError {
    fn from(error: ssh2::Error) -> Self {
        RemoteError::Ssh(error.to_string())
    }
}

/// Parameters of an SSH connection.
#[derive(Clone, Debug)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub known_hosts: PathBuf,
}

/// A remote session over SSH, with host key verification against a known hosts file.
pub struct SshSession {
    session: Session,
}

impl SshSession {
    /// Connect to the given target and authenticate with the given credential, which must be a
    /// password or a private key.
    pub fn connect(target: &SshTarget, credential: &Credential) -> Result<SshSession, RemoteError> {
        debug!("Connecting to {}@{}:{}.", target.username, target.host, target.port);
        let stream = TcpStream::connect((target.host.as_str(), target.port))?;
        let mut session = Session::new()?;
        session.set_tcp_stream(stream);
        session.handshake()?;

        SshSession::verify_host_key(&session, target)?;

        match credential {
            Credential::Password(password) => session.userauth_password(&target.username, password)?,
            Credential::PrivateKey(path) => session.userauth_pubkey_file(&target.username, None, path, None)?,
            Credential::Proxy(_) => return Err(RemoteError::NoSession),
        };
        debug!("Authenticated as {} on {}.", target.username, target.host);

        Ok(SshSession {
            session: session,
        })
    }

    /// Check the host key presented by the server against the known hosts file.
    fn verify_host_key(session: &Session, target: &SshTarget) -> Result<(), RemoteError> {
        let mut known_hosts = session.known_hosts()?;
        known_hosts.read_file(&target.known_hosts, KnownHostFileKind::OpenSSH)?;
        let (key, _) = match session.host_key() {
            Some(host_key) => host_key,
            None => return Err(RemoteError::UnknownHost(target.host.clone())),
        };

        let result = match target.port {
            22 => known_hosts.check(&target.host, key),
            port => known_hosts.check_port(&target.host, port, key),
        };
        match result {
            CheckResult::Match => Ok(()),
            _ => Err(RemoteError::UnknownHost(target.host.clone())),
        }
    }
}

impl RemoteSession for SshSession {
    fn upload(&self, local_path: &Path, remote_path: &Path) -> Result<(), RemoteError> {
        debug!("Uploading {} to {}.", local_path.display(), remote_path.display());
        let sftp = self.session.sftp()?;
        let mut local = File::open(local_path)?;
        let mut remote = sftp.create(remote_path)?;
        io::copy(&mut local, &mut remote)?;

        Ok(())
    }

    fn download(&self, remote_path: &Path, local_path: &Path) -> Result<(), RemoteError> {
        debug!("Downloading {} to {}.", remote_path.display(), local_path.display());
        let sftp = self.session.sftp()?;
        let mut remote = sftp.open(remote_path)?;
        let mut local = File::create(local_path)?;
        io::copy(&mut remote, &mut local)?;

        Ok(())
    }

    fn execute(&self, command: &str) -> Result<CommandOutput, RemoteError> {
        let mut channel = self.session.channel_session()?;
        channel.request_pty("xterm", None, None)?;
        channel.exec(command)?;

        let mut stdout = String::new();
        channel.read_to_string(&mut stdout)?;
        let mut stderr = String::new();
        channel.stderr().read_to_string(&mut stderr)?;
        channel.wait_close()?;
        let exit_status = channel.exit_status()?;
        debug!("Remote command exited with status {}.", exit_status);

        Ok(CommandOutput {
            stdout: stdout,
            stderr: stderr,
            exit_status: exit_status,
        })
    }
}
