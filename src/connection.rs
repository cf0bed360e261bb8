//! A connection to the cluster, assembled once from a credential strategy.
//!
//! A [`Connection`] owns a [`JobClient`] talking to the job service, and, when the credential
//! strategy is a password or a private key, a [`RemoteSession`] on the cluster's login node. The
//! remote session transfers files, and generates the proxy certificate authenticating the job
//! client.

use crate::client::transport::{HttpTransport, Transport, TransportError};
use crate::client::JobClient;
use crate::configuration::Configuration;
use crate::credential::{Credential, CredentialError, ProxyCredential};
use crate::remote::{self, RemoteError, RemoteSession};
use crate::script::Interpreter;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

pub struct Connection<T: Transport> {
    jobs: JobClient<T>,
    session: Option<Box<dyn RemoteSession>>,
    remote_home: PathBuf,
}

impl Connection<HttpTransport> {
    /// Open a connection as described by the given configuration. Password and private key
    /// strategies open an SSH session right away, and load a previously fetched proxy when one is
    /// configured and exists. The proxy strategy loads the configured proxy, which must exist.
    pub fn open(configuration: &Configuration) -> Result<Connection<HttpTransport>, ConnectionError> {
        let service = &configuration.service;
        let transport = HttpTransport::new(&service.base_url, service.timeout.map(Duration::from_secs))?;
        let interpreter = Interpreter::new(&configuration.script.interpreter);
        let mut jobs = JobClient::new(transport, service.host.clone(), interpreter);

        let credential = configuration.credential.to_credential();
        debug!("Connecting with {:?}.", credential);
        let session = match &credential {
            Credential::Proxy(path) => {
                jobs.set_proxy(ProxyCredential::from_file(path)?);

                None
            },
            _ => {
                if let Some(path) = configuration.credential.get_proxy().filter(|path| path.exists()) {
                    jobs.set_proxy(ProxyCredential::from_file(path)?);
                };

                Some(open_session(configuration, &credential)?)
            },
        };

        Ok(Connection::new(jobs, session, configuration.ssh.get_remote_home()))
    }
}

#[cfg(feature = "ssh")]
fn open_session(configuration: &Configuration, credential: &Credential) -> Result<Box<dyn RemoteSession>, RemoteError> {
    use crate::remote::ssh::{SshSession, SshTarget};

    let ssh = &configuration.ssh;
    let target = SshTarget {
        host: ssh.host.clone().unwrap_or_else(|| configuration.service.host.clone()),
        port: ssh.port,
        username: ssh.username.clone(),
        known_hosts: ssh.get_known_hosts(),
    };

    Ok(Box::new(SshSession::connect(&target, credential)?))
}

#[cfg(not(feature = "ssh"))]
fn open_session(_configuration: &Configuration, _credential: &Credential) -> Result<Box<dyn RemoteSession>, RemoteError> {
    Err(RemoteError::NoSession)
}

impl<T: Transport> Connection<T> {
    /// Create a new connection from its parts.
    pub fn new(jobs: JobClient<T>, session: Option<Box<dyn RemoteSession>>, remote_home: PathBuf) -> Connection<T> {
        Connection {
            jobs: jobs,
            session: session,
            remote_home: remote_home,
        }
    }

    /// Get the job client.
    pub fn get_jobs(&self) -> &JobClient<T> {
        &self.jobs
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// Upload the given local file to the cluster.
    pub fn upload(&self, local_path: &Path, remote_path: &Path) -> Result<(), RemoteError> {
        self.get_session()?.upload(local_path, remote_path)
    }

    /// Download the given file from the cluster.
    pub fn download(&self, remote_path: &Path, local_path: &Path) -> Result<(), RemoteError> {
        self.get_session()?.download(remote_path, local_path)
    }

    /// Generate a proxy certificate on the cluster, download it to the given local path, and use
    /// it to authenticate all subsequent job requests.
    pub fn create_and_download_proxy(&mut self, passphrase: &str, local_path: &Path) -> Result<(), RemoteError> {
        let proxy = remote::create_and_download_proxy(self.get_session()?, passphrase, &self.remote_home, local_path)?;
        self.jobs.set_proxy(proxy);
        info!("Job client authenticated with the new proxy.");

        Ok(())
    }

    fn get_session(&self) -> Result<&dyn RemoteSession, RemoteError> {
        match &self.session {
            Some(session) => Ok(session.as_ref()),
            None => Err(RemoteError::NoSession),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::transport::{Request, Response};
    use crate::client::ClientError;
    use crate::remote::testing::{Call, FakeSession};
    use std::cell::RefCell;
    use std::rc::Rc;
    use tempfile::tempdir;

    /// A transport recording the proxy header of every request, and answering with a queued job.
    struct HeaderTransport {
        proxies: Rc<RefCell<Vec<String>>>,
    }

    impl Transport for HeaderTransport {
        fn send(&self, request: &Request) -> Result<Response, TransportError> {
            for (name, value) in request.get_headers() {
                if name == "PROXY" {
                    self.proxies.borrow_mut().push(value.clone());
                }
            }

            Ok(Response::new(200, String::from(r#"{"status": "QUEUED", "job_id": "1", "stdout_path": "/o", "stderr_path": "/e"}"#)))
        }
    }

    fn connection(session: Option<Box<dyn RemoteSession>>) -> (Connection<HeaderTransport>, Rc<RefCell<Vec<String>>>) {
        let proxies = Rc::new(RefCell::new(Vec::new()));
        let transport = HeaderTransport { proxies: proxies.clone() };
        let jobs = JobClient::new(transport, String::from("ares.cyfronet.pl"), Interpreter::new("/bin/sh"));

        (Connection::new(jobs, session, PathBuf::from("/net/people/plgrid/plgjdoe")), proxies)
    }

    #[test]
    fn test_bootstrap_authenticates_job_client() {
        let directory = tempdir().unwrap();
        let local_path = directory.path().join("proxy");
        let (mut connection, proxies) = connection(Some(Box::new(FakeSession::new(vec![], b"cHJveHk="))));

        assert!(matches!(connection.get_jobs().status("1"), Err(ClientError::ProxyNotInitialized)));
        connection.create_and_download_proxy("secret", &local_path).unwrap();
        assert!(connection.get_jobs().has_proxy());
        assert!(!connection.get_jobs().status("1").unwrap().is_error());

        assert_eq!(*proxies.borrow(), vec![String::from("Y0hKdmVIaz0=")]);
    }

    #[test]
    fn test_transfers() {
        let session = Rc::new(FakeSession::new(vec![], b"content"));
        let (connection, _) = connection(Some(Box::new(SharedSession(session.clone()))));
        let directory = tempdir().unwrap();
        let local_path = directory.path().join("results.txt");

        connection.upload(Path::new("train.py"), Path::new("/net/scratch/train.py")).unwrap();
        connection.download(Path::new("/net/scratch/results.txt"), &local_path).unwrap();

        assert_eq!(std::fs::read(&local_path).unwrap(), b"content");
        assert_eq!(
            *session.calls.borrow(),
            vec![
                Call::Upload(PathBuf::from("train.py"), PathBuf::from("/net/scratch/train.py")),
                Call::Download(PathBuf::from("/net/scratch/results.txt"), local_path.clone()),
            ],
        );
    }

    #[test]
    fn test_no_session() {
        let (mut connection, _) = connection(None);

        assert!(!connection.has_session());
        assert!(matches!(connection.upload(Path::new("a"), Path::new("b")), Err(RemoteError::NoSession)));
        assert!(matches!(connection.download(Path::new("a"), Path::new("b")), Err(RemoteError::NoSession)));
        assert!(matches!(connection.create_and_download_proxy("secret", Path::new("proxy")), Err(RemoteError::NoSession)));
    }

    #[test]
    fn test_open_with_proxy_file() {
        let directory = tempdir().unwrap();
        let proxy_path = directory.path().join("proxy");
        std::fs::write(&proxy_path, b"proxy").unwrap();
        let configuration = Configuration::from_toml(&format!(
            "[credential]\nstrategy = \"proxy\"\npath = \"{}\"",
            proxy_path.display(),
        )).unwrap();

        let connection = Connection::open(&configuration).unwrap();
        assert!(!connection.has_session());
        assert!(connection.get_jobs().has_proxy());
        assert_eq!(connection.get_jobs().get_host(), "ares.cyfronet.pl");
        assert_eq!(connection.get_jobs().get_interpreter(), Interpreter::new("/bin/sh").as_ref());

        let missing = Configuration::from_toml("[credential]\nstrategy = \"proxy\"\npath = \"/nonexistent/areq/proxy\"").unwrap();
        assert!(matches!(Connection::open(&missing), Err(ConnectionError::Credential(_))));
    }

    /// Share a fake session between the connection and the test.
    struct SharedSession(Rc<FakeSession>);

    impl RemoteSession for SharedSession {
        fn upload(&self, local_path: &Path, remote_path: &Path) -> Result<(), RemoteError> {
            self.0.upload(local_path, remote_path)
        }

        fn download(&self, remote_path: &Path, local_path: &Path) -> Result<(), RemoteError> {
            self.0.download(remote_path, local_path)
        }

        fn execute(&self, command: &str) -> Result<remote::CommandOutput, RemoteError> {
            self.0.execute(command)
        }
    }
}
