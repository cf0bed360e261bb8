//! Areq's main configuration, loading the user's runtime configuration.
//!
//! The user's runtime configuration is loaded from the file `configuration.toml`, relative to the
//! working directory, or from the file given on the command line. Values can be overridden by
//! environment variables prefixed by `AREQ_`, using `__` as a separator between sections and
//! keys (for example `AREQ_SERVICE__HOST`). Every configuration option has a default value,
//! except the SSH username when the credential strategy needs an SSH session.

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use config::FileFormat;
use crate::credential::Credential;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use validator::Validate;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
impl Default for LogLevel {
    fn default() -> Self {
        LogLevel::Info
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Log {
    #[serde(default)]
    pub level: LogLevel,
}

fn default_base_url() -> String {
    String::from("https://submit.plgrid.pl/api/")
}

fn default_host() -> String {
    String::from("ares.cyfronet.pl")
}

/// The job service, and the cluster jobs are submitted on.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Service {
    #[serde(default = "default_base_url")]
    #[validate(url)]
    pub base_url: String,
    #[serde(default = "default_host")]
    #[validate(length(min = 1))]
    pub host: String,
    /// Timeout of every request, in seconds.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub timeout: Option<u64>,
}
impl Default for Service {
    fn default() -> Self {
        Service {
            base_url: default_base_url(),
            host: default_host(),
            timeout: None,
        }
    }
}

fn default_interpreter() -> String {
    String::from("/bin/sh")
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// The interpreter of scripts without shebang. An empty value disables the default.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
}
impl Default for Script {
    fn default() -> Self {
        Script {
            interpreter: default_interpreter(),
        }
    }
}

fn default_port() -> u16 {
    22
}

/// The SSH access to the cluster's login node.
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Ssh {
    #[serde(default)]
    pub username: String,
    /// The login node, the service host when not set.
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,
    /// The known hosts file, `~/.ssh/known_hosts` when not set.
    #[serde(default)]
    pub known_hosts: Option<PathBuf>,
    /// The user's home directory on the cluster, `/net/people/plgrid/<username>` when not set.
    #[serde(default)]
    pub remote_home: Option<PathBuf>,
}
impl Default for Ssh {
    fn default() -> Self {
        Ssh {
            username: String::new(),
            host: None,
            port: default_port(),
            known_hosts: None,
            remote_home: None,
        }
    }
}

impl Ssh {
    pub fn get_known_hosts(&self) -> PathBuf {
        match &self.known_hosts {
            Some(path) => path.clone(),
            None => {
                let home = env::var_os("HOME").map(PathBuf::from).unwrap_or_default();

                home.join(".ssh").join("known_hosts")
            },
        }
    }

    pub fn get_remote_home(&self) -> PathBuf {
        match &self.remote_home {
            Some(path) => path.clone(),
            None => PathBuf::from("/net/people/plgrid").join(&self.username),
        }
    }
}

/// The credential strategy, selected by the `strategy` key.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(tag = "strategy", rename_all = "snake_case", deny_unknown_fields)]
pub enum CredentialConfiguration {
    Password {
        password: String,
        /// A previously fetched proxy, loaded when present.
        #[serde(default)]
        proxy: Option<PathBuf>,
    },
    PrivateKey {
        path: PathBuf,
        #[serde(default)]
        proxy: Option<PathBuf>,
    },
    Proxy {
        path: PathBuf,
    },
}
impl Default for CredentialConfiguration {
    fn default() -> Self {
        CredentialConfiguration::Proxy {
            path: PathBuf::from("proxy"),
        }
    }
}

impl CredentialConfiguration {
    /// Get the credential strategy.
    pub fn to_credential(&self) -> Credential {
        match self {
            CredentialConfiguration::Password { password, .. } => Credential::Password(password.clone()),
            CredentialConfiguration::PrivateKey { path, .. } => Credential::PrivateKey(path.clone()),
            CredentialConfiguration::Proxy { path } => Credential::Proxy(path.clone()),
        }
    }

    /// Get the proxy file to load at connection, if any.
    pub fn get_proxy(&self) -> Option<&PathBuf> {
        match self {
            CredentialConfiguration::Password { proxy, .. } => proxy.as_ref(),
            CredentialConfiguration::PrivateKey { proxy, .. } => proxy.as_ref(),
            CredentialConfiguration::Proxy { path } => Some(path),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Configuration {
    #[serde(default)]
    #[validate]
    pub log: Log,
    #[serde(default)]
    #[validate]
    pub service: Service,
    #[serde(default)]
    #[validate]
    pub script: Script,
    #[serde(default)]
    #[validate]
    pub ssh: Ssh,
    #[serde(default)]
    pub credential: CredentialConfiguration,
}

impl Configuration {
    /// Load the configuration from the given file, or from the optional `configuration.toml` file
    /// when no file is given, then apply environment overrides. It returns a properly
    /// instantiated and validated configuration tree in case of success, or a message describing
    /// the error in case of error.
    pub fn new(path: Option<&str>) -> Result<Self, String> {
        match Self::load(path) {
            Ok(configuration) => configuration.check(),
            Err(error) => Err(error.to_string()),
        }
    }

    /// Load the configuration from the given TOML content only.
    pub fn from_toml(content: &str) -> Result<Self, String> {
        let mut configuration = Config::default();
        if let Err(error) = configuration.merge(File::from_str(content, FileFormat::Toml)) {
            return Err(error.to_string());
        };

        match configuration.try_into::<Configuration>() {
            Ok(configuration) => configuration.check(),
            Err(error) => Err(error.to_string()),
        }
    }

    fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut configuration = Config::default();

        match path {
            Some(path) => configuration.merge(File::with_name(path).format(FileFormat::Toml).required(true))?,
            None => configuration.merge(File::with_name("configuration.toml").format(FileFormat::Toml).required(false))?,
        };
        configuration.merge(Environment::with_prefix("AREQ").separator("__"))?;

        configuration.try_into()
    }

    /// Validate the configuration tree.
    fn check(self) -> Result<Self, String> {
        if let Err(errors) = self.validate() {
            return Err(errors.to_string());
        };
        if self.credential.to_credential().needs_session() && self.ssh.username.trim().is_empty() {
            return Err(String::from("ssh.username is required by the password and private_key strategies"));
        };

        Ok(self)
    }
}
