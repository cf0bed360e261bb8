//! Areq, a client for submitting and monitoring batch jobs on PLGrid HPC clusters.
//!
//! Jobs are submitted to the cluster through a REST job service: the [`script`] module assembles
//! batch scripts from a user's script and typed job options, and the [`client`] module sends them
//! and monitors the resulting jobs. The [`remote`] module transfers files over SFTP, and
//! bootstraps the proxy certificate authenticating the job service. A [`connection::Connection`]
//! puts everything together, configured once by a credential strategy.

pub mod client;
pub mod configuration;
pub mod connection;
pub mod credential;
pub mod job;
pub mod remote;
pub mod script;
