//! Areq's job client, submitting and monitoring jobs through the job service.
//!
//! Every operation is a single request/response round trip, without retry nor polling. Errors
//! reported by the job service come back as values ([`SubmitResponse::Error`],
//! [`ActionResponse::Error`]), while failures to reach the service or to understand its answer
//! come back as a [`ClientError`].

mod error;
pub mod transport;

pub use self::error::ClientError;
use crate::credential::ProxyCredential;
use crate::job::{ActionResponse, ScriptRequest, ServiceError, StatusQuery, StatusesResponse, SubmitResponse};
use crate::script::options::JobOptions;
use crate::script::{self, Interpreter};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::json;
use self::transport::{Method, Request, Response, Transport};

/// The header carrying the proxy credential.
pub const PROXY_HEADER: &str = "PROXY";

const JOBS: &str = "jobs";

/// A client of the job service, for a given target host.
pub struct JobClient<T: Transport> {
    transport: T,
    host: String,
    interpreter: Option<Interpreter>,
    proxy: Option<ProxyCredential>,
}

impl<T: Transport> JobClient<T> {
    /// Create a new job client submitting jobs on the given host. Scripts without an interpreter
    /// directive use the given default interpreter. Requests cannot be sent until a proxy
    /// credential is set.
    pub fn new(transport: T, host: String, interpreter: Option<Interpreter>) -> JobClient<T> {
        JobClient {
            transport: transport,
            host: host,
            interpreter: interpreter,
            proxy: None,
        }
    }

    /// Set the proxy credential authenticating all subsequent requests.
    pub fn set_proxy(&mut self, proxy: ProxyCredential) {
        self.proxy = Some(proxy);
    }

    pub fn has_proxy(&self) -> bool {
        self.proxy.is_some()
    }

    pub fn get_host(&self) -> &str {
        &self.host
    }

    pub fn get_interpreter(&self) -> Option<&Interpreter> {
        self.interpreter.as_ref()
    }

    /// Submit the given script with the given options, optionally running it in the given
    /// working directory. The script is checked and assembled before anything is sent.
    pub fn submit(&self, script: &str, options: &JobOptions, working_directory: Option<&str>) -> Result<SubmitResponse, ClientError> {
        let lines = script::split_lines(script)?;
        let script = script::build_script(&lines, options, self.interpreter.as_ref())?;
        let body = ScriptRequest::new(self.host.clone(), script, working_directory.map(String::from));
        let body = serde_json::to_value(&body).map_err(ClientError::Encode)?;
        let request = Request::new(Method::Post, vec![JOBS.to_string()]).with_body(body);

        let response = self.send(request)?;

        decode(&response)
    }

    /// Get the status of a single job.
    pub fn status(&self, job_id: &str) -> Result<SubmitResponse, ClientError> {
        let response = self.send(Request::new(Method::Get, job_segments(job_id)?))?;

        decode(&response)
    }

    /// Get the status of one or many jobs, in a single request.
    pub fn statuses<Q: Into<StatusQuery>>(&self, query: Q) -> Result<StatusesResponse, ClientError> {
        let query = query.into();
        let request = Request::new(Method::Get, vec![JOBS.to_string()]).with_query(query.to_parameters());
        let response = self.send(request)?;

        decode(&response)
    }

    /// Delete the given job.
    pub fn delete(&self, job_id: &str) -> Result<ActionResponse, ClientError> {
        let response = self.send(Request::new(Method::Delete, job_segments(job_id)?))?;

        acknowledge(&response)
    }

    /// Abort the given job.
    pub fn abort(&self, job_id: &str) -> Result<ActionResponse, ClientError> {
        let request = Request::new(Method::Put, job_segments(job_id)?).with_body(json!({"action": "abort"}));
        let response = self.send(request)?;

        acknowledge(&response)
    }

    /// Authenticate the given request and send it.
    fn send(&self, request: Request) -> Result<Response, ClientError> {
        let proxy = match &self.proxy {
            Some(proxy) => proxy,
            None => return Err(ClientError::ProxyNotInitialized),
        };
        let request = request.with_header(PROXY_HEADER, proxy.get_header_value());
        debug!("Sending {:?} /{}.", request.get_method(), request.get_segments().join("/"));

        Ok(self.transport.send(&request)?)
    }
}

/// Get the path segments of the given job. Empty and dot identifiers are rejected, URL
/// resolution would turn them into the jobs collection.
fn job_segments(job_id: &str) -> Result<Vec<String>, ClientError> {
    match job_id {
        "" | "." | ".." => Err(ClientError::InvalidJobId(job_id.to_string())),
        _ => Ok(vec![JOBS.to_string(), job_id.to_string()]),
    }
}

fn decode<D: DeserializeOwned>(response: &Response) -> Result<D, ClientError> {
    serde_json::from_str(response.get_body()).map_err(|error| ClientError::Decode {
        status: response.get_status(),
        source: error,
    })
}

/// Interpret the response to an action: any 2xx status is a success, the body of any other
/// status must be a service error.
fn acknowledge(response: &Response) -> Result<ActionResponse, ClientError> {
    if response.is_success() {
        return Ok(ActionResponse::Done);
    }

    match decode::<SubmitResponse>(response)? {
        SubmitResponse::Error(error) => Ok(ActionResponse::Error(error)),
        // A success shape with a failure status still is a failure.
        _ => Ok(ActionResponse::Error(ServiceError {
            exit_code: -1,
            standard_output: String::new(),
            error_output: String::new(),
            error_message: format!("job service answered with status {}", response.get_status()),
            tag: None,
        })),
    }
}
