//! Requests sent to the job service, and the responses it sends back.

mod response;

pub use self::response::{ActionResponse, JobStatus, ServiceError, StatusesResponse, SubmitResponse, Submission};
use serde::Serialize;

/// The body of a job submission.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScriptRequest {
    host: String,
    script: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    working_directory: Option<String>,
}

impl ScriptRequest {
    /// Create a new script request. The script must already be assembled.
    pub fn new(host: String, script: String, working_directory: Option<String>) -> ScriptRequest {
        ScriptRequest {
            host: host,
            script: script,
            working_directory: working_directory,
        }
    }
}

/// A status query about one or many jobs, optionally filtered by tag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusQuery {
    job_ids: Vec<String>,
    tag: Option<String>,
    format: Option<String>,
}

impl StatusQuery {
    /// Create a new query about the given jobs.
    pub fn new(job_ids: Vec<String>) -> StatusQuery {
        StatusQuery {
            job_ids: job_ids,
            tag: None,
            format: None,
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Get the query parameters: one `job_id` pair per job, then `tag` and `format` when set.
    pub fn to_parameters(&self) -> Vec<(String, String)> {
        let mut parameters: Vec<(String, String)> = self.job_ids
            .iter()
            .map(|job_id| (String::from("job_id"), job_id.clone()))
            .collect()
        ;
        if let Some(tag) = &self.tag {
            parameters.push((String::from("tag"), tag.clone()));
        }
        if let Some(format) = &self.format {
            parameters.push((String::from("format"), format.clone()));
        }

        parameters
    }
}

impl From<&str> for StatusQuery {
    fn from(job_id: &str) -> Self {
        StatusQuery::new(vec![job_id.to_string()])
    }
}

impl From<Vec<String>> for StatusQuery {
    fn from(job_ids: Vec<String>) -> Self {
        StatusQuery::new(job_ids)
    }
}

impl From<&[&str]> for StatusQuery {
    fn from(job_ids: &[&str]) -> Self {
        StatusQuery::new(job_ids.iter().map(|job_id| job_id.to_string()).collect())
    }
}
