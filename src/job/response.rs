use serde::{Deserialize, Serialize};

/// The state of a job known to the job service.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum JobStatus {
    Queued,
    Finished,
}

/// A job successfully handled by the job service.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Submission {
    pub job_id: String,
    pub stdout_path: String,
    pub stderr_path: String,
    #[serde(default)]
    pub tag: Option<String>,
}

/// An error reported by the job service, in a well-formed response body.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, thiserror::Error)]
#[error("job service error (exit code {exit_code}): {error_message}")]
pub struct ServiceError {
    pub exit_code: i32,
    #[serde(default)]
    pub standard_output: String,
    #[serde(default)]
    pub error_output: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub tag: Option<String>,
}

/// A response of the job service about a single job, discriminated by its `status` field.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum SubmitResponse {
    Queued(Submission),
    Finished(Submission),
    Error(ServiceError),
}

impl SubmitResponse {
    /// Convert this response into a result, forcing callers to handle service errors.
    pub fn into_result(self) -> Result<(JobStatus, Submission), ServiceError> {
        match self {
            SubmitResponse::Queued(submission) => Ok((JobStatus::Queued, submission)),
            SubmitResponse::Finished(submission) => Ok((JobStatus::Finished, submission)),
            SubmitResponse::Error(error) => Err(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SubmitResponse::Error(_))
    }

    /// Get the tag attached to the job, whatever the response shape.
    pub fn get_tag(&self) -> Option<&str> {
        match self {
            SubmitResponse::Queued(submission) | SubmitResponse::Finished(submission) => submission.tag.as_deref(),
            SubmitResponse::Error(error) => error.tag.as_deref(),
        }
    }
}

/// A response of the job service to a bulk status query: either one response per job, or a
/// single response (usually an error) for the whole query.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatusesResponse {
    Many(Vec<SubmitResponse>),
    One(SubmitResponse),
}

impl StatusesResponse {
    /// Flatten this response into a list of responses.
    pub fn into_responses(self) -> Vec<SubmitResponse> {
        match self {
            StatusesResponse::Many(responses) => responses,
            StatusesResponse::One(response) => vec![response],
        }
    }
}

/// The outcome of an action (deletion, abortion) on a job.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum ActionResponse {
    Done,
    Error(ServiceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_submit_response() {
        let queued: SubmitResponse = serde_json::from_str(
            r#"{"status": "QUEUED", "job_id": "1234.ares", "stdout_path": "/out", "stderr_path": "/err", "tag": null}"#,
        ).unwrap();
        assert_eq!(
            queued,
            SubmitResponse::Queued(Submission {
                job_id: String::from("1234.ares"),
                stdout_path: String::from("/out"),
                stderr_path: String::from("/err"),
                tag: None,
            }),
        );
        assert!(!queued.is_error());

        let finished: SubmitResponse = serde_json::from_str(
            r#"{"status": "FINISHED", "job_id": "1", "stdout_path": "/o", "stderr_path": "/e", "tag": "nightly"}"#,
        ).unwrap();
        assert_eq!(finished.get_tag(), Some("nightly"));
        assert_eq!(finished.into_result().map(|(status, _)| status), Ok(JobStatus::Finished));

        let error: SubmitResponse = serde_json::from_str(
            r#"{"status": "ERROR", "exit_code": 1, "standard_output": "", "error_output": "sbatch: error", "error_message": "Invalid partition", "tag": null}"#,
        ).unwrap();
        assert!(error.is_error());
        assert_eq!(
            error.into_result(),
            Err(ServiceError {
                exit_code: 1,
                standard_output: String::new(),
                error_output: String::from("sbatch: error"),
                error_message: String::from("Invalid partition"),
                tag: None,
            }),
        );
    }

    #[test]
    fn test_decode_rejects_mixed_shapes() {
        // An error status never decodes as a success shape, and the other way around.
        assert!(serde_json::from_str::<SubmitResponse>(r#"{"status": "ERROR", "job_id": "1", "stdout_path": "/o", "stderr_path": "/e"}"#).is_err());
        assert!(serde_json::from_str::<SubmitResponse>(r#"{"status": "QUEUED", "exit_code": 1, "error_message": "nope"}"#).is_err());
        assert!(serde_json::from_str::<SubmitResponse>(r#"{"status": "RUNNING", "job_id": "1", "stdout_path": "/o", "stderr_path": "/e"}"#).is_err());
        assert!(serde_json::from_str::<SubmitResponse>(r#"{"job_id": "1", "stdout_path": "/o", "stderr_path": "/e"}"#).is_err());
    }

    #[test]
    fn test_decode_statuses_response() {
        let many: StatusesResponse = serde_json::from_str(
            r#"[{"status": "QUEUED", "job_id": "1", "stdout_path": "/o", "stderr_path": "/e"}, {"status": "ERROR", "exit_code": 2, "error_message": "unknown job"}]"#,
        ).unwrap();
        let responses = many.into_responses();
        assert_eq!(responses.len(), 2);
        assert!(!responses[0].is_error());
        assert!(responses[1].is_error());

        let one: StatusesResponse = serde_json::from_str(r#"{"status": "ERROR", "exit_code": 1, "error_message": "denied"}"#).unwrap();
        assert_eq!(one.into_responses().len(), 1);
    }

    #[test]
    fn test_encode_responses() {
        let response = SubmitResponse::Queued(Submission {
            job_id: String::from("1"),
            stdout_path: String::from("/o"),
            stderr_path: String::from("/e"),
            tag: None,
        });
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"status": "QUEUED", "job_id": "1", "stdout_path": "/o", "stderr_path": "/e", "tag": null}),
        );
        assert_eq!(serde_json::to_value(&ActionResponse::Done).unwrap(), serde_json::json!({"status": "DONE"}));
    }
}
