//! GitHub issue executor adapter (C3): `create_issue` opens an approval
//! issue, `poll_issue_status` blocks until it closes with an "approved"
//! comment. `delete` is a deliberate no-op, matching `executors/git.go`'s
//! "DO NOTHING" branch for that action.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use prov_core::{Action, CoreError, Executor, ExecutorError, Step};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

const GITHUB_API: &str = "https://api.github.com";
const POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Bounds the poll loop to roughly the step activity's own execution budget
/// rather than holding a worker slot indefinitely.
const MAX_POLLS: u32 = 60;

pub struct GitExecutor {
    client: Client,
}

impl GitExecutor {
    pub fn new() -> Self {
        Self { client: Client::new() }
    }
}

impl Default for GitExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for GitExecutor {
    fn validate(&self, step: &Step) -> Result<(), CoreError> {
        match (step.action, step.operation.as_str()) {
            (Action::Delete, _) => Ok(()),
            (Action::Create, "create_issue" | "poll_issue_status") => Ok(()),
            _ => Err(CoreError::UnsupportedOperation {
                executor: "git".to_string(),
                operation: step.operation.clone(),
                action: step.action.as_str().to_string(),
            }),
        }
    }

    async fn execute(
        &self,
        step: &Step,
        variables: &HashMap<String, Value>,
    ) -> Result<serde_json::Map<String, Value>, ExecutorError> {
        if step.action == Action::Delete {
            info!(customer = %step.customer, "git delete is a no-op");
            return Ok(serde_json::Map::new());
        }

        match step.operation.as_str() {
            "create_issue" => self.create_issue(step, variables).await,
            "poll_issue_status" => self.poll_issue_status(variables).await,
            other => Err(ExecutorError::new(format!(
                "unsupported operation {other} for GitExecutor"
            ))),
        }
    }
}

impl GitExecutor {
    async fn create_issue(
        &self,
        step: &Step,
        variables: &HashMap<String, Value>,
    ) -> Result<serde_json::Map<String, Value>, ExecutorError> {
        let token = string_var(variables, "token")?;
        let repo_owner = string_var(variables, "repo_owner")?;
        let repo_name = string_var(variables, "repo_name")?;
        let body = string_var(variables, "body")?;

        let title = format!(
            "Issue Created for Account {} for Project {}. The requester is {}",
            step.customer, step.project, step.submitter
        );

        #[derive(Serialize)]
        struct IssueRequest<'a> {
            title: &'a str,
            body: &'a str,
        }

        let response = self
            .client
            .post(format!("{GITHUB_API}/repos/{repo_owner}/{repo_name}/issues"))
            .bearer_auth(&token)
            .header("User-Agent", "prov-worker")
            .json(&IssueRequest { title: &title, body: &body })
            .send()
            .await
            .map_err(|e| ExecutorError::new(format!("failed to create GitHub issue: {e}")))?;

        let issue: GithubIssue = parse_github_response(response).await?;

        let mut result = serde_json::Map::new();
        result.insert("issue_url".to_string(), Value::String(issue.html_url));
        result.insert("issue_id".to_string(), Value::String(issue.number.to_string()));
        Ok(result)
    }

    async fn poll_issue_status(
        &self,
        variables: &HashMap<String, Value>,
    ) -> Result<serde_json::Map<String, Value>, ExecutorError> {
        let token = string_var(variables, "token")?;
        let repo_owner = string_var(variables, "repo_owner")?;
        let repo_name = string_var(variables, "repo_name")?;
        let issue_number = variables
            .get("issue_id")
            .ok_or_else(|| ExecutorError::new("missing issue_id"))
            .and_then(issue_number_from_value)?;

        for _ in 0..MAX_POLLS {
            let response = self
                .client
                .get(format!(
                    "{GITHUB_API}/repos/{repo_owner}/{repo_name}/issues/{issue_number}"
                ))
                .bearer_auth(&token)
                .header("User-Agent", "prov-worker")
                .send()
                .await
                .map_err(|e| ExecutorError::new(format!("failed to fetch GitHub issue: {e}")))?;

            let issue: GithubIssue = parse_github_response(response).await?;

            if issue.state == "closed" {
                let comments = self.fetch_comments(&token, &repo_owner, &repo_name, issue_number).await?;
                if comments.iter().any(|c| c.body.to_lowercase().contains("approved")) {
                    let mut result = serde_json::Map::new();
                    result.insert("status".to_string(), Value::String("approved".to_string()));
                    return Ok(result);
                }
                return Err(ExecutorError::new("issue closed without an approval comment"));
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }

        Err(ExecutorError::new("timed out waiting for issue approval"))
    }

    async fn fetch_comments(
        &self,
        token: &str,
        repo_owner: &str,
        repo_name: &str,
        issue_number: u64,
    ) -> Result<Vec<GithubComment>, ExecutorError> {
        let response = self
            .client
            .get(format!(
                "{GITHUB_API}/repos/{repo_owner}/{repo_name}/issues/{issue_number}/comments"
            ))
            .bearer_auth(token)
            .header("User-Agent", "prov-worker")
            .send()
            .await
            .map_err(|e| ExecutorError::new(format!("failed to fetch GitHub comments: {e}")))?;

        parse_github_response(response).await
    }
}

#[derive(Deserialize)]
struct GithubIssue {
    number: u64,
    html_url: String,
    #[serde(default)]
    state: String,
}

#[derive(Deserialize)]
struct GithubComment {
    body: String,
}

async fn parse_github_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ExecutorError> {
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| ExecutorError::new(format!("failed to read GitHub response: {e}")))?;

    if !status.is_success() {
        return Err(ExecutorError::new(format!("GitHub API returned {status}: {text}")));
    }

    serde_json::from_str(&text)
        .map_err(|e| ExecutorError::new(format!("failed to parse GitHub response: {e}")))
}

fn string_var(variables: &HashMap<String, Value>, key: &str) -> Result<String, ExecutorError> {
    variables
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ExecutorError::new(format!("missing or non-string variable '{key}'")))
}

fn issue_number_from_value(value: &Value) -> Result<u64, ExecutorError> {
    match value {
        Value::String(s) => s
            .parse()
            .map_err(|_| ExecutorError::new(format!("invalid issue_id '{s}'"))),
        Value::Number(n) => n.as_u64().ok_or_else(|| ExecutorError::new("issue_id out of range")),
        other => Err(ExecutorError::new(format!("unsupported issue_id type: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_number_parses_from_string_or_number() {
        assert_eq!(issue_number_from_value(&Value::String("42".to_string())).unwrap(), 42);
        assert_eq!(issue_number_from_value(&Value::Number(7.into())).unwrap(), 7);
        assert!(issue_number_from_value(&Value::Null).is_err());
    }
}
