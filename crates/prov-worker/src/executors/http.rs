//! Generic HTTP executor adapter (C3): issues a request using `step.operation`
//! as the HTTP verb. Grounded on `executors/http.go`, with the original's
//! hardcoded-key toy AES-CFB `decrypt` replaced by the same envelope
//! encryption used for secrets at rest.

use std::collections::HashMap;

use async_trait::async_trait;
use prov_core::{CoreError, Executor, ExecutorError, Step};
use prov_storage::EncryptionService;
use reqwest::{Client, Method};
use serde_json::Value;

pub struct HttpExecutor {
    client: Client,
    encryption: EncryptionService,
}

impl HttpExecutor {
    pub fn new(encryption: EncryptionService) -> Self {
        Self { client: Client::new(), encryption }
    }
}

#[async_trait]
impl Executor for HttpExecutor {
    fn validate(&self, step: &Step) -> Result<(), CoreError> {
        parse_method(&step.operation)
            .map(|_| ())
            .map_err(|_| CoreError::UnsupportedOperation {
                executor: "http".to_string(),
                operation: step.operation.clone(),
                action: step.action.as_str().to_string(),
            })
    }

    async fn execute(
        &self,
        step: &Step,
        variables: &HashMap<String, Value>,
    ) -> Result<serde_json::Map<String, Value>, ExecutorError> {
        let method = parse_method(&step.operation)
            .map_err(|op| ExecutorError::new(format!("unsupported HTTP operation: {op}")))?;

        let url = variables
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| ExecutorError::new("missing url variable"))?;

        let mut headers = variables
            .get("headers")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        if let Some(encrypted) = headers.get("Authorization").and_then(Value::as_str) {
            let token = self
                .encryption
                .decrypt_to_string(encrypted.as_bytes())
                .map_err(|e| ExecutorError::new(format!("failed to decrypt authorization token: {e}")))?;
            headers.insert("Authorization".to_string(), Value::String(token));
        }

        let body = variables.get("body").cloned();

        let mut request = self.client.request(method.clone(), url);
        for (key, value) in &headers {
            if let Some(value) = value.as_str() {
                request = request.header(key, value);
            }
        }
        if matches!(method, Method::POST | Method::PUT) {
            request = request.header("Content-Type", "application/json");
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ExecutorError::new(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ExecutorError::new(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(ExecutorError::new(format!(
                "HTTP request failed with status code {status}: {text}"
            )));
        }

        match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ExecutorError::new(format!("unexpected response shape: {other}"))),
            Err(e) => Err(ExecutorError::new(format!("failed to unmarshal response body: {e}"))),
        }
    }
}

fn parse_method(operation: &str) -> Result<Method, &str> {
    match operation {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        other => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_method_accepts_only_supported_verbs() {
        assert_eq!(parse_method("GET").unwrap(), Method::GET);
        assert_eq!(parse_method("POST").unwrap(), Method::POST);
        assert!(parse_method("PATCH").is_err());
    }
}
