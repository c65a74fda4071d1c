use std::time::Duration;

use crate::agent::StepError;
use serde_json::Value;
use ureq::{self, Agent};

fn agent_with_timeout(timeout: Duration) -> Agent {
    let config = Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();

    config.into()
}

/// Send a POST request with a JSON body and decode the JSON response.
///
/// `bearer` is sent as an `Authorization: Bearer` header when present. The
/// whole exchange is bounded by `timeout`.
pub fn http_post_json(
    url: &str,
    bearer: Option<&str>,
    body: &Value,
    timeout: Duration,
) -> Result<Value, StepError> {
    let agent = agent_with_timeout(timeout);

    let mut request = agent.post(url);
    if let Some(token) = bearer {
        request = request.header("Authorization", format!("Bearer {token}"));
    }

    let response: Value = request.send_json(body)?.body_mut().read_json()?;

    Ok(response)
}
