use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum AutomationError {
    #[error("automation endpoint returned HTTP {status}: {body}")]
    Endpoint { status: u16, body: String },
    #[error("automation request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[async_trait::async_trait]
pub trait AutomationClient: Send + Sync {
    async fn dispatch(&self, payload: &Value) -> Result<Value, AutomationError>;
}

pub struct AppsScriptClient {
    pub url: String,
    pub token: Option<String>,
    pub client: reqwest::Client,
}

#[async_trait::async_trait]
impl AutomationClient for AppsScriptClient {
    async fn dispatch(&self, payload: &Value) -> Result<Value, AutomationError> {
        let mut body = payload.clone();
        if let (Some(token), Some(obj)) = (&self.token, body.as_object_mut()) {
            obj.insert("token".to_string(), Value::String(token.clone()));
        }

        let resp = self.client.post(&self.url).json(&body).send().await?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(AutomationError::Endpoint {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
    }
}
