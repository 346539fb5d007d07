//! HTTP 请求命令（FetchCommand）
//!
//! 准备阶段在后台发出请求，业务阶段等待响应并作为结果。
//! GET/HEAD/DELETE 的参数编码进查询串，POST/PUT/PATCH 以表单体发送。
//! 传输失败记录为错误键 `fetch`。
//!
use crate::error::CollaboratorError;
use crate::pending::Pending;
use async_trait::async_trait;
use bon::Builder;
use cmdkit_core::{Command, CommandContext, CommandResult, CommandState};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use std::time::Duration;

pub const FETCH_ERROR: &str = "fetch";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// 参数是否以请求体发送
    pub fn carries_body(self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put | HttpMethod::Patch)
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

#[derive(Debug, Clone, Builder)]
pub struct FetchConfig {
    #[builder(into)]
    url: String,
    #[builder(default)]
    method: HttpMethod,
    #[builder(default)]
    params: Vec<(String, String)>,
    #[builder(default)]
    headers: Vec<(String, String)>,
    /// 请求整体截止时间
    #[builder(default = Duration::from_secs(30))]
    deadline: Duration,
    #[builder(default = true)]
    validate_certificate: bool,
}

impl FetchConfig {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 将响应体解析为 JSON 模型
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

pub struct FetchCommand {
    config: FetchConfig,
    pending: Pending<FetchResponse>,
    state: CommandState,
}

impl FetchCommand {
    pub fn new(config: FetchConfig) -> Self {
        Self {
            config,
            pending: Pending::default(),
            state: CommandState::new(),
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    fn client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .timeout(self.config.deadline)
            .danger_accept_invalid_certs(!self.config.validate_certificate)
            .build()
    }

    fn request(&self, client: &reqwest::Client) -> reqwest::RequestBuilder {
        let mut request = client.request(self.config.method.as_reqwest(), &self.config.url);
        for (name, value) in &self.config.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if self.config.params.is_empty() {
            request
        } else if self.config.method.carries_body() {
            request.form(&self.config.params)
        } else {
            request.query(&self.config.params)
        }
    }
}

impl fmt::Debug for FetchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchCommand")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

#[async_trait]
impl Command for FetchCommand {
    fn name(&self) -> &'static str {
        "fetch"
    }

    fn state(&self) -> &CommandState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CommandState {
        &mut self.state
    }

    async fn prepare(&mut self, _ctx: &CommandContext) {
        let client = match self.client() {
            Ok(client) => client,
            Err(err) => {
                self.add_error(FETCH_ERROR, &err.to_string());
                return;
            }
        };
        let request = self.request(&client);
        tracing::debug!(url = %self.config.url, method = ?self.config.method, "issuing fetch");

        self.pending.start(async move {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, CollaboratorError>(FetchResponse { status, body })
        });
    }

    async fn run_business(&mut self, _ctx: &CommandContext) -> CommandResult<()> {
        match self.pending.wait(FETCH_ERROR).await {
            Ok(response) => self.state.set_result(response),
            Err(err) => self.add_error(FETCH_ERROR, &err.to_string()),
        }
        Ok(())
    }
}
