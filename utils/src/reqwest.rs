use std::{fmt::Debug, time::Duration};

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use url::Url;

use crate::serde::SerdeResponseParseAsync;

#[derive(Debug)]
pub enum ReqwestStage {
    Send,
    Status,
    DecodeText,
    Deserialise,
}

#[derive(Debug)]
#[allow(dead_code)]
pub struct ReqwestErrorContext {
    pub url: Url,
    query: String,
}

#[derive(Debug)]
pub enum ReqwestInnerError {
    Reqwest(reqwest::Error),
    SerdePath(crate::serde::SerdePathError),
}

impl ReqwestInnerError {
    pub fn is_connect(&self) -> bool {
        match self {
            Self::Reqwest(err) => err.is_connect(),
            Self::SerdePath(_) => false,
        }
    }
}

/// Builds the shared HTTP client. `timeout` of `None` keeps reqwest's default
/// of waiting indefinitely.
pub fn build_client(timeout: Option<Duration>) -> crate::Result<Client> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(crate::Error::ClientBuildFailed)
}

/// GET request wrapper which tags every failure with the stage it happened at.
pub struct Reqwest {
    builder: RequestBuilder,
    error_context: Option<ReqwestErrorContext>,
}

impl Reqwest {
    pub fn get(client: &Client, url: Url) -> Self {
        Self {
            builder: client.get(url.clone()),
            error_context: Some(ReqwestErrorContext {
                url,
                query: String::new(),
            }),
        }
    }

    pub fn query<T: serde::Serialize + Debug + ?Sized>(mut self, query: &T) -> Self {
        if let Some(context) = self.error_context.as_mut() {
            context.query = format!("{query:?}");
        }
        self.builder = self.builder.query(query);
        self
    }

    async fn receive_text_internal(mut self) -> crate::Result<(String, Box<ReqwestErrorContext>)> {
        let error_context = Box::new(
            self.error_context
                .take()
                .ok_or(crate::Error::ReqwestErrorContextMissing)?,
        );

        let response = match self.builder.send().await {
            Ok(response) => response,
            Err(err) if err.is_connect() => {
                tracing::debug!(url = %error_context.url, "connection failed");
                return Err(crate::Error::Internet(error_context.url));
            }
            Err(err) => {
                tracing::debug!(url = %error_context.url, %err, "request failed at send");
                return Err(crate::Error::ReqwestFailed {
                    stage: ReqwestStage::Send,
                    context: error_context,
                    inner: ReqwestInnerError::Reqwest(err),
                });
            }
        };

        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(
                    url = %error_context.url,
                    status = ?err.status(),
                    "request failed with status"
                );
                return Err(crate::Error::ReqwestFailed {
                    stage: ReqwestStage::Status,
                    context: error_context,
                    inner: ReqwestInnerError::Reqwest(err),
                });
            }
        };

        match response.text().await {
            Ok(text) => Ok((text, error_context)),
            Err(err) => {
                tracing::debug!(url = %error_context.url, %err, "failed to read response body");
                Err(crate::Error::ReqwestFailed {
                    stage: ReqwestStage::DecodeText,
                    context: error_context,
                    inner: ReqwestInnerError::Reqwest(err),
                })
            }
        }
    }

    pub async fn receive_json<J: Debug + DeserializeOwned>(self) -> crate::Result<J> {
        let (text, error_context) = self.receive_text_internal().await?;

        text.as_str()
            .serde_parse_custom::<J>()
            .await
            .map_err(|err| {
                tracing::debug!(
                    url = %error_context.url,
                    path = %err.path(),
                    "failed to deserialise response"
                );
                crate::Error::ReqwestFailed {
                    stage: ReqwestStage::Deserialise,
                    context: error_context,
                    inner: ReqwestInnerError::SerdePath(err),
                }
            })
    }
}
