use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::error::{Result, TransformError};

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Response body as seen by a transformer: fully buffered or still streaming.
pub enum ResponseBody {
    Full(Bytes),
    Stream(ByteStream),
}

impl ResponseBody {
    /// Wrap a stream of chunks, whatever its error type
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: fmt::Display,
    {
        Self::Stream(Box::pin(
            stream.map_err(|e| TransformError::Stream(e.to_string())),
        ))
    }

    /// Collect the whole body into memory
    pub async fn collect(self) -> Result<Bytes> {
        match self {
            Self::Full(bytes) => Ok(bytes),
            Self::Stream(mut stream) => {
                let mut buffer = Vec::new();
                while let Some(chunk) = stream.next().await {
                    buffer.extend_from_slice(&chunk?);
                }
                Ok(Bytes::from(buffer))
            }
        }
    }

    /// View the body as a stream; a buffered body becomes a single chunk
    pub fn into_stream(self) -> ByteStream {
        match self {
            Self::Full(bytes) => Box::pin(futures::stream::once(async move { Ok(bytes) })),
            Self::Stream(stream) => stream,
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Upstream response handed to `transform_response_out`.
/// Status and headers are carried through every transform untouched.
#[derive(Debug)]
pub struct PluginResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl PluginResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: ResponseBody) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Declared `Content-Type`, if present and valid ASCII
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

impl From<reqwest::Response> for PluginResponse {
    fn from(response: reqwest::Response) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        Self::new(
            status,
            headers,
            ResponseBody::from_stream(response.bytes_stream()),
        )
    }
}
