use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected response from {service}: {detail}")]
    Decode {
        service: &'static str,
        detail: String,
    },
}

impl ClientError {
    pub fn http(url: &str, source: reqwest::Error) -> Self {
        ClientError::Http {
            url: url.to_string(),
            source,
        }
    }
}
