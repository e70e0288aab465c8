//! Posting collaborators
//!
//! The bot only needs "send this text somewhere and tell me if it worked".
//! Credentials travel in an explicit `PosterConfig`, never in globals.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use log::info;
use reqwest::blocking::Client;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while posting
#[derive(Debug, Error)]
pub enum PostError {
	/// HTTP request failed (connection, timeout, TLS)
	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),

	/// The endpoint answered with a non-success status
	#[error("Post rejected with status {status}: {body}")]
	Status { status: reqwest::StatusCode, body: String },

	/// Local output failed (dry run)
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

/// Something able to publish a generated text.
pub trait Poster {
	fn post(&mut self, text: &str) -> Result<(), PostError>;
}

/// Connection parameters for `HttpPoster`
#[derive(Clone)]
pub struct PosterConfig {
	/// URL receiving the POST request
	pub endpoint: String,
	/// Bearer token sent with every request
	pub access_token: String,
	/// Per-request timeout
	pub timeout: Duration,
}

impl fmt::Debug for PosterConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PosterConfig")
			.field("endpoint", &self.endpoint)
			.field("has_access_token", &!self.access_token.is_empty())
			.field("timeout", &self.timeout)
			.finish()
	}
}

#[derive(Serialize)]
struct PostRequest<'a> {
	text: &'a str,
}

/// Posts `{"text": ...}` as JSON with a bearer token.
pub struct HttpPoster {
	client: Client,
	config: PosterConfig,
}

impl HttpPoster {
	/// Creates a poster with a reusable blocking HTTP client.
	pub fn new(config: PosterConfig) -> Result<Self, PostError> {
		let client = Client::builder()
			.timeout(config.timeout)
			.build()?;
		Ok(Self { client, config })
	}
}

impl Poster for HttpPoster {
	fn post(&mut self, text: &str) -> Result<(), PostError> {
		let response = self.client
			.post(&self.config.endpoint)
			.bearer_auth(&self.config.access_token)
			.json(&PostRequest { text })
			.send()?;

		let status = response.status();
		if !status.is_success() {
			let body = response.text().unwrap_or_default();
			return Err(PostError::Status { status, body });
		}

		info!("Posted {} bytes to {}", text.len(), self.config.endpoint);
		Ok(())
	}
}

/// Writes posts to a local sink instead of publishing them.
pub struct DryRunPoster<W: Write> {
	out: W,
}

impl<W: Write> DryRunPoster<W> {
	pub fn new(out: W) -> Self {
		Self { out }
	}
}

impl<W: Write> Poster for DryRunPoster<W> {
	fn post(&mut self, text: &str) -> Result<(), PostError> {
		writeln!(self.out, "{}", text)?;
		self.out.flush()?;
		Ok(())
	}
}
