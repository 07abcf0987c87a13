//! [`UsageService`] backed by the repository REST API over reqwest.

// crates.io
use reqwest::{RequestBuilder, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{AuthKey, Ticket},
	config::PluginConfig,
	crypto::AppSigner,
	error::RemoteCallError,
	http::{self, ReqwestHttpClient},
	usage::{Usage, UsageFuture, UsageRequest, UsageService},
};

/// REST path (below `rest/`) of the usage registration endpoint.
pub const CREATE_USAGE_PATH: &str = "usage/v1/usages/repository/-home-";
/// REST path (below `rest/`) of the application-authentication endpoint.
pub const APP_AUTH_PATH: &str = "authentication/v1/appauth";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateUsageBody<'a> {
	app_id: &'a str,
	course_id: String,
	resource_id: String,
	node_id: &'a str,
	node_version: &'a str,
}

#[derive(Deserialize)]
struct TicketBody {
	ticket: String,
}

/// Repository usage API client.
#[derive(Clone, Debug)]
pub struct ReqwestUsageService {
	config: Arc<PluginConfig>,
	http_client: ReqwestHttpClient,
	signer: Option<AppSigner>,
}
impl ReqwestUsageService {
	/// Creates a client with a default (non-redirecting) transport.
	pub fn new(config: Arc<PluginConfig>) -> Result<Self> {
		Self::with_http_client(config, ReqwestHttpClient::new()?)
	}

	/// Creates a client reusing the caller-provided transport.
	///
	/// Requests are signed when the configuration carries an application private key.
	pub fn with_http_client(config: Arc<PluginConfig>, http_client: ReqwestHttpClient) -> Result<Self> {
		let signer = config
			.application_private_key
			.as_deref()
			.map(|pem| AppSigner::from_pem(config.application_appid.clone(), pem))
			.transpose()?;

		Ok(Self { config, http_client, signer })
	}

	fn endpoint(&self, operation: &'static str, path: &str) -> Result<Url, RemoteCallError> {
		Url::parse(&self.config.rest_url(path))
			.map_err(|source| RemoteCallError::Endpoint { operation, source })
	}

	fn signed(&self, mut request: RequestBuilder) -> RequestBuilder {
		if let Some(signer) = &self.signer {
			for (name, value) in signer.sign_now().headers() {
				request = request.header(name, value);
			}
		}

		request
	}

	async fn send<T>(&self, operation: &'static str, request: RequestBuilder) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let response = self.signed(request).send().await.map_err(RemoteCallError::from)?;
		let status = response.status();
		let body = response.text().await.map_err(RemoteCallError::from)?;

		if !status.is_success() {
			return Err(RemoteCallError::Rejected {
				operation,
				status: status.as_u16(),
				body_preview: http::body_preview(&body),
			}
			.into());
		}

		let mut de = serde_json::Deserializer::from_str(&body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| RemoteCallError::Decode { operation, source }.into())
	}
}
impl UsageService for ReqwestUsageService {
	fn create_usage<'a>(&'a self, request: &'a UsageRequest) -> UsageFuture<'a, Usage> {
		const OPERATION: &str = "create_usage";

		Box::pin(async move {
			let url = self.endpoint(OPERATION, CREATE_USAGE_PATH)?;
			let body = CreateUsageBody {
				app_id: &self.config.application_appid,
				course_id: request.container_id.to_string(),
				resource_id: request.resource_id.to_string(),
				node_id: &request.node_id,
				node_version: &request.node_version,
			};
			let mut builder = self.http_client.post(url).json(&body);

			if let Some(ticket) = &request.ticket {
				builder = builder.header(AUTHORIZATION, format!("EDU-TICKET {}", ticket.expose()));
			}

			tracing::debug!(
				resource_id = %request.resource_id,
				course_id = %request.container_id,
				node_id = %request.node_id,
				"Registering usage."
			);

			self.send(OPERATION, builder).await
		})
	}

	fn fetch_ticket<'a>(&'a self, user: &'a AuthKey) -> UsageFuture<'a, Ticket> {
		const OPERATION: &str = "fetch_ticket";

		Box::pin(async move {
			let path = format!("{APP_AUTH_PATH}/{}", urlencoding::encode(user.expose()));
			let url = self.endpoint(OPERATION, &path)?;
			let body: TicketBody = self.send(OPERATION, self.http_client.get(url)).await?;

			Ok(Ticket::new(body.ticket))
		})
	}
}
