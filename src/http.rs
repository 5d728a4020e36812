//! Transport primitives for token endpoint exchanges.
//!
//! [`TokenHttpClient`] is the token provider's only dependency on an HTTP stack. Each exchange
//! receives a fresh [`ResponseMetadataSlot`]; implementations call
//! [`ResponseMetadataSlot::take`] before dispatching and [`ResponseMetadataSlot::store`] once a
//! status is known, so failures that never parse as OAuth errors still surface the upstream
//! status.

// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
// self
use crate::_prelude::*;

/// Abstraction over HTTP transports capable of executing the client-credentials exchange.
///
/// Implementations must be `Send + Sync + 'static`, and the handles they return must own
/// whatever state they need so request futures stay `Send` for the whole exchange.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Metadata captured from the most recent token endpoint response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the token endpoint, if available.
	pub status: Option<u16>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Thin wrapper around [`ReqwestClient`] used for token endpoint exchanges.
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Builds a client that never follows redirects, as token endpoints answer directly.
	pub fn without_redirects() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}

	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle(Arc::new(InstrumentedHttpClient { client: self.0.clone(), slot }))
	}
}
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		self.instrumented(slot)
	}
}

struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}

/// Handle returned by [`ReqwestHttpClient`] that records response status into its slot.
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()) });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn metadata_slot_take_consumes_value() {
		let slot = ResponseMetadataSlot::default();

		slot.store(ResponseMetadata { status: Some(401) });

		assert_eq!(slot.take().and_then(|meta| meta.status), Some(401));
		assert!(slot.take().is_none());
	}

	#[test]
	fn redirect_free_client_builds() {
		let client = ReqwestHttpClient::without_redirects();

		assert!(client.is_ok());
	}
}
