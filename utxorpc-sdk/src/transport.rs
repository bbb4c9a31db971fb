use crate::config::ClientOptions;
use crate::error::{Error, Result};
use tonic::metadata::{AsciiMetadataKey, AsciiMetadataValue};
use tonic::service::interceptor::InterceptedService;
use tonic::service::Interceptor;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic::{Request, Status};

/// The channel type every generated client is bound to.
pub type GrpcChannel = InterceptedService<Channel, HeaderInterceptor>;

/// Attaches a fixed set of headers to every outgoing request.
#[derive(Debug, Clone, Default)]
pub struct HeaderInterceptor {
    headers: Vec<(AsciiMetadataKey, AsciiMetadataValue)>,
}

impl HeaderInterceptor {
    /// Validates the configured headers as gRPC ASCII metadata.
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let mut headers = Vec::with_capacity(options.headers.len());
        for (key, value) in &options.headers {
            let key = AsciiMetadataKey::from_bytes(key.to_ascii_lowercase().as_bytes())
                .map_err(|e| Error::InvalidHeader(format!("key '{}': {}", key, e)))?;
            let value = AsciiMetadataValue::try_from(value.as_str())
                .map_err(|e| Error::InvalidHeader(format!("value for '{}': {}", key.as_str(), e)))?;
            headers.push((key, value));
        }
        Ok(Self { headers })
    }
}

impl Interceptor for HeaderInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let metadata = request.metadata_mut();
        for (key, value) in &self.headers {
            metadata.insert(key.clone(), value.clone());
        }
        Ok(request)
    }
}

/// Builds a lazily connected channel for `options`.
///
/// No I/O happens here; the connection is established on the first call. Must be called
/// from within a tokio runtime.
pub fn connect(options: &ClientOptions) -> Result<(Channel, HeaderInterceptor)> {
    let interceptor = HeaderInterceptor::new(options)?;
    let mut endpoint = Endpoint::from_shared(options.uri.clone())?;
    if options.uri.starts_with("https") {
        endpoint = endpoint.tls_config(ClientTlsConfig::new())?;
    }
    tracing::debug!(uri = %options.uri, headers = options.headers.len(), "Created lazy gRPC channel.");
    Ok((endpoint.connect_lazy(), interceptor))
}
