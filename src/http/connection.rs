use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::content::{ContentError, Resolution, Resolver};
use crate::http::lines::{DEFAULT_MAX_LINE_LEN, LineReader};
use crate::http::negotiate::prefers_compressed;
use crate::http::parser::{
    DEFAULT_MAX_HEADERS, ParseError, RequestLine, read_headers, read_request_line,
};
use crate::http::request::Request;
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::http::writer::ResponseWriter;

/// Per-connection limits.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    /// Applies separately to reading the request line and the header block.
    pub read_timeout: Duration,
    /// Bound on writing the response, for peers that stop reading.
    pub write_timeout: Duration,
    pub max_line_len: usize,
    pub max_headers: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            max_line_len: DEFAULT_MAX_LINE_LEN,
            max_headers: DEFAULT_MAX_HEADERS,
        }
    }
}

impl ConnectionSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            read_timeout: cfg.read_timeout(),
            write_timeout: cfg.write_timeout(),
            max_line_len: cfg.max_line_len,
            max_headers: cfg.max_headers,
        }
    }
}

/// Serves exactly one request on `stream`, then closes it.
pub struct Connection<S> {
    lines: LineReader<S>,
    resolver: Arc<Resolver>,
    settings: ConnectionSettings,
    state: ConnectionState,
}

#[derive(Debug)]
pub enum ConnectionState {
    AwaitRequestLine,
    AwaitHeaders(RequestLine),
    Resolve(Request),
    Respond(ResponseWriter),
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, resolver: Arc<Resolver>, settings: ConnectionSettings) -> Self {
        Self {
            lines: LineReader::with_max_line_len(stream, settings.max_line_len),
            resolver,
            settings,
            state: ConnectionState::AwaitRequestLine,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Drives the state machine to `Closed`.
    ///
    /// Errors are transport failures only; anything the client got wrong is
    /// answered on the wire instead.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::AwaitRequestLine => {
                    let read = read_request_line(&mut self.lines);
                    match timeout(self.settings.read_timeout, read).await {
                        Err(_) => Self::timed_out("request line"),
                        Ok(Ok(Some(line))) => ConnectionState::AwaitHeaders(line),
                        Ok(Ok(None)) => {
                            debug!("Peer closed before sending a request");
                            ConnectionState::Closed
                        }
                        Ok(Err(e)) => Self::rejected(e)?,
                    }
                }

                ConnectionState::AwaitHeaders(line) => {
                    let read = read_headers(&mut self.lines, self.settings.max_headers);
                    match timeout(self.settings.read_timeout, read).await {
                        Err(_) => Self::timed_out("headers"),
                        Ok(Ok(headers)) => {
                            let request = line.with_headers(headers);
                            log_request(&request);
                            ConnectionState::Resolve(request)
                        }
                        Ok(Err(e)) => Self::rejected(e)?,
                    }
                }

                ConnectionState::Resolve(request) => {
                    let response = self.respond_to(&request).await?;
                    info!(
                        method = %request.method,
                        target = %request.target,
                        status = response.status.as_u16(),
                        gzip = response.gzip,
                        "Request served"
                    );
                    ConnectionState::Respond(ResponseWriter::new(&response))
                }

                ConnectionState::Respond(mut writer) => {
                    let stream = self.lines.get_mut();
                    let send = async {
                        writer.write_to_stream(stream).await?;
                        if let Err(e) = stream.shutdown().await {
                            debug!(error = %e, "Shutdown after response failed");
                        }
                        anyhow::Ok(())
                    };
                    match timeout(self.settings.write_timeout, send).await {
                        Ok(sent) => sent?,
                        Err(_) => warn!("Timed out writing response, dropping connection"),
                    }
                    ConnectionState::Closed
                }

                ConnectionState::Closed => {
                    break;
                }
            };
        }

        Ok(())
    }

    async fn respond_to(&self, request: &Request) -> anyhow::Result<Response> {
        let resolution =
            Resolver::resolve_blocking(Arc::clone(&self.resolver), request.target.clone()).await;

        let response = match resolution {
            Ok(Resolution::Found(resource)) => ResponseBuilder::new(StatusCode::Ok)
                .header("Content-type", resource.content_type)
                .body(resource.body)
                .gzip(prefers_compressed(&request.headers))
                .build()?,
            Ok(Resolution::NotFound) | Err(ContentError::NotFound(_)) => {
                Response::not_found(&request.target)
            }
            Err(ContentError::Traversal(key)) => {
                warn!(key = %key, "Rejected path outside content root");
                Response::forbidden(&request.target)
            }
            Err(e @ ContentError::Io { .. }) => {
                error!(error = %e, "Content store failure");
                Response::internal_error()
            }
        };

        Ok(response)
    }

    fn rejected(e: ParseError) -> anyhow::Result<ConnectionState> {
        if e.is_client_error() {
            warn!(error = %e, "Malformed request");
            let response = Response::bad_request(&e.to_string());
            return Ok(ConnectionState::Respond(ResponseWriter::new(&response)));
        }

        match e {
            ParseError::Incomplete => {
                debug!("Peer closed in the middle of the headers");
                Ok(ConnectionState::Closed)
            }
            other => Err(other.into()),
        }
    }

    fn timed_out(phase: &str) -> ConnectionState {
        warn!(phase, "Timed out waiting for request");
        ConnectionState::Respond(ResponseWriter::new(&Response::request_timeout()))
    }
}

fn log_request(request: &Request) {
    debug!(
        method = %request.method,
        target = %request.target,
        version = %request.version,
        "Request received"
    );
    for (name, value) in request.headers.iter() {
        debug!(header = %name, value = %value);
    }
}
