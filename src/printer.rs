//! Response handler wrapper that notes which handler produced a reply.

use async_trait::async_trait;
use hickory_server::authority::MessageResponse;
use hickory_server::proto::rr::Record;
use hickory_server::server::{ResponseHandler, ResponseInfo};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::warn;

use crate::handler::HANDLER_NAME;

/// Output sink shared between printers.
pub type SharedSink = Arc<Mutex<dyn Write + Send>>;

/// Sink writing to the process stdout.
pub fn stdout_sink() -> SharedSink {
    Arc::new(Mutex::new(io::stdout()))
}

/// Wraps a [`ResponseHandler`], writing the handler name to `sink` for every
/// response before passing it on unchanged.
#[derive(Clone)]
pub struct ResponsePrinter<R> {
    inner: R,
    sink: SharedSink,
}

impl<R: ResponseHandler> ResponsePrinter<R> {
    /// Wrap `inner`, printing to `sink`.
    pub fn new(inner: R, sink: SharedSink) -> Self {
        Self { inner, sink }
    }
}

#[async_trait]
impl<R: ResponseHandler> ResponseHandler for ResponsePrinter<R> {
    async fn send_response<'a>(
        &mut self,
        response: MessageResponse<
            '_,
            'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
            impl Iterator<Item = &'a Record> + Send + 'a,
        >,
    ) -> io::Result<ResponseInfo> {
        let written = writeln!(&mut *self.sink.lock(), "{}", HANDLER_NAME);
        if let Err(e) = written {
            warn!("Failed to write to response sink: {}", e);
        }
        self.inner.send_response(response).await
    }
}
