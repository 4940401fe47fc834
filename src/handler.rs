//! Hickory request handler answering node queries and delegating the rest.

use async_trait::async_trait;
use hickory_proto::op::{Header, ResponseCode};
use hickory_proto::rr::rdata::{A, AAAA};
use hickory_proto::rr::{DNSClass, Name, RData, Record};
use hickory_server::authority::MessageResponseBuilder;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};
use std::iter;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{error, trace};

use crate::error::DnsError;
use crate::metrics;
use crate::printer::{ResponsePrinter, SharedSink};
use crate::resolver::{AnswerRecord, Query, QueryResolver, Resolution};

/// Name this handler is registered under in a chain.
pub const HANDLER_NAME: &str = "k8s_node";

/// One link of a handler chain, answering from the node table.
///
/// Queries the resolver declines go to `next`. Without a next link they are
/// answered with SERVFAIL. Every reply this link sends itself is announced on
/// `sink` through a [`ResponsePrinter`]; replies from `next` are not.
pub struct NodeDnsHandler<N> {
    resolver: QueryResolver,
    next: Option<N>,
    sink: SharedSink,
}

impl<N: RequestHandler> NodeDnsHandler<N> {
    /// Chain `next` behind this handler.
    pub fn new(resolver: QueryResolver, next: N, sink: SharedSink) -> Self {
        Self {
            resolver,
            next: Some(next),
            sink,
        }
    }

    /// Last link of the chain: nothing to delegate to.
    pub fn terminal(resolver: QueryResolver, sink: SharedSink) -> Self {
        Self {
            resolver,
            next: None,
            sink,
        }
    }

    /// Registered handler name.
    pub fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    fn printer<R: ResponseHandler>(&self, response_handle: R) -> ResponsePrinter<R> {
        ResponsePrinter::new(response_handle, Arc::clone(&self.sink))
    }

    async fn delegate<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> ResponseInfo {
        if let Some(next) = &self.next {
            return next.handle_request(request, response_handle).await;
        }

        error!("{}", DnsError::NoNextHandler(self.name()));
        metrics::record_unhandled();

        let mut response_handle = self.printer(response_handle);

        let builder = MessageResponseBuilder::from_message_request(request);
        let response = builder.build_no_records(servfail_header(request));
        match response_handle.send_response(response).await {
            Ok(info) => info,
            Err(e) => {
                error!("Failed to send SERVFAIL response: {}", e);
                servfail_header(request).into()
            }
        }
    }

    async fn answer<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
        owner: Name,
        answer: &AnswerRecord,
    ) -> ResponseInfo {
        let mut response_handle = self.printer(response_handle);

        let mut header = Header::response_from_request(request.header());
        header.set_authoritative(true);
        header.set_recursion_available(true);

        let records = [to_record(owner, answer)];
        let builder = MessageResponseBuilder::from_message_request(request);
        let response = builder.build(
            header,
            records.iter(),
            iter::empty(),
            iter::empty(),
            iter::empty(),
        );

        match response_handle.send_response(response).await {
            Ok(info) => info,
            Err(e) => {
                error!("Failed to send DNS response: {}", e);
                servfail_header(request).into()
            }
        }
    }
}

fn servfail_header(request: &Request) -> Header {
    let mut header = Header::response_from_request(request.header());
    header.set_response_code(ResponseCode::ServFail);
    header
}

/// Build the wire record for an answer.
pub fn to_record(owner: Name, answer: &AnswerRecord) -> Record {
    let rdata = match answer.address {
        IpAddr::V4(v4) => RData::A(A(v4)),
        IpAddr::V6(v6) => RData::AAAA(AAAA(v6)),
    };
    let mut record = Record::from_rdata(owner, answer.ttl, rdata);
    record.set_dns_class(DNSClass::IN);
    record
}

/// Next-link type of a chain that ends here; it has no values.
#[derive(Debug, Clone, Copy)]
pub enum EndOfChain {}

#[async_trait]
impl RequestHandler for EndOfChain {
    async fn handle_request<R: ResponseHandler>(
        &self,
        _request: &Request,
        _response_handle: R,
    ) -> ResponseInfo {
        match *self {}
    }
}

#[async_trait]
impl<N: RequestHandler> RequestHandler for NodeDnsHandler<N> {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        response_handle: R,
    ) -> ResponseInfo {
        let request_info = match request.request_info() {
            Ok(info) => info,
            Err(e) => {
                trace!("request carries no usable query: {}", e);
                return self.delegate(request, response_handle).await;
            }
        };

        let lower = request_info.query.name();
        let query = Query::new(
            request_info.query.original().name().to_string(),
            request_info.query.query_type().into(),
        );

        match self.resolver.resolve(&query) {
            Resolution::Answer(answer) => {
                let owner = Name::from(lower.clone());
                self.answer(request, response_handle, owner, &answer).await
            }
            Resolution::Delegate(_) => self.delegate(request, response_handle).await,
        }
    }
}
