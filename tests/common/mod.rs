//! Shared test infrastructure for handler chain integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hickory_proto::op::{Header, Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, Name, RData, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinDecoder, BinEncoder};
use hickory_server::authority::{MessageRequest, MessageResponse, MessageResponseBuilder};
use hickory_server::proto::rr::Record;
use hickory_server::proto::xfer::Protocol;
use hickory_server::server::{Request, RequestHandler, ResponseHandler, ResponseInfo};

use k8s_node_dns::inventory::{InventoryItem, InventorySource};
use k8s_node_dns::printer::SharedSink;
use k8s_node_dns::resolver::{NoopObserver, QueryResolver};
use k8s_node_dns::table::{AddressRecord, AddressTable};
use k8s_node_dns::{DnsError, Zone};

// --- Constants ---

pub const ZONE: &str = "cluster.local";

// --- TestResponseHandler ---

/// Captures the serialized DNS response for inspection in tests.
///
/// The response is serialized via `MessageResponse::destructive_emit()` and
/// stored as raw wire-format bytes, which can then be parsed with
/// `Message::from_vec()`.
#[derive(Clone)]
pub struct TestResponseHandler {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl TestResponseHandler {
    pub fn new() -> Self {
        Self {
            buf: Arc::new(Mutex::new(Vec::with_capacity(512))),
        }
    }

    /// Parse the captured wire bytes into a `Message` for assertions.
    pub fn into_message(self) -> Message {
        let buf = self.buf.lock().unwrap();
        assert!(!buf.is_empty(), "no response was captured");
        Message::from_vec(&buf).expect("failed to parse captured DNS response")
    }
}

#[async_trait]
impl ResponseHandler for TestResponseHandler {
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
        let mut buf = self.buf.lock().unwrap();
        buf.clear();
        let mut encoder = BinEncoder::new(&mut *buf);
        encoder.set_max_size(u16::MAX);
        let info = response
            .destructive_emit(&mut encoder)
            .map_err(io::Error::other)?;
        Ok(info)
    }
}

// --- Next link ---

/// Stand-in for the next handler in a chain: counts calls and replies NXDOMAIN.
#[derive(Clone, Default)]
pub struct RecordingHandler {
    calls: Arc<AtomicUsize>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RequestHandler for RecordingHandler {
    async fn handle_request<R: ResponseHandler>(
        &self,
        request: &Request,
        mut response_handle: R,
    ) -> ResponseInfo {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut header = Header::response_from_request(request.header());
        header.set_response_code(ResponseCode::NXDomain);
        let response = MessageResponseBuilder::from_message_request(request).build_no_records(header);
        response_handle
            .send_response(response)
            .await
            .expect("failed to send NXDOMAIN from next handler")
    }
}

// --- Inventory ---

/// Inventory source returning a fixed answer.
pub struct StaticSource {
    items: Mutex<Result<Vec<InventoryItem>, String>>,
}

impl StaticSource {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self {
            items: Mutex::new(Ok(items)),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            items: Mutex::new(Err(message.to_string())),
        }
    }

    pub fn set(&self, items: Vec<InventoryItem>) {
        *self.items.lock().unwrap() = Ok(items);
    }

    pub fn fail(&self, message: &str) {
        *self.items.lock().unwrap() = Err(message.to_string());
    }
}

#[async_trait]
impl InventorySource for StaticSource {
    async fn list(&self) -> Result<Vec<InventoryItem>, DnsError> {
        self.items
            .lock()
            .unwrap()
            .clone()
            .map_err(DnsError::Config)
    }
}

// --- Table/resolver builders ---

/// Build a table from `(fqdn, address)` pairs.
pub fn build_table(pairs: &[(&str, &str)]) -> AddressTable {
    let table = AddressTable::new();
    let entries: HashMap<String, AddressRecord> = pairs
        .iter()
        .map(|(name, ip)| (name.to_string(), AddressRecord::new(ip.parse().unwrap())))
        .collect();
    table.replace(entries);
    table
}

/// Resolver for [`ZONE`] over `table`, without tracing output.
pub fn build_resolver(table: AddressTable) -> QueryResolver {
    QueryResolver::with_observer(Zone::new(ZONE).unwrap(), table, Arc::new(NoopObserver))
}

// --- Output sinks ---

/// Sink that drops everything written to it.
pub fn discard_sink() -> SharedSink {
    Arc::new(parking_lot::Mutex::new(io::sink()))
}

/// Sink backed by a buffer the test can read back.
pub fn capture_sink() -> (Arc<parking_lot::Mutex<Vec<u8>>>, SharedSink) {
    let buf = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let sink: SharedSink = buf.clone();
    (buf, sink)
}

/// Everything written to a [`capture_sink`] buffer so far.
pub fn captured(buf: &parking_lot::Mutex<Vec<u8>>) -> String {
    String::from_utf8(buf.lock().clone()).expect("sink output is not UTF-8")
}

// --- Query/Request construction ---

/// Build wire-format bytes for a DNS query.
pub fn build_query_bytes(name: &str, record_type: RecordType, id: u16) -> Vec<u8> {
    let mut msg = Message::new();
    msg.set_id(id);
    msg.set_message_type(MessageType::Query);
    msg.set_op_code(OpCode::Query);
    msg.set_recursion_desired(true);
    let mut query = Query::new();
    query.set_name(Name::from_ascii(name).unwrap());
    query.set_query_type(record_type);
    query.set_query_class(DNSClass::IN);
    msg.add_query(query);
    msg.to_vec().unwrap()
}

/// Parse wire bytes into a MessageRequest.
pub fn parse_message_request(bytes: &[u8]) -> MessageRequest {
    let mut decoder = BinDecoder::new(bytes);
    MessageRequest::read(&mut decoder).expect("failed to parse MessageRequest")
}

/// Build a full `Request` arriving over UDP.
pub fn build_request(name: &str, record_type: RecordType, id: u16) -> Request {
    let bytes = build_query_bytes(name, record_type, id);
    let msg = parse_message_request(&bytes);
    let src: SocketAddr = "10.0.0.1:12345".parse().unwrap();
    Request::new(msg, src, Protocol::Udp)
}

// --- Response helpers ---

/// Execute a query through `handler` and return the parsed response.
pub async fn execute_query<H: RequestHandler>(
    handler: &H,
    name: &str,
    record_type: RecordType,
    id: u16,
) -> Message {
    let request = build_request(name, record_type, id);
    let response = TestResponseHandler::new();
    handler.handle_request(&request, response.clone()).await;
    response.into_message()
}

/// Assert response code.
pub fn assert_response_code(msg: &Message, expected: ResponseCode) {
    assert_eq!(
        msg.response_code(),
        expected,
        "expected {:?}, got {:?}",
        expected,
        msg.response_code()
    );
}

/// The single answer of `msg`, failing otherwise.
pub fn single_answer(msg: &Message) -> &Record {
    assert_eq!(msg.answers().len(), 1, "expected exactly one answer: {:?}", msg.answers());
    &msg.answers()[0]
}

/// Address carried by an A or AAAA record.
pub fn record_address(record: &Record) -> std::net::IpAddr {
    match record.data() {
        RData::A(a) => std::net::IpAddr::V4(a.0),
        RData::AAAA(aaaa) => std::net::IpAddr::V6(aaaa.0),
        other => panic!("not an address record: {other:?}"),
    }
}
