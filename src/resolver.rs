//! Query resolution against the address table.
//!
//! ```text
//! query ──▶ in zone? ──no──▶ Delegate(OutOfZone)
//!              │yes
//!              ▼
//!          A / AAAA? ──no──▶ Delegate(UnsupportedType)
//!              │yes
//!              ▼
//!          in table? ──no──▶ Delegate(NotFound)
//!              │yes
//!              ▼
//!     Answer(A or AAAA, by stored family)
//! ```

use hickory_proto::rr::RecordType;
use ::metrics::SharedString;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use crate::metrics::{self, QueryResult, Timer};
use crate::table::AddressTable;
use crate::zone::Zone;

/// TTL of every synthesized record, in seconds.
pub const RECORD_TTL: u32 = 60;

/// Requested record type, as far as the resolver cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    /// A
    Address,
    /// AAAA
    AddressV6,
    /// Anything else, by numeric type code.
    Other(u16),
}

impl From<RecordType> for QueryKind {
    fn from(rtype: RecordType) -> Self {
        match rtype {
            RecordType::A => Self::Address,
            RecordType::AAAA => Self::AddressV6,
            other => Self::Other(u16::from(other)),
        }
    }
}

impl QueryKind {
    /// Metric label for this kind. Only `Other` allocates.
    pub fn metric_label(&self) -> SharedString {
        match self {
            Self::Address => SharedString::const_str("A"),
            Self::AddressV6 => SharedString::const_str("AAAA"),
            Self::Other(_) => SharedString::from_owned(self.to_string()),
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => f.write_str("A"),
            Self::AddressV6 => f.write_str("AAAA"),
            Self::Other(code) => write!(f, "{}", RecordType::from(*code)),
        }
    }
}

/// A single incoming question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Fully-qualified name as asked, trailing dot included.
    pub name: String,
    /// Requested type.
    pub kind: QueryKind,
}

impl Query {
    /// Build a query.
    pub fn new(name: impl Into<String>, kind: QueryKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A synthesized answer record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerRecord {
    /// Owner name (lower-case FQDN).
    pub name: String,
    /// TTL in seconds.
    pub ttl: u32,
    /// Published address.
    pub address: IpAddr,
}

impl AnswerRecord {
    /// A for IPv4 addresses, AAAA for IPv6.
    pub fn record_type(&self) -> RecordType {
        match self.address {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::AAAA,
        }
    }
}

/// Why the resolver passed a query on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclineReason {
    /// Name is not under the zone.
    OutOfZone,
    /// Record type other than A or AAAA.
    UnsupportedType,
    /// Name is in the zone but not in the table.
    NotFound,
}

/// Outcome of resolving one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Reply authoritatively with this record.
    Answer(AnswerRecord),
    /// Hand the query to the next handler.
    Delegate(DeclineReason),
}

/// Receives resolution events; injected so the hot path does not hardwire
/// its diagnostics.
pub trait QueryObserver: Send + Sync {
    /// A query was answered.
    fn answered(&self, query: &Query, answer: &AnswerRecord, elapsed: Duration);

    /// A query was declined and will be delegated.
    fn declined(&self, query: &Query, reason: DeclineReason, elapsed: Duration);
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl QueryObserver for NoopObserver {
    fn answered(&self, _query: &Query, _answer: &AnswerRecord, _elapsed: Duration) {}

    fn declined(&self, _query: &Query, _reason: DeclineReason, _elapsed: Duration) {}
}

/// Observer that logs through `tracing` and records query metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl QueryObserver for TracingObserver {
    fn answered(&self, query: &Query, answer: &AnswerRecord, elapsed: Duration) {
        debug!(
            name = %query.name,
            qtype = %query.kind,
            rtype = %answer.record_type(),
            address = %answer.address,
            "answering from node table"
        );
        metrics::record_query(query.kind.metric_label(), QueryResult::Answered, elapsed);
    }

    fn declined(&self, query: &Query, reason: DeclineReason, elapsed: Duration) {
        let result = match reason {
            DeclineReason::OutOfZone => {
                trace!(name = %query.name, "query not in our zone, delegating");
                QueryResult::OutOfZone
            }
            DeclineReason::UnsupportedType => {
                debug!(name = %query.name, qtype = %query.kind, "unsupported query type, delegating");
                QueryResult::UnsupportedType
            }
            DeclineReason::NotFound => {
                debug!(name = %query.name, "no records found, delegating");
                QueryResult::NotFound
            }
        };
        metrics::record_query(query.kind.metric_label(), result, elapsed);
    }
}

/// Resolves queries for one zone from a shared address table.
#[derive(Clone)]
pub struct QueryResolver {
    zone: Arc<Zone>,
    table: AddressTable,
    observer: Arc<dyn QueryObserver>,
}

impl fmt::Debug for QueryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryResolver")
            .field("zone", &self.zone)
            .field("generation", &self.table.generation())
            .finish()
    }
}

impl QueryResolver {
    /// Create a resolver logging through [`TracingObserver`].
    pub fn new(zone: Zone, table: AddressTable) -> Self {
        Self::with_observer(zone, table, Arc::new(TracingObserver))
    }

    /// Create a resolver reporting to `observer`.
    pub fn with_observer(zone: Zone, table: AddressTable, observer: Arc<dyn QueryObserver>) -> Self {
        Self {
            zone: Arc::new(zone),
            table,
            observer,
        }
    }

    /// The zone this resolver answers for.
    pub fn zone(&self) -> &Zone {
        &self.zone
    }

    /// Decide whether to answer `query`, and with what.
    pub fn resolve(&self, query: &Query) -> Resolution {
        let timer = Timer::start();
        let resolution = self.decide(query);
        match &resolution {
            Resolution::Answer(answer) => self.observer.answered(query, answer, timer.elapsed()),
            Resolution::Delegate(reason) => {
                self.observer.declined(query, *reason, timer.elapsed())
            }
        }
        resolution
    }

    fn decide(&self, query: &Query) -> Resolution {
        // Zone and table are stored lower-case; compare against the same form.
        let name = query.name.to_ascii_lowercase();

        if !self.zone.contains(&name) {
            return Resolution::Delegate(DeclineReason::OutOfZone);
        }

        if !matches!(query.kind, QueryKind::Address | QueryKind::AddressV6) {
            return Resolution::Delegate(DeclineReason::UnsupportedType);
        }

        match self.table.lookup(&name) {
            // TODO: reply NODATA when the stored family does not match the
            // requested type instead of answering with the other family.
            Some(record) => Resolution::Answer(AnswerRecord {
                name,
                ttl: RECORD_TTL,
                address: record.address(),
            }),
            None => Resolution::Delegate(DeclineReason::NotFound),
        }
    }
}
