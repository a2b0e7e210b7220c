pub mod adapter;
pub mod cli;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod http;
pub mod models;
pub mod probes;
pub mod reporter;
pub mod risk;
pub mod scanner;

pub use config::{ProtocolSelection, ScanContext};
pub use models::{
    Endpoint, EndpointId, EndpointSet, Finding, FindingKind, HttpMethod, Protocol, ScanSession,
    Severity,
};
pub use reporter::{ConsoleReporter, HtmlExporter, JsonExporter, Report};
pub use risk::{RiskBucket, ScanSummary};
pub use scanner::Scanner;
