mod client;

pub use client::{HttpClient, ProbeResult};
