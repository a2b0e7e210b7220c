mod credentials;
mod endpoint;
mod finding;
mod session;

pub use credentials::{CredentialTier, Credentials, TierConfig};
pub use endpoint::{
    DiscoverySource, Endpoint, EndpointId, EndpointSet, HttpMethod, ParamLocation, ParamType,
    ParameterSpec, Protocol,
};
pub use finding::{Finding, FindingKind, Severity};
pub use session::{FindingLog, Inconclusive, ScanSession, SessionNote};
