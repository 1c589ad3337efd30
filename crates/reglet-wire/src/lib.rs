//! Wire-format types and pointer-length ABI packing for the host<->guest
//! sandbox boundary.

pub mod context;
pub mod error_detail;
pub mod evidence_envelope;
pub mod packed;
pub mod requests;

pub use context::ContextWire;
pub use error_detail::ErrorDetail;
pub use evidence_envelope::EvidenceEnvelope;
pub use packed::{pack, unpack};
pub use requests::{
    DnsRequestWire, DnsResponseWire, ExecRequestWire, ExecResponseWire, HttpRequestWire,
    HttpResponseWire, SmtpRequestWire, SmtpResponseWire, TcpRequestWire, TcpResponseWire,
};
