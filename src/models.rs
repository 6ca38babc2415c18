pub mod cpu;
pub mod plot;
pub mod run;
pub mod session;

pub use cpu::{CpuData, ProtectionDomainSample, TestCpuSample};
pub use plot::{CpuType, CustomPlot, PlotType};
pub use run::{Run, RunMetadata, TestPoint};
pub use session::{SaveSessionModel, Session};

/// Fields of a client document that the server does not interpret. They are
/// stored and returned untouched.
pub type ExtraFields = serde_json::Map<String, serde_json::Value>;
