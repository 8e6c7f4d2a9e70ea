pub mod aggregator;
pub mod dispatcher;
pub mod poller;
pub mod transport;
pub mod types;

pub use aggregator::{normalize, UnitResults};
pub use dispatcher::{Command, CommandDispatcher};
pub use poller::{PollConfig, TaskPoller};
pub use transport::{FleetTransport, HttpTransport, HttpTransportConfig, TransportResponse};
pub use types::*;
