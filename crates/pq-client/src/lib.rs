//! PQ Client - transport and dispatch for the remote agent.
//!
//! - [`transport`]: the `AgentTransport` seam and its reqwest implementation
//! - [`dispatcher`]: runs one invocation per submission on a background task
//! - [`mock_transport`]: scripted transport for tests and offline demos
//! - [`secret`]: the shared-secret credential, zeroized on drop

pub mod dispatcher;
pub mod mock_transport;
pub mod secret;
pub mod transport;

pub use dispatcher::{Dispatcher, PendingInvocation};
pub use mock_transport::{MockReply, MockTransport};
pub use secret::SharedSecret;
pub use transport::{
    AgentTransport, HttpTransport, HttpTransportConfig, RawResponse, TransportError,
};
