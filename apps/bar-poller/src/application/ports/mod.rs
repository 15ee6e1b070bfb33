//! Application Ports (Driven)
//!
//! Ports define the interfaces the application uses to reach the outside
//! world. Infrastructure adapters implement them; tests substitute mocks.

mod clock;
mod gateway_port;
mod token_refresher_port;
mod token_store_port;

pub use clock::{Clock, SystemClock};
pub use gateway_port::{GatewayConnectorPort, GatewayError, GatewaySessionPort};
pub use token_refresher_port::{RefreshError, TokenRefresherPort};
pub use token_store_port::{TokenStoreError, TokenStorePort};
