//! Client Portal Gateway Adapter
//!
//! Talks to the locally running Client Portal gateway over its REST API
//! (`https://{host}:{port}/v1/api`). The gateway normally serves a
//! self-signed certificate, so certificate checks can be relaxed.
//!
//! # Endpoints
//!
//! | Operation | Request |
//! |-----------|---------|
//! | connect   | `POST /iserver/auth/status` |
//! | qualify   | `GET /iserver/secdef/search?symbol=..&secType=STK` |
//! | history   | `GET /iserver/marketdata/history?conid=..&period=1d&bar=5min&outsideRth=false` |

mod api_types;
mod session;

pub use session::{ClientPortalConnector, ClientPortalSession};
