//! Gateway: HTTP surface and conversation flow against the upstream model.
//!
//! Lifecycle:
//! 1. Load + validate config
//! 2. Resolve provider API keys, build the session store
//! 3. Start the idle-session sweeper
//! 4. Serve the JSON endpoints and the uploads directory
//!
//! Session bookkeeping lives in `parley-sessions`, upstream transport in
//! `parley-providers`; handlers here only translate JSON bodies into calls
//! against those two.

pub mod chat;
pub mod error;
pub mod server;
pub mod state;
