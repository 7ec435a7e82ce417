//! Client for the ShopSync admin API.
//!
//! ```no_run
//! # async fn run() -> shopsync_admin_sdk::Result<()> {
//! use shopsync_admin_sdk::AdminClient;
//!
//! let client = AdminClient::new("http://localhost:3000")?;
//! let session = client.login("admin@example.com", "secret").await?;
//! let stats = client.stats(&session).await?;
//! println!("{} paid of {} shops", stats.paid_shops, stats.total_shops);
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod types;

pub use client::AdminClient;
pub use error::{AdminError, AdminErrorCode, Result};
pub use types::*;
