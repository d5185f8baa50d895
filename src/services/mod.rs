//! Service layer for the stock monitor.
//!
//! This module contains the collaborators the reconciliation engine talks to:
//! - Catalog search (`SearchClient`, behind `SnapshotFetcher`)
//! - Announcements (`DiscordNotifier`, behind `Notifier`)

mod notifier;
mod search;

pub use notifier::{DiscordNotifier, Notifier, render_embed};
pub use search::{SearchClient, SnapshotFetcher};
