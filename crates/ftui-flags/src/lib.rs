#![forbid(unsafe_code)]

//! Flags: a fixed set of named booleans for UI component state.
//!
//! # Role in FrankenTUI
//! Widgets and screens often carry a handful of booleans (`open`,
//! `loading`, `dirty`, ...) that are toggled one at a time but reset
//! together. `ftui-flags` keeps them in one [`FlagStore`] with two update
//! paths and a subscription hook for re-rendering.
//!
//! # Primary responsibilities
//! - **FlagSet**: the key-ordered mapping of flag to value. Keys are fixed
//!   at construction.
//! - **FlagStore**: bulk updates that either reset to the initial flags or
//!   merge into the current ones, plus per-flag setters that never reset.
//! - **Subscription**: RAII listener registration; listeners receive the
//!   new flags after each change.
//!
//! # Example
//!
//! ```
//! use ftui_flags::{FlagStore, FlagSet, FlagUpdates};
//!
//! let store = FlagStore::new([("a", true), ("b", false)]);
//!
//! store.set_flags([("b", true)]).unwrap();
//! assert_eq!(store.snapshot(), FlagSet::from([("a", true), ("b", true)]));
//!
//! store.set_flag("a").unwrap().set(false);
//! assert_eq!(store.snapshot(), FlagSet::from([("a", false), ("b", true)]));
//!
//! store.set_flags(FlagUpdates::new()).unwrap();
//! assert_eq!(store.snapshot(), FlagSet::from([("a", true), ("b", false)]));
//! ```
//!
//! # Feature flags
//! - `tracing`: structured `debug!`/`trace!` events for store mutations.
//! - `serde`: `Serialize`/`Deserialize` for [`FlagSet`] and
//!   [`FlagUpdates`] as plain maps.

pub mod config;
pub mod error;
pub mod flag_set;
pub mod store;
pub mod subscription;

pub use config::FlagStoreConfig;
pub use error::{FlagError, FlagResult};
pub use flag_set::{FlagSet, FlagUpdates};
pub use store::{FlagAction, FlagSetter, FlagStore};
pub use subscription::Subscription;
