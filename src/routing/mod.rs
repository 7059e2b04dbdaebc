//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, raw query, host, proto)
//!     → MatchContext
//!     → router.rs (origin from host)
//!     → dispatcher.rs (first matching rule in rules.rs)
//!     → handler (ready, or awaits the record classifier)
//!     → router.rs (fallback on miss, append originalUrl)
//!     → Resolution { destination, rule, class, origin }
//!
//! Rule Compilation (at startup):
//!     record id pattern from config
//!     → rules.rs (compile every regex)
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - Deterministic: same input always routes to the same place (given the
//!   same classifier answer)
//! - First match wins, in table order
//! - Routing never fails; a miss is a fallback destination

pub mod dispatcher;
pub mod matcher;
pub mod query;
pub mod router;
pub mod rules;
pub mod search;
pub mod targets;

pub use matcher::{MatchContext, RouteMatch};
pub use query::QueryParams;
pub use router::{Resolution, Router};
pub use rules::RouteClass;
pub use targets::{Origin, Targets};
