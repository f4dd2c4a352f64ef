//! Domain layer: poll types, pure poll calculations, storage, and events.
//!
//! The calculation modules ([`results`], [`lifecycle`], [`options`],
//! [`analytics`], [`share`]) are synchronous pure functions with no shared
//! state. [`PollStore`] holds the live polls and [`EventBus`] broadcasts
//! every mutation.

pub mod analytics;
pub mod event_bus;
pub mod ids;
pub mod lifecycle;
pub mod options;
pub mod poll;
pub mod poll_event;
pub mod poll_store;
pub mod results;
pub mod share;

pub use analytics::{PollAnalytics, PollSummaryStats};
pub use event_bus::{EventBus, JournalEntry, JournalReceiver, PollChange};
pub use ids::{OptionId, PollId, UserId, VoteId};
pub use lifecycle::PollStatus;
pub use poll::{Poll, PollOption, Vote};
pub use poll_event::PollEvent;
pub use poll_store::{PollRecord, PollStore};
pub use results::{OptionResult, PollResults};
pub use share::{ShareKind, ShareLinks};
