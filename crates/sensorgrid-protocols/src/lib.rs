//! Sensorgrid Protocols - Round Scheduling, Neighbor Exchange and Termination
//!
//! This crate provides the per-unit behaviour of a sensor field: one
//! [`GridNode`] per grid cell and a single [`Coordinator`]. Units share no
//! memory; they talk only through tokio channels.
//!
//! # Overview
//!
//! ## Round Scheduling
//!
//! [`RoundClock`] gives every unit the same best-effort cadence: start the
//! round, do the work, sleep out the rest of the interval. Overruns skip the
//! sleep without catching up.
//!
//! ## Neighbor Exchange
//!
//! Each round a grid node samples a [`Reading`] and swaps it with its up to
//! four neighbors over point-to-point links ([`exchange`]). A node cannot
//! report until every present neighbor has posted the same round.
//!
//! ## Termination
//!
//! The coordinator counts `max_iterations` rounds and then fans a one-shot
//! marker out to every grid node ([`termination`]). Grid nodes poll for it
//! without blocking before each round and stop once it has arrived.
//!
//! # Example
//!
//! ```rust,ignore
//! use sensorgrid_protocols::{exchange, termination, report_channel, Coordinator, CoordinatorConfig, GridNode, Sampler};
//!
//! let links = exchange::wire(&topology);
//! let (broadcaster, listeners) = termination::channels(&topology);
//! let (reports, mut output) = report_channel();
//!
//! for ((placement, links), listener) in topology.placements().iter().zip(links).zip(listeners) {
//!     let node = GridNode::new(*placement, links, listener, Sampler::from_entropy(), interval, reports.clone());
//!     tokio::spawn(node.run());
//! }
//!
//! let coordinator = Coordinator::new(topology.coordinator(), CoordinatorConfig::new(3), broadcaster, reports)?;
//! coordinator.run().await?;
//! ```

pub mod coordinator;
pub mod error;
pub mod exchange;
pub mod node;
pub mod reading;
pub mod report;
pub mod schedule;
pub mod termination;

pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorOutcome};
pub use error::{Error, Result};
pub use exchange::{ExchangeLinks, NeighborSnapshot, Posting, SENTINEL};
pub use node::{GridNode, NodeOutcome};
pub use reading::{Reading, Sampler, MAX_READING, MIN_READING};
pub use report::{report_channel, Report, ReportReceiver, ReportSender};
pub use schedule::{pause_after, RoundClock, RunState, DEFAULT_INTERVAL};
pub use termination::{
    BroadcastOutcome, TerminationBroadcaster, TerminationListener, TerminationSignal,
    TerminationStatus, TERMINATION_MARKER,
};
