//! The rate monitor core.
//!
//! ## Data Flow
//!
//! ```text
//! LiveSource (bytes)
//!        │
//!        ▼
//! ChunkReader::next_chunk()      complete lines, partial tail kept
//!        │
//!        ▼
//! TimestampFormat::parse()       per line; ParseError => line skipped
//!        │
//!        ▼
//! GroupingEngine::feed()         SpeedMeasurement on timestamp change
//!        │
//!        ├──▶ SpeedWindow::append()
//!        │
//!        └──▶ on_update(session, measurement)
//! ```
//!
//! ## Submodules
//!
//! - [`chunk`]: bounded reads and line reassembly
//! - [`timestamp`]: fixed-window timestamp extraction
//! - [`grouping`]: the grouping state machine
//! - [`window`]: bounded trailing history and averages
//! - [`driver`]: session lifecycle and the observer hook
//! - [`handoff`]: bounded queue for slow consumers

pub mod chunk;
pub mod driver;
pub mod grouping;
pub mod handoff;
pub mod timestamp;
pub mod window;

pub use chunk::{Chunk, ChunkReader};
pub use driver::{Monitor, MonitorHandle, RunSummary, Session};
pub use grouping::{GroupState, GroupingEngine, SpeedMeasurement};
pub use handoff::{HandoffObserver, HandoffReceiver, SpeedUpdate};
pub use timestamp::{parse_timestamp, Timestamp, TimestampFormat};
pub use window::SpeedWindow;
