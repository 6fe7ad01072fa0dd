//! Shared type definitions for the QTrack fleet telemetry engine.
//!
//! This crate is the single source of truth for every value that crosses a
//! boundary: provider payloads coming in, read-model projections going out
//! to the presentation layer. Types flow downstream to `TypeScript` via
//! `ts-rs` for the dashboard.
//!
//! # Modules
//!
//! - [`entity`] -- [`EntitySnapshot`], the per-backend telemetry record,
//!   plus the [`EntityType`] and [`SortKey`] selectors used by filters
//! - [`history`] -- [`HistorySample`] queue-length observations
//! - [`envelope`] -- the uniform `{ ok, data?, error? }` [`Envelope`]
//! - [`events`] -- [`PushEvent`], the tagged push-stream payload
//! - [`fleet`] -- [`FleetView`], [`SyncState`], [`AggregateSummary`]
//! - [`wait`] -- [`WaitEstimate`] and its display form [`WaitReport`]
//! - [`records`] -- opaque [`DetailRecord`] and [`AnalyticsRecord`]
//! - [`lenient`] -- tolerant field decoders for partial payloads

pub mod entity;
pub mod envelope;
pub mod events;
pub mod fleet;
pub mod history;
pub mod lenient;
pub mod records;
pub mod wait;

// Re-export all public types at crate root for convenience.
pub use entity::{EntitySnapshot, EntityType, SortKey};
pub use envelope::{Envelope, EnvelopeFailure};
pub use events::PushEvent;
pub use fleet::{AggregateSummary, FleetView, SyncState};
pub use history::HistorySample;
pub use records::{AnalyticsRecord, DetailRecord};
pub use wait::{WaitEstimate, WaitReport};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::entity::EntitySnapshot::export_all();
        let _ = crate::entity::EntityType::export_all();
        let _ = crate::entity::SortKey::export_all();
        let _ = crate::history::HistorySample::export_all();
        let _ = crate::events::PushEvent::export_all();
        let _ = crate::fleet::FleetView::export_all();
        let _ = crate::fleet::SyncState::export_all();
        let _ = crate::fleet::AggregateSummary::export_all();
        let _ = crate::wait::WaitEstimate::export_all();
        let _ = crate::wait::WaitReport::export_all();
        let _ = crate::records::DetailRecord::export_all();
        let _ = crate::records::AnalyticsRecord::export_all();
        let _ = crate::envelope::Envelope::<crate::fleet::AggregateSummary>::export_all();
    }
}
