//! The batch workflows wired from the lower-level modules.

pub mod elt;
pub mod etl;
pub mod report;

pub use elt::{EltOptions, run_elt};
pub use etl::{
    ECONOMY_FILE, EtlOptions, EtlSummary, UploadTarget, extract, run_etl, transform, write_raw,
};
pub use report::run_report;
