pub mod listing;

pub use listing::{facts_line, mlst_date, name_only, unix_date, unix_line, FactMask};
