pub mod inspection;

pub use inspection::{InspectionRecord, NewInspection};
