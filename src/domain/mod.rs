pub mod changes;
pub mod lead;
pub mod notification;
pub mod snapshot;
