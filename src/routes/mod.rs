pub mod leads;
pub mod notifications;
pub mod sentinel;
