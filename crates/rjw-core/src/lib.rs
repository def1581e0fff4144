pub mod brain;
pub mod checklist;
pub mod config;
pub mod context;
pub mod error;
pub mod evidence;
pub mod governance;
pub mod guard;
pub mod ids;
pub mod io;
pub mod paths;
pub mod research;
pub mod session;
pub mod store;
pub mod traceability;
pub mod types;
pub mod workflow;

pub use error::{Result, RjwError};
