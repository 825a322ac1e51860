pub mod repository;
pub mod memory;
pub mod master;

pub use master::{transform_master, MasterReport};
pub use memory::InstrumentStore;
pub use repository::{InstrumentFilter, InstrumentRepository, StrikeFilter};
