pub mod employee_cache;
#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use employee_cache::CachedEmployeeLookup;
pub use mysql::MySqlStore;
