//! Command handlers, one file per program.

mod cd;
mod cd_plus;

pub use cd::run_cd;
pub use cd_plus::run_cd_plus;
