pub mod security_repo;
pub mod signals_repo;
