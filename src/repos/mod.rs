pub mod audit_repo;
pub mod exception_repo;
pub mod idempotency_repo;
pub mod raw_event_repo;
