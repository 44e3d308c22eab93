pub mod canonicalizer;
pub mod exception_query_service;
pub mod ingest_service;
pub mod patch_engine;
pub mod resolve_service;
