pub mod cli;
pub mod codes;
pub mod download;
pub mod error;
pub mod format;
pub mod scenario;
pub mod seed;
pub mod server;
pub mod simulate;
pub mod storage;
pub mod store;
pub mod validation;
