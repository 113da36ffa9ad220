pub mod drive_service;
pub mod memory_storage;
pub mod profile_service;
pub mod storage;
