//! Repository functions over the durable store. Each module owns the SQL
//! for one entity; callers pass an open `rusqlite::Connection`.

pub mod alert;
pub mod identity;
pub mod nominee;
pub mod status;
