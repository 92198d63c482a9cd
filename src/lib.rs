pub mod access;
pub mod api;
pub mod db;
pub mod paths;
