pub mod config_io;
pub mod editor;
pub mod store_io;
