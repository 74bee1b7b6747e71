pub mod data;
pub mod defaults;
pub mod env;
pub mod io;
pub mod keys;
pub mod printing;
