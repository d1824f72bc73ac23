mod epsilla_client;
mod epsilla_config;
mod epsilla_sink;
mod in_memory_sink;
mod insert_count;

pub use epsilla_client::*;
pub use epsilla_config::*;
pub use epsilla_sink::*;
pub use in_memory_sink::*;
pub use insert_count::*;
