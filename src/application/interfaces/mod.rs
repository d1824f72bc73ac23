mod sink_connector;

pub use sink_connector::*;
