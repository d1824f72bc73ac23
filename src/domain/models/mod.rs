mod search_result;
mod sink_info;
mod vector_record;

pub use search_result::*;
pub use sink_info::*;
pub use vector_record::*;
