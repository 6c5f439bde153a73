mod promote;
mod promote_pipeline;
mod promotion_error;

pub use promote::{promote, wants_verbose};
