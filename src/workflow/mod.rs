pub mod ie_ctx;
pub mod ie_flow;

pub use ie_ctx::IeCtx;
pub use ie_flow::{Desfecho, IeFlow};
