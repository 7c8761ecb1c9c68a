mod sse_frame;

pub use sse_frame::SseFrameBuffer;
