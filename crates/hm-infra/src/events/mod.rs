mod channel_sink;
mod tracing_sink;

pub use channel_sink::ChannelEventSink;
pub use tracing_sink::TracingEventSink;
