use crate::shared::frame::Frame;

/// Presents annotated frames to the user.
///
/// Implementations may scale the frame for presentation; the caller's frame
/// is never modified.
pub trait DisplaySink: Send {
    fn publish(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;
}

/// Sink that discards every frame.
pub struct NullDisplaySink;

impl DisplaySink for NullDisplaySink {
    fn publish(&mut self, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
