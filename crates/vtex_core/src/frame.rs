//! Frame counting
//!
//! The driver loop advances the counter once per presented frame; texture
//! code only ever reads it.

/// Process-wide frame counter.
#[derive(Debug, Clone, Default)]
pub struct FrameCounter {
    frame: u64,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self { frame: 0 }
    }

    pub fn current(&self) -> u64 {
        self.frame
    }

    /// Move to the next frame, returning its number.
    pub fn advance(&mut self) -> u64 {
        self.frame += 1;
        self.frame
    }
}

/// When a texture was last consumed by the GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastUse {
    /// Not used since its backing store was (re)acquired.
    #[default]
    NotUsed,
    Frame(u64),
}

impl LastUse {
    /// Frames elapsed since the recorded use, if any.
    pub fn frames_since(self, current: u64) -> Option<u64> {
        match self {
            LastUse::NotUsed => None,
            LastUse::Frame(frame) => Some(current.saturating_sub(frame)),
        }
    }
}
