//! Bounded stack of open constructed values

/// Where the body of an open constructed value ends while decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FrameEnd {
    /// Definite length: the body ends at this input offset
    At(usize),
    /// Indefinite length: the body ends at an end-of-contents marker
    EndOfContents,
}

/// One open SEQUENCE, SET or explicit tag
#[derive(Debug, Clone)]
pub(crate) struct Frame {
    /// Element name, used for error paths
    pub name: String,
    /// Encode: offset and width of the reserved length slot
    pub len_offset: usize,
    pub len_width: usize,
    /// Encode: offset of the first body octet
    pub base: usize,
    /// Decode: end of the body
    pub end: FrameEnd,
    /// Print: whether begin printed an opening brace
    pub printed: bool,
}

impl Frame {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            len_offset: 0,
            len_width: 0,
            base: 0,
            end: FrameEnd::EndOfContents,
            printed: false,
        }
    }
}

/// Stack with a fixed capacity
///
/// Pushing beyond the capacity fails instead of growing, so hostile input
/// nesting thousands of levels deep is rejected deterministically.
#[derive(Debug)]
pub(crate) struct FrameStack {
    frames: Vec<Frame>,
    capacity: usize,
}

impl FrameStack {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a frame; hands it back if the stack is full
    pub fn push(&mut self, frame: Frame) -> Result<(), Frame> {
        if self.frames.len() >= self.capacity {
            return Err(frame);
        }
        self.frames.push(frame);
        Ok(())
    }

    pub fn pop(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn top(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// End of the innermost frame with a definite length
    pub fn definite_end(&self) -> Option<usize> {
        self.frames.iter().rev().find_map(|frame| match frame.end {
            FrameEnd::At(end) => Some(end),
            FrameEnd::EndOfContents => None,
        })
    }

    /// Slash-separated names of the open frames, skipping unnamed ones
    pub fn path(&self) -> String {
        let mut path = String::new();
        for frame in self.frames.iter().filter(|f| !f.name.is_empty()) {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(&frame.name);
        }
        path
    }
}
