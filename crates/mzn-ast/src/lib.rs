#![forbid(unsafe_code)]
#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]

pub mod span {
    use serde::Serialize;

    /// Byte range plus the line/column of its first character (both 1-based).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
    pub struct Span {
        pub start: u32,
        pub end: u32,
        pub line: u32,
        pub col: u32,
    }

    impl Span {
        pub fn new(start: u32, end: u32, line: u32, col: u32) -> Self {
            Self {
                start,
                end,
                line,
                col,
            }
        }

        /// Span covering `self` through the end of `other`.
        pub fn to(self, other: Span) -> Span {
            Span {
                start: self.start,
                end: other.end.max(self.end),
                line: self.line,
                col: self.col,
            }
        }

        pub fn len(&self) -> u32 {
            self.end - self.start
        }

        pub fn is_empty(&self) -> bool {
            self.start == self.end
        }
    }
}

pub mod ast;
pub mod build;
mod eq;
pub mod write;

pub use write::{Render, WriteMode, Writer};
