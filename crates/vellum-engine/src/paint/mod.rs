//! Paint model used by recorded primitives and render passes.
//!
//! Colors are linear premultiplied RGBA; geometry lives in `coords`.

mod color;

pub use color::Color;
