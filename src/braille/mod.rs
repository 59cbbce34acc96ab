mod canvas;
mod surface;

pub use canvas::BrailleCanvas;
pub use surface::{BrailleSurface, TextItem};
