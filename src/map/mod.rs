mod animation;
mod geometry;
mod gesture;
mod hit;
mod markers;
mod projection;
mod renderer;
mod transform;
mod viewport;

pub use animation::{ease_out_cubic, AnimationDriver, FrameClock, ManualClock, SystemClock, TickStatus};
pub use geometry::{draw_disc, draw_line, draw_polyline, draw_ring};
pub use gesture::{GestureController, GestureState, SelectionIntent};
pub use hit::pick_at;
pub use markers::{project_markers, MarkerGroup, MarkerId, PointOfInterest, ProjectedMarker};
pub use projection::{FittedMercator, Projector};
pub use renderer::{Basemap, BasemapFeature, DrawSurface, Ink, MapLabel, Renderer, Scene};
pub use transform::{center_at_point, zoom_at_point, ViewTransform, ViewportError};
pub use viewport::Viewport;
