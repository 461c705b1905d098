//! Progressive tile renderer: a pool of workers shades a frame in passes, meeting at a
//! two-phase barrier between passes so one leader can publish each finished pass.

pub mod raytracer;
