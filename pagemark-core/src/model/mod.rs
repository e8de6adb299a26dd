pub mod anchor;
pub mod group;

pub use anchor::{Anchor, PathParseError, PathStep, StructuralPath};
pub use group::{Group, GroupId, GroupIdClock};
