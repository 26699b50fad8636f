pub mod context;
pub mod loaders;
pub mod types;

pub use context::{require_viewer, viewer, GraphQLContext};
pub use loaders::{CourseLoader, UserLoader};
pub use types::{CourseObject, GradeObject, UserObject};
