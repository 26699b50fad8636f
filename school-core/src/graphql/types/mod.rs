pub mod course;
pub mod grade;
pub mod user;

pub use course::CourseObject;
pub use grade::GradeObject;
pub use user::UserObject;
