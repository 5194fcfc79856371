//! 预导入模块，方便使用

pub use super::articles::{
    ActiveModel as ArticleActiveModel, Entity as Articles, Model as ArticleModel,
};
pub use super::categories::{
    ActiveModel as CategoryActiveModel, Entity as Categories, Model as CategoryModel,
};
pub use super::course_purchases::{
    ActiveModel as CoursePurchaseActiveModel, Entity as CoursePurchases,
    Model as CoursePurchaseModel,
};
pub use super::courses::{ActiveModel as CourseActiveModel, Entity as Courses, Model as CourseModel};
pub use super::enrollments::{
    ActiveModel as EnrollmentActiveModel, Entity as Enrollments, Model as EnrollmentModel,
};
pub use super::lectures::{
    ActiveModel as LectureActiveModel, Entity as Lectures, Model as LectureModel,
};
pub use super::reviews::{ActiveModel as ReviewActiveModel, Entity as Reviews, Model as ReviewModel};
pub use super::search_suggestions::{
    ActiveModel as SearchSuggestionActiveModel, Entity as SearchSuggestions,
    Model as SearchSuggestionModel,
};
pub use super::sections::{
    ActiveModel as SectionActiveModel, Entity as Sections, Model as SectionModel,
};
pub use super::users::{ActiveModel as UserActiveModel, Entity as Users, Model as UserModel};
