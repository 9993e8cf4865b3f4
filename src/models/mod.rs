pub mod exam;
pub mod exam_result;
pub mod locale;
pub mod progress;
pub mod question;
pub mod subscription;
pub mod topic;
pub mod user;
