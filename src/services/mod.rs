pub mod exam_service;
pub mod export_service;
pub mod import_service;
pub mod payment_service;
pub mod progress_service;
pub mod question_service;
pub mod subscription_service;
pub mod user_service;
