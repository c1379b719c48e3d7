pub mod cache;
pub mod ip_detector;
