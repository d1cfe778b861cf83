pub mod test_helpers;
pub mod video_detection;
