pub mod model_catalog;
pub mod predictor;
pub mod render;
pub mod report;
pub mod yolo_engine;
