pub mod globals;
pub mod pipeline_manager;
pub mod render_engine;
