// Linkflow services
// Services provide the lifecycle engine, classification heuristics, update routing and settings.

pub mod classification;
pub mod lifecycle_engine;
pub mod settings_engine;
pub mod update_router;
