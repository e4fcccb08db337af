pub mod config;
pub mod coordination;
pub mod error;
pub mod executor;
pub mod program;
pub mod scene;
pub mod timeline;

pub use config::{AppConfig, CoordinatorConfig, EngineConfig};
pub use coordination::{AnimatedWidget, ResolveSummary, TimelineCoordinator, TimelineHandle};
pub use error::{Error, Result};
pub use executor::Executor;
pub use program::{Program, Statement};
pub use scene::{Scene, SceneWidget};
pub use timeline::{Position, Size, SyncEvent, Timeline};
