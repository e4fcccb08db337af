//! Scene files: several widgets with their programs, read from JSON or TOML

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::coordination::{AnimatedWidget, TimelineCoordinator};
use crate::executor::Executor;
use crate::program::{validate, Program, Statement, ValidationWarning, Value};
use crate::timeline::{Position, Size};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub widgets: Vec<SceneWidget>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneWidget {
    pub id: String,
    pub width: i32,
    pub height: i32,
    pub container: Size,
    #[serde(default)]
    pub start: Position,
    #[serde(default)]
    pub variables: BTreeMap<String, Value>,
    #[serde(default)]
    pub program: Vec<Statement>,
}

impl SceneWidget {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn program(&self) -> Program {
        Program {
            statements: self.program.clone(),
            variables: self.variables.clone(),
        }
    }

    pub fn to_widget(&self, config: &AppConfig) -> AnimatedWidget {
        AnimatedWidget::new(
            Executor::with_config(self.program(), config.engine.clone()),
            self.size(),
            self.container,
            self.start.at(),
        )
    }
}

impl Scene {
    /// Load a scene; `.json` files are read as JSON, anything else as TOML
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let scene = if is_json {
            Self::from_json(&content)?
        } else {
            Self::from_toml(&content)?
        };

        debug!(path = %path.display(), widgets = scene.widgets.len(), "Loaded scene");
        for (id, warning) in scene.warnings() {
            warn!(widget = %id, "{}", warning);
        }
        Ok(scene)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let scene: Self = serde_json::from_str(content)?;
        scene.check_ids()?;
        Ok(scene)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let scene: Self =
            toml::from_str(content).map_err(|e| Error::Scene(format!("Invalid TOML: {}", e)))?;
        scene.check_ids()?;
        Ok(scene)
    }

    fn check_ids(&self) -> Result<()> {
        let mut ids = BTreeSet::new();
        for widget in &self.widgets {
            if widget.id.is_empty() {
                return Err(Error::Scene("widget with empty id".to_string()));
            }
            if !ids.insert(widget.id.as_str()) {
                return Err(Error::Scene(format!("duplicate widget id '{}'", widget.id)));
            }
        }
        Ok(())
    }

    pub fn widget(&self, id: &str) -> Option<&SceneWidget> {
        self.widgets.iter().find(|w| w.id == id)
    }

    /// Validation warnings for every widget program
    pub fn warnings(&self) -> Vec<(String, ValidationWarning)> {
        self.widgets
            .iter()
            .flat_map(|w| {
                validate(&w.program())
                    .into_iter()
                    .map(|warning| (w.id.clone(), warning))
            })
            .collect()
    }

    /// Register every widget with a fresh coordinator
    pub fn coordinator(&self, config: &AppConfig) -> TimelineCoordinator<AnimatedWidget> {
        let mut coordinator = TimelineCoordinator::with_config(&config.coordinator);
        for widget in &self.widgets {
            coordinator.register(widget.id.clone(), widget.to_widget(config));
        }
        coordinator
    }
}
