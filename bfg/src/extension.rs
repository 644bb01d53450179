//! Host extension glue
//!
//! The host discovers plugins through [`Extension`]: each one reports its
//! metadata and a list of menu items. The flame graph plugin contributes two
//! items, "Start BFG" and "Stop BFG", bound to the lifecycle controller.

use std::fmt;
use std::sync::Arc;

use log::{error, info, warn};
use serde::Serialize;

use crate::lifecycle::FlameGraphController;

pub const START_MENU_LABEL: &str = "Start BFG";
pub const STOP_MENU_LABEL: &str = "Stop BFG";

const PLUGIN_AUTHOR: &str = "bfg contributors";

/// Plugin API level this extension is written against
pub const PLUGIN_API_VERSION: u32 = 3;

/// Descriptive metadata the host shows in its plugin list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginMetadata {
    pub name: String,
    pub author: String,
    pub version: String,
    pub description: String,
    pub api: u32,
}

pub type MenuAction = Box<dyn Fn() + Send + Sync>;

/// A zero-argument command shown in the host's extension menu
pub struct MenuItem {
    pub label: String,
    action: MenuAction,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, action: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            label: label.into(),
            action: Box::new(action),
        }
    }

    pub fn trigger(&self) {
        (self.action)();
    }
}

impl fmt::Debug for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuItem").field("label", &self.label).finish_non_exhaustive()
    }
}

/// Interface between the host application and a plugin
pub trait Extension {
    fn metadata(&self) -> PluginMetadata;
    fn menu_items(&self) -> Vec<MenuItem>;
}

/// The flame graph plugin: start/stop commands for the profile server
pub struct FlameGraphExtension {
    controller: Arc<FlameGraphController>,
}

impl FlameGraphExtension {
    pub fn new(controller: Arc<FlameGraphController>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &Arc<FlameGraphController> {
        &self.controller
    }
}

impl Extension for FlameGraphExtension {
    fn metadata(&self) -> PluginMetadata {
        PluginMetadata {
            name: "Big Flame Graph".to_string(),
            author: PLUGIN_AUTHOR.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Signal profiler with a Big Flame Graph.".to_string(),
            api: PLUGIN_API_VERSION,
        }
    }

    fn menu_items(&self) -> Vec<MenuItem> {
        let start = Arc::clone(&self.controller);
        let stop = Arc::clone(&self.controller);
        vec![
            MenuItem::new(START_MENU_LABEL, move || match start.start_server() {
                Ok(addr) => info!("Big Flame Graph available at http://{addr}/"),
                Err(e) => error!("Could not start Big Flame Graph: {e}"),
            }),
            MenuItem::new(STOP_MENU_LABEL, move || {
                if let Err(e) = stop.stop_server() {
                    warn!("Could not stop Big Flame Graph cleanly: {e}");
                }
            }),
        ]
    }
}

/// Registered plugins and their menu items
#[derive(Debug, Default)]
pub struct PluginRegistry {
    plugins: Vec<RegisteredPlugin>,
}

#[derive(Debug)]
struct RegisteredPlugin {
    metadata: PluginMetadata,
    menu: Vec<MenuItem>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extension: &dyn Extension) {
        let metadata = extension.metadata();
        info!("Registered plugin {} v{}", metadata.name, metadata.version);
        self.plugins.push(RegisteredPlugin {
            metadata,
            menu: extension.menu_items(),
        });
    }

    pub fn plugins(&self) -> impl Iterator<Item = &PluginMetadata> {
        self.plugins.iter().map(|p| &p.metadata)
    }

    /// `(plugin name, menu label)` for every registered menu item
    pub fn menu_labels(&self) -> Vec<(&str, &str)> {
        self.plugins
            .iter()
            .flat_map(|p| {
                p.menu
                    .iter()
                    .map(move |item| (p.metadata.name.as_str(), item.label.as_str()))
            })
            .collect()
    }

    /// Run the first menu item with this label. Returns false if none matched.
    pub fn trigger(&self, label: &str) -> bool {
        let item = self
            .plugins
            .iter()
            .flat_map(|p| p.menu.iter())
            .find(|item| item.label == label);
        match item {
            Some(item) => {
                item.trigger();
                true
            }
            None => false,
        }
    }
}
