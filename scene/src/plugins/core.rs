use bevy::{app::PluginGroupBuilder, prelude::PluginGroup};

pub mod ctrlc;
pub mod error;
pub mod session;

pub struct CorePlugins;

impl PluginGroup for CorePlugins {
    fn build(self) -> PluginGroupBuilder {
        PluginGroupBuilder::start::<Self>()
            .add(error::ErrorPlugin)
            .add(session::SessionPlugin)
            .add(ctrlc::CtrlCPlugin)
            .build()
    }
}
