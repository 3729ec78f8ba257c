use super::{BuildPlugin, Compilation, PluginPhase};
use crate::Result;
use crate::loaders::js_string;
use crate::output::AssetKind;

const HOT_CLIENT: &str = include_str!("hot-client.js");

/// Appends the live reload client to entry bundles during a dev session
pub struct HotReloadPlugin;

impl BuildPlugin for HotReloadPlugin {
    fn name(&self) -> &'static str {
        "hot-reload"
    }

    fn phase(&self) -> PluginPhase {
        PluginPhase::Hmr
    }

    fn process_assets(&self, compilation: &mut Compilation<'_>) -> Result<()> {
        let Some(session) = compilation.dev else {
            return Ok(());
        };
        let client = HOT_CLIENT.replace("__SHEAF_EVENTS_URL__", &js_string(&session.events_url));

        let files: Vec<String> = compilation
            .chunks
            .iter()
            .filter(|c| c.is_entry())
            .filter_map(|c| c.js_file.clone())
            .collect();
        for file in files {
            let script = compilation
                .assets
                .get_mut(&file)
                .filter(|asset| asset.kind == AssetKind::Script);
            if let Some(asset) = script {
                asset.content.extend_from_slice(b"\n");
                asset.content.extend_from_slice(client.as_bytes());
            }
        }
        Ok(())
    }
}
