use std::path::PathBuf;

// Helper defaults
pub(crate) fn default_output_path() -> PathBuf {
    PathBuf::from("dist")
}

pub(crate) fn default_filename() -> String {
    "js/[name].js".to_string()
}

pub(crate) fn default_chunk_filename() -> String {
    "js/[id].js".to_string()
}

pub(crate) fn default_extensions() -> Vec<String> {
    vec![".js".to_string(), ".json".to_string()]
}

pub(crate) fn default_url_limit() -> u64 {
    8 * 1024
}

pub(crate) fn default_url_name() -> String {
    "[name].[ext]".to_string()
}

pub(crate) fn default_html_filename() -> String {
    "index.html".to_string()
}

pub(crate) fn default_css_filename() -> String {
    "[name].css".to_string()
}

pub(crate) fn default_css_chunk_filename() -> String {
    "[id].css".to_string()
}
