mod loader;

pub use loader::{
    glob_match, Config, ExclusionConfig, ReportConfig, ResourcesConfig, TextureConfig,
    TextureScope, Thresholds,
};
