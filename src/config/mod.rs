mod settings;

pub use settings::{
    AuthConfig, Credentials, HttpConfig, InferenceConfig, LoggingConfig, RetrievalConfig,
    Settings, SpeechConfig, TemplateConfig,
};
