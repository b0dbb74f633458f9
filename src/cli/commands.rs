use clap::{Args, Parser, Subcommand};

use crate::config::Credentials;

#[derive(Parser)]
#[command(name = "tchai")]
#[command(author, version, about = "T-chai tutoring assistant", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub credentials: CredentialArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct CredentialArgs {
    /// Use a locally served OpenAI-compatible model instead of the hosted one
    #[arg(long, env = "USE_LOCAL_INFERENCE")]
    pub use_local_inference: bool,

    /// watsonx.ai project id
    #[arg(long, env = "WATSONXAI_PROJECT_ID")]
    pub watsonxai_project_id: String,

    /// watsonx.ai API key
    #[arg(long, env = "WATSONXAI_API_KEY", hide_env_values = true)]
    pub watsonxai_api_key: String,

    /// API key for the text-to-speech service
    #[arg(long, env = "WATSON_IAM_AUTH", hide_env_values = true)]
    pub watson_iam_auth: String,
}

impl From<CredentialArgs> for Credentials {
    fn from(args: CredentialArgs) -> Self {
        Self {
            use_local_inference: args.use_local_inference,
            project_id: args.watsonxai_project_id,
            api_key: args.watsonxai_api_key,
            iam_auth: args.watson_iam_auth,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive tutoring session
    Interactive {
        /// Mode: student or parent
        #[arg(short, long, default_value = "student")]
        mode: String,

        /// Student age: 5-10, 11-13, 14-18 or 19+
        #[arg(short, long, default_value = "5-10")]
        age: String,

        /// Augment questions with Wikipedia context
        #[arg(long)]
        rag: bool,
    },

    /// Ask a single question and print the answer
    Ask {
        prompt: String,

        #[arg(short, long, default_value = "student")]
        mode: String,

        #[arg(short, long, default_value = "5-10")]
        age: String,

        #[arg(long)]
        rag: bool,

        /// Also read the answer aloud and save the audio
        #[arg(long)]
        speak: bool,
    },
}
