use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "agentchat")]
#[command(about = "Chat with a local AI agent over its streaming HTTP API", long_about = None)]
pub struct Args {
    #[arg(
        long = "url",
        help = "Agent service base URL (e.g., http://127.0.0.1:41465)"
    )]
    pub base_url: Option<String>,

    #[arg(
        long = "timeout",
        help = "Seconds to wait for the next stream event before giving up"
    )]
    pub stream_timeout: Option<u64>,

    #[arg(long = "history", help = "Number of turns kept in memory")]
    pub history_capacity: Option<usize>,

    #[arg(long = "window", help = "Number of past turns sent as context")]
    pub context_window: Option<usize>,

    #[arg(short = 'v', long = "verbose", help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(long = "health", help = "Check the agent service and exit")]
    pub health: bool,

    #[arg(help = "Message to send; starts an interactive prompt when omitted")]
    pub message: Vec<String>,
}
